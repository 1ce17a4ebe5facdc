use std::fmt;

/// Errors surfaced by the facade's direct-call paths (§7). Queued writes
/// (`add_record_queue`/`update_record_queue`) never produce these — they
/// only log, per the propagation policy.
#[derive(Debug)]
pub enum ClientError {
    /// ADD got a 409: the record already exists server-side.
    RecordExists { record_id: String, site_id: String },
    /// UPDATE got a 400: the target record does not exist yet.
    RecordDoesNotExist { record_id: String, site_id: String },
    /// Any transport-level failure (DNS, TCP, TLS handshake, timeout).
    Connection(String),
    /// A non-2xx response that isn't one of the documented 409/400 cases.
    UnexpectedStatus { status: u16, body: String },
    /// The server's response body didn't parse as the expected JSON shape.
    MalformedServerResponse(String),
    /// A TLS option mismatch, or a record that failed its own invariants.
    Configuration(String),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::RecordExists { record_id, site_id } => {
                write!(f, "record '{record_id}' (site '{site_id}') already exists")
            }
            ClientError::RecordDoesNotExist { record_id, site_id } => {
                write!(f, "record '{record_id}' (site '{site_id}') does not exist")
            }
            ClientError::Connection(msg) => write!(f, "connection error: {msg}"),
            ClientError::UnexpectedStatus { status, body } => write!(f, "http {status}: {body}"),
            ClientError::MalformedServerResponse(msg) => write!(f, "malformed server response: {msg}"),
            ClientError::Configuration(msg) => write!(f, "configuration error: {msg}"),
        }
    }
}

impl std::error::Error for ClientError {}

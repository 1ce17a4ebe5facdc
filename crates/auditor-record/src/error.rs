use std::fmt;

/// Errors raised while constructing or parsing a [`crate::Record`].
///
/// Mirrors the taxonomy in the AUDITOR wire contract: a record is either
/// built from a complete set of required fields, or parsed from its JSON
/// wire form — never neither, never both ambiguously.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// Neither the required fields nor a parse string were supplied.
    InsufficientParameters,
    /// The JSON wire form was present but missing a key, used the wrong
    /// type, carried a non-UTC timestamp, or otherwise violated an
    /// invariant (e.g. `stop_time < start_time`).
    MalformedRecord(String),
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordError::InsufficientParameters => write!(
                f,
                "insufficient parameters: supply either all required fields or a json string"
            ),
            RecordError::MalformedRecord(msg) => write!(f, "malformed record: {msg}"),
        }
    }
}

impl std::error::Error for RecordError {}

use async_trait::async_trait;
use auditor_record::Record;
use std::time::Duration;

/// HTTP abstraction the worker pool submits records through. A trait seam
/// so tests can substitute a mock transport without touching the network
/// (mirrors the adapter boundary `BrokerAdapter`/`HistoricalProvider` draw
/// between routing logic and the wire).
#[async_trait]
pub trait Transport: Send + Sync {
    async fn add(&self, record: &Record) -> Result<(), SubmitError>;
    async fn update(&self, record: &Record) -> Result<(), SubmitError>;
}

/// Classification of a submission attempt's outcome, independent of any
/// particular HTTP client (§4.E).
#[derive(Debug)]
pub enum SubmitError {
    /// ADD got a 409 — the record already exists server-side. Terminal:
    /// the task must be dropped, never requeued.
    RecordExists,
    /// UPDATE got a 400 — the record hasn't been ADDed yet. Requeue: this
    /// is the self-healing path for the "UPDATE before ADD" race.
    RecordDoesNotExist,
    /// Network failure or timeout. Requeue with backoff if retries remain.
    ConnectionError(String),
    /// Any other non-2xx status. Terminal: log and drop.
    Other { status: u16, body: String },
}

impl std::fmt::Display for SubmitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubmitError::RecordExists => write!(f, "record already exists"),
            SubmitError::RecordDoesNotExist => write!(f, "record does not exist"),
            SubmitError::ConnectionError(msg) => write!(f, "connection error: {msg}"),
            SubmitError::Other { status, body } => write!(f, "http {status}: {body}"),
        }
    }
}

impl std::error::Error for SubmitError {}

/// `reqwest`-backed transport hitting the live AUDITOR HTTP surface.
pub struct HttpTransport {
    http: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    fn record_url(&self) -> String {
        format!("{}/record", self.base_url.trim_end_matches('/'))
    }

    async fn post_record(&self, record: &Record) -> Result<(), SubmitError> {
        let resp = self
            .http
            .post(self.record_url())
            .json(record)
            .send()
            .await
            .map_err(|e| SubmitError::ConnectionError(e.to_string()))?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        if status.as_u16() == 409 {
            return Err(SubmitError::RecordExists);
        }
        if status.as_u16() == 400 {
            return Err(SubmitError::RecordDoesNotExist);
        }

        let body = resp.text().await.unwrap_or_default();
        Err(SubmitError::Other {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn add(&self, record: &Record) -> Result<(), SubmitError> {
        self.post_record(record).await
    }

    async fn update(&self, record: &Record) -> Result<(), SubmitError> {
        self.post_record(record).await
    }
}

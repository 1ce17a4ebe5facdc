use crate::error::ClientError;
use crate::facade::AuditorClient;
use crate::tls::{apply_tls, TlsPaths};
use auditor_queue::PriorityQueue;
use auditor_worker::{HttpTransport, WorkerPool};
use std::sync::Arc;
use std::time::Duration;

/// Builds an [`AuditorClient`] from the §6.3 option set. Mirrors the
/// original `AuditorClientBuilder().address(host, port).timeout(n)...build()`
/// shape rather than one large constructor function.
#[derive(Debug, Clone)]
pub struct AuditorClientBuilder {
    host: String,
    port: u16,
    timeout: Duration,
    retries: u32,
    num_workers: usize,
    delay_before_retry: Duration,
    db_path: String,
    tls: Option<TlsPaths>,
}

impl AuditorClientBuilder {
    pub fn new() -> Self {
        Self {
            host: String::new(),
            port: 0,
            timeout: Duration::from_secs(10),
            retries: 5,
            num_workers: 1,
            delay_before_retry: Duration::from_secs(5),
            db_path: "database.db".to_string(),
            tls: None,
        }
    }

    pub fn address(mut self, host: impl Into<String>, port: u16) -> Self {
        self.host = host.into();
        self.port = port;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn num_workers(mut self, num_workers: usize) -> Self {
        self.num_workers = num_workers;
        self
    }

    pub fn delay_before_retry(mut self, delay: Duration) -> Self {
        self.delay_before_retry = delay;
        self
    }

    pub fn db_path(mut self, db_path: impl Into<String>) -> Self {
        self.db_path = db_path.into();
        self
    }

    pub fn tls(mut self, tls: TlsPaths) -> Self {
        self.tls = Some(tls);
        self
    }

    fn base_url(&self) -> String {
        let scheme = if self.tls.is_some() { "https" } else { "http" };
        format!("{scheme}://{}:{}", self.host, self.port)
    }

    /// `start()` from §4.F: constructs the HTTP transport, spawns the
    /// worker pool, and starts the queue (replaying any persisted tasks)
    /// before returning. TLS path errors fail fast here rather than on the
    /// first request.
    pub async fn build(self) -> Result<AuditorClient, ClientError> {
        let mut http_builder = reqwest::Client::builder().timeout(self.timeout);
        if let Some(tls) = &self.tls {
            http_builder = apply_tls(http_builder, tls)?;
        }
        let http = http_builder
            .build()
            .map_err(|e| ClientError::Configuration(format!("building http client: {e}")))?;

        let base_url = self.base_url();

        let queue = Arc::new(
            PriorityQueue::start(&self.db_path)
                .await
                .map_err(|e| ClientError::Configuration(format!("starting spill store: {e}")))?,
        );

        let transport = Arc::new(HttpTransport::with_client(http.clone(), base_url.clone()));
        let pool = WorkerPool::start(self.num_workers, queue.clone(), transport, self.delay_before_retry);

        Ok(AuditorClient::new(http, base_url, queue, pool, self.retries))
    }
}

impl Default for AuditorClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

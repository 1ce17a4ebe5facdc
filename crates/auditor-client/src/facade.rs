use crate::error::ClientError;
use auditor_queue::PriorityQueue;
use auditor_record::Record;
use auditor_store::{Instruction, Task};
use auditor_worker::WorkerPool;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// The async, cooperative facade (§4.F): the public surface every
/// collector/publisher binds against. Owns the priority queue and the
/// worker pool; holds only a shared, cloneable HTTP client for direct
/// reads and writes.
pub struct AuditorClient {
    http: reqwest::Client,
    base_url: String,
    queue: Arc<PriorityQueue>,
    pool: Option<WorkerPool>,
    retries: u32,
}

impl AuditorClient {
    pub(crate) fn new(
        http: reqwest::Client,
        base_url: String,
        queue: Arc<PriorityQueue>,
        pool: WorkerPool,
        retries: u32,
    ) -> Self {
        Self {
            http,
            base_url,
            queue,
            pool: Some(pool),
            retries,
        }
    }

    /// Joins the queue to drain pending work, cancels the workers, and
    /// drops the transport. Lifecycle errors propagate (§7).
    pub async fn stop(&mut self) -> Result<(), ClientError> {
        self.queue
            .join()
            .await
            .map_err(|e| ClientError::Configuration(format!("joining queue: {e}")))?;
        if let Some(pool) = self.pool.take() {
            pool.stop().await;
        }
        Ok(())
    }

    /// Fire-and-forget: persisted before return, never propagates
    /// submission errors — those are retried up to `retries` times by the
    /// worker pool and logged on permanent drop (§7).
    pub async fn add_record_queue(&self, record: Record) -> Result<(), ClientError> {
        self.enqueue(record, Instruction::Add, None).await
    }

    pub async fn update_record_queue(&self, record: Record) -> Result<(), ClientError> {
        self.enqueue(record, Instruction::Update, None).await
    }

    /// As [`Self::add_record_queue`]/[`Self::update_record_queue`], but
    /// schedules the task `delay` in the future. Used by
    /// [`crate::queued::QueuedAuditorClient`] to coalesce bursts of writes
    /// arriving within one `send_interval` window onto the same worker
    /// wake-up rather than dispatching each one immediately.
    pub(crate) async fn enqueue(
        &self,
        record: Record,
        instruction: Instruction,
        delay: Option<std::time::Duration>,
    ) -> Result<(), ClientError> {
        let task = Task::new(record, instruction, self.retries);
        self.queue
            .put(task, delay)
            .await
            .map_err(|e| ClientError::Configuration(format!("enqueuing {instruction:?}: {e}")))
    }

    /// Direct write, bypassing the queue. Propagates [`ClientError::RecordExists`]
    /// on a 409.
    pub async fn add(&self, record: &Record) -> Result<(), ClientError> {
        self.post_record(record, Instruction::Add).await
    }

    /// Direct write, bypassing the queue. Propagates
    /// [`ClientError::RecordDoesNotExist`] on a 400.
    pub async fn update(&self, record: &Record) -> Result<(), ClientError> {
        self.post_record(record, Instruction::Update).await
    }

    async fn post_record(&self, record: &Record, instruction: Instruction) -> Result<(), ClientError> {
        let url = format!("{}/record", self.base_url.trim_end_matches('/'));
        let resp = self
            .http
            .post(url)
            .json(record)
            .send()
            .await
            .map_err(|e| ClientError::Connection(e.to_string()))?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }

        let record_id = record.record_id().to_string();
        let site_id = record.site_id().to_string();
        match (instruction, status.as_u16()) {
            (Instruction::Add, 409) => Err(ClientError::RecordExists { record_id, site_id }),
            (Instruction::Update, 400) => Err(ClientError::RecordDoesNotExist { record_id, site_id }),
            _ => {
                let body = resp.text().await.unwrap_or_default();
                Err(ClientError::UnexpectedStatus {
                    status: status.as_u16(),
                    body,
                })
            }
        }
    }

    pub async fn get(&self) -> Result<Vec<Record>, ClientError> {
        self.get_records("/records").await
    }

    pub async fn get_started_since(&self, since: DateTime<Utc>) -> Result<Vec<Record>, ClientError> {
        let path = format!("/records/started/since/{}", since.to_rfc3339());
        self.get_records(&path).await
    }

    pub async fn get_stopped_since(&self, since: DateTime<Utc>) -> Result<Vec<Record>, ClientError> {
        let path = format!("/records/stopped/since/{}", since.to_rfc3339());
        self.get_records(&path).await
    }

    /// Runs a query string — typically produced by [`QueryBuilder::build`]
    /// — against `GET /records`.
    pub async fn advanced_query(&self, query: &str) -> Result<Vec<Record>, ClientError> {
        let path = if query.is_empty() {
            "/records".to_string()
        } else {
            format!("/records?{query}")
        };
        self.get_records(&path).await
    }

    async fn get_records(&self, path: &str) -> Result<Vec<Record>, ClientError> {
        let url = format!("{}{path}", self.base_url.trim_end_matches('/'));
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| ClientError::Connection(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(ClientError::UnexpectedStatus { status, body });
        }

        resp.json::<Vec<Record>>()
            .await
            .map_err(|e| ClientError::MalformedServerResponse(e.to_string()))
    }

    pub async fn health_check(&self) -> Result<bool, ClientError> {
        let url = format!("{}/health_check", self.base_url.trim_end_matches('/'));
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| ClientError::Connection(e.to_string()))?;
        Ok(resp.status().is_success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::AuditorClientBuilder;
    use chrono::TimeZone;
    use httpmock::MockServer;

    fn sample_record() -> Record {
        let start = Utc.with_ymd_and_hms(2021, 12, 6, 16, 29, 43).unwrap();
        Record::new("rec-1", start)
    }

    #[tokio::test]
    async fn add_then_get_round_trips_through_mock_server() {
        let server = MockServer::start();
        let record = sample_record();

        let add_mock = server.mock(|when, then| {
            when.method(httpmock::Method::POST).path("/record");
            then.status(201);
        });
        let records_mock = server.mock(|when, then| {
            when.method(httpmock::Method::GET).path("/records");
            then.status(200).json_body_obj(&vec![record.clone()]);
        });

        let dir = tempfile::tempdir().unwrap();
        let mut client = AuditorClientBuilder::new()
            .address(server.host(), server.port())
            .db_path(dir.path().join("q.db").to_str().unwrap())
            .build()
            .await
            .unwrap();

        client.add(&record).await.unwrap();
        let got = client.get().await.unwrap();
        assert_eq!(got, vec![record]);

        add_mock.assert();
        records_mock.assert();
        client.stop().await.unwrap();
    }

    #[tokio::test]
    async fn add_on_409_surfaces_record_exists() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(httpmock::Method::POST).path("/record");
            then.status(409);
        });

        let dir = tempfile::tempdir().unwrap();
        let mut client = AuditorClientBuilder::new()
            .address(server.host(), server.port())
            .db_path(dir.path().join("q.db").to_str().unwrap())
            .build()
            .await
            .unwrap();

        let err = client.add(&sample_record()).await.unwrap_err();
        assert!(matches!(err, ClientError::RecordExists { .. }));
        client.stop().await.unwrap();
    }

    #[tokio::test]
    async fn health_check_reflects_server_status() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(httpmock::Method::GET).path("/health_check");
            then.status(200);
        });

        let dir = tempfile::tempdir().unwrap();
        let mut client = AuditorClientBuilder::new()
            .address(server.host(), server.port())
            .db_path(dir.path().join("q.db").to_str().unwrap())
            .build()
            .await
            .unwrap();

        assert!(client.health_check().await.unwrap());
        client.stop().await.unwrap();
    }

    #[tokio::test]
    async fn add_record_queue_persists_and_worker_submits() {
        let server = MockServer::start();
        let add_mock = server.mock(|when, then| {
            when.method(httpmock::Method::POST).path("/record");
            then.status(201);
        });

        let dir = tempfile::tempdir().unwrap();
        let mut client = AuditorClientBuilder::new()
            .address(server.host(), server.port())
            .db_path(dir.path().join("q.db").to_str().unwrap())
            .build()
            .await
            .unwrap();

        client.add_record_queue(sample_record()).await.unwrap();
        client.stop().await.unwrap();

        add_mock.assert();
    }

    #[tokio::test]
    async fn advanced_query_forwards_built_string_as_query_params() {
        use auditor_query::QueryBuilder;

        let server = MockServer::start();
        let records_mock = server.mock(|when, then| {
            when.method(httpmock::Method::GET)
                .path("/records")
                .query_param("record_id", "rec-1");
            then.status(200).json_body_obj(&Vec::<Record>::new());
        });

        let dir = tempfile::tempdir().unwrap();
        let mut client = AuditorClientBuilder::new()
            .address(server.host(), server.port())
            .db_path(dir.path().join("q.db").to_str().unwrap())
            .build()
            .await
            .unwrap();

        let query = QueryBuilder::new().with_record_id("rec-1").build();
        let got = client.advanced_query(&query).await.unwrap();
        assert!(got.is_empty());

        records_mock.assert();
        client.stop().await.unwrap();
    }
}

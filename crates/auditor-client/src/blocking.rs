use crate::builder::AuditorClientBuilder;
use crate::error::ClientError;
use crate::facade::AuditorClient;
use auditor_record::Record;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::runtime::Runtime;

/// Synchronous adapter over [`AuditorClient`] (§4.F "blocking" shape):
/// owns a private multi-thread runtime and blocks on it for every call, so
/// the whole async submission subsystem is usable from plain synchronous
/// collector code.
pub struct BlockingAuditorClient {
    runtime: Arc<Runtime>,
    inner: AuditorClient,
}

impl BlockingAuditorClient {
    fn build(builder: AuditorClientBuilder) -> Result<Self, ClientError> {
        let runtime = Runtime::new().map_err(|e| ClientError::Configuration(format!("starting runtime: {e}")))?;
        let inner = runtime.block_on(builder.build())?;
        Ok(Self {
            runtime: Arc::new(runtime),
            inner,
        })
    }

    pub fn stop(&mut self) -> Result<(), ClientError> {
        self.runtime.block_on(self.inner.stop())
    }

    pub fn add_record_queue(&self, record: Record) -> Result<(), ClientError> {
        self.runtime.block_on(self.inner.add_record_queue(record))
    }

    pub fn update_record_queue(&self, record: Record) -> Result<(), ClientError> {
        self.runtime.block_on(self.inner.update_record_queue(record))
    }

    pub fn add(&self, record: &Record) -> Result<(), ClientError> {
        self.runtime.block_on(self.inner.add(record))
    }

    pub fn update(&self, record: &Record) -> Result<(), ClientError> {
        self.runtime.block_on(self.inner.update(record))
    }

    pub fn get(&self) -> Result<Vec<Record>, ClientError> {
        self.runtime.block_on(self.inner.get())
    }

    pub fn get_started_since(&self, since: DateTime<Utc>) -> Result<Vec<Record>, ClientError> {
        self.runtime.block_on(self.inner.get_started_since(since))
    }

    pub fn get_stopped_since(&self, since: DateTime<Utc>) -> Result<Vec<Record>, ClientError> {
        self.runtime.block_on(self.inner.get_stopped_since(since))
    }

    pub fn advanced_query(&self, query: &str) -> Result<Vec<Record>, ClientError> {
        self.runtime.block_on(self.inner.advanced_query(query))
    }

    pub fn health_check(&self) -> Result<bool, ClientError> {
        self.runtime.block_on(self.inner.health_check())
    }
}

/// Extension on [`AuditorClientBuilder`] so callers write
/// `AuditorClientBuilder::new()....build_blocking()`, mirroring the
/// original's `.build_blocking()` entry point.
pub trait BuildBlockingExt {
    fn build_blocking(self) -> Result<BlockingAuditorClient, ClientError>;
}

impl BuildBlockingExt for AuditorClientBuilder {
    fn build_blocking(self) -> Result<BlockingAuditorClient, ClientError> {
        BlockingAuditorClient::build(self)
    }
}

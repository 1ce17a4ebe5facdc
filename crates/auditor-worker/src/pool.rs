use crate::transport::{SubmitError, Transport};
use auditor_queue::PriorityQueue;
use auditor_store::Instruction;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// N cooperative workers draining the same [`PriorityQueue`] (§4.E). Each
/// worker checks for cancellation between iterations and at every
/// suspension point (`queue.get`, the HTTP await, the requeue delay).
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
    shutdown_tx: broadcast::Sender<()>,
}

impl WorkerPool {
    pub fn start(
        num_workers: usize,
        queue: Arc<PriorityQueue>,
        transport: Arc<dyn Transport>,
        delay_before_retry: Duration,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        let mut handles = Vec::with_capacity(num_workers);

        for id in 0..num_workers {
            let queue = queue.clone();
            let transport = transport.clone();
            let mut shutdown_rx = shutdown_tx.subscribe();
            handles.push(tokio::spawn(async move {
                worker_loop(id, queue, transport, delay_before_retry, &mut shutdown_rx).await;
            }));
        }

        Self { handles, shutdown_tx }
    }

    /// Signals every worker to stop after its current iteration and waits
    /// for them to exit. Does not drain the queue — callers join the queue
    /// first if they want pending work flushed (§4.F `stop()` ordering).
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(());
        for handle in self.handles {
            let _ = handle.await;
        }
    }
}

async fn worker_loop(
    id: usize,
    queue: Arc<PriorityQueue>,
    transport: Arc<dyn Transport>,
    delay_before_retry: Duration,
    shutdown_rx: &mut broadcast::Receiver<()>,
) {
    loop {
        let mut task = tokio::select! {
            _ = shutdown_rx.recv() => return,
            result = queue.get() => match result {
                Ok(task) => task,
                Err(err) => {
                    tracing::error!(worker = id, %err, "queue.get failed");
                    continue;
                }
            },
        };

        if task.try_once() {
            let (consumed, total) = task.attempts();
            let attempt = format!("({consumed}/{total})");

            let outcome = tokio::select! {
                _ = shutdown_rx.recv() => return,
                outcome = send(&transport, &task) => outcome,
            };

            match outcome {
                Ok(()) => {}
                Err(SubmitError::RecordExists) => {
                    tracing::warn!(worker = id, record_id = task.record_id(), "record already exists, dropping ADD");
                }
                Err(SubmitError::RecordDoesNotExist) => {
                    tracing::info!(
                        worker = id,
                        record_id = task.record_id(),
                        attempt,
                        "record not yet committed, requeuing UPDATE"
                    );
                    requeue(&queue, task, delay_before_retry, id).await;
                }
                Err(SubmitError::ConnectionError(msg)) => {
                    tracing::warn!(
                        worker = id,
                        record_id = task.record_id(),
                        attempt,
                        error = %msg,
                        "connection error, requeuing"
                    );
                    requeue(&queue, task, delay_before_retry, id).await;
                }
                Err(SubmitError::Other { status, body }) => {
                    tracing::warn!(worker = id, record_id = task.record_id(), status, body, "non-2xx response, dropping");
                }
            }
        }

        queue.task_done().await;
    }
}

async fn send(transport: &Arc<dyn Transport>, task: &auditor_store::Task) -> Result<(), SubmitError> {
    match task.instruction {
        Instruction::Add => transport.add(&task.record).await,
        Instruction::Update => transport.update(&task.record).await,
    }
}

async fn requeue(queue: &Arc<PriorityQueue>, task: auditor_store::Task, delay: Duration, worker_id: usize) {
    if let Err(err) = queue.put(task, Some(delay)).await {
        tracing::error!(worker = worker_id, %err, "failed to requeue task");
    }
}

//! In-memory priority queue over [`Task`]s, backed by [`auditor_store`] for
//! crash-safety (§4.D). Tasks are ordered `(instruction ascending, insertion
//! order)`: any ADD for a given `(record_id, site_id)` pair is claimed
//! before an UPDATE for the same pair that is also in the queue.

use anyhow::{bail, Result};
use auditor_store::{Instruction, SpillStore, Task};
use chrono::Utc;
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::time::Duration;
use tokio::sync::{Mutex, Notify};

const DEFAULT_SLEEP_TIME: Duration = Duration::from_millis(100);

#[derive(Debug, Clone)]
struct QueueEntry {
    instruction: Instruction,
    seq: u64,
    task: Task,
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.instruction == other.instruction && self.seq == other.seq
    }
}
impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.instruction.cmp(&other.instruction).then(self.seq.cmp(&other.seq))
    }
}

struct Inner {
    heap: BinaryHeap<Reverse<QueueEntry>>,
    store: Option<SpillStore>,
    pending: usize,
    next_seq: u64,
}

/// A priority queue whose contents survive a process restart. `start()`
/// opens the backing [`SpillStore`] and replays its rows before any
/// producer or consumer touches the queue.
pub struct PriorityQueue {
    inner: Mutex<Inner>,
    item_ready: Notify,
    all_done: Notify,
    sleep_time: Duration,
}

impl PriorityQueue {
    pub async fn start(store_path: &str) -> Result<Self> {
        Self::start_with_sleep_time(store_path, DEFAULT_SLEEP_TIME).await
    }

    pub async fn start_with_sleep_time(store_path: &str, sleep_time: Duration) -> Result<Self> {
        let store = SpillStore::start(store_path).await?;
        let rows = store.get_all().await?;

        let mut heap = BinaryHeap::with_capacity(rows.len());
        let mut next_seq = 0u64;
        for task in rows {
            let instruction = task.instruction;
            heap.push(Reverse(QueueEntry { instruction, seq: next_seq, task }));
            next_seq += 1;
        }

        Ok(Self {
            inner: Mutex::new(Inner {
                heap,
                store: Some(store),
                pending: 0,
                next_seq,
            }),
            item_ready: Notify::new(),
            all_done: Notify::new(),
            sleep_time,
        })
    }

    /// Persists `task` to the spill store and inserts it into the heap. If
    /// `delay` is given, `task.scheduled_after` is set to `now + delay`
    /// before persisting. Counts towards `pending` from this point, not
    /// from claim, so [`Self::join`] waits for tasks still sitting
    /// unclaimed in the heap — not only ones a worker has already picked
    /// up (mirrors `asyncio.Queue`'s `unfinished_tasks` counter).
    pub async fn put(&self, mut task: Task, delay: Option<Duration>) -> Result<()> {
        if let Some(delay) = delay {
            task.scheduled_after = Some(Utc::now() + chrono::Duration::from_std(delay)?);
        }

        let mut inner = self.inner.lock().await;
        let Some(store) = inner.store.as_ref() else {
            bail!("put called on a queue that has already been joined");
        };
        store.put(&task).await?;

        let seq = inner.next_seq;
        inner.next_seq += 1;
        let instruction = task.instruction;
        inner.heap.push(Reverse(QueueEntry { instruction, seq, task }));
        inner.pending += 1;
        drop(inner);
        self.item_ready.notify_one();
        Ok(())
    }

    /// Blocks until a claimable task is available. A task whose
    /// `scheduled_after` is in the future is put back and the caller sleeps
    /// `sleep_time` before retrying — a cooperative time-gate, not a
    /// busy-wait.
    pub async fn get(&self) -> Result<Task> {
        loop {
            let mut inner = self.inner.lock().await;
            if inner.store.is_none() {
                bail!("get called on a queue that has already been joined");
            }
            match inner.heap.pop() {
                Some(Reverse(entry)) => {
                    if let Some(scheduled_after) = entry.task.scheduled_after {
                        if scheduled_after > Utc::now() {
                            inner.heap.push(Reverse(entry));
                            drop(inner);
                            tokio::time::sleep(self.sleep_time).await;
                            continue;
                        }
                    }

                    let store = inner.store.as_ref().expect("checked above");
                    store
                        .delete(entry.task.record_id(), entry.task.site_id(), entry.task.instruction)
                        .await?;

                    let mut task = entry.task;
                    task.scheduled_after = None;
                    return Ok(task);
                }
                None => {
                    drop(inner);
                    let notified = self.item_ready.notified();
                    tokio::select! {
                        _ = notified => {}
                        _ = tokio::time::sleep(self.sleep_time) => {}
                    }
                }
            }
        }
    }

    /// Marks one previously-`get`'d task as processed, balancing the
    /// `pending` count incremented by its original [`Self::put`].
    pub async fn task_done(&self) {
        let mut inner = self.inner.lock().await;
        if inner.pending > 0 {
            inner.pending -= 1;
        }
        if inner.pending == 0 {
            self.all_done.notify_waiters();
        }
    }

    /// Blocks until every enqueued task — claimed or still waiting in the
    /// heap — has been acknowledged via [`Self::task_done`], then closes
    /// the backing store.
    pub async fn join(&self) -> Result<()> {
        loop {
            {
                let inner = self.inner.lock().await;
                if inner.pending == 0 {
                    break;
                }
            }
            let notified = self.all_done.notified();
            tokio::select! {
                _ = notified => {}
                _ = tokio::time::sleep(self.sleep_time) => {}
            }
        }

        let store = {
            let mut inner = self.inner.lock().await;
            inner.store.take()
        };
        if let Some(store) = store {
            store.close().await;
        }
        Ok(())
    }
}

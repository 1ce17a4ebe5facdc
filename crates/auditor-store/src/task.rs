use auditor_record::Record;
use chrono::{DateTime, Utc};

/// Compile-time-fixed total order: `Add` sorts before `Update` regardless of
/// insertion order, per the priority queue's `(instruction ascending,
/// insertion order)` rule (§4.D). Deliberately not a string tag — the order
/// is an invariant of the type, not of its textual representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Instruction {
    Add,
    Update,
}

impl Instruction {
    pub fn as_str(self) -> &'static str {
        match self {
            Instruction::Add => "add",
            Instruction::Update => "update",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "add" => Some(Instruction::Add),
            "update" => Some(Instruction::Update),
            _ => None,
        }
    }
}

/// A unit of submission work: a record plus the instruction (ADD/UPDATE) to
/// send it under, and the retry bookkeeping the worker pool needs.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub record: Record,
    pub instruction: Instruction,
    pub retries_remaining: u32,
    /// The `retries` the task was created with, fixed for its lifetime —
    /// kept alongside `retries_remaining` so a log line can report
    /// `(consumed/total)` without the caller having to remember the
    /// original count (§4.E attempt-count logging).
    pub retries_total: u32,
    pub scheduled_after: Option<DateTime<Utc>>,
}

impl Task {
    pub fn new(record: Record, instruction: Instruction, retries: u32) -> Self {
        Self {
            record,
            instruction,
            retries_remaining: retries,
            retries_total: retries,
            scheduled_after: None,
        }
    }

    pub fn record_id(&self) -> &str {
        self.record.record_id()
    }

    pub fn site_id(&self) -> &str {
        self.record.site_id()
    }

    /// Consumes one retry attempt. Returns `false` (without decrementing)
    /// once retries are exhausted, signaling the caller to drop the task
    /// instead of sending it (§4.E worker loop).
    pub fn try_once(&mut self) -> bool {
        if self.retries_remaining == 0 {
            return false;
        }
        self.retries_remaining -= 1;
        true
    }

    /// `(consumed, total)` attempt count for logging, valid right after a
    /// successful [`Self::try_once`].
    pub fn attempts(&self) -> (u32, u32) {
        (self.retries_total - self.retries_remaining, self.retries_total)
    }
}

use crate::error::RecordError;
use serde::{Deserialize, Serialize};

/// A named scalar weight attached to a [`crate::Component`] (e.g. `HEPSPEC: 10.5`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Score {
    name: String,
    value: f64,
}

impl Score {
    /// Fails if `value` is not finite (`NaN` / `±inf`) — the only invariant
    /// the spec places on a score.
    pub fn new(name: impl Into<String>, value: f64) -> Result<Self, RecordError> {
        if !value.is_finite() {
            return Err(RecordError::MalformedRecord(format!(
                "score value must be finite, got {value}"
            )));
        }
        Ok(Self {
            name: name.into(),
            value,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> f64 {
        self.value
    }
}

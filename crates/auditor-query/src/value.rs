use chrono::{DateTime, SecondsFormat, Utc};

/// The right-hand side of a predicate. Each variant renders to the single
/// wire representation the server's query grammar expects for that kind of
/// field (§4.B).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    DateTime(DateTime<Utc>),
    Count(u64),
    String(String),
}

impl Value {
    pub fn datetime(dt: DateTime<Utc>) -> Self {
        Value::DateTime(dt)
    }

    pub fn count(n: u64) -> Self {
        Value::Count(n)
    }

    pub fn string(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    pub(crate) fn render(&self) -> String {
        match self {
            Value::DateTime(dt) => dt.to_rfc3339_opts(SecondsFormat::Secs, true),
            Value::Count(n) => n.to_string(),
            Value::String(s) => s.clone(),
        }
    }
}

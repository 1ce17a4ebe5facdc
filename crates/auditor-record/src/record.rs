use crate::component::Component;
use crate::error::RecordError;
use crate::meta::Meta;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// In-memory + serializable form of an accounting record.
///
/// `record_id` is immutable once the record has been built — there is no
/// `with_record_id`, mirroring that a record's identity is fixed at first
/// ADD (§3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RecordWire", into = "RecordWire")]
pub struct Record {
    record_id: String,
    meta: Meta,
    components: Vec<Component>,
    start_time: DateTime<Utc>,
    stop_time: Option<DateTime<Utc>>,
    runtime: Option<i64>,
    updated_at: Option<DateTime<Utc>>,
}

impl Record {
    /// Construct from the two fields the wire contract always requires.
    pub fn new(record_id: impl Into<String>, start_time: DateTime<Utc>) -> Self {
        Self {
            record_id: record_id.into(),
            meta: Meta::new(),
            components: Vec::new(),
            start_time,
            stop_time: None,
            runtime: None,
            updated_at: None,
        }
    }

    /// Construct either from a complete set of required fields or from a
    /// serialized JSON string — never neither.
    ///
    /// This is the explicit home of [`RecordError::InsufficientParameters`];
    /// [`Record::new`] is the ergonomic path for the common case where both
    /// fields are in hand at the call site.
    pub fn from_parts(
        record_id: Option<String>,
        start_time: Option<DateTime<Utc>>,
        json_str: Option<&str>,
    ) -> Result<Self, RecordError> {
        match (record_id, start_time, json_str) {
            (Some(id), Some(start), None) => Ok(Self::new(id, start)),
            (None, None, Some(s)) => Self::from_json_str(s),
            _ => Err(RecordError::InsufficientParameters),
        }
    }

    pub fn from_json_str(s: &str) -> Result<Self, RecordError> {
        serde_json::from_str(s).map_err(|e| RecordError::MalformedRecord(e.to_string()))
    }

    pub fn with_stop_time(mut self, stop_time: DateTime<Utc>) -> Self {
        self.stop_time = Some(stop_time);
        self
    }

    pub fn with_meta(mut self, meta: Meta) -> Self {
        self.meta = meta;
        self
    }

    pub fn with_component(mut self, component: Component) -> Self {
        self.components.push(component);
        self
    }

    pub fn with_runtime(mut self, runtime: i64) -> Self {
        self.runtime = Some(runtime);
        self
    }

    pub fn record_id(&self) -> &str {
        &self.record_id
    }

    /// `meta["site_id"][0]`, or `""` if absent — the coarse site identity
    /// used to key [`Task`](auditor-queue) persistence.
    pub fn site_id(&self) -> &str {
        self.meta.first("site_id")
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn stop_time(&self) -> Option<DateTime<Utc>> {
        self.stop_time
    }

    pub fn runtime(&self) -> Option<i64> {
        self.runtime
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    pub fn meta(&self) -> &Meta {
        &self.meta
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn as_json(&self) -> String {
        serde_json::to_string(self).expect("Record serialization is infallible")
    }

    /// `stop_time >= start_time` when `stop_time` is present.
    fn validate(&self) -> Result<(), RecordError> {
        if let Some(stop) = self.stop_time {
            if stop < self.start_time {
                return Err(RecordError::MalformedRecord(format!(
                    "stop_time {stop} is before start_time {}",
                    self.start_time
                )));
            }
        }
        Ok(())
    }
}

/// The canonical JSON wire shape (§6.1). Timestamps are kept as raw strings
/// here so parsing can enforce the UTC-`Z`-suffix requirement explicitly
/// rather than relying on chrono's looser RFC 3339 offset handling.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RecordWire {
    record_id: String,
    #[serde(default)]
    meta: Meta,
    #[serde(default)]
    components: Vec<Component>,
    start_time: String,
    stop_time: Option<String>,
    runtime: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    updated_at: Option<String>,
}

fn parse_utc_timestamp(s: &str) -> Result<DateTime<Utc>, RecordError> {
    if !s.ends_with('Z') {
        return Err(RecordError::MalformedRecord(format!(
            "timestamp '{s}' is not UTC (expected a 'Z' suffix)"
        )));
    }
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RecordError::MalformedRecord(format!("invalid timestamp '{s}': {e}")))
}

fn format_utc_timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

impl TryFrom<RecordWire> for Record {
    type Error = RecordError;

    fn try_from(wire: RecordWire) -> Result<Self, Self::Error> {
        let start_time = parse_utc_timestamp(&wire.start_time)?;
        let stop_time = wire.stop_time.as_deref().map(parse_utc_timestamp).transpose()?;
        let updated_at = wire
            .updated_at
            .as_deref()
            .map(parse_utc_timestamp)
            .transpose()?;

        let record = Record {
            record_id: wire.record_id,
            meta: wire.meta,
            components: wire.components,
            start_time,
            stop_time,
            runtime: wire.runtime,
            updated_at,
        };
        record.validate()?;
        Ok(record)
    }
}

impl From<Record> for RecordWire {
    fn from(r: Record) -> Self {
        RecordWire {
            record_id: r.record_id,
            meta: r.meta,
            components: r.components,
            start_time: format_utc_timestamp(r.start_time),
            stop_time: r.stop_time.map(format_utc_timestamp),
            runtime: r.runtime,
            updated_at: r.updated_at.map(format_utc_timestamp),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{component::Component, score::Score};
    use chrono::TimeZone;

    fn sample() -> Record {
        let start = Utc.with_ymd_and_hms(2021, 12, 6, 16, 29, 43).unwrap();
        Record::new("rec-1", start)
            .with_meta(Meta::new().insert("site_id", vec!["site_A".into()]))
            .with_component(
                Component::new("comp-1", 10).with_score(Score::new("HEPSPEC", 1.0).unwrap()),
            )
    }

    #[test]
    fn json_round_trip_is_lossless() {
        let r = sample();
        let json = r.as_json();
        let back = Record::from_json_str(&json).unwrap();
        assert_eq!(r, back);
    }

    #[test]
    fn from_parts_requires_full_fields_or_json() {
        let err = Record::from_parts(None, None, None).unwrap_err();
        assert_eq!(err, RecordError::InsufficientParameters);

        let err = Record::from_parts(Some("id".into()), None, None).unwrap_err();
        assert_eq!(err, RecordError::InsufficientParameters);
    }

    #[test]
    fn from_parts_accepts_json_string() {
        let r = sample();
        let rebuilt = Record::from_parts(None, None, Some(&r.as_json())).unwrap();
        assert_eq!(r, rebuilt);
    }

    #[test]
    fn rejects_non_utc_timestamp() {
        let json = r#"{"record_id":"r","meta":{},"components":[],"start_time":"2021-12-06T16:29:43+02:00","stop_time":null,"runtime":null}"#;
        let err = Record::from_json_str(json).unwrap_err();
        match err {
            RecordError::MalformedRecord(msg) => assert!(msg.contains("not UTC")),
            other => panic!("expected MalformedRecord, got {other:?}"),
        }
    }

    #[test]
    fn rejects_stop_before_start() {
        let start = Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap();
        let stop = Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap();
        let json = Record::new("r", start).with_stop_time(stop).as_json();
        let err = Record::from_json_str(&json).unwrap_err();
        match err {
            RecordError::MalformedRecord(msg) => assert!(msg.contains("before start_time")),
            other => panic!("expected MalformedRecord, got {other:?}"),
        }
    }

    #[test]
    fn site_id_defaults_to_empty_string() {
        let start = Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap();
        let r = Record::new("r", start);
        assert_eq!(r.site_id(), "");
    }

    #[test]
    fn site_id_reads_first_meta_value() {
        assert_eq!(sample().site_id(), "site_A");
    }

    #[test]
    fn equality_is_structural_including_meta_order() {
        let a = Record::new("r", Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap())
            .with_meta(Meta::new().insert("a", vec!["1".into()]).insert("b", vec!["2".into()]));
        let b = Record::new("r", Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap())
            .with_meta(Meta::new().insert("b", vec!["2".into()]).insert("a", vec!["1".into()]));
        assert_ne!(a, b);
    }
}

//! Startup telemetry.
//!
//! Delivery is best-effort: sinks may fail, and [`emit_best_effort`] is the
//! only way the shell emits, so a failure is logged at debug and dropped.

use std::cell::RefCell;
use std::rc::Rc;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::session::SessionIdentity;
use crate::theme::ThemeValue;

pub const APP_INITIALIZED_EVENT: &str = "Application initialized";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryRecord {
    pub event: String,
    pub fields: Map<String, Value>,
}

impl TelemetryRecord {
    pub fn new(event: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            fields: Map::new(),
        }
    }

    pub fn with_field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TelemetryError {
    #[error("telemetry sink unavailable: {0}")]
    Unavailable(String),
    #[error("telemetry delivery failed: {0}")]
    Delivery(String),
}

pub trait TelemetrySink {
    fn emit(&self, record: TelemetryRecord) -> Result<(), TelemetryError>;
}

/// What the client reports about itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientEnvironment {
    pub platform: String,
    pub user_agent: String,
}

pub fn app_initialized_record(
    theme: ThemeValue,
    identity: &SessionIdentity,
    environment: &ClientEnvironment,
    at: DateTime<Utc>,
) -> TelemetryRecord {
    TelemetryRecord::new(APP_INITIALIZED_EVENT)
        .with_field("theme", theme.as_str())
        .with_field("sessionId", identity.session_id.clone())
        .with_field("userId", identity.user_id.clone())
        .with_field("platform", environment.platform.clone())
        .with_field("userAgent", environment.user_agent.clone())
        .with_field(
            "timestamp",
            at.to_rfc3339_opts(SecondsFormat::Millis, true),
        )
}

/// Emits `record` and swallows any failure.
pub fn emit_best_effort(sink: &dyn TelemetrySink, record: TelemetryRecord) {
    let event = record.event.clone();
    if let Err(error) = sink.emit(record) {
        tracing::debug!(%error, event = %event, "telemetry dropped");
    }
}

/// Keeps every record in memory. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct RecordingTelemetrySink {
    records: Rc<RefCell<Vec<TelemetryRecord>>>,
}

impl RecordingTelemetrySink {
    pub fn records(&self) -> Vec<TelemetryRecord> {
        self.records.borrow().clone()
    }
}

impl TelemetrySink for RecordingTelemetrySink {
    fn emit(&self, record: TelemetryRecord) -> Result<(), TelemetryError> {
        self.records.borrow_mut().push(record);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    struct FailingSink;

    impl TelemetrySink for FailingSink {
        fn emit(&self, _record: TelemetryRecord) -> Result<(), TelemetryError> {
            Err(TelemetryError::Delivery("offline".to_string()))
        }
    }

    fn environment() -> ClientEnvironment {
        ClientEnvironment {
            platform: "MacIntel".to_string(),
            user_agent: "Mozilla/5.0".to_string(),
        }
    }

    #[test]
    fn record_carries_identity_theme_and_timestamp() -> Result<(), String> {
        let at = Utc
            .with_ymd_and_hms(2026, 1, 2, 3, 4, 5)
            .single()
            .ok_or("fixed timestamp should be unambiguous")?;
        let record = app_initialized_record(
            ThemeValue::Dark,
            &SessionIdentity::authenticated("s1", "u1"),
            &environment(),
            at,
        );

        assert_eq!(record.event, APP_INITIALIZED_EVENT);
        assert_eq!(record.field("theme"), Some(&json!("dark")));
        assert_eq!(record.field("sessionId"), Some(&json!("s1")));
        assert_eq!(record.field("userId"), Some(&json!("u1")));
        assert_eq!(record.field("platform"), Some(&json!("MacIntel")));
        assert_eq!(record.field("userAgent"), Some(&json!("Mozilla/5.0")));
        assert_eq!(
            record.field("timestamp"),
            Some(&json!("2026-01-02T03:04:05.000Z"))
        );
        Ok(())
    }

    #[test]
    fn anonymous_record_has_null_ids() {
        let record = app_initialized_record(
            ThemeValue::Light,
            &SessionIdentity::anonymous(),
            &environment(),
            Utc::now(),
        );
        assert_eq!(record.field("sessionId"), Some(&Value::Null));
        assert_eq!(record.field("userId"), Some(&Value::Null));
    }

    #[test]
    fn failing_sink_is_swallowed() {
        emit_best_effort(&FailingSink, TelemetryRecord::new("bolt.test"));
    }
}

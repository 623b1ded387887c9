use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use bolt_app_state::{TelemetryError, TelemetryRecord, TelemetrySink};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

pub(crate) const SYSTEM_LOG_CAPACITY: usize = 500;
const SYSTEM_CATEGORY: &str = "system";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct LogEntry {
    pub(crate) id: u64,
    pub(crate) timestamp: String,
    pub(crate) level: LogLevel,
    pub(crate) category: &'static str,
    pub(crate) message: String,
    pub(crate) details: Map<String, Value>,
}

/// Bounded, newest-last system log. Oldest entries fall off first.
#[derive(Debug, Clone)]
pub(crate) struct LogStore {
    entries: VecDeque<LogEntry>,
    capacity: usize,
    next_id: u64,
}

impl LogStore {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(64)),
            capacity: capacity.max(1),
            next_id: 1,
        }
    }

    pub(crate) fn log_system(
        &mut self,
        level: LogLevel,
        message: &str,
        details: Map<String, Value>,
        at: DateTime<Utc>,
    ) -> u64 {
        let id = self.next_id;
        self.next_id = self.next_id.saturating_add(1);
        self.entries.push_back(LogEntry {
            id,
            timestamp: at.to_rfc3339_opts(SecondsFormat::Millis, true),
            level,
            category: SYSTEM_CATEGORY,
            message: message.to_string(),
            details,
        });
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
        id
    }

    pub(crate) fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.entries)
    }
}

/// Shared handle used as the shell's telemetry sink.
#[derive(Debug, Clone)]
pub(crate) struct SystemLog {
    store: Rc<RefCell<LogStore>>,
}

impl SystemLog {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            store: Rc::new(RefCell::new(LogStore::new(capacity))),
        }
    }

    pub(crate) fn record(&self, level: LogLevel, message: &str, details: Map<String, Value>) {
        if let Ok(mut store) = self.store.try_borrow_mut() {
            store.log_system(level, message, details, Utc::now());
        }
    }

    pub(crate) fn to_json(&self) -> String {
        self.store
            .try_borrow()
            .ok()
            .and_then(|store| store.to_json().ok())
            .unwrap_or_else(|| "[]".to_string())
    }

    pub(crate) fn len(&self) -> usize {
        self.store.try_borrow().map_or(0, |store| store.len())
    }
}

impl TelemetrySink for SystemLog {
    fn emit(&self, record: TelemetryRecord) -> Result<(), TelemetryError> {
        let mut store = self
            .store
            .try_borrow_mut()
            .map_err(|_| TelemetryError::Unavailable("system log is busy".to_string()))?;
        store.log_system(LogLevel::Info, &record.event, record.fields, Utc::now());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use bolt_app_state::{
        APP_INITIALIZED_EVENT, ClientEnvironment, SessionIdentity, ThemeValue,
        app_initialized_record, emit_best_effort,
    };
    use serde_json::json;

    use super::*;

    #[test]
    fn store_evicts_oldest_entries_first() {
        let mut store = LogStore::new(3);
        for index in 0..5 {
            store.log_system(LogLevel::Info, &format!("event {index}"), Map::new(), Utc::now());
        }
        let messages: Vec<&str> = store.entries().map(|entry| entry.message.as_str()).collect();
        assert_eq!(messages, vec!["event 2", "event 3", "event 4"]);
        assert_eq!(store.entries().map(|entry| entry.id).next(), Some(3));
    }

    #[test]
    fn startup_record_lands_as_system_entry() -> Result<(), serde_json::Error> {
        let log = SystemLog::new(SYSTEM_LOG_CAPACITY);
        emit_best_effort(
            &log,
            app_initialized_record(
                ThemeValue::Dark,
                &SessionIdentity::authenticated("s1", "u1"),
                &ClientEnvironment::default(),
                Utc::now(),
            ),
        );
        assert_eq!(log.len(), 1);

        let entries: Value = serde_json::from_str(&log.to_json())?;
        assert_eq!(entries[0]["category"], "system");
        assert_eq!(entries[0]["level"], "info");
        assert_eq!(entries[0]["message"], APP_INITIALIZED_EVENT);
        assert_eq!(entries[0]["details"]["sessionId"], json!("s1"));
        assert_eq!(entries[0]["details"]["theme"], json!("dark"));
        Ok(())
    }

    #[test]
    fn busy_store_reports_unavailable() {
        let log = SystemLog::new(4);
        let _guard = log.store.borrow_mut();
        assert!(matches!(
            log.emit(TelemetryRecord::new("bolt.test")),
            Err(TelemetryError::Unavailable(_))
        ));
    }
}

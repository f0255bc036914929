//! Session log types.

use crate::aoi::Category;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One classified gaze sample, stamped relative to the session start.
///
/// Serialized in the report's `raw_log` shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionEvent {
    /// Seconds since the session started
    #[serde(rename = "timestamp")]
    pub offset_seconds: f64,
    /// Gaze x in tracker screen coordinates
    pub raw_x: f64,
    /// Gaze y in tracker screen coordinates
    pub raw_y: f64,
    /// Category the sample was classified into
    #[serde(rename = "aoi_status")]
    pub category: Category,
}

impl SessionEvent {
    pub fn new(offset_seconds: f64, raw_x: f64, raw_y: f64, category: Category) -> Self {
        Self {
            offset_seconds,
            raw_x,
            raw_y,
            category,
        }
    }
}

/// The finished, read-only record of one session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionLog {
    started_at: DateTime<Utc>,
    events: Vec<SessionEvent>,
}

impl SessionLog {
    pub(crate) fn from_recorded(started_at: DateTime<Utc>, events: Vec<SessionEvent>) -> Self {
        Self { started_at, events }
    }

    /// Build a log from events gathered elsewhere (e.g. a saved report).
    /// Events are stably ordered by offset.
    pub fn from_events(started_at: DateTime<Utc>, mut events: Vec<SessionEvent>) -> Self {
        events.sort_by(|a, b| a.offset_seconds.total_cmp(&b.offset_seconds));
        Self { started_at, events }
    }

    /// Wall-clock start of the session.
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Events ordered by offset.
    pub fn events(&self) -> &[SessionEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Consume the log, returning its events.
    pub fn into_events(self) -> Vec<SessionEvent> {
        self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serializes_as_raw_log_entry() {
        let event = SessionEvent::new(1.5, 640.0, 360.0, Category::Productive);
        let json = serde_json::to_value(event).unwrap();
        assert_eq!(json["timestamp"], 1.5);
        assert_eq!(json["raw_x"], 640.0);
        assert_eq!(json["aoi_status"], "Productive");
    }

    #[test]
    fn test_from_events_orders_by_offset() {
        let log = SessionLog::from_events(
            Utc::now(),
            vec![
                SessionEvent::new(2.0, 0.0, 0.0, Category::Outside),
                SessionEvent::new(1.0, 0.0, 0.0, Category::Productive),
            ],
        );
        let offsets: Vec<f64> = log.events().iter().map(|e| e.offset_seconds).collect();
        assert_eq!(offsets, vec![1.0, 2.0]);
    }
}

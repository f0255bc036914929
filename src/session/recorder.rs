//! Append-only recorder for one tracking session.
//!
//! Starting a session locks the AOI index against mutation; stopping it
//! unlocks the index and hands the finished log off.

use crate::aoi::{AoiIndex, Category};
use crate::error::StateError;
use crate::session::types::{SessionEvent, SessionLog};
use chrono::{DateTime, Utc};
use tracing::{info, warn};

#[derive(Debug, Default)]
pub struct SessionRecorder {
    started_at: Option<DateTime<Utc>>,
    events: Vec<SessionEvent>,
}

impl SessionRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a session against `index`.
    ///
    /// The same index must be handed back to [`stop`](Self::stop); it stays
    /// locked until then.
    pub fn start(
        &mut self,
        index: &mut AoiIndex,
        start_time: DateTime<Utc>,
    ) -> Result<(), StateError> {
        if index.is_empty() {
            return Err(StateError::NoAoisDefined);
        }
        if self.is_active() || index.is_session_active() {
            return Err(StateError::SessionActive);
        }

        self.started_at = Some(start_time);
        self.events.clear();
        index.set_session_active(true);
        info!("Session started with {} AOIs", index.len());
        Ok(())
    }

    /// Append a classified sample observed at `now`.
    ///
    /// `now` must not go backwards within a session; an earlier instant is
    /// clamped to the previous event's offset.
    pub fn record(
        &mut self,
        raw_x: f64,
        raw_y: f64,
        category: Category,
        now: DateTime<Utc>,
    ) -> Result<(), StateError> {
        let start = self.started_at.ok_or(StateError::NoActiveSession)?;

        let elapsed = now - start;
        let mut offset = match elapsed.num_microseconds() {
            Some(us) => us as f64 / 1_000_000.0,
            None => elapsed.num_milliseconds() as f64 / 1000.0,
        };

        let floor = self.events.last().map_or(0.0, |e| e.offset_seconds);
        if offset < floor {
            warn!("Sample time went backwards by {:.6}s, clamping", floor - offset);
            offset = floor;
        }

        self.events.push(SessionEvent::new(offset, raw_x, raw_y, category));
        Ok(())
    }

    /// End the session and return its log.
    ///
    /// `index` must be the index the session was started against. An index
    /// that holds no session lock is rejected and the session keeps running.
    pub fn stop(&mut self, index: &mut AoiIndex) -> Result<SessionLog, StateError> {
        if !self.is_active() || !index.is_session_active() {
            return Err(StateError::NoActiveSession);
        }
        let started_at = self.started_at.take().ok_or(StateError::NoActiveSession)?;
        index.set_session_active(false);

        let events = std::mem::take(&mut self.events);
        info!("Session stopped with {} events", events.len());
        Ok(SessionLog::from_recorded(started_at, events))
    }

    pub fn is_active(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Number of events recorded so far in the active session.
    pub fn event_count(&self) -> usize {
        self.events.len()
    }
}

//! Per-tick glue between the gaze feed and a recording session.
//!
//! A [`TrackingSession`] owns the AOI index and the recorder. Each
//! [`FeedEvent`] from the collector is mapped into AOI space, classified and,
//! while a session is running, appended to the log. Losing the connection
//! ends the running session and yields its report.

use crate::aoi::{to_aoi_space, AoiIndex, Category, Point, Viewport};
use crate::collector::FeedEvent;
use crate::error::StateError;
use crate::metrics::{ReportBuilder, SessionReport};
use crate::protocol::GazeSample;
use crate::session::SessionRecorder;
use crate::stats::{create_shared_stats, SharedStreamStats};
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

/// What happened to one feed event.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// A sample was classified, and recorded if a session is running
    Classified {
        sample: GazeSample,
        point: Point,
        category: Category,
        recorded: bool,
    },
    /// The payload was dropped; the feed continues
    Malformed { reason: String },
    /// The feed ended. Carries the report of the session it cut short.
    ConnectionLost { report: Option<SessionReport> },
}

pub struct TrackingSession {
    index: AoiIndex,
    recorder: SessionRecorder,
    viewport: Option<Viewport>,
    builder: ReportBuilder,
    stats: SharedStreamStats,
}

impl TrackingSession {
    pub fn new(index: AoiIndex, builder: ReportBuilder) -> Self {
        Self {
            index,
            recorder: SessionRecorder::new(),
            viewport: None,
            builder,
            stats: create_shared_stats(),
        }
    }

    /// Map tracker coordinates through `viewport` before classifying.
    pub fn with_viewport(mut self, viewport: Option<Viewport>) -> Self {
        self.viewport = viewport;
        self
    }

    /// Count events into `stats`.
    pub fn with_stats(mut self, stats: SharedStreamStats) -> Self {
        self.stats = stats;
        self
    }

    pub fn index(&self) -> &AoiIndex {
        &self.index
    }

    /// Mutable access for defining regions. Mutations fail while a session
    /// is running.
    pub fn index_mut(&mut self) -> &mut AoiIndex {
        &mut self.index
    }

    pub fn stats(&self) -> &SharedStreamStats {
        &self.stats
    }

    /// Whether a session is running.
    pub fn is_active(&self) -> bool {
        self.recorder.is_active()
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.recorder.started_at()
    }

    pub fn event_count(&self) -> usize {
        self.recorder.event_count()
    }

    /// Start a session at `now`, locking the AOI index.
    pub fn start(&mut self, now: DateTime<Utc>) -> Result<(), StateError> {
        self.recorder.start(&mut self.index, now)
    }

    /// Apply one feed event.
    pub fn handle(&mut self, event: FeedEvent) -> TickOutcome {
        match event {
            FeedEvent::Sample {
                sample,
                received_at,
            } => self.handle_sample(sample, received_at),
            FeedEvent::Malformed { reason, .. } => {
                self.stats.record_malformed();
                TickOutcome::Malformed { reason }
            }
            FeedEvent::ConnectionLost => {
                self.stats.record_connection_lost();
                let report = if self.is_active() {
                    warn!("Connection lost during a session, finishing it");
                    self.finish().ok()
                } else {
                    None
                };
                TickOutcome::ConnectionLost { report }
            }
        }
    }

    fn handle_sample(&mut self, sample: GazeSample, received_at: DateTime<Utc>) -> TickOutcome {
        self.stats.record_sample();

        let point = to_aoi_space(self.viewport.as_ref(), sample);
        let category = self.index.classify(point);
        debug!(
            "Gaze ({:.1}, {:.1}) -> ({:.1}, {:.1}) {category}",
            sample.x, sample.y, point.x, point.y
        );

        let recorded = self.recorder.is_active()
            && self
                .recorder
                .record(sample.x, sample.y, category, received_at)
                .is_ok();
        if recorded {
            self.stats.record_event();
        }

        TickOutcome::Classified {
            sample,
            point,
            category,
            recorded,
        }
    }

    /// Stop the running session and compute its report.
    pub fn finish(&mut self) -> Result<SessionReport, StateError> {
        let log = self.recorder.stop(&mut self.index)?;
        let report = self.builder.build(&log);
        self.stats.record_session_completed();
        info!(
            "Session finished: {} events over {:.2}s",
            log.len(),
            report.session_duration
        );
        Ok(report)
    }
}

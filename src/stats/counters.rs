//! Stream statistics.
//!
//! Counts what the tracker sent and what ended up in session logs, so a user
//! can see at a glance how clean the gaze feed was. Counters are atomic and
//! can be shared across the reader thread and the session loop.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::warn;

#[derive(Debug)]
pub struct StreamStats {
    /// Samples successfully parsed
    samples_received: AtomicU64,
    /// Payloads that could not be parsed
    malformed_samples: AtomicU64,
    /// Samples written to a session log
    events_recorded: AtomicU64,
    /// Connections that dropped while streaming
    connection_losses: AtomicU64,
    /// Sessions stopped and turned into reports
    sessions_completed: AtomicU64,
    /// Reports written to disk
    reports_exported: AtomicU64,
    /// When this process began counting
    started_at: DateTime<Utc>,
    /// Path for persisting cumulative stats
    persist_path: Option<PathBuf>,
}

impl StreamStats {
    /// Create zeroed, in-memory stats.
    pub fn new() -> Self {
        Self {
            samples_received: AtomicU64::new(0),
            malformed_samples: AtomicU64::new(0),
            events_recorded: AtomicU64::new(0),
            connection_losses: AtomicU64::new(0),
            sessions_completed: AtomicU64::new(0),
            reports_exported: AtomicU64::new(0),
            started_at: Utc::now(),
            persist_path: None,
        }
    }

    /// Create stats that continue from (and save back to) `path`.
    pub fn with_persistence(path: PathBuf) -> Self {
        let mut stats = Self::new();
        stats.persist_path = Some(path);

        if let Err(e) = stats.load() {
            warn!("Could not load previous stream stats: {e}");
        }

        stats
    }

    /// Record a parsed gaze sample.
    pub fn record_sample(&self) {
        self.samples_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a payload that could not be parsed.
    pub fn record_malformed(&self) {
        self.malformed_samples.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a sample written to a session log.
    pub fn record_event(&self) {
        self.events_recorded.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a connection that dropped while streaming.
    pub fn record_connection_lost(&self) {
        self.connection_losses.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a session turned into a report.
    pub fn record_session_completed(&self) {
        self.sessions_completed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a report written to disk.
    pub fn record_report_exported(&self) {
        self.reports_exported.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of all counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            samples_received: self.samples_received.load(Ordering::Relaxed),
            malformed_samples: self.malformed_samples.load(Ordering::Relaxed),
            events_recorded: self.events_recorded.load(Ordering::Relaxed),
            connection_losses: self.connection_losses.load(Ordering::Relaxed),
            sessions_completed: self.sessions_completed.load(Ordering::Relaxed),
            reports_exported: self.reports_exported.load(Ordering::Relaxed),
            started_at: self.started_at,
            uptime_secs: (Utc::now() - self.started_at).num_seconds().max(0) as u64,
        }
    }

    /// Share of parsed payloads among all payloads, or `None` before any arrived.
    pub fn sample_quality(&self) -> Option<f64> {
        let good = self.samples_received.load(Ordering::Relaxed);
        let bad = self.malformed_samples.load(Ordering::Relaxed);
        let total = good + bad;
        (total > 0).then(|| good as f64 / total as f64)
    }

    /// Human-readable summary.
    pub fn summary(&self) -> String {
        let stats = self.snapshot();
        let quality = self
            .sample_quality()
            .map(|q| format!("{:.1}%", q * 100.0))
            .unwrap_or_else(|| "n/a".to_string());
        format!(
            "Stream Statistics:\n\
             - Samples received: {}\n\
             - Malformed samples: {}\n\
             - Sample quality: {}\n\
             - Events recorded: {}\n\
             - Connection losses: {}\n\
             - Sessions completed: {}\n\
             - Reports exported: {}",
            stats.samples_received,
            stats.malformed_samples,
            quality,
            stats.events_recorded,
            stats.connection_losses,
            stats.sessions_completed,
            stats.reports_exported,
        )
    }

    /// Save cumulative counters, if persistence is enabled.
    pub fn save(&self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let stats = self.snapshot();
            let persisted = PersistedStats {
                samples_received: stats.samples_received,
                malformed_samples: stats.malformed_samples,
                events_recorded: stats.events_recorded,
                connection_losses: stats.connection_losses,
                sessions_completed: stats.sessions_completed,
                reports_exported: stats.reports_exported,
                last_updated: Utc::now(),
            };

            let json = serde_json::to_string_pretty(&persisted).map_err(std::io::Error::other)?;
            std::fs::write(path, json)?;
        }
        Ok(())
    }

    fn load(&mut self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if path.exists() {
                let persisted = read_persisted(path)?;
                self.samples_received
                    .store(persisted.samples_received, Ordering::Relaxed);
                self.malformed_samples
                    .store(persisted.malformed_samples, Ordering::Relaxed);
                self.events_recorded
                    .store(persisted.events_recorded, Ordering::Relaxed);
                self.connection_losses
                    .store(persisted.connection_losses, Ordering::Relaxed);
                self.sessions_completed
                    .store(persisted.sessions_completed, Ordering::Relaxed);
                self.reports_exported
                    .store(persisted.reports_exported, Ordering::Relaxed);
            }
        }
        Ok(())
    }

    /// Zero every counter. Persisted totals change on the next `save`.
    pub fn reset(&self) {
        self.samples_received.store(0, Ordering::Relaxed);
        self.malformed_samples.store(0, Ordering::Relaxed);
        self.events_recorded.store(0, Ordering::Relaxed);
        self.connection_losses.store(0, Ordering::Relaxed);
        self.sessions_completed.store(0, Ordering::Relaxed);
        self.reports_exported.store(0, Ordering::Relaxed);
    }
}

impl Default for StreamStats {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub samples_received: u64,
    pub malformed_samples: u64,
    pub events_recorded: u64,
    pub connection_losses: u64,
    pub sessions_completed: u64,
    pub reports_exported: u64,
    pub started_at: DateTime<Utc>,
    pub uptime_secs: u64,
}

/// On-disk form of the cumulative counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedStats {
    pub samples_received: u64,
    pub malformed_samples: u64,
    pub events_recorded: u64,
    pub connection_losses: u64,
    pub sessions_completed: u64,
    pub reports_exported: u64,
    pub last_updated: DateTime<Utc>,
}

/// Read persisted counters without attaching them to a live instance.
pub fn read_persisted(path: &std::path::Path) -> Result<PersistedStats, std::io::Error> {
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(std::io::Error::other)
}

pub type SharedStreamStats = Arc<StreamStats>;

pub fn create_shared_stats() -> SharedStreamStats {
    Arc::new(StreamStats::new())
}

pub fn create_shared_stats_with_persistence(path: PathBuf) -> SharedStreamStats {
    Arc::new(StreamStats::with_persistence(path))
}

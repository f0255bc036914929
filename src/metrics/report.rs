//! Session report format.
//!
//! Reports are plain JSON objects consumed by save/load collaborators:
//!
//! ```text
//! {
//!   "session_duration": 12.5,
//!   "dwell_times": {"Productive": .., "Distraction": .., "Outside": ..},
//!   "dwell_percentages": {"Productive": .., "Distraction": .., "Outside": ..},
//!   "transitions": {"P_to_D": 3, "D_to_P": 2},
//!   "focus_bouts": {"count": 2, "avg_duration": .., "max_duration": .., "durations_list": [..]},
//!   "raw_log": [{"timestamp": 0.0, "raw_x": .., "raw_y": .., "aoi_status": "Productive"}, ..]
//! }
//! ```
//!
//! A loaded report must carry at least `session_duration`, `dwell_times`
//! and `raw_log`.

use crate::aoi::Category;
use crate::metrics::engine::compute;
use crate::session::{SessionEvent, SessionLog};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use uuid::Uuid;

/// Name written into report metadata.
pub const PRODUCER_NAME: &str = "focusflow";

/// Fields a report must contain to be loadable.
pub const REQUIRED_FIELDS: [&str; 3] = ["session_duration", "dwell_times", "raw_log"];

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Report is not a JSON object")]
    NotAnObject,

    #[error("Report is missing required field `{0}`")]
    MissingField(&'static str),
}

/// One value per category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryValues {
    #[serde(rename = "Productive", default)]
    pub productive: f64,
    #[serde(rename = "Distraction", default)]
    pub distraction: f64,
    #[serde(rename = "Outside", default)]
    pub outside: f64,
}

impl CategoryValues {
    /// Value for `category`.
    pub fn get(&self, category: Category) -> f64 {
        match category {
            Category::Productive => self.productive,
            Category::Distraction => self.distraction,
            Category::Outside => self.outside,
        }
    }

    pub fn get_mut(&mut self, category: Category) -> &mut f64 {
        match category {
            Category::Productive => &mut self.productive,
            Category::Distraction => &mut self.distraction,
            Category::Outside => &mut self.outside,
        }
    }

    /// Sum over all three categories.
    pub fn sum(&self) -> f64 {
        self.productive + self.distraction + self.outside
    }
}

/// Switches between productive and distracting regions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transitions {
    #[serde(rename = "P_to_D")]
    pub productive_to_distraction: u64,
    #[serde(rename = "D_to_P")]
    pub distraction_to_productive: u64,
}

/// Sustained runs of productive gaze.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FocusBouts {
    pub count: u64,
    pub avg_duration: f64,
    pub max_duration: f64,
    pub durations_list: Vec<f64>,
}

/// Provenance of a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMeta {
    pub producer: String,
    pub version: String,
    pub instance_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    pub started_at: DateTime<Utc>,
    pub generated_at: DateTime<Utc>,
}

/// Attention metrics for one finished session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    pub session_duration: f64,
    pub dwell_times: CategoryValues,
    #[serde(default)]
    pub dwell_percentages: CategoryValues,
    #[serde(default)]
    pub transitions: Transitions,
    #[serde(default)]
    pub focus_bouts: FocusBouts,
    pub raw_log: Vec<SessionEvent>,
    /// Shown by some report viewers; never computed here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub re_engagement_latency: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<ReportMeta>,
}

impl SessionReport {
    /// Parse and validate a report from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self, ReportError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let object = value.as_object().ok_or(ReportError::NotAnObject)?;
        for field in REQUIRED_FIELDS {
            if !object.contains_key(field) {
                return Err(ReportError::MissingField(field));
            }
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Load and validate a report file.
    pub fn load(path: &Path) -> Result<Self, ReportError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Write the report as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), ReportError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// File name for a session that started at `started_at`.
    pub fn file_name(started_at: DateTime<Utc>) -> String {
        format!("session_{}.json", started_at.format("%Y%m%d_%H%M%S"))
    }

    /// Human-readable summary.
    pub fn summary(&self) -> String {
        let mut out = format!("Total Session Time: {:.2} seconds\n", self.session_duration);

        if self.session_duration > 0.0 {
            out.push_str(&format!(
                "Time in Productive: {:.2}s ({:.1}%)\n\
                 Time in Distraction: {:.2}s ({:.1}%)\n\
                 Time Outside AOIs: {:.2}s ({:.1}%)\n",
                self.dwell_times.productive,
                self.dwell_percentages.productive,
                self.dwell_times.distraction,
                self.dwell_percentages.distraction,
                self.dwell_times.outside,
                self.dwell_percentages.outside,
            ));
        } else {
            out.push_str("Not enough data for dwell time calculation.\n");
        }

        out.push_str(&format!(
            "Transitions P->D: {}, D->P: {}\n",
            self.transitions.productive_to_distraction, self.transitions.distraction_to_productive
        ));

        if self.focus_bouts.count > 0 {
            out.push_str(&format!(
                "Productive Focus Bouts: Count={}, Avg={:.2}s, Max={:.2}s",
                self.focus_bouts.count, self.focus_bouts.avg_duration, self.focus_bouts.max_duration
            ));
        } else {
            out.push_str("No productive focus bouts recorded.");
        }

        out
    }
}

/// Builds reports stamped with producer metadata.
pub struct ReportBuilder {
    instance_id: Uuid,
    host: Option<String>,
    fallback_interval: f64,
}

impl ReportBuilder {
    /// `fallback_interval` is the nominal sampling interval in seconds, used
    /// as the duration of a lone sample.
    pub fn new(fallback_interval: f64) -> Self {
        Self {
            instance_id: Uuid::new_v4(),
            host: hostname::get().ok().and_then(|h| h.into_string().ok()),
            fallback_interval,
        }
    }

    /// Identifier stamped into every report from this builder.
    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    /// Compute metrics for `log` and attach report metadata.
    pub fn build(&self, log: &SessionLog) -> SessionReport {
        let mut report = compute(log, self.fallback_interval);
        report.meta = Some(ReportMeta {
            producer: PRODUCER_NAME.to_string(),
            version: crate::VERSION.to_string(),
            instance_id: self.instance_id,
            host: self.host.clone(),
            started_at: log.started_at(),
            generated_at: Utc::now(),
        });
        report
    }
}

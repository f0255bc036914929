//! FocusFlow - attention tracking against a GazeFlow eye tracker.
//!
//! This library connects to a GazeFlow tracker over its TCP API, classifies
//! each gaze sample against user-defined areas of interest (AOIs), records
//! classified samples during a session and turns the finished log into
//! attention metrics.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          FocusFlow                           │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐         │
//! │  │  Protocol   │──▶│  Collector  │──▶│  Tracking   │         │
//! │  │  (GazeFlow) │   │  (thread)   │   │  Session    │         │
//! │  └─────────────┘   └─────────────┘   └─────────────┘         │
//! │                                        │         │           │
//! │                                        ▼         ▼           │
//! │                                 ┌──────────┐ ┌──────────┐    │
//! │                                 │ AOI Index│ │ Recorder │    │
//! │                                 └──────────┘ └──────────┘    │
//! │                                                   │          │
//! │                                                   ▼          │
//! │  ┌─────────────┐                          ┌─────────────┐    │
//! │  │   Stream    │                          │   Metrics   │    │
//! │  │   Stats     │                          │   Report    │    │
//! │  └─────────────┘                          └─────────────┘    │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use focusflow::{AoiIndex, AoiKind, CollectorConfig, GazeCollector, Rect};
//! use focusflow::{ReportBuilder, TrackingSession};
//! use std::time::Duration;
//!
//! let mut index = AoiIndex::new();
//! index.add(Rect::from_corners(0.0, 0.0, 400.0, 540.0), AoiKind::Productive)?;
//! index.add(Rect::from_corners(400.0, 0.0, 810.0, 540.0), AoiKind::Distraction)?;
//!
//! let mut collector = GazeCollector::new(CollectorConfig::default());
//! collector.start()?;
//!
//! let mut tracking = TrackingSession::new(index, ReportBuilder::new(0.015));
//! tracking.start(chrono::Utc::now())?;
//! while let Ok(event) = collector.receiver().recv_timeout(Duration::from_secs(5)) {
//!     tracking.handle(event);
//! }
//! collector.stop();
//!
//! let report = tracking.finish()?;
//! println!("{}", report.summary());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod aoi;
pub mod collector;
pub mod config;
pub mod error;
pub mod metrics;
pub mod protocol;
pub mod session;
pub mod stats;
pub mod tracker;

// Re-export key types at crate root for convenience
pub use aoi::{AoiIndex, AoiKind, Category, Point, Rect, Viewport};
pub use collector::{CollectorConfig, FeedEvent, GazeCollector};
pub use config::{Config, TrackerConfig};
pub use error::{Error, Result};
pub use metrics::{compute, ReportBuilder, SessionReport};
pub use protocol::{ClientState, GazeSample, GazeSessionClient};
pub use session::{SessionLog, SessionRecorder};
pub use stats::{SharedStreamStats, StreamStats};
pub use tracker::{TickOutcome, TrackingSession};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Notice shown before a recording session starts.
pub const RECORDING_NOTICE: &str = r#"
╔══════════════════════════════════════════════════════════════════╗
║                  FOCUSFLOW - RECORDING NOTICE                    ║
╠══════════════════════════════════════════════════════════════════╣
║                                                                  ║
║  While a session runs, FocusFlow records:                        ║
║    • Gaze coordinates reported by the eye tracker                ║
║    • Which area of interest each sample fell into                ║
║    • When each sample arrived, relative to session start         ║
║                                                                  ║
║  Nothing leaves this machine. The session log is written to      ║
║  a local JSON report when the session ends.                      ║
║                                                                  ║
║  Press Ctrl+C to stop the session at any time.                   ║
║                                                                  ║
╚══════════════════════════════════════════════════════════════════╝
"#;

//! Events delivered by the gaze collector.

use crate::protocol::GazeSample;
use chrono::{DateTime, Utc};

/// One polling outcome from the reader thread.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    /// A parsed sample and the instant it was read
    Sample {
        sample: GazeSample,
        received_at: DateTime<Utc>,
    },
    /// A payload arrived but could not be parsed; the feed continues
    Malformed {
        reason: String,
        received_at: DateTime<Utc>,
    },
    /// The tracker went away; no further events follow
    ConnectionLost,
}

impl FeedEvent {
    /// A sample stamped with the current time.
    pub fn sample(sample: GazeSample) -> Self {
        FeedEvent::Sample {
            sample,
            received_at: Utc::now(),
        }
    }

    pub fn malformed(reason: impl Into<String>) -> Self {
        FeedEvent::Malformed {
            reason: reason.into(),
            received_at: Utc::now(),
        }
    }

    pub fn received_at(&self) -> Option<DateTime<Utc>> {
        match self {
            FeedEvent::Sample { received_at, .. } | FeedEvent::Malformed { received_at, .. } => {
                Some(*received_at)
            }
            FeedEvent::ConnectionLost => None,
        }
    }

    /// Whether no further events follow this one.
    pub fn is_terminal(&self) -> bool {
        matches!(self, FeedEvent::ConnectionLost)
    }
}

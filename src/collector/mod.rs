//! Gaze feed collection.
//!
//! A reader thread owns the tracker connection and forwards every polling
//! outcome to the session loop as a [`FeedEvent`].

pub mod gaze;
pub mod types;

pub use gaze::{CollectorConfig, GazeCollector};
pub use types::FeedEvent;

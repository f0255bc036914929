//! Session recording.

pub mod recorder;
pub mod types;

pub use recorder::SessionRecorder;
pub use types::{SessionEvent, SessionLog};

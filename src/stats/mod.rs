//! Statistics about the gaze feed and recorded sessions.

pub mod counters;

pub use counters::{
    create_shared_stats, create_shared_stats_with_persistence, read_persisted, PersistedStats,
    SharedStreamStats, StatsSnapshot, StreamStats,
};

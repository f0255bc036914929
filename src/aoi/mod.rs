//! Areas of interest.
//!
//! This module contains:
//! - Geometry and category types
//! - The index that classifies gaze points
//! - Screen-to-canvas mapping
//! - JSON persistence of AOI definitions

pub mod index;
pub mod store;
pub mod types;
pub mod viewport;

pub use index::AoiIndex;
pub use store::{load_index, save_index, StoreError};
pub use types::{AoiDefinition, AoiKind, AreaOfInterest, Category, Point, Rect};
pub use viewport::{to_aoi_space, Viewport};

//! Mapping from tracker screen coordinates into AOI space.
//!
//! AOIs are usually drawn on a scaled-down preview of the screen. Gaze
//! samples arrive in full screen pixels, so they are scaled into the preview
//! before classification. Raw coordinates are still what gets recorded.

use crate::aoi::types::Point;
use crate::protocol::GazeSample;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub screen_width: f64,
    pub screen_height: f64,
    pub canvas_width: f64,
    pub canvas_height: f64,
}

impl Viewport {
    pub fn new(
        screen_width: f64,
        screen_height: f64,
        canvas_width: f64,
        canvas_height: f64,
    ) -> Self {
        Self {
            screen_width,
            screen_height,
            canvas_width,
            canvas_height,
        }
    }

    /// Scale a sample into canvas space. An unknown (non-positive) screen
    /// size passes coordinates through unchanged.
    pub fn map(&self, sample: GazeSample) -> Point {
        if self.screen_width > 0.0 && self.screen_height > 0.0 {
            Point::new(
                sample.x / self.screen_width * self.canvas_width,
                sample.y / self.screen_height * self.canvas_height,
            )
        } else {
            Point::from(sample)
        }
    }
}

/// Map through an optional viewport; `None` is the identity.
pub fn to_aoi_space(viewport: Option<&Viewport>, sample: GazeSample) -> Point {
    match viewport {
        Some(v) => v.map(sample),
        None => Point::from(sample),
    }
}

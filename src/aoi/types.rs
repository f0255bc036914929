//! Geometry and category types for areas of interest.

use crate::protocol::GazeSample;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A point in AOI space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<GazeSample> for Point {
    fn from(sample: GazeSample) -> Self {
        Self::new(sample.x, sample.y)
    }
}

/// Axis-aligned rectangle stored as normalized corners (x1 <= x2, y1 <= y2).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl Rect {
    /// Build a rectangle from any two opposite corners.
    pub fn from_corners(ax: f64, ay: f64, bx: f64, by: f64) -> Self {
        Self {
            x1: ax.min(bx),
            y1: ay.min(by),
            x2: ax.max(bx),
            y2: ay.max(by),
        }
    }

    /// Same corners, sorted into (min, min, max, max) order.
    pub fn normalized(&self) -> Self {
        Self::from_corners(self.x1, self.y1, self.x2, self.y2)
    }

    pub fn width(&self) -> f64 {
        (self.x2 - self.x1).abs()
    }

    pub fn height(&self) -> f64 {
        (self.y2 - self.y1).abs()
    }

    /// Width times height.
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Non-degenerate and finite.
    pub fn is_valid(&self) -> bool {
        [self.x1, self.y1, self.x2, self.y2]
            .iter()
            .all(|v| v.is_finite())
            && self.width() > 0.0
            && self.height() > 0.0
    }

    /// Inclusive on all four edges. Expects a normalized rectangle.
    pub fn contains(&self, point: Point) -> bool {
        self.x1 <= point.x && point.x <= self.x2 && self.y1 <= point.y && point.y <= self.y2
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}) - ({}, {})", self.x1, self.y1, self.x2, self.y2)
    }
}

impl FromStr for Rect {
    type Err = String;

    /// Parse `x1,y1,x2,y2`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values: Vec<f64> = s
            .split(',')
            .map(|part| part.trim().parse::<f64>())
            .collect::<Result<_, _>>()
            .map_err(|e| format!("invalid coordinate in {s:?}: {e}"))?;

        match values.as_slice() {
            [x1, y1, x2, y2] => Ok(Self::from_corners(*x1, *y1, *x2, *y2)),
            _ => Err(format!("expected x1,y1,x2,y2 but got {s:?}")),
        }
    }
}

/// Classification of a gaze point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Category {
    Productive,
    Distraction,
    #[default]
    Outside,
}

impl Category {
    pub const ALL: [Category; 3] = [
        Category::Productive,
        Category::Distraction,
        Category::Outside,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Productive => "Productive",
            Category::Distraction => "Distraction",
            Category::Outside => "Outside",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "productive" => Ok(Category::Productive),
            "distraction" => Ok(Category::Distraction),
            "outside" => Ok(Category::Outside),
            other => Err(format!("unknown category: {other}")),
        }
    }
}

/// The categories an AOI can be tagged with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AoiKind {
    Productive,
    Distraction,
}

impl From<AoiKind> for Category {
    fn from(kind: AoiKind) -> Self {
        match kind {
            AoiKind::Productive => Category::Productive,
            AoiKind::Distraction => Category::Distraction,
        }
    }
}

impl fmt::Display for AoiKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Category::from(*self).fmt(f)
    }
}

impl FromStr for AoiKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.parse::<Category>()? {
            Category::Productive => Ok(AoiKind::Productive),
            Category::Distraction => Ok(AoiKind::Distraction),
            Category::Outside => Err("an AOI cannot be tagged Outside".to_string()),
        }
    }
}

/// A region registered in an [`AoiIndex`](crate::aoi::AoiIndex).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AreaOfInterest {
    pub rect: Rect,
    pub kind: AoiKind,
    pub insertion_order: u64,
}

impl AreaOfInterest {
    /// Category a point inside this region resolves to.
    pub fn category(&self) -> Category {
        self.kind.into()
    }
}

/// Persistable AOI definition (no insertion order; that is assigned on add).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AoiDefinition {
    pub rect: Rect,
    pub kind: AoiKind,
}

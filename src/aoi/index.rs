//! Region index used to classify gaze points.
//!
//! Overlapping regions are resolved by specificity: the smallest containing
//! rectangle wins, and among equal areas the earliest-defined one wins. The
//! index refuses mutation while a recording session is active.

use crate::aoi::types::{AoiDefinition, AoiKind, AreaOfInterest, Category, Point, Rect};
use crate::error::StateError;
use std::cmp::Ordering;
use tracing::debug;

#[derive(Debug, Default)]
pub struct AoiIndex {
    aois: Vec<AreaOfInterest>,
    next_order: u64,
    session_active: bool,
}

impl AoiIndex {
    /// Create an empty, unlocked index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild an index from persisted definitions, in order.
    pub fn from_definitions(definitions: &[AoiDefinition]) -> Result<Self, StateError> {
        let mut index = Self::new();
        for def in definitions {
            index.add(def.rect, def.kind)?;
        }
        Ok(index)
    }

    /// Add a region. Returns its insertion order.
    pub fn add(&mut self, rect: Rect, kind: AoiKind) -> Result<u64, StateError> {
        if !rect.is_valid() {
            return Err(StateError::InvalidGeometry);
        }
        if self.session_active {
            return Err(StateError::SessionActive);
        }

        let order = self.next_order;
        self.next_order += 1;
        self.aois.push(AreaOfInterest {
            rect: rect.normalized(),
            kind,
            insertion_order: order,
        });
        debug!("Added {kind} AOI #{order} at {}", rect.normalized());
        Ok(order)
    }

    /// Remove every region and reset insertion numbering.
    pub fn clear(&mut self) -> Result<(), StateError> {
        if self.session_active {
            return Err(StateError::SessionActive);
        }
        self.aois.clear();
        self.next_order = 0;
        Ok(())
    }

    /// Resolve a point to a category.
    pub fn classify(&self, point: Point) -> Category {
        self.resolve(point)
            .map(AreaOfInterest::category)
            .unwrap_or_default()
    }

    /// The region that wins for `point`, if any.
    pub fn resolve(&self, point: Point) -> Option<&AreaOfInterest> {
        self.aois
            .iter()
            .filter(|aoi| aoi.rect.contains(point))
            .min_by(|a, b| {
                a.rect
                    .area()
                    .partial_cmp(&b.rect.area())
                    .unwrap_or(Ordering::Equal)
                    .then(a.insertion_order.cmp(&b.insertion_order))
            })
    }

    /// Number of defined regions.
    pub fn len(&self) -> usize {
        self.aois.len()
    }

    /// Whether no regions are defined.
    pub fn is_empty(&self) -> bool {
        self.aois.is_empty()
    }

    /// Regions in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &AreaOfInterest> {
        self.aois.iter()
    }

    /// Whether a session currently holds the lock.
    pub fn is_session_active(&self) -> bool {
        self.session_active
    }

    pub(crate) fn set_session_active(&mut self, active: bool) {
        self.session_active = active;
    }

    /// Persistable form of every region, in insertion order.
    pub fn definitions(&self) -> Vec<AoiDefinition> {
        self.aois
            .iter()
            .map(|aoi| AoiDefinition {
                rect: aoi.rect,
                kind: aoi.kind,
            })
            .collect()
    }
}

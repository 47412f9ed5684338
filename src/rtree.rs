//! R-tree based collision detection for labels.
//!
//! Alternative to the bucket grid when label extents vary widely.

use glam::Vec2;
use rstar::{RTree, RTreeObject, AABB};

use crate::collision::{CollisionIndex, ScreenRect};
use crate::element::ElementKey;

/// A claimed rectangle for R-tree storage.
#[derive(Debug, Clone, Copy)]
pub struct ClaimedRect {
    pub id: ElementKey,
    pub rect: ScreenRect,
}

impl RTreeObject for ClaimedRect {
    type Envelope = AABB<[f32; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.rect.min.to_array(), self.rect.max.to_array())
    }
}

/// R-tree collision index.
pub struct LabelRTree {
    tree: RTree<ClaimedRect>,
    width: f32,
    height: f32,
}

impl LabelRTree {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            tree: RTree::new(),
            width: width as f32,
            height: height as f32,
        }
    }

    fn hits_clipped(&self, rect: &ScreenRect) -> bool {
        let envelope = AABB::from_corners(rect.min.to_array(), rect.max.to_array());
        self.tree
            .locate_in_envelope_intersecting(&envelope)
            .any(|existing| existing.rect.overlaps(rect))
    }

    /// All claims intersecting the given rectangle.
    pub fn query_intersecting(&self, rect: &ScreenRect) -> Vec<ClaimedRect> {
        let envelope = AABB::from_corners(rect.min.to_array(), rect.max.to_array());
        self.tree.locate_in_envelope_intersecting(&envelope).copied().collect()
    }
}

impl CollisionIndex for LabelRTree {
    fn reset(&mut self, width: u32, height: u32) {
        self.width = width as f32;
        self.height = height as f32;
        self.tree = RTree::new();
    }

    fn intersects(&self, rect: &ScreenRect) -> bool {
        let clipped = rect.clip(self.width, self.height);
        !clipped.is_empty() && self.hits_clipped(&clipped)
    }

    fn allocate(&mut self, rect: ScreenRect, id: ElementKey) -> bool {
        let clipped = rect.clip(self.width, self.height);
        if clipped.is_empty() || self.hits_clipped(&clipped) {
            return false;
        }
        self.tree.insert(ClaimedRect { id, rect: clipped });
        true
    }

    fn owner_at(&self, point: Vec2) -> Option<ElementKey> {
        let envelope = AABB::from_point(point.to_array());
        self.tree
            .locate_in_envelope_intersecting(&envelope)
            .find(|claim| claim.rect.contains(point))
            .map(|claim| claim.id)
    }

    fn len(&self) -> usize {
        self.tree.size()
    }
}

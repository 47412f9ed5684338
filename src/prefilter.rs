//! Cheap per-candidate rejection tests run before any screen-space work.

use glam::Vec3;

use crate::element::{Anchor, TextElement};
use crate::loading::AssetRegistry;
use crate::poi::PoiTableResolver;
use crate::state_cache::TextElementStateCache;
use crate::tile::Tile;
use crate::view::ViewState;

/// Outcome of the pre-placement checks for one candidate in one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlacementResult {
    /// Passed; carries the distance from the view reference point.
    Ok { view_distance: f32 },
    /// Depends on an asset that is still loading; retry next frame.
    NotReady,
    Invisible,
    TooFar,
    /// Another instance of the same key already won this frame.
    Duplicate,
}

impl PlacementResult {
    pub fn is_ok(&self) -> bool {
        matches!(self, PlacementResult::Ok { .. })
    }

    pub fn view_distance(&self) -> Option<f32> {
        match self {
            PlacementResult::Ok { view_distance } => Some(*view_distance),
            _ => None,
        }
    }
}

/// Shared inputs of the pre-filter for one frame.
pub struct PlacementContext<'a> {
    pub view: &'a ViewState,
    pub poi: &'a dyn PoiTableResolver,
    pub assets: &'a AssetRegistry,
    /// See `PlacementConfig::facing_dot_threshold`.
    pub facing_dot_threshold: f32,
}

/// World origin of a tile's element anchors.
#[inline]
pub fn tile_origin(tile: &Tile, tile_world_offset: Vec3) -> Vec3 {
    tile.center + tile_world_offset
}

/// Absolute world position of an element: the anchor point, or the first
/// point of a path.
pub fn element_world_position(element: &TextElement, origin: Vec3) -> Vec3 {
    match &element.anchor {
        Anchor::Point(p) => *p + origin,
        Anchor::Path(path) => path.first().copied().unwrap_or(Vec3::ZERO) + origin,
    }
}

/// Distance from the view reference point, plus the world point it was
/// measured to. Paths use the nearer of their two end points.
pub fn view_distance(element: &TextElement, origin: Vec3, view: &ViewState) -> (f32, Vec3) {
    match &element.anchor {
        Anchor::Point(p) => {
            let world = *p + origin;
            (world.distance(view.world_center), world)
        }
        Anchor::Path(path) => {
            let first = path.first().copied().unwrap_or(Vec3::ZERO) + origin;
            let last = path.last().copied().unwrap_or(Vec3::ZERO) + origin;
            let d_first = first.distance(view.world_center);
            let d_last = last.distance(view.world_center);
            if d_last < d_first {
                (d_last, last)
            } else {
                (d_first, first)
            }
        }
    }
}

/// Checks 1-5: visibility, readiness, zoom range and distance. Does not
/// touch the deduplication table.
pub fn evaluate_element(
    element: &TextElement,
    tile: &Tile,
    tile_world_offset: Vec3,
    ctx: &PlacementContext<'_>,
    max_view_distance: Option<f32>,
) -> PlacementResult {
    if !element.visible {
        return PlacementResult::Invisible;
    }

    let rule = match ctx.poi.update_poi_from_poi_table(element) {
        Some(rule) => rule,
        None => return PlacementResult::NotReady,
    };
    if !ctx.assets.is_font_ready(element.content.font_catalog()) {
        return PlacementResult::NotReady;
    }

    let (visible, min_zoom, max_zoom) = rule.apply(element);
    let zoom = ctx.view.zoom_level;
    if !visible || zoom < min_zoom || zoom > max_zoom {
        return PlacementResult::Invisible;
    }

    let origin = tile_origin(tile, tile_world_offset);
    let (distance, reference) = view_distance(element, origin, ctx.view);

    if let Some(max_distance) = max_view_distance {
        if !element.ignore_distance && distance > max_distance {
            return PlacementResult::TooFar;
        }
        if ctx.view.projection.is_spherical() {
            let facing = reference.normalize_or_zero().dot(ctx.view.look_at_vector);
            if facing >= ctx.facing_dot_threshold {
                return PlacementResult::TooFar;
            }
        }
    }

    PlacementResult::Ok {
        view_distance: distance,
    }
}

/// Check 6: deduplication of a candidate that passed checks 1-5.
///
/// The renderer runs checks 1-5 while gathering and this step afterwards in
/// rank order, so the best ranked instance of a key wins.
pub fn deduplicate_candidate(
    element: &TextElement,
    result: PlacementResult,
    cache: &mut TextElementStateCache,
    frame: u64,
) -> PlacementResult {
    if result.is_ok() && !cache.deduplicate_element(element, frame) {
        return PlacementResult::Duplicate;
    }
    result
}

/// Full pre-filter for a single candidate: checks 1-5 followed by
/// deduplication. Equivalent to [`evaluate_element`] then
/// [`deduplicate_candidate`].
#[allow(clippy::too_many_arguments)]
pub fn check_ready_for_placement(
    element: &TextElement,
    tile: &Tile,
    tile_world_offset: Vec3,
    ctx: &PlacementContext<'_>,
    cache: &mut TextElementStateCache,
    max_view_distance: Option<f32>,
    frame: u64,
) -> PlacementResult {
    let result = evaluate_element(element, tile, tile_world_offset, ctx, max_view_distance);
    deduplicate_candidate(element, result, cache, frame)
}

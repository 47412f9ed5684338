//! Per-frame label placement: the text elements renderer.
//!
//! One [`TextElementsRenderer::place_text`] call processes one complete frame:
//!
//! 1. gather candidates from the visible tiles (only when the tile set changed),
//! 2. run the pre-filter and rank Ok candidates by priority, then view distance,
//! 3. deduplicate, project and collision-test in rank order,
//! 4. fade accepted labels in and submit them,
//! 5. fade out every other tracked label, submitting it while still visible.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use glam::{Vec2, Vec3};

use crate::canvas::{LabelPlacement, TextCanvas};
use crate::collision::{CollisionIndex, ScreenCollisionGrid, ScreenRect};
use crate::config::{CollisionBackend, PlacementConfig};
use crate::diagnostics::{Diagnostics, NoopDiagnostics};
use crate::element::{Anchor, ElementKey, LabelContent, TextElement};
use crate::error::LabelResult;
use crate::loading::AssetRegistry;
use crate::path_layout::{compute_path_length, layout_path_label, GlyphPlacement};
use crate::poi::{PoiTableResolver, PoiTables};
use crate::prefilter::{deduplicate_candidate, evaluate_element, tile_origin, PlacementContext, PlacementResult};
use crate::projection::{Camera, ScreenProjector};
use crate::rtree::LabelRTree;
use crate::state::LabelState;
use crate::state_cache::TextElementStateCache;
use crate::tile::{Tile, TileResultGroup};
use crate::view::ViewState;

/// Counters for one placed frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameStats {
    /// Frame was skipped because the clock was uninitialised.
    pub skipped: bool,
    pub candidates: usize,
    pub placed: usize,
    pub fading_out: usize,
    pub collided: usize,
    /// Ok candidates turned away by the `max_visible_labels` cap.
    pub capped: usize,
    pub not_ready: usize,
    pub invisible: usize,
    pub too_far: usize,
    pub duplicates: usize,
    pub evicted: usize,
    /// Keys accepted this frame, in placement order.
    pub placed_keys: Vec<ElementKey>,
}

/// Size multiplier for a label at `distance`.
///
/// `1 + distance_scale * (1 - distance / look_at_distance)`, floored at
/// `min_scale`. A `distance_scale` of 0 keeps labels at constant size.
pub fn distance_scale_factor(distance_scale: f32, distance: f32, look_at_distance: f32, min_scale: f32) -> f32 {
    if distance_scale == 0.0 {
        return 1.0;
    }
    (1.0 + distance_scale * (1.0 - distance / look_at_distance)).max(min_scale)
}

/// Opacity multiplier for labels approaching the max view distance.
pub fn distance_fade_factor(element: &TextElement, distance: f32, max_distance: Option<f32>) -> f32 {
    let (Some(near), Some(far), Some(max)) = (element.fade_near, element.fade_far, max_distance) else {
        return 1.0;
    };
    let (near, far) = (near * max, far * max);
    if distance <= near {
        1.0
    } else if distance >= far {
        0.0
    } else {
        1.0 - (distance - near) / (far - near)
    }
}

/// Screen anchor, bounds and path glyphs of `element` under the current
/// projection, or `None` if it cannot be drawn (off screen, path too short).
fn layout_on_screen(
    projector: &ScreenProjector,
    element: &TextElement,
    origin: Vec3,
    scale: f32,
    margin: f32,
) -> Option<(Vec2, ScreenRect, Vec<GlyphPlacement>)> {
    match &element.anchor {
        Anchor::Point(p) => {
            let screen = projector.project_on_screen(*p + origin, margin)? + element.screen_offset;
            let rect = ScreenRect::from_center(screen, element.content.size() * scale);
            Some((screen, rect, Vec::new()))
        }
        Anchor::Path(path) => {
            let LabelContent::Glyphs(run) = &element.content else {
                return None;
            };
            let mut runs = visible_runs(projector, path, origin, margin, element.screen_offset);
            runs.sort_by(|a, b| compute_path_length(b).total_cmp(&compute_path_length(a)));
            let layout = runs
                .iter()
                .find_map(|points| layout_path_label(points, &run.advances, run.line_height, scale))?;
            let center = (layout.bounds.min + layout.bounds.max) * 0.5;
            Some((center, layout.bounds, layout.glyphs))
        }
    }
}

/// Splits a projected polyline into runs of consecutive on-screen vertices.
/// Runs with fewer than two vertices are dropped.
fn visible_runs(
    projector: &ScreenProjector,
    path: &[Vec3],
    origin: Vec3,
    margin: f32,
    screen_offset: Vec2,
) -> Vec<Vec<Vec2>> {
    let mut runs = Vec::new();
    let mut current: Vec<Vec2> = Vec::new();
    for point in path {
        match projector.project_on_screen(*point + origin, margin) {
            Some(screen) => current.push(screen + screen_offset),
            None if current.len() >= 2 => runs.push(std::mem::take(&mut current)),
            None => current.clear(),
        }
    }
    if current.len() >= 2 {
        runs.push(current);
    }
    runs
}

/// `placement` moved to where its anchor projects now. `None` if it no longer
/// projects on screen.
fn reproject(projector: &ScreenProjector, placement: &LabelPlacement, margin: f32) -> Option<LabelPlacement> {
    let (screen_pos, _, glyphs) =
        layout_on_screen(projector, &placement.element, placement.origin, placement.scale, margin)?;
    Some(LabelPlacement {
        element: Arc::clone(&placement.element),
        origin: placement.origin,
        screen_pos,
        scale: placement.scale,
        glyphs,
        distance_fade: placement.distance_fade,
    })
}

#[derive(Debug, Clone)]
struct GatheredElement {
    element: Arc<TextElement>,
    tile: Arc<Tile>,
}

/// Places text elements of visible tiles each frame and drives their fades.
pub struct TextElementsRenderer {
    config: PlacementConfig,
    projector: ScreenProjector,
    collision: Box<dyn CollisionIndex>,
    cache: TextElementStateCache,
    poi: Arc<dyn PoiTableResolver>,
    assets: AssetRegistry,
    diagnostics: Box<dyn Diagnostics>,
    gathered: Vec<GatheredElement>,
    gathered_valid: bool,
    frame_number: u64,
}

impl TextElementsRenderer {
    /// Create a renderer for a `width` x `height` viewport.
    pub fn new(config: PlacementConfig, width: u32, height: u32) -> LabelResult<Self> {
        config.validate()?;
        let collision: Box<dyn CollisionIndex> = match config.collision_backend {
            CollisionBackend::Grid => Box::new(ScreenCollisionGrid::new(width, height, config.grid_cell_size)),
            CollisionBackend::RTree => Box::new(LabelRTree::new(width, height)),
        };
        Ok(Self {
            cache: TextElementStateCache::new(config.max_unseen_frames),
            projector: ScreenProjector::new(width, height),
            collision,
            poi: Arc::new(PoiTables::new()),
            assets: AssetRegistry::new(),
            diagnostics: Box::new(NoopDiagnostics),
            gathered: Vec::new(),
            gathered_valid: false,
            frame_number: 0,
            config,
        })
    }

    pub fn with_poi_resolver(mut self, resolver: Arc<dyn PoiTableResolver>) -> Self {
        self.poi = resolver;
        self
    }

    pub fn with_diagnostics(mut self, diagnostics: Box<dyn Diagnostics>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn config(&self) -> &PlacementConfig {
        &self.config
    }

    pub fn assets(&self) -> &AssetRegistry {
        &self.assets
    }

    /// Font catalogs are registered here by the loader side.
    pub fn assets_mut(&mut self) -> &mut AssetRegistry {
        &mut self.assets
    }

    /// Re-synchronize the projector with the camera and viewport.
    pub fn update_camera(&mut self, camera: &Camera, width: u32, height: u32) {
        self.projector.update(camera, width, height);
    }

    pub fn projector(&self) -> &ScreenProjector {
        &self.projector
    }

    /// Number of frames placed so far.
    pub fn frame_number(&self) -> u64 {
        self.frame_number
    }

    /// Persistent state of a label, if tracked.
    pub fn label_state(&self, key: ElementKey) -> Option<&LabelState> {
        self.cache.get(key)
    }

    pub fn tracked_labels(&self) -> usize {
        self.cache.len()
    }

    /// Any asset placement depends on is still loading.
    pub fn loading(&self) -> bool {
        self.assets.loading() || self.poi.load_signals().iter().any(|s| s.is_loading())
    }

    /// Resolve once every font catalog and POI table finished loading.
    pub async fn wait_loaded(&self) -> LabelResult<()> {
        self.assets.wait_loaded().await?;
        for signal in self.poi.load_signals() {
            signal.wait().await?;
        }
        Ok(())
    }

    /// Resolve once the default font catalog is available.
    pub async fn wait_initialized(&self) -> LabelResult<()> {
        self.assets.wait_initialized().await
    }

    /// Drop all label state and cached candidates.
    pub fn clear(&mut self) {
        self.cache.clear();
        self.gathered.clear();
        self.gathered_valid = false;
    }

    /// Place one frame.
    ///
    /// `time` is a caller supplied monotonic clock in milliseconds; values
    /// `<= 0` mean the clock is not initialised and the frame is skipped.
    pub fn place_text(
        &mut self,
        groups: &[TileResultGroup],
        view: &ViewState,
        time: f64,
        tiles_changed: bool,
        canvas: &mut dyn TextCanvas,
    ) -> FrameStats {
        let mut stats = FrameStats::default();
        if time <= 0.0 {
            stats.skipped = true;
            return stats;
        }

        self.frame_number += 1;
        let frame = self.frame_number;
        if tiles_changed || !self.gathered_valid {
            self.gather(groups);
        }
        let (width, height) = self.projector.screen_size();
        self.collision.reset(width as u32, height as u32);

        let max_distance = view.max_visibility_distance;
        let mut ranked: Vec<(usize, f32)> = Vec::new();
        let mut hidden: HashSet<ElementKey> = HashSet::new();
        {
            let ctx = PlacementContext {
                view,
                poi: self.poi.as_ref(),
                assets: &self.assets,
                facing_dot_threshold: self.config.facing_dot_threshold,
            };
            for (index, gathered) in self.gathered.iter().enumerate() {
                let element = &gathered.element;
                let offset = view.projection.world_offset(gathered.tile.offset);
                let result = evaluate_element(element, &gathered.tile, offset, &ctx, max_distance);
                if let Some(state) = self.cache.get_mut(element.key) {
                    state.last_frame = frame;
                }
                match result {
                    PlacementResult::Ok { view_distance } => ranked.push((index, view_distance)),
                    PlacementResult::Invisible => {
                        stats.invisible += 1;
                        hidden.insert(element.key);
                    }
                    PlacementResult::NotReady => stats.not_ready += 1,
                    PlacementResult::TooFar => stats.too_far += 1,
                    PlacementResult::Duplicate => stats.duplicates += 1,
                }
                if !result.is_ok() {
                    self.diagnostics.candidate_rejected(element.key, result);
                }
            }
        }
        stats.candidates = self.gathered.len();

        let gathered = &self.gathered;
        ranked.sort_by(|a, b| {
            let pa = gathered[a.0].element.priority;
            let pb = gathered[b.0].element.priority;
            pb.cmp(&pa).then(a.1.total_cmp(&b.1)).then(a.0.cmp(&b.0))
        });

        let fade_duration = self.config.fade_duration_ms;
        let mut accepted: HashSet<ElementKey> = HashSet::new();
        let mut lost: HashMap<ElementKey, Option<LabelPlacement>> = HashMap::new();

        for (index, view_distance) in ranked {
            let GatheredElement { element, tile } = self.gathered[index].clone();
            let key = element.key;

            let result = deduplicate_candidate(&element, PlacementResult::Ok { view_distance }, &mut self.cache, frame);
            if !result.is_ok() {
                stats.duplicates += 1;
                self.diagnostics.candidate_rejected(key, result);
                continue;
            }
            if accepted.len() >= self.config.max_visible_labels {
                stats.capped += 1;
                lost.insert(key, None);
                continue;
            }

            let offset = view.projection.world_offset(tile.offset);
            let Some((placement, rect)) =
                self.compute_placement(&element, tile_origin(&tile, offset), view_distance, max_distance)
            else {
                lost.insert(key, None);
                continue;
            };

            if !self.claim_space(&element, rect) {
                stats.collided += 1;
                self.diagnostics.candidate_collided(key);
                lost.insert(key, Some(placement));
                continue;
            }

            let state = self.cache.get_or_create_state(key);
            state.last_frame = frame;
            state.fade_in(time, fade_duration);
            state.screen_rect = Some(rect);
            placement.submit(canvas, state.opacity());
            state.last_placement = Some(placement);

            accepted.insert(key);
            stats.placed_keys.push(key);
        }
        stats.placed = accepted.len();

        let projector = &self.projector;
        let margin = self.config.screen_margin;
        for (key, state) in self.cache.iter_mut() {
            if accepted.contains(key) {
                continue;
            }
            if hidden.contains(key) && !lost.contains_key(key) {
                state.hide();
                continue;
            }
            state.fade_out(time, fade_duration);
            if let Some(Some(fresh)) = lost.remove(key) {
                state.last_placement = Some(fresh);
            } else if state.is_visible() {
                // Follow the map; keep the last position once the anchor leaves the screen.
                if let Some(moved) = state.last_placement.as_ref().and_then(|p| reproject(projector, p, margin)) {
                    state.last_placement = Some(moved);
                }
            }
            if state.is_visible() {
                if let Some(placement) = &state.last_placement {
                    placement.submit(canvas, state.opacity());
                    stats.fading_out += 1;
                }
            }
        }

        if frame % self.config.sweep_interval_frames == 0 {
            stats.evicted = self.cache.sweep(frame);
            if stats.evicted > 0 {
                log::debug!("evicted {} stale label states", stats.evicted);
            }
        }

        canvas.render();
        if view.camera_is_moving {
            log::trace!("frame {} placed while camera moving", frame);
        }
        self.diagnostics.frame_placed(frame, &stats);
        stats
    }

    fn gather(&mut self, groups: &[TileResultGroup]) {
        self.gathered.clear();
        for group in groups {
            for tile in &group.visible_tiles {
                self.gathered.extend(tile.text_elements.iter().map(|element| GatheredElement {
                    element: Arc::clone(element),
                    tile: Arc::clone(tile),
                }));
            }
        }
        self.gathered_valid = true;
        log::debug!("gathered {} label candidates from {} tile groups", self.gathered.len(), groups.len());
    }

    /// Screen placement of an Ok candidate, or `None` if it cannot be drawn
    /// this frame (off screen, path too short, fully faded by distance).
    fn compute_placement(
        &self,
        element: &Arc<TextElement>,
        origin: Vec3,
        view_distance: f32,
        max_distance: Option<f32>,
    ) -> Option<(LabelPlacement, ScreenRect)> {
        let distance_fade = distance_fade_factor(element, view_distance, max_distance);
        if distance_fade <= 0.0 {
            return None;
        }
        let scale = distance_scale_factor(
            element.distance_scale,
            view_distance,
            self.config.look_at_distance,
            self.config.min_distance_scale,
        );
        let (screen_pos, rect, glyphs) =
            layout_on_screen(&self.projector, element, origin, scale, self.config.screen_margin)?;

        Some((
            LabelPlacement {
                element: Arc::clone(element),
                origin,
                screen_pos,
                scale,
                glyphs,
                distance_fade,
            },
            rect,
        ))
    }

    /// Collision test and, for space-reserving labels, allocation.
    fn claim_space(&mut self, element: &TextElement, rect: ScreenRect) -> bool {
        if element.may_overlap {
            if element.reserve_space {
                self.collision.allocate(rect, element.key);
            }
            return true;
        }
        if element.reserve_space {
            self.collision.allocate(rect, element.key)
        } else {
            !self.collision.intersects(&rect)
        }
    }
}

//! Text element types: the label candidates carried by tiles.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use glam::{Vec2, Vec3};

/// Stable identity of a label across tiles and frames.
///
/// Two tiles encoding the same real-world feature with the same text produce
/// equal keys, which is what collapses them into one rendered label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementKey(pub u64);

impl ElementKey {
    /// Key derived from the source feature id and the label text.
    pub fn from_feature(feature_id: u64, text: &str) -> Self {
        let mut hasher = DefaultHasher::new();
        feature_id.hash(&mut hasher);
        text.hash(&mut hasher);
        ElementKey(hasher.finish())
    }

    /// Key for features without an id: the text plus its world position snapped
    /// to a `tolerance` sized lattice.
    pub fn from_text_at(text: &str, world_pos: Vec3, tolerance: f32) -> Self {
        let snapped = (world_pos / tolerance.max(f32::EPSILON)).round();
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        (snapped.x as i64).hash(&mut hasher);
        (snapped.y as i64).hash(&mut hasher);
        (snapped.z as i64).hash(&mut hasher);
        ElementKey(hasher.finish())
    }
}

/// Shaped glyphs for a label laid out by the engine (path labels, or point
/// labels without a prebuilt buffer).
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphRun {
    /// Source text.
    pub text: String,
    /// Advance width of each glyph in pixels.
    pub advances: Vec<f32>,
    /// Line height in pixels.
    pub line_height: f32,
    /// Font catalog the glyphs come from; placement waits until it is loaded.
    pub font_catalog: Option<String>,
}

impl GlyphRun {
    pub fn new(text: impl Into<String>, advances: Vec<f32>, line_height: f32) -> Self {
        Self {
            text: text.into(),
            advances,
            line_height,
            font_catalog: None,
        }
    }

    /// Glyph run with advances estimated from character classes.
    pub fn approximate(text: impl Into<String>, font_size: f32) -> Self {
        let text = text.into();
        let advances = text
            .chars()
            .map(|c| {
                if c.is_ascii_uppercase() {
                    font_size * 0.7
                } else if matches!(c, 'i' | 'l' | '!' | '.' | ' ') {
                    font_size * 0.3
                } else {
                    font_size * 0.5
                }
            })
            .collect();
        Self::new(text, advances, font_size * 1.2)
    }

    pub fn with_font_catalog(mut self, catalog: impl Into<String>) -> Self {
        self.font_catalog = Some(catalog.into());
        self
    }

    /// Total advance width.
    pub fn width(&self) -> f32 {
        self.advances.iter().sum()
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width(), self.line_height)
    }
}

/// Handle to a glyph buffer prepared by the text canvas (icons, point labels).
#[derive(Debug, Clone, PartialEq)]
pub struct TextBufferObject {
    /// Canvas-side buffer id.
    pub id: u64,
    /// Pixel extent at scale 1.
    pub size: Vec2,
}

/// What gets drawn for a label.
#[derive(Debug, Clone, PartialEq)]
pub enum LabelContent {
    Glyphs(GlyphRun),
    Buffer(Arc<TextBufferObject>),
}

impl LabelContent {
    /// Pixel extent at scale 1.
    pub fn size(&self) -> Vec2 {
        match self {
            LabelContent::Glyphs(run) => run.size(),
            LabelContent::Buffer(buffer) => buffer.size,
        }
    }

    pub fn font_catalog(&self) -> Option<&str> {
        match self {
            LabelContent::Glyphs(run) => run.font_catalog.as_deref(),
            LabelContent::Buffer(_) => None,
        }
    }
}

/// Tile-local anchor geometry.
#[derive(Debug, Clone, PartialEq)]
pub enum Anchor {
    Point(Vec3),
    /// Polyline; upstream guarantees at least two points.
    Path(Vec<Vec3>),
}

/// Reference into a POI table whose rules decide final visibility.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PoiRef {
    pub table: String,
    pub name: String,
}

/// One label candidate.
#[derive(Debug, Clone)]
pub struct TextElement {
    /// Deduplication key.
    pub key: ElementKey,
    pub content: LabelContent,
    pub anchor: Anchor,
    /// Higher is placed first.
    pub priority: i32,
    pub min_zoom: f32,
    pub max_zoom: f32,
    pub visible: bool,
    /// Skip the max view distance test.
    pub ignore_distance: bool,
    /// How strongly the label shrinks with distance (0 = constant size).
    pub distance_scale: f32,
    /// Skip the collision test.
    pub may_overlap: bool,
    /// Claim screen space when accepted.
    pub reserve_space: bool,
    /// Distance fading start, as a fraction of the max view distance.
    pub fade_near: Option<f32>,
    /// Distance fading end, as a fraction of the max view distance.
    pub fade_far: Option<f32>,
    /// Style opacity multiplier.
    pub opacity: f32,
    /// Pixel offset of the label from its projected anchor.
    pub screen_offset: Vec2,
    pub poi: Option<PoiRef>,
}

impl TextElement {
    fn with_anchor(key: ElementKey, content: LabelContent, anchor: Anchor) -> Self {
        Self {
            key,
            content,
            anchor,
            priority: 0,
            min_zoom: 0.0,
            max_zoom: f32::MAX,
            visible: true,
            ignore_distance: false,
            distance_scale: 0.0,
            may_overlap: false,
            reserve_space: true,
            fade_near: None,
            fade_far: None,
            opacity: 1.0,
            screen_offset: Vec2::ZERO,
            poi: None,
        }
    }

    /// Point label at a tile-local position.
    pub fn point(key: ElementKey, content: LabelContent, position: Vec3) -> Self {
        Self::with_anchor(key, content, Anchor::Point(position))
    }

    /// Label following a tile-local polyline.
    pub fn path(key: ElementKey, glyphs: GlyphRun, path: Vec<Vec3>) -> Self {
        Self::with_anchor(key, LabelContent::Glyphs(glyphs), Anchor::Path(path))
    }

    pub fn is_path(&self) -> bool {
        matches!(self.anchor, Anchor::Path(_))
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_zoom_range(mut self, min_zoom: f32, max_zoom: f32) -> Self {
        self.min_zoom = min_zoom;
        self.max_zoom = max_zoom;
        self
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    pub fn with_ignore_distance(mut self, ignore: bool) -> Self {
        self.ignore_distance = ignore;
        self
    }

    pub fn with_distance_scale(mut self, scale: f32) -> Self {
        self.distance_scale = scale;
        self
    }

    pub fn with_may_overlap(mut self, may_overlap: bool) -> Self {
        self.may_overlap = may_overlap;
        self
    }

    pub fn with_reserve_space(mut self, reserve: bool) -> Self {
        self.reserve_space = reserve;
        self
    }

    pub fn with_distance_fade(mut self, near: f32, far: f32) -> Self {
        self.fade_near = Some(near);
        self.fade_far = Some(far);
        self
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity.clamp(0.0, 1.0);
        self
    }

    pub fn with_offset(mut self, x: f32, y: f32) -> Self {
        self.screen_offset = Vec2::new(x, y);
        self
    }

    pub fn with_poi(mut self, table: impl Into<String>, name: impl Into<String>) -> Self {
        self.poi = Some(PoiRef {
            table: table.into(),
            name: name.into(),
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_key_is_stable() {
        assert_eq!(ElementKey::from_feature(42, "Main St"), ElementKey::from_feature(42, "Main St"));
        assert_ne!(ElementKey::from_feature(42, "Main St"), ElementKey::from_feature(43, "Main St"));
        assert_ne!(ElementKey::from_feature(42, "Main St"), ElementKey::from_feature(42, "Side St"));
    }

    #[test]
    fn test_text_key_snaps_nearby_positions() {
        let a = ElementKey::from_text_at("Lake", Vec3::new(100.2, 0.0, 50.1), 1.0);
        let b = ElementKey::from_text_at("Lake", Vec3::new(99.9, 0.0, 49.8), 1.0);
        let c = ElementKey::from_text_at("Lake", Vec3::new(140.0, 0.0, 50.0), 1.0);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_approximate_glyph_run() {
        let run = GlyphRun::approximate("Ab", 10.0);
        assert_eq!(run.advances, vec![7.0, 5.0]);
        assert!((run.width() - 12.0).abs() < 1e-5);
        assert!((run.size().y - 12.0).abs() < 1e-5);
    }
}

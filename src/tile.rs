//! Tile snapshots handed to the placement engine each frame.

use std::collections::HashMap;
use std::sync::Arc;

use glam::Vec3;

use crate::element::TextElement;

/// Quadtree address of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileKey {
    pub level: u32,
    pub row: u32,
    pub column: u32,
}

impl TileKey {
    pub fn new(level: u32, row: u32, column: u32) -> Self {
        Self { level, row, column }
    }
}

/// A decoded tile: its world placement and the label candidates it carries.
#[derive(Debug, Clone)]
pub struct Tile {
    pub key: TileKey,
    /// World-space center; element anchors are relative to it.
    pub center: Vec3,
    /// Horizontal world repetition index for wrapped planar maps.
    pub offset: i32,
    pub text_elements: Vec<Arc<TextElement>>,
}

impl Tile {
    pub fn new(key: TileKey, center: Vec3) -> Self {
        Self {
            key,
            center,
            offset: 0,
            text_elements: Vec::new(),
        }
    }

    pub fn with_offset(mut self, offset: i32) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_elements(mut self, elements: impl IntoIterator<Item = TextElement>) -> Self {
        self.text_elements.extend(elements.into_iter().map(Arc::new));
        self
    }

    pub fn add_element(&mut self, element: TextElement) {
        self.text_elements.push(Arc::new(element));
    }
}

/// Visible tiles of one data source at one zoom level.
#[derive(Debug, Clone, Default)]
pub struct TileResultGroup {
    pub data_source: String,
    pub zoom_level: f32,
    pub storage_level: u32,
    pub visible_tiles: Vec<Arc<Tile>>,
    pub rendered_tiles: HashMap<TileKey, Arc<Tile>>,
}

impl TileResultGroup {
    pub fn new(data_source: impl Into<String>, zoom_level: f32, storage_level: u32) -> Self {
        Self {
            data_source: data_source.into(),
            zoom_level,
            storage_level,
            ..Default::default()
        }
    }

    /// Add a tile that is both visible and rendered.
    pub fn push_tile(&mut self, tile: Tile) {
        let tile = Arc::new(tile);
        self.rendered_tiles.insert(tile.key, Arc::clone(&tile));
        self.visible_tiles.push(tile);
    }

    /// Number of text elements across visible tiles.
    pub fn element_count(&self) -> usize {
        self.visible_tiles.iter().map(|t| t.text_elements.len()).sum()
    }
}

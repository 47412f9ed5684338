//! Placement configuration.

use std::path::Path;

use serde::Deserialize;

use crate::error::{LabelError, LabelResult};

/// Spatial index used for screen-space collision tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionBackend {
    /// Uniform grid of buckets (cheap to reset, good for label-sized rects).
    #[default]
    Grid,
    /// R-tree, better when rectangle sizes vary a lot.
    RTree,
}

/// Tunables for the per-frame placement loop.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    /// Time for a label to fade from 0 to 1 (and back), in milliseconds.
    pub fade_duration_ms: f64,
    /// Frames a label state may stay unseen before it is evicted.
    pub max_unseen_frames: u64,
    /// Run the eviction sweep every N frames.
    pub sweep_interval_frames: u64,
    /// Collision grid bucket size in pixels.
    pub grid_cell_size: u32,
    /// Collision index implementation.
    pub collision_backend: CollisionBackend,
    /// Maximum number of labels accepted per frame.
    pub max_visible_labels: usize,
    /// Spherical projection: labels with `dot(normalize(pos), look_at)` at or above
    /// this value face away from the camera.
    pub facing_dot_threshold: f32,
    /// Extra NDC margin around the viewport in which anchors still count as on screen.
    pub screen_margin: f32,
    /// Lower bound of the distance scaling factor.
    pub min_distance_scale: f32,
    /// Reference distance at which labels are drawn at scale 1.
    pub look_at_distance: f32,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            fade_duration_ms: 800.0,
            max_unseen_frames: 600,
            sweep_interval_frames: 60,
            grid_cell_size: 64,
            collision_backend: CollisionBackend::Grid,
            max_visible_labels: 500,
            facing_dot_threshold: 0.0,
            screen_margin: 0.1,
            min_distance_scale: 0.7,
            look_at_distance: 1000.0,
        }
    }
}

impl PlacementConfig {
    /// Parse a config from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> LabelResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> LabelResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Reject values the placement loop cannot work with.
    pub fn validate(&self) -> LabelResult<()> {
        if !(self.fade_duration_ms > 0.0) {
            return Err(LabelError::config(format!(
                "fade_duration_ms must be positive, got {}",
                self.fade_duration_ms
            )));
        }
        if self.grid_cell_size == 0 {
            return Err(LabelError::config("grid_cell_size must be non-zero"));
        }
        if self.sweep_interval_frames == 0 {
            return Err(LabelError::config("sweep_interval_frames must be non-zero"));
        }
        if !(self.look_at_distance > 0.0) {
            return Err(LabelError::config("look_at_distance must be positive"));
        }
        Ok(())
    }

    /// Set the fade duration.
    pub fn with_fade_duration(mut self, ms: f64) -> Self {
        self.fade_duration_ms = ms;
        self
    }

    /// Set the eviction horizon.
    pub fn with_max_unseen_frames(mut self, frames: u64) -> Self {
        self.max_unseen_frames = frames;
        self
    }

    /// Set the collision backend.
    pub fn with_collision_backend(mut self, backend: CollisionBackend) -> Self {
        self.collision_backend = backend;
        self
    }

    /// Set maximum number of visible labels.
    pub fn with_max_visible(mut self, max: usize) -> Self {
        self.max_visible_labels = max;
        self
    }

    /// Set the spherical facing threshold.
    pub fn with_facing_threshold(mut self, threshold: f32) -> Self {
        self.facing_dot_threshold = threshold;
        self
    }

    /// Set the distance scaling reference.
    pub fn with_look_at_distance(mut self, distance: f32) -> Self {
        self.look_at_distance = distance;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(PlacementConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config =
            PlacementConfig::from_json_str(r#"{ "fade_duration_ms": 250, "collision_backend": "rtree" }"#)
                .unwrap();
        assert_eq!(config.fade_duration_ms, 250.0);
        assert_eq!(config.collision_backend, CollisionBackend::RTree);
        assert_eq!(config.max_visible_labels, 500);
    }

    #[test]
    fn test_rejects_zero_fade() {
        let err = PlacementConfig::from_json_str(r#"{ "fade_duration_ms": 0 }"#).unwrap_err();
        assert_eq!(err.category(), "Config");
    }
}

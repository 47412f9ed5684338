//! Per-frame view snapshot.

use glam::Vec3;

use crate::projection::{Camera, MapProjection};

/// Camera and world parameters of one frame. Supplied by the caller and never
/// modified by the placement engine.
#[derive(Debug, Clone, Copy)]
pub struct ViewState {
    /// View reference point distances are measured from (the camera position).
    pub world_center: Vec3,
    /// Normalized camera forward direction.
    pub look_at_vector: Vec3,
    pub zoom_level: f32,
    pub camera_is_moving: bool,
    /// Labels further than this are rejected as too far.
    pub max_visibility_distance: Option<f32>,
    pub projection: MapProjection,
}

impl ViewState {
    /// View state taken from a camera.
    pub fn from_camera(camera: &Camera, zoom_level: f32, projection: MapProjection) -> Self {
        Self {
            world_center: camera.position,
            look_at_vector: camera.forward,
            zoom_level,
            camera_is_moving: false,
            max_visibility_distance: None,
            projection,
        }
    }

    pub fn with_max_distance(mut self, distance: f32) -> Self {
        self.max_visibility_distance = Some(distance);
        self
    }

    pub fn with_moving(mut self, moving: bool) -> Self {
        self.camera_is_moving = moving;
        self
    }
}

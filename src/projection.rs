//! World-to-screen projection and map projection helpers.

use glam::{Mat4, Vec2, Vec3, Vec4};

/// Minimum clip-space w for a point to count as in front of the camera.
const MIN_CLIP_W: f32 = 0.0001;

/// Camera state consumed by the projector.
#[derive(Debug, Clone, Copy)]
pub struct Camera {
    /// Eye position in world space.
    pub position: Vec3,
    /// Normalized viewing direction.
    pub forward: Vec3,
    /// World-to-view transform.
    pub view: Mat4,
    /// View-to-clip transform (wgpu depth range [0, 1]).
    pub projection: Mat4,
}

impl Camera {
    /// Build a perspective camera looking from `eye` at `target`.
    pub fn look_at(eye: Vec3, target: Vec3, up: Vec3, fov_y: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            position: eye,
            forward: (target - eye).normalize_or_zero(),
            view: Mat4::look_at_rh(eye, target, up),
            projection: Mat4::perspective_rh(fov_y, aspect, near, far),
        }
    }

    /// Combined view-projection matrix.
    pub fn view_proj(&self) -> Mat4 {
        self.projection * self.view
    }
}

/// How the map is laid out in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MapProjection {
    /// Flat map; tiles wrap horizontally every `world_width` units.
    Planar { world_width: f32 },
    /// Globe of the given radius centred at the origin.
    Spherical { radius: f32 },
}

impl MapProjection {
    /// World-space shift for a tile repeated `offset` times around the world.
    pub fn world_offset(&self, offset: i32) -> Vec3 {
        match self {
            MapProjection::Planar { world_width } => Vec3::X * (offset as f32 * world_width),
            MapProjection::Spherical { .. } => Vec3::ZERO,
        }
    }

    pub fn is_spherical(&self) -> bool {
        matches!(self, MapProjection::Spherical { .. })
    }
}

impl Default for MapProjection {
    fn default() -> Self {
        MapProjection::Planar { world_width: 0.0 }
    }
}

/// Projects world coordinates to normalized device and screen coordinates.
///
/// Points behind the camera are not rejected here; they project with an
/// infinite depth so that [`ScreenProjector::is_depth_visible`] fails for them.
#[derive(Debug, Clone)]
pub struct ScreenProjector {
    view_proj: Mat4,
    screen_width: f32,
    screen_height: f32,
}

impl ScreenProjector {
    /// Create a projector with an identity transform.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            view_proj: Mat4::IDENTITY,
            screen_width: width as f32,
            screen_height: height as f32,
        }
    }

    /// Re-synchronize with the camera transform and viewport size.
    pub fn update(&mut self, camera: &Camera, width: u32, height: u32) {
        self.view_proj = camera.view_proj();
        self.resize(width, height);
    }

    /// Update screen dimensions.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.screen_width = width as f32;
        self.screen_height = height as f32;
    }

    /// Project to NDC. x, y in [-1, 1] and z in [0, 1] when visible.
    pub fn project_ndc(&self, world_pos: Vec3) -> Vec3 {
        let clip = self.view_proj * Vec4::new(world_pos.x, world_pos.y, world_pos.z, 1.0);
        if clip.w <= MIN_CLIP_W {
            return Vec3::new(clip.x, clip.y, f32::INFINITY);
        }
        Vec3::new(clip.x / clip.w, clip.y / clip.w, clip.z / clip.w)
    }

    /// Convert NDC x/y to screen pixels (origin top-left, y down).
    pub fn ndc_to_screen(&self, ndc: Vec2) -> Vec2 {
        Vec2::new(
            (ndc.x + 1.0) * 0.5 * self.screen_width,
            (1.0 - ndc.y) * 0.5 * self.screen_height,
        )
    }

    /// Project to screen pixels, dropping depth.
    pub fn project(&self, world_pos: Vec3) -> Vec2 {
        let ndc = self.project_ndc(world_pos);
        self.ndc_to_screen(ndc.truncate())
    }

    /// Project to screen pixels, keeping the NDC depth in z.
    pub fn project3(&self, world_pos: Vec3) -> Vec3 {
        let ndc = self.project_ndc(world_pos);
        self.ndc_to_screen(ndc.truncate()).extend(ndc.z)
    }

    /// Depth test for a projected point.
    #[inline]
    pub fn is_depth_visible(depth: f32) -> bool {
        (0.0..=1.0).contains(&depth)
    }

    /// Project and keep the point only if it is in front of the camera and
    /// within the viewport expanded by `margin` (in NDC units).
    pub fn project_on_screen(&self, world_pos: Vec3, margin: f32) -> Option<Vec2> {
        let ndc = self.project_ndc(world_pos);
        if !Self::is_depth_visible(ndc.z) {
            return None;
        }
        let limit = 1.0 + margin;
        if ndc.x.abs() > limit || ndc.y.abs() > limit {
            return None;
        }
        Some(self.ndc_to_screen(ndc.truncate()))
    }

    /// Get screen dimensions.
    pub fn screen_size(&self) -> (f32, f32) {
        (self.screen_width, self.screen_height)
    }
}

//! Glyph layout along projected polylines.
//!
//! Places each glyph of a path label at its arc-length position on the
//! screen-space polyline, centred along the path.

use std::f32::consts::{FRAC_PI_2, PI};

use glam::Vec2;

use crate::collision::ScreenRect;

/// Fraction of the path a label may occupy.
const MAX_PATH_FILL: f32 = 0.9;

/// Placement info for a single glyph of a path label.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphPlacement {
    /// Glyph centre in screen pixels.
    pub screen_pos: Vec2,
    /// Rotation in radians, kept within [-pi/2, pi/2] so text reads upright.
    pub rotation: f32,
    /// Scale factor applied to the glyph.
    pub scale: f32,
}

/// Result of laying out a path label.
#[derive(Debug, Clone, PartialEq)]
pub struct PathLayout {
    pub glyphs: Vec<GlyphPlacement>,
    /// Union of the glyph boxes.
    pub bounds: ScreenRect,
}

/// Lay out glyphs along a screen-space polyline.
///
/// # Arguments
/// * `points` - Polyline in screen pixels
/// * `advances` - Advance width of each glyph at scale 1
/// * `line_height` - Glyph box height at scale 1
/// * `scale` - Distance scaling factor
///
/// # Returns
/// `None` if the path has fewer than two points or is too short for the text.
pub fn layout_path_label(points: &[Vec2], advances: &[f32], line_height: f32, scale: f32) -> Option<PathLayout> {
    if points.len() < 2 || advances.is_empty() {
        return None;
    }

    let path_length = compute_path_length(points);
    let text_width: f32 = advances.iter().sum::<f32>() * scale;
    if text_width > path_length * MAX_PATH_FILL {
        return None;
    }

    let glyphs = place_glyphs_along_path(points, advances, scale, (path_length - text_width) * 0.5);
    let half_box = Vec2::splat(line_height * scale * 0.5);
    let bounds = glyphs
        .iter()
        .map(|g| ScreenRect::new(g.screen_pos - half_box, g.screen_pos + half_box))
        .reduce(|a, b| a.union(&b))?;

    Some(PathLayout { glyphs, bounds })
}

fn place_glyphs_along_path(points: &[Vec2], advances: &[f32], scale: f32, start_offset: f32) -> Vec<GlyphPlacement> {
    let mut placements = Vec::with_capacity(advances.len());
    let mut current_offset = start_offset;

    for advance in advances {
        let advance = advance * scale;
        if let Some((pos, tangent)) = sample_path_at_offset(points, current_offset + advance * 0.5) {
            let rotation = if tangent > FRAC_PI_2 {
                tangent - PI
            } else if tangent < -FRAC_PI_2 {
                tangent + PI
            } else {
                tangent
            };
            placements.push(GlyphPlacement {
                screen_pos: pos,
                rotation,
                scale,
            });
        }
        current_offset += advance;
    }

    placements
}

/// Sample position and tangent angle at a given arc length.
fn sample_path_at_offset(points: &[Vec2], offset: f32) -> Option<(Vec2, f32)> {
    if points.len() < 2 || offset < 0.0 {
        return None;
    }

    let mut accumulated = 0.0;
    for segment in points.windows(2) {
        let delta = segment[1] - segment[0];
        let length = delta.length();
        if accumulated + length >= offset {
            let t = (offset - accumulated) / length.max(0.001);
            return Some((segment[0] + delta * t, delta.y.atan2(delta.x)));
        }
        accumulated += length;
    }

    // Past the end: clamp to the last point
    let last = points.len() - 1;
    let delta = points[last] - points[last - 1];
    Some((points[last], delta.y.atan2(delta.x)))
}

/// Total length of a polyline.
pub fn compute_path_length(points: &[Vec2]) -> f32 {
    points.windows(2).map(|s| s[0].distance(s[1])).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_length() {
        let points = [Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0), Vec2::new(10.0, 10.0)];
        assert!((compute_path_length(&points) - 20.0).abs() < 0.001);
    }

    #[test]
    fn test_sample_path() {
        let points = [Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0)];
        let (pos, tangent) = sample_path_at_offset(&points, 5.0).unwrap();
        assert!((pos.x - 5.0).abs() < 0.001);
        assert!(pos.y.abs() < 0.001);
        assert!(tangent.abs() < 0.001);
    }

    #[test]
    fn test_layout_centres_text() {
        let points = [Vec2::new(0.0, 50.0), Vec2::new(100.0, 50.0)];
        let layout = layout_path_label(&points, &[10.0, 10.0], 10.0, 1.0).unwrap();
        assert_eq!(layout.glyphs.len(), 2);
        assert!((layout.glyphs[0].screen_pos.x - 45.0).abs() < 1e-4);
        assert!((layout.glyphs[1].screen_pos.x - 55.0).abs() < 1e-4);
        assert!((layout.bounds.min.x - 40.0).abs() < 1e-4);
        assert!((layout.bounds.max.x - 60.0).abs() < 1e-4);
    }

    #[test]
    fn test_right_to_left_path_reads_upright() {
        let points = [Vec2::new(100.0, 50.0), Vec2::new(0.0, 50.0)];
        let layout = layout_path_label(&points, &[10.0], 10.0, 1.0).unwrap();
        assert!(layout.glyphs[0].rotation.abs() < 1e-4);
    }

    #[test]
    fn test_text_too_long() {
        let points = [Vec2::new(0.0, 0.0), Vec2::new(15.0, 0.0)];
        assert!(layout_path_label(&points, &[10.0, 10.0], 10.0, 1.0).is_none());
    }
}

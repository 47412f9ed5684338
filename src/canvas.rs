//! Output surface: the glyph/text canvas that receives accepted labels.

use std::sync::Arc;

use glam::{Vec2, Vec3};

use crate::element::{GlyphRun, LabelContent, TextBufferObject, TextElement};
use crate::path_layout::GlyphPlacement;

/// Parameters for glyph-run submissions.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRenderParams {
    pub opacity: f32,
    pub scale: f32,
    /// Per-glyph placements for path labels; empty for point labels.
    pub path: Vec<GlyphPlacement>,
}

/// Parameters for prebuilt buffer submissions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextBufferParams {
    pub position: Vec2,
    pub opacity: f32,
    pub scale: f32,
}

/// Glyph renderer consuming placed labels.
pub trait TextCanvas {
    /// Draw a glyph run anchored at `screen_position`.
    fn add_text(&mut self, glyphs: &GlyphRun, screen_position: Vec2, params: &TextRenderParams);

    /// Draw a prebuilt glyph buffer.
    fn add_text_buffer_object(&mut self, buffer: &Arc<TextBufferObject>, params: &TextBufferParams);

    /// Flush the frame's submissions.
    fn render(&mut self);
}

/// Everything needed to draw a label again without re-placing it.
#[derive(Debug, Clone)]
pub struct LabelPlacement {
    pub element: Arc<TextElement>,
    /// World origin the element's anchor is relative to (tile center plus wrap
    /// offset), kept so the label can be re-projected after the camera moves.
    pub origin: Vec3,
    pub screen_pos: Vec2,
    pub scale: f32,
    pub glyphs: Vec<GlyphPlacement>,
    /// Distance fading factor in [0, 1].
    pub distance_fade: f32,
}

impl LabelPlacement {
    /// Submit to `canvas` with the given fade opacity.
    pub fn submit(&self, canvas: &mut dyn TextCanvas, fade_opacity: f32) {
        let opacity = fade_opacity * self.distance_fade * self.element.opacity;
        match &self.element.content {
            LabelContent::Glyphs(run) => canvas.add_text(
                run,
                self.screen_pos,
                &TextRenderParams {
                    opacity,
                    scale: self.scale,
                    path: self.glyphs.clone(),
                },
            ),
            LabelContent::Buffer(buffer) => canvas.add_text_buffer_object(
                buffer,
                &TextBufferParams {
                    position: self.screen_pos,
                    opacity,
                    scale: self.scale,
                },
            ),
        }
    }
}

/// One recorded canvas submission.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedLabel {
    /// Text of glyph submissions, `None` for buffers.
    pub text: Option<String>,
    /// Buffer id of buffer submissions.
    pub buffer_id: Option<u64>,
    pub position: Vec2,
    pub opacity: f32,
    pub scale: f32,
}

/// Canvas that records submissions instead of drawing them, for headless runs.
#[derive(Debug, Default)]
pub struct FrameRecorder {
    pending: Vec<RecordedLabel>,
    /// Submissions of the last rendered frame.
    pub frame: Vec<RecordedLabel>,
    pub frames_rendered: u64,
}

impl FrameRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opacity of the glyph submission with the given text in the last frame.
    pub fn opacity_of_text(&self, text: &str) -> Option<f32> {
        self.frame
            .iter()
            .find(|l| l.text.as_deref() == Some(text))
            .map(|l| l.opacity)
    }

    /// Opacity of the buffer submission with the given id in the last frame.
    pub fn opacity_of_buffer(&self, id: u64) -> Option<f32> {
        self.frame
            .iter()
            .find(|l| l.buffer_id == Some(id))
            .map(|l| l.opacity)
    }
}

impl TextCanvas for FrameRecorder {
    fn add_text(&mut self, glyphs: &GlyphRun, screen_position: Vec2, params: &TextRenderParams) {
        self.pending.push(RecordedLabel {
            text: Some(glyphs.text.clone()),
            buffer_id: None,
            position: screen_position,
            opacity: params.opacity,
            scale: params.scale,
        });
    }

    fn add_text_buffer_object(&mut self, buffer: &Arc<TextBufferObject>, params: &TextBufferParams) {
        self.pending.push(RecordedLabel {
            text: None,
            buffer_id: Some(buffer.id),
            position: params.position,
            opacity: params.opacity,
            scale: params.scale,
        });
    }

    fn render(&mut self) {
        self.frame = std::mem::take(&mut self.pending);
        self.frames_rendered += 1;
    }
}

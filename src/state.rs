//! Persistent per-label render state and its fade state machine.

use crate::canvas::LabelPlacement;
use crate::collision::ScreenRect;

/// Where a label is in its fade cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadePhase {
    /// Opacity rising towards 1.
    FadingIn,
    /// Fully opaque.
    Steady,
    /// Opacity falling towards 0.
    FadingOut,
    /// Fully transparent, eligible for eviction.
    Gone,
}

/// Render state of one deduplicated label, kept across frames.
///
/// Opacity is always derived from the fade start time and start opacity, so it
/// changes by at most `elapsed / fade_duration` and repeated evaluation at the
/// same time yields the same value.
#[derive(Debug, Clone)]
pub struct LabelState {
    opacity: f32,
    phase: FadePhase,
    /// Time the current fade began; `None` until the label is first placed.
    fade_start: Option<f64>,
    start_opacity: f32,
    /// Last frame in which a candidate with this key was considered.
    pub last_frame: u64,
    /// Screen rectangle of the last accepted placement.
    pub screen_rect: Option<ScreenRect>,
    /// What was last submitted, reused while fading out.
    pub last_placement: Option<LabelPlacement>,
}

impl Default for LabelState {
    fn default() -> Self {
        Self::new()
    }
}

impl LabelState {
    /// Fresh state: transparent and about to fade in.
    pub fn new() -> Self {
        Self {
            opacity: 0.0,
            phase: FadePhase::FadingIn,
            fade_start: None,
            start_opacity: 0.0,
            last_frame: 0,
            screen_rect: None,
            last_placement: None,
        }
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn phase(&self) -> FadePhase {
        self.phase
    }

    /// Whether the label has ever been placed.
    pub fn is_started(&self) -> bool {
        self.fade_start.is_some()
    }

    /// Whether the label still contributes to the image.
    pub fn is_visible(&self) -> bool {
        self.opacity > 0.0
    }

    /// Recompute opacity for `time`.
    pub fn advance(&mut self, time: f64, fade_duration: f64) {
        let Some(start) = self.fade_start else {
            return;
        };
        let progress = ((time - start) / fade_duration).max(0.0) as f32;
        match self.phase {
            FadePhase::FadingIn => {
                self.opacity = (self.start_opacity + progress).min(1.0);
                if self.opacity >= 1.0 {
                    self.phase = FadePhase::Steady;
                }
            }
            FadePhase::FadingOut => {
                self.opacity = (self.start_opacity - progress).max(0.0);
                if self.opacity <= 0.0 {
                    self.phase = FadePhase::Gone;
                }
            }
            FadePhase::Steady | FadePhase::Gone => {}
        }
    }

    /// The label was placed at `time`: start or keep fading in.
    /// A label fading out reverses from its current opacity.
    pub fn fade_in(&mut self, time: f64, fade_duration: f64) {
        self.advance(time, fade_duration);
        let running = self.phase == FadePhase::Steady
            || (self.phase == FadePhase::FadingIn && self.fade_start.is_some());
        if !running {
            self.phase = FadePhase::FadingIn;
            self.fade_start = Some(time);
            self.start_opacity = self.opacity;
        }
        self.advance(time, fade_duration);
    }

    /// The label was not placed at `time`: fade out from the current opacity.
    pub fn fade_out(&mut self, time: f64, fade_duration: f64) {
        self.advance(time, fade_duration);
        match self.phase {
            FadePhase::FadingIn | FadePhase::Steady if self.opacity > 0.0 => {
                self.phase = FadePhase::FadingOut;
                self.fade_start = Some(time);
                self.start_opacity = self.opacity;
            }
            FadePhase::FadingIn | FadePhase::Steady => {
                self.phase = FadePhase::Gone;
                self.opacity = 0.0;
            }
            FadePhase::FadingOut | FadePhase::Gone => {}
        }
    }

    /// Fade out with no grace period: opacity drops to 0 in this frame.
    pub fn hide(&mut self) {
        self.phase = FadePhase::Gone;
        self.opacity = 0.0;
        self.start_opacity = 0.0;
    }
}

//! Label state cache keyed by deduplication key.

use std::collections::HashMap;

use crate::element::{ElementKey, TextElement};
use crate::state::LabelState;

/// The instance of a key that won deduplication in a given frame.
#[derive(Debug, Clone, Copy)]
struct FrameRepresentative {
    frame: u64,
    priority: i32,
}

/// Persistent label states plus the per-frame deduplication table.
pub struct TextElementStateCache {
    states: HashMap<ElementKey, LabelState>,
    representatives: HashMap<ElementKey, FrameRepresentative>,
    max_unseen_frames: u64,
}

impl TextElementStateCache {
    pub fn new(max_unseen_frames: u64) -> Self {
        Self {
            states: HashMap::new(),
            representatives: HashMap::new(),
            max_unseen_frames,
        }
    }

    /// Returns false if an instance of the same key with equal or higher
    /// priority already won this frame. Otherwise records `element` as the
    /// frame's representative for its key and returns true.
    pub fn deduplicate_element(&mut self, element: &TextElement, frame: u64) -> bool {
        if let Some(rep) = self.representatives.get(&element.key) {
            if rep.frame == frame && rep.priority >= element.priority {
                return false;
            }
        }
        self.representatives.insert(
            element.key,
            FrameRepresentative {
                frame,
                priority: element.priority,
            },
        );
        true
    }

    /// State for `key`, created transparent and fading in on first use.
    pub fn get_or_create_state(&mut self, key: ElementKey) -> &mut LabelState {
        self.states.entry(key).or_default()
    }

    pub fn get(&self, key: ElementKey) -> Option<&LabelState> {
        self.states.get(&key)
    }

    pub fn get_mut(&mut self, key: ElementKey) -> Option<&mut LabelState> {
        self.states.get_mut(&key)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&ElementKey, &mut LabelState)> {
        self.states.iter_mut()
    }

    /// Evict states not seen for more than `max_unseen_frames` frames.
    /// Returns the number of evicted entries.
    pub fn sweep(&mut self, frame: u64) -> usize {
        let horizon = self.max_unseen_frames;
        let before = self.states.len();
        self.states
            .retain(|_, state| frame.saturating_sub(state.last_frame) <= horizon);
        self.representatives.retain(|_, rep| rep.frame == frame);
        before - self.states.len()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn clear(&mut self) {
        self.states.clear();
        self.representatives.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{GlyphRun, LabelContent};
    use crate::state::FadePhase;
    use glam::Vec3;

    fn element(key: u64, priority: i32) -> TextElement {
        TextElement::point(
            ElementKey(key),
            LabelContent::Glyphs(GlyphRun::approximate("x", 10.0)),
            Vec3::ZERO,
        )
        .with_priority(priority)
    }

    #[test]
    fn test_first_instance_wins_within_frame() {
        let mut cache = TextElementStateCache::new(10);
        assert!(cache.deduplicate_element(&element(1, 5), 1));
        assert!(!cache.deduplicate_element(&element(1, 5), 1));
        assert!(!cache.deduplicate_element(&element(1, 3), 1));
        assert!(cache.deduplicate_element(&element(2, 3), 1));
    }

    #[test]
    fn test_dedup_resets_between_frames() {
        let mut cache = TextElementStateCache::new(10);
        assert!(cache.deduplicate_element(&element(1, 5), 1));
        assert!(cache.deduplicate_element(&element(1, 5), 2));
    }

    #[test]
    fn test_get_or_create_state() {
        let mut cache = TextElementStateCache::new(10);
        let state = cache.get_or_create_state(ElementKey(9));
        assert_eq!(state.opacity(), 0.0);
        assert_eq!(state.phase(), FadePhase::FadingIn);
        state.last_frame = 3;
        assert_eq!(cache.get(ElementKey(9)).map(|s| s.last_frame), Some(3));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_sweep_evicts_stale_entries() {
        let mut cache = TextElementStateCache::new(5);
        cache.get_or_create_state(ElementKey(1)).last_frame = 1;
        cache.get_or_create_state(ElementKey(2)).last_frame = 8;
        assert_eq!(cache.sweep(10), 1);
        assert!(cache.get(ElementKey(1)).is_none());
        assert!(cache.get(ElementKey(2)).is_some());
    }
}

//! Linear fade-out gating a phase edge

use crate::consts::FADE_STEP;

/// Level at or below which the fade counts as finished. Absorbs f32 drift so
/// a fade from 1.0 in 0.05 steps takes exactly 20 frames.
const FADE_EPSILON: f32 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FadeTransition {
    level: f32,
    active: bool,
    step: f32,
}

impl Default for FadeTransition {
    fn default() -> Self {
        Self::new(FADE_STEP)
    }
}

impl FadeTransition {
    pub fn new(step: f32) -> Self {
        debug_assert!(step > 0.0, "fade step must be positive");
        Self {
            level: 1.0,
            active: false,
            step,
        }
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Begin fading from full brightness. Ignored while already running.
    pub fn start(&mut self) {
        if !self.active {
            self.level = 1.0;
            self.active = true;
        }
    }

    /// Advance one frame. Returns true on the frame the fade completes.
    pub fn tick(&mut self) -> bool {
        if !self.active {
            return false;
        }
        self.level -= self.step;
        if self.level <= FADE_EPSILON {
            self.level = 0.0;
            self.active = false;
            return true;
        }
        false
    }
}

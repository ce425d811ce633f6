//! Firework registry
//!
//! Owns the end-of-game volley. Nothing moves until the registry is armed;
//! arming is one-way.

use glam::Vec3;
use rand::Rng;

use super::firework::{LaunchEffect, LaunchState};
use super::{FxSink, TimedEffect};

#[derive(Debug, Default)]
pub struct EffectRegistry {
    fireworks: Vec<LaunchEffect>,
    armed: bool,
}

impl EffectRegistry {
    pub fn new(fireworks: Vec<LaunchEffect>) -> Self {
        Self {
            fireworks,
            armed: false,
        }
    }

    /// `count` randomized fireworks around `origin`
    pub fn volley(count: usize, origin: Vec3, rng: &mut impl Rng) -> Self {
        Self::new((0..count).map(|i| LaunchEffect::new(i, origin, rng)).collect())
    }

    /// Let the volley start. Never cleared.
    pub fn arm(&mut self) {
        if !self.armed {
            log::info!("Fireworks armed ({} rockets)", self.fireworks.len());
        }
        self.armed = true;
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Advance every unsettled firework by one frame
    pub fn tick_all(&mut self, fx: &mut FxSink<'_>) {
        if !self.armed {
            return;
        }
        for firework in self.fireworks.iter_mut().filter(|f| !f.is_settled()) {
            firework.advance(fx);
        }
    }

    pub fn fireworks(&self) -> &[LaunchEffect] {
        &self.fireworks
    }

    /// Fireworks still on the pad or in the air
    pub fn in_flight(&self) -> usize {
        self.fireworks.iter().filter(|f| !f.is_settled()).count()
    }

    pub fn all_exploded(&self) -> bool {
        self.in_flight() == 0
    }

    pub fn count_ascending(&self) -> usize {
        self.fireworks
            .iter()
            .filter(|f| f.state() == LaunchState::Ascending)
            .count()
    }
}

//! Firework launch effect
//!
//! Pending (frame-counted delay) -> Ascending (rocket climbs) -> Exploded.
//! Delay and target height are randomized per instance so a volley staggers
//! without any scheduler beyond the shared frame tick.

use glam::Vec3;
use rand::Rng;

use super::emitter::{Emitter, EmitterId};
use super::shapes::proxy_sphere;
use super::{EffectEvent, FxSink, TimedEffect};
use crate::audio::SoundCue;
use crate::consts::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchState {
    /// Waiting to launch
    Pending { delay_frames: u32 },
    /// Rocket climbing toward its target height
    Ascending,
    /// Burst into sparks (terminal)
    Exploded,
}

/// Whole frames to wait before launching firework `index`; a partial frame
/// still costs a full one
fn launch_delay_frames(index: usize, roll: f32) -> u32 {
    ((roll * index as f32 + 1.0) * FRAMES_PER_SECOND as f32).ceil() as u32
}

#[derive(Debug, Clone)]
pub struct LaunchEffect {
    index: usize,
    state: LaunchState,
    position: Vec3,
    target_height: f32,
    rocket: Option<EmitterId>,
}

impl LaunchEffect {
    /// Randomized firework `index` of a volley launched from `origin`
    pub fn new(index: usize, origin: Vec3, rng: &mut impl Rng) -> Self {
        let spread = rng.random::<f32>() * FIREWORK_SPREAD;
        let position = Vec3::new(origin.x - spread, origin.y, origin.z);
        let target_height =
            position.y + rng.random::<f32>() * FIREWORK_CLIMB_RANGE + FIREWORK_MIN_CLIMB;
        let delay_frames = launch_delay_frames(index, rng.random::<f32>());
        Self::with_schedule(index, position, target_height, delay_frames)
    }

    /// Firework with an explicit schedule
    pub fn with_schedule(index: usize, position: Vec3, target_height: f32, delay_frames: u32) -> Self {
        Self {
            index,
            state: LaunchState::Pending { delay_frames },
            position,
            target_height,
            rocket: None,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn target_height(&self) -> f32 {
        self.target_height
    }

    fn launch(&mut self, fx: &mut FxSink<'_>) {
        self.state = LaunchState::Ascending;
        self.rocket = fx.arena.spawn(Emitter::rocket_trail(self.position));
        fx.sound(SoundCue::FireworkLaunch);
        fx.events.push(EffectEvent::Launched { index: self.index });
        log::debug!("Firework {} launched", self.index);
    }

    fn explode(&mut self, fx: &mut FxSink<'_>) {
        self.state = LaunchState::Exploded;
        if let Some(rocket) = self.rocket.take() {
            fx.arena.release(rocket);
        }
        fx.sound(SoundCue::FireworkExplosion);

        for vertex in proxy_sphere(EXPLOSION_PROXY_SEGMENTS) {
            let color = [
                fx.rng.random::<f32>(),
                fx.rng.random::<f32>(),
                fx.rng.random::<f32>(),
                1.0,
            ];
            fx.arena.spawn(Emitter::spark(
                self.position + vertex.position,
                vertex.normal,
                color,
            ));
        }

        fx.events.push(EffectEvent::Exploded {
            index: self.index,
            at: self.position,
        });
        log::debug!(
            "Firework {} exploded at height {:.1}",
            self.index,
            self.position.y
        );
    }
}

impl TimedEffect for LaunchEffect {
    type State = LaunchState;

    fn state(&self) -> LaunchState {
        self.state
    }

    fn advance(&mut self, fx: &mut FxSink<'_>) {
        match self.state {
            LaunchState::Pending { delay_frames: 0 } => self.launch(fx),
            LaunchState::Pending { delay_frames } => {
                self.state = LaunchState::Pending {
                    delay_frames: delay_frames - 1,
                };
            }
            LaunchState::Ascending => {
                if self.position.y >= self.target_height {
                    self.explode(fx);
                } else {
                    self.position.y += FIREWORK_ASCENT_STEP;
                    if let Some(rocket) = self.rocket {
                        fx.arena.set_origin(rocket, self.position);
                    }
                }
            }
            LaunchState::Exploded => {}
        }
    }

    fn is_settled(&self) -> bool {
        self.state == LaunchState::Exploded
    }
}

//! Timed visual effects
//!
//! Effects are small state machines advanced at most once per rendered frame.
//! Side effects (sound, particle emitters) are written into an [`FxSink`]
//! owned by the caller, so the effects themselves never reach into the
//! platform.

pub mod collectible;
pub mod emitter;
pub mod firework;
pub mod registry;
pub mod shapes;

pub use collectible::{CollectibleEffect, CollectibleState};
pub use emitter::{Emitter, EmitterArena, EmitterId, EmitterKind};
pub use firework::{LaunchEffect, LaunchState};
pub use registry::EffectRegistry;
pub use shapes::{ProxyVertex, proxy_sphere};

use glam::Vec3;
use rand_pcg::Pcg32;

use crate::audio::SoundCue;

/// Something an effect did this frame
#[derive(Debug, Clone, PartialEq)]
pub enum EffectEvent {
    Sound(SoundCue),
    Collected { index: usize },
    Launched { index: usize },
    Exploded { index: usize, at: Vec3 },
}

/// Per-frame output target for effects
pub struct FxSink<'a> {
    pub arena: &'a mut EmitterArena,
    pub rng: &'a mut Pcg32,
    pub events: Vec<EffectEvent>,
}

impl<'a> FxSink<'a> {
    pub fn new(arena: &'a mut EmitterArena, rng: &'a mut Pcg32) -> Self {
        Self {
            arena,
            rng,
            events: Vec::new(),
        }
    }

    pub fn sound(&mut self, cue: SoundCue) {
        self.events.push(EffectEvent::Sound(cue));
    }

    /// Sound cues emitted so far, in order
    pub fn sounds(&self) -> impl Iterator<Item = SoundCue> + '_ {
        self.events.iter().filter_map(|e| match e {
            EffectEvent::Sound(cue) => Some(*cue),
            _ => None,
        })
    }
}

/// A per-object effect state machine
pub trait TimedEffect {
    type State: Copy + PartialEq + std::fmt::Debug;

    fn state(&self) -> Self::State;

    /// Advance one frame
    fn advance(&mut self, fx: &mut FxSink<'_>);

    /// Whether the effect has reached its terminal state
    fn is_settled(&self) -> bool;
}

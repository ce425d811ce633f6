//! Collectible pickup effect

use glam::Vec3;

use super::emitter::Emitter;
use super::{EffectEvent, FxSink, TimedEffect};
use crate::audio::SoundCue;
use crate::consts::STAR_BURST_LIFT;
use crate::platform::MeshHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectibleState {
    Untaken,
    /// Picked up (terminal); the mesh has been handed back for disposal
    Taken,
}

/// A collectible placed in the world
#[derive(Debug, Clone)]
pub struct CollectibleEffect {
    index: usize,
    position: Vec3,
    mesh: MeshHandle,
    state: CollectibleState,
}

impl CollectibleEffect {
    pub fn new(index: usize, position: Vec3, mesh: MeshHandle) -> Self {
        Self {
            index,
            position,
            mesh,
            state: CollectibleState::Untaken,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn mesh(&self) -> MeshHandle {
        self.mesh
    }

    pub fn is_taken(&self) -> bool {
        self.state == CollectibleState::Taken
    }

    /// Pick the collectible up.
    ///
    /// Returns the mesh the caller must dispose, or `None` if it was already
    /// taken. Star burst and pickup cue are emitted only on the first call.
    pub fn take(&mut self, fx: &mut FxSink<'_>) -> Option<MeshHandle> {
        if self.is_taken() {
            return None;
        }
        self.state = CollectibleState::Taken;

        fx.arena
            .spawn(Emitter::star_burst(self.position + Vec3::Y * STAR_BURST_LIFT));
        fx.sound(SoundCue::Pickup);
        fx.events.push(EffectEvent::Collected { index: self.index });
        Some(self.mesh)
    }
}

impl TimedEffect for CollectibleEffect {
    type State = CollectibleState;

    fn state(&self) -> CollectibleState {
        self.state
    }

    /// Pickups are driven by collision events; nothing happens per frame.
    fn advance(&mut self, _fx: &mut FxSink<'_>) {}

    fn is_settled(&self) -> bool {
        self.is_taken()
    }
}

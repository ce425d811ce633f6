//! Pickup handling on top of the collision collaborator
//!
//! One intersect-enter handler is registered per collectible against the
//! player volume. Entered handlers are drained at the tick boundary and
//! routed here; re-entry on the same collectible is a no-op.

use std::collections::HashMap;

use crate::effects::{CollectibleEffect, FxSink};
use crate::flow::Counters;
use crate::platform::{CollisionWorld, HandlerId, MeshHandle, Renderer};

#[derive(Debug, Default)]
pub struct CollisionGate {
    collectibles: Vec<CollectibleEffect>,
    handlers: HashMap<HandlerId, usize>,
}

impl CollisionGate {
    /// Register one handler per collectible against `player`
    pub fn register(
        collision: &mut dyn CollisionWorld,
        player: MeshHandle,
        collectibles: Vec<CollectibleEffect>,
    ) -> Self {
        let handlers = collectibles
            .iter()
            .enumerate()
            .map(|(slot, c)| (collision.on_intersect_enter(player, c.mesh()), slot))
            .collect();
        Self {
            collectibles,
            handlers,
        }
    }

    /// Whether `id` belongs to one of our collectibles
    pub fn owns(&self, id: HandlerId) -> bool {
        self.handlers.contains_key(&id)
    }

    /// Apply entered handlers. Returns how many collectibles were newly taken.
    pub fn handle_entered(
        &mut self,
        entered: &[HandlerId],
        renderer: &mut dyn Renderer,
        fx: &mut FxSink<'_>,
        counters: &mut Counters,
    ) -> u32 {
        let mut taken = 0;
        for id in entered {
            let Some(&slot) = self.handlers.get(id) else {
                continue;
            };
            let collectible = &mut self.collectibles[slot];
            if let Some(mesh) = collectible.take(fx) {
                counters.record_pickup();
                renderer.dispose_mesh(mesh);
                taken += 1;
                log::debug!(
                    "Collectible {} taken ({} total)",
                    collectible.index(),
                    counters.collected_count()
                );
            }
        }
        taken
    }

    pub fn collectibles(&self) -> &[CollectibleEffect] {
        &self.collectibles
    }

    pub fn taken_count(&self) -> usize {
        self.collectibles.iter().filter(|c| c.is_taken()).count()
    }

    /// Unregister every pickup handler and dispose every collectible still
    /// in the world
    pub fn dispose_remaining(
        &mut self,
        renderer: &mut dyn Renderer,
        collision: &mut dyn CollisionWorld,
    ) {
        for (id, _) in self.handlers.drain() {
            collision.remove_handler(id);
        }
        for collectible in self.collectibles.iter().filter(|c| !c.is_taken()) {
            renderer.dispose_mesh(collectible.mesh());
        }
        self.collectibles.clear();
    }
}

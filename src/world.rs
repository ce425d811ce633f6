//! Gameplay world construction
//!
//! Construction happens in two halves. [`load_game_assets`] is the suspending
//! part: it only awaits the importer and never touches controller state.
//! [`GameWorld::assemble`] runs on the tick thread once the imports have
//! resolved and creates everything that needs the renderer or collision world.

use std::rc::Rc;

use glam::Vec3;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::audio::AudioManager;
use crate::collectible_anchor;
use crate::collision::CollisionGate;
use crate::consts::*;
use crate::effects::{CollectibleEffect, EffectEvent, EffectRegistry, EmitterArena, FxSink};
use crate::error::{FlowError, Result};
use crate::flow::{Counters, PresentationContext};
use crate::platform::{
    AnimationHandle, AssetImporter, CollisionWorld, ContextKind, HandlerId, ImportedModel,
    MeshFlags, MeshHandle, Renderer,
};
use crate::settings::Settings;

/// Raw imports for the gameplay world
#[derive(Debug, Clone)]
pub struct GameAssets {
    pub environment: ImportedModel,
    pub collectible: ImportedModel,
    pub player: ImportedModel,
}

/// Import every model the gameplay world needs, in order
pub async fn load_game_assets(importer: Rc<dyn AssetImporter>) -> Result<GameAssets> {
    let environment = importer.import_model(ENVIRONMENT_MODEL).await?;
    let collectible = importer.import_model(COLLECTIBLE_MODEL).await?;
    let player = importer.import_model(PLAYER_MODEL).await?;
    Ok(GameAssets {
        environment,
        collectible,
        player,
    })
}

/// How an environment mesh takes part in the scene, from its authored name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshRole {
    /// Walkable floor: rendered, not raycast, no collision
    Ground,
    /// Invisible collision hull
    Collider,
    /// Invisible trigger volume (destination)
    Trigger,
    /// Plain scenery
    Scenery,
}

impl MeshRole {
    pub fn classify(name: &str) -> Self {
        if name == "ground" {
            MeshRole::Ground
        } else if name.contains("collision") {
            MeshRole::Collider
        } else if name.contains("Trigger") {
            MeshRole::Trigger
        } else {
            MeshRole::Scenery
        }
    }

    pub fn flags(&self) -> MeshFlags {
        let base = MeshFlags::default();
        match self {
            MeshRole::Ground => MeshFlags {
                pickable: false,
                check_collisions: false,
                ..base
            },
            MeshRole::Collider => MeshFlags {
                visible: false,
                ..base
            },
            MeshRole::Trigger => MeshFlags {
                visible: false,
                pickable: false,
                check_collisions: false,
                ..base
            },
            MeshRole::Scenery => base,
        }
    }
}

/// The assembled gameplay world
#[derive(Debug)]
pub struct GameWorld {
    player: MeshHandle,
    start_position: Vec3,
    animations: Vec<AnimationHandle>,
    gate: CollisionGate,
    destination_handlers: Vec<HandlerId>,
    registry: EffectRegistry,
    arena: EmitterArena,
    rng: Pcg32,
}

impl GameWorld {
    /// Build the gameplay context and world from resolved imports.
    ///
    /// All anchor and mesh lookups happen before anything is created, so a
    /// failure leaves no half-built context behind.
    pub fn assemble(
        assets: GameAssets,
        renderer: &mut dyn Renderer,
        collision: &mut dyn CollisionWorld,
        audio: &mut AudioManager,
        settings: &Settings,
    ) -> Result<(PresentationContext, GameWorld)> {
        let GameAssets {
            environment,
            collectible,
            player,
        } = assets;

        let anchor = |name: &str| {
            environment
                .anchor(name)
                .ok_or_else(|| FlowError::MissingAnchor {
                    name: name.to_string(),
                })
        };
        let collectible_positions = (0..COLLECTIBLE_COUNT)
            .map(|i| anchor(&collectible_anchor(i)))
            .collect::<Result<Vec<_>>>()?;
        let fireworks_origin = anchor(FIREWORKS_ANCHOR)?;
        let start_position = anchor(START_ANCHOR)?;

        let source = collectible
            .sub_meshes
            .first()
            .map(|m| m.handle)
            .ok_or_else(|| FlowError::MissingMesh {
                model: COLLECTIBLE_MODEL.to_string(),
            })?;
        let player_mesh = player
            .sub_meshes
            .first()
            .map(|m| m.handle)
            .ok_or_else(|| FlowError::MissingMesh {
                model: PLAYER_MODEL.to_string(),
            })?;

        let ctx = PresentationContext::open(ContextKind::Gameplay, None, renderer, audio);

        let mut destinations = Vec::new();
        for mesh in &environment.sub_meshes {
            let role = MeshRole::classify(&mesh.name);
            renderer.configure_mesh(mesh.handle, role.flags());
            if role == MeshRole::Trigger {
                destinations.push(mesh.handle);
            }
        }

        let collectibles = collectible_positions
            .into_iter()
            .enumerate()
            .map(|(i, position)| {
                let mesh = renderer.clone_mesh(ctx.handle(), source, &format!("coin{i}"), position);
                renderer.configure_mesh(
                    mesh,
                    MeshFlags {
                        pickable: false,
                        ..MeshFlags::default()
                    },
                );
                CollectibleEffect::new(i, position, mesh)
            })
            .collect();
        renderer.dispose_mesh(source);

        renderer.configure_mesh(
            player_mesh,
            MeshFlags {
                pickable: false,
                ..MeshFlags::default()
            },
        );

        let gate = CollisionGate::register(collision, player_mesh, collectibles);
        let destination_handlers = destinations
            .into_iter()
            .map(|target| collision.on_intersect_enter(player_mesh, target))
            .collect();

        let mut rng = Pcg32::seed_from_u64(settings.seed);
        let registry = EffectRegistry::volley(FIREWORK_COUNT, fireworks_origin, &mut rng);

        log::info!(
            "Game world assembled: {} collectibles, {} fireworks, {} animation groups",
            COLLECTIBLE_COUNT,
            FIREWORK_COUNT,
            player.animation_handles.len()
        );

        Ok((
            ctx,
            GameWorld {
                player: player_mesh,
                start_position,
                animations: player.animation_handles,
                gate,
                destination_handlers,
                registry,
                arena: EmitterArena::with_capacity(settings.max_emitters()),
                rng,
            },
        ))
    }

    pub fn player(&self) -> MeshHandle {
        self.player
    }

    pub fn start_position(&self) -> Vec3 {
        self.start_position
    }

    pub fn animations(&self) -> &[AnimationHandle] {
        &self.animations
    }

    pub fn gate(&self) -> &CollisionGate {
        &self.gate
    }

    pub fn registry(&self) -> &EffectRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut EffectRegistry {
        &mut self.registry
    }

    pub fn arena(&self) -> &EmitterArena {
        &self.arena
    }

    /// Route this tick's intersect-enter events to pickups and the destination
    pub fn process_collisions(
        &mut self,
        collision: &mut dyn CollisionWorld,
        renderer: &mut dyn Renderer,
        counters: &mut Counters,
    ) -> Vec<EffectEvent> {
        let entered = collision.drain_entered();
        if entered.is_empty() {
            return Vec::new();
        }
        if entered.iter().any(|id| self.destination_handlers.contains(id)) {
            counters.reach_destination();
        }
        let mut fx = FxSink::new(&mut self.arena, &mut self.rng);
        self.gate.handle_entered(&entered, renderer, &mut fx, counters);
        fx.events
    }

    /// Advance fireworks and age emitters by one frame
    pub fn advance_effects(&mut self) -> Vec<EffectEvent> {
        let mut fx = FxSink::new(&mut self.arena, &mut self.rng);
        self.registry.tick_all(&mut fx);
        let events = fx.events;
        self.arena.tick();
        events
    }

    /// Tear the world down, dropping any effect still in flight
    pub fn dispose(mut self, renderer: &mut dyn Renderer, collision: &mut dyn CollisionWorld) {
        let in_flight = self.registry.in_flight();
        if self.registry.is_armed() && in_flight > 0 {
            log::info!("Discarding {in_flight} fireworks still in flight");
        }
        for id in self.destination_handlers.drain(..) {
            collision.remove_handler(id);
        }
        self.gate.dispose_remaining(renderer, collision);
        self.arena.clear();
    }
}

//! Mustard Run - flow and effects core
//!
//! Core modules:
//! - `flow`: Phase state machine, fades, load gate, gameplay bookkeeping
//! - `effects`: Per-frame timed effects (fireworks, collectibles) and the emitter arena
//! - `collision`: One-shot pickup handling on top of the collision collaborator
//! - `world`: Background construction of the gameplay world
//! - `platform`: Collaborator contracts (render, assets, audio, HUD, clock)
//! - `settings`: Data-driven configuration

pub mod audio;
pub mod collision;
pub mod effects;
pub mod error;
pub mod flow;
pub mod platform;
pub mod settings;
pub mod world;

pub use error::{FlowError, ImportError};
pub use flow::{Phase, PhaseController, UserAction};
pub use settings::{QualityPreset, Settings};

/// Game configuration constants
pub mod consts {
    /// Render loop rate the frame-counted effects are tuned for
    pub const FRAMES_PER_SECOND: u32 = 60;

    /// Fade level removed per frame during a scene transition
    pub const FADE_STEP: f32 = 0.05;

    /// Number of collectibles cloned into the environment
    pub const COLLECTIBLE_COUNT: usize = 41;
    /// Collectibles needed before reaching the destination counts as a win
    pub const WIN_COLLECT_THRESHOLD: u32 = 20;
    /// Round length in seconds (4 minutes)
    pub const GAME_DURATION_SECS: f32 = 240.0;
    /// Real-time delay between the win trigger and the win overlay
    pub const WIN_COUNTDOWN_SECS: u64 = 10;

    /// Number of fireworks launched once the win sequence is armed
    pub const FIREWORK_COUNT: usize = 60;
    /// Rocket climb per frame
    pub const FIREWORK_ASCENT_STEP: f32 = 0.2;
    /// Random spread of launch positions along -x from the fireworks anchor
    pub const FIREWORK_SPREAD: f32 = 10.0;
    /// Minimum climb above the launch point
    pub const FIREWORK_MIN_CLIMB: f32 = 4.0;
    /// Random extra climb on top of the minimum
    pub const FIREWORK_CLIMB_RANGE: f32 = 15.0 + 4.0;

    /// Lifetime of one explosion spark emitter (0.2s emission + 2s particle life)
    pub const SPARK_LIFETIME_TICKS: u32 = 132;
    /// Lifetime of the pickup star burst (0.25s)
    pub const STAR_BURST_LIFETIME_TICKS: u32 = 15;
    /// Particles emitted by one pickup burst
    pub const STAR_BURST_COUNT: u32 = 12;
    /// Pickup burst spawns this far above the collectible
    pub const STAR_BURST_LIFT: f32 = 1.5;

    /// Segments of the low-resolution sphere the explosion fans out from
    pub const EXPLOSION_PROXY_SEGMENTS: u32 = 4;

    /// Environment model and anchor names
    pub const ENVIRONMENT_MODEL: &str = "models/envSetting.glb";
    pub const COLLECTIBLE_MODEL: &str = "models/coinSilver.glb";
    pub const PLAYER_MODEL: &str = "models/player.glb";
    pub const FIREWORKS_ANCHOR: &str = "fireworks";
    pub const START_ANCHOR: &str = "startPosition";
}

/// Anchor name for the `index`-th collectible placed in the environment
#[inline]
pub fn collectible_anchor(index: usize) -> String {
    format!("coin {index}")
}

//! Platform abstraction layer
//!
//! Everything the flow core consumes from the engine lives behind these traits:
//! - Rendering contexts, input attachment, mesh lifetime
//! - Asset import (asynchronous)
//! - Audio clip playback
//! - Intersection events
//! - The HUD/status display and its timer
//! - Monotonic time

pub mod headless;

use std::rc::Rc;
use std::time::Duration;

use futures_util::future::LocalBoxFuture;
use glam::Vec3;

use crate::error::ImportError;
use crate::flow::SharedFlags;

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u32);
    };
}

handle!(
    /// A render context (scene, camera, GUI root)
    ContextHandle
);
handle!(
    /// A mesh owned by the renderer
    MeshHandle
);
handle!(
    /// A transform node owned by the renderer
    NodeHandle
);
handle!(
    /// An animation group owned by the renderer
    AnimationHandle
);
handle!(
    /// A registered intersect-enter handler
    HandlerId
);

/// Which presentation a render context is built for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextKind {
    Title,
    Cutscene,
    Gameplay,
    Defeat,
}

/// Overlays drawn on top of an existing context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlay {
    /// Loading indicator while the next context is prepared
    Loading,
    /// Congratulations panel with a return-to-menu control
    Win,
}

/// Per-mesh render/collision flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshFlags {
    pub visible: bool,
    pub pickable: bool,
    pub check_collisions: bool,
    pub receive_shadows: bool,
}

impl Default for MeshFlags {
    fn default() -> Self {
        Self {
            visible: true,
            pickable: true,
            check_collisions: true,
            receive_shadows: true,
        }
    }
}

/// A mesh inside an imported model
#[derive(Debug, Clone)]
pub struct SubMesh {
    pub handle: MeshHandle,
    pub name: String,
}

/// A named transform node inside an imported model, in world space
#[derive(Debug, Clone)]
pub struct Anchor {
    pub name: String,
    pub position: Vec3,
}

/// Result of importing one model file
#[derive(Debug, Clone)]
pub struct ImportedModel {
    pub root: NodeHandle,
    pub sub_meshes: Vec<SubMesh>,
    pub animation_handles: Vec<AnimationHandle>,
    pub anchors: Vec<Anchor>,
}

impl ImportedModel {
    /// World position of the anchor called `name`
    pub fn anchor(&self, name: &str) -> Option<Vec3> {
        self.anchors
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.position)
    }
}

/// Playback options for a clip
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipOptions {
    pub looped: bool,
    pub volume: f32,
}

/// Scene rendering and input routing
pub trait Renderer {
    fn create_context(&mut self, kind: ContextKind) -> ContextHandle;
    fn render(&mut self, ctx: ContextHandle);
    fn dispose(&mut self, ctx: ContextHandle);
    fn attach_input(&mut self, ctx: ContextHandle);
    fn detach_input(&mut self, ctx: ContextHandle);
    /// Fade post-process level (1.0 = fully visible)
    fn set_fade_level(&mut self, ctx: ContextHandle, level: f32);
    fn show_overlay(&mut self, ctx: ContextHandle, overlay: Overlay);
    fn clone_mesh(
        &mut self,
        ctx: ContextHandle,
        source: MeshHandle,
        name: &str,
        position: Vec3,
    ) -> MeshHandle;
    fn configure_mesh(&mut self, mesh: MeshHandle, flags: MeshFlags);
    fn dispose_mesh(&mut self, mesh: MeshHandle);
}

/// Asynchronous model import.
///
/// The returned future must not borrow the importer; it is polled at tick
/// boundaries until it resolves.
pub trait AssetImporter {
    fn import_model(
        &self,
        path: &str,
    ) -> LocalBoxFuture<'static, Result<ImportedModel, ImportError>>;
}

/// Clip playback
pub trait AudioBackend {
    fn play_clip(&mut self, name: &str, options: ClipOptions);
    fn stop_clip(&mut self, name: &str);
}

/// Intersection detection between meshes
///
/// Handlers are not callbacks: entered pairs are queued by the collaborator and
/// drained by the flow core once per tick.
pub trait CollisionWorld {
    fn on_intersect_enter(&mut self, source: MeshHandle, target: MeshHandle) -> HandlerId;
    /// Unregister a handler; entered events still queued for it are discarded
    fn remove_handler(&mut self, id: HandlerId);
    fn drain_entered(&mut self) -> Vec<HandlerId>;
}

/// HUD collaborator: counters, round timer, pause control
pub trait StatusDisplay {
    fn update_collected_count(&mut self, count: u32);
    fn start_timer(&mut self);
    fn stop_timer(&mut self);
    fn remaining_time_secs(&self) -> f32;
    /// Enable/disable the pause button
    fn set_pause_enabled(&mut self, enabled: bool);
    /// Redraw counters and timer; the HUD owns `paused` writes from its pause menu
    fn refresh(&mut self, flags: &mut SharedFlags);
}

/// Monotonic time source
pub trait Clock {
    /// Time since an arbitrary fixed origin
    fn now(&self) -> Duration;
}

/// Every collaborator the flow core drives, bundled for the controller
pub struct Platform {
    pub renderer: Box<dyn Renderer>,
    pub importer: Rc<dyn AssetImporter>,
    pub audio: Box<dyn AudioBackend>,
    pub collision: Box<dyn CollisionWorld>,
    pub hud: Box<dyn StatusDisplay>,
    pub clock: Rc<dyn Clock>,
}

//! Headless collaborators
//!
//! In-memory implementations of every platform trait. They record what the
//! flow core asked for so the demo binary can log a session and tests can
//! inspect it. Each type is a cheap `Clone` over shared state: keep one clone
//! for inspection and hand the other to the controller.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::rc::Rc;
use std::task::Poll;
use std::time::Duration;

use futures_util::future::{self, LocalBoxFuture};
use glam::Vec3;

use super::{
    Anchor, AnimationHandle, AssetImporter, AudioBackend, ClipOptions, Clock, CollisionWorld,
    ContextHandle, ContextKind, HandlerId, ImportedModel, MeshFlags, MeshHandle, NodeHandle,
    Overlay, Renderer, StatusDisplay, SubMesh,
};
use crate::consts::*;
use crate::error::ImportError;
use crate::flow::SharedFlags;
use crate::collectible_anchor;

/// One call received by [`HeadlessRenderer`]
#[derive(Debug, Clone, PartialEq)]
pub enum RenderCall {
    Create(ContextHandle, ContextKind),
    Render(ContextHandle),
    Dispose(ContextHandle),
    AttachInput(ContextHandle),
    DetachInput(ContextHandle),
    ShowOverlay(ContextHandle, Overlay),
    DisposeMesh(MeshHandle),
}

/// Handles allocated by [`HeadlessRenderer`] start here, above every handle
/// the scripted assets use
pub const FIRST_ALLOCATED_HANDLE: u32 = 10_000;

#[derive(Debug, Default)]
struct RendererState {
    next_id: u32,
    calls: Vec<RenderCall>,
    kinds: HashMap<ContextHandle, ContextKind>,
    live: BTreeSet<ContextHandle>,
    attached: BTreeSet<ContextHandle>,
    max_attached: usize,
    fade_levels: HashMap<ContextHandle, f32>,
    meshes: HashMap<MeshHandle, MeshFlags>,
    disposed_meshes: Vec<MeshHandle>,
}

/// Renderer that draws nothing and records everything
#[derive(Debug, Clone, Default)]
pub struct HeadlessRenderer {
    state: Rc<RefCell<RendererState>>,
}

impl HeadlessRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc(&self) -> u32 {
        let mut state = self.state.borrow_mut();
        let id = FIRST_ALLOCATED_HANDLE + state.next_id;
        state.next_id += 1;
        id
    }

    pub fn calls(&self) -> Vec<RenderCall> {
        self.state.borrow().calls.clone()
    }

    /// Contexts created and not yet disposed
    pub fn live_contexts(&self) -> Vec<ContextKind> {
        let state = self.state.borrow();
        state.live.iter().map(|h| state.kinds[h]).collect()
    }

    /// Contexts currently attached to input
    pub fn attached_contexts(&self) -> Vec<ContextKind> {
        let state = self.state.borrow();
        state.attached.iter().map(|h| state.kinds[h]).collect()
    }

    /// Highest number of contexts ever attached to input at once
    pub fn max_attached(&self) -> usize {
        self.state.borrow().max_attached
    }

    /// Kind of the context rendered most recently
    pub fn last_rendered(&self) -> Option<ContextKind> {
        let state = self.state.borrow();
        state.calls.iter().rev().find_map(|c| match c {
            RenderCall::Render(h) => state.kinds.get(h).copied(),
            _ => None,
        })
    }

    pub fn fade_level(&self, kind: ContextKind) -> Option<f32> {
        let state = self.state.borrow();
        state
            .live
            .iter()
            .find(|h| state.kinds[*h] == kind)
            .and_then(|h| state.fade_levels.get(h).copied())
    }

    pub fn overlay_count(&self, overlay: Overlay) -> usize {
        self.state
            .borrow()
            .calls
            .iter()
            .filter(|c| matches!(c, RenderCall::ShowOverlay(_, o) if *o == overlay))
            .count()
    }

    pub fn mesh_flags(&self, mesh: MeshHandle) -> Option<MeshFlags> {
        self.state.borrow().meshes.get(&mesh).copied()
    }

    pub fn disposed_meshes(&self) -> Vec<MeshHandle> {
        self.state.borrow().disposed_meshes.clone()
    }
}

impl Renderer for HeadlessRenderer {
    fn create_context(&mut self, kind: ContextKind) -> ContextHandle {
        let handle = ContextHandle(self.alloc());
        let mut state = self.state.borrow_mut();
        state.kinds.insert(handle, kind);
        state.live.insert(handle);
        state.calls.push(RenderCall::Create(handle, kind));
        handle
    }

    fn render(&mut self, ctx: ContextHandle) {
        self.state.borrow_mut().calls.push(RenderCall::Render(ctx));
    }

    fn dispose(&mut self, ctx: ContextHandle) {
        let mut state = self.state.borrow_mut();
        state.live.remove(&ctx);
        state.attached.remove(&ctx);
        state.calls.push(RenderCall::Dispose(ctx));
    }

    fn attach_input(&mut self, ctx: ContextHandle) {
        let mut state = self.state.borrow_mut();
        state.attached.insert(ctx);
        state.max_attached = state.max_attached.max(state.attached.len());
        state.calls.push(RenderCall::AttachInput(ctx));
    }

    fn detach_input(&mut self, ctx: ContextHandle) {
        let mut state = self.state.borrow_mut();
        state.attached.remove(&ctx);
        state.calls.push(RenderCall::DetachInput(ctx));
    }

    fn set_fade_level(&mut self, ctx: ContextHandle, level: f32) {
        self.state.borrow_mut().fade_levels.insert(ctx, level);
    }

    fn show_overlay(&mut self, ctx: ContextHandle, overlay: Overlay) {
        self.state
            .borrow_mut()
            .calls
            .push(RenderCall::ShowOverlay(ctx, overlay));
    }

    fn clone_mesh(
        &mut self,
        _ctx: ContextHandle,
        _source: MeshHandle,
        _name: &str,
        _position: Vec3,
    ) -> MeshHandle {
        let handle = MeshHandle(self.alloc());
        self.state
            .borrow_mut()
            .meshes
            .insert(handle, MeshFlags::default());
        handle
    }

    fn configure_mesh(&mut self, mesh: MeshHandle, flags: MeshFlags) {
        self.state.borrow_mut().meshes.insert(mesh, flags);
    }

    fn dispose_mesh(&mut self, mesh: MeshHandle) {
        let mut state = self.state.borrow_mut();
        state.meshes.remove(&mesh);
        state.disposed_meshes.push(mesh);
        state.calls.push(RenderCall::DisposeMesh(mesh));
    }
}

/// Importer serving prebuilt models, optionally held back until released
#[derive(Debug, Clone)]
pub struct ScriptedImporter {
    models: Rc<RefCell<HashMap<String, Result<ImportedModel, ImportError>>>>,
    ready: Rc<Cell<bool>>,
    requests: Rc<RefCell<Vec<String>>>,
}

impl ScriptedImporter {
    /// Importer with no models; every path is `NotFound`
    pub fn empty() -> Self {
        Self {
            models: Rc::default(),
            ready: Rc::new(Cell::new(true)),
            requests: Rc::default(),
        }
    }

    /// Importer serving the environment, collectible and player models
    pub fn with_demo_assets() -> Self {
        let importer = Self::empty();
        importer.insert(ENVIRONMENT_MODEL, Ok(demo_environment()));
        importer.insert(
            COLLECTIBLE_MODEL,
            Ok(ImportedModel {
                root: NodeHandle(2),
                sub_meshes: vec![SubMesh {
                    handle: MeshHandle(2_000),
                    name: "coin".into(),
                }],
                animation_handles: Vec::new(),
                anchors: Vec::new(),
            }),
        );
        importer.insert(
            PLAYER_MODEL,
            Ok(ImportedModel {
                root: NodeHandle(3),
                sub_meshes: vec![SubMesh {
                    handle: MeshHandle(3_000),
                    name: "body".into(),
                }],
                animation_handles: vec![AnimationHandle(1), AnimationHandle(2)],
                anchors: Vec::new(),
            }),
        );
        importer
    }

    pub fn insert(&self, path: &str, model: Result<ImportedModel, ImportError>) {
        self.models.borrow_mut().insert(path.to_string(), model);
    }

    /// Hold imports pending until `release` is called
    pub fn hold(&self) {
        self.ready.set(false);
    }

    pub fn release(&self) {
        self.ready.set(true);
    }

    /// Paths requested so far, in order
    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }
}

impl AssetImporter for ScriptedImporter {
    fn import_model(
        &self,
        path: &str,
    ) -> LocalBoxFuture<'static, Result<ImportedModel, ImportError>> {
        self.requests.borrow_mut().push(path.to_string());
        let result = self
            .models
            .borrow()
            .get(path)
            .cloned()
            .unwrap_or_else(|| {
                Err(ImportError::NotFound {
                    path: path.to_string(),
                })
            });
        let ready = self.ready.clone();
        let mut result = Some(result);
        Box::pin(future::poll_fn(move |_| {
            if !ready.get() {
                return Poll::Pending;
            }
            match result.take() {
                Some(r) => Poll::Ready(r),
                None => Poll::Pending,
            }
        }))
    }
}

/// Environment with every anchor and mesh role the world assembly looks for
pub fn demo_environment() -> ImportedModel {
    let names = ["ground", "house", "fence collision", "destinationTrigger"];
    let sub_meshes = names
        .iter()
        .enumerate()
        .map(|(i, name)| SubMesh {
            handle: MeshHandle(1_000 + i as u32),
            name: (*name).to_string(),
        })
        .collect();

    let mut anchors: Vec<Anchor> = (0..COLLECTIBLE_COUNT)
        .map(|i| Anchor {
            name: collectible_anchor(i),
            position: Vec3::new(i as f32 * 2.0, 1.0, (i % 5) as f32),
        })
        .collect();
    anchors.push(Anchor {
        name: FIREWORKS_ANCHOR.into(),
        position: Vec3::new(30.0, 2.0, -40.0),
    });
    anchors.push(Anchor {
        name: START_ANCHOR.into(),
        position: Vec3::ZERO,
    });

    ImportedModel {
        root: NodeHandle(1),
        sub_meshes,
        animation_handles: Vec::new(),
        anchors,
    }
}

/// One call received by [`RecordingAudio`]
#[derive(Debug, Clone, PartialEq)]
pub enum AudioCall {
    Play(String, ClipOptions),
    Stop(String),
}

/// Audio backend that only records
#[derive(Debug, Clone, Default)]
pub struct RecordingAudio {
    calls: Rc<RefCell<Vec<AudioCall>>>,
}

impl RecordingAudio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<AudioCall> {
        self.calls.borrow().clone()
    }

    /// Number of times `clip` was started
    pub fn play_count(&self, clip: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|c| matches!(c, AudioCall::Play(name, _) if name == clip))
            .count()
    }
}

impl AudioBackend for RecordingAudio {
    fn play_clip(&mut self, name: &str, options: ClipOptions) {
        log::trace!("play {name} ({options:?})");
        self.calls
            .borrow_mut()
            .push(AudioCall::Play(name.to_string(), options));
    }

    fn stop_clip(&mut self, name: &str) {
        self.calls.borrow_mut().push(AudioCall::Stop(name.to_string()));
    }
}

#[derive(Debug, Default)]
struct CollisionState {
    next_id: u32,
    handlers: BTreeMap<HandlerId, (MeshHandle, MeshHandle)>,
    entered: Vec<HandlerId>,
}

/// Collision world fed by hand: call [`QueuedCollisions::enter`] to simulate
/// the player touching a mesh
#[derive(Debug, Clone, Default)]
pub struct QueuedCollisions {
    state: Rc<RefCell<CollisionState>>,
}

impl QueuedCollisions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue enter events for every handler targeting `target`
    pub fn enter(&self, target: MeshHandle) {
        let mut state = self.state.borrow_mut();
        let hits: Vec<HandlerId> = state
            .handlers
            .iter()
            .filter(|(_, (_, t))| *t == target)
            .map(|(id, _)| *id)
            .collect();
        state.entered.extend(hits);
    }

    /// Targets of all live handlers, in registration order
    pub fn targets(&self) -> Vec<MeshHandle> {
        self.state.borrow().handlers.values().map(|(_, t)| *t).collect()
    }
}

impl CollisionWorld for QueuedCollisions {
    fn on_intersect_enter(&mut self, source: MeshHandle, target: MeshHandle) -> HandlerId {
        let mut state = self.state.borrow_mut();
        let id = HandlerId(state.next_id);
        state.next_id += 1;
        state.handlers.insert(id, (source, target));
        id
    }

    fn remove_handler(&mut self, id: HandlerId) {
        let mut state = self.state.borrow_mut();
        state.handlers.remove(&id);
        state.entered.retain(|e| *e != id);
    }

    fn drain_entered(&mut self) -> Vec<HandlerId> {
        std::mem::take(&mut self.state.borrow_mut().entered)
    }
}

#[derive(Debug)]
struct HudState {
    duration_secs: f32,
    frame_secs: f32,
    remaining_secs: f32,
    running: bool,
    collected: u32,
    pause_enabled: bool,
    refreshes: u32,
}

/// HUD whose round timer advances one frame per refresh, so it stops
/// whenever refreshes stop (i.e. while the game is paused)
#[derive(Debug, Clone)]
pub struct HeadlessHud {
    state: Rc<RefCell<HudState>>,
}

impl HeadlessHud {
    pub fn new(duration_secs: f32) -> Self {
        Self {
            state: Rc::new(RefCell::new(HudState {
                duration_secs,
                frame_secs: 1.0 / FRAMES_PER_SECOND as f32,
                remaining_secs: duration_secs,
                running: false,
                collected: 0,
                pause_enabled: true,
                refreshes: 0,
            })),
        }
    }

    pub fn collected(&self) -> u32 {
        self.state.borrow().collected
    }

    pub fn is_running(&self) -> bool {
        self.state.borrow().running
    }

    pub fn pause_enabled(&self) -> bool {
        self.state.borrow().pause_enabled
    }

    pub fn refreshes(&self) -> u32 {
        self.state.borrow().refreshes
    }

    /// Jump the round timer, e.g. to reach time-out quickly
    pub fn set_remaining(&self, secs: f32) {
        self.state.borrow_mut().remaining_secs = secs;
    }
}

impl StatusDisplay for HeadlessHud {
    fn update_collected_count(&mut self, count: u32) {
        self.state.borrow_mut().collected = count;
    }

    fn start_timer(&mut self) {
        let mut state = self.state.borrow_mut();
        state.remaining_secs = state.duration_secs;
        state.running = true;
    }

    fn stop_timer(&mut self) {
        self.state.borrow_mut().running = false;
    }

    fn remaining_time_secs(&self) -> f32 {
        self.state.borrow().remaining_secs
    }

    fn set_pause_enabled(&mut self, enabled: bool) {
        self.state.borrow_mut().pause_enabled = enabled;
    }

    fn refresh(&mut self, _flags: &mut SharedFlags) {
        let mut state = self.state.borrow_mut();
        state.refreshes += 1;
        if state.running {
            state.remaining_secs = (state.remaining_secs - state.frame_secs).max(0.0);
        }
    }
}

/// Clock that only moves when told to
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::FutureExt;

    #[test]
    fn test_renderer_tracks_attachment() {
        let mut renderer = HeadlessRenderer::new();
        let a = renderer.create_context(ContextKind::Title);
        let b = renderer.create_context(ContextKind::Cutscene);
        renderer.attach_input(a);
        renderer.detach_input(a);
        renderer.attach_input(b);
        renderer.dispose(a);

        assert_eq!(renderer.max_attached(), 1);
        assert_eq!(renderer.live_contexts(), vec![ContextKind::Cutscene]);
        assert_eq!(renderer.attached_contexts(), vec![ContextKind::Cutscene]);
    }

    #[test]
    fn test_held_import_resolves_after_release() {
        let importer = ScriptedImporter::with_demo_assets();
        importer.hold();
        let mut fut = importer.import_model(PLAYER_MODEL);
        assert!((&mut fut).now_or_never().is_none());

        importer.release();
        let model = fut.now_or_never().unwrap().unwrap();
        assert_eq!(model.animation_handles.len(), 2);
    }

    #[test]
    fn test_unknown_model_is_not_found() {
        let importer = ScriptedImporter::empty();
        let result = importer.import_model("models/nope.glb").now_or_never().unwrap();
        assert!(matches!(result, Err(ImportError::NotFound { .. })));
    }

    #[test]
    fn test_collision_queue_matches_target() {
        let mut world = QueuedCollisions::new();
        let player = MeshHandle(1);
        let h0 = world.on_intersect_enter(player, MeshHandle(10));
        let _h1 = world.on_intersect_enter(player, MeshHandle(11));

        world.enter(MeshHandle(10));
        assert_eq!(world.drain_entered(), vec![h0]);
        assert!(world.drain_entered().is_empty());
    }

    #[test]
    fn test_removed_handler_is_forgotten() {
        let mut world = QueuedCollisions::new();
        let player = MeshHandle(1);
        let h0 = world.on_intersect_enter(player, MeshHandle(10));
        let h1 = world.on_intersect_enter(player, MeshHandle(11));

        world.enter(MeshHandle(10));
        world.remove_handler(h0);
        assert!(world.drain_entered().is_empty());
        world.enter(MeshHandle(10));
        assert!(world.drain_entered().is_empty());
        assert_eq!(world.targets(), vec![MeshHandle(11)]);

        // Ids are never reused
        let h2 = world.on_intersect_enter(player, MeshHandle(10));
        assert!(h2 != h0 && h2 != h1);
    }

    #[test]
    fn test_allocated_handles_avoid_scripted_range() {
        let mut renderer = HeadlessRenderer::new();
        let ctx = renderer.create_context(ContextKind::Gameplay);
        let mesh = renderer.clone_mesh(ctx, MeshHandle(2_000), "coin0", Vec3::ZERO);
        assert!(ctx.0 >= FIRST_ALLOCATED_HANDLE);
        assert!(mesh.0 >= FIRST_ALLOCATED_HANDLE);
        assert_ne!(ctx.0, mesh.0);
    }

    #[test]
    fn test_hud_timer_counts_frames() {
        let mut hud = HeadlessHud::new(1.0);
        let mut flags = SharedFlags::default();
        hud.refresh(&mut flags);
        assert_eq!(hud.remaining_time_secs(), 1.0);

        hud.start_timer();
        for _ in 0..FRAMES_PER_SECOND {
            hud.refresh(&mut flags);
        }
        assert!(hud.remaining_time_secs() <= 1e-4);
    }
}

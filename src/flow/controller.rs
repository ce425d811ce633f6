//! Root phase state machine
//!
//! One call to [`PhaseController::tick`] is one rendered frame. The controller
//! owns the active [`PresentationContext`], the gameplay world once it has been
//! built, and every collaborator it drives.

use std::collections::VecDeque;
use std::rc::Rc;
use std::task::{Context, Poll};
use std::time::Duration;

use futures_util::FutureExt;
use futures_util::future::LocalBoxFuture;
use futures_util::task::noop_waker_ref;

use super::context::PresentationContext;
use super::load_gate::LoadGate;
use super::phase::{Phase, UserAction};
use super::session::GameSession;
use super::shared::SharedFlags;
use crate::audio::{AudioManager, MusicTrack, SoundCue};
use crate::consts::FRAMES_PER_SECOND;
use crate::effects::EffectEvent;
use crate::error::{FlowError, Result};
use crate::platform::{
    AssetImporter, Clock, CollisionWorld, ContextKind, Overlay, Platform, Renderer, StatusDisplay,
};
use crate::settings::Settings;
use crate::world::{GameAssets, GameWorld, load_game_assets};

/// Phase edges kept for diagnostics
const HISTORY_LIMIT: usize = 64;

/// One phase edge taken by the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionRecord {
    pub from: Phase,
    pub to: Phase,
    /// Frame the edge was taken on
    pub frame: u64,
}

pub struct PhaseController {
    settings: Settings,
    renderer: Box<dyn Renderer>,
    importer: Rc<dyn AssetImporter>,
    collision: Box<dyn CollisionWorld>,
    hud: Box<dyn StatusDisplay>,
    clock: Rc<dyn Clock>,
    audio: AudioManager,

    phase: Phase,
    context: PresentationContext,
    flags: SharedFlags,
    session: GameSession,

    load_gate: LoadGate,
    construction: Option<LocalBoxFuture<'static, Result<GameAssets>>>,
    pending: Option<(PresentationContext, GameWorld)>,
    construction_failed: bool,
    world: Option<GameWorld>,

    history: VecDeque<TransitionRecord>,
    frame: u64,
    phase_ticks: u64,
    stuck_warned: bool,
}

impl PhaseController {
    /// Start on the title screen
    pub fn new(settings: Settings, platform: Platform) -> Self {
        let Platform {
            mut renderer,
            importer,
            audio,
            collision,
            hud,
            clock,
        } = platform;
        let mut audio = AudioManager::new(audio, &settings);
        let mut context = PresentationContext::open(
            ContextKind::Title,
            Some(MusicTrack::Title),
            renderer.as_mut(),
            &mut audio,
        );
        context.attach_input(renderer.as_mut());
        let session = Self::new_session(&settings);
        log::info!("Entering {:?}", Phase::Start);

        Self {
            settings,
            renderer,
            importer,
            collision,
            hud,
            clock,
            audio,
            phase: Phase::Start,
            context,
            flags: SharedFlags::default(),
            session,
            load_gate: LoadGate::new(),
            construction: None,
            pending: None,
            construction_failed: false,
            world: None,
            history: VecDeque::with_capacity(HISTORY_LIMIT),
            frame: 0,
            phase_ticks: 0,
            stuck_warned: false,
        }
    }

    fn new_session(settings: &Settings) -> GameSession {
        GameSession::new(
            settings.win_collect_threshold,
            Duration::from_secs(settings.win_countdown_secs),
        )
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn context(&self) -> &PresentationContext {
        &self.context
    }

    pub fn flags(&self) -> &SharedFlags {
        &self.flags
    }

    /// The HUD pause menu writes `paused` and `quit_requested` through this
    pub fn flags_mut(&mut self) -> &mut SharedFlags {
        &mut self.flags
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn world(&self) -> Option<&GameWorld> {
        self.world.as_ref()
    }

    pub fn load_gate(&self) -> &LoadGate {
        &self.load_gate
    }

    pub fn construction_failed(&self) -> bool {
        self.construction_failed
    }

    pub fn history(&self) -> impl Iterator<Item = &TransitionRecord> {
        self.history.iter()
    }

    /// Frames rendered so far
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Frames spent in the current phase
    pub fn phase_ticks(&self) -> u64 {
        self.phase_ticks
    }

    /// External signal: the player entered the destination volume
    pub fn report_destination_reached(&mut self) {
        if self.phase == Phase::Game {
            self.session.counters_mut().reach_destination();
        }
    }

    /// Deliver a user action. Returns whether it was honoured.
    pub fn handle_input(&mut self, action: UserAction) -> bool {
        if action.phase() != self.phase || !self.context.input_attached() {
            log::debug!("Ignoring {action:?} in {:?}", self.phase);
            return false;
        }

        match action {
            UserAction::Play | UserAction::MainMenu => {
                self.audio.play(SoundCue::MenuSelect);
                self.context.detach_input(self.renderer.as_mut());
                self.context.start_fade();
            }
            UserAction::DismissCutscene => {
                self.context.detach_input(self.renderer.as_mut());
                self.renderer
                    .show_overlay(self.context.handle(), Overlay::Loading);
                self.load_gate.mark_user_dismissed();
            }
            UserAction::ReturnToMenu => {
                if !self.session.overlay_shown() || self.flags.transition_requested {
                    return false;
                }
                self.flags.transition_requested = true;
                self.audio.play(SoundCue::Quit);
            }
        }
        log::debug!("Handled {action:?}");
        true
    }

    /// Advance one frame and render the active context.
    ///
    /// The only error is a failed background construction, reported once. The
    /// controller stays in the cutscene afterwards.
    pub fn tick(&mut self) -> Result<()> {
        self.frame += 1;
        self.phase_ticks += 1;

        let result = match self.phase {
            Phase::Start | Phase::Lose => {
                self.tick_menu();
                Ok(())
            }
            Phase::Cutscene => self.tick_cutscene(),
            Phase::Game => {
                self.tick_game();
                Ok(())
            }
        };

        self.warn_if_stuck();
        self.context.render(self.renderer.as_mut());
        result
    }

    fn tick_menu(&mut self) {
        if !self.context.tick_fade(self.renderer.as_mut()) {
            return;
        }
        match self.phase {
            Phase::Start => self.go_to_cutscene(),
            Phase::Lose => self.go_to_start(),
            _ => {}
        }
    }

    fn tick_cutscene(&mut self) -> Result<()> {
        if let Err(err) = self.poll_construction() {
            log::error!("{err}: {}", err_chain(&err));
            self.construction_failed = true;
            return Err(err);
        }
        if self.load_gate.try_release() {
            self.go_to_game();
        }
        Ok(())
    }

    /// Poll the outstanding construction once; assemble the world when it
    /// resolves
    fn poll_construction(&mut self) -> Result<()> {
        let Some(fut) = self.construction.as_mut() else {
            return Ok(());
        };
        let mut cx = Context::from_waker(noop_waker_ref());
        let Poll::Ready(result) = fut.poll_unpin(&mut cx) else {
            return Ok(());
        };
        self.construction = None;

        let assets = result.map_err(|e| FlowError::construction(Phase::Game, e))?;
        let built = GameWorld::assemble(
            assets,
            self.renderer.as_mut(),
            self.collision.as_mut(),
            &mut self.audio,
            &self.settings,
        )
        .map_err(|e| FlowError::construction(Phase::Game, e))?;

        self.pending = Some(built);
        self.load_gate.mark_construction_done();
        log::info!("Game construction finished on frame {}", self.frame);
        Ok(())
    }

    fn tick_game(&mut self) {
        if self.flags.quit_requested {
            self.go_to_start();
            return;
        }
        let Some(world) = self.world.as_mut() else {
            return;
        };
        let now = self.clock.now();

        let mut events = world.process_collisions(
            self.collision.as_mut(),
            self.renderer.as_mut(),
            self.session.counters_mut(),
        );
        if self.session.counters_mut().take_collected_this_frame() {
            self.hud
                .update_collected_count(self.session.counters().collected_count());
        }

        if self.flags.transition_requested {
            self.context.start_fade();
            if self.context.tick_fade(self.renderer.as_mut()) {
                self.flags.transition_requested = false;
                self.flags.quit_requested = true;
            }
            self.flags.fade_level = self.context.fade().level();
        }

        events.extend(world.advance_effects());
        for event in &events {
            if let EffectEvent::Sound(cue) = event {
                self.audio.play(*cue);
            }
        }

        if self.session.check_win() {
            log::info!(
                "Win condition met with {} collected",
                self.session.counters().collected_count()
            );
            self.flags.paused = true;
            self.hud.set_pause_enabled(false);
            self.context.switch_music(MusicTrack::Ending, &mut self.audio);
            world.registry_mut().arm();
            self.session.start_countdown(now);
        }
        if self.session.poll_countdown(now) {
            log::info!("Showing win overlay");
            self.renderer
                .show_overlay(self.context.handle(), Overlay::Win);
        }

        if !self.flags.paused {
            self.hud.refresh(&mut self.flags);
        }

        if !self.session.win_condition_met() && self.hud.remaining_time_secs() <= 0.0 {
            self.go_to_lose();
        }
    }

    fn go_to_cutscene(&mut self) {
        let next = PresentationContext::open(
            ContextKind::Cutscene,
            None,
            self.renderer.as_mut(),
            &mut self.audio,
        );
        self.install_context(next, None);

        self.load_gate = LoadGate::new();
        self.construction_failed = false;
        if self.construction.is_some() || self.pending.is_some() {
            log::warn!("Game construction already outstanding; not starting another");
        } else {
            self.construction = Some(load_game_assets(self.importer.clone()).boxed_local());
        }
        self.enter(Phase::Cutscene);
    }

    fn go_to_game(&mut self) {
        let Some((next, world)) = self.pending.take() else {
            log::warn!("Load gate released without a built world");
            return;
        };
        self.install_context(next, Some(MusicTrack::Gameplay));
        self.world = Some(world);

        self.flags = SharedFlags::default();
        self.session = Self::new_session(&self.settings);
        self.hud.set_pause_enabled(true);
        self.hud.update_collected_count(0);
        self.hud.start_timer();
        self.enter(Phase::Game);
    }

    fn go_to_lose(&mut self) {
        self.hud.stop_timer();
        self.dispose_world();
        let next = PresentationContext::open(
            ContextKind::Defeat,
            None,
            self.renderer.as_mut(),
            &mut self.audio,
        );
        self.install_context(next, Some(MusicTrack::Defeat));
        self.enter(Phase::Lose);
    }

    fn go_to_start(&mut self) {
        if self.phase == Phase::Game {
            self.hud.stop_timer();
            self.dispose_world();
        }
        let next = PresentationContext::open(
            ContextKind::Title,
            None,
            self.renderer.as_mut(),
            &mut self.audio,
        );
        self.install_context(next, Some(MusicTrack::Title));
        self.flags = SharedFlags::default();
        self.enter(Phase::Start);
    }

    /// Swap in `next`: the outgoing context is detached and disposed before
    /// the incoming one gets its music and input
    fn install_context(&mut self, next: PresentationContext, music: Option<MusicTrack>) {
        let outgoing = std::mem::replace(&mut self.context, next);
        outgoing.dispose(self.renderer.as_mut(), &mut self.audio);
        if let Some(track) = music {
            self.context.switch_music(track, &mut self.audio);
        }
        self.context.attach_input(self.renderer.as_mut());
    }

    fn dispose_world(&mut self) {
        if let Some(world) = self.world.take() {
            world.dispose(self.renderer.as_mut(), self.collision.as_mut());
        }
    }

    fn enter(&mut self, next: Phase) {
        debug_assert!(
            self.phase.can_transition_to(next),
            "illegal phase edge {:?} -> {:?}",
            self.phase,
            next
        );
        log::info!("Phase {:?} -> {:?} on frame {}", self.phase, next, self.frame);
        if self.history.len() == HISTORY_LIMIT {
            self.history.pop_front();
        }
        self.history.push_back(TransitionRecord {
            from: self.phase,
            to: next,
            frame: self.frame,
        });
        self.phase = next;
        self.phase_ticks = 0;
        self.stuck_warned = false;
    }

    fn warn_if_stuck(&mut self) {
        if self.stuck_warned || self.phase != Phase::Cutscene {
            return;
        }
        let limit = u64::from(self.settings.stuck_phase_warn_secs) * u64::from(FRAMES_PER_SECOND);
        if self.phase_ticks >= limit {
            self.stuck_warned = true;
            log::warn!(
                "Still in {:?} after {} frames (construction done: {}, dismissed: {}, failed: {})",
                self.phase,
                self.phase_ticks,
                self.load_gate.construction_done(),
                self.load_gate.user_dismissed(),
                self.construction_failed
            );
        }
    }
}

/// Render an error's source chain on one line
fn err_chain(err: &dyn std::error::Error) -> String {
    let mut parts = Vec::new();
    let mut source = err.source();
    while let Some(e) = source {
        parts.push(e.to_string());
        source = e.source();
    }
    parts.join(": ")
}

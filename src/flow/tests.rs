use std::rc::Rc;
use std::time::Duration;

use proptest::prelude::*;

use super::*;
use crate::audio::{MusicTrack, SoundCue};
use crate::collectible_anchor;
use crate::consts::*;
use crate::effects::{LaunchState, TimedEffect};
use crate::error::{FlowError, ImportError};
use crate::platform::headless::{
    HeadlessHud, HeadlessRenderer, ManualClock, QueuedCollisions, RecordingAudio,
    ScriptedImporter, demo_environment,
};
use crate::platform::{ContextKind, MeshHandle, Overlay, Platform, StatusDisplay};
use crate::settings::Settings;

/// Destination trigger mesh in the demo environment
const DESTINATION: MeshHandle = MeshHandle(1_003);

struct Harness {
    ctl: PhaseController,
    renderer: HeadlessRenderer,
    importer: ScriptedImporter,
    audio: RecordingAudio,
    collision: QueuedCollisions,
    hud: HeadlessHud,
    clock: ManualClock,
}

impl Harness {
    fn new() -> Self {
        Self::with(Settings::default(), ScriptedImporter::with_demo_assets())
    }

    fn with(settings: Settings, importer: ScriptedImporter) -> Self {
        let renderer = HeadlessRenderer::new();
        let audio = RecordingAudio::new();
        let collision = QueuedCollisions::new();
        let hud = HeadlessHud::new(settings.game_duration_secs);
        let clock = ManualClock::new();
        let platform = Platform {
            renderer: Box::new(renderer.clone()),
            importer: Rc::new(importer.clone()),
            audio: Box::new(audio.clone()),
            collision: Box::new(collision.clone()),
            hud: Box::new(hud.clone()),
            clock: Rc::new(clock.clone()),
        };
        Self {
            ctl: PhaseController::new(settings, platform),
            renderer,
            importer,
            audio,
            collision,
            hud,
            clock,
        }
    }

    fn ticks(&mut self, n: usize) {
        for _ in 0..n {
            self.ctl.tick().unwrap();
        }
    }

    fn to_cutscene(&mut self) {
        assert!(self.ctl.handle_input(UserAction::Play));
        self.ticks(20);
        assert_eq!(self.ctl.phase(), Phase::Cutscene);
    }

    fn to_game(&mut self) {
        self.to_cutscene();
        assert!(self.ctl.handle_input(UserAction::DismissCutscene));
        self.ticks(1);
        assert_eq!(self.ctl.phase(), Phase::Game);
    }

    fn collectible_meshes(&self) -> Vec<MeshHandle> {
        self.ctl
            .world()
            .unwrap()
            .gate()
            .collectibles()
            .iter()
            .map(|c| c.mesh())
            .collect()
    }

    /// Take every collectible and reach the destination in one frame
    fn win(&mut self) {
        for mesh in self.collectible_meshes() {
            self.collision.enter(mesh);
        }
        self.collision.enter(DESTINATION);
        self.ticks(1);
        assert!(self.ctl.session().win_condition_met());
    }
}

fn edges(ctl: &PhaseController) -> Vec<(Phase, Phase)> {
    ctl.history().map(|r| (r.from, r.to)).collect()
}

#[test]
fn test_starts_on_title_attached() {
    let h = Harness::new();
    assert_eq!(h.ctl.phase(), Phase::Start);
    assert_eq!(h.renderer.attached_contexts(), vec![ContextKind::Title]);
    assert_eq!(h.audio.play_count(MusicTrack::Title.clip()), 1);
}

#[test]
fn test_play_fades_into_cutscene() {
    let mut h = Harness::new();
    assert!(h.ctl.handle_input(UserAction::Play));
    assert_eq!(h.audio.play_count(SoundCue::MenuSelect.clip()), 1);
    assert!(h.renderer.attached_contexts().is_empty());

    h.ticks(19);
    assert_eq!(h.ctl.phase(), Phase::Start);
    assert!(h.ctl.context().fade().is_active());

    h.ticks(1);
    assert_eq!(h.ctl.phase(), Phase::Cutscene);
    assert!(!h.ctl.context().fade().is_active());
    assert_eq!(h.renderer.live_contexts(), vec![ContextKind::Cutscene]);
    assert_eq!(h.renderer.attached_contexts(), vec![ContextKind::Cutscene]);
}

#[test]
fn test_input_outside_its_phase_is_ignored() {
    let mut h = Harness::new();
    assert!(!h.ctl.handle_input(UserAction::MainMenu));
    assert!(!h.ctl.handle_input(UserAction::DismissCutscene));
    assert!(h.ctl.handle_input(UserAction::Play));
    // Detached while fading
    assert!(!h.ctl.handle_input(UserAction::Play));
    assert_eq!(h.audio.play_count(SoundCue::MenuSelect.clip()), 1);
}

#[test]
fn test_gate_waits_for_last_flag() {
    let importer = ScriptedImporter::with_demo_assets();
    importer.hold();
    let mut h = Harness::with(Settings::default(), importer);
    h.to_cutscene();

    h.ticks(4);
    h.importer.release();
    h.ticks(1);
    assert!(h.ctl.load_gate().construction_done());
    assert_eq!(h.ctl.phase(), Phase::Cutscene);

    h.ticks(6);
    assert!(h.ctl.handle_input(UserAction::DismissCutscene));
    assert_eq!(h.renderer.overlay_count(Overlay::Loading), 1);
    h.ticks(1);
    assert_eq!(h.ctl.phase(), Phase::Game);
    assert_eq!(h.ctl.phase_ticks(), 0);
}

#[test]
fn test_dismiss_before_construction_done() {
    let importer = ScriptedImporter::with_demo_assets();
    importer.hold();
    let mut h = Harness::with(Settings::default(), importer);
    h.to_cutscene();

    assert!(h.ctl.handle_input(UserAction::DismissCutscene));
    h.ticks(30);
    assert_eq!(h.ctl.phase(), Phase::Cutscene);
    assert_eq!(h.renderer.last_rendered(), Some(ContextKind::Cutscene));

    h.importer.release();
    h.ticks(1);
    assert_eq!(h.ctl.phase(), Phase::Game);
}

#[test]
fn test_entering_game_swaps_context() {
    let mut h = Harness::new();
    h.to_game();
    assert_eq!(h.renderer.live_contexts(), vec![ContextKind::Gameplay]);
    assert_eq!(h.renderer.attached_contexts(), vec![ContextKind::Gameplay]);
    assert_eq!(h.audio.play_count(MusicTrack::Gameplay.clip()), 1);
    assert!(h.hud.is_running());
    assert!(h.hud.pause_enabled());
    assert_eq!(
        edges(&h.ctl),
        vec![(Phase::Start, Phase::Cutscene), (Phase::Cutscene, Phase::Game)]
    );
}

#[test]
fn test_timeout_goes_to_lose() {
    let mut h = Harness::new();
    h.to_game();
    h.hud.set_remaining(1.5 / FRAMES_PER_SECOND as f32);

    h.ticks(1);
    assert_eq!(h.ctl.phase(), Phase::Game);
    h.ticks(1);
    assert_eq!(h.ctl.phase(), Phase::Lose);
    assert!(!h.hud.is_running());
    assert!(h.ctl.world().is_none());
    assert_eq!(h.renderer.live_contexts(), vec![ContextKind::Defeat]);
    assert_eq!(h.renderer.last_rendered(), Some(ContextKind::Defeat));
    assert_eq!(h.audio.play_count(MusicTrack::Defeat.clip()), 1);
}

#[test]
fn test_lose_main_menu_returns_to_start() {
    let mut h = Harness::new();
    h.to_game();
    h.hud.set_remaining(0.0);
    h.ticks(1);
    assert_eq!(h.ctl.phase(), Phase::Lose);

    assert!(h.ctl.handle_input(UserAction::MainMenu));
    h.ticks(20);
    assert_eq!(h.ctl.phase(), Phase::Start);
    assert_eq!(h.renderer.attached_contexts(), vec![ContextKind::Title]);

    // A second round builds a fresh world
    h.to_game();
    assert_eq!(h.importer.requests().len(), 6);
    assert_eq!(h.ctl.session().counters().collected_count(), 0);
    assert_eq!(h.renderer.max_attached(), 1);
}

#[test]
fn test_rounds_do_not_accumulate_handlers() {
    let mut h = Harness::new();
    for round in 0..30 {
        h.to_game();
        assert_eq!(
            h.collision.targets().len(),
            COLLECTIBLE_COUNT + 1,
            "round {round}"
        );
        // The destination trigger never aliases a cloned collectible
        assert!(!h.collectible_meshes().contains(&DESTINATION));
        h.collision.enter(DESTINATION);
        h.ticks(1);
        assert_eq!(h.ctl.session().counters().collected_count(), 0);
        assert!(h.ctl.session().counters().destination_reached());

        h.ctl.flags_mut().quit_requested = true;
        h.ticks(1);
        assert_eq!(h.ctl.phase(), Phase::Start);
        assert!(h.collision.targets().is_empty());
    }
}

#[test]
fn test_pickup_is_one_shot() {
    let mut h = Harness::new();
    h.to_game();
    let mesh = h.collectible_meshes()[3];

    h.collision.enter(mesh);
    h.collision.enter(mesh);
    h.ticks(1);
    h.collision.enter(mesh);
    h.ticks(1);

    assert_eq!(h.ctl.session().counters().collected_count(), 1);
    assert_eq!(h.hud.collected(), 1);
    assert_eq!(h.audio.play_count(SoundCue::Pickup.clip()), 1);
    assert!(h.renderer.disposed_meshes().contains(&mesh));
}

#[test]
fn test_several_pickups_in_one_frame() {
    let mut h = Harness::new();
    h.to_game();
    for mesh in h.collectible_meshes().into_iter().take(5) {
        h.collision.enter(mesh);
    }
    h.ticks(1);
    assert_eq!(h.hud.collected(), 5);
    assert_eq!(h.ctl.world().unwrap().gate().taken_count(), 5);
}

#[test]
fn test_destination_without_threshold_does_not_win() {
    let mut h = Harness::new();
    h.to_game();
    h.collision.enter(DESTINATION);
    h.ticks(1);
    assert!(h.ctl.session().counters().destination_reached());
    assert!(!h.ctl.session().win_condition_met());
    assert!(!h.ctl.flags().paused);
}

#[test]
fn test_win_sequence_and_overlay_once() {
    let mut h = Harness::new();
    h.to_game();
    h.win();

    assert!(h.ctl.flags().paused);
    assert!(!h.hud.pause_enabled());
    assert_eq!(h.hud.collected(), COLLECTIBLE_COUNT as u32);
    assert!(h.ctl.world().unwrap().registry().is_armed());
    assert_eq!(h.audio.play_count(MusicTrack::Ending.clip()), 1);

    h.clock.advance(Duration::from_millis(9_999));
    h.ticks(1);
    assert_eq!(h.renderer.overlay_count(Overlay::Win), 0);

    h.clock.advance(Duration::from_millis(1));
    h.ticks(1);
    assert_eq!(h.renderer.overlay_count(Overlay::Win), 1);

    h.clock.advance(Duration::from_secs(30));
    h.ticks(10);
    assert_eq!(h.renderer.overlay_count(Overlay::Win), 1);
    assert_eq!(h.audio.play_count(MusicTrack::Ending.clip()), 1);
    assert_eq!(h.ctl.phase(), Phase::Game);
}

#[test]
fn test_win_freezes_round_timer() {
    let mut h = Harness::new();
    h.to_game();
    h.win();
    let remaining = h.hud.remaining_time_secs();
    let refreshes = h.hud.refreshes();
    h.ticks(50);
    assert_eq!(h.hud.remaining_time_secs(), remaining);
    assert_eq!(h.hud.refreshes(), refreshes);
}

#[test]
fn test_pause_skips_hud_refresh() {
    let mut h = Harness::new();
    h.to_game();
    h.ctl.flags_mut().paused = true;
    let refreshes = h.hud.refreshes();
    h.ticks(5);
    assert_eq!(h.hud.refreshes(), refreshes);

    h.ctl.flags_mut().paused = false;
    h.ticks(5);
    assert_eq!(h.hud.refreshes(), refreshes + 5);
}

#[test]
fn test_fireworks_progress_monotonically() {
    let mut h = Harness::new();
    h.to_game();
    h.win();

    fn rank(state: LaunchState) -> u8 {
        match state {
            LaunchState::Pending { .. } => 0,
            LaunchState::Ascending => 1,
            LaunchState::Exploded => 2,
        }
    }
    let ranks = |ctl: &PhaseController| -> Vec<u8> {
        ctl.world()
            .unwrap()
            .registry()
            .fireworks()
            .iter()
            .map(|f| rank(f.state()))
            .collect()
    };

    let mut last = ranks(&h.ctl);
    for _ in 0..4_000 {
        h.ticks(1);
        let now = ranks(&h.ctl);
        for (before, after) in last.iter().zip(&now) {
            assert!(after >= before);
            assert!(after - before <= 1);
        }
        last = now;
    }
    assert!(h.ctl.world().unwrap().registry().all_exploded());
    assert_eq!(
        h.audio.play_count(SoundCue::FireworkExplosion.clip()),
        FIREWORK_COUNT
    );
}

#[test]
fn test_return_to_menu_needs_overlay() {
    let mut h = Harness::new();
    h.to_game();
    h.win();
    assert!(!h.ctl.handle_input(UserAction::ReturnToMenu));

    h.clock.advance(Duration::from_secs(WIN_COUNTDOWN_SECS));
    h.ticks(1);
    assert!(h.ctl.handle_input(UserAction::ReturnToMenu));
    assert!(h.ctl.flags().transition_requested);
    assert_eq!(h.audio.play_count(SoundCue::Quit.clip()), 1);
    assert!(!h.ctl.handle_input(UserAction::ReturnToMenu));
}

#[test]
fn test_quit_fades_then_disposes_world() {
    let mut h = Harness::new();
    h.to_game();
    h.win();
    h.clock.advance(Duration::from_secs(WIN_COUNTDOWN_SECS));
    h.ticks(1);
    assert!(h.ctl.handle_input(UserAction::ReturnToMenu));

    h.ticks(10);
    assert!((h.ctl.flags().fade_level - 0.5).abs() < 1e-3);
    assert_eq!(
        h.renderer.fade_level(ContextKind::Gameplay),
        Some(h.ctl.flags().fade_level)
    );

    h.ticks(10);
    assert!(h.ctl.flags().quit_requested);
    assert!(!h.ctl.flags().transition_requested);
    assert_eq!(h.ctl.phase(), Phase::Game);

    h.ticks(1);
    assert_eq!(h.ctl.phase(), Phase::Start);
    assert!(h.ctl.world().is_none());
    assert!(!h.ctl.flags().quit_requested);
    assert!(!h.hud.is_running());
    assert_eq!(h.renderer.live_contexts(), vec![ContextKind::Title]);
    assert_eq!(h.renderer.attached_contexts(), vec![ContextKind::Title]);
}

#[test]
fn test_pause_menu_quit() {
    let mut h = Harness::new();
    h.to_game();
    let untaken = h.collectible_meshes();
    h.ctl.flags_mut().quit_requested = true;
    h.ticks(1);

    assert_eq!(h.ctl.phase(), Phase::Start);
    let disposed = h.renderer.disposed_meshes();
    assert!(untaken.iter().all(|m| disposed.contains(m)));
    assert_eq!(h.audio.play_count(MusicTrack::Title.clip()), 2);
}

#[test]
fn test_construction_failure_reported_once() {
    let importer = ScriptedImporter::with_demo_assets();
    importer.insert(
        PLAYER_MODEL,
        Err(ImportError::NotFound {
            path: PLAYER_MODEL.into(),
        }),
    );
    let mut h = Harness::with(Settings::default(), importer);
    h.to_cutscene();

    let err = h.ctl.tick().unwrap_err();
    assert!(matches!(
        err,
        FlowError::Construction {
            phase: Phase::Game,
            ..
        }
    ));
    assert!(h.ctl.construction_failed());
    assert_eq!(h.renderer.last_rendered(), Some(ContextKind::Cutscene));

    assert!(h.ctl.handle_input(UserAction::DismissCutscene));
    h.ticks(100);
    assert_eq!(h.ctl.phase(), Phase::Cutscene);
    assert!(!h.ctl.load_gate().is_released());
    assert_eq!(h.ctl.phase_ticks(), 101);
}

#[test]
fn test_missing_anchor_fails_construction() {
    let importer = ScriptedImporter::with_demo_assets();
    let mut env = demo_environment();
    env.anchors.retain(|a| a.name != collectible_anchor(40));
    importer.insert(ENVIRONMENT_MODEL, Ok(env));
    let mut h = Harness::with(Settings::default(), importer);
    h.to_cutscene();

    match h.ctl.tick() {
        Err(FlowError::Construction { source, .. }) => {
            assert!(matches!(*source, FlowError::MissingAnchor { .. }));
        }
        other => panic!("expected construction failure, got {other:?}"),
    }
    assert_eq!(h.renderer.live_contexts(), vec![ContextKind::Cutscene]);
}

#[test]
fn test_arena_sized_by_quality() {
    let settings = Settings {
        particles: false,
        ..Settings::default()
    };
    let mut h = Harness::with(settings, ScriptedImporter::with_demo_assets());
    h.to_game();
    let mesh = h.collectible_meshes()[0];
    h.collision.enter(mesh);
    h.ticks(1);

    let arena = h.ctl.world().unwrap().arena();
    assert_eq!(arena.capacity(), 0);
    assert_eq!(arena.dropped(), 1);
    // Pickup still counts without particles
    assert_eq!(h.hud.collected(), 1);
}

#[derive(Debug, Clone)]
enum Op {
    Input(UserAction),
    Tick(u8),
    Pickup(usize),
    Destination,
    Advance(u64),
    Timeout,
    PauseQuit,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        prop_oneof![
            Just(UserAction::Play),
            Just(UserAction::DismissCutscene),
            Just(UserAction::MainMenu),
            Just(UserAction::ReturnToMenu),
        ]
        .prop_map(Op::Input),
        (1u8..25).prop_map(Op::Tick),
        (0..COLLECTIBLE_COUNT).prop_map(Op::Pickup),
        Just(Op::Destination),
        (0u64..12).prop_map(Op::Advance),
        Just(Op::Timeout),
        Just(Op::PauseQuit),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn random_sessions_keep_invariants(ops in proptest::collection::vec(op(), 1..80)) {
        let mut h = Harness::new();
        for op in ops {
            match op {
                Op::Input(action) => {
                    h.ctl.handle_input(action);
                }
                Op::Tick(n) => {
                    for _ in 0..n {
                        prop_assert!(h.ctl.tick().is_ok());
                        if let Some(world) = h.ctl.world() {
                            prop_assert_eq!(
                                h.ctl.session().counters().collected_count() as usize,
                                world.gate().taken_count()
                            );
                        }
                    }
                }
                Op::Pickup(i) => {
                    if h.ctl.world().is_some() {
                        let mesh = h.collectible_meshes()[i];
                        h.collision.enter(mesh);
                    }
                }
                Op::Destination => h.collision.enter(DESTINATION),
                Op::Advance(secs) => h.clock.advance(Duration::from_secs(secs)),
                Op::Timeout => h.hud.set_remaining(0.0),
                Op::PauseQuit => {
                    if h.ctl.phase() == Phase::Game {
                        h.ctl.flags_mut().quit_requested = true;
                    }
                }
            }
        }

        for (from, to) in edges(&h.ctl) {
            prop_assert!(from.can_transition_to(to), "illegal edge {:?} -> {:?}", from, to);
        }
        let history: Vec<_> = h.ctl.history().copied().collect();
        for pair in history.windows(2) {
            prop_assert_eq!(pair[0].to, pair[1].from);
        }
        prop_assert!(h.renderer.max_attached() <= 1);
        prop_assert!(h.renderer.overlay_count(Overlay::Win) <= history.iter().filter(|r| r.to == Phase::Game).count());
        // Cutscene plus a built but not yet entered gameplay context at most
        prop_assert!(h.renderer.live_contexts().len() <= 2);
    }
}

//! Mustard Run headless demo
//!
//! Drives the phase flow through a scripted session with in-memory
//! collaborators: one round won, one round lost, and back to the title screen.
//!
//! Usage: `mustard-run [settings.json] [low|medium|high]`

use std::rc::Rc;
use std::time::Duration;

use mustard_run::consts::*;
use mustard_run::platform::Platform;
use mustard_run::platform::headless::{
    HeadlessHud, HeadlessRenderer, ManualClock, QueuedCollisions, RecordingAudio,
    ScriptedImporter,
};
use mustard_run::{Phase, PhaseController, QualityPreset, Settings, UserAction};

/// Frames to wait on the title and cutscene before pressing anything
const IDLE_FRAMES: u64 = 45;
/// Frames between scripted pickups
const PICKUP_INTERVAL: u64 = 6;
/// Hard stop for the scripted session
const MAX_FRAMES: u64 = 60 * 60 * 5;

fn main() {
    env_logger::init();
    log::info!("Mustard Run (headless) starting...");

    let mut args = std::env::args().skip(1);
    let mut settings = match args.next() {
        Some(path) => Settings::load_or_default(path),
        None => Settings::default(),
    };
    if let Some(name) = args.next() {
        match QualityPreset::from_str(&name) {
            Some(preset) => settings.apply_preset(preset),
            None => log::warn!(
                "Unknown quality preset {name:?}, keeping {}",
                settings.quality.as_str()
            ),
        }
    }
    log::info!(
        "Quality {}, {} emitters max, win at {} collected",
        settings.quality.as_str(),
        settings.max_emitters(),
        settings.win_collect_threshold
    );

    let renderer = HeadlessRenderer::new();
    let audio = RecordingAudio::new();
    let collision = QueuedCollisions::new();
    let hud = HeadlessHud::new(settings.game_duration_secs);
    let clock = ManualClock::new();
    let threshold = settings.win_collect_threshold as usize;

    let mut controller = PhaseController::new(
        settings,
        Platform {
            renderer: Box::new(renderer.clone()),
            importer: Rc::new(ScriptedImporter::with_demo_assets()),
            audio: Box::new(audio.clone()),
            collision: Box::new(collision.clone()),
            hud: Box::new(hud.clone()),
            clock: Rc::new(clock.clone()),
        },
    );

    let frame_time = Duration::from_secs(1) / FRAMES_PER_SECOND;
    let mut rounds_played = 0;
    let mut next_pickup = 0;

    while controller.frame() < MAX_FRAMES {
        let in_phase = controller.phase_ticks();
        match controller.phase() {
            Phase::Start if rounds_played == 2 => break,
            Phase::Start if in_phase == IDLE_FRAMES => {
                controller.handle_input(UserAction::Play);
            }
            Phase::Cutscene if in_phase == IDLE_FRAMES => {
                controller.handle_input(UserAction::DismissCutscene);
            }
            Phase::Game if in_phase == 0 => {
                rounds_played += 1;
                next_pickup = 0;
                log::info!("Round {rounds_played} started");
            }
            Phase::Game if rounds_played == 1 => {
                // First round: collect enough, reach the destination, return from the win overlay
                if next_pickup < threshold && in_phase % PICKUP_INTERVAL == 0 {
                    if let Some(mesh) = controller
                        .world()
                        .and_then(|w| w.gate().collectibles().get(next_pickup))
                        .map(|c| c.mesh())
                    {
                        collision.enter(mesh);
                    }
                    next_pickup += 1;
                } else if next_pickup == threshold {
                    controller.report_destination_reached();
                    next_pickup += 1;
                }
                if controller.session().overlay_shown() {
                    controller.handle_input(UserAction::ReturnToMenu);
                }
            }
            Phase::Game if in_phase == IDLE_FRAMES => {
                // Second round: let the clock run out
                hud.set_remaining(0.0);
            }
            Phase::Lose if in_phase == IDLE_FRAMES => {
                controller.handle_input(UserAction::MainMenu);
            }
            _ => {}
        }

        if let Err(err) = controller.tick() {
            log::error!("Session aborted: {err}");
            break;
        }
        clock.advance(frame_time);
    }

    for record in controller.history() {
        log::info!(
            "frame {:>5}: {:?} -> {:?}",
            record.frame,
            record.from,
            record.to
        );
    }
    log::info!(
        "Session finished after {} frames: {} render calls, {} audio calls, max attached {}",
        controller.frame(),
        renderer.calls().len(),
        audio.calls().len(),
        renderer.max_attached()
    );
}

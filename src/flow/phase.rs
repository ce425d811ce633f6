//! Top-level presentation phases

use serde::{Deserialize, Serialize};

/// Which presentation is current. The win screen is an overlay inside
/// `Game`, not a phase of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Title screen
    Start,
    /// Instructions shown while the game world loads
    Cutscene,
    /// Active gameplay
    Game,
    /// Time ran out
    Lose,
}

impl Phase {
    /// Legal phase edges
    pub fn can_transition_to(self, next: Phase) -> bool {
        matches!(
            (self, next),
            (Phase::Start, Phase::Cutscene)
                | (Phase::Cutscene, Phase::Game)
                | (Phase::Game, Phase::Lose)
                | (Phase::Game, Phase::Start)
                | (Phase::Lose, Phase::Start)
        )
    }
}

/// User input delivered to the context attached to input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAction {
    /// Title screen play button
    Play,
    /// Skip button on the instructions
    DismissCutscene,
    /// Lose screen main menu button
    MainMenu,
    /// Win overlay return button
    ReturnToMenu,
}

impl UserAction {
    /// The only phase this action means anything in
    pub fn phase(self) -> Phase {
        match self {
            UserAction::Play => Phase::Start,
            UserAction::DismissCutscene => Phase::Cutscene,
            UserAction::MainMenu => Phase::Lose,
            UserAction::ReturnToMenu => Phase::Game,
        }
    }
}

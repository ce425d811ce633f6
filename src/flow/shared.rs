//! Flags shared between the controller and the HUD
//!
//! Owned by the controller and lent to the HUD on refresh. Each field has a
//! single writer during gameplay:
//!
//! | field                  | written by                                        |
//! |------------------------|---------------------------------------------------|
//! | `paused`               | HUD pause menu; the controller once, on win       |
//! | `quit_requested`       | HUD pause menu, or the controller when the exit fade ends |
//! | `transition_requested` | controller, from the win overlay return button    |
//! | `fade_level`           | controller                                        |
//!
//! The controller resets all of them when gameplay starts.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SharedFlags {
    /// Gameplay timer and HUD refresh are suspended
    pub paused: bool,
    /// Leave gameplay for the title screen on the next tick
    pub quit_requested: bool,
    /// Run the exit fade
    pub transition_requested: bool,
    /// Current exit fade level (1.0 = fully visible)
    pub fade_level: f32,
}

impl Default for SharedFlags {
    fn default() -> Self {
        Self {
            paused: false,
            quit_requested: false,
            transition_requested: false,
            fade_level: 1.0,
        }
    }
}

//! Phase flow
//!
//! The [`PhaseController`] owns the current phase and its presentation
//! context, and advances everything that happens in one frame.

pub mod context;
pub mod controller;
pub mod fade;
pub mod load_gate;
pub mod phase;
pub mod session;
pub mod shared;

#[cfg(test)]
mod tests;

pub use context::PresentationContext;
pub use controller::{PhaseController, TransitionRecord};
pub use fade::FadeTransition;
pub use load_gate::LoadGate;
pub use phase::{Phase, UserAction};
pub use session::{Counters, GameSession, WinCountdown};
pub use shared::SharedFlags;

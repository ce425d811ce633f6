//! Cutscene exit barrier
//!
//! Releases once both the background construction has finished and the user
//! has dismissed the cutscene, whichever comes last.

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadGate {
    construction_done: bool,
    user_dismissed: bool,
    released: bool,
}

impl LoadGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_construction_done(&mut self) {
        self.construction_done = true;
    }

    pub fn mark_user_dismissed(&mut self) {
        self.user_dismissed = true;
    }

    pub fn construction_done(&self) -> bool {
        self.construction_done
    }

    pub fn user_dismissed(&self) -> bool {
        self.user_dismissed
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// True exactly once: on the first check with both flags set
    pub fn try_release(&mut self) -> bool {
        if self.released || !(self.construction_done && self.user_dismissed) {
            return false;
        }
        self.released = true;
        true
    }
}

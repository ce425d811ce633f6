//! Gameplay bookkeeping: pickup counters, win detection, win countdown

use std::time::Duration;

/// Counters fed by pickups and the destination trigger
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    collected_count: u32,
    collected_this_frame: bool,
    destination_reached: bool,
}

impl Counters {
    pub fn collected_count(&self) -> u32 {
        self.collected_count
    }

    /// Only called for a collectible's first pickup
    pub fn record_pickup(&mut self) {
        self.collected_count += 1;
        self.collected_this_frame = true;
    }

    /// Read and clear the "HUD needs a new count" flag
    pub fn take_collected_this_frame(&mut self) -> bool {
        std::mem::take(&mut self.collected_this_frame)
    }

    pub fn reach_destination(&mut self) {
        self.destination_reached = true;
    }

    pub fn destination_reached(&self) -> bool {
        self.destination_reached
    }
}

/// Real-time, fire-once countdown. Cannot be cancelled once started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WinCountdown {
    started_at: Duration,
    length: Duration,
    fired: bool,
}

impl WinCountdown {
    pub fn start(now: Duration, length: Duration) -> Self {
        Self {
            started_at: now,
            length,
            fired: false,
        }
    }

    /// True exactly once, on the first poll at or after expiry
    pub fn poll(&mut self, now: Duration) -> bool {
        if self.fired || now.saturating_sub(self.started_at) < self.length {
            return false;
        }
        self.fired = true;
        true
    }

    pub fn has_fired(&self) -> bool {
        self.fired
    }
}

/// Bookkeeping for one round of gameplay
#[derive(Debug, Clone)]
pub struct GameSession {
    counters: Counters,
    threshold: u32,
    win_condition_met: bool,
    countdown_length: Duration,
    countdown: Option<WinCountdown>,
    overlay_shown: bool,
}

impl GameSession {
    pub fn new(threshold: u32, countdown_length: Duration) -> Self {
        Self {
            counters: Counters::default(),
            threshold,
            win_condition_met: false,
            countdown_length,
            countdown: None,
            overlay_shown: false,
        }
    }

    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    pub fn counters_mut(&mut self) -> &mut Counters {
        &mut self.counters
    }

    pub fn win_condition_met(&self) -> bool {
        self.win_condition_met
    }

    /// Returns true on the single tick the win condition becomes met
    pub fn check_win(&mut self) -> bool {
        if self.win_condition_met {
            return false;
        }
        if self.counters.destination_reached && self.counters.collected_count >= self.threshold {
            self.win_condition_met = true;
            return true;
        }
        false
    }

    pub fn start_countdown(&mut self, now: Duration) {
        if self.countdown.is_none() {
            self.countdown = Some(WinCountdown::start(now, self.countdown_length));
        }
    }

    /// True once, when the overlay should be shown
    pub fn poll_countdown(&mut self, now: Duration) -> bool {
        let due = self.countdown.as_mut().is_some_and(|c| c.poll(now));
        if due {
            self.overlay_shown = true;
        }
        due
    }

    pub fn overlay_shown(&self) -> bool {
        self.overlay_shown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_win_needs_both_threshold_and_destination() {
        let mut session = GameSession::new(2, Duration::from_secs(10));
        session.counters_mut().reach_destination();
        assert!(!session.check_win());

        session.counters_mut().record_pickup();
        session.counters_mut().record_pickup();
        assert!(session.check_win());
        assert!(!session.check_win());
        assert!(session.win_condition_met());
    }

    #[test]
    fn test_threshold_without_destination() {
        let mut session = GameSession::new(1, Duration::from_secs(10));
        session.counters_mut().record_pickup();
        assert!(!session.check_win());
        session.counters_mut().reach_destination();
        assert!(session.check_win());
    }

    #[test]
    fn test_countdown_fires_once_after_length() {
        let mut session = GameSession::new(0, Duration::from_secs(10));
        assert!(!session.poll_countdown(Duration::from_secs(100)));

        session.start_countdown(Duration::from_secs(5));
        // Restarting does not push the deadline back
        session.start_countdown(Duration::from_secs(8));
        assert!(!session.poll_countdown(Duration::from_millis(14_999)));
        assert!(session.poll_countdown(Duration::from_secs(15)));
        assert!(!session.poll_countdown(Duration::from_secs(16)));
        assert!(session.overlay_shown());
    }

    #[test]
    fn test_collected_flag_is_consumed() {
        let mut counters = Counters::default();
        assert!(!counters.take_collected_this_frame());
        counters.record_pickup();
        assert!(counters.take_collected_this_frame());
        assert!(!counters.take_collected_this_frame());
        assert_eq!(counters.collected_count(), 1);
    }
}

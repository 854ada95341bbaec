/// Timer intent recorded by the engine
///
/// The engine never sleeps. It only records whether the gravity and lock
/// timers should be running, tagging every (re)start with a fresh epoch.
/// Whoever drives the engine arms real deadlines from these epochs and hands
/// the epoch back when a deadline fires, so a firing that belongs to a
/// cancelled or restarted timer is recognised and dropped.
use serde::{Deserialize, Serialize};

/// Armed epochs of both timers; `None` means stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TimerState {
    /// Periodic gravity timer
    pub gravity: Option<u64>,
    /// One-shot lock-delay timer
    pub lock: Option<u64>,
}

/// A deadline that elapsed, tagged with the epoch it was armed for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerFiring {
    Gravity(u64),
    Lock(u64),
}

#[derive(Debug, Default)]
pub(crate) struct Timers {
    state: TimerState,
    last_epoch: u64,
}

impl Timers {
    fn next_epoch(&mut self) -> u64 {
        self.last_epoch += 1;
        self.last_epoch
    }

    pub(crate) fn state(&self) -> TimerState {
        self.state
    }

    pub(crate) fn gravity_armed(&self) -> bool {
        self.state.gravity.is_some()
    }

    pub(crate) fn lock_pending(&self) -> bool {
        self.state.lock.is_some()
    }

    pub(crate) fn restart_gravity(&mut self) {
        let epoch = self.next_epoch();
        self.state.gravity = Some(epoch);
    }

    /// Arm gravity unless it already runs, keeping the current period
    pub(crate) fn ensure_gravity(&mut self) {
        if self.state.gravity.is_none() {
            self.restart_gravity();
        }
    }

    pub(crate) fn stop_gravity(&mut self) {
        self.state.gravity = None;
    }

    pub(crate) fn restart_lock(&mut self) {
        let epoch = self.next_epoch();
        self.state.lock = Some(epoch);
    }

    pub(crate) fn cancel_lock(&mut self) {
        self.state.lock = None;
    }

    pub(crate) fn stop_all(&mut self) {
        self.state = TimerState::default();
    }

    /// Whether `firing` matches the currently armed epoch of its timer
    pub(crate) fn is_current(&self, firing: TimerFiring) -> bool {
        match firing {
            TimerFiring::Gravity(epoch) => self.state.gravity == Some(epoch),
            TimerFiring::Lock(epoch) => self.state.lock == Some(epoch),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_restart_assigns_fresh_epochs() {
        let mut timers = Timers::default();
        timers.restart_gravity();
        let first = timers.state().gravity.unwrap();
        timers.restart_gravity();
        let second = timers.state().gravity.unwrap();
        assert_ne!(first, second);
        assert!(!timers.is_current(TimerFiring::Gravity(first)));
        assert!(timers.is_current(TimerFiring::Gravity(second)));
    }

    #[test]
    fn test_ensure_keeps_running_gravity() {
        let mut timers = Timers::default();
        timers.ensure_gravity();
        let epoch = timers.state().gravity;
        timers.ensure_gravity();
        assert_eq!(timers.state().gravity, epoch);

        timers.stop_gravity();
        timers.ensure_gravity();
        assert!(timers.gravity_armed());
        assert_ne!(timers.state().gravity, epoch);
    }

    #[test]
    fn test_epochs_are_shared_across_timers() {
        let mut timers = Timers::default();
        timers.restart_gravity();
        timers.restart_lock();
        let state = timers.state();
        assert_ne!(state.gravity, state.lock);
        // A lock firing carrying the gravity epoch is stale
        assert!(!timers.is_current(TimerFiring::Lock(state.gravity.unwrap())));
    }

    #[test]
    fn test_cancelled_lock_is_stale() {
        let mut timers = Timers::default();
        timers.restart_lock();
        let epoch = timers.state().lock.unwrap();
        timers.cancel_lock();
        assert!(!timers.lock_pending());
        assert!(!timers.is_current(TimerFiring::Lock(epoch)));
    }

    #[test]
    fn test_stop_all() {
        let mut timers = Timers::default();
        timers.restart_gravity();
        timers.restart_lock();
        timers.stop_all();
        assert_eq!(timers.state(), TimerState::default());
    }
}

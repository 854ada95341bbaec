//! The game state machine and its timer bookkeeping
mod engine;
mod timers;

use serde::{Deserialize, Serialize};

pub use engine::Game;
pub use timers::{TimerFiring, TimerState};

/// Observable lifecycle phase of a game
///
/// Spawning, placing and line clearing happen inside a single engine call and
/// are never observed from outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Built but not started
    Idle,
    /// A piece is falling under gravity
    Falling,
    /// The piece rests on terrain and the lock delay runs
    Locking,
    /// Terminal; every input is ignored
    GameOver,
}

impl Phase {
    pub fn is_playing(&self) -> bool {
        matches!(self, Phase::Falling | Phase::Locking)
    }
}

//! Configuration for a game engine and its session

use std::time::Duration;

use crate::error::{EngineError, Result};
use crate::types::PieceKind;

/// What happens when a falling piece can no longer move down
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LockMode {
    /// Start a lock-delay timer; the piece settles when it expires
    #[default]
    Delayed,
    /// Settle on the first blocked downward move
    Immediate,
}

/// How often the hold slot may be used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HoldPolicy {
    /// Hold may be used any number of times per piece
    #[default]
    Unrestricted,
    /// Hold may be used once between two placements
    OncePerPiece,
}

/// Main configuration for a game
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Grid width in cells
    pub width: usize,

    /// Grid height in cells
    pub height: usize,

    /// Number of upcoming pieces kept visible in the next queue
    pub preview_size: usize,

    /// Period of the gravity timer. Zero disables autonomous gravity.
    pub gravity_interval: Duration,

    /// Grace period between grounding and settling
    pub lock_delay: Duration,

    /// Maximum lock-delay restarts per piece (None = unlimited)
    pub lock_reset_limit: Option<u32>,

    /// Lock behaviour when a downward move is blocked
    pub lock_mode: LockMode,

    /// Hold restriction
    pub hold_policy: HoldPolicy,

    /// Kinds the bag is filled with
    pub piece_kinds: Vec<PieceKind>,

    /// Seed for the bag shuffle (random if None)
    pub seed: Option<u64>,

    /// Longest time `Session::step` waits before returning a timeout
    pub step_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            width: 10,
            height: 20,
            preview_size: 4,
            gravity_interval: Duration::from_millis(500),
            lock_delay: Duration::from_millis(500),
            lock_reset_limit: None,
            lock_mode: LockMode::Delayed,
            hold_policy: HoldPolicy::Unrestricted,
            piece_kinds: PieceKind::ALL.to_vec(),
            seed: None,
            step_timeout: Duration::from_millis(1000),
        }
    }
}

impl EngineConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the grid size
    pub fn with_size(mut self, width: usize, height: usize) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set the number of previewed pieces
    pub fn with_preview_size(mut self, preview_size: usize) -> Self {
        self.preview_size = preview_size;
        self
    }

    /// Set the gravity period
    pub fn with_gravity_interval(mut self, interval: Duration) -> Self {
        self.gravity_interval = interval;
        self
    }

    /// Set the lock delay
    pub fn with_lock_delay(mut self, delay: Duration) -> Self {
        self.lock_delay = delay;
        self
    }

    /// Cap lock-delay restarts per piece
    pub fn with_lock_reset_limit(mut self, limit: Option<u32>) -> Self {
        self.lock_reset_limit = limit;
        self
    }

    /// Set the lock mode
    pub fn with_lock_mode(mut self, mode: LockMode) -> Self {
        self.lock_mode = mode;
        self
    }

    /// Set the hold policy
    pub fn with_hold_policy(mut self, policy: HoldPolicy) -> Self {
        self.hold_policy = policy;
        self
    }

    /// Replace the canonical piece set
    pub fn with_piece_kinds(mut self, kinds: Vec<PieceKind>) -> Self {
        self.piece_kinds = kinds;
        self
    }

    /// Make the piece sequence reproducible
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the session step timeout
    pub fn with_step_timeout(mut self, timeout: Duration) -> Self {
        self.step_timeout = timeout;
        self
    }

    /// Check construction parameters
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(EngineError::InvalidGridSize {
                width: self.width,
                height: self.height,
            });
        }
        if self.piece_kinds.is_empty() {
            return Err(EngineError::EmptyPieceSet);
        }
        for (i, kind) in self.piece_kinds.iter().enumerate() {
            if self.piece_kinds[..i].contains(kind) {
                return Err(EngineError::DuplicatePieceKind(*kind));
            }
        }
        Ok(())
    }
}

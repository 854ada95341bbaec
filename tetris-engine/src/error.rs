/// Error types for the tetris-engine library
use thiserror::Error;

use crate::types::PieceKind;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors that can occur in tetris-engine operations
///
/// Illegal moves and input after game over are not errors: the engine
/// ignores them silently. Only construction and the session channel can fail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Grid dimensions must both be at least 1
    #[error("Invalid grid size: {width}x{height}. Width and height must be at least 1")]
    InvalidGridSize {
        /// Requested width
        width: usize,
        /// Requested height
        height: usize,
    },

    /// The configured piece set is empty
    #[error("Piece set must contain at least one piece kind")]
    EmptyPieceSet,

    /// The configured piece set lists a kind twice
    #[error("Piece kind {0} appears more than once in the piece set")]
    DuplicatePieceKind(PieceKind),

    /// A prepared grid does not match the configured dimensions, or still has an active piece
    #[error("Invalid initial grid: {0}")]
    InvalidInitialGrid(String),

    /// Piece kind name could not be parsed
    #[error("Unknown piece kind: {0}")]
    UnknownPieceKind(String),

    /// The session owning the engine is gone
    #[error("Session closed")]
    SessionClosed,
}

impl EngineError {
    /// True for errors raised while validating construction parameters
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            EngineError::InvalidGridSize { .. }
                | EngineError::EmptyPieceSet
                | EngineError::DuplicatePieceKind(_)
                | EngineError::InvalidInitialGrid(_)
        )
    }
}

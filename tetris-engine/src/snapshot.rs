//! Serializable read-only view of a game
use serde::{Deserialize, Serialize};

use crate::game::Phase;
use crate::piece::Piece;
use crate::types::{Cell, PieceKind};

/// Everything a renderer needs, detached from the engine
///
/// Masks and cells are row-major, `width * height` long.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub width: usize,
    pub height: usize,
    pub cells: Vec<Cell>,
    /// Cells covered by the falling piece
    pub active: Vec<bool>,
    /// Cells the falling piece would cover after a hard drop
    pub ghost: Vec<bool>,
    pub current: Option<Piece>,
    pub held: Option<PieceKind>,
    /// Upcoming kinds, soonest first
    pub preview: Vec<PieceKind>,
    pub playing: bool,
    pub phase: Phase,
    pub b2b_combo: u32,
}

impl Snapshot {
    fn index(&self, x: usize, y: usize) -> Option<usize> {
        (x < self.width && y < self.height).then_some(y * self.width + x)
    }

    pub fn cell(&self, x: usize, y: usize) -> Cell {
        self.index(x, y).and_then(|idx| self.cells[idx])
    }

    pub fn is_active(&self, x: usize, y: usize) -> bool {
        self.index(x, y).is_some_and(|idx| self.active[idx])
    }

    pub fn is_ghost(&self, x: usize, y: usize) -> bool {
        self.index(x, y).is_some_and(|idx| self.ghost[idx])
    }

    /// Number of settled (filled, not active) cells
    pub fn settled_count(&self) -> usize {
        self.cells
            .iter()
            .zip(&self.active)
            .filter(|(cell, active)| cell.is_some() && !**active)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use crate::config::EngineConfig;
    use crate::game::Game;

    use super::*;

    #[test]
    fn test_snapshot_of_started_game() {
        let mut game = Game::new(
            EngineConfig::new()
                .with_piece_kinds(vec![PieceKind::O])
                .with_preview_size(2),
        )
        .unwrap();
        game.start();
        let snapshot = game.snapshot();

        assert!(snapshot.playing);
        assert_eq!(snapshot.phase, Phase::Falling);
        assert_eq!(snapshot.preview, vec![PieceKind::O, PieceKind::O]);
        assert_eq!(snapshot.cell(4, 0), Some(PieceKind::O));
        assert!(snapshot.is_active(5, 1));
        assert!(snapshot.is_ghost(4, 19));
        assert!(!snapshot.is_ghost(4, 0));
        assert_eq!(snapshot.settled_count(), 0);
        assert_eq!(snapshot.cell(10, 0), None);
    }

    #[test]
    fn test_snapshot_serializes_to_json() {
        let mut game = Game::new(EngineConfig::new().with_seed(11)).unwrap();
        game.start();
        game.hard_drop();
        let snapshot = game.snapshot();

        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(json.contains("\"phase\":\"Falling\""));
        let parsed: Snapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, snapshot);
        assert_eq!(parsed.settled_count(), 4);
    }
}

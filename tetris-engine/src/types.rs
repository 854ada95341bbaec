/// Core types for the tetris-engine library
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// The seven canonical piece kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PieceKind {
    I,
    J,
    L,
    O,
    S,
    T,
    Z,
}

impl PieceKind {
    /// All canonical kinds, in declaration order
    pub const ALL: [PieceKind; 7] = [
        PieceKind::I,
        PieceKind::J,
        PieceKind::L,
        PieceKind::O,
        PieceKind::S,
        PieceKind::T,
        PieceKind::Z,
    ];

    /// Single letter name
    pub fn as_str(&self) -> &'static str {
        match self {
            PieceKind::I => "I",
            PieceKind::J => "J",
            PieceKind::L => "L",
            PieceKind::O => "O",
            PieceKind::S => "S",
            PieceKind::T => "T",
            PieceKind::Z => "Z",
        }
    }
}

impl std::fmt::Display for PieceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PieceKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        PieceKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| EngineError::UnknownPieceKind(s.to_string()))
    }
}

/// Content of one grid cell: `None` is empty, otherwise the kind that filled it
pub type Cell = Option<PieceKind>;

/// Grid coordinates of a piece anchor (top-left corner of its footprint)
///
/// `y` grows downwards, row 0 is the spawn row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: isize,
    pub y: isize,
}

impl Position {
    pub fn new(x: isize, y: isize) -> Self {
        Self { x, y }
    }

    /// Position one unit step away in `direction`
    pub fn shifted(self, direction: MoveDirection) -> Self {
        let (dx, dy) = direction.delta();
        Self::new(self.x + dx, self.y + dy)
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Unit translations a piece can make
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveDirection {
    Left,
    Right,
    Down,
}

impl MoveDirection {
    /// (dx, dy) in grid coordinates
    pub fn delta(self) -> (isize, isize) {
        match self {
            MoveDirection::Left => (-1, 0),
            MoveDirection::Right => (1, 0),
            MoveDirection::Down => (0, 1),
        }
    }
}

/// Quarter-turn rotations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RotationDirection {
    Clockwise,
    Counterclockwise,
    Half,
}

impl RotationDirection {
    /// Change applied to the mod-4 rotation counter
    pub fn quarter_turns(self) -> u8 {
        match self {
            RotationDirection::Clockwise => 1,
            RotationDirection::Counterclockwise => 3,
            RotationDirection::Half => 2,
        }
    }
}

/// Inbound input commands accepted by the engine
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Command {
    MoveLeft,
    MoveRight,
    SoftDrop,
    HardDrop,
    RotateClockwise,
    RotateCounterclockwise,
    Rotate180,
    Hold,
}

impl Command {
    pub const ALL: [Command; 8] = [
        Command::MoveLeft,
        Command::MoveRight,
        Command::SoftDrop,
        Command::HardDrop,
        Command::RotateClockwise,
        Command::RotateCounterclockwise,
        Command::Rotate180,
        Command::Hold,
    ];

    /// camelCase name, as written to logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::MoveLeft => "moveLeft",
            Command::MoveRight => "moveRight",
            Command::SoftDrop => "softDrop",
            Command::HardDrop => "hardDrop",
            Command::RotateClockwise => "rotateClockwise",
            Command::RotateCounterclockwise => "rotateCounterclockwise",
            Command::Rotate180 => "rotate180",
            Command::Hold => "hold",
        }
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

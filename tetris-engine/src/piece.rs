//! Piece footprints, rotation and the falling piece itself

use serde::{Deserialize, Serialize};

use crate::types::{PieceKind, Position, RotationDirection};

/// Boolean footprint matrix of a piece, row-major
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Shape {
    width: usize,
    height: usize,
    cells: Vec<bool>,
}

impl Shape {
    /// Build a shape from rows of 0/1 values. All rows must have the same length.
    pub fn from_rows<const W: usize>(rows: &[[u8; W]]) -> Self {
        let cells = rows.iter().flatten().map(|&v| v != 0).collect();
        Self {
            width: W,
            height: rows.len(),
            cells,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Whether the cell at column `x`, row `y` is filled. Out of range is empty.
    pub fn get(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height && self.cells[y * self.width + x]
    }

    /// Filled cells as (x, y) offsets from the anchor
    pub fn filled(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, filled)| **filled)
            .map(move |(i, _)| (i % self.width, i / self.width))
    }

    pub fn filled_count(&self) -> usize {
        self.cells.iter().filter(|filled| **filled).count()
    }

    /// The footprint turned by `direction`, anchored at the same top-left corner
    pub fn rotated(&self, direction: RotationDirection) -> Shape {
        let (h, w) = (self.height, self.width);
        let (new_w, new_h) = match direction {
            RotationDirection::Half => (w, h),
            RotationDirection::Clockwise | RotationDirection::Counterclockwise => (h, w),
        };
        let mut cells = vec![false; w * h];
        for (x, y) in self.filled() {
            // (y, x) -> (ny, nx)
            let (ny, nx) = match direction {
                RotationDirection::Clockwise => (x, h - 1 - y),
                RotationDirection::Counterclockwise => (w - 1 - x, y),
                RotationDirection::Half => (h - 1 - y, w - 1 - x),
            };
            cells[ny * new_w + nx] = true;
        }
        Shape {
            width: new_w,
            height: new_h,
            cells,
        }
    }
}

impl std::fmt::Display for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for y in 0..self.height {
            for x in 0..self.width {
                f.write_str(if self.get(x, y) { "#" } else { "." })?;
            }
            if y + 1 < self.height {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

impl PieceKind {
    /// Base footprint of the kind in its spawn orientation
    pub fn footprint(&self) -> Shape {
        match self {
            PieceKind::I => Shape::from_rows(&[
                [0, 0, 0, 0],
                [1, 1, 1, 1],
                [0, 0, 0, 0],
                [0, 0, 0, 0],
            ]),
            PieceKind::J => Shape::from_rows(&[
                [1, 0, 0],
                [1, 1, 1],
                [0, 0, 0],
            ]),
            PieceKind::L => Shape::from_rows(&[
                [0, 0, 1],
                [1, 1, 1],
                [0, 0, 0],
            ]),
            PieceKind::O => Shape::from_rows(&[
                [1, 1],
                [1, 1],
            ]),
            PieceKind::S => Shape::from_rows(&[
                [0, 1, 1],
                [1, 1, 0],
                [0, 0, 0],
            ]),
            PieceKind::T => Shape::from_rows(&[
                [0, 1, 0],
                [1, 1, 1],
                [0, 0, 0],
            ]),
            PieceKind::Z => Shape::from_rows(&[
                [1, 1, 0],
                [0, 1, 1],
                [0, 0, 0],
            ]),
        }
    }
}

/// A piece on the grid: kind, current footprint, rotation counter and anchor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Piece {
    kind: PieceKind,
    shape: Shape,
    // mod 4, display only
    rotation: u8,
    position: Position,
}

impl Piece {
    pub fn new(kind: PieceKind, position: Position) -> Self {
        Self {
            kind,
            shape: kind.footprint(),
            rotation: 0,
            position,
        }
    }

    /// A fresh piece on the top row, horizontally centered in a grid `grid_width` wide
    pub fn spawn(kind: PieceKind, grid_width: usize) -> Self {
        let shape_width = kind.footprint().width();
        let x = (grid_width / 2) as isize - (shape_width / 2) as isize;
        Self::new(kind, Position::new(x, 0))
    }

    pub fn kind(&self) -> PieceKind {
        self.kind
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn rotation(&self) -> u8 {
        self.rotation
    }

    pub fn position(&self) -> Position {
        self.position
    }

    /// Absolute grid coordinates of the filled cells
    pub fn cells(&self) -> impl Iterator<Item = (isize, isize)> + '_ {
        let Position { x, y } = self.position;
        self.shape
            .filled()
            .map(move |(dx, dy)| (x + dx as isize, y + dy as isize))
    }

    pub(crate) fn set_position(&mut self, position: Position) {
        self.position = position;
    }

    /// Commit an already-validated rotation
    pub(crate) fn apply_rotation(&mut self, shape: Shape, direction: RotationDirection) {
        self.shape = shape;
        self.rotation = (self.rotation + direction.quarter_turns()) % 4;
    }
}

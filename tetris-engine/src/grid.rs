//! The playfield: settled cells plus the mask of the falling piece
//!
//! Coordinates are (x, y) with x growing to the right and y growing
//! downwards; row 0 is the spawn row. Cells are stored row-major.

use serde::{Deserialize, Serialize};

use crate::piece::{Piece, Shape};
use crate::types::{Cell, MoveDirection, PieceKind, Position};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
    // Cells currently covered by the falling piece
    active: Vec<bool>,
}

impl Grid {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![None; width * height],
            active: vec![false; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    fn index(&self, x: isize, y: isize) -> Option<usize> {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return None;
        }
        Some(y as usize * self.width + x as usize)
    }

    fn index_of_piece_cell(&self, x: isize, y: isize) -> usize {
        match self.index(x, y) {
            Some(idx) => idx,
            None => panic!(
                "piece cell ({}, {}) outside {}x{} grid",
                x, y, self.width, self.height
            ),
        }
    }

    /// Cell content, or `None` when (x, y) is outside the grid
    pub fn get(&self, x: isize, y: isize) -> Option<Cell> {
        self.index(x, y).map(|idx| self.cells[idx])
    }

    /// Whether (x, y) is covered by the falling piece
    pub fn is_active(&self, x: isize, y: isize) -> bool {
        self.index(x, y).is_some_and(|idx| self.active[idx])
    }

    /// Overwrite a settled cell. Out-of-bounds writes are ignored.
    pub fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            let idx = y * self.width + x;
            self.cells[idx] = cell;
            self.active[idx] = false;
        }
    }

    /// Fill row `y` with `kind`, leaving the listed columns empty
    pub fn fill_row(&mut self, y: usize, kind: PieceKind, holes: &[usize]) {
        for x in 0..self.width {
            let cell = if holes.contains(&x) { None } else { Some(kind) };
            self.set(x, y, cell);
        }
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn active_mask(&self) -> &[bool] {
        &self.active
    }

    /// Number of cells currently marked active
    pub fn active_count(&self) -> usize {
        self.active.iter().filter(|active| **active).count()
    }

    /// Rows from top to bottom
    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> + '_ {
        self.cells.chunks(self.width)
    }

    /// True if `shape` anchored at `position` leaves the grid or overlaps a
    /// settled cell. Cells of the falling piece itself are passable.
    pub fn collides(&self, shape: &Shape, position: Position) -> bool {
        shape.filled().any(|(dx, dy)| {
            match self.index(position.x + dx as isize, position.y + dy as isize) {
                None => true,
                Some(idx) => self.cells[idx].is_some() && !self.active[idx],
            }
        })
    }

    /// Write the piece's cells and mark them active
    pub fn place(&mut self, piece: &Piece) {
        for (x, y) in piece.cells() {
            let idx = self.index_of_piece_cell(x, y);
            self.cells[idx] = Some(piece.kind());
            self.active[idx] = true;
        }
    }

    /// Clear the piece's cells. Must run before the piece is moved or rotated.
    pub fn remove(&mut self, piece: &Piece) {
        for (x, y) in piece.cells() {
            let idx = self.index_of_piece_cell(x, y);
            debug_assert!(self.active[idx], "removing a cell that is not active");
            self.cells[idx] = None;
            self.active[idx] = false;
        }
    }

    /// Turn the falling piece into terrain: clear the active mask, keep the cells
    pub fn settle(&mut self) {
        self.active.fill(false);
    }

    pub fn is_row_full(&self, y: usize) -> bool {
        y < self.height
            && self.cells[y * self.width..(y + 1) * self.width]
                .iter()
                .all(|cell| cell.is_some())
    }

    /// Shift every row above `y` down by one, overwriting row `y`; row 0 becomes empty
    fn collapse_row(&mut self, y: usize) {
        let width = self.width;
        for row in (1..=y).rev() {
            let src = (row - 1) * width;
            self.cells.copy_within(src..src + width, row * width);
        }
        self.cells[..width].fill(None);
    }

    /// Remove all full rows, scanning from the bottom, and return how many were removed
    ///
    /// After a collapse the same row index is examined again, since the row
    /// that slid into it may be full as well.
    pub fn clear_full_rows(&mut self) -> usize {
        debug_assert_eq!(self.active_count(), 0, "clearing rows under an active piece");
        let mut cleared = 0;
        // one past the row under inspection; the top `cleared` rows are empty once collapsed
        let mut y = self.height;
        while y > cleared {
            if self.is_row_full(y - 1) {
                self.collapse_row(y - 1);
                cleared += 1;
            } else {
                y -= 1;
            }
        }
        cleared
    }

    /// Lowest position `shape` reaches by falling straight down from `position`
    pub fn drop_position(&self, shape: &Shape, position: Position) -> Position {
        let mut landing = position;
        loop {
            let below = landing.shifted(MoveDirection::Down);
            if self.collides(shape, below) {
                return landing;
            }
            landing = below;
        }
    }
}

use tetris_engine::{Phase, PieceKind, Snapshot};

#[derive(Clone, PartialEq, Debug)]
pub enum TermCell {
    Empty,
    Block(PieceKind),
    Ghost,
    BorderVertical,
    BorderHorizontal,
    BorderTopLeft,
    BorderTopRight,
    BorderBottomLeft,
    BorderBottomRight,
    Space,
    Message(String),
}

pub trait TermStyle {
    fn display<'a>(&self, cell: &'a TermCell) -> &'a str;
    fn width(&self, cell: &TermCell) -> usize;
}

pub trait TermRender {
    fn output(&self, style: &impl TermStyle) -> Vec<Vec<TermCell>>;
    fn render(&self, style: &impl TermStyle) -> Vec<String> {
        let mut lines = Vec::new();
        for row in self.output(style) {
            let mut line = String::new();
            for cell in &row {
                line.push_str(style.display(cell));
            }
            lines.push(line);
        }
        lines
    }
}

fn block_width(block: &[Vec<TermCell>], style: &impl TermStyle) -> usize {
    block
        .iter()
        .map(|row| row.iter().map(|c| style.width(c)).sum::<usize>())
        .max()
        .unwrap_or(0)
}

// Make all lines in block the same width by padding with TermCell::Space
pub fn pad_block_right(block: &mut [Vec<TermCell>], style: &impl TermStyle) {
    // Requite that the width of TermCell::Space display is 1
    assert_eq!(style.width(&TermCell::Space), 1);
    let width = block_width(block, style);
    for row in block.iter_mut() {
        let line_width: usize = row.iter().map(|c| style.width(c)).sum();
        row.extend(std::iter::repeat_n(TermCell::Space, width - line_width));
    }
}

fn frame_top(cols: usize) -> Vec<TermCell> {
    let mut line = vec![TermCell::BorderTopLeft];
    line.extend(std::iter::repeat_n(TermCell::BorderHorizontal, cols));
    line.push(TermCell::BorderTopRight);
    line
}

fn frame_bottom(cols: usize) -> Vec<TermCell> {
    let mut line = vec![TermCell::BorderBottomLeft];
    line.extend(std::iter::repeat_n(TermCell::BorderHorizontal, cols));
    line.push(TermCell::BorderBottomRight);
    line
}

pub struct PlainTermStyle;

impl TermStyle for PlainTermStyle {
    fn display<'a>(&self, cell: &'a TermCell) -> &'a str {
        match cell {
            TermCell::Empty => "  ",
            TermCell::Block(_) => "[]",
            TermCell::Ghost => "::",
            TermCell::BorderVertical => "|",
            TermCell::BorderTopLeft => "+",
            TermCell::BorderTopRight => "+",
            TermCell::BorderBottomLeft => "+",
            TermCell::BorderHorizontal => "--",
            TermCell::BorderBottomRight => "+",
            TermCell::Space => " ",
            TermCell::Message(s) => s.as_str(),
        }
    }
    fn width(&self, cell: &TermCell) -> usize {
        cell_width(cell)
    }
}

pub struct AnsiTermStyle;

impl TermStyle for AnsiTermStyle {
    fn display<'a>(&self, cell: &'a TermCell) -> &'a str {
        match cell {
            TermCell::Empty => "\x1b[0m  ",
            TermCell::Ghost => "\x1b[0;90m::",
            TermCell::Block(PieceKind::I) => "\x1b[0;36m[]",
            TermCell::Block(PieceKind::J) => "\x1b[0;34m[]",
            TermCell::Block(PieceKind::L) => "\x1b[0;33m[]",
            TermCell::Block(PieceKind::O) => "\x1b[0;93m[]",
            TermCell::Block(PieceKind::S) => "\x1b[0;32m[]",
            TermCell::Block(PieceKind::T) => "\x1b[0;35m[]",
            TermCell::Block(PieceKind::Z) => "\x1b[0;31m[]",
            TermCell::BorderVertical => "\x1b[0m│",
            TermCell::BorderTopLeft => "\x1b[0m┌",
            TermCell::BorderTopRight => "\x1b[0m┐",
            TermCell::BorderBottomLeft => "\x1b[0m└",
            TermCell::BorderHorizontal => "\x1b[0m──",
            TermCell::BorderBottomRight => "\x1b[0m┘",
            TermCell::Space => " ",
            TermCell::Message(s) => s.as_str(),
        }
    }
    fn width(&self, cell: &TermCell) -> usize {
        cell_width(cell)
    }
}

fn cell_width(cell: &TermCell) -> usize {
    match cell {
        TermCell::Empty | TermCell::Block(_) | TermCell::Ghost => 2,
        TermCell::BorderVertical => 1,
        TermCell::BorderHorizontal => 2,
        TermCell::BorderTopLeft
        | TermCell::BorderTopRight
        | TermCell::BorderBottomLeft
        | TermCell::BorderBottomRight => 1,
        TermCell::Space => 1,
        TermCell::Message(s) => s.chars().count(),
    }
}

/// The playfield with its frame, ghost and game-over banner
pub struct WellField<'a> {
    snapshot: &'a Snapshot,
}

impl<'a> WellField<'a> {
    pub fn new(snapshot: &'a Snapshot) -> Self {
        Self { snapshot }
    }

    fn cell(&self, x: usize, y: usize) -> TermCell {
        match self.snapshot.cell(x, y) {
            Some(kind) => TermCell::Block(kind),
            None if self.snapshot.is_ghost(x, y) => TermCell::Ghost,
            None => TermCell::Empty,
        }
    }
}

impl TermRender for WellField<'_> {
    fn output(&self, style: &impl TermStyle) -> Vec<Vec<TermCell>> {
        let mut lines: Vec<Vec<TermCell>> = (0..self.snapshot.height)
            .map(|y| (0..self.snapshot.width).map(|x| self.cell(x, y)).collect())
            .collect();

        if self.snapshot.phase == Phase::GameOver && !lines.is_empty() {
            let inner = self.snapshot.width * style.width(&TermCell::Empty);
            let text = "Game Over";
            let left = inner.saturating_sub(text.len()) / 2;
            let middle = lines.len() / 2;
            lines[middle] = vec![TermCell::Message(format!("{}{}", " ".repeat(left), text))];
            pad_block_right(&mut lines, style);
        }

        for line in &mut lines {
            line.insert(0, TermCell::BorderVertical);
            line.push(TermCell::BorderVertical);
        }
        lines.push(frame_bottom(self.snapshot.width));
        lines
    }
}

/// A boxed single piece, as shown in the hold and next panels
pub struct PiecePanel {
    kind: Option<PieceKind>,
}

impl PiecePanel {
    const COLS: usize = 4;
    const ROWS: usize = 2;

    pub fn new(kind: Option<PieceKind>) -> Self {
        Self { kind }
    }
}

impl TermRender for PiecePanel {
    fn output(&self, _style: &impl TermStyle) -> Vec<Vec<TermCell>> {
        let mut rows = vec![vec![TermCell::Empty; Self::COLS]; Self::ROWS];
        if let Some(kind) = self.kind {
            let shape = kind.footprint();
            let filled_rows = (0..shape.height()).filter(|&y| (0..shape.width()).any(|x| shape.get(x, y)));
            for (row, y) in rows.iter_mut().zip(filled_rows) {
                for x in 0..shape.width().min(Self::COLS) {
                    if shape.get(x, y) {
                        row[x] = TermCell::Block(kind);
                    }
                }
            }
        }

        let mut lines = vec![frame_top(Self::COLS)];
        for mut row in rows {
            row.insert(0, TermCell::BorderVertical);
            row.push(TermCell::BorderVertical);
            lines.push(row);
        }
        lines.push(frame_bottom(Self::COLS));
        lines
    }
}

/// Well on the left, hold/next panels and messages on the right
pub struct GameScreen<'a> {
    well: WellField<'a>,
    hold: PiecePanel,
    next: Vec<PiecePanel>,
    message: Vec<String>,
}

impl<'a> GameScreen<'a> {
    pub fn new(snapshot: &'a Snapshot, message: Vec<String>) -> Self {
        Self {
            well: WellField::new(snapshot),
            hold: PiecePanel::new(snapshot.held),
            next: snapshot
                .preview
                .iter()
                .map(|kind| PiecePanel::new(Some(*kind)))
                .collect(),
            message,
        }
    }
}

impl TermRender for GameScreen<'_> {
    fn output(&self, style: &impl TermStyle) -> Vec<Vec<TermCell>> {
        let mut well_lines = self.well.output(style);
        pad_block_right(&mut well_lines, style);

        let mut side = vec![vec![TermCell::Message("HOLD".to_string())]];
        side.extend(self.hold.output(style));
        if !self.next.is_empty() {
            side.push(vec![TermCell::Message("NEXT".to_string())]);
            for panel in &self.next {
                side.extend(panel.output(style));
            }
        }
        side.push(Vec::new());
        side.extend(
            self.message
                .iter()
                .map(|m| vec![TermCell::Message(m.clone())]),
        );
        pad_block_right(&mut side, style);
        let side_width = block_width(&side, style);
        let well_width = block_width(&well_lines, style);

        let total_lines = well_lines.len().max(side.len());
        let mut lines = Vec::with_capacity(total_lines);
        for i in 0..total_lines {
            let mut line = match well_lines.get(i) {
                Some(row) => row.clone(),
                None => vec![TermCell::Space; well_width],
            };
            line.push(TermCell::Space);
            line.push(TermCell::Space);
            match side.get(i) {
                Some(row) => line.extend(row.iter().cloned()),
                None => line.extend(std::iter::repeat_n(TermCell::Space, side_width)),
            }
            lines.push(line);
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use tetris_engine::{EngineConfig, Game};

    use super::*;

    fn o_game() -> Game {
        let config = EngineConfig::new()
            .with_size(4, 4)
            .with_piece_kinds(vec![PieceKind::O])
            .with_preview_size(1);
        Game::new(config).unwrap()
    }

    #[test]
    fn test_well_shows_piece_and_ghost() {
        let mut game = o_game();
        game.start();
        let snapshot = game.snapshot();
        let lines = WellField::new(&snapshot).render(&PlainTermStyle);
        assert_eq!(
            lines,
            vec![
                "|  [][]  |",
                "|  [][]  |",
                "|  ::::  |",
                "|  ::::  |",
                "+--------+",
            ]
        );
    }

    #[test]
    fn test_well_shows_game_over_banner() {
        let mut game = o_game();
        game.start();
        game.hard_drop();
        game.hard_drop();
        let snapshot = game.snapshot();
        assert!(!snapshot.playing);
        let lines = WellField::new(&snapshot).render(&PlainTermStyle);
        assert_eq!(lines[2], "|Game Over|");
        // The banner widens every row of the well evenly
        let rows = &lines[..lines.len() - 1];
        assert!(rows.iter().all(|l| l.len() == rows[0].len()));
    }

    #[test]
    fn test_piece_panel_trims_empty_rows() {
        let lines = PiecePanel::new(Some(PieceKind::I)).render(&PlainTermStyle);
        assert_eq!(
            lines,
            vec!["+--------+", "|[][][][]|", "|        |", "+--------+"]
        );
        let lines = PiecePanel::new(Some(PieceKind::T)).render(&PlainTermStyle);
        assert_eq!(lines[1], "|  []    |");
        assert_eq!(lines[2], "|[][][]  |");
        let empty = PiecePanel::new(None).render(&PlainTermStyle);
        assert_eq!(empty[1], "|        |");
    }

    #[test]
    fn test_screen_lines_have_equal_width() {
        let mut game = Game::new(EngineConfig::new().with_seed(2)).unwrap();
        game.start();
        let snapshot = game.snapshot();
        let screen = GameScreen::new(&snapshot, vec!["Tetris".to_string(), "2 Combo".to_string()]);
        let lines = screen.render(&PlainTermStyle);
        // HOLD label and panel, NEXT label and four panels, a gap, two messages
        assert_eq!(lines.len(), 1 + 4 + 1 + 4 * 4 + 1 + 2);
        assert!(lines.iter().all(|l| l.len() == lines[0].len()));
        assert!(lines[0].trim_end().ends_with("HOLD"));
        assert!(lines.iter().any(|l| l.contains("2 Combo")));
    }
}

/// Game state machine
///
/// A `Game` owns the grid, the falling piece, the hold slot, the next queue
/// and the timer intent. Every public operation is one atomic transition:
/// it mutates state, re-evaluates grounding and emits events before it
/// returns. Illegal moves and input outside of play are silently ignored.
use super::timers::{TimerFiring, TimerState, Timers};
use super::Phase;
use crate::bag::{Bag, PieceQueue};
use crate::config::{EngineConfig, HoldPolicy, LockMode};
use crate::error::{EngineError, Result};
use crate::events::{EventBus, GameEvent};
use crate::grid::Grid;
use crate::piece::Piece;
use crate::snapshot::Snapshot;
use crate::types::{Command, MoveDirection, PieceKind, Position, RotationDirection};

#[derive(Debug)]
pub struct Game {
    config: EngineConfig,
    grid: Grid,
    current: Option<Piece>,
    ghost: Option<Position>,
    held: Option<PieceKind>,
    queue: PieceQueue,
    phase: Phase,
    b2b_combo: u32,
    /// Hold already used since the last placement
    hold_used: bool,
    /// Lock-delay restarts spent on the current piece
    lock_resets: u32,
    /// `GameOver` has been emitted
    game_over_announced: bool,
    timers: Timers,
    events: EventBus,
}

impl Game {
    /// Build an idle game on an empty grid
    pub fn new(config: EngineConfig) -> Result<Self> {
        let grid = Grid::new(config.width, config.height);
        Self::with_grid(config, grid)
    }

    /// Build an idle game on a prepared grid of settled cells
    pub fn with_grid(config: EngineConfig, grid: Grid) -> Result<Self> {
        if let Err(e) = config.validate() {
            tracing::warn!("Rejecting engine configuration: {}", e);
            return Err(e);
        }
        if grid.width() != config.width || grid.height() != config.height {
            return Err(EngineError::InvalidInitialGrid(format!(
                "grid is {}x{}, configuration expects {}x{}",
                grid.width(),
                grid.height(),
                config.width,
                config.height
            )));
        }
        if grid.active_count() != 0 {
            return Err(EngineError::InvalidInitialGrid(
                "grid has active cells".to_string(),
            ));
        }

        let bag = match config.seed {
            Some(seed) => Bag::seeded(config.piece_kinds.clone(), seed),
            None => Bag::new(config.piece_kinds.clone()),
        };
        let queue = PieceQueue::new(bag, config.preview_size);

        tracing::debug!(
            "Game created: {}x{}, {} piece kinds, preview {}",
            config.width,
            config.height,
            config.piece_kinds.len(),
            config.preview_size
        );

        Ok(Self {
            config,
            grid,
            current: None,
            ghost: None,
            held: None,
            queue,
            phase: Phase::Idle,
            b2b_combo: 0,
            hold_used: false,
            lock_resets: 0,
            game_over_announced: false,
            timers: Timers::default(),
            events: EventBus::new(),
        })
    }

    /// Spawn the first piece. Does nothing once the game has started.
    pub fn start(&mut self) {
        if self.phase != Phase::Idle {
            return;
        }
        tracing::info!("Game started");
        self.phase = Phase::Falling;
        self.spawn_next();
        self.announce_game_over();
    }

    /// Dispatch an inbound command
    pub fn apply(&mut self, command: Command) {
        tracing::debug!("Command {}", command);
        match command {
            Command::MoveLeft => self.move_left(),
            Command::MoveRight => self.move_right(),
            Command::SoftDrop => self.soft_drop(),
            Command::HardDrop => self.hard_drop(),
            Command::RotateClockwise => self.rotate(RotationDirection::Clockwise),
            Command::RotateCounterclockwise => self.rotate(RotationDirection::Counterclockwise),
            Command::Rotate180 => self.rotate(RotationDirection::Half),
            Command::Hold => self.hold(),
        }
    }

    pub fn move_left(&mut self) {
        self.shift(MoveDirection::Left);
    }

    pub fn move_right(&mut self) {
        self.shift(MoveDirection::Right);
    }

    pub fn soft_drop(&mut self) {
        self.shift(MoveDirection::Down);
    }

    /// Drop the piece to its ghost position and place it at once
    pub fn hard_drop(&mut self) {
        if !self.is_playing() {
            return;
        }
        let Some(piece) = self.current.as_ref() else {
            return;
        };
        let landing = self.grid.drop_position(piece.shape(), piece.position());
        if landing != piece.position() {
            self.commit(|piece| piece.set_position(landing));
        }
        self.place();
    }

    /// Rotate in place; rejected without side effects if the result collides
    pub fn rotate(&mut self, direction: RotationDirection) {
        if !self.is_playing() {
            return;
        }
        let Some(piece) = self.current.as_ref() else {
            return;
        };
        let rotated = piece.shape().rotated(direction);
        if self.grid.collides(&rotated, piece.position()) {
            return;
        }
        self.commit(|piece| piece.apply_rotation(rotated, direction));
        self.update_grounding();
    }

    /// Swap the falling piece with the hold slot, or stash it and draw a new one
    pub fn hold(&mut self) {
        if !self.is_playing() {
            return;
        }
        if self.config.hold_policy == HoldPolicy::OncePerPiece && self.hold_used {
            tracing::debug!("Hold already used for this piece");
            return;
        }
        let Some(piece) = self.current.take() else {
            return;
        };
        self.grid.remove(&piece);
        self.ghost = None;

        let next = match self.held.replace(piece.kind()) {
            Some(kind) => kind,
            None => self.queue.next(),
        };
        self.hold_used = true;
        tracing::debug!("Held {}, spawning {}", piece.kind(), next);
        self.events.emit(GameEvent::Held);
        self.spawn(next);
        self.announce_game_over();
    }

    /// One gravity step. Ignored unless gravity is armed.
    pub fn gravity_tick(&mut self) {
        if !self.is_playing() || !self.timers.gravity_armed() {
            return;
        }
        self.shift(MoveDirection::Down);
    }

    /// The lock delay ran out: place the piece if it still rests on terrain
    pub fn lock_expired(&mut self) {
        if !self.is_playing() || !self.timers.lock_pending() {
            return;
        }
        if self.is_grounded() {
            self.place();
        } else {
            self.timers.cancel_lock();
            self.timers.ensure_gravity();
            self.phase = Phase::Falling;
        }
    }

    /// Deliver a timer firing; stale epochs are dropped
    ///
    /// Returns whether the firing was current.
    pub fn fire(&mut self, firing: TimerFiring) -> bool {
        if !self.timers.is_current(firing) {
            tracing::trace!("Dropping stale timer firing {:?}", firing);
            return false;
        }
        match firing {
            TimerFiring::Gravity(_) => self.gravity_tick(),
            TimerFiring::Lock(_) => self.lock_expired(),
        }
        true
    }

    fn shift(&mut self, direction: MoveDirection) {
        if !self.is_playing() {
            return;
        }
        let Some(piece) = self.current.as_ref() else {
            return;
        };
        let target = piece.position().shifted(direction);
        if self.grid.collides(piece.shape(), target) {
            if direction == MoveDirection::Down {
                self.blocked_down();
            }
            return;
        }
        self.commit(|piece| piece.set_position(target));
        self.update_grounding();
    }

    /// Remove the piece, mutate it, and put it back
    fn commit(&mut self, change: impl FnOnce(&mut Piece)) {
        let Some(piece) = self.current.as_mut() else {
            return;
        };
        self.grid.remove(piece);
        change(&mut *piece);
        self.grid.place(piece);
        self.refresh_ghost();
        self.check_invariants();
        self.events.emit(GameEvent::MapUpdated);
    }

    fn blocked_down(&mut self) {
        match self.config.lock_mode {
            LockMode::Immediate => self.place(),
            LockMode::Delayed => {
                if !self.timers.lock_pending() {
                    self.timers.restart_lock();
                }
                self.timers.stop_gravity();
                self.phase = Phase::Locking;
            }
        }
    }

    fn is_grounded(&self) -> bool {
        self.current.as_ref().is_some_and(|piece| {
            self.grid
                .collides(piece.shape(), piece.position().shifted(MoveDirection::Down))
        })
    }

    /// Arm the right timer after a successful move or rotation
    fn update_grounding(&mut self) {
        if self.config.lock_mode == LockMode::Immediate || !self.is_grounded() {
            self.timers.ensure_gravity();
            self.timers.cancel_lock();
            self.phase = Phase::Falling;
            return;
        }

        if !self.timers.lock_pending() {
            self.timers.restart_lock();
        } else if self
            .config
            .lock_reset_limit
            .is_none_or(|limit| self.lock_resets < limit)
        {
            self.lock_resets += 1;
            self.timers.restart_lock();
        }
        self.timers.stop_gravity();
        self.phase = Phase::Locking;
    }

    /// Settle the piece, clear rows, and continue with the next piece
    ///
    /// The next piece is already on the grid when `Placed` goes out; a game
    /// over is announced after the placement events.
    fn place(&mut self) {
        let Some(piece) = self.current.take() else {
            return;
        };
        self.timers.cancel_lock();
        self.grid.settle();
        self.ghost = None;

        let cleared = self.grid.clear_full_rows();
        match cleared {
            0 => {}
            1..=3 => self.b2b_combo = 0,
            _ => self.b2b_combo += 1,
        }
        self.hold_used = false;
        tracing::debug!(
            "Placed {} at {}, cleared {} (combo {})",
            piece.kind(),
            piece.position(),
            cleared,
            self.b2b_combo
        );

        if cleared == 0 && piece.position().y <= 0 {
            self.end_game("piece locked on the top row");
        } else {
            self.spawn_next();
        }

        self.events.emit(GameEvent::MapUpdated);
        self.events.emit(GameEvent::Placed);
        if cleared > 0 {
            self.events.emit(GameEvent::LineCleared {
                count: cleared,
                combo: self.b2b_combo,
            });
        }
        self.announce_game_over();
    }

    fn spawn_next(&mut self) {
        let kind = self.queue.next();
        self.spawn(kind);
    }

    fn spawn(&mut self, kind: PieceKind) {
        let piece = Piece::spawn(kind, self.config.width);
        if self.grid.collides(piece.shape(), piece.position()) {
            self.end_game("spawn position is blocked");
            return;
        }
        self.grid.place(&piece);
        self.current = Some(piece);
        self.lock_resets = 0;
        self.phase = Phase::Falling;
        self.refresh_ghost();
        self.timers.restart_gravity();
        self.timers.cancel_lock();
        self.check_invariants();
        self.events.emit(GameEvent::MapUpdated);
    }

    fn end_game(&mut self, reason: &str) {
        if self.phase == Phase::GameOver {
            return;
        }
        tracing::info!("Game over: {}", reason);
        self.phase = Phase::GameOver;
        self.timers.stop_all();
        self.current = None;
        self.ghost = None;
    }

    /// Emit `GameOver` after the call that ended the game, exactly once
    fn announce_game_over(&mut self) {
        if self.phase == Phase::GameOver && !self.game_over_announced {
            self.game_over_announced = true;
            self.events.emit(GameEvent::GameOver);
        }
    }

    fn refresh_ghost(&mut self) {
        self.ghost = self
            .current
            .as_ref()
            .map(|piece| self.grid.drop_position(piece.shape(), piece.position()));
    }

    fn check_invariants(&self) {
        assert!(
            self.grid
                .active_mask()
                .iter()
                .zip(self.grid.cells())
                .all(|(active, cell)| !*active || cell.is_some()),
            "active cell without content"
        );
        assert_eq!(
            self.grid.active_count(),
            self.current
                .as_ref()
                .map_or(0, |piece| piece.shape().filled_count()),
            "active mask does not match the falling piece"
        );
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn current_piece(&self) -> Option<&Piece> {
        self.current.as_ref()
    }

    pub fn ghost_position(&self) -> Option<Position> {
        self.ghost
    }

    /// Row-major mask of the cells the piece would occupy after a hard drop
    pub fn ghost_mask(&self) -> Vec<bool> {
        let width = self.grid.width();
        let mut mask = vec![false; width * self.grid.height()];
        if let (Some(piece), Some(ghost)) = (self.current.as_ref(), self.ghost) {
            for (dx, dy) in piece.shape().filled() {
                let x = ghost.x + dx as isize;
                let y = ghost.y + dy as isize;
                if x >= 0 && y >= 0 {
                    mask[y as usize * width + x as usize] = true;
                }
            }
        }
        mask
    }

    pub fn held(&self) -> Option<PieceKind> {
        self.held
    }

    /// Upcoming kinds, soonest first
    pub fn preview(&self) -> Vec<PieceKind> {
        self.queue.preview().collect()
    }

    pub fn is_playing(&self) -> bool {
        self.phase.is_playing()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn b2b_combo(&self) -> u32 {
        self.b2b_combo
    }

    pub fn timers(&self) -> TimerState {
        self.timers.state()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            width: self.grid.width(),
            height: self.grid.height(),
            cells: self.grid.cells().to_vec(),
            active: self.grid.active_mask().to_vec(),
            ghost: self.ghost_mask(),
            current: self.current.clone(),
            held: self.held,
            preview: self.preview(),
            playing: self.is_playing(),
            phase: self.phase,
            b2b_combo: self.b2b_combo,
        }
    }

    /// Register a closure called synchronously for every event
    pub fn on_event<F>(&mut self, listener: F)
    where
        F: FnMut(&GameEvent) + Send + 'static,
    {
        self.events.on_event(listener);
    }

    /// Receive every event from now on through a channel
    pub fn subscribe(&mut self) -> flume::Receiver<GameEvent> {
        self.events.subscribe()
    }

    /// Send a free-form diagnostic message to subscribers
    pub fn debug_message(&mut self, text: impl Into<String>) {
        self.events.emit(GameEvent::DebugMessage(text.into()));
    }
}

/// Async runtime owning one game
///
/// A `Session` is the only owner of its `Game`. Commands arrive through a
/// channel and timer deadlines are armed from the engine's timer epochs, so
/// every mutation is serialized through `step()`.
use tokio::time::Instant;

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::events::GameEvent;
use crate::game::{Game, TimerFiring};
use crate::snapshot::Snapshot;
use crate::types::Command;

/// Messages accepted by a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    /// Apply a player command to the game
    Input(Command),
    /// Stop the session's run loop
    Stop,
}

/// Outcome of a single [`Session::step`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepResult {
    /// A command or timer changed the game
    Updated(Snapshot),
    /// Nothing happened within the step timeout
    Timeout,
    /// The game has ended; returned by every step from now on
    GameOver(Snapshot),
    /// The session was stopped
    Stop,
}

/// Cloneable handle for feeding commands into a session
#[derive(Debug, Clone)]
pub struct CommandSender {
    tx: flume::Sender<SessionCommand>,
}

impl CommandSender {
    pub fn send(&self, command: Command) -> Result<()> {
        self.tx
            .send(SessionCommand::Input(command))
            .map_err(|_| EngineError::SessionClosed)
    }

    pub fn stop(&self) -> Result<()> {
        self.tx
            .send(SessionCommand::Stop)
            .map_err(|_| EngineError::SessionClosed)
    }

    /// Whether the session behind this sender is gone
    pub fn is_closed(&self) -> bool {
        self.tx.is_disconnected()
    }
}

pub struct Session {
    game: Game,
    command_tx: flume::Sender<SessionCommand>,
    command_rx: flume::Receiver<SessionCommand>,
    /// Armed gravity deadline and the epoch it belongs to
    gravity_deadline: Option<(u64, Instant)>,
    /// Armed lock deadline and the epoch it belongs to
    lock_deadline: Option<(u64, Instant)>,
    stopped: bool,
}

impl Session {
    /// Build a game from `config` and start it
    pub fn new(config: EngineConfig) -> Result<Self> {
        Ok(Self::from_game(Game::new(config)?))
    }

    /// Take ownership of a prepared game and start it
    pub fn from_game(mut game: Game) -> Self {
        let (command_tx, command_rx) = flume::unbounded();
        game.start();
        let mut session = Self {
            game,
            command_tx,
            command_rx,
            gravity_deadline: None,
            lock_deadline: None,
            stopped: false,
        };
        session.sync_deadlines();
        tracing::info!("Session started");
        session
    }

    /// Get a sender for sending commands to this session
    pub fn sender(&self) -> CommandSender {
        CommandSender {
            tx: self.command_tx.clone(),
        }
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn snapshot(&self) -> Snapshot {
        self.game.snapshot()
    }

    /// Receive every game event from now on
    pub fn subscribe(&mut self) -> flume::Receiver<GameEvent> {
        self.game.subscribe()
    }

    /// Re-arm deadlines from the engine's timer epochs
    ///
    /// A deadline whose epoch is still armed keeps its instant; a new or
    /// restarted epoch gets a fresh one; a stopped timer loses its deadline.
    fn sync_deadlines(&mut self) {
        let now = Instant::now();
        let timers = self.game.timers();
        let config = self.game.config();

        self.gravity_deadline = match timers.gravity {
            Some(epoch) if !config.gravity_interval.is_zero() => match self.gravity_deadline {
                Some((armed, at)) if armed == epoch => Some((armed, at)),
                _ => Some((epoch, now + config.gravity_interval)),
            },
            _ => None,
        };
        self.lock_deadline = match timers.lock {
            Some(epoch) => match self.lock_deadline {
                Some((armed, at)) if armed == epoch => Some((armed, at)),
                _ => Some((epoch, now + config.lock_delay)),
            },
            None => None,
        };
    }

    fn outcome(&self) -> StepResult {
        let snapshot = self.game.snapshot();
        if self.game.is_playing() {
            StepResult::Updated(snapshot)
        } else {
            StepResult::GameOver(snapshot)
        }
    }

    /// Execute one step of the session
    ///
    /// Returns when either:
    /// - A command was applied or a timer fired (returns Updated or GameOver)
    /// - The step timeout elapses (returns Timeout)
    /// - A Stop command is received (returns Stop)
    pub async fn step(&mut self) -> Result<StepResult> {
        if self.stopped {
            return Ok(StepResult::Stop);
        }
        if !self.game.is_playing() {
            return Ok(StepResult::GameOver(self.game.snapshot()));
        }

        let timeout = tokio::time::sleep(self.game.config().step_timeout);
        tokio::pin!(timeout);
        let gravity = self.gravity_deadline;
        let lock = self.lock_deadline;
        let command_rx = self.command_rx.clone();

        let firing = tokio::select! {
            () = &mut timeout => {
                return Ok(StepResult::Timeout);
            }
            result = command_rx.recv_async() => match result {
                // The session holds a sender itself, so this only happens on teardown
                Err(_) => {
                    tracing::info!("Session command channel closed");
                    self.stopped = true;
                    return Ok(StepResult::Stop);
                }
                Ok(SessionCommand::Stop) => {
                    tracing::info!("Session received Stop command, exiting");
                    self.stopped = true;
                    return Ok(StepResult::Stop);
                }
                Ok(SessionCommand::Input(command)) => {
                    self.game.apply(command);
                    None
                }
            },
            epoch = wait_for(gravity) => {
                self.gravity_deadline = None;
                Some(TimerFiring::Gravity(epoch))
            }
            epoch = wait_for(lock) => {
                self.lock_deadline = None;
                Some(TimerFiring::Lock(epoch))
            }
        };

        if let Some(firing) = firing {
            self.game.fire(firing);
        }
        self.sync_deadlines();
        Ok(self.outcome())
    }
}

/// Sleep until the deadline and yield its epoch; never resolves when unarmed
async fn wait_for(deadline: Option<(u64, Instant)>) -> u64 {
    match deadline {
        Some((epoch, at)) => {
            tokio::time::sleep_until(at).await;
            epoch
        }
        None => std::future::pending().await,
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("phase", &self.game.phase())
            .field("gravity_deadline", &self.gravity_deadline)
            .field("lock_deadline", &self.lock_deadline)
            .field("stopped", &self.stopped)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use tokio::time::Duration;

    use super::*;
    use crate::game::Phase;
    use crate::types::{PieceKind, Position};

    fn o_only() -> EngineConfig {
        EngineConfig::new()
            .with_piece_kinds(vec![PieceKind::O])
            .with_seed(1)
    }

    fn position(result: &StepResult) -> Position {
        match result {
            StepResult::Updated(snapshot) => snapshot.current.as_ref().unwrap().position(),
            other => panic!("expected an update, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_commands_applied_in_order() {
        let mut session =
            Session::new(o_only().with_gravity_interval(Duration::ZERO)).unwrap();
        let sender = session.sender();
        sender.send(Command::MoveLeft).unwrap();
        sender.send(Command::MoveLeft).unwrap();
        sender.send(Command::MoveRight).unwrap();

        assert_eq!(position(&session.step().await.unwrap()), Position::new(3, 0));
        assert_eq!(position(&session.step().await.unwrap()), Position::new(2, 0));
        assert_eq!(position(&session.step().await.unwrap()), Position::new(3, 0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_without_gravity() {
        let mut session = Session::new(
            o_only()
                .with_gravity_interval(Duration::ZERO)
                .with_step_timeout(Duration::from_millis(50)),
        )
        .unwrap();
        assert_eq!(session.step().await.unwrap(), StepResult::Timeout);
        assert!(session.game().timers().gravity.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_gravity_fires_on_its_own() {
        let mut session =
            Session::new(o_only().with_gravity_interval(Duration::from_millis(100))).unwrap();
        let started = Instant::now();

        assert_eq!(position(&session.step().await.unwrap()), Position::new(4, 1));
        assert_eq!(position(&session.step().await.unwrap()), Position::new(4, 2));
        assert!(started.elapsed() >= Duration::from_millis(200));
    }

    #[tokio::test(start_paused = true)]
    async fn test_lock_delay_places_then_game_over() {
        let config = o_only()
            .with_size(10, 4)
            .with_gravity_interval(Duration::from_millis(100))
            .with_lock_delay(Duration::from_millis(300));
        let mut session = Session::new(config).unwrap();
        let events = session.subscribe();
        let started = Instant::now();

        let mut placed_at = None;
        let mut last = None;
        for _ in 0..20 {
            let result = session.step().await.unwrap();
            if placed_at.is_none() && events.try_iter().any(|e| e == GameEvent::Placed) {
                placed_at = Some(started.elapsed());
            }
            if let StepResult::GameOver(snapshot) = &result {
                last = Some(snapshot.clone());
                break;
            }
        }

        // Two gravity steps reach the floor, then the lock delay runs out
        assert!(placed_at.unwrap() >= Duration::from_millis(500));
        let snapshot = last.unwrap();
        assert!(!snapshot.playing);
        assert_eq!(snapshot.phase, Phase::GameOver);
        assert_eq!(snapshot.settled_count(), 8);
        assert!(matches!(session.step().await.unwrap(), StepResult::GameOver(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hard_drop_cancels_pending_timers() {
        let config = o_only()
            .with_size(10, 4)
            .with_gravity_interval(Duration::from_millis(100))
            .with_lock_delay(Duration::from_millis(300));
        let mut session = Session::new(config).unwrap();
        let sender = session.sender();

        // Ground the piece, which arms the lock deadline
        sender.send(Command::SoftDrop).unwrap();
        sender.send(Command::SoftDrop).unwrap();
        session.step().await.unwrap();
        session.step().await.unwrap();
        assert!(session.game().timers().lock.is_some());

        sender.send(Command::HardDrop).unwrap();
        session.step().await.unwrap();
        // The old lock deadline must not fire against the new piece
        assert!(session.lock_deadline.is_none());
        assert_eq!(session.snapshot().settled_count(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_ends_session() {
        let mut session = Session::new(o_only()).unwrap();
        let sender = session.sender();
        sender.stop().unwrap();
        assert_eq!(session.step().await.unwrap(), StepResult::Stop);
        assert_eq!(session.step().await.unwrap(), StepResult::Stop);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn test_sender_reports_closed_session() {
        let session = Session::new(o_only()).unwrap();
        let sender = session.sender();
        assert!(!sender.is_closed());
        drop(session);
        assert!(sender.is_closed());
        assert_eq!(sender.send(Command::Hold), Err(EngineError::SessionClosed));
        assert_eq!(sender.stop(), Err(EngineError::SessionClosed));
    }

    #[test]
    fn test_invalid_config_fails_construction() {
        let err = Session::new(EngineConfig::new().with_piece_kinds(vec![])).unwrap_err();
        assert_eq!(err, EngineError::EmptyPieceSet);
    }
}

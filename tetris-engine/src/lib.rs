//! # tetris-engine
//!
//! A falling-block puzzle engine: playfield, piece supply and the rules for
//! movement, rotation, locking and line clearing.
//!
//! ## Overview
//!
//! The [`Game`] state machine owns the grid, the falling piece, the hold slot
//! and the next queue. It never sleeps: gravity and lock delay are recorded
//! as timer epochs, and a driver feeds the firings back. [`Session`] is such
//! a driver, owning one game inside a tokio task and serializing commands and
//! timer firings through [`Session::step`].
//!
//! Rendering and input are left to the caller, who reads [`Snapshot`]s and
//! listens to [`GameEvent`]s.
//!
//! ## Key Features
//!
//! - 7-bag randomizer with a configurable preview, seedable for replays
//! - Rotate-in-place with collision rejection (no wall kicks)
//! - Lock delay with an optional reset cap
//! - Hold slot, ghost projection and back-to-back combo tracking
//!
//! ## Example
//!
//! ```rust,no_run
//! use tetris_engine::{Command, EngineConfig, Session, StepResult};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut session = Session::new(EngineConfig::default().with_seed(7))?;
//!     let sender = session.sender();
//!     sender.send(Command::HardDrop)?;
//!
//!     loop {
//!         match session.step().await? {
//!             StepResult::Updated(snapshot) => println!("combo {}", snapshot.b2b_combo),
//!             StepResult::Timeout => continue,
//!             StepResult::GameOver(_) | StepResult::Stop => break,
//!         }
//!     }
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod bag;
pub mod config;
pub mod error;
pub mod events;
pub mod game;
pub mod grid;
pub mod piece;
pub mod session;
pub mod snapshot;
pub mod types;

// Re-exports for convenience
pub use bag::{Bag, PieceQueue};
pub use config::{EngineConfig, HoldPolicy, LockMode};
pub use error::{EngineError, Result};
pub use events::{EventBus, GameEvent};
pub use game::{Game, Phase, TimerFiring, TimerState};
pub use grid::Grid;
pub use piece::{Piece, Shape};
pub use session::{CommandSender, Session, SessionCommand, StepResult};
pub use snapshot::Snapshot;
pub use types::{Cell, Command, MoveDirection, PieceKind, Position, RotationDirection};

//! Outbound notifications
//!
//! Events are delivered synchronously at the point of mutation to every
//! registered closure listener and every channel subscriber. The engine does
//! not know who is listening.

use serde::{Deserialize, Serialize};

/// Notifications raised by the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    /// Grid contents or the falling piece changed
    MapUpdated,
    /// A placement cleared `count` rows (only sent when `count > 0`)
    LineCleared { count: usize, combo: u32 },
    /// The hold slot was swapped
    Held,
    /// A piece settled, whether or not it cleared rows
    Placed,
    /// The game ended; sent once
    GameOver,
    /// Free-form diagnostic text
    DebugMessage(String),
}

type Listener = Box<dyn FnMut(&GameEvent) + Send>;

/// Fan-out of [`GameEvent`]s to listeners and channel subscribers
#[derive(Default)]
pub struct EventBus {
    listeners: Vec<Listener>,
    subscribers: Vec<flume::Sender<GameEvent>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a closure called for every event
    pub fn on_event<F>(&mut self, listener: F)
    where
        F: FnMut(&GameEvent) + Send + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    /// Open an unbounded channel receiving every event from now on
    ///
    /// Dropping the receiver unsubscribes it on the next emitted event.
    pub fn subscribe(&mut self) -> flume::Receiver<GameEvent> {
        let (tx, rx) = flume::unbounded();
        self.subscribers.push(tx);
        rx
    }

    pub fn emit(&mut self, event: GameEvent) {
        for listener in &mut self.listeners {
            listener(&event);
        }
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Number of registered listeners and live channel subscribers
    pub fn subscriber_count(&self) -> usize {
        self.listeners.len() + self.subscribers.len()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

//! Game events derived from successive payloads, and the bus that fans
//! them out to listeners such as sound or animation.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameEvent {
    GameStarted,
    GameEnded,
    PlayerCrashed,
    PlayerAte,
    PlayerDashed,
    PlayerWalkedWall,
}

impl GameEvent {
    pub const ALL: [GameEvent; 6] = [
        GameEvent::GameStarted,
        GameEvent::GameEnded,
        GameEvent::PlayerCrashed,
        GameEvent::PlayerAte,
        GameEvent::PlayerDashed,
        GameEvent::PlayerWalkedWall,
    ];
}

impl fmt::Display for GameEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            GameEvent::GameStarted => "game started",
            GameEvent::GameEnded => "game ended",
            GameEvent::PlayerCrashed => "player crashed",
            GameEvent::PlayerAte => "player ate",
            GameEvent::PlayerDashed => "player dashed",
            GameEvent::PlayerWalkedWall => "player walked through a wall",
        };
        f.write_str(text)
    }
}

type Listener = Arc<dyn Fn(GameEvent) + Send + Sync>;

/// Listeners per event kind, called in registration order. Cloning yields
/// another handle to the same registrations.
#[derive(Clone, Default)]
pub struct EventBus {
    listeners: Arc<Mutex<HashMap<GameEvent, Vec<Listener>>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn listeners(&self) -> MutexGuard<'_, HashMap<GameEvent, Vec<Listener>>> {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add<F>(&self, event: GameEvent, listener: F)
    where
        F: Fn(GameEvent) + Send + Sync + 'static,
    {
        self.listeners()
            .entry(event)
            .or_default()
            .push(Arc::new(listener));
    }

    /// Calls every listener of `event` and returns how many ran. Listeners
    /// run outside the lock, so they may register further listeners.
    pub fn dispatch(&self, event: GameEvent) -> usize {
        let listeners: Vec<Listener> = self
            .listeners()
            .get(&event)
            .cloned()
            .unwrap_or_default();

        for listener in &listeners {
            listener(event);
        }
        listeners.len()
    }

    pub fn listener_count(&self, event: GameEvent) -> usize {
        self.listeners().get(&event).map_or(0, Vec::len)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: HashMap<GameEvent, usize> = self
            .listeners()
            .iter()
            .map(|(event, listeners)| (*event, listeners.len()))
            .collect();
        f.debug_struct("EventBus")
            .field("listeners", &counts)
            .finish()
    }
}

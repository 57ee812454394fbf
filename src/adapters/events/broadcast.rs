//! In-process fan-out of session events over broadcast channels.
//!
//! Each session gets its own room, a `tokio::sync::broadcast` channel keyed
//! by [`SessionKey`]. WebSocket connections subscribe to the room for the
//! session they are watching; command handlers and the autopilot dispatcher
//! publish into it. A room is created lazily on first subscription and torn
//! down when the session closes.

use std::collections::HashMap;
use std::sync::RwLock;

use tokio::sync::broadcast;

use crate::domain::foundation::SessionKey;
use crate::ports::{SessionEvent, SessionEventPublisher};

/// Fan-out hub mapping each session to a broadcast channel.
///
/// Publishing is fire-and-forget: a session with no subscribers drops the
/// event, and a subscriber that falls more than the channel capacity behind
/// misses the oldest events rather than blocking publishers.
///
/// Uses a std `RwLock` for the room registry since publishes (reads) vastly
/// outnumber subscriptions (writes) and neither holds the lock across an
/// await point.
pub struct BroadcastHub {
    /// Map of session key → broadcast sender for that room.
    rooms: RwLock<HashMap<SessionKey, broadcast::Sender<SessionEvent>>>,

    /// Buffer size for each room's broadcast channel.
    channel_capacity: usize,
}

impl BroadcastHub {
    /// Create a hub with the given per-room channel capacity.
    pub fn new(channel_capacity: usize) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            channel_capacity,
        }
    }

    /// Create with default capacity (128 events per room).
    pub fn with_default_capacity() -> Self {
        Self::new(128)
    }

    /// Subscribe to events for a session.
    ///
    /// The room is created on first subscription, so subscribing before the
    /// session exists is fine; the receiver simply sees events once they
    /// start flowing.
    pub fn subscribe(&self, key: &SessionKey) -> broadcast::Receiver<SessionEvent> {
        let mut rooms = self.rooms.write().expect("event rooms lock poisoned");
        let sender = rooms.entry(key.clone()).or_insert_with(|| {
            let (tx, _) = broadcast::channel(self.channel_capacity);
            tx
        });
        sender.subscribe()
    }

    /// Number of live subscribers for a session (0 if no room exists).
    pub fn subscriber_count(&self, key: &SessionKey) -> usize {
        let rooms = self.rooms.read().expect("event rooms lock poisoned");
        rooms.get(key).map(|s| s.receiver_count()).unwrap_or(0)
    }

    /// Session keys that currently have an open room.
    pub fn active_rooms(&self) -> Vec<SessionKey> {
        let rooms = self.rooms.read().expect("event rooms lock poisoned");
        rooms.keys().cloned().collect()
    }
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

impl SessionEventPublisher for BroadcastHub {
    fn publish(&self, event: SessionEvent) {
        let closing = matches!(event, SessionEvent::SessionClosed { .. });
        let key = event.session().clone();

        {
            let rooms = self.rooms.read().expect("event rooms lock poisoned");
            if let Some(sender) = rooms.get(&key) {
                // No receivers is fine; the event is simply dropped.
                let _ = sender.send(event);
            }
        }

        // Dropping the sender closes every receiver once it drains, so
        // viewers of a closed session see the closure event and then EOF.
        if closing {
            self.rooms
                .write()
                .expect("event rooms lock poisoned")
                .remove(&key);
        }
    }
}

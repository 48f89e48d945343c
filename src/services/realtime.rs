//! Realtime delivery channel
//!
//! The notification dispatcher pushes live updates through this seam. The
//! in-process implementation keeps one unbounded sender per connected user
//! plus a broadcast stream for the "everyone" channel; a transport adapter
//! (e.g. a WebSocket server) registers connections and drains receivers.
//! Emission to an offline or disconnected target is a silent no-op; the
//! persisted notification row is always the source of truth and the live
//! push is purely a latency optimization.

use std::collections::HashMap;
use std::sync::RwLock;

use serde_json::Value;
use tokio::sync::{broadcast, mpsc};
use tracing::debug;

/// A message on its way out to a client
#[derive(Debug, Clone)]
pub struct OutboundMessage {
    pub event: String,
    pub payload: Value,
}

/// Channel abstraction the dispatcher emits through
pub trait RealtimeChannel: Send + Sync {
    /// Push to a single user; no-op when the user is not connected
    fn emit_to_user(&self, user_id: i64, event: &str, payload: Value);

    /// Push one message to every connected client
    fn emit_to_all(&self, event: &str, payload: Value);
}

/// In-process channel implementation
pub struct InProcessChannel {
    connections: RwLock<HashMap<i64, mpsc::UnboundedSender<OutboundMessage>>>,
    broadcast: broadcast::Sender<OutboundMessage>,
}

impl InProcessChannel {
    pub fn new(broadcast_capacity: usize) -> Self {
        let (broadcast, _) = broadcast::channel(broadcast_capacity.max(1));
        Self {
            connections: RwLock::new(HashMap::new()),
            broadcast,
        }
    }

    /// Register a user connection; a reconnect replaces the previous sender
    pub fn register(&self, user_id: i64) -> mpsc::UnboundedReceiver<OutboundMessage> {
        let (tx, rx) = mpsc::unbounded_channel();
        if let Ok(mut connections) = self.connections.write() {
            connections.insert(user_id, tx);
        }
        debug!(user_id = user_id, "Realtime connection registered");
        rx
    }

    /// Drop a user connection
    pub fn unregister(&self, user_id: i64) {
        if let Ok(mut connections) = self.connections.write() {
            connections.remove(&user_id);
        }
        debug!(user_id = user_id, "Realtime connection unregistered");
    }

    /// Subscribe to the "everyone" stream
    pub fn subscribe_all(&self) -> broadcast::Receiver<OutboundMessage> {
        self.broadcast.subscribe()
    }

    /// Number of currently registered user connections
    pub fn connected_count(&self) -> usize {
        self.connections.read().map(|c| c.len()).unwrap_or(0)
    }
}

impl RealtimeChannel for InProcessChannel {
    fn emit_to_user(&self, user_id: i64, event: &str, payload: Value) {
        let message = OutboundMessage {
            event: event.to_string(),
            payload,
        };

        let stale = match self.connections.read() {
            Ok(connections) => match connections.get(&user_id) {
                Some(sender) => sender.send(message).is_err(),
                None => false,
            },
            Err(_) => false,
        };

        // Receiver dropped without unregistering; clean up the entry
        if stale {
            if let Ok(mut connections) = self.connections.write() {
                connections.remove(&user_id);
            }
        }
    }

    fn emit_to_all(&self, event: &str, payload: Value) {
        // A send error only means nobody is subscribed right now
        let _ = self.broadcast.send(OutboundMessage {
            event: event.to_string(),
            payload,
        });
    }
}

/// Channel that drops everything; useful where live delivery is disabled
#[derive(Debug, Clone, Copy, Default)]
pub struct NullChannel;

impl RealtimeChannel for NullChannel {
    fn emit_to_user(&self, _user_id: i64, _event: &str, _payload: Value) {}

    fn emit_to_all(&self, _event: &str, _payload: Value) {}
}

//! Connection registry: client id to live outbound handle.
//!
//! Each WebSocket session registers one [`ClientHandle`]. A handle is the
//! sending half of that session's outbound queue plus the token that stops
//! the session's operations when it goes away.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Outbound side of one client connection.
#[derive(Debug, Clone)]
pub struct ClientHandle {
    sender: mpsc::UnboundedSender<Value>,
    cancel: CancellationToken,
}

impl ClientHandle {
    /// Create a handle and the queue receiver its writer task drains.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Value>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            Self {
                sender,
                cancel: CancellationToken::new(),
            },
            receiver,
        )
    }

    /// Queue a message. Fails once the writer side is gone.
    pub fn send(&self, message: Value) -> Result<(), Value> {
        self.sender.send(message).map_err(|e| e.0)
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    fn same_channel(&self, other: &Self) -> bool {
        self.sender.same_channel(&other.sender)
    }
}

/// Registry of connected clients, shared by every session.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    clients: Mutex<HashMap<String, ClientHandle>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn clients(&self) -> MutexGuard<'_, HashMap<String, ClientHandle>> {
        self.clients.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register `handle` for `client_id`, replacing any previous handle.
    ///
    /// The replaced handle's operations are cancelled.
    pub fn register(&self, client_id: &str, handle: ClientHandle) {
        let previous = self.clients().insert(client_id.to_string(), handle);
        if let Some(previous) = previous {
            previous.cancel.cancel();
            info!(target: "iosrag.ws", client_id = %client_id, "Client re-registered, previous session replaced");
        } else {
            info!(target: "iosrag.ws", client_id = %client_id, "Client registered");
        }
    }

    /// Remove `client_id`. Idempotent.
    pub fn unregister(&self, client_id: &str) {
        if let Some(handle) = self.clients().remove(client_id) {
            handle.cancel.cancel();
            info!(target: "iosrag.ws", client_id = %client_id, "Client unregistered");
        }
    }

    /// Remove `client_id` only while it still maps to `handle`.
    ///
    /// A session ending after it was replaced must not evict its successor.
    pub fn unregister_handle(&self, client_id: &str, handle: &ClientHandle) {
        let mut clients = self.clients();
        if clients.get(client_id).is_some_and(|h| h.same_channel(handle)) {
            clients.remove(client_id);
            drop(clients);
            info!(target: "iosrag.ws", client_id = %client_id, "Client unregistered");
        } else {
            drop(clients);
            debug!(target: "iosrag.ws", client_id = %client_id, "Stale session ended");
        }
        handle.cancel.cancel();
    }

    pub fn lookup(&self, client_id: &str) -> Option<ClientHandle> {
        self.clients().get(client_id).cloned()
    }

    pub fn count(&self) -> usize {
        self.clients().len()
    }

    /// Registered ids, sorted.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.clients().keys().cloned().collect();
        ids.sort();
        ids
    }
}

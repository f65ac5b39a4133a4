//! Progress emitter: fire-and-forget delivery of outbound messages.
//!
//! Messages are stamped with an RFC 3339 `timestamp` when they carry none,
//! then queued on the client's outbound FIFO. A failed write unregisters the
//! client and is never reported to the caller; there is no retry.

use std::sync::Arc;

use chrono::Utc;
use iosrag_core::{ProgressSink, ServerEvent};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::registry::ConnectionRegistry;

fn stamp(message: &mut Value) {
    if let Value::Object(map) = message {
        map.entry("timestamp")
            .or_insert_with(|| Value::String(Utc::now().to_rfc3339()));
    }
}

/// Sends messages to registered clients.
#[derive(Debug, Clone)]
pub struct Emitter {
    registry: Arc<ConnectionRegistry>,
}

impl Emitter {
    pub const fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// Stamp and queue a raw JSON message for `client_id`.
    pub fn send_value(&self, client_id: &str, mut message: Value) {
        let Some(handle) = self.registry.lookup(client_id) else {
            debug!(target: "iosrag.ws", client_id = %client_id, "Dropping message for unknown client");
            return;
        };
        stamp(&mut message);
        if handle.send(message).is_err() {
            debug!(target: "iosrag.ws", client_id = %client_id, "Write failed, unregistering client");
            self.registry.unregister_handle(client_id, &handle);
        }
    }

    pub fn send(&self, client_id: &str, event: &ServerEvent) {
        match event.to_json() {
            Ok(message) => self.send_value(client_id, message),
            Err(e) => warn!(
                target: "iosrag.ws",
                client_id = %client_id,
                message_type = event.message_type(),
                error = %e,
                "Failed to serialize outbound message"
            ),
        }
    }

    pub fn send_error(&self, client_id: &str, message: impl Into<String>) {
        self.send(client_id, &ServerEvent::error(message));
    }

    /// Send `event` to every registered client.
    pub fn broadcast(&self, event: &ServerEvent) {
        for client_id in self.registry.ids() {
            self.send(&client_id, event);
        }
    }

    /// A [`ProgressSink`] bound to one client.
    pub fn sink(&self, client_id: impl Into<String>) -> ClientSink {
        ClientSink {
            emitter: self.clone(),
            client_id: client_id.into(),
            cancel: None,
        }
    }
}

/// Progress sink that forwards every event to one client.
#[derive(Debug, Clone)]
pub struct ClientSink {
    emitter: Emitter,
    client_id: String,
    cancel: Option<CancellationToken>,
}

impl ClientSink {
    /// Tie the sink to one connection. Once `cancel` fires, events are
    /// dropped instead of reaching a newer connection under the same id.
    #[must_use]
    pub fn bound_to(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn is_detached(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled)
    }
}

impl ProgressSink for ClientSink {
    fn emit(&self, event: ServerEvent) {
        if self.is_detached() {
            debug!(
                target: "iosrag.ws",
                client_id = %self.client_id,
                message_type = event.message_type(),
                "Dropping message for a replaced connection"
            );
            return;
        }
        self.emitter.send(&self.client_id, &event);
    }
}

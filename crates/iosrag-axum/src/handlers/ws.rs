//! WebSocket upgrade handler for the per-client message channel.
//!
//! `GET /ws/{client_id}` upgrades to a WebSocket carrying JSON text frames.
//!
//! ## Protocol
//!
//! | Direction | Frame | Content |
//! |---|---|---|
//! | Client → Server | Text | `{"action": "...", "data": {...}}` |
//! | Server → Client | Text | `{"type": "...", "timestamp": "...", ...}` |
//!
//! Binary frames from the client are ignored.
//!
//! ## Lifecycle
//!
//! 1. The session registers a [`ClientHandle`] under `client_id`, replacing
//!    (and cancelling) any earlier session with the same id.
//! 2. Three parts run concurrently:
//!    * **Reader** - queues inbound text frames.
//!    * **Worker** - decodes and dispatches queued frames one at a time, in
//!      arrival order, awaiting each before the next.
//!    * **Writer** - drains the handle's outbound queue into the socket.
//! 3. When the socket closes the session is unregistered, which fires the
//!    cancellation token so in-flight operations stop at their next check.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::dispatch::Session;
use crate::registry::ClientHandle;
use crate::state::AppState;

/// `GET /ws/{client_id}` - WebSocket upgrade endpoint.
pub async fn connect(
    ws: WebSocketUpgrade,
    Path(client_id): Path<String>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| run_session(socket, client_id, state))
}

async fn run_session(socket: WebSocket, client_id: String, state: AppState) {
    let (handle, mut outbound) = ClientHandle::channel();
    let cancel = handle.cancel_token();
    state.registry.register(&client_id, handle.clone());
    info!(target: "iosrag.ws", client_id = %client_id, "Client connected");

    let (mut ws_sender, mut ws_receiver) = socket.split();

    // ── Writer: outbound queue → text frames ─────────────────────────────
    let writer_cancel = cancel.clone();
    let writer_id = client_id.clone();
    let writer = tokio::spawn(async move {
        loop {
            let message = tokio::select! {
                () = writer_cancel.cancelled() => break,
                message = outbound.recv() => message,
            };
            let Some(message) = message else { break };
            if ws_sender
                .send(Message::Text(message.to_string().into()))
                .await
                .is_err()
            {
                debug!(target: "iosrag.ws", client_id = %writer_id, "Socket write failed");
                break;
            }
        }
        // Best effort; the peer may already be gone.
        let _ = ws_sender.close().await;
    });

    // ── Worker: sequential dispatch in arrival order ────────────────────
    let (inbound_tx, mut inbound_rx) = mpsc::unbounded_channel::<String>();
    let session = Session::new(&state.emitter, client_id.clone(), cancel.clone());
    let worker_state = state.clone();
    let worker_cancel = cancel.clone();
    let worker = tokio::spawn(async move {
        while let Some(text) = inbound_rx.recv().await {
            if worker_cancel.is_cancelled() {
                break;
            }
            worker_state.router.handle_text(&session, &text).await;
        }
    });

    // ── Reader: socket frames → inbound queue ───────────────────────────
    loop {
        let frame = tokio::select! {
            () = cancel.cancelled() => break,
            frame = ws_receiver.next() => frame,
        };
        match frame {
            Some(Ok(Message::Text(text))) => {
                if inbound_tx.send(text.as_str().to_owned()).is_err() {
                    break;
                }
            }
            Some(Ok(Message::Binary(data))) => {
                debug!(target: "iosrag.ws", client_id = %client_id, bytes = data.len(), "Ignoring binary frame");
            }
            Some(Ok(Message::Close(_))) | None => break,
            // Ping/pong are answered by the transport.
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                debug!(target: "iosrag.ws", client_id = %client_id, error = %e, "Socket read failed");
                break;
            }
        }
    }

    state.registry.unregister_handle(&client_id, &handle);
    drop(inbound_tx);
    drop(handle);
    let _ = worker.await;
    let _ = writer.await;
    info!(target: "iosrag.ws", client_id = %client_id, "Client disconnected");
}

//! Shared helpers for iosrag-axum integration tests.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, Response};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::sync::mpsc::UnboundedReceiver;

use iosrag_axum::{AxumContext, ClientHandle, ServerConfig, Session, bootstrap};

/// A bootstrapped context over a throwaway data directory, without pacing.
pub struct TestApp {
    pub ctx: AxumContext,
    pub dir: TempDir,
}

pub async fn test_app() -> TestApp {
    let dir = tempfile::tempdir().expect("temp dir");
    let config = ServerConfig::with_data_dir(dir.path()).with_pacing_ms(0);
    let ctx = bootstrap(&config).await.expect("bootstrap");
    TestApp { ctx, dir }
}

/// An in-memory client: a registered handle plus the queue it writes to.
pub struct TestClient {
    pub session: Session,
    pub rx: UnboundedReceiver<Value>,
}

impl TestClient {
    pub fn connect(ctx: &AxumContext, client_id: &str) -> Self {
        let (handle, rx) = ClientHandle::channel();
        let session = Session::new(&ctx.emitter, client_id, handle.cancel_token());
        ctx.registry.register(client_id, handle);
        Self { session, rx }
    }

    /// Send one envelope and wait for its handling to finish.
    pub async fn send(&self, ctx: &AxumContext, action: &str, data: Value) {
        let text = json!({ "action": action, "data": data }).to_string();
        ctx.router.handle_text(&self.session, &text).await;
    }

    pub async fn send_raw(&self, ctx: &AxumContext, text: &str) {
        ctx.router.handle_text(&self.session, text).await;
    }

    /// Everything queued so far.
    pub fn drain(&mut self) -> Vec<Value> {
        let mut messages = Vec::new();
        while let Ok(message) = self.rx.try_recv() {
            messages.push(message);
        }
        messages
    }
}

pub fn types(messages: &[Value]) -> Vec<&str> {
    messages
        .iter()
        .map(|m| m["type"].as_str().unwrap_or_default())
        .collect()
}

/// Messages that carry an operation snapshot.
pub fn updates(messages: &[Value]) -> Vec<&Value> {
    messages
        .iter()
        .filter(|m| m.get("operation_id").is_some())
        .collect()
}

pub fn terminal_count(messages: &[Value]) -> usize {
    updates(messages)
        .iter()
        .filter(|m| m["status"] == "completed" || m["status"] == "error")
        .count()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).expect("request")
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("json body")
}

//! Axum web adapter for iosrag.
//!
//! Serves the per-client WebSocket channel at `/ws/{client_id}` and a few
//! read-only REST endpoints. [`bootstrap`] is the composition root.
#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

// Dev-dependencies used only by the integration tests
#[cfg(test)]
use http_body_util as _;
#[cfg(test)]
use tokio_test as _;
#[cfg(test)]
use tower as _;

// Used by main.rs binary
use dotenvy as _;
use tracing_subscriber as _;

pub mod bootstrap;
pub mod config;
pub mod dispatch;
pub mod emitter;
pub mod error;
pub mod handlers;
pub mod registry;
pub mod routes;
pub mod state;

// Re-export primary types
pub use bootstrap::{AxumContext, bootstrap, start_server};
pub use config::{CorsConfig, DEFAULT_LOG_FILTER, ServerConfig};
pub use dispatch::{Action, Envelope, INVALID_JSON_MESSAGE, RequestRouter, Session};
pub use emitter::{ClientSink, Emitter};
pub use error::HttpError;
pub use registry::{ClientHandle, ConnectionRegistry};
pub use routes::create_router;
pub use state::AppState;

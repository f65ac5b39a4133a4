//! HTTP and WebSocket handlers.
//!
//! Handlers are thin: they extract inputs, call the core facade and map
//! errors to [`HttpError`](crate::error::HttpError).

pub mod documents;
pub mod system;
pub mod ws;

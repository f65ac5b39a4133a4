//! Progress sink trait: where operations publish their messages.
//!
//! The operation runner and one-shot services only ever see this trait. The
//! web adapter binds an implementation to one client connection.

use crate::events::ServerEvent;

/// Destination for outbound messages of one client.
///
/// `emit` must not block and must never fail towards the caller: delivery
/// problems are the implementation's concern.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: ServerEvent);
}

/// A sink that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl NoopSink {
    pub const fn new() -> Self {
        Self
    }
}

impl ProgressSink for NoopSink {
    fn emit(&self, _event: ServerEvent) {}
}

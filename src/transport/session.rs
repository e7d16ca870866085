//! Command channel abstraction.
//!
//! The frame manager never talks to a socket directly. It issues commands
//! through [`Session`] and receives events from an ordered queue, so any
//! transport (the bundled WebSocket [`Connection`](super::Connection), a pipe,
//! or a scripted test double) can drive it.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::error::Result;
use crate::identifiers::SessionId;
use crate::protocol::{Command, Event};

// ============================================================================
// Types
// ============================================================================

/// Ordered stream of events from the remote end.
pub type EventStream = mpsc::UnboundedReceiver<Event>;

/// Shared handle to a command channel.
pub type SharedSession = Arc<dyn Session>;

// ============================================================================
// Session
// ============================================================================

/// Sends typed commands and returns their results.
///
/// Events are not delivered through this trait; the transport hands an
/// [`EventStream`] to the caller, which preserves the order in which the
/// remote end emitted them.
#[async_trait]
pub trait Session: Send + Sync {
    /// Sends a command on the given session and waits for its result.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`](crate::Error::Protocol) when the remote end
    /// rejects the command, or a connection error when the channel is gone.
    async fn send(&self, session_id: &SessionId, command: Command) -> Result<Value>;
}

//! Transport layer.
//!
//! This module defines the command channel the frame manager consumes and a
//! WebSocket implementation of it.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐   commands (Session)   ┌──────────────────┐
//! │  FrameManager    │───────────────────────►│  Browser         │
//! │                  │                        │  (remote end)    │
//! │  dispatch loop   │◄───────────────────────│                  │
//! └──────────────────┘   EventStream (mpsc)   └──────────────────┘
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `session` | [`Session`] trait and stream aliases |
//! | `connection` | WebSocket connection and event loop |

// ============================================================================
// Submodules
// ============================================================================

/// WebSocket connection and event loop.
pub mod connection;

/// Command channel abstraction.
pub mod session;

// ============================================================================
// Re-exports
// ============================================================================

pub use connection::Connection;
pub use session::{EventStream, Session, SharedSession};

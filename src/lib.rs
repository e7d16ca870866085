//! Frame Mirror - client-side frame tree for browser remote-control sessions.
//!
//! This library keeps a live mirror of a page's frames on top of a
//! DevTools-style protocol session and builds navigation and script
//! evaluation on that mirror.
//!
//! # Architecture
//!
//! - **Transport**: [`Connection`] multiplexes commands and events over a
//!   WebSocket; anything implementing [`Session`] can stand in for it
//! - **Mirror**: [`FrameManager`] applies `Page.*` and `Runtime.*` events, in
//!   arrival order, to a [`FrameTree`]
//! - **Worlds**: every frame has a main and a utility [`IsolatedWorld`];
//!   evaluation waits for the world's [`ExecutionContext`]
//! - **Lifecycle**: navigation waits are [`NavigationWatcher`]s re-checked
//!   after every event
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use frame_mirror::{Connection, FrameManager, GotoOptions, ManagerOptions, Result, WaitUntil};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let (connection, events) = Connection::connect("ws://127.0.0.1:9222/devtools/page/1").await?;
//!     let manager = FrameManager::new(Arc::new(connection), ManagerOptions::new());
//!     manager.run(events);
//!     manager.initialize().await?;
//!
//!     let frame = manager.main_frame().expect("page has a main frame");
//!     let options = GotoOptions::new().with_wait_until([WaitUntil::NetworkIdle0]);
//!     let response = frame.goto("https://example.com", options).await?;
//!     println!("status: {:?}", response.map(|r| r.status));
//!     println!("title: {}", frame.title().await?);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`frame`] | Frames, worlds, lifecycle watchers, navigation |
//! | [`network`] | Network observer seam and default bookkeeping |
//! | [`options`] | Manager options and timeout settings |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`protocol`] | Command, response and event types (internal) |
//! | [`transport`] | WebSocket connection and session seam |

// ============================================================================
// Modules
// ============================================================================

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Frame mirror.
///
/// - [`Frame`] - handle to one mirrored frame
/// - [`FrameManager`] - event dispatch and frame registry
/// - [`IsolatedWorld`] - per-frame script world
pub mod frame;

/// Type-safe identifiers for protocol entities.
///
/// Newtype wrappers prevent mixing incompatible IDs at compile time.
pub mod identifiers;

/// Network observer seam.
pub mod network;

/// Manager configuration.
pub mod options;

/// Protocol message types.
///
/// Internal module defining command/response/event structures.
pub mod protocol;

/// Transport layer.
///
/// WebSocket connection and the [`Session`] trait the manager sends through.
pub mod transport;

#[cfg(test)]
mod testing;

// ============================================================================
// Re-exports
// ============================================================================

// Frame types
pub use frame::{
    EvalArg, ExecutionContext, Frame, FrameManager, GotoOptions, IsolatedWorld, JsHandle,
    NavigationWatcher, RemoteObject, ScriptTagOptions, StyleTagOptions, WaitForNavigationOptions,
    WaitMode, WaitUntil, WorldKind,
};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{
    ExecutionContextId, FrameId, LoaderId, NetworkRequestId, RemoteObjectId, RequestId, SessionId,
};

// Network types
pub use network::{HttpResponse, NetError, NetworkManager, NetworkObserver};

// Option types
pub use options::{ManagerOptions, TimeoutSettings};

// Transport types
pub use transport::{Connection, EventStream, Session, SharedSession};

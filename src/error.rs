//! Error types for frame-mirror.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use frame_mirror::{Error, Result};
//!
//! async fn example(frame: &Frame) -> Result<()> {
//!     match frame.goto("https://example.com", Default::default()).await {
//!         Err(Error::NavigationTimeout { timeout_ms }) => { /* retry? */ }
//!         other => { other?; }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Navigation | [`Error::NavigationTimeout`], [`Error::NavigationTermination`], [`Error::NavigationError`] |
//! | Execution | [`Error::ContextUnavailable`], [`Error::ScriptError`] |
//! | Arguments | [`Error::InvalidArgument`], [`Error::FrameNotFound`] |
//! | Session | [`Error::Protocol`], [`Error::RequestTimeout`], [`Error::Connection`], [`Error::ConnectionClosed`] |
//! | External | [`Error::Io`], [`Error::Json`], [`Error::WebSocket`], [`Error::ChannelClosed`] |
//!
//! A non-OK HTTP status is never an error here: the navigation resolves and
//! the returned [`HttpResponse`](crate::network::HttpResponse) carries the
//! status.

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use thiserror::Error;
use tokio::sync::oneshot::error::RecvError;
use tokio_tungstenite::tungstenite::Error as WsError;

use crate::frame::WorldKind;
use crate::identifiers::{FrameId, RequestId};

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Navigation Errors
    // ========================================================================
    /// Navigation deadline elapsed while the watcher was still pending.
    #[error("Navigation timeout of {timeout_ms}ms exceeded")]
    NavigationTimeout {
        /// Configured timeout in milliseconds.
        timeout_ms: u64,
    },

    /// Target frame went away mid-navigation.
    #[error("Navigating frame {frame_id} was {reason}")]
    NavigationTermination {
        /// Frame being navigated.
        frame_id: FrameId,
        /// What happened to the frame ("detached", "swapped").
        reason: String,
    },

    /// Remote navigate command reported a failure.
    #[error("Navigation to {url} failed: {message}")]
    NavigationError {
        /// Requested URL.
        url: String,
        /// Remote error text.
        message: String,
    },

    // ========================================================================
    // Execution Errors
    // ========================================================================
    /// No execution context can be obtained for a world.
    ///
    /// Returned when the owning frame is detached or the manager is gone.
    #[error("Execution context unavailable: frame={frame_id}, world={world}")]
    ContextUnavailable {
        /// Owning frame.
        frame_id: FrameId,
        /// World the context was requested for.
        world: WorldKind,
    },

    /// Remote evaluation threw.
    #[error("Script error: {message}")]
    ScriptError {
        /// Exception description from the remote side.
        message: String,
    },

    // ========================================================================
    // Argument Errors
    // ========================================================================
    /// Invalid argument.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of the invalid argument.
        message: String,
    },

    /// Frame is not in the frame tree.
    #[error("Frame not found: {frame_id}")]
    FrameNotFound {
        /// The missing frame ID.
        frame_id: FrameId,
    },

    // ========================================================================
    // Session Errors
    // ========================================================================
    /// Protocol violation or remote command error.
    #[error("Protocol error: {message}")]
    Protocol {
        /// Description of the protocol error.
        message: String,
    },

    /// Command response did not arrive in time.
    #[error("Request {request_id} timed out after {timeout_ms}ms")]
    RequestTimeout {
        /// The request ID that timed out.
        request_id: RequestId,
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// Connection to the remote end failed.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// Connection closed unexpectedly.
    #[error("Connection closed")]
    ConnectionClosed,

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),

    /// Channel receive error.
    #[error("Channel closed")]
    ChannelClosed(#[from] RecvError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a navigation timeout error.
    #[inline]
    pub fn navigation_timeout(timeout_ms: u64) -> Self {
        Self::NavigationTimeout { timeout_ms }
    }

    /// Creates a navigation termination error.
    #[inline]
    pub fn navigation_termination(frame_id: FrameId, reason: impl Into<String>) -> Self {
        Self::NavigationTermination {
            frame_id,
            reason: reason.into(),
        }
    }

    /// Creates a navigation error.
    #[inline]
    pub fn navigation_error(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::NavigationError {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Creates a context unavailable error.
    #[inline]
    pub fn context_unavailable(frame_id: FrameId, world: WorldKind) -> Self {
        Self::ContextUnavailable { frame_id, world }
    }

    /// Creates a script error.
    #[inline]
    pub fn script_error(message: impl Into<String>) -> Self {
        Self::ScriptError {
            message: message.into(),
        }
    }

    /// Creates an invalid argument error.
    #[inline]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates a frame not found error.
    #[inline]
    pub fn frame_not_found(frame_id: FrameId) -> Self {
        Self::FrameNotFound { frame_id }
    }

    /// Creates a protocol error.
    #[inline]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Creates a request timeout error.
    #[inline]
    pub fn request_timeout(request_id: RequestId, timeout_ms: u64) -> Self {
        Self::RequestTimeout {
            request_id,
            timeout_ms,
        }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::NavigationTimeout { .. } | Self::RequestTimeout { .. }
        )
    }

    /// Returns `true` if this error ended a navigation call.
    #[inline]
    #[must_use]
    pub fn is_navigation_error(&self) -> bool {
        matches!(
            self,
            Self::NavigationTimeout { .. }
                | Self::NavigationTermination { .. }
                | Self::NavigationError { .. }
        )
    }

    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. } | Self::ConnectionClosed | Self::WebSocket(_)
        )
    }

    /// Returns `true` if this error is recoverable.
    ///
    /// Recoverable errors may succeed if the caller retries. Nothing in this
    /// crate retries on its own.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::NavigationTimeout { .. }
                | Self::RequestTimeout { .. }
                | Self::ContextUnavailable { .. }
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

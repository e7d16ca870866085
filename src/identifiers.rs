//! Type-safe identifier wrappers.
//!
//! Newtypes prevent mixing incompatible IDs at compile time. Remote-assigned
//! identifiers are opaque strings (frames, loaders, sessions, remote objects)
//! or integers (execution contexts); only [`RequestId`] is generated locally.
//!
//! | Type | Assigned by | Wire form |
//! |------|-------------|-----------|
//! | [`FrameId`] | remote | string |
//! | [`LoaderId`] | remote | string |
//! | [`SessionId`] | remote | string (empty = top-level session) |
//! | [`ExecutionContextId`] | remote | integer, unique per session |
//! | [`RemoteObjectId`] | remote | string |
//! | [`NetworkRequestId`] | remote | string |
//! | [`RequestId`] | local | UUID |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// String Identifiers
// ============================================================================

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates an identifier from its wire value.
            #[inline]
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Returns the wire value.
            #[inline]
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            #[inline]
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            #[inline]
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(
    /// Remote frame identifier. Stable for the lifetime of the frame.
    FrameId
);

string_id!(
    /// Identifies one document load of a frame.
    ///
    /// A new loader ID is announced by the `init` lifecycle event whenever the
    /// frame starts loading a new document. Same-document navigations keep it.
    LoaderId
);

string_id!(
    /// Protocol session serving a frame.
    ///
    /// The empty ID denotes the top-level session; out-of-process frames are
    /// served by a dedicated session with a non-empty ID.
    SessionId
);

string_id!(
    /// Handle to an object living in a remote execution context.
    RemoteObjectId
);

string_id!(
    /// Remote network request identifier.
    NetworkRequestId
);

impl SessionId {
    /// Returns the top-level session ID.
    #[inline]
    #[must_use]
    pub fn root() -> Self {
        Self(String::new())
    }

    /// Returns `true` for the top-level session.
    #[inline]
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

// ============================================================================
// ExecutionContextId
// ============================================================================

/// Remote execution context identifier.
///
/// Unique only within the session that created it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ExecutionContextId(i64);

impl ExecutionContextId {
    /// Creates a context ID from its wire value.
    #[inline]
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the wire value.
    #[inline]
    #[must_use]
    pub const fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for ExecutionContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// RequestId
// ============================================================================

/// Correlates a command request with its response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Generates a fresh random request ID.
    #[inline]
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    #[inline]
    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Tests
// ============================================================================

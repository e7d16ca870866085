//! Frame manager configuration.
//!
//! Provides a type-safe interface for configuring the frame manager and the
//! ambient timeouts navigation calls fall back to.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use frame_mirror::{ManagerOptions, TimeoutSettings};
//!
//! let timeouts = TimeoutSettings::new();
//! timeouts.set_default_navigation_timeout(Duration::from_secs(10));
//!
//! let options = ManagerOptions::new()
//!     .with_utility_world_name("__helpers__")
//!     .with_timeouts(timeouts);
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

// ============================================================================
// Constants
// ============================================================================

/// Timeout used when neither a navigation nor a default timeout is set.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Name of the private world used for internal evaluation.
pub const UTILITY_WORLD_NAME: &str = "__frame_mirror_utility__";

// ============================================================================
// TimeoutSettings
// ============================================================================

/// Ambient timeouts, shared and adjustable at runtime.
///
/// Clones share the same values, so a setting changed through one handle is
/// seen by every frame of the manager.
#[derive(Debug, Clone, Default)]
pub struct TimeoutSettings {
    inner: Arc<Mutex<TimeoutValues>>,
}

#[derive(Debug, Default)]
struct TimeoutValues {
    default_timeout: Option<Duration>,
    navigation_timeout: Option<Duration>,
}

impl TimeoutSettings {
    /// Creates settings with no overrides.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the timeout used by every waiting operation.
    pub fn set_default_timeout(&self, timeout: Duration) {
        self.inner.lock().default_timeout = Some(timeout);
    }

    /// Sets the timeout used by navigation calls.
    ///
    /// Takes precedence over [`set_default_timeout`](Self::set_default_timeout).
    pub fn set_default_navigation_timeout(&self, timeout: Duration) {
        self.inner.lock().navigation_timeout = Some(timeout);
    }

    /// Returns the general timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.inner.lock().default_timeout.unwrap_or(DEFAULT_TIMEOUT)
    }

    /// Returns the navigation timeout.
    ///
    /// Resolution order: navigation timeout, default timeout, 30 seconds.
    /// A zero duration disables the deadline.
    #[must_use]
    pub fn navigation_timeout(&self) -> Duration {
        let values = self.inner.lock();
        values
            .navigation_timeout
            .or(values.default_timeout)
            .unwrap_or(DEFAULT_TIMEOUT)
    }
}

// ============================================================================
// ManagerOptions
// ============================================================================

/// Frame manager configuration.
#[derive(Debug, Clone)]
pub struct ManagerOptions {
    /// Name of the isolated world created in every frame.
    pub utility_world_name: String,

    /// Ask the remote end to emit `Page.lifecycleEvent` notifications.
    pub lifecycle_events: bool,

    /// Ambient timeouts.
    pub timeouts: TimeoutSettings,
}

impl Default for ManagerOptions {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl ManagerOptions {
    /// Creates options with default settings.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            utility_world_name: UTILITY_WORLD_NAME.to_string(),
            lifecycle_events: true,
            timeouts: TimeoutSettings::new(),
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl ManagerOptions {
    /// Sets the utility world name.
    #[inline]
    #[must_use]
    pub fn with_utility_world_name(mut self, name: impl Into<String>) -> Self {
        self.utility_world_name = name.into();
        self
    }

    /// Disables lifecycle event notifications.
    ///
    /// Navigation then only completes through `Page.frameStoppedLoading`.
    #[inline]
    #[must_use]
    pub fn without_lifecycle_events(mut self) -> Self {
        self.lifecycle_events = false;
        self
    }

    /// Shares an existing set of timeouts.
    #[inline]
    #[must_use]
    pub fn with_timeouts(mut self, timeouts: TimeoutSettings) -> Self {
        self.timeouts = timeouts;
        self
    }
}

// ============================================================================
// Tests
// ============================================================================

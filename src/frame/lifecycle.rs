//! Navigation completion tracking.
//!
//! [`LifecycleWatcher`] is a pure state machine: it captures a baseline of the
//! target frame when created and is re-checked against the frame tree after
//! every processed event. The frame manager owns the registry of live
//! watchers and publishes their [`WatchStatus`] to waiting callers.
//!
//! # Completion paths
//!
//! | Path | Condition | Result |
//! |------|-----------|--------|
//! | Same document | fragment/history navigation while the loader is unchanged | `None` |
//! | New document | loader changed and every milestone reached (children included) | response for the new loader |
//! | Lifecycle | milestones reached for the current document | `None` |
//! | Termination | frame detached or swapped | error |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use tracing::trace;

use crate::error::{Error, Result};
use crate::identifiers::{FrameId, LoaderId};
use crate::network::{HttpResponse, NetworkObserver};

use super::state::FrameState;
use super::tree::FrameTree;

// ============================================================================
// WaitUntil
// ============================================================================

/// Milestone a navigation waits for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WaitUntil {
    /// The `load` event fired.
    Load,
    /// The `DOMContentLoaded` event fired.
    DomContentLoaded,
    /// No network requests in flight.
    NetworkIdle0,
    /// At most two network requests in flight.
    NetworkIdle2,
}

impl WaitUntil {
    /// Returns the option name (`load`, `domcontentloaded`, ...).
    #[inline]
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Load => "load",
            Self::DomContentLoaded => "domcontentloaded",
            Self::NetworkIdle0 => "networkidle0",
            Self::NetworkIdle2 => "networkidle2",
        }
    }

    /// Returns the lifecycle event name this milestone maps to.
    #[inline]
    #[must_use]
    pub const fn lifecycle_event(&self) -> Option<&'static str> {
        match self {
            Self::Load => Some("load"),
            Self::DomContentLoaded => Some("DOMContentLoaded"),
            Self::NetworkIdle0 | Self::NetworkIdle2 => None,
        }
    }

    /// Returns the in-flight request ceiling for network idle milestones.
    #[inline]
    #[must_use]
    pub const fn idle_threshold(&self) -> Option<usize> {
        match self {
            Self::NetworkIdle0 => Some(0),
            Self::NetworkIdle2 => Some(2),
            Self::Load | Self::DomContentLoaded => None,
        }
    }

    /// Normalizes a milestone list; an empty list means `[Load]`.
    #[must_use]
    pub fn normalize(milestones: &[WaitUntil]) -> Vec<WaitUntil> {
        if milestones.is_empty() {
            return vec![Self::Load];
        }
        let mut out = Vec::with_capacity(milestones.len());
        for milestone in milestones {
            if !out.contains(milestone) {
                out.push(*milestone);
            }
        }
        out
    }
}

impl FromStr for WaitUntil {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "load" => Ok(Self::Load),
            "domcontentloaded" => Ok(Self::DomContentLoaded),
            "networkidle0" => Ok(Self::NetworkIdle0),
            "networkidle2" => Ok(Self::NetworkIdle2),
            other => Err(Error::invalid_argument(format!(
                "Unknown value for waitUntil: {other}"
            ))),
        }
    }
}

impl fmt::Display for WaitUntil {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Signals and Status
// ============================================================================

/// Frame-level change a watcher reacts to beyond plain tree state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameSignal {
    /// Same-document navigation committed.
    SameDocumentNavigation(FrameId),
    /// Frame removed from the tree.
    Detached(FrameId),
    /// Frame moved to another process.
    Swapped(FrameId),
}

/// Why a watcher stopped waiting without success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Target frame detached.
    Detached,
    /// Target frame swapped to another process.
    Swapped,
}

impl Termination {
    /// Returns the reason text used in errors.
    #[inline]
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Detached => "detached",
            Self::Swapped => "swapped",
        }
    }
}

/// Which completion path a caller accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitMode {
    /// Only a new document counts.
    NewDocument,
    /// A new document or a same-document navigation.
    Either,
    /// Milestones for whatever document is current.
    Lifecycle,
    /// Only termination (used to race a navigation command).
    Termination,
}

/// Snapshot published to waiting callers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WatchStatus {
    /// Milestones reached for the current document.
    pub lifecycle: bool,
    /// Same-document navigation observed.
    pub same_document: bool,
    /// New document completed; carries its response, if any.
    pub new_document: Option<Option<HttpResponse>>,
    /// Terminal failure.
    pub termination: Option<Termination>,
}

impl WatchStatus {
    /// Returns `true` once `mode` has an outcome.
    #[must_use]
    pub fn is_settled(&self, mode: WaitMode) -> bool {
        if self.termination.is_some() {
            return true;
        }
        match mode {
            WaitMode::NewDocument => self.new_document.is_some(),
            WaitMode::Either => self.new_document.is_some() || self.same_document,
            WaitMode::Lifecycle => self.lifecycle,
            WaitMode::Termination => false,
        }
    }

    /// Converts a settled status into the caller's result.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NavigationTermination`] if the watcher terminated.
    pub fn into_outcome(self, mode: WaitMode, frame_id: &FrameId) -> Result<Option<HttpResponse>> {
        if let Some(termination) = self.termination {
            return Err(Error::navigation_termination(
                frame_id.clone(),
                termination.as_str(),
            ));
        }
        match mode {
            WaitMode::NewDocument | WaitMode::Either => Ok(self.new_document.flatten()),
            WaitMode::Lifecycle | WaitMode::Termination => Ok(None),
        }
    }
}

// ============================================================================
// LifecycleWatcher
// ============================================================================

/// Tracks one navigation of one frame.
#[derive(Debug)]
pub struct LifecycleWatcher {
    frame_id: FrameId,
    wait_until: Vec<WaitUntil>,
    initial_loader_id: Option<LoaderId>,
    status: WatchStatus,
}

impl LifecycleWatcher {
    /// Captures the baseline of `frame_id`.
    ///
    /// A watcher for a missing or detached frame is terminated immediately.
    #[must_use]
    pub fn new(frame_id: FrameId, wait_until: &[WaitUntil], tree: &FrameTree) -> Self {
        let frame = tree.get(&frame_id).filter(|f| !f.is_detached());
        let mut watcher = Self {
            frame_id,
            wait_until: WaitUntil::normalize(wait_until),
            initial_loader_id: frame.and_then(FrameState::loader_id).cloned(),
            status: WatchStatus::default(),
        };
        if frame.is_none() {
            watcher.status.termination = Some(Termination::Detached);
        }
        watcher
    }

    /// Returns the target frame.
    #[inline]
    #[must_use]
    pub fn frame_id(&self) -> &FrameId {
        &self.frame_id
    }

    /// Returns the normalized milestones.
    #[inline]
    #[must_use]
    pub fn wait_until(&self) -> &[WaitUntil] {
        &self.wait_until
    }

    /// Returns the loader captured at construction.
    #[inline]
    #[must_use]
    pub fn initial_loader_id(&self) -> Option<&LoaderId> {
        self.initial_loader_id.as_ref()
    }

    /// Returns the current status.
    #[inline]
    #[must_use]
    pub fn status(&self) -> &WatchStatus {
        &self.status
    }

    /// Returns `true` once no further event can change the outcome.
    #[inline]
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.status.termination.is_some() || self.status.new_document.is_some()
    }

    /// Applies a frame signal. Returns `true` if the status changed.
    pub fn on_signal(&mut self, signal: &FrameSignal, tree: &FrameTree) -> bool {
        if self.is_finished() {
            return false;
        }
        let before = self.status.clone();
        match signal {
            FrameSignal::Detached(id) if *id == self.frame_id => {
                self.status.termination = Some(Termination::Detached);
            }
            FrameSignal::Swapped(id) if *id == self.frame_id => {
                self.status.termination = Some(Termination::Swapped);
            }
            FrameSignal::SameDocumentNavigation(id) if *id == self.frame_id => {
                let loader = tree.get(&self.frame_id).and_then(FrameState::loader_id);
                if loader == self.initial_loader_id.as_ref() {
                    self.status.same_document = true;
                }
            }
            _ => {}
        }
        self.status != before
    }

    /// Re-evaluates completion against the tree. Returns `true` if the
    /// status changed.
    pub fn check(&mut self, tree: &FrameTree, network: &dyn NetworkObserver) -> bool {
        if self.is_finished() {
            return false;
        }
        let before = self.status.clone();

        let Some(frame) = tree.get(&self.frame_id) else {
            self.status.termination = Some(Termination::Detached);
            return true;
        };

        if milestones_reached(tree, frame, &self.wait_until, network) {
            self.status.lifecycle = true;
            if frame.loader_id() != self.initial_loader_id.as_ref() {
                let response = frame
                    .loader_id()
                    .and_then(|loader| network.response_for_loader(loader));
                trace!(
                    frame_id = %self.frame_id,
                    loader_id = ?frame.loader_id(),
                    status = ?response.as_ref().map(|r| r.status),
                    "New document navigation complete"
                );
                self.status.new_document = Some(response);
            }
        }

        self.status != before
    }
}

/// Returns `true` if `frame` and its loading descendants reached `wait_until`.
///
/// Children that never started a load (empty or lazy iframes) do not hold
/// the navigation back.
fn milestones_reached(
    tree: &FrameTree,
    frame: &FrameState,
    wait_until: &[WaitUntil],
    network: &dyn NetworkObserver,
) -> bool {
    for milestone in wait_until {
        let reached = match (milestone.lifecycle_event(), milestone.idle_threshold()) {
            (Some(event), _) => frame.has_lifecycle_event(event),
            (None, Some(threshold)) => network.inflight_requests() <= threshold,
            (None, None) => true,
        };
        if !reached {
            return false;
        }
    }

    tree.children_of(frame.id())
        .filter_map(|child| tree.get(child))
        .filter(|child| child.has_started_loading())
        .all(|child| milestones_reached(tree, child, wait_until, network))
}

// ============================================================================
// Tests
// ============================================================================

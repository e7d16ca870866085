//! Per-frame navigation bookkeeping.
//!
//! [`FrameState`] is the mutable record the frame tree keeps for every frame.
//! It tracks the committed URL, the current loader and the lifecycle
//! milestones reached for that loader.

// ============================================================================
// Imports
// ============================================================================

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::trace;

use crate::identifiers::{FrameId, LoaderId, SessionId};
use crate::protocol::FramePayload;

use super::world::{IsolatedWorld, WorldKind, Worlds};

// ============================================================================
// Constants
// ============================================================================

/// Milestone that starts a new loader.
const INIT_EVENT: &str = "init";

/// Milestones synthesized when loading stops.
const STOPPED_LOADING_EVENTS: [&str; 2] = ["DOMContentLoaded", "load"];

// ============================================================================
// FrameState
// ============================================================================

/// Mutable navigation record of a single frame.
#[derive(Debug)]
pub struct FrameState {
    id: FrameId,
    /// Distinguishes this record from earlier frames that used the same ID.
    generation: u64,
    parent_id: Option<FrameId>,
    session_id: SessionId,
    url: String,
    name: String,
    loader_id: Option<LoaderId>,
    lifecycle_events: FxHashSet<String>,
    /// Loader each recorded milestone was reported for.
    event_loaders: FxHashMap<String, Option<LoaderId>>,
    has_started_loading: bool,
    detached: bool,
    worlds: Worlds,
}

impl FrameState {
    /// Creates the record for a newly attached frame.
    pub(crate) fn new(
        id: FrameId,
        generation: u64,
        parent_id: Option<FrameId>,
        session_id: SessionId,
    ) -> Self {
        let worlds = Worlds::new(&id);
        Self {
            id,
            generation,
            parent_id,
            session_id,
            url: String::new(),
            name: String::new(),
            loader_id: None,
            lifecycle_events: FxHashSet::default(),
            event_loaders: FxHashMap::default(),
            has_started_loading: false,
            detached: false,
            worlds,
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Returns the frame ID.
    #[inline]
    #[must_use]
    pub fn id(&self) -> &FrameId {
        &self.id
    }

    /// Returns the parent frame ID, if any.
    #[inline]
    #[must_use]
    pub fn parent_id(&self) -> Option<&FrameId> {
        self.parent_id.as_ref()
    }

    /// Returns the session currently serving the frame.
    #[inline]
    #[must_use]
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Returns the committed URL including its fragment.
    #[inline]
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the attach generation of this record.
    #[inline]
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns the frame name, or the frame ID for unnamed frames.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the loader of the current document.
    #[inline]
    #[must_use]
    pub fn loader_id(&self) -> Option<&LoaderId> {
        self.loader_id.as_ref()
    }

    /// Returns `true` once any load has started in this frame.
    #[inline]
    #[must_use]
    pub fn has_started_loading(&self) -> bool {
        self.has_started_loading
    }

    /// Returns `true` once the frame has been removed from the tree.
    #[inline]
    #[must_use]
    pub fn is_detached(&self) -> bool {
        self.detached
    }

    /// Returns the world of the given kind.
    #[inline]
    #[must_use]
    pub fn world(&self, kind: WorldKind) -> &IsolatedWorld {
        self.worlds.get(kind)
    }

    /// Returns `true` if `name` was reached by the current loader.
    ///
    /// Milestones recorded for an older loader do not count. Without a known
    /// loader every recorded milestone counts.
    #[must_use]
    pub fn has_lifecycle_event(&self, name: &str) -> bool {
        if !self.lifecycle_events.contains(name) {
            return false;
        }
        match (&self.loader_id, self.event_loaders.get(name)) {
            (None, _) => true,
            (Some(current), Some(Some(loader))) => current == loader,
            (Some(_), _) => false,
        }
    }

    /// Returns the set of recorded milestone names.
    #[inline]
    #[must_use]
    pub fn lifecycle_events(&self) -> &FxHashSet<String> {
        &self.lifecycle_events
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Applies a committed navigation.
    pub(crate) fn on_navigated(&mut self, frame: &FramePayload) {
        if self.detached {
            return;
        }
        self.name = frame
            .name
            .clone()
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| self.id.to_string());
        self.url = match &frame.url_fragment {
            Some(fragment) => format!("{}{}", frame.url, fragment),
            None => frame.url.clone(),
        };
    }

    /// Applies a same-document navigation. Loader and milestones are untouched.
    pub(crate) fn on_navigated_within_document(&mut self, url: &str) {
        if self.detached {
            return;
        }
        self.url = url.to_string();
    }

    /// Records a lifecycle milestone.
    ///
    /// `init` starts a new loader and clears every recorded milestone.
    pub(crate) fn on_lifecycle_event(&mut self, loader_id: &LoaderId, name: &str) {
        if self.detached {
            return;
        }
        if name == INIT_EVENT {
            trace!(frame_id = %self.id, %loader_id, "New loader");
            self.loader_id = Some(loader_id.clone());
            self.has_started_loading = true;
            self.lifecycle_events.clear();
            self.event_loaders.clear();
        }
        self.lifecycle_events.insert(name.to_string());
        self.event_loaders
            .insert(name.to_string(), Some(loader_id.clone()));
    }

    /// Marks the frame as having started a load.
    pub(crate) fn on_loading_started(&mut self) {
        if self.detached {
            return;
        }
        self.has_started_loading = true;
    }

    /// Synthesizes the `DOMContentLoaded` and `load` milestones for the
    /// current loader.
    pub(crate) fn on_loading_stopped(&mut self) {
        if self.detached {
            return;
        }
        for name in STOPPED_LOADING_EVENTS {
            self.lifecycle_events.insert(name.to_string());
            self.event_loaders
                .insert(name.to_string(), self.loader_id.clone());
        }
    }

    /// Moves the frame to another session.
    pub(crate) fn set_session(&mut self, session_id: SessionId) {
        self.session_id = session_id;
    }

    /// Points the frame at a different parent. Tree links are the caller's job.
    pub(crate) fn set_parent(&mut self, parent_id: Option<FrameId>) {
        self.parent_id = parent_id;
    }

    /// Marks the frame detached and fails its worlds.
    pub(crate) fn mark_detached(&mut self) {
        self.detached = true;
        self.worlds.detach();
    }
}

// ============================================================================
// Tests
// ============================================================================

//! Frame handle and accessors.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::{Arc, Weak};

use serde_json::Value;

use crate::error::{Error, Result};
use crate::identifiers::{FrameId, LoaderId, SessionId};
use crate::protocol::Command;

use super::manager::ManagerInner;
use super::state::FrameState;
use super::world::{IsolatedWorld, WorldKind};

// ============================================================================
// Frame
// ============================================================================

/// Handle to one mirrored frame.
///
/// The handle does not keep the frame or its manager alive. Once the frame
/// detaches (or the manager is dropped) accessors return `None` and
/// operations fail. A later frame attached under the same ID is a different
/// frame; old handles stay detached.
#[derive(Clone)]
pub struct Frame {
    pub(crate) inner: Arc<FrameInner>,
}

/// Internal shared state for a frame handle.
pub(crate) struct FrameInner {
    /// Frame ID.
    pub id: FrameId,
    /// Generation of the record this handle was created for.
    pub generation: u64,
    /// Owning manager.
    pub manager: Weak<ManagerInner>,
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("id", &self.inner.id)
            .finish_non_exhaustive()
    }
}

impl PartialEq for Frame {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
            && self.inner.generation == other.inner.generation
            && Weak::ptr_eq(&self.inner.manager, &other.inner.manager)
    }
}

impl Eq for Frame {}

// ============================================================================
// Frame - Constructor
// ============================================================================

impl Frame {
    pub(crate) fn new(state: &FrameState, manager: Weak<ManagerInner>) -> Self {
        Self {
            inner: Arc::new(FrameInner {
                id: state.id().clone(),
                generation: state.generation(),
                manager,
            }),
        }
    }
}

// ============================================================================
// Frame - Accessors
// ============================================================================

impl Frame {
    /// Returns the frame ID.
    #[inline]
    #[must_use]
    pub fn id(&self) -> &FrameId {
        &self.inner.id
    }

    /// Returns the frame name (the ID for unnamed frames).
    #[must_use]
    pub fn name(&self) -> Option<String> {
        self.with_state(|f| f.name().to_string())
    }

    /// Returns the committed URL.
    #[must_use]
    pub fn url(&self) -> Option<String> {
        self.with_state(|f| f.url().to_string())
    }

    /// Returns the loader of the current document.
    #[must_use]
    pub fn loader_id(&self) -> Option<LoaderId> {
        self.with_state(|f| f.loader_id().cloned()).flatten()
    }

    /// Returns `true` once the frame has started any load.
    #[must_use]
    pub fn has_started_loading(&self) -> bool {
        self.with_state(FrameState::has_started_loading)
            .unwrap_or(false)
    }

    /// Returns the parent frame.
    #[must_use]
    pub fn parent_frame(&self) -> Option<Frame> {
        let parent = self.with_state(|f| f.parent_id().cloned()).flatten()?;
        let manager = self.inner.manager.upgrade()?;
        let state = manager.state.lock();
        state
            .tree
            .get(&parent)
            .map(|parent| Frame::new(parent, Arc::downgrade(&manager)))
    }

    /// Returns the direct child frames.
    #[must_use]
    pub fn child_frames(&self) -> Vec<Frame> {
        let Some(manager) = self.inner.manager.upgrade() else {
            return Vec::new();
        };
        let state = manager.state.lock();
        if state
            .tree
            .get(&self.inner.id)
            .is_none_or(|f| f.generation() != self.inner.generation)
        {
            return Vec::new();
        }
        state
            .tree
            .children_of(&self.inner.id)
            .filter_map(|child| state.tree.get(child))
            .map(|child| Frame::new(child, Arc::downgrade(&manager)))
            .collect()
    }

    /// Returns `true` once the frame has been removed from the tree.
    #[must_use]
    pub fn is_detached(&self) -> bool {
        self.with_state(FrameState::is_detached).unwrap_or(true)
    }

    /// Returns the session currently serving this frame.
    #[must_use]
    pub fn session_id(&self) -> Option<SessionId> {
        self.with_state(|f| f.session_id().clone())
    }

    /// Returns `true` if a dedicated (out-of-process) session serves this frame.
    #[must_use]
    pub fn is_oop_frame(&self) -> Option<bool> {
        self.with_state(|f| !f.session_id().is_root())
    }

    /// Returns the page's own script world.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ContextUnavailable`] if the frame detached.
    pub fn main_world(&self) -> Result<IsolatedWorld> {
        self.world(WorldKind::Main)
    }

    /// Returns the private helper world.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ContextUnavailable`] if the frame detached.
    pub fn utility_world(&self) -> Result<IsolatedWorld> {
        self.world(WorldKind::Utility)
    }

    /// Returns the world of the given kind.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ContextUnavailable`] if the frame detached.
    pub fn world(&self, kind: WorldKind) -> Result<IsolatedWorld> {
        self.with_state(|f| f.world(kind).clone())
            .ok_or_else(|| Error::context_unavailable(self.inner.id.clone(), kind))
    }
}

// ============================================================================
// Frame - Internal
// ============================================================================

impl Frame {
    /// Runs `f` against the frame's record, if still attached.
    ///
    /// A record re-attached under the same ID does not count.
    pub(crate) fn with_state<R>(&self, f: impl FnOnce(&FrameState) -> R) -> Option<R> {
        let manager = self.inner.manager.upgrade()?;
        let state = manager.state.lock();
        state
            .tree
            .get(&self.inner.id)
            .filter(|frame| frame.generation() == self.inner.generation)
            .map(f)
    }

    /// Returns the owning manager.
    pub(crate) fn manager(&self) -> Result<Arc<ManagerInner>> {
        self.inner
            .manager
            .upgrade()
            .ok_or_else(|| Error::frame_not_found(self.inner.id.clone()))
    }

    /// Sends a command on the session serving this frame.
    pub(crate) async fn send(&self, command: Command) -> Result<Value> {
        let manager = self.manager()?;
        let session_id = self
            .session_id()
            .ok_or_else(|| Error::frame_not_found(self.inner.id.clone()))?;
        manager.session.send(&session_id, command).await
    }
}

// ============================================================================
// Tests
// ============================================================================

//! Frame tree arena.
//!
//! Frames are stored flat, keyed by [`FrameId`], with parent pointers on each
//! [`FrameState`] and child sets kept alongside. Child sets are keyed by the
//! parent ID even when that parent has not attached yet, so out-of-order
//! attach notifications reconcile on their own.
//!
//! The tree performs no I/O.

// ============================================================================
// Imports
// ============================================================================

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, trace, warn};

use crate::identifiers::{FrameId, SessionId};

use super::state::FrameState;

// ============================================================================
// FrameTree
// ============================================================================

/// Mirrored frame hierarchy.
#[derive(Debug, Default)]
pub struct FrameTree {
    frames: FxHashMap<FrameId, FrameState>,
    children: FxHashMap<FrameId, FxHashSet<FrameId>>,
    main_frame: Option<FrameId>,
    /// Last generation handed out by `attach`.
    generation: u64,
}

impl FrameTree {
    /// Creates an empty tree.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Returns the root frame ID.
    #[inline]
    #[must_use]
    pub fn main_frame(&self) -> Option<&FrameId> {
        self.main_frame.as_ref()
    }

    /// Returns a frame record.
    #[inline]
    #[must_use]
    pub fn get(&self, id: &FrameId) -> Option<&FrameState> {
        self.frames.get(id)
    }

    /// Returns a mutable frame record.
    #[inline]
    pub fn get_mut(&mut self, id: &FrameId) -> Option<&mut FrameState> {
        self.frames.get_mut(id)
    }

    /// Returns `true` if the frame is in the tree.
    #[inline]
    #[must_use]
    pub fn contains(&self, id: &FrameId) -> bool {
        self.frames.contains_key(id)
    }

    /// Returns the parent of a frame.
    #[inline]
    #[must_use]
    pub fn parent_of(&self, id: &FrameId) -> Option<&FrameId> {
        self.frames.get(id).and_then(FrameState::parent_id)
    }

    /// Returns the direct children of a frame.
    pub fn children_of(&self, id: &FrameId) -> impl Iterator<Item = &FrameId> {
        self.children.get(id).into_iter().flatten()
    }

    /// Iterates over every frame.
    pub fn frames(&self) -> impl Iterator<Item = &FrameState> {
        self.frames.values()
    }

    /// Returns the number of frames.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Returns `true` if no frames are attached.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Attaches a frame under `parent_id`.
    ///
    /// Returns `true` if the frame was created. Attaching a known frame is a
    /// no-op unless it names a different parent, in which case it is moved.
    /// A parent link that would close a cycle is refused.
    pub fn attach(
        &mut self,
        id: FrameId,
        parent_id: Option<FrameId>,
        session_id: SessionId,
    ) -> bool {
        if let Some(existing) = self.frames.get(&id) {
            if parent_id.is_some() && existing.parent_id() != parent_id.as_ref() {
                self.reparent(&id, parent_id);
            }
            return false;
        }

        if let Some(parent) = &parent_id
            && (parent == &id || self.is_ancestor(&id, parent))
        {
            warn!(frame_id = %id, parent_id = %parent, "Refusing cyclic attach");
            return false;
        }

        match &parent_id {
            Some(parent) => {
                if !self.frames.contains_key(parent) {
                    trace!(frame_id = %id, parent_id = %parent, "Parent not attached yet");
                }
                self.children
                    .entry(parent.clone())
                    .or_default()
                    .insert(id.clone());
            }
            None => {
                if let Some(previous) = &self.main_frame {
                    debug!(previous = %previous, frame_id = %id, "Replacing main frame");
                }
                self.main_frame = Some(id.clone());
            }
        }

        self.generation += 1;
        trace!(frame_id = %id, generation = self.generation, "Frame attached");
        self.frames.insert(
            id.clone(),
            FrameState::new(id, self.generation, parent_id, session_id),
        );
        true
    }

    /// Moves a frame under a different parent.
    ///
    /// Returns `false` (and leaves the tree untouched) if the move would
    /// create a cycle.
    pub fn reparent(&mut self, id: &FrameId, parent_id: Option<FrameId>) -> bool {
        if let Some(parent) = &parent_id
            && (parent == id || self.is_ancestor(id, parent))
        {
            warn!(frame_id = %id, parent_id = %parent, "Refusing cyclic reparent");
            return false;
        }

        let Some(frame) = self.frames.get_mut(id) else {
            return false;
        };
        let previous = frame.parent_id().cloned();
        frame.set_parent(parent_id.clone());

        if let Some(previous) = previous {
            self.unlink(&previous, id);
        }
        match parent_id {
            Some(parent) => {
                self.children.entry(parent).or_default().insert(id.clone());
                if self.main_frame.as_ref() == Some(id) {
                    self.main_frame = None;
                }
            }
            None => self.main_frame = Some(id.clone()),
        }
        true
    }

    /// Detaches a frame and all of its descendants.
    ///
    /// Every removed frame is marked detached, which fails its worlds.
    /// Returns the removed IDs, deepest first.
    pub fn detach(&mut self, id: &FrameId) -> Vec<FrameId> {
        if !self.frames.contains_key(id) {
            return Vec::new();
        }

        let mut removed = Vec::new();
        self.collect_subtree(id, &mut removed);

        for frame_id in &removed {
            if let Some(mut frame) = self.frames.remove(frame_id) {
                frame.mark_detached();
                if let Some(parent) = frame.parent_id() {
                    self.unlink(parent, frame_id);
                }
            }
            self.children.remove(frame_id);
            if self.main_frame.as_ref() == Some(frame_id) {
                self.main_frame = None;
            }
        }

        debug!(frame_id = %id, count = removed.len(), "Frames detached");
        removed
    }

    /// Detaches every direct child of a frame (and their subtrees).
    pub fn detach_children(&mut self, id: &FrameId) -> Vec<FrameId> {
        let children: Vec<FrameId> = self.children_of(id).cloned().collect();
        children
            .iter()
            .flat_map(|child| self.detach(child))
            .collect()
    }

    /// Detaches everything.
    pub fn clear(&mut self) -> Vec<FrameId> {
        let roots: Vec<FrameId> = self
            .frames
            .values()
            .filter(|f| f.parent_id().is_none_or(|p| !self.frames.contains_key(p)))
            .map(|f| f.id().clone())
            .collect();
        roots.iter().flat_map(|root| self.detach(root)).collect()
    }

    /// Verifies parent pointers against child sets.
    ///
    /// Returns a description of the first violation found.
    pub fn check_invariants(&self) -> Result<(), String> {
        for (parent, children) in &self.children {
            if children.is_empty() {
                return Err(format!("empty child set kept for {parent}"));
            }
            for child in children {
                let Some(frame) = self.frames.get(child) else {
                    return Err(format!("child {child} of {parent} is not attached"));
                };
                if frame.parent_id() != Some(parent) {
                    return Err(format!("child {child} listed under {parent} has another parent"));
                }
            }
        }

        for frame in self.frames.values() {
            if let Some(parent) = frame.parent_id() {
                let listed = self
                    .children
                    .get(parent)
                    .is_some_and(|set| set.contains(frame.id()));
                if !listed {
                    return Err(format!("{} missing from child set of {parent}", frame.id()));
                }
            }

            let mut hops = 0;
            let mut cursor = frame.parent_id();
            while let Some(parent) = cursor {
                hops += 1;
                if hops > self.frames.len() {
                    return Err(format!("cycle through {}", frame.id()));
                }
                cursor = self.parent_of(parent);
            }
        }

        if let Some(main) = &self.main_frame
            && self.frames.get(main).is_none_or(|f| f.parent_id().is_some())
        {
            return Err(format!("main frame {main} is not an attached root"));
        }
        Ok(())
    }

    // ========================================================================
    // Internal
    // ========================================================================

    fn unlink(&mut self, parent: &FrameId, child: &FrameId) {
        if let Some(set) = self.children.get_mut(parent) {
            set.remove(child);
            if set.is_empty() {
                self.children.remove(parent);
            }
        }
    }

    /// Returns `true` if `ancestor` is above `id`.
    fn is_ancestor(&self, ancestor: &FrameId, id: &FrameId) -> bool {
        let mut cursor = self.parent_of(id);
        let mut hops = 0;
        while let Some(parent) = cursor {
            if parent == ancestor {
                return true;
            }
            hops += 1;
            if hops > self.frames.len() {
                break;
            }
            cursor = self.parent_of(parent);
        }
        false
    }

    /// Post-order walk so descendants come before their parent.
    fn collect_subtree(&self, id: &FrameId, out: &mut Vec<FrameId>) {
        for child in self.children_of(id) {
            self.collect_subtree(child, out);
        }
        out.push(id.clone());
    }
}

// ============================================================================
// Tests
// ============================================================================

//! Frame manager: event dispatch hub.
//!
//! The manager consumes the ordered event stream of a session, mirrors the
//! frame tree, binds execution contexts to worlds and drives navigation
//! watchers. Every event is applied and every watcher re-checked inside one
//! critical section, so no watcher observes a half-applied event.
//!
//! # Event Routing
//!
//! | Event | Effect |
//! |-------|--------|
//! | `Page.frameAttached` | attach frame, or rebind its session |
//! | `Page.frameNavigated` | create root if unknown, drop old children, commit URL |
//! | `Page.navigatedWithinDocument` | update URL, signal same-document |
//! | `Page.frameDetached` | remove subtree (`remove`) or terminate watchers (`swap`) |
//! | `Page.frameStartedLoading` / `Page.frameStoppedLoading` | loading flags |
//! | `Page.lifecycleEvent` | milestone bookkeeping |
//! | `Runtime.executionContext*` | bind / clear world contexts |
//! | `Network.*` | forwarded to the [`NetworkObserver`] |

// ============================================================================
// Imports
// ============================================================================

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, timeout_at};
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::identifiers::{ExecutionContextId, FrameId, SessionId};
use crate::network::{HttpResponse, NetworkManager, NetworkObserver};
use crate::options::ManagerOptions;
use crate::protocol::{
    Command, ContextPayload, DetachReason, Event, FramePayload, FrameTreePayload, PageCommand,
    ParsedEvent, RuntimeCommand,
};
use crate::transport::{EventStream, SharedSession};

use super::core::Frame;
use super::lifecycle::{FrameSignal, LifecycleWatcher, WaitMode, WaitUntil, WatchStatus};
use super::state::FrameState;
use super::tree::FrameTree;
use super::world::{ExecutionContext, WorldKind};

// ============================================================================
// Types
// ============================================================================

/// Live watcher key.
type WatcherId = u64;

/// World a remote context was bound to.
#[derive(Debug, Clone)]
struct ContextBinding {
    frame_id: FrameId,
    world: WorldKind,
}

/// Registered watcher and its publication channel.
struct WatcherEntry {
    machine: LifecycleWatcher,
    status: watch::Sender<WatchStatus>,
}

// ============================================================================
// ManagerInner / ManagerState
// ============================================================================

/// Shared manager internals.
pub(crate) struct ManagerInner {
    /// Command channel.
    pub(crate) session: SharedSession,
    /// Configuration.
    pub(crate) options: ManagerOptions,
    /// Mirrored state.
    pub(crate) state: Mutex<ManagerState>,
    next_watcher_id: AtomicU64,
}

/// State mutated by event dispatch.
pub(crate) struct ManagerState {
    /// Frame hierarchy.
    pub(crate) tree: FrameTree,
    /// Network collaborator.
    pub(crate) network: Box<dyn NetworkObserver>,
    contexts: FxHashMap<(SessionId, ExecutionContextId), ContextBinding>,
    watchers: FxHashMap<WatcherId, WatcherEntry>,
}

// ============================================================================
// FrameManager
// ============================================================================

/// Mirrors the frames of one page and dispatches its events.
///
/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct FrameManager {
    inner: Arc<ManagerInner>,
}

impl std::fmt::Debug for FrameManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("FrameManager")
            .field("frames", &state.tree.len())
            .field("contexts", &state.contexts.len())
            .field("watchers", &state.watchers.len())
            .finish()
    }
}

// ============================================================================
// FrameManager - Constructors
// ============================================================================

impl FrameManager {
    /// Creates a manager with the default [`NetworkManager`].
    #[must_use]
    pub fn new(session: SharedSession, options: ManagerOptions) -> Self {
        Self::with_network(session, options, Box::new(NetworkManager::new()))
    }

    /// Creates a manager with a custom network collaborator.
    #[must_use]
    pub fn with_network(
        session: SharedSession,
        options: ManagerOptions,
        network: Box<dyn NetworkObserver>,
    ) -> Self {
        Self {
            inner: Arc::new(ManagerInner {
                session,
                options,
                state: Mutex::new(ManagerState {
                    tree: FrameTree::new(),
                    network,
                    contexts: FxHashMap::default(),
                    watchers: FxHashMap::default(),
                }),
                next_watcher_id: AtomicU64::new(1),
            }),
        }
    }

    /// Rebuilds a manager handle from its internals.
    pub(crate) fn from_inner(inner: Arc<ManagerInner>) -> Self {
        Self { inner }
    }

    /// Returns the configuration.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &ManagerOptions {
        &self.inner.options
    }
}

// ============================================================================
// FrameManager - Accessors
// ============================================================================

impl FrameManager {
    /// Returns the main frame, once known.
    #[must_use]
    pub fn main_frame(&self) -> Option<Frame> {
        let state = self.inner.state.lock();
        state
            .tree
            .main_frame()
            .and_then(|id| state.tree.get(id))
            .map(|f| self.handle(f))
    }

    /// Returns a frame by ID.
    #[must_use]
    pub fn frame(&self, frame_id: &FrameId) -> Option<Frame> {
        let state = self.inner.state.lock();
        state.tree.get(frame_id).map(|f| self.handle(f))
    }

    /// Returns every attached frame.
    #[must_use]
    pub fn frames(&self) -> Vec<Frame> {
        let state = self.inner.state.lock();
        state.tree.frames().map(|f| self.handle(f)).collect()
    }

    /// Returns the number of live navigation watchers.
    #[must_use]
    pub fn watcher_count(&self) -> usize {
        self.inner.state.lock().watchers.len()
    }

    fn handle(&self, frame: &FrameState) -> Frame {
        Frame::new(frame, Arc::downgrade(&self.inner))
    }
}

// ============================================================================
// FrameManager - Setup
// ============================================================================

impl FrameManager {
    /// Enables the page on the top-level session and mirrors its frames.
    ///
    /// # Errors
    ///
    /// Returns an error if any setup command fails.
    pub async fn initialize(&self) -> Result<()> {
        self.initialize_session(&SessionId::root()).await
    }

    /// Enables the page on `session_id` and mirrors the frames it serves.
    ///
    /// Called once for the top-level session and once for every dedicated
    /// session serving an out-of-process frame.
    ///
    /// # Errors
    ///
    /// Returns an error if any setup command fails.
    pub async fn initialize_session(&self, session_id: &SessionId) -> Result<()> {
        debug!(%session_id, "Initializing session");

        self.send(session_id, Command::Page(PageCommand::Enable {}))
            .await?;
        let result = self
            .send(session_id, Command::Page(PageCommand::GetFrameTree {}))
            .await?;
        let frame_tree: FrameTreePayload =
            serde_json::from_value(result.get("frameTree").cloned().unwrap_or(Value::Null))?;
        self.apply_frame_tree(session_id, &frame_tree);

        if self.inner.options.lifecycle_events {
            self.send(
                session_id,
                Command::Page(PageCommand::SetLifecycleEventsEnabled { enabled: true }),
            )
            .await?;
        }
        self.send(session_id, Command::Runtime(RuntimeCommand::Enable {}))
            .await?;

        self.create_isolated_worlds(session_id).await
    }

    /// Hands a frame over to a dedicated session and initializes it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FrameNotFound`] if the frame is unknown, or any
    /// error from [`initialize_session`](Self::initialize_session).
    pub async fn attach_session(&self, frame_id: &FrameId, session_id: SessionId) -> Result<()> {
        {
            let mut state = self.inner.state.lock();
            let frame = state
                .tree
                .get_mut(frame_id)
                .ok_or_else(|| Error::frame_not_found(frame_id.clone()))?;
            debug!(%frame_id, from = %frame.session_id(), to = %session_id, "Frame session promoted");
            frame.set_session(session_id.clone());
        }
        self.initialize_session(&session_id).await
    }

    fn apply_frame_tree(&self, session_id: &SessionId, payload: &FrameTreePayload) {
        let mut events = Vec::new();
        flatten_frame_tree(payload, &mut events);

        let mut state = self.inner.state.lock();
        let mut signals = Vec::new();
        for event in &events {
            self.apply(&mut state, event, session_id, &mut signals);
        }
        update_watchers(&mut state, &signals);
    }

    async fn create_isolated_worlds(&self, session_id: &SessionId) -> Result<()> {
        let world_name = self.inner.options.utility_world_name.clone();

        self.send(
            session_id,
            Command::Page(PageCommand::AddScriptToEvaluateOnNewDocument {
                source: format!("//# sourceURL={world_name}"),
                world_name: Some(world_name.clone()),
            }),
        )
        .await?;

        let frame_ids: Vec<FrameId> = {
            let state = self.inner.state.lock();
            state
                .tree
                .frames()
                .filter(|f| f.session_id() == session_id)
                .map(|f| f.id().clone())
                .collect()
        };

        for frame_id in frame_ids {
            let command = Command::Page(PageCommand::CreateIsolatedWorld {
                frame_id: frame_id.clone(),
                world_name: world_name.clone(),
                grant_universal_access: true,
            });
            // Frames may detach between the snapshot and the call.
            if let Err(e) = self.send(session_id, command).await {
                debug!(%frame_id, error = %e, "Failed to create isolated world");
            }
        }
        Ok(())
    }

    async fn send(&self, session_id: &SessionId, command: Command) -> Result<Value> {
        trace!(%session_id, method = %command.method(), "Sending command");
        self.inner.session.send(session_id, command).await
    }
}

// ============================================================================
// FrameManager - Dispatch
// ============================================================================

impl FrameManager {
    /// Spawns the dispatch loop over an event stream.
    ///
    /// Events are applied strictly in arrival order. When the stream ends,
    /// every frame is detached so no caller waits forever.
    pub fn run(&self, mut events: EventStream) -> JoinHandle<()> {
        let manager = self.clone();
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                manager.handle_event(&event);
            }
            debug!("Event stream closed");
            manager.close();
        })
    }

    /// Applies one event and re-checks every watcher.
    pub fn handle_event(&self, event: &Event) {
        let parsed = event.parse();
        let mut state = self.inner.state.lock();
        let mut signals = Vec::new();
        self.apply(&mut state, &parsed, &event.session_id, &mut signals);
        update_watchers(&mut state, &signals);
    }

    /// Detaches every frame, failing pending evaluations and navigations.
    pub fn close(&self) {
        let mut state = self.inner.state.lock();
        let removed = state.tree.clear();
        state.contexts.clear();
        state.network.forget_frames(&removed);
        let signals: Vec<FrameSignal> = removed.into_iter().map(FrameSignal::Detached).collect();
        update_watchers(&mut state, &signals);
    }

    fn apply(
        &self,
        state: &mut ManagerState,
        event: &ParsedEvent,
        session_id: &SessionId,
        signals: &mut Vec<FrameSignal>,
    ) {
        match event {
            ParsedEvent::FrameAttached {
                frame_id,
                parent_frame_id,
            } => on_frame_attached(state, frame_id, parent_frame_id.as_ref(), session_id),

            ParsedEvent::FrameNavigated { frame } => {
                on_frame_navigated(state, frame, session_id, signals);
            }

            ParsedEvent::NavigatedWithinDocument { frame_id, url } => {
                if let Some(frame) = state.tree.get_mut(frame_id) {
                    frame.on_navigated_within_document(url);
                    signals.push(FrameSignal::SameDocumentNavigation(frame_id.clone()));
                } else {
                    trace!(%frame_id, "Same-document navigation for unknown frame");
                }
            }

            ParsedEvent::FrameDetached { frame_id, reason } => match reason {
                DetachReason::Remove => remove_frames(state, frame_id, signals),
                DetachReason::Swap => {
                    debug!(%frame_id, "Frame swapped");
                    signals.push(FrameSignal::Swapped(frame_id.clone()));
                }
            },

            ParsedEvent::FrameStartedLoading { frame_id } => {
                if let Some(frame) = state.tree.get_mut(frame_id) {
                    frame.on_loading_started();
                }
            }

            ParsedEvent::FrameStoppedLoading { frame_id } => {
                if let Some(frame) = state.tree.get_mut(frame_id) {
                    frame.on_loading_stopped();
                }
            }

            ParsedEvent::LifecycleEvent {
                frame_id,
                loader_id,
                name,
            } => match state.tree.get_mut(frame_id) {
                Some(frame) => frame.on_lifecycle_event(loader_id, name),
                None => trace!(%frame_id, name, "Lifecycle event for unknown frame"),
            },

            ParsedEvent::ExecutionContextCreated { context } => {
                self.on_context_created(state, context, session_id);
            }

            ParsedEvent::ExecutionContextDestroyed { context_id } => {
                if let Some(binding) = state.contexts.remove(&(session_id.clone(), *context_id))
                    && let Some(frame) = state.tree.get(&binding.frame_id)
                {
                    frame.world(binding.world).clear(*context_id);
                }
            }

            ParsedEvent::ExecutionContextsCleared => {
                let cleared: Vec<_> = state
                    .contexts
                    .keys()
                    .filter(|(session, _)| session == session_id)
                    .cloned()
                    .collect();
                trace!(%session_id, count = cleared.len(), "Execution contexts cleared");
                for key in cleared {
                    if let Some(binding) = state.contexts.remove(&key)
                        && let Some(frame) = state.tree.get(&binding.frame_id)
                    {
                        frame.world(binding.world).clear(key.1);
                    }
                }
            }

            ParsedEvent::NetworkRequestWillBeSent { .. }
            | ParsedEvent::NetworkResponseReceived { .. }
            | ParsedEvent::NetworkLoadingFinished { .. }
            | ParsedEvent::NetworkLoadingFailed { .. } => {
                state.network.handle_event(event);
            }

            ParsedEvent::Unknown { method, .. } => {
                trace!(method, "Unhandled event");
            }
        }
    }

    fn on_context_created(
        &self,
        state: &mut ManagerState,
        context: &ContextPayload,
        session_id: &SessionId,
    ) {
        let Some(frame_id) = &context.aux_data.frame_id else {
            return;
        };
        let Some(frame) = state.tree.get(frame_id) else {
            trace!(%frame_id, context_id = %context.id, "Context for unknown frame");
            return;
        };
        if frame.session_id() != session_id {
            trace!(%frame_id, %session_id, "Context from a session no longer serving the frame");
            return;
        }

        let world = if context.aux_data.is_default {
            WorldKind::Main
        } else if context.name == self.inner.options.utility_world_name {
            WorldKind::Utility
        } else {
            trace!(%frame_id, name = %context.name, "Ignoring foreign isolated world");
            return;
        };

        frame.world(world).bind(ExecutionContext::new(
            context.id,
            frame_id.clone(),
            world,
            session_id.clone(),
            Arc::clone(&self.inner.session),
        ));
        state.contexts.insert(
            (session_id.clone(), context.id),
            ContextBinding {
                frame_id: frame_id.clone(),
                world,
            },
        );
    }
}

// ============================================================================
// Event Handlers
// ============================================================================

fn on_frame_attached(
    state: &mut ManagerState,
    frame_id: &FrameId,
    parent_id: Option<&FrameId>,
    session_id: &SessionId,
) {
    if let Some(frame) = state.tree.get_mut(frame_id)
        && frame.session_id() != session_id
    {
        debug!(%frame_id, from = %frame.session_id(), to = %session_id, "Frame moved to another session");
        frame.set_session(session_id.clone());
    }
    state
        .tree
        .attach(frame_id.clone(), parent_id.cloned(), session_id.clone());
}

fn on_frame_navigated(
    state: &mut ManagerState,
    frame: &FramePayload,
    session_id: &SessionId,
    signals: &mut Vec<FrameSignal>,
) {
    if !state.tree.contains(&frame.id) {
        if frame.parent_id.is_some() {
            trace!(frame_id = %frame.id, "Navigation of unknown child frame");
            return;
        }
        if let Some(previous) = state.tree.main_frame().cloned() {
            debug!(previous = %previous, frame_id = %frame.id, "Main frame replaced");
            signals.push(FrameSignal::Swapped(previous.clone()));
            remove_frames(state, &previous, signals);
        }
        state
            .tree
            .attach(frame.id.clone(), None, session_id.clone());
    }

    let removed = state.tree.detach_children(&frame.id);
    forget_frames(state, removed, signals);

    if let Some(target) = state.tree.get_mut(&frame.id) {
        target.on_navigated(frame);
        trace!(frame_id = %frame.id, url = target.url(), "Frame navigated");
    }
}

fn remove_frames(state: &mut ManagerState, frame_id: &FrameId, signals: &mut Vec<FrameSignal>) {
    let removed = state.tree.detach(frame_id);
    if removed.is_empty() {
        trace!(%frame_id, "Detach of unknown frame");
    }
    forget_frames(state, removed, signals);
}

/// Drops context bindings of removed frames and signals their detachment.
fn forget_frames(state: &mut ManagerState, removed: Vec<FrameId>, signals: &mut Vec<FrameSignal>) {
    if removed.is_empty() {
        return;
    }
    state
        .contexts
        .retain(|_, binding| !removed.contains(&binding.frame_id));
    state.network.forget_frames(&removed);
    signals.extend(removed.into_iter().map(FrameSignal::Detached));
}

/// Re-checks every registered watcher and publishes changed statuses.
fn update_watchers(state: &mut ManagerState, signals: &[FrameSignal]) {
    let ManagerState {
        tree,
        network,
        watchers,
        ..
    } = state;

    for entry in watchers.values_mut() {
        let mut changed = false;
        for signal in signals {
            changed |= entry.machine.on_signal(signal, tree);
        }
        changed |= entry.machine.check(tree, network.as_ref());
        if changed {
            entry.status.send_replace(entry.machine.status().clone());
        }
    }
}

/// Turns a frame tree snapshot into attach/navigate events, parents first.
fn flatten_frame_tree(payload: &FrameTreePayload, out: &mut Vec<ParsedEvent>) {
    let frame = &payload.frame;
    out.push(ParsedEvent::FrameAttached {
        frame_id: frame.id.clone(),
        parent_frame_id: frame.parent_id.clone(),
    });
    out.push(ParsedEvent::FrameNavigated {
        frame: frame.clone(),
    });
    for child in &payload.child_frames {
        flatten_frame_tree(child, out);
    }
}

// ============================================================================
// NavigationWatcher
// ============================================================================

impl FrameManager {
    /// Registers a watcher for `frame_id`.
    ///
    /// The watcher captures the frame's baseline now. A zero `timeout`
    /// disables the deadline.
    #[must_use]
    pub fn watch(
        &self,
        frame_id: &FrameId,
        wait_until: &[WaitUntil],
        timeout: Duration,
    ) -> NavigationWatcher {
        let id = self.inner.next_watcher_id.fetch_add(1, Ordering::Relaxed);

        let mut state = self.inner.state.lock();
        let ManagerState {
            tree,
            network,
            watchers,
            ..
        } = &mut *state;

        let mut machine = LifecycleWatcher::new(frame_id.clone(), wait_until, tree);
        machine.check(tree, network.as_ref());
        let (status, rx) = watch::channel(machine.status().clone());
        watchers.insert(id, WatcherEntry { machine, status });

        trace!(%frame_id, watcher = id, timeout_ms = timeout.as_millis() as u64, "Watcher registered");

        NavigationWatcher {
            id,
            frame_id: frame_id.clone(),
            manager: Arc::downgrade(&self.inner),
            status: rx,
            timeout,
            deadline: (!timeout.is_zero()).then(|| Instant::now() + timeout),
            disposed: false,
        }
    }
}

/// Caller-side handle to a registered watcher.
///
/// Unregisters itself on drop, so abandoning a navigation future releases
/// the watcher.
#[derive(Debug)]
pub struct NavigationWatcher {
    id: WatcherId,
    frame_id: FrameId,
    manager: Weak<ManagerInner>,
    status: watch::Receiver<WatchStatus>,
    timeout: Duration,
    deadline: Option<Instant>,
    disposed: bool,
}

impl NavigationWatcher {
    /// Returns the watched frame.
    #[inline]
    #[must_use]
    pub fn frame_id(&self) -> &FrameId {
        &self.frame_id
    }

    /// Returns the latest published status.
    #[must_use]
    pub fn status(&self) -> WatchStatus {
        self.status.borrow().clone()
    }

    /// Waits until `mode` settles or the deadline elapses.
    ///
    /// # Errors
    ///
    /// - [`Error::NavigationTimeout`] if the deadline elapsed
    /// - [`Error::NavigationTermination`] if the frame detached or swapped
    /// - [`Error::ConnectionClosed`] if the manager was dropped
    pub async fn wait(&mut self, mode: WaitMode) -> Result<Option<HttpResponse>> {
        let timeout_ms = self.timeout.as_millis() as u64;
        let deadline = self.deadline;
        let settled = async {
            self.status
                .wait_for(|status| status.is_settled(mode))
                .await
                .map(|status| status.clone())
        };

        let result = match deadline {
            Some(deadline) => timeout_at(deadline, settled)
                .await
                .map_err(|_| Error::navigation_timeout(timeout_ms))?,
            None => settled.await,
        };

        let status = result.map_err(|_| Error::ConnectionClosed)?;
        status.into_outcome(mode, &self.frame_id)
    }

    /// Waits for termination or timeout and returns the error.
    pub async fn terminated(&mut self) -> Error {
        match self.wait(WaitMode::Termination).await {
            Err(e) => e,
            Ok(_) => Error::protocol("watcher settled without terminating"),
        }
    }

    /// Unregisters the watcher. Idempotent.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        if let Some(inner) = self.manager.upgrade() {
            inner.state.lock().watchers.remove(&self.id);
            trace!(frame_id = %self.frame_id, watcher = self.id, "Watcher disposed");
        }
    }
}

impl Drop for NavigationWatcher {
    fn drop(&mut self) {
        self.dispose();
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    use crate::testing::{
        attached, context_created, context_destroyed, contexts_cleared, detached, lifecycle,
        manager, navigated, request_sent, within_document,
    };

    fn id(s: &str) -> FrameId {
        FrameId::new(s)
    }

    fn check(manager: &FrameManager) {
        let state = manager.inner.state.lock();
        if let Err(violation) = state.tree.check_invariants() {
            panic!("tree invariant broken: {violation}");
        }
    }

    #[tokio::test]
    async fn test_attach_and_detach_frames() {
        let (manager, _session, _sent) = manager();
        for event in [
            navigated("root", None, "https://a.test/"),
            attached("a", Some("root")),
            attached("b", Some("a")),
        ] {
            manager.handle_event(&event);
            check(&manager);
        }

        let main = manager.main_frame().expect("main frame");
        assert_eq!(main.id(), &id("root"));
        assert_eq!(manager.frames().len(), 3);

        manager.handle_event(&detached("a", "remove"));
        check(&manager);
        assert_eq!(manager.frames().len(), 1);
        assert!(manager.frame(&id("b")).is_none());
    }

    #[tokio::test]
    async fn test_navigation_drops_old_children() {
        let (manager, _session, _sent) = manager();
        manager.handle_event(&navigated("root", None, "https://a.test/"));
        manager.handle_event(&attached("child", Some("root")));
        manager.handle_event(&navigated("root", None, "https://b.test/"));

        let main = manager.main_frame().expect("main");
        assert_eq!(main.url().as_deref(), Some("https://b.test/"));
        assert!(main.child_frames().is_empty());
        check(&manager);
    }

    #[tokio::test]
    async fn test_events_for_unknown_frames_are_ignored() {
        let (manager, _session, _sent) = manager();
        manager.handle_event(&navigated("root", None, "https://a.test/"));
        manager.handle_event(&lifecycle("ghost", "L1", "init"));
        manager.handle_event(&navigated("ghost-child", Some("root"), "https://x.test/"));
        manager.handle_event(&within_document("ghost", "https://a.test/#x"));
        manager.handle_event(&detached("ghost", "remove"));

        assert_eq!(manager.frames().len(), 1);
    }

    #[tokio::test]
    async fn test_detached_frame_is_not_revived() {
        let (manager, _session, _sent) = manager();
        manager.handle_event(&navigated("root", None, "https://a.test/"));
        manager.handle_event(&attached("a", Some("root")));
        let frame = manager.frame(&id("a")).expect("a");

        manager.handle_event(&detached("a", "remove"));
        manager.handle_event(&lifecycle("a", "L1", "init"));
        manager.handle_event(&navigated("a", Some("root"), "https://x.test/"));

        assert!(frame.is_detached());
        assert!(manager.frame(&id("a")).is_none());
    }

    #[tokio::test]
    async fn test_contexts_bind_to_worlds() {
        let (manager, _session, _sent) = manager();
        manager.handle_event(&navigated("root", None, "https://a.test/"));
        manager.handle_event(&context_created(1, "root", true, ""));
        manager.handle_event(&context_created(2, "root", false, "__frame_mirror_utility__"));
        manager.handle_event(&context_created(3, "root", false, "some-extension"));

        let main = manager.main_frame().expect("main");
        let main_ctx = main.main_world().expect("world").execution_context().await.expect("ctx");
        let util_ctx = main.utility_world().expect("world").execution_context().await.expect("ctx");
        assert_eq!(main_ctx.id(), ExecutionContextId::new(1));
        assert_eq!(util_ctx.id(), ExecutionContextId::new(2));

        manager.handle_event(&context_destroyed(1));
        assert!(!main.main_world().expect("world").has_context());
        assert!(main.utility_world().expect("world").has_context());
    }

    #[tokio::test]
    async fn test_contexts_cleared_empties_session_group() {
        let (manager, _session, _sent) = manager();
        manager.handle_event(&navigated("root", None, "https://a.test/"));
        manager.handle_event(&attached("oop", Some("root")));
        manager.handle_event(&attached("oop", Some("root")).with_session(SessionId::new("S2")));
        manager.handle_event(&context_created(1, "root", true, ""));
        manager.handle_event(&context_created(2, "root", false, "__frame_mirror_utility__"));
        manager.handle_event(&context_created(1, "oop", true, "").with_session(SessionId::new("S2")));

        manager.handle_event(&contexts_cleared());

        let root = manager.frame(&id("root")).expect("root");
        let oop = manager.frame(&id("oop")).expect("oop");
        assert!(!root.main_world().expect("world").has_context());
        assert!(!root.utility_world().expect("world").has_context());
        assert!(oop.main_world().expect("world").has_context());
    }

    #[tokio::test]
    async fn test_session_promotion() {
        let (manager, _session, _sent) = manager();
        manager.handle_event(&navigated("root", None, "https://a.test/"));
        manager.handle_event(&attached("child", Some("root")));
        let child = manager.frame(&id("child")).expect("child");
        assert_eq!(child.is_oop_frame(), Some(false));

        manager.handle_event(&attached("child", Some("root")).with_session(SessionId::new("S9")));
        assert_eq!(child.is_oop_frame(), Some(true));
        assert_eq!(child.session_id(), Some(SessionId::new("S9")));
        assert_eq!(manager.frames().len(), 2);
        check(&manager);
    }

    #[tokio::test]
    async fn test_context_from_stale_session_ignored() {
        let (manager, _session, _sent) = manager();
        manager.handle_event(&navigated("root", None, "https://a.test/"));
        manager.handle_event(&attached("child", Some("root")));
        manager.handle_event(&attached("child", Some("root")).with_session(SessionId::new("S9")));
        manager.handle_event(&context_created(4, "child", true, ""));

        let child = manager.frame(&id("child")).expect("child");
        assert!(!child.main_world().expect("world").has_context());
    }

    #[tokio::test]
    async fn test_initialize_mirrors_frame_tree() {
        let (manager, session, _sent) = manager();
        session.respond(
            "Page.getFrameTree",
            json!({
                "frameTree": {
                    "frame": { "id": "root", "loaderId": "L0", "url": "https://a.test/" },
                    "childFrames": [
                        { "frame": { "id": "c1", "parentId": "root", "url": "https://b.test/", "name": "ad" } }
                    ]
                }
            }),
        );

        manager.initialize().await.expect("initialize");

        assert_eq!(
            session.sent_methods(),
            [
                "Page.enable",
                "Page.getFrameTree",
                "Page.setLifecycleEventsEnabled",
                "Runtime.enable",
                "Page.addScriptToEvaluateOnNewDocument",
                "Page.createIsolatedWorld",
                "Page.createIsolatedWorld",
            ]
        );
        let child = manager.frame(&id("c1")).expect("child");
        assert_eq!(child.name().as_deref(), Some("ad"));
        assert_eq!(child.parent_frame().map(|f| f.id().clone()), Some(id("root")));
        check(&manager);
    }

    #[tokio::test]
    async fn test_initialize_without_lifecycle_events() {
        let (session, _sent) = crate::testing::MockSession::new();
        let manager = FrameManager::new(
            session.clone(),
            ManagerOptions::new().without_lifecycle_events(),
        );
        manager.initialize().await.expect("initialize");
        assert!(
            !session
                .sent_methods()
                .iter()
                .any(|m| m == "Page.setLifecycleEventsEnabled")
        );
    }

    #[tokio::test]
    async fn test_swap_terminates_watcher() {
        let (manager, _session, _sent) = manager();
        manager.handle_event(&navigated("root", None, "https://a.test/"));
        manager.handle_event(&attached("a", Some("root")));

        let mut watcher = manager.watch(&id("a"), &[], Duration::ZERO);
        manager.handle_event(&detached("a", "swap"));

        let err = watcher.wait(WaitMode::Either).await.unwrap_err();
        assert_eq!(err.to_string(), "Navigating frame a was swapped");
        assert!(manager.frame(&id("a")).is_some());
    }

    #[tokio::test]
    async fn test_main_frame_replacement_terminates_old_watchers() {
        let (manager, _session, _sent) = manager();
        manager.handle_event(&navigated("old", None, "https://a.test/"));
        let mut watcher = manager.watch(&id("old"), &[], Duration::ZERO);

        manager.handle_event(&navigated("new", None, "https://b.test/"));
        assert_eq!(manager.main_frame().map(|f| f.id().clone()), Some(id("new")));
        assert!(watcher.wait(WaitMode::Either).await.unwrap_err().is_navigation_error());
        check(&manager);
    }

    #[tokio::test]
    async fn test_removed_frame_requests_do_not_block_idle() {
        let (manager, _session, _sent) = manager();
        manager.handle_event(&navigated("root", None, "https://a.test/"));
        manager.handle_event(&attached("ad", Some("root")));
        manager.handle_event(&request_sent("r1", "C1", "ad"));

        let watcher = manager.watch(
            &id("root"),
            &[WaitUntil::Load, WaitUntil::NetworkIdle0],
            Duration::ZERO,
        );
        manager.handle_event(&lifecycle("root", "L1", "init"));
        manager.handle_event(&lifecycle("root", "L1", "load"));
        assert!(!watcher.status().lifecycle);

        manager.handle_event(&detached("ad", "remove"));
        assert!(watcher.status().lifecycle);
    }

    #[tokio::test]
    async fn test_watcher_dispose_is_idempotent_and_on_drop() {
        let (manager, _session, _sent) = manager();
        manager.handle_event(&navigated("root", None, "https://a.test/"));

        let mut first = manager.watch(&id("root"), &[], Duration::ZERO);
        let second = manager.watch(&id("root"), &[], Duration::ZERO);
        assert_eq!(manager.watcher_count(), 2);

        first.dispose();
        first.dispose();
        assert_eq!(manager.watcher_count(), 1);

        drop(second);
        assert_eq!(manager.watcher_count(), 0);
    }

    #[tokio::test]
    async fn test_stream_end_fails_waiters() {
        let (manager, _session, _sent) = manager();
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let task = manager.run(rx);

        tx.send(navigated("root", None, "https://a.test/")).expect("send");
        tokio::task::yield_now().await;
        let mut watcher = manager.watch(&id("root"), &[], Duration::ZERO);

        drop(tx);
        task.await.expect("join");

        let err = watcher.wait(WaitMode::NewDocument).await.unwrap_err();
        assert!(matches!(err, Error::NavigationTermination { .. }));
        assert!(manager.main_frame().is_none());
    }
}

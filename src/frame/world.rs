//! Isolated worlds and execution contexts.
//!
//! Every frame runs script in two worlds:
//!
//! | World | Used for |
//! |-------|----------|
//! | [`WorldKind::Main`] | Caller evaluation; handles returned to the caller |
//! | [`WorldKind::Utility`] | Internal helpers (content get/set) invisible to page script |
//!
//! Each [`IsolatedWorld`] holds at most one live [`ExecutionContext`]. The
//! context is swapped by the frame manager whenever the remote side creates,
//! destroys or clears contexts. Callers that ask for a context while none is
//! live are suspended until one arrives, or fail once the frame detaches.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::sync::watch;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::identifiers::{ExecutionContextId, FrameId, RemoteObjectId, SessionId};
use crate::protocol::{CallArgument, Command, DomCommand, RuntimeCommand};
use crate::transport::SharedSession;

// ============================================================================
// WorldKind
// ============================================================================

/// Which of a frame's two script worlds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WorldKind {
    /// The page's own script realm.
    Main,
    /// Private realm for internal evaluation.
    Utility,
}

impl WorldKind {
    /// Both kinds, in a fixed order.
    pub const ALL: [WorldKind; 2] = [WorldKind::Main, WorldKind::Utility];

    /// Returns a lowercase name for logging.
    #[inline]
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::Utility => "utility",
        }
    }
}

impl fmt::Display for WorldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// RemoteObject
// ============================================================================

/// Mirror of a remote value as returned by the runtime.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteObject {
    /// JavaScript type (`object`, `string`, `number`, ...).
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Object subtype (`node`, `array`, `null`, ...).
    #[serde(default)]
    pub subtype: Option<String>,
    /// Constructor name.
    #[serde(default)]
    pub class_name: Option<String>,
    /// JSON value for primitives and by-value results.
    #[serde(default)]
    pub value: Option<Value>,
    /// Non-JSON primitive literal (`NaN`, `-0`, `Infinity`, `1n`).
    #[serde(default)]
    pub unserializable_value: Option<String>,
    /// String representation.
    #[serde(default)]
    pub description: Option<String>,
    /// Handle for non-primitive values.
    #[serde(default)]
    pub object_id: Option<RemoteObjectId>,
}

impl RemoteObject {
    /// Decodes the object into a JSON value.
    ///
    /// Unserializable numbers other than `-0` are returned as their literal
    /// string, since JSON cannot carry them.
    #[must_use]
    pub fn to_value(&self) -> Value {
        if let Some(literal) = &self.unserializable_value {
            return match literal.as_str() {
                "-0" => json!(-0.0),
                other => Value::String(other.to_string()),
            };
        }
        if self.kind == "undefined" {
            return Value::Null;
        }
        self.value.clone().unwrap_or(Value::Null)
    }
}

// ============================================================================
// EvalArg
// ============================================================================

/// Argument passed to an evaluated function.
#[derive(Debug, Clone)]
pub enum EvalArg {
    /// A JSON-serializable value.
    Value(Value),
    /// A handle living in the same execution context.
    Handle(JsHandle),
}

impl From<Value> for EvalArg {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<JsHandle> for EvalArg {
    fn from(handle: JsHandle) -> Self {
        Self::Handle(handle)
    }
}

impl From<&JsHandle> for EvalArg {
    fn from(handle: &JsHandle) -> Self {
        Self::Handle(handle.clone())
    }
}

// ============================================================================
// ExecutionContext
// ============================================================================

/// One script-evaluation sandbox of a frame.
///
/// Immutable once created. It stays usable until the remote side destroys it;
/// calls against a destroyed context fail remotely.
#[derive(Clone)]
pub struct ExecutionContext {
    inner: Arc<ContextInner>,
}

struct ContextInner {
    id: ExecutionContextId,
    frame_id: FrameId,
    world: WorldKind,
    session_id: SessionId,
    session: SharedSession,
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("id", &self.inner.id)
            .field("frame_id", &self.inner.frame_id)
            .field("world", &self.inner.world)
            .field("session_id", &self.inner.session_id)
            .finish_non_exhaustive()
    }
}

impl ExecutionContext {
    /// Creates a context record.
    pub(crate) fn new(
        id: ExecutionContextId,
        frame_id: FrameId,
        world: WorldKind,
        session_id: SessionId,
        session: SharedSession,
    ) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                id,
                frame_id,
                world,
                session_id,
                session,
            }),
        }
    }

    /// Returns the remote context ID.
    #[inline]
    #[must_use]
    pub fn id(&self) -> ExecutionContextId {
        self.inner.id
    }

    /// Returns the owning frame.
    #[inline]
    #[must_use]
    pub fn frame_id(&self) -> &FrameId {
        &self.inner.frame_id
    }

    /// Returns the world this context was created for.
    #[inline]
    #[must_use]
    pub fn world(&self) -> WorldKind {
        self.inner.world
    }

    /// Returns the session the context lives in.
    #[inline]
    #[must_use]
    pub fn session_id(&self) -> &SessionId {
        &self.inner.session_id
    }

    /// Returns `true` if both refer to the same remote context.
    #[inline]
    #[must_use]
    pub fn same_context(&self, other: &ExecutionContext) -> bool {
        self.inner.id == other.inner.id && self.inner.session_id == other.inner.session_id
    }

    /// Evaluates a function declaration and returns its JSON result.
    ///
    /// # Errors
    ///
    /// - [`Error::ScriptError`] if the function throws
    /// - [`Error::InvalidArgument`] if a handle argument belongs to another context
    pub async fn evaluate(&self, function: &str, args: Vec<EvalArg>) -> Result<Value> {
        let object = self.call_function(function, args, true).await?;
        Ok(object.to_value())
    }

    /// Evaluates a function declaration and returns a handle to its result.
    ///
    /// # Errors
    ///
    /// Same as [`evaluate`](Self::evaluate).
    pub async fn evaluate_handle(&self, function: &str, args: Vec<EvalArg>) -> Result<JsHandle> {
        let object = self.call_function(function, args, false).await?;
        Ok(JsHandle::new(object, self.clone()))
    }

    /// Sends a command on this context's session.
    pub(crate) async fn send(&self, command: Command) -> Result<Value> {
        self.inner.session.send(&self.inner.session_id, command).await
    }

    async fn call_function(
        &self,
        function: &str,
        args: Vec<EvalArg>,
        return_by_value: bool,
    ) -> Result<RemoteObject> {
        let arguments = args
            .into_iter()
            .map(|arg| self.to_call_argument(arg))
            .collect::<Result<Vec<_>>>()?;

        trace!(
            context_id = %self.inner.id,
            frame_id = %self.inner.frame_id,
            world = %self.inner.world,
            args = arguments.len(),
            "Calling function"
        );

        let command = Command::Runtime(RuntimeCommand::CallFunctionOn {
            function_declaration: function.to_string(),
            execution_context_id: self.inner.id,
            arguments,
            return_by_value,
            await_promise: true,
            user_gesture: true,
        });

        let result = self.send(command).await?;

        if let Some(details) = result.get("exceptionDetails") {
            return Err(Error::script_error(describe_exception(details)));
        }

        match result.get("result") {
            Some(object) => Ok(serde_json::from_value(object.clone())?),
            None => Ok(RemoteObject {
                kind: "undefined".to_string(),
                ..Default::default()
            }),
        }
    }

    fn to_call_argument(&self, arg: EvalArg) -> Result<CallArgument> {
        match arg {
            EvalArg::Value(value) => Ok(CallArgument::value(value)),
            EvalArg::Handle(handle) => {
                if !handle.context.same_context(self) {
                    return Err(Error::invalid_argument(
                        "JS handles can only be passed to the context they were created in",
                    ));
                }
                let object = handle.object;
                Ok(match (object.object_id, object.unserializable_value) {
                    (Some(object_id), _) => CallArgument::object(object_id),
                    (None, Some(literal)) => CallArgument {
                        unserializable_value: Some(literal),
                        ..Default::default()
                    },
                    (None, None) => CallArgument::value(object.value.unwrap_or(Value::Null)),
                })
            }
        }
    }
}

/// Builds a one-line message from runtime exception details.
fn describe_exception(details: &Value) -> String {
    details
        .get("exception")
        .and_then(|e| e.get("description"))
        .and_then(Value::as_str)
        .or_else(|| details.get("text").and_then(Value::as_str))
        .unwrap_or("Evaluation failed")
        .to_string()
}

// ============================================================================
// JsHandle
// ============================================================================

/// Handle to a value living in a remote execution context.
#[derive(Debug, Clone)]
pub struct JsHandle {
    object: RemoteObject,
    context: ExecutionContext,
}

impl JsHandle {
    pub(crate) fn new(object: RemoteObject, context: ExecutionContext) -> Self {
        Self { object, context }
    }

    /// Returns the remote object ID (absent for primitives).
    #[inline]
    #[must_use]
    pub fn object_id(&self) -> Option<&RemoteObjectId> {
        self.object.object_id.as_ref()
    }

    /// Returns the remote object description.
    #[inline]
    #[must_use]
    pub fn remote_object(&self) -> &RemoteObject {
        &self.object
    }

    /// Returns the context the handle belongs to.
    #[inline]
    #[must_use]
    pub fn execution_context(&self) -> &ExecutionContext {
        &self.context
    }

    /// Returns `true` if the handle points to a DOM node.
    #[inline]
    #[must_use]
    pub fn is_element(&self) -> bool {
        self.object.subtype.as_deref() == Some("node")
    }

    /// Serializes the referenced value to JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ScriptError`] for values that cannot be serialized.
    pub async fn json_value(&self) -> Result<Value> {
        if self.object.object_id.is_none() {
            return Ok(self.object.to_value());
        }
        self.context
            .evaluate("(value) => value", vec![EvalArg::Handle(self.clone())])
            .await
    }

    /// Evaluates a function with this handle as its first argument.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ScriptError`] if the function throws.
    pub async fn evaluate(&self, function: &str, mut args: Vec<EvalArg>) -> Result<Value> {
        args.insert(0, EvalArg::Handle(self.clone()));
        self.context.evaluate(function, args).await
    }

    /// Releases the remote object.
    ///
    /// Release failures (context already gone) are logged and ignored.
    pub async fn dispose(self) -> Result<()> {
        if let Some(object_id) = self.object.object_id {
            let command = Command::Runtime(RuntimeCommand::ReleaseObject {
                object_id: object_id.clone(),
            });
            if let Err(e) = self.context.send(command).await {
                debug!(%object_id, error = %e, "Failed to release object");
            }
        }
        Ok(())
    }
}

// ============================================================================
// IsolatedWorld
// ============================================================================

/// Availability of a world's execution context.
#[derive(Debug, Clone)]
enum WorldState {
    /// No live context; callers wait.
    Pending,
    /// Context available.
    Live(ExecutionContext),
    /// Owning frame detached; callers fail.
    Detached,
}

/// Owns the live execution context for one (frame, world) pair.
#[derive(Clone)]
pub struct IsolatedWorld {
    inner: Arc<WorldInner>,
}

struct WorldInner {
    frame_id: FrameId,
    kind: WorldKind,
    state: watch::Sender<WorldState>,
}

impl fmt::Debug for IsolatedWorld {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IsolatedWorld")
            .field("frame_id", &self.inner.frame_id)
            .field("kind", &self.inner.kind)
            .field("state", &*self.inner.state.borrow())
            .finish()
    }
}

impl IsolatedWorld {
    /// Creates a world with no context.
    pub(crate) fn new(frame_id: FrameId, kind: WorldKind) -> Self {
        let (state, _) = watch::channel(WorldState::Pending);
        Self {
            inner: Arc::new(WorldInner {
                frame_id,
                kind,
                state,
            }),
        }
    }

    /// Returns the world kind.
    #[inline]
    #[must_use]
    pub fn kind(&self) -> WorldKind {
        self.inner.kind
    }

    /// Returns the owning frame ID.
    #[inline]
    #[must_use]
    pub fn frame_id(&self) -> &FrameId {
        &self.inner.frame_id
    }

    /// Returns `true` if a context is live right now.
    #[must_use]
    pub fn has_context(&self) -> bool {
        matches!(*self.inner.state.borrow(), WorldState::Live(_))
    }

    /// Returns `true` once the owning frame detached.
    #[must_use]
    pub fn is_detached(&self) -> bool {
        matches!(*self.inner.state.borrow(), WorldState::Detached)
    }

    /// Installs a new live context, replacing any previous one.
    ///
    /// The previous context is not destroyed remotely and evaluations already
    /// running against it complete on their own.
    pub(crate) fn bind(&self, context: ExecutionContext) {
        self.inner.state.send_if_modified(|state| {
            if matches!(state, WorldState::Detached) {
                return false;
            }
            trace!(
                frame_id = %self.inner.frame_id,
                world = %self.inner.kind,
                context_id = %context.id(),
                "Context bound"
            );
            *state = WorldState::Live(context);
            true
        });
    }

    /// Drops the live context if it is `context_id`. Returns `true` if cleared.
    pub(crate) fn clear(&self, context_id: ExecutionContextId) -> bool {
        self.inner.state.send_if_modified(|state| match state {
            WorldState::Live(ctx) if ctx.id() == context_id => {
                *state = WorldState::Pending;
                true
            }
            _ => false,
        })
    }

    /// Permanently clears the world. Pending and future waits fail.
    pub(crate) fn detach(&self) {
        self.inner.state.send_replace(WorldState::Detached);
    }

    /// Returns the live context, waiting for one if necessary.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ContextUnavailable`] once the owning frame detaches.
    pub async fn execution_context(&self) -> Result<ExecutionContext> {
        let mut rx = self.inner.state.subscribe();
        let state = rx
            .wait_for(|state| !matches!(state, WorldState::Pending))
            .await
            .map(|state| state.clone())
            .map_err(|_| self.unavailable())?;

        match state {
            WorldState::Live(context) => Ok(context),
            _ => Err(self.unavailable()),
        }
    }

    /// Evaluates a function declaration in this world.
    ///
    /// # Errors
    ///
    /// See [`execution_context`](Self::execution_context) and
    /// [`ExecutionContext::evaluate`].
    pub async fn evaluate(&self, function: &str, args: Vec<EvalArg>) -> Result<Value> {
        self.execution_context()
            .await?
            .evaluate(function, args)
            .await
    }

    /// Evaluates a function declaration in this world and returns a handle.
    ///
    /// # Errors
    ///
    /// See [`evaluate`](Self::evaluate).
    pub async fn evaluate_handle(&self, function: &str, args: Vec<EvalArg>) -> Result<JsHandle> {
        self.execution_context()
            .await?
            .evaluate_handle(function, args)
            .await
    }

    /// Re-resolves a DOM handle from another world into this one.
    ///
    /// Both worlds address the same DOM, so the node is looked up by its
    /// backend ID instead of being queried again.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] if the handle is not a DOM node
    /// - [`Error::Protocol`] if the node no longer exists
    pub async fn adopt_handle(&self, handle: &JsHandle) -> Result<JsHandle> {
        let context = self.execution_context().await?;
        if handle.context.same_context(&context) {
            return Ok(handle.clone());
        }

        let object_id = handle
            .object_id()
            .filter(|_| handle.is_element())
            .cloned()
            .ok_or_else(|| Error::invalid_argument("only DOM node handles can be adopted"))?;

        let description = handle
            .context
            .send(Command::Dom(DomCommand::DescribeNode { object_id }))
            .await?;
        let backend_node_id = description
            .get("node")
            .and_then(|n| n.get("backendNodeId"))
            .and_then(Value::as_i64)
            .ok_or_else(|| Error::protocol("No backendNodeId in DOM.describeNode result"))?;

        let resolved = context
            .send(Command::Dom(DomCommand::ResolveNode {
                backend_node_id,
                execution_context_id: context.id(),
            }))
            .await?;
        let object: RemoteObject =
            serde_json::from_value(resolved.get("object").cloned().unwrap_or(Value::Null))?;

        debug!(
            frame_id = %self.inner.frame_id,
            world = %self.inner.kind,
            backend_node_id,
            "Adopted handle"
        );
        Ok(JsHandle::new(object, context))
    }

    fn unavailable(&self) -> Error {
        Error::context_unavailable(self.inner.frame_id.clone(), self.inner.kind)
    }
}

// ============================================================================
// Worlds
// ============================================================================

/// The pair of worlds owned by a frame, addressed by [`WorldKind`].
#[derive(Debug, Clone)]
pub(crate) struct Worlds {
    main: IsolatedWorld,
    utility: IsolatedWorld,
}

impl Worlds {
    pub(crate) fn new(frame_id: &FrameId) -> Self {
        Self {
            main: IsolatedWorld::new(frame_id.clone(), WorldKind::Main),
            utility: IsolatedWorld::new(frame_id.clone(), WorldKind::Utility),
        }
    }

    #[inline]
    pub(crate) fn get(&self, kind: WorldKind) -> &IsolatedWorld {
        match kind {
            WorldKind::Main => &self.main,
            WorldKind::Utility => &self.utility,
        }
    }

    pub(crate) fn detach(&self) {
        for kind in WorldKind::ALL {
            self.get(kind).detach();
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use crate::testing::MockSession;

    fn context(id: i64, session: &Arc<MockSession>) -> ExecutionContext {
        ExecutionContext::new(
            ExecutionContextId::new(id),
            FrameId::new("F1"),
            WorldKind::Main,
            SessionId::root(),
            session.clone(),
        )
    }

    #[test]
    fn test_world_kind_display() {
        assert_eq!(WorldKind::Main.to_string(), "main");
        assert_eq!(WorldKind::Utility.to_string(), "utility");
    }

    #[test]
    fn test_remote_object_decoding() {
        let object: RemoteObject =
            serde_json::from_value(json!({ "type": "number", "unserializableValue": "NaN" }))
                .expect("parse");
        assert_eq!(object.to_value(), json!("NaN"));

        let undefined: RemoteObject =
            serde_json::from_value(json!({ "type": "undefined" })).expect("parse");
        assert_eq!(undefined.to_value(), Value::Null);

        let structured: RemoteObject = serde_json::from_value(
            json!({ "type": "object", "value": { "a": [1, 2] } }),
        )
        .expect("parse");
        assert_eq!(structured.to_value(), json!({ "a": [1, 2] }));
    }

    #[tokio::test]
    async fn test_execution_context_waits_for_bind() {
        let (session, _sent) = MockSession::new();
        let world = IsolatedWorld::new(FrameId::new("F1"), WorldKind::Main);

        let waiter = {
            let world = world.clone();
            tokio::spawn(async move { world.execution_context().await })
        };
        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        world.bind(context(1, &session));
        let ctx = waiter.await.expect("join").expect("context");
        assert_eq!(ctx.id(), ExecutionContextId::new(1));
        assert!(world.has_context());
    }

    #[tokio::test]
    async fn test_clear_only_matching_context() {
        let (session, _sent) = MockSession::new();
        let world = IsolatedWorld::new(FrameId::new("F1"), WorldKind::Main);
        world.bind(context(1, &session));

        assert!(!world.clear(ExecutionContextId::new(2)));
        assert!(world.has_context());
        assert!(world.clear(ExecutionContextId::new(1)));
        assert!(!world.has_context());
    }

    #[tokio::test]
    async fn test_detach_fails_waiters_and_ignores_rebind() {
        let (session, _sent) = MockSession::new();
        let world = IsolatedWorld::new(FrameId::new("F1"), WorldKind::Utility);

        let waiter = {
            let world = world.clone();
            tokio::spawn(async move { world.execution_context().await })
        };
        tokio::task::yield_now().await;

        world.detach();
        let err = waiter.await.expect("join").unwrap_err();
        assert!(matches!(
            err,
            Error::ContextUnavailable {
                world: WorldKind::Utility,
                ..
            }
        ));

        world.bind(context(5, &session));
        assert!(!world.has_context());
        assert!(world.is_detached());
    }

    #[tokio::test]
    async fn test_evaluate_decodes_result() {
        let (session, _sent) = MockSession::new();
        session.respond(
            "Runtime.callFunctionOn",
            json!({ "result": { "type": "object", "value": { "answer": 42 } } }),
        );
        let ctx = context(3, &session);

        let value = ctx
            .evaluate("(x) => ({ answer: x })", vec![json!(42).into()])
            .await
            .expect("evaluate");
        assert_eq!(value, json!({ "answer": 42 }));

        let commands = session.sent_commands();
        let (_, Command::Runtime(RuntimeCommand::CallFunctionOn {
            execution_context_id,
            return_by_value,
            arguments,
            ..
        })) = &commands[0]
        else {
            panic!("expected Runtime.callFunctionOn");
        };
        assert_eq!(*execution_context_id, ExecutionContextId::new(3));
        assert!(*return_by_value);
        assert_eq!(arguments[0], CallArgument::value(json!(42)));
    }

    #[tokio::test]
    async fn test_evaluate_surfaces_exception() {
        let (session, _sent) = MockSession::new();
        session.respond(
            "Runtime.callFunctionOn",
            json!({
                "result": { "type": "object", "subtype": "error" },
                "exceptionDetails": {
                    "text": "Uncaught",
                    "exception": { "description": "Error: boom" }
                }
            }),
        );

        let err = context(1, &session)
            .evaluate("() => { throw new Error('boom') }", vec![])
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Script error: Error: boom");
    }

    #[tokio::test]
    async fn test_handle_from_other_context_rejected() {
        let (session, _sent) = MockSession::new();
        let handle = JsHandle::new(
            RemoteObject {
                kind: "object".into(),
                object_id: Some(RemoteObjectId::new("o1")),
                ..Default::default()
            },
            context(1, &session),
        );

        let err = context(2, &session)
            .evaluate("(h) => h", vec![handle.into()])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }));
        assert!(session.sent_commands().is_empty());
    }

    #[tokio::test]
    async fn test_adopt_handle_resolves_backend_node() {
        let (session, _sent) = MockSession::new();
        session.respond("DOM.describeNode", json!({ "node": { "backendNodeId": 77 } }));
        session.respond(
            "DOM.resolveNode",
            json!({ "object": { "type": "object", "subtype": "node", "objectId": "main-obj" } }),
        );

        let utility_ctx = ExecutionContext::new(
            ExecutionContextId::new(9),
            FrameId::new("F1"),
            WorldKind::Utility,
            SessionId::root(),
            session.clone(),
        );
        let handle = JsHandle::new(
            RemoteObject {
                kind: "object".into(),
                subtype: Some("node".into()),
                object_id: Some(RemoteObjectId::new("util-obj")),
                ..Default::default()
            },
            utility_ctx,
        );

        let main = IsolatedWorld::new(FrameId::new("F1"), WorldKind::Main);
        main.bind(context(1, &session));

        let adopted = tokio::time::timeout(Duration::from_secs(1), main.adopt_handle(&handle))
            .await
            .expect("no hang")
            .expect("adopt");
        assert_eq!(adopted.object_id().map(RemoteObjectId::as_str), Some("main-obj"));
        assert_eq!(adopted.execution_context().world(), WorldKind::Main);

        let methods = session.sent_methods();
        assert_eq!(methods, ["DOM.describeNode", "DOM.resolveNode"]);
    }
}

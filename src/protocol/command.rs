//! Command definitions organized by domain.
//!
//! Commands follow `Domain.methodName` format.
//!
//! # Command Domains
//!
//! | Domain | Commands |
//! |--------|----------|
//! | `Page` | Frame tree, lifecycle events, navigation, isolated worlds |
//! | `Runtime` | Execution contexts, function calls, object release |
//! | `DOM` | Node description and resolution (handle adoption) |

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::identifiers::{ExecutionContextId, FrameId, RemoteObjectId};

// ============================================================================
// Command Wrapper
// ============================================================================

/// All protocol commands organized by domain.
///
/// This enum wraps domain-specific command enums for unified serialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Command {
    /// Page domain commands.
    Page(PageCommand),
    /// Runtime domain commands.
    Runtime(RuntimeCommand),
    /// DOM domain commands.
    Dom(DomCommand),
}

impl Command {
    /// Returns the `Domain.methodName` of this command.
    #[must_use]
    pub fn method(&self) -> String {
        serde_json::to_value(self)
            .ok()
            .and_then(|v| v.get("method").and_then(Value::as_str).map(str::to_string))
            .unwrap_or_default()
    }
}

// ============================================================================
// Page Commands
// ============================================================================

/// Page domain commands for frames and navigation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", content = "params")]
pub enum PageCommand {
    /// Enable page domain notifications.
    #[serde(rename = "Page.enable")]
    Enable {},

    /// Get the current frame tree.
    #[serde(rename = "Page.getFrameTree")]
    GetFrameTree {},

    /// Toggle `Page.lifecycleEvent` notifications.
    #[serde(rename = "Page.setLifecycleEventsEnabled")]
    SetLifecycleEventsEnabled {
        /// Whether lifecycle events are emitted.
        enabled: bool,
    },

    /// Create an isolated world for a frame.
    #[serde(rename = "Page.createIsolatedWorld")]
    CreateIsolatedWorld {
        /// Target frame.
        #[serde(rename = "frameId")]
        frame_id: FrameId,
        /// World name, echoed in the context-created notification.
        #[serde(rename = "worldName")]
        world_name: String,
        /// Grant universal access to the world.
        #[serde(rename = "grantUniveralAccess")]
        grant_universal_access: bool,
    },

    /// Evaluate a script in every new document (used to create worlds eagerly).
    #[serde(rename = "Page.addScriptToEvaluateOnNewDocument")]
    AddScriptToEvaluateOnNewDocument {
        /// Script source.
        source: String,
        /// World to evaluate in.
        #[serde(rename = "worldName", skip_serializing_if = "Option::is_none")]
        world_name: Option<String>,
    },

    /// Navigate a frame to a URL.
    #[serde(rename = "Page.navigate")]
    Navigate {
        /// Destination URL.
        url: String,
        /// Referrer URL.
        #[serde(skip_serializing_if = "Option::is_none")]
        referrer: Option<String>,
        /// Referrer policy.
        #[serde(rename = "referrerPolicy", skip_serializing_if = "Option::is_none")]
        referrer_policy: Option<String>,
        /// Frame to navigate.
        #[serde(rename = "frameId")]
        frame_id: FrameId,
    },
}

// ============================================================================
// Runtime Commands
// ============================================================================

/// Runtime domain commands for script evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", content = "params")]
pub enum RuntimeCommand {
    /// Enable execution context notifications.
    #[serde(rename = "Runtime.enable")]
    Enable {},

    /// Call a function declaration inside an execution context.
    #[serde(rename = "Runtime.callFunctionOn")]
    CallFunctionOn {
        /// Function source, e.g. `"(a, b) => a + b"`.
        #[serde(rename = "functionDeclaration")]
        function_declaration: String,
        /// Context to run in.
        #[serde(rename = "executionContextId")]
        execution_context_id: ExecutionContextId,
        /// Call arguments.
        arguments: Vec<CallArgument>,
        /// Serialize the result by value instead of returning a handle.
        #[serde(rename = "returnByValue")]
        return_by_value: bool,
        /// Await a returned promise.
        #[serde(rename = "awaitPromise")]
        await_promise: bool,
        /// Treat the call as initiated by a user gesture.
        #[serde(rename = "userGesture")]
        user_gesture: bool,
    },

    /// Release a remote object.
    #[serde(rename = "Runtime.releaseObject")]
    ReleaseObject {
        /// Object to release.
        #[serde(rename = "objectId")]
        object_id: RemoteObjectId,
    },
}

/// A single `Runtime.callFunctionOn` argument.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallArgument {
    /// JSON-serializable value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    /// Non-JSON primitive (`NaN`, `-0`, `Infinity`, bigint literal).
    #[serde(
        rename = "unserializableValue",
        skip_serializing_if = "Option::is_none"
    )]
    pub unserializable_value: Option<String>,
    /// Remote object reference.
    #[serde(rename = "objectId", skip_serializing_if = "Option::is_none")]
    pub object_id: Option<RemoteObjectId>,
}

impl CallArgument {
    /// Creates a by-value argument.
    #[inline]
    #[must_use]
    pub fn value(value: Value) -> Self {
        Self {
            value: Some(value),
            ..Default::default()
        }
    }

    /// Creates a by-reference argument.
    #[inline]
    #[must_use]
    pub fn object(object_id: RemoteObjectId) -> Self {
        Self {
            object_id: Some(object_id),
            ..Default::default()
        }
    }
}

// ============================================================================
// DOM Commands
// ============================================================================

/// DOM domain commands used to move handles between worlds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", content = "params")]
pub enum DomCommand {
    /// Describe the node behind a remote object.
    #[serde(rename = "DOM.describeNode")]
    DescribeNode {
        /// Object referencing the node.
        #[serde(rename = "objectId")]
        object_id: RemoteObjectId,
    },

    /// Resolve a backend node into a remote object in a given context.
    #[serde(rename = "DOM.resolveNode")]
    ResolveNode {
        /// Backend node ID from `DOM.describeNode`.
        #[serde(rename = "backendNodeId")]
        backend_node_id: i64,
        /// Context the new handle belongs to.
        #[serde(rename = "executionContextId")]
        execution_context_id: ExecutionContextId,
    },
}

// ============================================================================
// Tests
// ============================================================================

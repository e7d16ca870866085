//! Event message types.
//!
//! Events are notifications sent from the remote end to the local end when
//! browser activity occurs. Every event is tagged with the session it was
//! emitted on; the empty session is the top-level one.
//!
//! # Event Types
//!
//! | Domain | Events |
//! |--------|--------|
//! | `Page` | `frameAttached`, `frameNavigated`, `navigatedWithinDocument`, `frameDetached`, `frameStartedLoading`, `frameStoppedLoading`, `lifecycleEvent` |
//! | `Runtime` | `executionContextCreated`, `executionContextDestroyed`, `executionContextsCleared` |
//! | `Network` | `requestWillBeSent`, `responseReceived`, `loadingFinished`, `loadingFailed` |

// ============================================================================
// Imports
// ============================================================================

use rustc_hash::FxHashMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::identifiers::{ExecutionContextId, FrameId, LoaderId, NetworkRequestId, SessionId};

// ============================================================================
// Event
// ============================================================================

/// An event notification from remote end to local end.
///
/// # Format
///
/// ```json
/// {
///   "type": "event",
///   "method": "Domain.eventName",
///   "params": { ... },
///   "sessionId": "optional"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Event type marker (always "event").
    #[serde(rename = "type", default = "event_marker")]
    pub event_type: String,

    /// Event name in `Domain.eventName` format.
    pub method: String,

    /// Event-specific data.
    #[serde(default)]
    pub params: Value,

    /// Session the event was emitted on.
    #[serde(rename = "sessionId", default)]
    pub session_id: SessionId,
}

fn event_marker() -> String {
    "event".to_string()
}

impl Event {
    /// Creates an event on the top-level session.
    #[must_use]
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Self {
            event_type: event_marker(),
            method: method.into(),
            params,
            session_id: SessionId::root(),
        }
    }

    /// Re-tags the event with a session.
    #[must_use]
    pub fn with_session(mut self, session_id: SessionId) -> Self {
        self.session_id = session_id;
        self
    }

    /// Returns the domain name from the method.
    #[inline]
    #[must_use]
    pub fn domain(&self) -> &str {
        self.method.split('.').next().unwrap_or_default()
    }

    /// Returns the event name from the method.
    #[inline]
    #[must_use]
    pub fn event_name(&self) -> &str {
        self.method.split('.').nth(1).unwrap_or_default()
    }

    /// Parses the event into a typed variant.
    #[must_use]
    pub fn parse(&self) -> ParsedEvent {
        self.parse_internal()
    }
}

// ============================================================================
// Payload Types
// ============================================================================

/// Frame description carried by `Page.frameNavigated` and `Page.getFrameTree`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FramePayload {
    /// Frame ID.
    pub id: FrameId,
    /// Parent frame ID (absent for the main frame).
    #[serde(default)]
    pub parent_id: Option<FrameId>,
    /// Loader of the current document.
    #[serde(default)]
    pub loader_id: Option<LoaderId>,
    /// Frame name attribute.
    #[serde(default)]
    pub name: Option<String>,
    /// Document URL without fragment.
    #[serde(default)]
    pub url: String,
    /// Fragment including the leading `#`.
    #[serde(default)]
    pub url_fragment: Option<String>,
}

/// Recursive frame tree returned by `Page.getFrameTree`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameTreePayload {
    /// This frame.
    pub frame: FramePayload,
    /// Child frames.
    #[serde(default)]
    pub child_frames: Vec<FrameTreePayload>,
}

/// Execution context description carried by `Runtime.executionContextCreated`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextPayload {
    /// Context ID, unique per session.
    pub id: ExecutionContextId,
    /// World name (empty for the page's own world).
    #[serde(default)]
    pub name: String,
    /// Embedder data.
    #[serde(default)]
    pub aux_data: ContextAuxData,
}

/// Embedder-specific context data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextAuxData {
    /// Owning frame.
    #[serde(default)]
    pub frame_id: Option<FrameId>,
    /// `true` for the frame's default (page) world.
    #[serde(default)]
    pub is_default: bool,
    /// `"default"`, `"isolated"` or `"worker"`.
    #[serde(rename = "type", default)]
    pub kind: String,
}

/// HTTP response summary carried by `Network.responseReceived`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponsePayload {
    /// Response URL.
    pub url: String,
    /// HTTP status code.
    pub status: u16,
    /// HTTP status text.
    #[serde(default)]
    pub status_text: String,
    /// Response headers.
    #[serde(default)]
    pub headers: FxHashMap<String, String>,
    /// Served from the disk cache.
    #[serde(default)]
    pub from_disk_cache: bool,
    /// Served by a service worker.
    #[serde(default)]
    pub from_service_worker: bool,
}

/// Why a frame was detached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetachReason {
    /// Frame removed from its document.
    #[default]
    Remove,
    /// Frame moved to another process; it keeps its ID.
    Swap,
}

// ============================================================================
// ParsedEvent
// ============================================================================

/// Parsed event types for type-safe handling.
#[derive(Debug, Clone)]
pub enum ParsedEvent {
    /// Frame attached to its parent.
    FrameAttached {
        /// Frame ID.
        frame_id: FrameId,
        /// Parent frame ID.
        parent_frame_id: Option<FrameId>,
    },

    /// Frame committed a new document.
    FrameNavigated {
        /// Frame description.
        frame: FramePayload,
    },

    /// Fragment or history navigation inside the current document.
    NavigatedWithinDocument {
        /// Frame ID.
        frame_id: FrameId,
        /// New URL.
        url: String,
    },

    /// Frame detached.
    FrameDetached {
        /// Frame ID.
        frame_id: FrameId,
        /// Removal or process swap.
        reason: DetachReason,
    },

    /// Frame started loading.
    FrameStartedLoading {
        /// Frame ID.
        frame_id: FrameId,
    },

    /// Frame stopped loading.
    FrameStoppedLoading {
        /// Frame ID.
        frame_id: FrameId,
    },

    /// Lifecycle milestone.
    LifecycleEvent {
        /// Frame ID.
        frame_id: FrameId,
        /// Loader the milestone belongs to.
        loader_id: LoaderId,
        /// Milestone name (`init`, `DOMContentLoaded`, `load`, ...).
        name: String,
    },

    /// Execution context created.
    ExecutionContextCreated {
        /// Context description.
        context: ContextPayload,
    },

    /// Execution context destroyed.
    ExecutionContextDestroyed {
        /// Context ID.
        context_id: ExecutionContextId,
    },

    /// Every context of the emitting session cleared.
    ExecutionContextsCleared,

    /// Network request about to be sent.
    NetworkRequestWillBeSent {
        /// Request ID.
        request_id: NetworkRequestId,
        /// Loader the request belongs to.
        loader_id: LoaderId,
        /// Initiating frame.
        frame_id: Option<FrameId>,
        /// Request URL.
        url: String,
        /// Resource type (`Document`, `Script`, ...).
        resource_type: String,
    },

    /// Network response headers received.
    NetworkResponseReceived {
        /// Request ID.
        request_id: NetworkRequestId,
        /// Loader the request belongs to.
        loader_id: LoaderId,
        /// Initiating frame.
        frame_id: Option<FrameId>,
        /// Resource type.
        resource_type: String,
        /// Response summary.
        response: ResponsePayload,
    },

    /// Network request finished.
    NetworkLoadingFinished {
        /// Request ID.
        request_id: NetworkRequestId,
    },

    /// Network request failed.
    NetworkLoadingFailed {
        /// Request ID.
        request_id: NetworkRequestId,
        /// Network error text.
        error_text: String,
        /// Request was cancelled.
        canceled: bool,
    },

    /// Unknown event type.
    Unknown {
        /// Event method.
        method: String,
        /// Event params.
        params: Value,
    },
}

// ============================================================================
// Event Parsing Implementation
// ============================================================================

impl Event {
    /// Internal parsing implementation.
    fn parse_internal(&self) -> ParsedEvent {
        match self.method.as_str() {
            "Page.frameAttached" => ParsedEvent::FrameAttached {
                frame_id: self.get_string("frameId").into(),
                parent_frame_id: self.get_optional_string("parentFrameId").map(FrameId::new),
            },

            "Page.frameNavigated" => match self.get_object::<FramePayload>("frame") {
                Some(frame) => ParsedEvent::FrameNavigated { frame },
                None => self.unknown(),
            },

            "Page.navigatedWithinDocument" => ParsedEvent::NavigatedWithinDocument {
                frame_id: self.get_string("frameId").into(),
                url: self.get_string("url"),
            },

            "Page.frameDetached" => ParsedEvent::FrameDetached {
                frame_id: self.get_string("frameId").into(),
                reason: match self.get_string_or("reason", "remove").as_str() {
                    "swap" => DetachReason::Swap,
                    _ => DetachReason::Remove,
                },
            },

            "Page.frameStartedLoading" => ParsedEvent::FrameStartedLoading {
                frame_id: self.get_string("frameId").into(),
            },

            "Page.frameStoppedLoading" => ParsedEvent::FrameStoppedLoading {
                frame_id: self.get_string("frameId").into(),
            },

            "Page.lifecycleEvent" => ParsedEvent::LifecycleEvent {
                frame_id: self.get_string("frameId").into(),
                loader_id: self.get_string("loaderId").into(),
                name: self.get_string("name"),
            },

            "Runtime.executionContextCreated" => {
                match self.get_object::<ContextPayload>("context") {
                    Some(context) => ParsedEvent::ExecutionContextCreated { context },
                    None => self.unknown(),
                }
            }

            "Runtime.executionContextDestroyed" => ParsedEvent::ExecutionContextDestroyed {
                context_id: ExecutionContextId::new(self.get_i64("executionContextId")),
            },

            "Runtime.executionContextsCleared" => ParsedEvent::ExecutionContextsCleared,

            "Network.requestWillBeSent" => ParsedEvent::NetworkRequestWillBeSent {
                request_id: self.get_string("requestId").into(),
                loader_id: self.get_string("loaderId").into(),
                frame_id: self.get_optional_string("frameId").map(FrameId::new),
                url: self
                    .params
                    .get("request")
                    .and_then(|r| r.get("url"))
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                resource_type: self.get_string_or("type", "Other"),
            },

            "Network.responseReceived" => match self.get_object::<ResponsePayload>("response") {
                Some(response) => ParsedEvent::NetworkResponseReceived {
                    request_id: self.get_string("requestId").into(),
                    loader_id: self.get_string("loaderId").into(),
                    frame_id: self.get_optional_string("frameId").map(FrameId::new),
                    resource_type: self.get_string_or("type", "Other"),
                    response,
                },
                None => self.unknown(),
            },

            "Network.loadingFinished" => ParsedEvent::NetworkLoadingFinished {
                request_id: self.get_string("requestId").into(),
            },

            "Network.loadingFailed" => ParsedEvent::NetworkLoadingFailed {
                request_id: self.get_string("requestId").into(),
                error_text: self.get_string("errorText"),
                canceled: self.get_bool("canceled"),
            },

            _ => self.unknown(),
        }
    }

    /// Falls back to the untyped variant.
    fn unknown(&self) -> ParsedEvent {
        ParsedEvent::Unknown {
            method: self.method.clone(),
            params: self.params.clone(),
        }
    }

    /// Gets a string from params.
    #[inline]
    fn get_string(&self, key: &str) -> String {
        self.params
            .get(key)
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string()
    }

    /// Gets a string from params with default.
    #[inline]
    fn get_string_or(&self, key: &str, default: &str) -> String {
        self.params
            .get(key)
            .and_then(|v| v.as_str())
            .unwrap_or(default)
            .to_string()
    }

    /// Gets an optional, non-empty string from params.
    #[inline]
    fn get_optional_string(&self, key: &str) -> Option<String> {
        self.params
            .get(key)
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
    }

    /// Gets an i64 from params.
    #[inline]
    fn get_i64(&self, key: &str) -> i64 {
        self.params
            .get(key)
            .and_then(|v| v.as_i64())
            .unwrap_or_default()
    }

    /// Gets a bool from params.
    #[inline]
    fn get_bool(&self, key: &str) -> bool {
        self.params
            .get(key)
            .and_then(|v| v.as_bool())
            .unwrap_or_default()
    }

    /// Deserializes a nested object from params.
    fn get_object<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.params
            .get(key)
            .cloned()
            .and_then(|v| serde_json::from_value(v).ok())
    }
}

// ============================================================================
// Tests
// ============================================================================

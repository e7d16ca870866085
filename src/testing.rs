//! Scripted session and event builders for unit tests.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde_json::{Value, json};
use tokio::sync::{mpsc, oneshot};
use tracing_subscriber::EnvFilter;

use crate::error::{Error, Result};
use crate::frame::FrameManager;
use crate::identifiers::SessionId;
use crate::options::ManagerOptions;
use crate::protocol::{Command, Event};
use crate::transport::Session;

// ============================================================================
// MockSession
// ============================================================================

/// Session that records commands and answers from a script.
///
/// Replies default to `{}`. [`respond`](Self::respond) sets a canned reply per
/// method; [`hold`](Self::hold) parks the next call to a method until the
/// returned sender fires.
#[derive(Default)]
pub(crate) struct MockSession {
    sent: Mutex<Vec<(SessionId, Command)>>,
    replies: Mutex<FxHashMap<String, Value>>,
    held: Mutex<FxHashMap<String, oneshot::Receiver<Result<Value>>>>,
    notify: Mutex<Option<mpsc::UnboundedSender<String>>>,
}

impl MockSession {
    /// Creates a session and a stream of sent method names.
    pub(crate) fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let session = Self {
            notify: Mutex::new(Some(tx)),
            ..Default::default()
        };
        (Arc::new(session), rx)
    }

    /// Sets the reply for every call to `method`.
    pub(crate) fn respond(&self, method: &str, reply: Value) {
        self.replies.lock().insert(method.to_string(), reply);
    }

    /// Parks the next call to `method` until the sender is used.
    pub(crate) fn hold(&self, method: &str) -> oneshot::Sender<Result<Value>> {
        let (tx, rx) = oneshot::channel();
        self.held.lock().insert(method.to_string(), rx);
        tx
    }

    /// Returns every command sent so far.
    pub(crate) fn sent_commands(&self) -> Vec<(SessionId, Command)> {
        self.sent.lock().clone()
    }

    /// Returns the method names sent so far.
    pub(crate) fn sent_methods(&self) -> Vec<String> {
        self.sent
            .lock()
            .iter()
            .map(|(_, command)| command.method())
            .collect()
    }
}

#[async_trait]
impl Session for MockSession {
    async fn send(&self, session_id: &SessionId, command: Command) -> Result<Value> {
        let method = command.method();
        self.sent.lock().push((session_id.clone(), command));
        if let Some(tx) = self.notify.lock().as_ref() {
            let _ = tx.send(method.clone());
        }

        let held = self.held.lock().remove(&method);
        if let Some(rx) = held {
            return rx.await.unwrap_or(Err(Error::ConnectionClosed));
        }

        Ok(self
            .replies
            .lock()
            .get(&method)
            .cloned()
            .unwrap_or_else(|| json!({})))
    }
}

// ============================================================================
// Harness
// ============================================================================

/// Routes `tracing` output through the test writer (filter with `RUST_LOG`).
pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Builds a manager over a mock session.
pub(crate) fn manager() -> (FrameManager, Arc<MockSession>, mpsc::UnboundedReceiver<String>) {
    init_tracing();
    let (session, sent) = MockSession::new();
    let manager = FrameManager::new(session.clone(), ManagerOptions::new());
    (manager, session, sent)
}

/// Waits until `method` has been sent.
pub(crate) async fn wait_sent(sent: &mut mpsc::UnboundedReceiver<String>, method: &str) {
    while let Some(name) = sent.recv().await {
        if name == method {
            return;
        }
    }
    panic!("session dropped before {method} was sent");
}

// ============================================================================
// Event Builders
// ============================================================================

pub(crate) fn attached(frame: &str, parent: Option<&str>) -> Event {
    Event::new(
        "Page.frameAttached",
        json!({ "frameId": frame, "parentFrameId": parent }),
    )
}

pub(crate) fn navigated(frame: &str, parent: Option<&str>, url: &str) -> Event {
    Event::new(
        "Page.frameNavigated",
        json!({ "frame": { "id": frame, "parentId": parent, "url": url, "loaderId": "nav" } }),
    )
}

pub(crate) fn within_document(frame: &str, url: &str) -> Event {
    Event::new(
        "Page.navigatedWithinDocument",
        json!({ "frameId": frame, "url": url }),
    )
}

pub(crate) fn detached(frame: &str, reason: &str) -> Event {
    Event::new(
        "Page.frameDetached",
        json!({ "frameId": frame, "reason": reason }),
    )
}

pub(crate) fn lifecycle(frame: &str, loader: &str, name: &str) -> Event {
    Event::new(
        "Page.lifecycleEvent",
        json!({ "frameId": frame, "loaderId": loader, "name": name }),
    )
}

pub(crate) fn stopped_loading(frame: &str) -> Event {
    Event::new("Page.frameStoppedLoading", json!({ "frameId": frame }))
}

pub(crate) fn context_created(id: i64, frame: &str, is_default: bool, name: &str) -> Event {
    Event::new(
        "Runtime.executionContextCreated",
        json!({
            "context": {
                "id": id,
                "name": name,
                "auxData": { "frameId": frame, "isDefault": is_default, "type": if is_default { "default" } else { "isolated" } }
            }
        }),
    )
}

pub(crate) fn context_destroyed(id: i64) -> Event {
    Event::new(
        "Runtime.executionContextDestroyed",
        json!({ "executionContextId": id }),
    )
}

pub(crate) fn contexts_cleared() -> Event {
    Event::new("Runtime.executionContextsCleared", json!({}))
}

pub(crate) fn request_sent(request: &str, loader: &str, frame: &str) -> Event {
    Event::new(
        "Network.requestWillBeSent",
        json!({
            "requestId": request,
            "loaderId": loader,
            "frameId": frame,
            "type": "Script",
            "request": { "url": "https://a.test/app.js" }
        }),
    )
}

pub(crate) fn response_received(request: &str, loader: &str, frame: &str, status: u16) -> Event {
    Event::new(
        "Network.responseReceived",
        json!({
            "requestId": request,
            "loaderId": loader,
            "frameId": frame,
            "type": "Document",
            "response": { "url": "https://a.test/", "status": status, "statusText": "", "headers": {} }
        }),
    )
}

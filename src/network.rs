//! Network collaborator.
//!
//! The frame manager does not intercept or rewrite traffic. It only needs
//! three answers from the network layer:
//!
//! - the HTTP response that produced a given loader's document,
//! - whether the network is idle enough for `networkidle0` / `networkidle2`,
//! - which extra headers (`referer`, `referer-policy`) navigation should use.
//!
//! [`NetworkObserver`] is that seam. [`NetworkManager`] is the default
//! implementation, fed by the `Network.*` events on the session's stream.

// ============================================================================
// Imports
// ============================================================================

use std::collections::VecDeque;
use std::fmt;

use rustc_hash::FxHashMap;
use tracing::trace;

use crate::identifiers::{FrameId, LoaderId, NetworkRequestId};
use crate::protocol::{ParsedEvent, ResponsePayload};

// ============================================================================
// Constants
// ============================================================================

/// Document responses remembered before the oldest is evicted.
const MAX_TRACKED_LOADERS: usize = 64;

/// Header consulted for the default navigation referrer.
pub const REFERER_HEADER: &str = "referer";

/// Header consulted for the default navigation referrer policy.
pub const REFERER_POLICY_HEADER: &str = "referer-policy";

// ============================================================================
// HttpResponse
// ============================================================================

/// HTTP response that delivered a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// Request that produced the response.
    pub request_id: NetworkRequestId,
    /// Loader whose document this is.
    pub loader_id: LoaderId,
    /// Frame that issued the request.
    pub frame_id: Option<FrameId>,
    /// Final response URL.
    pub url: String,
    /// HTTP status code.
    pub status: u16,
    /// HTTP status text.
    pub status_text: String,
    /// Response headers (lower-cased names).
    pub headers: FxHashMap<String, String>,
    /// Served from the disk cache.
    pub from_cache: bool,
    /// Served by a service worker.
    pub from_service_worker: bool,
}

impl HttpResponse {
    /// Returns `true` for 2xx statuses (and status 0 for non-network schemes).
    #[inline]
    #[must_use]
    pub fn ok(&self) -> bool {
        self.status == 0 || (200..300).contains(&self.status)
    }

    fn from_payload(
        request_id: NetworkRequestId,
        loader_id: LoaderId,
        frame_id: Option<FrameId>,
        payload: &ResponsePayload,
    ) -> Self {
        Self {
            request_id,
            loader_id,
            frame_id,
            url: payload.url.clone(),
            status: payload.status,
            status_text: payload.status_text.clone(),
            headers: payload
                .headers
                .iter()
                .map(|(k, v)| (k.to_ascii_lowercase(), v.clone()))
                .collect(),
            from_cache: payload.from_disk_cache,
            from_service_worker: payload.from_service_worker,
        }
    }
}

// ============================================================================
// NetError
// ============================================================================

/// Structured classification of a navigation error text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetError {
    /// The server answered with a non-OK status and no body.
    ///
    /// The navigation still committed a document.
    HttpResponseCodeFailure,
    /// Navigation aborted (superseded, cancelled, download).
    Aborted,
    /// Host name could not be resolved.
    NameNotResolved,
    /// Connection refused by the server.
    ConnectionRefused,
    /// URL rejected before any request was made.
    InvalidUrl,
    /// Any other error text.
    Other(String),
}

impl NetError {
    /// Classifies a remote error text.
    #[must_use]
    pub fn parse(error_text: &str) -> Self {
        match error_text {
            "net::ERR_HTTP_RESPONSE_CODE_FAILURE" => Self::HttpResponseCodeFailure,
            "net::ERR_ABORTED" => Self::Aborted,
            "net::ERR_NAME_NOT_RESOLVED" => Self::NameNotResolved,
            "net::ERR_CONNECTION_REFUSED" => Self::ConnectionRefused,
            "Cannot navigate to invalid URL" | "net::ERR_INVALID_URL" => Self::InvalidUrl,
            other => Self::Other(other.to_string()),
        }
    }

    /// Returns `true` when the navigation completed despite the error text.
    #[inline]
    #[must_use]
    pub fn is_completed_navigation(&self) -> bool {
        matches!(self, Self::HttpResponseCodeFailure)
    }
}

impl fmt::Display for NetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HttpResponseCodeFailure => f.write_str("net::ERR_HTTP_RESPONSE_CODE_FAILURE"),
            Self::Aborted => f.write_str("net::ERR_ABORTED"),
            Self::NameNotResolved => f.write_str("net::ERR_NAME_NOT_RESOLVED"),
            Self::ConnectionRefused => f.write_str("net::ERR_CONNECTION_REFUSED"),
            Self::InvalidUrl => f.write_str("Cannot navigate to invalid URL"),
            Self::Other(text) => f.write_str(text),
        }
    }
}

// ============================================================================
// NetworkObserver
// ============================================================================

/// Network-side answers the navigation machinery depends on.
///
/// Implementations are driven from the same ordered event stream as the frame
/// tree, so state is never ahead of or behind the frame events around it.
pub trait NetworkObserver: Send {
    /// Applies a network event. Returns `true` if observable state changed.
    fn handle_event(&mut self, event: &ParsedEvent) -> bool;

    /// Returns the response that delivered the document of `loader_id`.
    fn response_for_loader(&self, loader_id: &LoaderId) -> Option<HttpResponse>;

    /// Returns the number of requests currently in flight.
    fn inflight_requests(&self) -> usize;

    /// Stops tracking requests issued by frames that were removed.
    ///
    /// Detached frames never report their pending requests as finished.
    fn forget_frames(&mut self, _frames: &[FrameId]) {}

    /// Returns extra headers applied to every request.
    fn extra_http_headers(&self) -> FxHashMap<String, String> {
        FxHashMap::default()
    }

    /// Classifies a `Page.navigate` error text.
    fn classify_navigation_error(&self, error_text: &str) -> NetError {
        NetError::parse(error_text)
    }
}

// ============================================================================
// NetworkManager
// ============================================================================

/// Default [`NetworkObserver`] tracking requests from `Network.*` events.
#[derive(Debug, Default)]
pub struct NetworkManager {
    /// Requests that have not finished or failed, with their initiating frame.
    inflight: FxHashMap<NetworkRequestId, Option<FrameId>>,
    /// Document responses by loader.
    responses: FxHashMap<LoaderId, HttpResponse>,
    /// Insertion order of `responses`, for eviction.
    response_order: VecDeque<LoaderId>,
    /// Extra headers configured by the embedder.
    extra_headers: FxHashMap<String, String>,
}

impl NetworkManager {
    /// Creates an empty tracker.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets extra headers (names are matched case-insensitively).
    #[must_use]
    pub fn with_extra_http_headers(
        mut self,
        headers: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>,
    ) -> Self {
        self.extra_headers = headers
            .into_iter()
            .map(|(k, v)| (k.into().to_ascii_lowercase(), v.into()))
            .collect();
        self
    }

    fn remember_response(&mut self, response: HttpResponse) {
        let loader_id = response.loader_id.clone();
        if self.responses.insert(loader_id.clone(), response).is_none() {
            self.response_order.push_back(loader_id);
        }

        while self.response_order.len() > MAX_TRACKED_LOADERS {
            if let Some(oldest) = self.response_order.pop_front() {
                self.responses.remove(&oldest);
            }
        }
    }
}

impl NetworkObserver for NetworkManager {
    fn handle_event(&mut self, event: &ParsedEvent) -> bool {
        match event {
            ParsedEvent::NetworkRequestWillBeSent {
                request_id,
                loader_id,
                frame_id,
                resource_type,
                url,
            } => {
                // A redirect re-announces the same request ID; the previous hop's
                // response must not be reported for this loader.
                let redirected = self
                    .inflight
                    .insert(request_id.clone(), frame_id.clone())
                    .is_some();
                if redirected && resource_type == "Document" {
                    self.responses.remove(loader_id);
                }
                trace!(%request_id, url, inflight = self.inflight.len(), "Request sent");
                true
            }

            ParsedEvent::NetworkResponseReceived {
                request_id,
                loader_id,
                frame_id,
                resource_type,
                response,
            } => {
                if resource_type == "Document" {
                    self.remember_response(HttpResponse::from_payload(
                        request_id.clone(),
                        loader_id.clone(),
                        frame_id.clone(),
                        response,
                    ));
                }
                true
            }

            ParsedEvent::NetworkLoadingFinished { request_id }
            | ParsedEvent::NetworkLoadingFailed { request_id, .. } => {
                let removed = self.inflight.remove(request_id).is_some();
                trace!(%request_id, inflight = self.inflight.len(), "Request settled");
                removed
            }

            _ => false,
        }
    }

    fn response_for_loader(&self, loader_id: &LoaderId) -> Option<HttpResponse> {
        self.responses.get(loader_id).cloned()
    }

    fn inflight_requests(&self) -> usize {
        self.inflight.len()
    }

    fn forget_frames(&mut self, frames: &[FrameId]) {
        let before = self.inflight.len();
        self.inflight
            .retain(|_, frame| frame.as_ref().is_none_or(|f| !frames.contains(f)));
        let dropped = before - self.inflight.len();
        if dropped > 0 {
            trace!(dropped, inflight = self.inflight.len(), "Dropped requests of removed frames");
        }
    }

    fn extra_http_headers(&self) -> FxHashMap<String, String> {
        self.extra_headers.clone()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    use crate::protocol::Event;

    fn request(id: &str, loader: &str, kind: &str) -> ParsedEvent {
        Event::new(
            "Network.requestWillBeSent",
            json!({
                "requestId": id,
                "loaderId": loader,
                "frameId": "F1",
                "type": kind,
                "request": { "url": "https://example.com/" }
            }),
        )
        .parse()
    }

    fn response(id: &str, loader: &str, status: u16) -> ParsedEvent {
        Event::new(
            "Network.responseReceived",
            json!({
                "requestId": id,
                "loaderId": loader,
                "frameId": "F1",
                "type": "Document",
                "response": { "url": "https://example.com/", "status": status, "headers": { "Content-Type": "text/html" } }
            }),
        )
        .parse()
    }

    fn finished(id: &str) -> ParsedEvent {
        Event::new("Network.loadingFinished", json!({ "requestId": id })).parse()
    }

    #[test]
    fn test_response_by_loader() {
        let mut network = NetworkManager::new();
        network.handle_event(&request("L1", "L1", "Document"));
        network.handle_event(&response("L1", "L1", 404));

        let resp = network
            .response_for_loader(&LoaderId::new("L1"))
            .expect("response recorded");
        assert_eq!(resp.status, 404);
        assert!(!resp.ok());
        assert_eq!(
            resp.headers.get("content-type").map(String::as_str),
            Some("text/html")
        );
        assert!(network.response_for_loader(&LoaderId::new("L2")).is_none());
    }

    #[test]
    fn test_inflight_counting() {
        let mut network = NetworkManager::new();
        network.handle_event(&request("R1", "L1", "Script"));
        network.handle_event(&request("R2", "L1", "Image"));
        assert_eq!(network.inflight_requests(), 2);

        network.handle_event(&finished("R1"));
        assert_eq!(network.inflight_requests(), 1);

        let failed = Event::new(
            "Network.loadingFailed",
            json!({ "requestId": "R2", "errorText": "net::ERR_FAILED" }),
        )
        .parse();
        network.handle_event(&failed);
        assert_eq!(network.inflight_requests(), 0);
    }

    #[test]
    fn test_removed_frames_release_inflight_requests() {
        let mut network = NetworkManager::new();
        network.handle_event(&request("R1", "L1", "Script"));
        network.handle_event(&request("R2", "L1", "Image"));
        assert_eq!(network.inflight_requests(), 2);

        network.forget_frames(&[FrameId::new("other")]);
        assert_eq!(network.inflight_requests(), 2);

        network.forget_frames(&[FrameId::new("F1")]);
        assert_eq!(network.inflight_requests(), 0);
    }

    #[test]
    fn test_redirect_drops_previous_response() {
        let mut network = NetworkManager::new();
        network.handle_event(&request("L1", "L1", "Document"));
        network.handle_event(&response("L1", "L1", 302));
        network.handle_event(&request("L1", "L1", "Document"));

        assert!(network.response_for_loader(&LoaderId::new("L1")).is_none());
        assert_eq!(network.inflight_requests(), 1);
    }

    #[test]
    fn test_eviction_keeps_recent_loaders() {
        let mut network = NetworkManager::new();
        for i in 0..(MAX_TRACKED_LOADERS + 5) {
            let id = format!("L{i}");
            network.handle_event(&response(&id, &id, 200));
        }

        assert!(network.response_for_loader(&LoaderId::new("L0")).is_none());
        let last = format!("L{}", MAX_TRACKED_LOADERS + 4);
        assert!(network.response_for_loader(&LoaderId::new(last)).is_some());
    }

    #[test]
    fn test_extra_headers_lowercased() {
        let network =
            NetworkManager::new().with_extra_http_headers([("Referer", "https://ref.example/")]);
        assert_eq!(
            network.extra_http_headers().get(REFERER_HEADER).map(String::as_str),
            Some("https://ref.example/")
        );
    }

    #[test]
    fn test_net_error_classification() {
        assert!(NetError::parse("net::ERR_HTTP_RESPONSE_CODE_FAILURE").is_completed_navigation());
        assert_eq!(NetError::parse("net::ERR_ABORTED"), NetError::Aborted);
        assert!(!NetError::parse("net::ERR_NAME_NOT_RESOLVED").is_completed_navigation());
        assert_eq!(
            NetError::parse("net::ERR_SOMETHING").to_string(),
            "net::ERR_SOMETHING"
        );
    }
}

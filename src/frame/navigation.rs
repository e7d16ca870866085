//! Frame navigation methods.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};
use crate::network::{HttpResponse, REFERER_HEADER, REFERER_POLICY_HEADER};
use crate::protocol::{Command, PageCommand};

use super::Frame;
use super::lifecycle::{WaitMode, WaitUntil};
use super::manager::{FrameManager, ManagerInner};

// ============================================================================
// GotoOptions
// ============================================================================

/// Options for [`Frame::goto`].
#[derive(Debug, Clone, Default)]
pub struct GotoOptions {
    /// Referrer URL. Defaults to the `referer` extra header.
    pub referer: Option<String>,
    /// Referrer policy. Defaults to the `referer-policy` extra header.
    pub referrer_policy: Option<String>,
    /// Deadline. Defaults to the navigation timeout; zero disables it.
    pub timeout: Option<Duration>,
    /// Milestones to wait for. Empty means `[Load]`.
    pub wait_until: Vec<WaitUntil>,
}

impl GotoOptions {
    /// Creates default options.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the referrer.
    #[inline]
    #[must_use]
    pub fn with_referer(mut self, referer: impl Into<String>) -> Self {
        self.referer = Some(referer.into());
        self
    }

    /// Sets the referrer policy.
    #[inline]
    #[must_use]
    pub fn with_referrer_policy(mut self, policy: impl Into<String>) -> Self {
        self.referrer_policy = Some(policy.into());
        self
    }

    /// Sets the deadline.
    #[inline]
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the milestones.
    #[inline]
    #[must_use]
    pub fn with_wait_until(mut self, wait_until: impl IntoIterator<Item = WaitUntil>) -> Self {
        self.wait_until = wait_until.into_iter().collect();
        self
    }
}

// ============================================================================
// WaitForNavigationOptions
// ============================================================================

/// Options for [`Frame::wait_for_navigation`].
#[derive(Debug, Clone, Default)]
pub struct WaitForNavigationOptions {
    /// Deadline. Defaults to the navigation timeout; zero disables it.
    pub timeout: Option<Duration>,
    /// Milestones to wait for. Empty means `[Load]`.
    pub wait_until: Vec<WaitUntil>,
}

impl WaitForNavigationOptions {
    /// Creates default options.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the deadline.
    #[inline]
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the milestones.
    #[inline]
    #[must_use]
    pub fn with_wait_until(mut self, wait_until: impl IntoIterator<Item = WaitUntil>) -> Self {
        self.wait_until = wait_until.into_iter().collect();
        self
    }
}

// ============================================================================
// Frame - Navigation
// ============================================================================

impl Frame {
    /// Navigates the frame to `url`.
    ///
    /// Resolves with the main document response once the requested milestones
    /// are reached, or `None` for same-document and non-network navigations.
    /// A non-OK HTTP status is not an error.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] if `url` does not parse
    /// - [`Error::NavigationError`] if the browser rejected the navigation
    /// - [`Error::NavigationTermination`] if the frame detached or swapped
    /// - [`Error::NavigationTimeout`] if the deadline elapsed
    pub async fn goto(&self, url: &str, options: GotoOptions) -> Result<Option<HttpResponse>> {
        Url::parse(url).map_err(|e| Error::invalid_argument(format!("Invalid URL {url:?}: {e}")))?;

        let manager = self.manager()?;
        if self.is_detached() {
            return Err(Error::navigation_termination(self.id().clone(), "detached"));
        }

        let (referrer, referrer_policy) = {
            let state = manager.state.lock();
            let headers = state.network.extra_http_headers();
            (
                options
                    .referer
                    .or_else(|| headers.get(REFERER_HEADER).cloned()),
                options
                    .referrer_policy
                    .or_else(|| headers.get(REFERER_POLICY_HEADER).cloned()),
            )
        };
        let timeout = options
            .timeout
            .unwrap_or_else(|| manager.options.timeouts.navigation_timeout());

        debug!(frame_id = %self.id(), url, timeout_ms = timeout.as_millis() as u64, "Navigating");

        let mut watcher = FrameManager::from_inner(Arc::clone(&manager)).watch(
            self.id(),
            &options.wait_until,
            timeout,
        );

        let navigate = self.navigate(&manager, url, referrer, referrer_policy);
        let outcome = tokio::select! {
            result = navigate => result,
            error = watcher.terminated() => Err(error),
        };

        let result = match outcome {
            Ok(true) => watcher.wait(WaitMode::NewDocument).await,
            Ok(false) => watcher.wait(WaitMode::Either).await,
            Err(e) => Err(e),
        };
        watcher.dispose();

        if let Err(e) = &result {
            debug!(frame_id = %self.id(), url, error = %e, "Navigation failed");
        }
        result
    }

    /// Waits for the next navigation of this frame.
    ///
    /// Resolves on a new document (with its response) or a same-document
    /// navigation (with `None`).
    ///
    /// # Errors
    ///
    /// - [`Error::NavigationTermination`] if the frame detached or swapped
    /// - [`Error::NavigationTimeout`] if the deadline elapsed
    pub async fn wait_for_navigation(
        &self,
        options: WaitForNavigationOptions,
    ) -> Result<Option<HttpResponse>> {
        let manager = self.manager()?;
        let timeout = options
            .timeout
            .unwrap_or_else(|| manager.options.timeouts.navigation_timeout());

        let mut watcher =
            FrameManager::from_inner(manager).watch(self.id(), &options.wait_until, timeout);
        let result = watcher.wait(WaitMode::Either).await;
        watcher.dispose();
        result
    }

    /// Issues `Page.navigate`. Returns `true` if a new document is loading.
    async fn navigate(
        &self,
        manager: &ManagerInner,
        url: &str,
        referrer: Option<String>,
        referrer_policy: Option<String>,
    ) -> Result<bool> {
        let command = Command::Page(PageCommand::Navigate {
            url: url.to_string(),
            referrer,
            referrer_policy,
            frame_id: self.id().clone(),
        });
        let response = self.send(command).await?;

        if let Some(error_text) = response
            .get("errorText")
            .and_then(Value::as_str)
            .filter(|text| !text.is_empty())
        {
            let class = manager
                .state
                .lock()
                .network
                .classify_navigation_error(error_text);
            if !class.is_completed_navigation() {
                return Err(Error::navigation_error(url, error_text));
            }
            debug!(frame_id = %self.id(), url, error = %class, "Navigation committed with HTTP error status");
        }

        Ok(response
            .get("loaderId")
            .and_then(Value::as_str)
            .is_some_and(|loader| !loader.is_empty()))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;
    use tokio::sync::mpsc;

    use crate::identifiers::FrameId;
    use crate::network::NetworkManager;
    use crate::options::ManagerOptions;
    use crate::testing::{
        MockSession, attached, detached, lifecycle, manager, navigated, response_received,
        wait_sent, within_document,
    };

    fn setup() -> (FrameManager, Arc<MockSession>, mpsc::UnboundedReceiver<String>, Frame) {
        let (manager, session, sent) = manager();
        manager.handle_event(&navigated("root", None, "https://a.test/"));
        manager.handle_event(&lifecycle("root", "L0", "init"));
        manager.handle_event(&lifecycle("root", "L0", "load"));
        let frame = manager.main_frame().expect("main");
        (manager, session, sent, frame)
    }

    fn spawn_goto(
        frame: &Frame,
        url: &'static str,
        options: GotoOptions,
    ) -> tokio::task::JoinHandle<Result<Option<HttpResponse>>> {
        let frame = frame.clone();
        tokio::spawn(async move { frame.goto(url, options).await })
    }

    fn spawn_wait(
        frame: &Frame,
        options: WaitForNavigationOptions,
    ) -> tokio::task::JoinHandle<Result<Option<HttpResponse>>> {
        let frame = frame.clone();
        tokio::spawn(async move { frame.wait_for_navigation(options).await })
    }

    #[tokio::test]
    async fn test_goto_resolves_with_document_response() {
        let (manager, session, mut sent, frame) = setup();
        let reply = session.hold("Page.navigate");

        let task = spawn_goto(&frame, "https://b.test/", GotoOptions::new());
        wait_sent(&mut sent, "Page.navigate").await;
        reply
            .send(Ok(json!({ "frameId": "root", "loaderId": "L1" })))
            .expect("reply");

        manager.handle_event(&response_received("r1", "L1", "root", 200));
        manager.handle_event(&lifecycle("root", "L1", "init"));
        manager.handle_event(&navigated("root", None, "https://b.test/"));
        manager.handle_event(&lifecycle("root", "L1", "DOMContentLoaded"));
        manager.handle_event(&lifecycle("root", "L1", "load"));

        let response = task.await.expect("join").expect("goto").expect("response");
        assert_eq!(response.status, 200);
        assert_eq!(frame.url().as_deref(), Some("https://b.test/"));
        assert_eq!(manager.watcher_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_goto_not_held_back_by_idle_child() {
        let (manager, session, mut sent, frame) = setup();
        manager.handle_event(&attached("idle", Some("root")));
        let reply = session.hold("Page.navigate");

        let options = GotoOptions::new().with_timeout(Duration::from_secs(5));
        let task = spawn_goto(&frame, "https://b.test/", options);
        wait_sent(&mut sent, "Page.navigate").await;
        reply
            .send(Ok(json!({ "frameId": "root", "loaderId": "L1" })))
            .expect("reply");

        manager.handle_event(&lifecycle("root", "L1", "init"));
        manager.handle_event(&lifecycle("root", "L1", "DOMContentLoaded"));
        manager.handle_event(&lifecycle("root", "L1", "load"));

        let result = task.await.expect("join");
        assert!(matches!(result, Ok(None)), "unexpected outcome: {result:?}");
    }

    #[tokio::test]
    async fn test_goto_events_before_command_reply() {
        let (manager, session, mut sent, frame) = setup();
        let reply = session.hold("Page.navigate");

        let task = spawn_goto(&frame, "https://b.test/", GotoOptions::new());
        wait_sent(&mut sent, "Page.navigate").await;

        manager.handle_event(&lifecycle("root", "L1", "init"));
        manager.handle_event(&lifecycle("root", "L1", "load"));
        reply
            .send(Ok(json!({ "frameId": "root", "loaderId": "L1" })))
            .expect("reply");

        assert_eq!(task.await.expect("join").expect("goto"), None);
    }

    #[tokio::test]
    async fn test_goto_http_error_status_resolves() {
        let (manager, session, mut sent, frame) = setup();
        session.respond(
            "Page.navigate",
            json!({ "frameId": "root", "loaderId": "L1", "errorText": "net::ERR_HTTP_RESPONSE_CODE_FAILURE" }),
        );

        let task = spawn_goto(&frame, "https://b.test/missing", GotoOptions::new());
        wait_sent(&mut sent, "Page.navigate").await;
        manager.handle_event(&response_received("r1", "L1", "root", 404));
        manager.handle_event(&lifecycle("root", "L1", "init"));
        manager.handle_event(&lifecycle("root", "L1", "load"));

        let response = task.await.expect("join").expect("goto").expect("response");
        assert_eq!(response.status, 404);
        assert!(!response.ok());
    }

    #[tokio::test]
    async fn test_goto_network_failure() {
        let (manager, session, _sent, frame) = setup();
        session.respond(
            "Page.navigate",
            json!({ "frameId": "root", "errorText": "net::ERR_NAME_NOT_RESOLVED" }),
        );

        let err = frame
            .goto("https://nowhere.invalid/", GotoOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NavigationError { ref message, .. } if message == "net::ERR_NAME_NOT_RESOLVED"));
        assert_eq!(manager.watcher_count(), 0);
    }

    #[tokio::test]
    async fn test_goto_invalid_url_sends_nothing() {
        let (_manager, session, _sent, frame) = setup();
        let err = frame.goto("not a url", GotoOptions::new()).await.unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }));
        assert!(session.sent_methods().is_empty());
    }

    #[tokio::test]
    async fn test_goto_frame_detached_mid_navigation() {
        let (manager, session, mut sent, _root) = setup();
        manager.handle_event(&attached("child", Some("root")));
        manager.handle_event(&navigated("child", Some("root"), "https://c.test/"));
        let child = manager.frame(&FrameId::new("child")).expect("child");
        let _reply = session.hold("Page.navigate");

        let task = spawn_goto(&child, "https://d.test/", GotoOptions::new());
        wait_sent(&mut sent, "Page.navigate").await;
        manager.handle_event(&detached("child", "remove"));

        let err = task.await.expect("join").unwrap_err();
        assert!(matches!(err, Error::NavigationTermination { ref reason, .. } if reason == "detached"));
        assert_eq!(manager.watcher_count(), 0);
    }

    #[tokio::test]
    async fn test_goto_detached_frame_fails_fast() {
        let (manager, session, _sent, _root) = setup();
        manager.handle_event(&attached("child", Some("root")));
        let child = manager.frame(&FrameId::new("child")).expect("child");
        manager.handle_event(&detached("child", "remove"));

        let err = child
            .goto("https://d.test/", GotoOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NavigationTermination { .. }));
        assert!(session.sent_methods().is_empty());
    }

    #[tokio::test]
    async fn test_goto_same_document() {
        let (manager, session, mut sent, frame) = setup();
        session.respond("Page.navigate", json!({ "frameId": "root" }));

        let task = spawn_goto(&frame, "https://a.test/#section", GotoOptions::new());
        wait_sent(&mut sent, "Page.navigate").await;
        manager.handle_event(&within_document("root", "https://a.test/#section"));

        assert_eq!(task.await.expect("join").expect("goto"), None);
        assert_eq!(frame.url().as_deref(), Some("https://a.test/#section"));
    }

    #[tokio::test]
    async fn test_goto_referer_defaults_from_extra_headers() {
        let (session, mut sent) = MockSession::new();
        let network = NetworkManager::new().with_extra_http_headers([
            ("Referer", "https://ref.test/"),
            ("Referer-Policy", "origin"),
        ]);
        let manager = FrameManager::with_network(
            session.clone(),
            ManagerOptions::new(),
            Box::new(network),
        );
        manager.handle_event(&navigated("root", None, "https://a.test/"));
        let frame = manager.main_frame().expect("main");
        session.respond("Page.navigate", json!({ "frameId": "root" }));

        let task = spawn_goto(&frame, "https://a.test/#x", GotoOptions::new());
        wait_sent(&mut sent, "Page.navigate").await;
        manager.handle_event(&within_document("root", "https://a.test/#x"));
        task.await.expect("join").expect("goto");

        let commands = session.sent_commands();
        let Some((_, Command::Page(PageCommand::Navigate { referrer, referrer_policy, .. }))) =
            commands.first()
        else {
            panic!("expected Page.navigate");
        };
        assert_eq!(referrer.as_deref(), Some("https://ref.test/"));
        assert_eq!(referrer_policy.as_deref(), Some("origin"));
    }

    #[tokio::test]
    async fn test_explicit_referer_wins() {
        let (manager, session, mut sent, frame) = setup();
        session.respond("Page.navigate", json!({ "frameId": "root" }));

        let task = spawn_goto(
            &frame,
            "https://a.test/#y",
            GotoOptions::new().with_referer("https://explicit.test/"),
        );
        wait_sent(&mut sent, "Page.navigate").await;
        manager.handle_event(&within_document("root", "https://a.test/#y"));
        task.await.expect("join").expect("goto");

        let commands = session.sent_commands();
        assert!(matches!(
            &commands[0].1,
            Command::Page(PageCommand::Navigate { referrer: Some(r), .. }) if r == "https://explicit.test/"
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_goto_times_out() {
        let (_manager, session, _sent, frame) = setup();
        let _reply = session.hold("Page.navigate");

        let err = frame
            .goto(
                "https://slow.test/",
                GotoOptions::new().with_timeout(Duration::from_millis(100)),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NavigationTimeout { timeout_ms: 100 }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_navigation_timeout_applies() {
        let (session, _sent) = MockSession::new();
        let options = ManagerOptions::new();
        options
            .timeouts
            .set_default_navigation_timeout(Duration::from_secs(2));
        let manager = FrameManager::new(session.clone(), options);
        manager.handle_event(&navigated("root", None, "https://a.test/"));
        let frame = manager.main_frame().expect("main");

        let err = frame
            .wait_for_navigation(WaitForNavigationOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NavigationTimeout { timeout_ms: 2000 }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_resolves_just_before_deadline() {
        let (manager, _session, _sent, frame) = setup();
        let task = spawn_wait(
            &frame,
            WaitForNavigationOptions::new().with_timeout(Duration::from_millis(100)),
        );

        tokio::time::sleep(Duration::from_millis(90)).await;
        manager.handle_event(&within_document("root", "https://a.test/#late"));

        assert_eq!(task.await.expect("join").expect("navigation"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_timeout_never_times_out() {
        let (manager, _session, _sent, frame) = setup();
        let task = spawn_wait(
            &frame,
            WaitForNavigationOptions::new().with_timeout(Duration::ZERO),
        );

        tokio::time::sleep(Duration::from_secs(3600)).await;
        assert!(!task.is_finished());

        manager.handle_event(&lifecycle("root", "L1", "init"));
        manager.handle_event(&lifecycle("root", "L1", "load"));
        assert_eq!(task.await.expect("join").expect("navigation"), None);
    }

    #[tokio::test]
    async fn test_wait_for_navigation_network_idle() {
        let (manager, _session, _sent, frame) = setup();
        let task = spawn_wait(
            &frame,
            WaitForNavigationOptions::new()
                .with_wait_until([WaitUntil::Load, WaitUntil::NetworkIdle0]),
        );
        tokio::task::yield_now().await;

        manager.handle_event(&crate::protocol::Event::new(
            "Network.requestWillBeSent",
            json!({ "requestId": "r9", "loaderId": "L1", "frameId": "root", "type": "XHR", "request": { "url": "https://a.test/api" } }),
        ));
        manager.handle_event(&lifecycle("root", "L1", "init"));
        manager.handle_event(&lifecycle("root", "L1", "load"));
        tokio::task::yield_now().await;
        assert!(!task.is_finished());

        manager.handle_event(&crate::protocol::Event::new(
            "Network.loadingFinished",
            json!({ "requestId": "r9" }),
        ));
        assert_eq!(task.await.expect("join").expect("navigation"), None);
    }

    #[tokio::test]
    async fn test_abandoned_goto_releases_watcher() {
        let (manager, session, mut sent, frame) = setup();
        let _reply = session.hold("Page.navigate");

        let task = spawn_goto(&frame, "https://b.test/", GotoOptions::new());
        wait_sent(&mut sent, "Page.navigate").await;
        assert_eq!(manager.watcher_count(), 1);

        task.abort();
        let _ = task.await;
        assert_eq!(manager.watcher_count(), 0);
    }
}

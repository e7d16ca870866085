//! Script evaluation and document content methods.
//!
//! Caller-supplied functions run in the main world. Internal helpers
//! (reading or replacing the document) run in the utility world so page
//! script cannot observe or tamper with them.

// ============================================================================
// Imports
// ============================================================================

use std::path::{Path, PathBuf};

use serde_json::{Value, json};
use tracing::debug;

use crate::error::{Error, Result};

use super::Frame;
use super::lifecycle::WaitMode;
use super::manager::FrameManager;
use super::navigation::WaitForNavigationOptions;
use super::world::{EvalArg, JsHandle};

// ============================================================================
// Scripts
// ============================================================================

const CONTENT_JS: &str = r#"() => {
  let content = '';
  for (const node of document.childNodes) {
    if (node === document.documentElement) {
      content += document.documentElement.outerHTML;
    } else {
      content += new XMLSerializer().serializeToString(node);
    }
  }
  return content;
}"#;

const SET_CONTENT_JS: &str = r#"(html) => {
  document.open();
  document.write(html);
  document.close();
}"#;

const TITLE_JS: &str = "() => document.title";

const ADD_SCRIPT_TAG_JS: &str = r#"async ({ url, id, type, content }) => {
  const script = document.createElement('script');
  script.type = type || 'text/javascript';
  if (id) script.id = id;
  if (url) {
    script.src = url;
    const loaded = new Promise((resolve, reject) => {
      script.onload = resolve;
      script.onerror = () => reject(new Error(`Could not load script ${url}`));
    });
    document.head.appendChild(script);
    await loaded;
  } else {
    script.text = content;
    let error = null;
    script.onerror = (e) => (error = e);
    document.head.appendChild(script);
    if (error) throw error;
  }
  return script;
}"#;

const ADD_STYLE_TAG_JS: &str = r#"async ({ url, content }) => {
  let element;
  if (url) {
    element = document.createElement('link');
    element.rel = 'stylesheet';
    element.href = url;
  } else {
    element = document.createElement('style');
    element.appendChild(document.createTextNode(content));
  }
  const loaded = new Promise((resolve, reject) => {
    element.addEventListener('load', resolve, { once: true });
    element.addEventListener('error', () => reject(new Error('Could not load style')), { once: true });
  });
  document.head.appendChild(element);
  await loaded;
  return element;
}"#;

// ============================================================================
// Tag Options
// ============================================================================

/// Options for [`Frame::add_script_tag`]. Exactly one source must be set.
#[derive(Debug, Clone, Default)]
pub struct ScriptTagOptions {
    /// Remote script URL.
    pub url: Option<String>,
    /// Local file whose contents are injected.
    pub path: Option<PathBuf>,
    /// Inline script source.
    pub content: Option<String>,
    /// `type` attribute (default `text/javascript`).
    pub script_type: Option<String>,
    /// `id` attribute.
    pub id: Option<String>,
}

impl ScriptTagOptions {
    /// Script loaded from a URL.
    #[must_use]
    pub fn url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Default::default()
        }
    }

    /// Script read from a local file.
    #[must_use]
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..Default::default()
        }
    }

    /// Inline script.
    #[must_use]
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Default::default()
        }
    }

    /// Sets the `type` attribute (e.g. `module`).
    #[inline]
    #[must_use]
    pub fn with_type(mut self, script_type: impl Into<String>) -> Self {
        self.script_type = Some(script_type.into());
        self
    }

    /// Sets the `id` attribute.
    #[inline]
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// Options for [`Frame::add_style_tag`]. Exactly one source must be set.
#[derive(Debug, Clone, Default)]
pub struct StyleTagOptions {
    /// Remote stylesheet URL.
    pub url: Option<String>,
    /// Local file whose contents are injected.
    pub path: Option<PathBuf>,
    /// Inline CSS.
    pub content: Option<String>,
}

impl StyleTagOptions {
    /// Stylesheet loaded from a URL.
    #[must_use]
    pub fn url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Default::default()
        }
    }

    /// Stylesheet read from a local file.
    #[must_use]
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..Default::default()
        }
    }

    /// Inline CSS.
    #[must_use]
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Default::default()
        }
    }
}

/// Where injected tag content comes from.
enum TagSource {
    Url(String),
    Content(String),
}

/// Validates the source triple and loads file content.
async fn resolve_tag_source(
    url: Option<&String>,
    path: Option<&PathBuf>,
    content: Option<&String>,
    source_comment: fn(&Path) -> String,
) -> Result<TagSource> {
    let provided = [url.is_some(), path.is_some(), content.is_some()]
        .into_iter()
        .filter(|set| *set)
        .count();
    if provided != 1 {
        return Err(Error::invalid_argument(
            "Exactly one of `url`, `path`, or `content` must be specified",
        ));
    }

    if let Some(url) = url {
        return Ok(TagSource::Url(url.clone()));
    }
    if let Some(path) = path {
        let mut source = tokio::fs::read_to_string(path).await?;
        source.push_str(&source_comment(path));
        return Ok(TagSource::Content(source));
    }
    Ok(TagSource::Content(content.cloned().unwrap_or_default()))
}

fn script_source_comment(path: &Path) -> String {
    format!("\n//# sourceURL={}", path.display().to_string().replace('\n', ""))
}

fn style_source_comment(path: &Path) -> String {
    format!("\n/*# sourceURL={}*/", path.display().to_string().replace('\n', ""))
}

// ============================================================================
// Frame - Script Execution
// ============================================================================

impl Frame {
    /// Evaluates a function declaration in the main world.
    ///
    /// Waits for the main world's execution context if none is live yet.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let sum = frame.evaluate("(a, b) => a + b", vec![json!(1).into(), json!(2).into()]).await?;
    /// ```
    ///
    /// # Errors
    ///
    /// - [`Error::ContextUnavailable`] if the frame detached
    /// - [`Error::ScriptError`] if the function threw
    pub async fn evaluate(&self, function: &str, args: Vec<EvalArg>) -> Result<Value> {
        debug!(frame_id = %self.id(), function_len = function.len(), "Evaluating");
        self.main_world()?.evaluate(function, args).await
    }

    /// Evaluates a function declaration in the main world and returns a handle.
    ///
    /// # Errors
    ///
    /// Same as [`evaluate`](Self::evaluate).
    pub async fn evaluate_handle(&self, function: &str, args: Vec<EvalArg>) -> Result<JsHandle> {
        debug!(frame_id = %self.id(), function_len = function.len(), "Evaluating for handle");
        self.main_world()?.evaluate_handle(function, args).await
    }
}

// ============================================================================
// Frame - Content
// ============================================================================

impl Frame {
    /// Returns the serialized document, including the doctype.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ContextUnavailable`] if the frame detached.
    pub async fn content(&self) -> Result<String> {
        let value = self.utility_world()?.evaluate(CONTENT_JS, vec![]).await?;
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| Error::protocol("Document content is not a string"))
    }

    /// Returns the document title.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ContextUnavailable`] if the frame detached.
    pub async fn title(&self) -> Result<String> {
        let value = self.utility_world()?.evaluate(TITLE_JS, vec![]).await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    /// Replaces the document and waits for its lifecycle milestones.
    ///
    /// # Errors
    ///
    /// - [`Error::ContextUnavailable`] if the frame detached before writing
    /// - [`Error::NavigationTimeout`] if the milestones were not reached in time
    pub async fn set_content(&self, html: &str, options: WaitForNavigationOptions) -> Result<()> {
        let manager = self.manager()?;
        let timeout = options
            .timeout
            .unwrap_or_else(|| manager.options.timeouts.navigation_timeout());

        debug!(frame_id = %self.id(), html_len = html.len(), "Setting content");
        self.utility_world()?
            .evaluate(SET_CONTENT_JS, vec![json!(html).into()])
            .await?;

        let mut watcher =
            FrameManager::from_inner(manager).watch(self.id(), &options.wait_until, timeout);
        let result = watcher.wait(WaitMode::Lifecycle).await.map(|_| ());
        watcher.dispose();
        result
    }

    /// Injects a `<script>` element into the main world.
    ///
    /// Resolves once a URL script has loaded. Returns a handle to the element.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] unless exactly one source is set
    /// - [`Error::Io`] if the file cannot be read
    /// - [`Error::ScriptError`] if the script failed to load
    pub async fn add_script_tag(&self, options: ScriptTagOptions) -> Result<JsHandle> {
        let source = resolve_tag_source(
            options.url.as_ref(),
            options.path.as_ref(),
            options.content.as_ref(),
            script_source_comment,
        )
        .await?;

        let (url, content) = match source {
            TagSource::Url(url) => (Some(url), None),
            TagSource::Content(content) => (None, Some(content)),
        };
        debug!(frame_id = %self.id(), url = ?url, "Adding script tag");

        let arg = json!({
            "url": url,
            "id": options.id,
            "type": options.script_type,
            "content": content,
        });
        self.main_world()?
            .evaluate_handle(ADD_SCRIPT_TAG_JS, vec![arg.into()])
            .await
    }

    /// Injects a stylesheet (`<link>` or `<style>`) into the main world.
    ///
    /// Resolves once the stylesheet has loaded. Returns a handle to the element.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] unless exactly one source is set
    /// - [`Error::Io`] if the file cannot be read
    /// - [`Error::ScriptError`] if the stylesheet failed to load
    pub async fn add_style_tag(&self, options: StyleTagOptions) -> Result<JsHandle> {
        let source = resolve_tag_source(
            options.url.as_ref(),
            options.path.as_ref(),
            options.content.as_ref(),
            style_source_comment,
        )
        .await?;

        let arg = match source {
            TagSource::Url(url) => json!({ "url": url }),
            TagSource::Content(content) => json!({ "content": content }),
        };
        debug!(frame_id = %self.id(), "Adding style tag");

        self.main_world()?
            .evaluate_handle(ADD_STYLE_TAG_JS, vec![arg.into()])
            .await
    }
}

// ============================================================================
// Tests
// ============================================================================

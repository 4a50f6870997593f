//! Browser automation
//!
//! [`BrowserDriver`] launches one [`RenderSession`] per task; the session owns
//! one browser and one page and is reused for every address of the task.
//! [`ChromeDriver`] is the headless Chromium implementation.

use crate::capture::{CaptureError, CaptureOutcome, RequestObserver};
use crate::config::CaptureConfig;
use crate::tasks::{ApiCallRecord, TaskId};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams, EventRequestWillBeSent, ResourceType,
};
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use futures::StreamExt;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Interval between readiness and selector checks
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Launches rendering sessions
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    /// Starts a browser with one blank page
    ///
    /// # Errors
    ///
    /// Returns `CaptureError::Launch` if the browser cannot be started.
    async fn launch(&self) -> CaptureOutcome<Box<dyn RenderSession>>;
}

/// One browser plus one page, exclusively owned by a capture invocation
#[async_trait]
pub trait RenderSession: Send {
    /// Installs a standing observer for XHR/fetch requests of every later
    /// navigation in this session
    async fn observe_requests(
        &mut self,
        task_id: TaskId,
        observer: Arc<dyn RequestObserver>,
    ) -> CaptureOutcome<()>;

    async fn navigate(&mut self, url: &str, timeout: Duration) -> CaptureOutcome<()>;

    /// Waits for the document to finish loading
    async fn wait_for_idle(&mut self, timeout: Duration) -> CaptureOutcome<()>;

    /// Waits until an element matching `selector` is laid out and visible
    async fn wait_for_selector(&mut self, selector: &str, timeout: Duration)
        -> CaptureOutcome<()>;

    async fn evaluate(&mut self, script: &str) -> CaptureOutcome<()>;

    /// PNG bytes of the whole document, not just the viewport
    async fn screenshot_full_page(&mut self) -> CaptureOutcome<Vec<u8>>;

    /// Releases the page and the browser; calling it again is a no-op
    async fn close(&mut self) -> CaptureOutcome<()>;
}

/// Headless Chromium driver
#[derive(Debug, Clone)]
pub struct ChromeDriver {
    config: CaptureConfig,
}

impl ChromeDriver {
    pub fn new(config: CaptureConfig) -> Self {
        Self { config }
    }

    fn browser_config(&self) -> CaptureOutcome<BrowserConfig> {
        let mut builder = BrowserConfig::builder()
            .window_size(self.config.window_width, self.config.window_height)
            .request_timeout(self.config.navigation_timeout());

        if !self.config.sandbox {
            builder = builder.no_sandbox();
        }

        builder.build().map_err(CaptureError::Launch)
    }
}

#[async_trait]
impl BrowserDriver for ChromeDriver {
    async fn launch(&self) -> CaptureOutcome<Box<dyn RenderSession>> {
        let (mut browser, mut handler) = Browser::launch(self.browser_config()?)
            .await
            .map_err(|e| CaptureError::Launch(e.to_string()))?;

        // The handler drives the CDP connection and must be polled for the
        // browser's lifetime
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("Browser connection closed: {}", e);
                    break;
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                let _ = browser.close().await;
                handler_task.abort();
                return Err(CaptureError::Launch(e.to_string()));
            }
        };

        tracing::debug!(
            "Launched headless browser ({}x{})",
            self.config.window_width,
            self.config.window_height
        );

        Ok(Box::new(ChromeSession {
            browser,
            page,
            handler_task,
            listener_task: None,
            closed: false,
        }))
    }
}

struct ChromeSession {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
    listener_task: Option<JoinHandle<()>>,
    closed: bool,
}

/// Flattens a CDP header object into name/value strings
fn header_map(headers: &serde_json::Value) -> BTreeMap<String, String> {
    let Some(object) = headers.as_object() else {
        return BTreeMap::new();
    };

    object
        .iter()
        .map(|(name, value)| {
            let value = match value.as_str() {
                Some(s) => s.to_string(),
                None => value.to_string(),
            };
            (name.clone(), value)
        })
        .collect()
}

/// Expression that is true once an element matching `selector` is rendered
/// with a non-empty box; images must also have finished decoding
fn visible_element_script(selector: &str) -> CaptureOutcome<String> {
    let selector =
        serde_json::to_string(selector).map_err(|e| CaptureError::Script(e.to_string()))?;

    Ok(format!(
        "Array.from(document.querySelectorAll({})).some((el) => {{ \
         const rect = el.getBoundingClientRect(); \
         const style = window.getComputedStyle(el); \
         const shown = rect.width > 0 && rect.height > 0 \
         && style.visibility !== 'hidden' && style.display !== 'none'; \
         const loaded = !(el instanceof HTMLImageElement) \
         || (el.complete && el.naturalWidth > 0); \
         return shown && loaded; }})",
        selector
    ))
}

fn is_api_call(resource_type: Option<&ResourceType>) -> bool {
    matches!(resource_type, Some(ResourceType::Xhr) | Some(ResourceType::Fetch))
}

#[async_trait]
impl RenderSession for ChromeSession {
    async fn observe_requests(
        &mut self,
        task_id: TaskId,
        observer: Arc<dyn RequestObserver>,
    ) -> CaptureOutcome<()> {
        self.page
            .execute(EnableParams::default())
            .await
            .map_err(|e| CaptureError::Launch(format!("network domain: {}", e)))?;

        let mut events = self
            .page
            .event_listener::<EventRequestWillBeSent>()
            .await
            .map_err(|e| CaptureError::Launch(format!("request listener: {}", e)))?;

        let listener = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                if !is_api_call(event.r#type.as_ref()) {
                    continue;
                }

                let headers = serde_json::to_value(&event.request.headers)
                    .map(|value| header_map(&value))
                    .unwrap_or_default();

                observer.on_request(
                    &task_id,
                    ApiCallRecord {
                        url: event.request.url.clone(),
                        method: event.request.method.clone(),
                        headers,
                    },
                );
            }
        });

        if let Some(previous) = self.listener_task.replace(listener) {
            previous.abort();
        }
        Ok(())
    }

    async fn navigate(&mut self, url: &str, timeout: Duration) -> CaptureOutcome<()> {
        match tokio::time::timeout(timeout, self.page.goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(CaptureError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            }),
            Err(_) => Err(CaptureError::Timeout {
                operation: "navigation",
                after: timeout,
            }),
        }
    }

    async fn wait_for_idle(&mut self, timeout: Duration) -> CaptureOutcome<()> {
        let page = &self.page;
        let ready = async {
            page.wait_for_navigation()
                .await
                .map_err(|e| CaptureError::Script(e.to_string()))?;

            loop {
                let state: String = page
                    .evaluate("document.readyState")
                    .await
                    .map_err(|e| CaptureError::Script(e.to_string()))?
                    .into_value()
                    .map_err(|e| CaptureError::Script(e.to_string()))?;

                if state == "complete" {
                    return Ok(());
                }
                tokio::time::sleep(POLL_INTERVAL).await;
            }
        };

        tokio::time::timeout(timeout, ready)
            .await
            .map_err(|_| CaptureError::Timeout {
                operation: "page load",
                after: timeout,
            })?
    }

    async fn wait_for_selector(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> CaptureOutcome<()> {
        let script = visible_element_script(selector)?;
        let page = &self.page;
        let visible = async {
            loop {
                let shown: bool = page
                    .evaluate(script.as_str())
                    .await
                    .map_err(|e| CaptureError::Script(e.to_string()))?
                    .into_value()
                    .map_err(|e| CaptureError::Script(e.to_string()))?;

                if shown {
                    return Ok(());
                }
                tokio::time::sleep(POLL_INTERVAL).await;
            }
        };

        tokio::time::timeout(timeout, visible)
            .await
            .map_err(|_| CaptureError::Timeout {
                operation: "selector wait",
                after: timeout,
            })?
    }

    async fn evaluate(&mut self, script: &str) -> CaptureOutcome<()> {
        self.page
            .evaluate(script)
            .await
            .map(|_| ())
            .map_err(|e| CaptureError::Script(e.to_string()))
    }

    async fn screenshot_full_page(&mut self) -> CaptureOutcome<Vec<u8>> {
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .full_page(true)
            .build();

        self.page
            .screenshot(params)
            .await
            .map_err(|e| CaptureError::Screenshot(e.to_string()))
    }

    async fn close(&mut self) -> CaptureOutcome<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        if let Some(listener) = self.listener_task.take() {
            listener.abort();
        }

        if let Err(e) = self.page.clone().close().await {
            tracing::debug!("Failed to close page: {}", e);
        }

        let result = self
            .browser
            .close()
            .await
            .map(|_| ())
            .map_err(|e| CaptureError::Shutdown(e.to_string()));

        if let Err(e) = self.browser.wait().await {
            tracing::debug!("Failed to reap browser process: {}", e);
        }
        self.handler_task.abort();

        result
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        if let Some(listener) = self.listener_task.take() {
            listener.abort();
        }
        self.handler_task.abort();
    }
}

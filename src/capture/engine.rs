//! Capture engine - the per-task screenshot loop
//!
//! One browser session is launched per invocation and reused for every
//! address. Pages are captured strictly in input order; a failure on one page
//! is logged and skipped, and only a session that cannot be established fails
//! the invocation.

use crate::capture::{
    BrowserDriver, CaptureOutcome, RenderSession, RequestObserver,
    SCROLL_TO_BOTTOM, SCROLL_TO_TOP,
};
use crate::config::{CaptureConfig, StorageConfig};
use crate::storage::{screenshot_filename, screenshot_key, ObjectStore, SCREENSHOT_CONTENT_TYPE};
use crate::tasks::{CaptureResult, TaskId, TaskStore};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

/// Renders and screenshots every page of a task
pub struct CaptureEngine {
    driver: Arc<dyn BrowserDriver>,
    object_store: Arc<dyn ObjectStore>,
    tasks: Arc<TaskStore>,
    config: CaptureConfig,
    bucket: String,
    link_expiry: Duration,
}

impl CaptureEngine {
    pub fn new(
        driver: Arc<dyn BrowserDriver>,
        object_store: Arc<dyn ObjectStore>,
        tasks: Arc<TaskStore>,
        config: CaptureConfig,
        storage: &StorageConfig,
    ) -> Self {
        Self {
            driver,
            object_store,
            tasks,
            config,
            bucket: storage.bucket.clone(),
            link_expiry: storage.link_expiry(),
        }
    }

    /// Captures every distinct address, appending one `CaptureResult` per
    /// successful page to the task
    ///
    /// API calls observed in the session are appended to the task as they
    /// happen. Returns the number of pages captured.
    ///
    /// # Errors
    ///
    /// Only a browser session that cannot be launched or observed fails;
    /// per-page navigation, rendering and upload errors are logged and the
    /// page is skipped. The session is closed before returning either way.
    pub async fn capture(&self, task_id: TaskId, addresses: &[String]) -> CaptureOutcome<usize> {
        let mut session = self.driver.launch().await?;

        let observer: Arc<dyn RequestObserver> = self.tasks.clone();
        if let Err(e) = session.observe_requests(task_id, observer).await {
            self.close_session(task_id, session.as_mut()).await;
            return Err(e);
        }

        tracing::info!("Task {}: capturing {} pages", task_id, addresses.len());

        let mut seen: HashSet<&str> = HashSet::new();
        let mut captured = 0;

        for (position, address) in addresses.iter().enumerate() {
            if !seen.insert(address.as_str()) {
                tracing::debug!("Task {}: skipping duplicate {}", task_id, address);
                continue;
            }

            let (filename, retrieval_url) = match self
                .capture_page(session.as_mut(), task_id, position + 1, address)
                .await
            {
                Ok(stored) => stored,
                Err(e) => {
                    tracing::warn!("Task {}: error capturing {}: {}", task_id, address, e);
                    continue;
                }
            };

            let result = CaptureResult {
                filename,
                retrieval_url,
                index: captured,
                address: address.clone(),
            };

            if let Err(e) = self.tasks.append_capture(&task_id, result) {
                tracing::warn!("Task {}: dropping capture of {}: {}", task_id, address, e);
                continue;
            }
            captured += 1;
            tracing::info!("Task {}: captured {} ({}/{})", task_id, address, captured, seen.len());
        }

        self.close_session(task_id, session.as_mut()).await;

        tracing::info!(
            "Task {}: captured {} of {} distinct pages",
            task_id,
            captured,
            seen.len()
        );
        Ok(captured)
    }

    /// Renders one page, uploads its screenshot and returns
    /// `(filename, retrieval_url)`
    async fn capture_page(
        &self,
        session: &mut dyn RenderSession,
        task_id: TaskId,
        position: usize,
        address: &str,
    ) -> CaptureOutcome<(String, String)> {
        session
            .navigate(address, self.config.navigation_timeout())
            .await?;
        session.wait_for_idle(self.config.settle_timeout()).await?;

        // Best-effort: lazy pages may never show the selector
        if let Err(e) = session
            .wait_for_selector(&self.config.wait_selector, self.config.selector_timeout())
            .await
        {
            tracing::debug!("Task {}: {} on {}, capturing anyway", task_id, e, address);
        }

        session.evaluate(SCROLL_TO_BOTTOM).await?;
        tokio::time::sleep(self.config.scroll_pause()).await;
        session.evaluate(SCROLL_TO_TOP).await?;
        tokio::time::sleep(self.config.scroll_pause()).await;

        let png = session.screenshot_full_page().await?;

        let filename = screenshot_filename(position);
        let key = screenshot_key(&task_id, &filename);
        self.object_store
            .put_object(&self.bucket, &key, png, SCREENSHOT_CONTENT_TYPE)
            .await?;
        let retrieval_url = self
            .object_store
            .presigned_url(&self.bucket, &key, self.link_expiry)
            .await?;

        Ok((filename, retrieval_url))
    }

    async fn close_session(&self, task_id: TaskId, session: &mut dyn RenderSession) {
        if let Err(e) = session.close().await {
            tracing::warn!("Task {}: {}", task_id, e);
        }
    }
}

//! Task orchestration
//!
//! A task runs two phases on one background unit of work: discovery (crawl,
//! then record the addresses) and capture (screenshot every address). Capture
//! starts only after discovery succeeded, and the two never overlap. Callers
//! poll [`Orchestrator::get_task_status`] for progress.

use crate::capture::{BrowserDriver, CaptureEngine};
use crate::config::Config;
use crate::crawler::LinkCrawler;
use crate::output::{dedupe_api_calls, ApiCallSummary};
use crate::sitemap::{build_tree, SitemapNode};
use crate::state::TaskStatus;
use crate::storage::{sitemap_key, ObjectStore, SITEMAP_CONTENT_TYPE};
use crate::tasks::{TaskId, TaskSnapshot, TaskStore};
use crate::RecceError;
use std::collections::HashMap;
use futures::FutureExt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::{JoinError, JoinHandle};

/// Starts tasks and serves their state
pub struct Orchestrator {
    pipeline: Arc<Pipeline>,
    handles: Mutex<HashMap<TaskId, JoinHandle<()>>>,
}

/// Everything a task's background work needs
struct Pipeline {
    tasks: Arc<TaskStore>,
    crawler: LinkCrawler,
    engine: CaptureEngine,
    object_store: Arc<dyn ObjectStore>,
    bucket: String,
}

impl Orchestrator {
    /// Creates an orchestrator over an existing task table
    ///
    /// # Errors
    ///
    /// Returns an error if the crawl HTTP client cannot be built.
    pub fn new(
        config: &Config,
        tasks: Arc<TaskStore>,
        driver: Arc<dyn BrowserDriver>,
        object_store: Arc<dyn ObjectStore>,
    ) -> Result<Self, RecceError> {
        let crawler = LinkCrawler::new(&config.crawler)?;
        let engine = CaptureEngine::new(
            driver,
            Arc::clone(&object_store),
            Arc::clone(&tasks),
            config.capture.clone(),
            &config.storage,
        );

        Ok(Self {
            pipeline: Arc::new(Pipeline {
                tasks,
                crawler,
                engine,
                object_store,
                bucket: config.storage.bucket.clone(),
            }),
            handles: Mutex::new(HashMap::new()),
        })
    }

    pub fn tasks(&self) -> &Arc<TaskStore> {
        &self.pipeline.tasks
    }

    /// Accepts a seed address and starts its task in the background
    ///
    /// Returns immediately; an unusable seed surfaces as a `failed` task, not
    /// as an error here. Must be called within a Tokio runtime.
    pub fn start_task(&self, seed: &str) -> TaskId {
        self.reap_finished();

        let id = self.pipeline.tasks.create(seed);
        tracing::info!("Task {}: accepted {}", id, seed);

        let pipeline = Arc::clone(&self.pipeline);
        let seed = seed.to_string();
        let handle = tokio::spawn(async move { pipeline.run(id, seed).await });

        self.lock_handles().insert(id, handle);
        id
    }

    /// Point-in-time snapshot; never waits on background work
    pub fn get_task_status(&self, id: &TaskId) -> Option<TaskSnapshot> {
        self.reap_finished();
        self.pipeline.tasks.get(id)
    }

    /// Sitemap tree of the task's discovered addresses
    ///
    /// A task still discovering yields a bare root.
    pub fn sitemap(&self, id: &TaskId) -> Option<SitemapNode> {
        let task = self.get_task_status(id)?;
        Some(build_tree(task.addresses.unwrap_or_default()))
    }

    /// Plain directory-tree listing of the sitemap
    pub fn render_sitemap(&self, id: &TaskId) -> Option<Vec<String>> {
        self.sitemap(id).map(|tree| tree.render())
    }

    /// Directory-tree listing whose labels link to each page
    pub fn render_sitemap_links(&self, id: &TaskId) -> Option<Vec<String>> {
        self.sitemap(id).map(|tree| tree.render_links())
    }

    /// API calls deduplicated by method and address without query
    pub fn render_api_calls(&self, id: &TaskId) -> Option<Vec<ApiCallSummary>> {
        let task = self.get_task_status(id)?;
        Some(dedupe_api_calls(&task.api_calls))
    }

    /// Waits for the task's background work to finish and returns its final
    /// state
    ///
    /// Intended for the CLI and tests; polling clients use
    /// [`get_task_status`](Self::get_task_status).
    pub async fn wait_for(&self, id: &TaskId) -> Result<TaskSnapshot, RecceError> {
        let handle = self.lock_handles().remove(id);

        if let Some(handle) = handle {
            self.settle(id, handle.await);
        }

        self.get_task_status(id).ok_or(RecceError::TaskNotFound(*id))
    }

    /// Drops the handles of background work that has ended
    fn reap_finished(&self) {
        let finished: Vec<(TaskId, JoinHandle<()>)> = {
            let mut handles = self.lock_handles();
            let ids: Vec<TaskId> = handles
                .iter()
                .filter(|(_, handle)| handle.is_finished())
                .map(|(id, _)| *id)
                .collect();
            ids.into_iter()
                .filter_map(|id| handles.remove(&id).map(|handle| (id, handle)))
                .collect()
        };

        for (id, handle) in finished {
            // Already finished, so this resolves immediately
            let joined = handle.now_or_never().unwrap_or(Ok(()));
            self.settle(&id, joined);
        }
    }

    /// Fails a task whose background work ended without reaching a terminal
    /// state (a panic, or an abort)
    fn settle(&self, id: &TaskId, joined: Result<(), JoinError>) {
        let Some(task) = self.pipeline.tasks.get(id) else {
            return;
        };
        if task.status.is_terminal() {
            return;
        }

        let reason = match joined {
            Ok(()) => "background work ended before the task finished".to_string(),
            Err(e) => format!("background work aborted: {}", e),
        };
        tracing::error!("Task {}: {}", id, reason);
        if let Err(e) = self.pipeline.tasks.fail(id, reason) {
            tracing::debug!("Task {}: {}", id, e);
        }
    }

    fn lock_handles(&self) -> MutexGuard<'_, HashMap<TaskId, JoinHandle<()>>> {
        self.handles.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Pipeline {
    async fn run(&self, id: TaskId, seed: String) {
        let addresses = match self.discover(id, &seed).await {
            Ok(addresses) => addresses,
            Err(e) => {
                self.fail(id, "discovery", &e);
                return;
            }
        };

        match self.capture(id, &addresses).await {
            Ok(()) => tracing::info!("Task {}: complete", id),
            Err(e) => self.fail(id, "capture", &e),
        }
    }

    /// Phase 1: crawl, record the addresses, publish them
    async fn discover(&self, id: TaskId, seed: &str) -> Result<Vec<String>, RecceError> {
        let result = self.crawler.crawl(seed).await?;
        let addresses = result.into_addresses();

        self.tasks.set_addresses(&id, addresses.clone())?;
        self.upload_sitemap(id, &addresses).await;
        self.tasks.set_status(&id, TaskStatus::SitemapComplete)?;

        tracing::info!("Task {}: sitemap complete ({} pages)", id, addresses.len());
        Ok(addresses)
    }

    /// Phase 2: screenshot every discovered page
    async fn capture(&self, id: TaskId, addresses: &[String]) -> Result<(), RecceError> {
        self.tasks.set_status(&id, TaskStatus::CapturingScreenshots)?;
        self.engine.capture(id, addresses).await?;
        self.tasks.set_status(&id, TaskStatus::Complete)?;
        Ok(())
    }

    /// Stores the address list next to the screenshots; failure is not fatal
    async fn upload_sitemap(&self, id: TaskId, addresses: &[String]) {
        let bytes = match serde_json::to_vec(addresses) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!("Task {}: could not serialize sitemap: {}", id, e);
                return;
            }
        };

        let key = sitemap_key(&id);
        if let Err(e) = self
            .object_store
            .put_object(&self.bucket, &key, bytes, SITEMAP_CONTENT_TYPE)
            .await
        {
            tracing::warn!("Task {}: could not store {}: {}", id, key, e);
        }
    }

    fn fail(&self, id: TaskId, phase: &str, error: &RecceError) {
        tracing::error!("Task {}: {} failed: {}", id, phase, error);
        if let Err(e) = self.tasks.fail(&id, error.to_string()) {
            tracing::warn!("Task {}: could not record failure: {}", id, e);
        }
    }
}

//! Integration tests for the task pipeline
//!
//! These tests run whole tasks through the orchestrator: wiremock serves the
//! site, a scripted browser stands in for Chromium, and screenshots land in
//! an in-memory object store.

use async_trait::async_trait;
use site_recce::capture::{BrowserDriver, CaptureError, CaptureOutcome, RenderSession, RequestObserver};
use site_recce::config::Config;
use site_recce::storage::MemoryObjectStore;
use site_recce::tasks::{ApiCallRecord, TaskId, TaskSnapshot};
use site_recce::{Orchestrator, TaskStatus, TaskStore};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BUCKET: &str = "recce-results";

/// Scripted browser
///
/// Every page renders unless its address is listed in `timeouts`; pages listed
/// in `api_calls` issue those requests when navigated to.
#[derive(Default)]
struct ScriptedBrowser {
    fail_launch: bool,
    timeouts: HashSet<String>,
    api_calls: HashMap<String, Vec<ApiCallRecord>>,
    gate: Option<Arc<Notify>>,
}

struct ScriptedSession {
    timeouts: HashSet<String>,
    api_calls: HashMap<String, Vec<ApiCallRecord>>,
    observer: Option<(TaskId, Arc<dyn RequestObserver>)>,
    current: Option<String>,
}

#[async_trait]
impl BrowserDriver for ScriptedBrowser {
    async fn launch(&self) -> CaptureOutcome<Box<dyn RenderSession>> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.fail_launch {
            return Err(CaptureError::Launch("chromium not found".to_string()));
        }
        Ok(Box::new(ScriptedSession {
            timeouts: self.timeouts.clone(),
            api_calls: self.api_calls.clone(),
            observer: None,
            current: None,
        }))
    }
}

#[async_trait]
impl RenderSession for ScriptedSession {
    async fn observe_requests(
        &mut self,
        task_id: TaskId,
        observer: Arc<dyn RequestObserver>,
    ) -> CaptureOutcome<()> {
        self.observer = Some((task_id, observer));
        Ok(())
    }

    async fn navigate(&mut self, url: &str, timeout: Duration) -> CaptureOutcome<()> {
        if self.timeouts.contains(url) {
            return Err(CaptureError::Timeout {
                operation: "navigation",
                after: timeout,
            });
        }
        if let (Some((task_id, observer)), Some(calls)) = (&self.observer, self.api_calls.get(url)) {
            for call in calls {
                observer.on_request(task_id, call.clone());
            }
        }
        self.current = Some(url.to_string());
        Ok(())
    }

    async fn wait_for_idle(&mut self, _timeout: Duration) -> CaptureOutcome<()> {
        Ok(())
    }

    async fn wait_for_selector(&mut self, _selector: &str, timeout: Duration) -> CaptureOutcome<()> {
        // Pages in these tests never contain images
        Err(CaptureError::Timeout {
            operation: "selector wait",
            after: timeout,
        })
    }

    async fn evaluate(&mut self, _script: &str) -> CaptureOutcome<()> {
        Ok(())
    }

    async fn screenshot_full_page(&mut self) -> CaptureOutcome<Vec<u8>> {
        Ok(self.current.clone().unwrap_or_default().into_bytes())
    }

    async fn close(&mut self) -> CaptureOutcome<()> {
        Ok(())
    }
}

/// Creates a test configuration with short timeouts and no scroll pauses
fn create_test_config() -> Config {
    let mut config = Config::default();
    config.crawler.request_timeout_secs = 2;
    config.capture.scroll_pause_ms = 0;
    config
}

struct Harness {
    orchestrator: Orchestrator,
    objects: Arc<MemoryObjectStore>,
}

fn harness(browser: ScriptedBrowser) -> Harness {
    let objects = Arc::new(MemoryObjectStore::new());
    let orchestrator = Orchestrator::new(
        &create_test_config(),
        Arc::new(TaskStore::new()),
        Arc::new(browser),
        objects.clone(),
    )
    .expect("Failed to create orchestrator");
    Harness {
        orchestrator,
        objects,
    }
}

/// Serves `/` -> `/a` -> `/a/b`
async fn nested_site() -> MockServer {
    let server = MockServer::start().await;
    for (route, body) in [
        ("/", r#"<a href="/a">A</a>"#),
        ("/a", r#"<a href="/a/b">B</a>"#),
        ("/a/b", r#"<a href="/">Home</a>"#),
    ] {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/html"))
            .mount(&server)
            .await;
    }
    server
}

/// Polls until `done` holds for the task, panicking after a few seconds
async fn poll_until<F>(orchestrator: &Orchestrator, id: &TaskId, done: F) -> TaskSnapshot
where
    F: Fn(&TaskSnapshot) -> bool,
{
    tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            let task = orchestrator.get_task_status(id).expect("task vanished");
            if done(&task) {
                return task;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("timed out polling task")
}

#[tokio::test]
async fn test_full_pipeline_completes() {
    let server = nested_site().await;
    let base = server.uri();
    let h = harness(ScriptedBrowser::default());

    let id = h.orchestrator.start_task(&format!("{}/", base));
    let task = h.orchestrator.wait_for(&id).await.expect("wait failed");

    assert_eq!(task.status, TaskStatus::Complete);
    assert!(task.error.is_none());
    assert_eq!(
        task.addresses,
        Some(vec![
            format!("{}/", base),
            format!("{}/a", base),
            format!("{}/a/b", base),
        ])
    );

    // One capture per page, in discovery order
    let captured: Vec<&str> = task.captures.iter().map(|c| c.address.as_str()).collect();
    assert_eq!(
        captured,
        vec![
            format!("{}/", base),
            format!("{}/a", base),
            format!("{}/a/b", base),
        ]
    );
    for (index, capture) in task.captures.iter().enumerate() {
        assert_eq!(capture.index, index);
        assert_eq!(capture.filename, format!("screenshot_{}.png", index + 1));
        assert!(capture.retrieval_url.contains(&id.to_string()));
    }

    // Screenshots and the address list are stored under the task's namespace
    let keys = h.objects.keys(BUCKET);
    assert_eq!(
        keys,
        vec![
            format!("{}/screenshots/screenshot_1.png", id),
            format!("{}/screenshots/screenshot_2.png", id),
            format!("{}/screenshots/screenshot_3.png", id),
            format!("{}/sitemap.json", id),
        ]
    );
    let sitemap = h.objects.get(BUCKET, &format!("{}/sitemap.json", id)).unwrap();
    let stored: Vec<String> = serde_json::from_slice(&sitemap.bytes).unwrap();
    assert_eq!(Some(stored), task.addresses);

    assert_eq!(
        h.orchestrator.render_sitemap(&id),
        Some(vec!["└── a".to_string(), "    └── b".to_string()])
    );
    assert_eq!(
        h.orchestrator.render_sitemap_links(&id),
        Some(vec![
            format!("└── [a]({}/a)", base),
            format!("    └── [b]({}/a/b)", base),
        ])
    );
}

#[tokio::test]
async fn test_api_calls_deduplicated_on_read() {
    let server = nested_site().await;
    let base = server.uri();
    let browser = ScriptedBrowser {
        api_calls: HashMap::from([
            (
                format!("{}/", base),
                vec![ApiCallRecord::new("GET", format!("{}/api/items?page=1", base))],
            ),
            (
                format!("{}/a", base),
                vec![ApiCallRecord::new("GET", format!("{}/api/items?page=2", base))],
            ),
        ]),
        ..ScriptedBrowser::default()
    };
    let h = harness(browser);

    let id = h.orchestrator.start_task(&format!("{}/", base));
    let task = h.orchestrator.wait_for(&id).await.expect("wait failed");

    assert_eq!(task.api_calls.len(), 2);

    let deduped = h.orchestrator.render_api_calls(&id).unwrap();
    assert_eq!(deduped.len(), 1);
    assert_eq!(deduped[0].method, "GET");
    assert_eq!(deduped[0].url, format!("{}/api/items", base));
    assert_eq!(deduped[0].count, 2);
}

#[tokio::test]
async fn test_navigation_timeout_skips_page_and_completes() {
    let server = nested_site().await;
    let base = server.uri();
    let browser = ScriptedBrowser {
        timeouts: HashSet::from([format!("{}/a", base)]),
        ..ScriptedBrowser::default()
    };
    let h = harness(browser);

    let id = h.orchestrator.start_task(&format!("{}/", base));
    let task = h.orchestrator.wait_for(&id).await.expect("wait failed");

    assert_eq!(task.status, TaskStatus::Complete);
    let captured: Vec<&str> = task.captures.iter().map(|c| c.address.as_str()).collect();
    assert_eq!(captured, vec![format!("{}/", base), format!("{}/a/b", base)]);
}

#[tokio::test]
async fn test_seed_fetch_error_still_completes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    let seed = format!("{}/", server.uri());
    let h = harness(ScriptedBrowser::default());

    let id = h.orchestrator.start_task(&seed);
    let task = h.orchestrator.wait_for(&id).await.expect("wait failed");

    assert_eq!(task.status, TaskStatus::Complete);
    assert_eq!(task.addresses, Some(vec![seed.clone()]));
    assert_eq!(task.captures.len(), 1);
    assert_eq!(task.captures[0].address, seed);
    assert_eq!(h.orchestrator.render_sitemap(&id), Some(Vec::new()));
}

#[tokio::test]
async fn test_launch_failure_fails_task_but_keeps_addresses() {
    let server = nested_site().await;
    let browser = ScriptedBrowser {
        fail_launch: true,
        ..ScriptedBrowser::default()
    };
    let h = harness(browser);

    let id = h.orchestrator.start_task(&format!("{}/", server.uri()));
    let task = h.orchestrator.wait_for(&id).await.expect("wait failed");

    assert_eq!(task.status, TaskStatus::Failed);
    assert_eq!(task.addresses.as_ref().map(Vec::len), Some(3));
    assert!(task.captures.is_empty());
    let error = task.error.expect("failed task without error");
    assert!(error.contains("chromium not found"), "unexpected error: {}", error);
}

#[tokio::test]
async fn test_invalid_seed_fails_before_capture() {
    let h = harness(ScriptedBrowser::default());

    let id = h.orchestrator.start_task("ftp://example.com/");
    let task = h.orchestrator.wait_for(&id).await.expect("wait failed");

    assert_eq!(task.status, TaskStatus::Failed);
    assert!(task.addresses.is_none());
    assert!(h.objects.is_empty());
}

#[tokio::test]
async fn test_status_is_observable_between_phases() {
    let server = nested_site().await;
    let gate = Arc::new(Notify::new());
    let browser = ScriptedBrowser {
        gate: Some(gate.clone()),
        ..ScriptedBrowser::default()
    };
    let h = harness(browser);

    let id = h.orchestrator.start_task(&format!("{}/", server.uri()));
    assert!(h.orchestrator.get_task_status(&id).is_some());

    // Capture is held at browser launch: discovery is done, nothing captured
    let task = poll_until(&h.orchestrator, &id, |t| {
        t.status == TaskStatus::CapturingScreenshots
    })
    .await;
    assert_eq!(task.addresses.as_ref().map(Vec::len), Some(3));
    assert!(task.captures.is_empty());
    assert_eq!(h.orchestrator.render_sitemap(&id).map(|l| l.len()), Some(2));

    gate.notify_one();
    let task = h.orchestrator.wait_for(&id).await.expect("wait failed");
    assert_eq!(task.status, TaskStatus::Complete);
    assert_eq!(task.captures.len(), 3);
    assert!(task.updated_at >= task.created_at);
}

#[tokio::test]
async fn test_concurrent_tasks_are_independent() {
    let first_site = nested_site().await;
    let second_site = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<p>only page</p>", "text/html"))
        .mount(&second_site)
        .await;
    let h = harness(ScriptedBrowser::default());

    let first = h.orchestrator.start_task(&format!("{}/", first_site.uri()));
    let second = h.orchestrator.start_task(&format!("{}/", second_site.uri()));
    assert_ne!(first, second);

    let second_task = h.orchestrator.wait_for(&second).await.expect("wait failed");
    let first_task = h.orchestrator.wait_for(&first).await.expect("wait failed");

    assert_eq!(first_task.status, TaskStatus::Complete);
    assert_eq!(second_task.status, TaskStatus::Complete);
    assert_eq!(first_task.captures.len(), 3);
    assert_eq!(second_task.captures.len(), 1);

    let keys = h.objects.keys(BUCKET);
    let first_keys = keys.iter().filter(|k| k.starts_with(&first.to_string())).count();
    let second_keys = keys.iter().filter(|k| k.starts_with(&second.to_string())).count();
    assert_eq!(first_keys, 4);
    assert_eq!(second_keys, 2);
}

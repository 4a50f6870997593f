//! Network request observation

use crate::tasks::{ApiCallRecord, TaskId, TaskStore};

/// Receives every XHR/fetch request issued while a task's pages render
///
/// Called from the browser's event stream, so implementations must not block.
pub trait RequestObserver: Send + Sync {
    fn on_request(&self, task_id: &TaskId, request: ApiCallRecord);
}

impl RequestObserver for TaskStore {
    fn on_request(&self, task_id: &TaskId, request: ApiCallRecord) {
        tracing::debug!("Task {} observed {} {}", task_id, request.method, request.url);
        if let Err(e) = self.append_api_call(task_id, request) {
            tracing::warn!("Dropping API call for task {}: {}", task_id, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_observer_appends() {
        let store = TaskStore::new();
        let id = store.create("https://example.com/");

        store.on_request(&id, ApiCallRecord::new("GET", "https://example.com/api/items"));
        store.on_request(&id, ApiCallRecord::new("GET", "https://example.com/api/items"));

        assert_eq!(store.get(&id).unwrap().api_calls.len(), 2);
    }

    #[test]
    fn test_unknown_task_is_ignored() {
        let store = TaskStore::new();
        store.on_request(&TaskId::new(), ApiCallRecord::new("GET", "https://example.com/"));
        assert!(store.is_empty());
    }
}

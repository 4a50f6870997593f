//! In-memory task table
//!
//! Every mutation of a task record goes through [`TaskStore`]. Readers get
//! cloned snapshots, so a caller polling a task mid-capture sees some prefix of
//! its captures and API calls, never a half-written element.

use crate::state::TaskStatus;
use crate::RecceError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

/// Opaque unique task identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Allocates a fresh random identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TaskId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// One successfully captured page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureResult {
    /// Stored file name, e.g. `screenshot_3.png`
    pub filename: String,
    /// Time-limited link to the stored screenshot
    pub retrieval_url: String,
    /// Position among this task's captures (0-based, capture order)
    pub index: usize,
    /// The page that was captured
    pub address: String,
}

/// One XHR/fetch request observed while rendering any page of a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiCallRecord {
    pub url: String,
    pub method: String,
    pub headers: BTreeMap<String, String>,
}

impl ApiCallRecord {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: method.into(),
            headers: BTreeMap::new(),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// Point-in-time copy of a task record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskSnapshot {
    pub id: TaskId,
    pub seed: String,
    pub status: TaskStatus,
    /// Discovered addresses; `None` until discovery completes
    pub addresses: Option<Vec<String>>,
    pub captures: Vec<CaptureResult>,
    pub api_calls: Vec<ApiCallRecord>,
    /// Message of the phase-level error that failed the task
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TaskSnapshot {
    fn new(id: TaskId, seed: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            seed,
            status: TaskStatus::Running,
            addresses: None,
            captures: Vec::new(),
            api_calls: Vec::new(),
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.status.is_terminal()
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Process-wide task table
///
/// Cheap to share behind an `Arc`; every operation takes the lock for the
/// duration of one small copy or append.
#[derive(Debug, Default)]
pub struct TaskStore {
    tasks: RwLock<HashMap<TaskId, TaskSnapshot>>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new task in `running` status
    pub fn create(&self, seed: &str) -> TaskId {
        let id = TaskId::new();
        self.write()
            .insert(id, TaskSnapshot::new(id, seed.to_string()));
        id
    }

    /// Returns a copy of the task's current state
    pub fn get(&self, id: &TaskId) -> Option<TaskSnapshot> {
        self.read().get(id).cloned()
    }

    pub fn contains(&self, id: &TaskId) -> bool {
        self.read().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Records the crawl result; it can only be set once
    pub fn set_addresses(&self, id: &TaskId, addresses: Vec<String>) -> Result<(), RecceError> {
        self.update(id, |task| {
            if task.addresses.is_some() {
                return Err(RecceError::AddressesAlreadySet(*id));
            }
            task.addresses = Some(addresses);
            Ok(())
        })
    }

    pub fn append_capture(&self, id: &TaskId, capture: CaptureResult) -> Result<(), RecceError> {
        self.update(id, |task| {
            task.captures.push(capture);
            Ok(())
        })
    }

    pub fn append_api_call(&self, id: &TaskId, call: ApiCallRecord) -> Result<(), RecceError> {
        self.update(id, |task| {
            task.api_calls.push(call);
            Ok(())
        })
    }

    /// Moves the task to `status`
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` unless `current -> status` is a legal edge.
    pub fn set_status(&self, id: &TaskId, status: TaskStatus) -> Result<(), RecceError> {
        self.update(id, |task| {
            if !task.status.can_transition_to(status) {
                return Err(RecceError::InvalidTransition {
                    from: task.status,
                    to: status,
                });
            }
            task.status = status;
            Ok(())
        })
    }

    /// Moves the task to `failed`, keeping everything accumulated so far
    pub fn fail(&self, id: &TaskId, error: impl Into<String>) -> Result<(), RecceError> {
        let error = error.into();
        self.update(id, |task| {
            if !task.status.can_transition_to(TaskStatus::Failed) {
                return Err(RecceError::InvalidTransition {
                    from: task.status,
                    to: TaskStatus::Failed,
                });
            }
            task.status = TaskStatus::Failed;
            task.error = Some(error);
            Ok(())
        })
    }

    fn update<F>(&self, id: &TaskId, f: F) -> Result<(), RecceError>
    where
        F: FnOnce(&mut TaskSnapshot) -> Result<(), RecceError>,
    {
        let mut tasks = self.write();
        let task = tasks.get_mut(id).ok_or(RecceError::TaskNotFound(*id))?;
        f(task)?;
        task.touch();
        Ok(())
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<TaskId, TaskSnapshot>> {
        self.tasks.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<TaskId, TaskSnapshot>> {
        self.tasks.write().unwrap_or_else(PoisonError::into_inner)
    }
}

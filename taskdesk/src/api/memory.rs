//! In-process backend used by tests and `--offline` mode.
//!
//! Behaves like the REST backend for the task endpoints: lists newest
//! first, assigns server ids on create, answers 404 for unknown ids. Tests
//! can queue failures with [`InMemoryApi::fail_next`] and stall every
//! request with [`InMemoryApi::hold`] to inspect optimistic state while a
//! request is in flight.

use std::collections::VecDeque;

use chrono::Utc;
use parking_lot::Mutex;
use taskdesk_proto::task::{NewTask, TaskId, TaskRecord, TaskUpdate};
use tokio::sync::watch;

use super::{ApiError, TodoApi};

#[derive(Debug, Default)]
struct ServerState {
    /// Newest first.
    records: Vec<TaskRecord>,
    next_id: u64,
    preset_ids: VecDeque<String>,
    failures: VecDeque<ApiError>,
    requests: u64,
}

/// Task backend that keeps its records in memory.
#[derive(Debug)]
pub struct InMemoryApi {
    state: Mutex<ServerState>,
    held: watch::Sender<bool>,
}

impl Default for InMemoryApi {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryApi {
    /// Creates an empty backend.
    #[must_use]
    pub fn new() -> Self {
        let (held, _) = watch::channel(false);
        Self {
            state: Mutex::new(ServerState::default()),
            held,
        }
    }

    /// Creates a backend pre-filled with `records` (newest first).
    #[must_use]
    pub fn with_records(records: Vec<TaskRecord>) -> Self {
        let api = Self::new();
        api.state.lock().records = records;
        api
    }

    /// Makes the next request fail with `error`. Queued failures are used
    /// in order.
    pub fn fail_next(&self, error: ApiError) {
        self.state.lock().failures.push_back(error);
    }

    /// Makes the next create use `id` instead of a generated one.
    pub fn assign_next_id(&self, id: impl Into<String>) {
        self.state.lock().preset_ids.push_back(id.into());
    }

    /// Stalls every request until [`release`](Self::release) is called.
    pub fn hold(&self) {
        self.held.send_replace(true);
    }

    /// Lets stalled requests proceed.
    pub fn release(&self) {
        self.held.send_replace(false);
    }

    /// Current server-side records, newest first.
    #[must_use]
    pub fn records(&self) -> Vec<TaskRecord> {
        self.state.lock().records.clone()
    }

    /// Number of requests received so far.
    #[must_use]
    pub fn request_count(&self) -> u64 {
        self.state.lock().requests
    }

    async fn enter(&self) -> Result<(), ApiError> {
        self.state.lock().requests += 1;
        let mut held = self.held.subscribe();
        // The sender lives as long as `self`, so this only ends on release.
        let _ = held.wait_for(|held| !*held).await;
        match self.state.lock().failures.pop_front() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

fn not_found() -> ApiError {
    ApiError::NotFound {
        message: Some("Todo not found".to_string()),
    }
}

impl TodoApi for InMemoryApi {
    async fn list(&self) -> Result<Vec<TaskRecord>, ApiError> {
        self.enter().await?;
        Ok(self.records())
    }

    async fn create(&self, task: &NewTask) -> Result<TaskRecord, ApiError> {
        self.enter().await?;
        let mut state = self.state.lock();
        let id = match state.preset_ids.pop_front() {
            Some(id) => id,
            None => {
                state.next_id += 1;
                format!("srv-{}", state.next_id)
            }
        };
        let record = TaskRecord {
            id: TaskId::server(id),
            text: task.text.clone(),
            status: task.status.unwrap_or_default(),
            priority: task.priority,
            due_date: task.due_date,
            created_at: Utc::now(),
        };
        state.records.insert(0, record.clone());
        Ok(record)
    }

    async fn update(&self, id: &TaskId, update: &TaskUpdate) -> Result<TaskRecord, ApiError> {
        self.enter().await?;
        let mut state = self.state.lock();
        let record = state
            .records
            .iter_mut()
            .find(|r| &r.id == id)
            .ok_or_else(not_found)?;
        record.apply_update(update);
        Ok(record.clone())
    }

    async fn delete(&self, id: &TaskId) -> Result<(), ApiError> {
        self.enter().await?;
        let mut state = self.state.lock();
        let before = state.records.len();
        state.records.retain(|r| &r.id != id);
        if state.records.len() == before {
            return Err(not_found());
        }
        Ok(())
    }

    async fn clear_completed(&self) -> Result<(), ApiError> {
        self.enter().await?;
        self.state
            .lock()
            .records
            .retain(|r| !r.status.is_completed());
        Ok(())
    }
}

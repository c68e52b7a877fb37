//! Task manager: the user-facing task operations.
//!
//! `TodoManager` validates input, applies each change to the local store
//! right away, sends the request, and settles the change once the backend
//! answers. It is cheap to clone; clones share the store, the session and
//! the notice channel, so operations can be spawned as independent tasks.

use std::sync::Arc;

use chrono::Utc;
use futures_util::future::try_join_all;
use taskdesk_proto::task::{
    NewTask, TaskEdit, TaskId, TaskRecord, TaskStatus, TaskUpdate, TextPolicy,
};

use super::mutations::{AddTask, EditTask, RemoveTasks, SetStatus};
use super::{RestoredInput, SyncOutcome, TaskDraft, TaskError};
use crate::api::{ApiError, ErrorCategory, SESSION_EXPIRED, TodoApi};
use crate::notify::Notifier;
use crate::optimistic::{self, LocalStore, OnError, Settled};
use crate::session::SessionContext;

/// Coordinates the task list between the local store and the backend.
pub struct TodoManager<A> {
    api: Arc<A>,
    store: LocalStore<TaskRecord>,
    session: SessionContext,
    notices: Notifier,
    policy: TextPolicy,
}

impl<A> Clone for TodoManager<A> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            store: self.store.clone(),
            session: self.session.clone(),
            notices: self.notices.clone(),
            policy: self.policy,
        }
    }
}

impl<A: TodoApi> TodoManager<A> {
    /// Creates a manager with an empty store.
    pub fn new(api: Arc<A>, session: SessionContext, notices: Notifier) -> Self {
        Self {
            api,
            store: LocalStore::new(),
            session,
            notices,
            policy: TextPolicy::default(),
        }
    }

    /// Replaces the text policy.
    #[must_use]
    pub const fn with_policy(mut self, policy: TextPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The local store the UI renders from.
    #[must_use]
    pub const fn store(&self) -> &LocalStore<TaskRecord> {
        &self.store
    }

    /// The session this manager authenticates with.
    #[must_use]
    pub const fn session(&self) -> &SessionContext {
        &self.session
    }

    /// The backend.
    #[must_use]
    pub fn api(&self) -> &A {
        &self.api
    }

    // --- pre-flight checks ---

    fn require_session(&self) -> Result<(), TaskError> {
        if self.session.is_active() {
            Ok(())
        } else {
            self.notices.error(
                ErrorCategory::Authentication,
                TaskError::NotAuthenticated.to_string(),
            );
            Err(TaskError::NotAuthenticated)
        }
    }

    fn validate(&self, raw: &str) -> Result<String, TaskError> {
        self.policy.normalize(raw).map_err(|e| {
            self.notices.error(ErrorCategory::Validation, e.to_string());
            TaskError::Validation(e)
        })
    }

    fn require_synced(&self, id: &TaskId) -> Result<TaskRecord, TaskError> {
        if id.is_temporary() {
            return Err(TaskError::PendingSync(id.to_string()));
        }
        self.store
            .get(id)
            .ok_or_else(|| TaskError::TaskNotFound(id.to_string()))
    }

    fn on_error(e: &ApiError) -> OnError {
        match e.category() {
            // The store is reset wholesale; undoing one change first is
            // pointless.
            ErrorCategory::Authentication => OnError::Keep,
            _ => OnError::Rollback,
        }
    }

    // --- settling ---

    fn expire_session(&self) -> SyncOutcome {
        self.session.expire();
        self.store.reset();
        self.notices.error(ErrorCategory::Authentication, SESSION_EXPIRED);
        SyncOutcome::SessionExpired
    }

    fn settle<C>(
        &self,
        settled: Settled<C, ApiError>,
        success: &str,
        failure: &str,
        input: Option<RestoredInput>,
    ) -> SyncOutcome {
        match settled {
            Settled::Confirmed(_) => {
                self.notices.success(success);
                SyncOutcome::Confirmed
            }
            // Only an authentication failure keeps the change.
            Settled::Kept(_) => self.expire_session(),
            Settled::RolledBack(e) => {
                let category = e.category();
                let message = e.user_message(failure);
                tracing::warn!(error = %e, category = category.label(), "mutation rolled back");
                self.notices.error(category, message.clone());
                SyncOutcome::RolledBack {
                    category,
                    message,
                    restored_input: input,
                }
            }
            Settled::Discarded(Some(e)) if e.category() == ErrorCategory::Authentication => {
                self.expire_session()
            }
            Settled::Discarded(_) => {
                tracing::debug!("late result discarded");
                SyncOutcome::Discarded
            }
        }
    }

    // --- operations ---

    /// Fetches the task list and replaces the store with it.
    ///
    /// The listing is dropped, with [`SyncOutcome::Discarded`], if a local
    /// change was in flight or landed while it was being fetched; installing
    /// it could bring back a record the server has since deleted.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::NotAuthenticated`] when logged out, or
    /// [`TaskError::Store`] if the server list has duplicate ids.
    pub async fn refresh(&self) -> Result<SyncOutcome, TaskError> {
        self.require_session()?;
        let (epoch, version) = (self.store.epoch(), self.store.version());
        match self.api.list().await {
            Ok(records) => {
                let count = records.len();
                if self.store.replace_if_unchanged(epoch, version, records)? {
                    tracing::debug!(count, "task list refreshed");
                    Ok(SyncOutcome::Confirmed)
                } else {
                    Ok(SyncOutcome::Discarded)
                }
            }
            Err(e) if e.category() == ErrorCategory::Authentication => Ok(self.expire_session()),
            Err(e) => {
                let category = e.category();
                let message = e.user_message("Failed to fetch todos");
                tracing::warn!(error = %e, "refresh failed");
                self.notices.error(category, message.clone());
                Ok(SyncOutcome::RolledBack {
                    category,
                    message,
                    restored_input: None,
                })
            }
        }
    }

    /// Adds a task at the top of the list.
    ///
    /// On failure the placeholder is removed and the raw input comes back
    /// as the `restored_input` of [`SyncOutcome::RolledBack`].
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::Validation`] for bad text (nothing is sent) or
    /// [`TaskError::NotAuthenticated`] when logged out.
    pub async fn add(&self, draft: TaskDraft) -> Result<SyncOutcome, TaskError> {
        let text = self.validate(&draft.text)?;
        self.require_session()?;

        let placeholder = TaskRecord {
            id: TaskId::temporary(),
            text: text.clone(),
            status: TaskStatus::Pending,
            priority: draft.priority,
            due_date: draft.due_date,
            created_at: Utc::now(),
        };
        let body = NewTask {
            text,
            status: None,
            priority: draft.priority,
            due_date: draft.due_date,
        };
        let mutation = AddTask::new(placeholder);
        tracing::debug!(temp_id = %mutation.temp_id(), "adding task");

        let settled = optimistic::mutate(
            &self.store,
            &mutation,
            || self.api.create(&body),
            Self::on_error,
        )
        .await?;
        let input = RestoredInput::Add(draft.to_inline());
        Ok(self.settle(settled, "Task added!", "Failed to add task", Some(input)))
    }

    /// Replaces text, priority and due date of a task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::Validation`], [`TaskError::NotAuthenticated`],
    /// [`TaskError::TaskNotFound`] or [`TaskError::PendingSync`]; nothing
    /// is sent in those cases.
    pub async fn edit(&self, id: &TaskId, draft: TaskDraft) -> Result<SyncOutcome, TaskError> {
        let text = self.validate(&draft.text)?;
        self.require_session()?;
        self.require_synced(id)?;

        let edit = TaskEdit {
            text,
            priority: draft.priority,
            due_date: draft.due_date,
        };
        let update = TaskUpdate::Edit(edit.clone());
        let mutation = EditTask::new(id.clone(), edit);
        tracing::debug!(%id, "editing task");

        let settled = optimistic::mutate(
            &self.store,
            &mutation,
            || self.api.update(id, &update),
            Self::on_error,
        )
        .await?;
        let input = RestoredInput::Edit(id.clone(), draft.to_inline());
        Ok(self.settle(settled, "Task updated!", "Failed to update task", Some(input)))
    }

    /// Deletes a task.
    ///
    /// Any failure puts the record back, including a 404: the list stays
    /// as it was and the user is told the task no longer exists.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::NotAuthenticated`], [`TaskError::TaskNotFound`]
    /// or [`TaskError::PendingSync`].
    pub async fn delete(&self, id: &TaskId) -> Result<SyncOutcome, TaskError> {
        self.require_session()?;
        self.require_synced(id)?;

        let mutation = RemoveTasks::one(id.clone());
        tracing::debug!(%id, "deleting task");

        let settled = optimistic::mutate(
            &self.store,
            &mutation,
            || self.api.delete(id),
            Self::on_error,
        )
        .await?;
        Ok(self.settle(settled, "Task deleted!", "Failed to delete task", None))
    }

    /// Flips a task between pending and completed.
    ///
    /// # Errors
    ///
    /// Same as [`set_status`](Self::set_status).
    pub async fn toggle(&self, id: &TaskId) -> Result<SyncOutcome, TaskError> {
        self.require_session()?;
        let current = self.require_synced(id)?;
        self.set_status(id, current.status.toggled()).await
    }

    /// Sets the status of a task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::NotAuthenticated`], [`TaskError::TaskNotFound`]
    /// or [`TaskError::PendingSync`].
    pub async fn set_status(
        &self,
        id: &TaskId,
        status: TaskStatus,
    ) -> Result<SyncOutcome, TaskError> {
        self.require_session()?;
        self.require_synced(id)?;

        let update = TaskUpdate::status(status);
        let mutation = SetStatus::one(id.clone(), status);
        tracing::debug!(%id, %status, "setting task status");

        let settled = optimistic::mutate(
            &self.store,
            &mutation,
            || async { self.api.update(id, &update).await.map(|r| vec![r]) },
            Self::on_error,
        )
        .await?;
        let success = if status.is_completed() {
            "Task completed!"
        } else {
            "Task marked as pending!"
        };
        Ok(self.settle(settled, success, "Failed to update task", None))
    }

    /// Marks every pending task completed, one request per task.
    ///
    /// All of them are rolled back if any request fails.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::NothingToComplete`] if no task is pending, or
    /// [`TaskError::NotAuthenticated`].
    pub async fn complete_all(&self) -> Result<SyncOutcome, TaskError> {
        self.require_session()?;
        let ids: Vec<TaskId> = self
            .store
            .snapshot()
            .iter()
            .filter(|r| !r.status.is_completed() && !r.id.is_temporary())
            .map(|r| r.id.clone())
            .collect();
        if ids.is_empty() {
            self.notices.error(
                ErrorCategory::Validation,
                TaskError::NothingToComplete.to_string(),
            );
            return Err(TaskError::NothingToComplete);
        }

        let count = ids.len();
        let update = TaskUpdate::status(TaskStatus::Completed);
        let mutation = SetStatus::many(ids, TaskStatus::Completed);
        tracing::debug!(count, "completing all pending tasks");

        let settled = optimistic::mutate(
            &self.store,
            &mutation,
            || try_join_all(mutation.ids().iter().map(|id| self.api.update(id, &update))),
            Self::on_error,
        )
        .await?;
        let success = format!("Completed {count} {}!", plural(count));
        Ok(self.settle(settled, &success, "Failed to complete all tasks", None))
    }

    /// Removes every completed task with a single request.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::NothingToClear`] if no task is completed, or
    /// [`TaskError::NotAuthenticated`].
    pub async fn clear_completed(&self) -> Result<SyncOutcome, TaskError> {
        self.require_session()?;
        let ids: Vec<TaskId> = self
            .store
            .snapshot()
            .iter()
            .filter(|r| r.status.is_completed())
            .map(|r| r.id.clone())
            .collect();
        if ids.is_empty() {
            self.notices.error(
                ErrorCategory::Validation,
                TaskError::NothingToClear.to_string(),
            );
            return Err(TaskError::NothingToClear);
        }

        let count = ids.len();
        let mutation = RemoveTasks::many(ids);
        tracing::debug!(count, "clearing completed tasks");

        let settled = optimistic::mutate(
            &self.store,
            &mutation,
            || self.api.clear_completed(),
            Self::on_error,
        )
        .await?;
        let success = format!("Cleared {count} completed {}!", plural(count));
        Ok(self.settle(settled, &success, "Failed to clear completed tasks", None))
    }
}

const fn plural(count: usize) -> &'static str {
    if count == 1 {
        "task"
    } else {
        "tasks"
    }
}

//! The optimistic changes a task list supports.
//!
//! Each type implements [`Mutation`] for [`TaskRecord`]: how it changes the
//! list before the request is sent, how it is undone if the request fails
//! while other changes are in flight, and how the server's answer is folded
//! in.

use taskdesk_proto::task::{TaskEdit, TaskId, TaskRecord, TaskStatus};

use crate::optimistic::{Mutation, StoreError, restore_keys};

fn require(records: &[TaskRecord], id: &TaskId) -> Result<(), StoreError> {
    if records.iter().any(|r| &r.id == id) {
        Ok(())
    } else {
        Err(StoreError::MissingKey(id.to_string()))
    }
}

fn map_matching(
    records: &[TaskRecord],
    matches: impl Fn(&TaskRecord) -> bool,
    change: impl Fn(&mut TaskRecord),
) -> Vec<TaskRecord> {
    records
        .iter()
        .map(|r| {
            let mut r = r.clone();
            if matches(&r) {
                change(&mut r);
            }
            r
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Add
// ---------------------------------------------------------------------------

/// Inserts a record with a temporary id at the front of the list and swaps
/// it for the server's record once created.
#[derive(Debug, Clone)]
pub struct AddTask {
    placeholder: TaskRecord,
}

impl AddTask {
    /// Wraps a placeholder record. Its id should be temporary.
    #[must_use]
    pub const fn new(placeholder: TaskRecord) -> Self {
        Self { placeholder }
    }

    /// Temporary id of the placeholder.
    #[must_use]
    pub const fn temp_id(&self) -> &TaskId {
        &self.placeholder.id
    }
}

impl Mutation<TaskRecord> for AddTask {
    type Confirmed = TaskRecord;

    fn apply(&self, records: &[TaskRecord]) -> Result<Vec<TaskRecord>, StoreError> {
        let mut next = Vec::with_capacity(records.len() + 1);
        next.push(self.placeholder.clone());
        next.extend_from_slice(records);
        Ok(next)
    }

    fn revert(&self, current: &[TaskRecord], _before: &[TaskRecord]) -> Vec<TaskRecord> {
        current
            .iter()
            .filter(|r| r.id != self.placeholder.id)
            .cloned()
            .collect()
    }

    fn reconcile(&self, current: &[TaskRecord], confirmed: &TaskRecord) -> Vec<TaskRecord> {
        // A refresh may already have brought the server record in; keep a
        // single copy of it either way.
        if current.iter().any(|r| r.id == confirmed.id) {
            return current
                .iter()
                .filter(|r| r.id != self.placeholder.id)
                .map(|r| {
                    if r.id == confirmed.id {
                        confirmed.clone()
                    } else {
                        r.clone()
                    }
                })
                .collect();
        }
        if current.iter().any(|r| r.id == self.placeholder.id) {
            return map_matching(
                current,
                |r| r.id == self.placeholder.id,
                |r| *r = confirmed.clone(),
            );
        }
        let mut next = Vec::with_capacity(current.len() + 1);
        next.push(confirmed.clone());
        next.extend_from_slice(current);
        next
    }
}

// ---------------------------------------------------------------------------
// Edit
// ---------------------------------------------------------------------------

/// Replaces text, priority and due date of one record.
#[derive(Debug, Clone)]
pub struct EditTask {
    id: TaskId,
    edit: TaskEdit,
}

impl EditTask {
    /// Creates the mutation.
    #[must_use]
    pub const fn new(id: TaskId, edit: TaskEdit) -> Self {
        Self { id, edit }
    }
}

impl Mutation<TaskRecord> for EditTask {
    type Confirmed = TaskRecord;

    fn apply(&self, records: &[TaskRecord]) -> Result<Vec<TaskRecord>, StoreError> {
        require(records, &self.id)?;
        Ok(map_matching(
            records,
            |r| r.id == self.id,
            |r| {
                r.text.clone_from(&self.edit.text);
                r.priority = self.edit.priority;
                r.due_date = self.edit.due_date;
            },
        ))
    }

    fn revert(&self, current: &[TaskRecord], before: &[TaskRecord]) -> Vec<TaskRecord> {
        restore_keys(current, before, std::slice::from_ref(&self.id))
    }

    fn reconcile(&self, current: &[TaskRecord], _confirmed: &TaskRecord) -> Vec<TaskRecord> {
        current.to_vec()
    }
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Sets the status of a set of records (one for toggle, many for
/// complete-all).
#[derive(Debug, Clone)]
pub struct SetStatus {
    ids: Vec<TaskId>,
    status: TaskStatus,
}

impl SetStatus {
    /// Sets the status of a single record.
    #[must_use]
    pub fn one(id: TaskId, status: TaskStatus) -> Self {
        Self {
            ids: vec![id],
            status,
        }
    }

    /// Sets the status of several records at once.
    #[must_use]
    pub const fn many(ids: Vec<TaskId>, status: TaskStatus) -> Self {
        Self { ids, status }
    }

    /// Records affected.
    #[must_use]
    pub fn ids(&self) -> &[TaskId] {
        &self.ids
    }
}

impl Mutation<TaskRecord> for SetStatus {
    type Confirmed = Vec<TaskRecord>;

    fn apply(&self, records: &[TaskRecord]) -> Result<Vec<TaskRecord>, StoreError> {
        for id in &self.ids {
            require(records, id)?;
        }
        Ok(map_matching(
            records,
            |r| self.ids.contains(&r.id),
            |r| r.status = self.status,
        ))
    }

    fn revert(&self, current: &[TaskRecord], before: &[TaskRecord]) -> Vec<TaskRecord> {
        // Only the status is put back, so a concurrent edit of the same
        // record survives a failed toggle.
        map_matching(
            current,
            |r| self.ids.contains(&r.id),
            |r| {
                if let Some(old) = before.iter().find(|b| b.id == r.id) {
                    r.status = old.status;
                }
            },
        )
    }

    fn reconcile(&self, current: &[TaskRecord], _confirmed: &Vec<TaskRecord>) -> Vec<TaskRecord> {
        current.to_vec()
    }
}

// ---------------------------------------------------------------------------
// Remove
// ---------------------------------------------------------------------------

/// Removes a set of records (one for delete, all completed ones for
/// clear-completed).
#[derive(Debug, Clone)]
pub struct RemoveTasks {
    ids: Vec<TaskId>,
}

impl RemoveTasks {
    /// Removes a single record.
    #[must_use]
    pub fn one(id: TaskId) -> Self {
        Self { ids: vec![id] }
    }

    /// Removes several records.
    #[must_use]
    pub const fn many(ids: Vec<TaskId>) -> Self {
        Self { ids }
    }

    /// Records affected.
    #[must_use]
    pub fn ids(&self) -> &[TaskId] {
        &self.ids
    }
}

impl Mutation<TaskRecord> for RemoveTasks {
    type Confirmed = ();

    fn apply(&self, records: &[TaskRecord]) -> Result<Vec<TaskRecord>, StoreError> {
        for id in &self.ids {
            require(records, id)?;
        }
        Ok(records
            .iter()
            .filter(|r| !self.ids.contains(&r.id))
            .cloned()
            .collect())
    }

    fn revert(&self, current: &[TaskRecord], before: &[TaskRecord]) -> Vec<TaskRecord> {
        restore_keys(current, before, &self.ids)
    }

    fn reconcile(&self, current: &[TaskRecord], _confirmed: &()) -> Vec<TaskRecord> {
        current.to_vec()
    }
}

//! Snapshot-based local record store.
//!
//! The store owns an ordered list of records behind a single lock. Readers
//! take an [`Arc`] snapshot and never observe a half-applied change: every
//! write builds a complete new list and swaps it in. Each swap bumps a
//! version counter, which lets a pending mutation tell whether anything else
//! touched the store since it applied its optimistic change.
//!
//! Pending mutations are counted while their requests are in flight, so a
//! server listing fetched meanwhile can be recognised as possibly stale.
//!
//! The store also carries an epoch. [`LocalStore::reset`] (session ended) and
//! [`LocalStore::close`] (view unmounted) start a new epoch, and results of
//! requests issued in an earlier epoch are discarded instead of applied.

use std::collections::HashSet;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use super::{Mutation, Record};

/// An immutable view of the store contents.
pub type Snapshot<R> = Arc<Vec<R>>;

/// Errors raised when installing a new record list.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Two records in the candidate list share a key.
    #[error("duplicate record key: {0}")]
    DuplicateKey(String),
    /// The store was closed and accepts no further writes.
    #[error("store is closed")]
    Closed,
    /// A mutation targeted a key that is not in the store.
    #[error("record not found: {0}")]
    MissingKey(String),
}

#[derive(Debug)]
struct State<R> {
    records: Snapshot<R>,
    version: u64,
    epoch: u64,
    in_flight: usize,
    closed: bool,
}

/// Shared, cloneable handle to an ordered collection of records.
///
/// Clones refer to the same underlying store.
#[derive(Debug)]
pub struct LocalStore<R> {
    shared: Arc<Mutex<State<R>>>,
}

impl<R> Clone for LocalStore<R> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<R: Record> Default for LocalStore<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Record> LocalStore<R> {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Mutex::new(State {
                records: Arc::new(Vec::new()),
                version: 0,
                epoch: 0,
                in_flight: 0,
                closed: false,
            })),
        }
    }

    /// Creates a store holding `records`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateKey`] if two records share a key.
    pub fn from_records(records: Vec<R>) -> Result<Self, StoreError> {
        let store = Self::new();
        store.replace(records)?;
        Ok(store)
    }

    /// Returns the current contents.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot<R> {
        Arc::clone(&self.shared.lock().records)
    }

    /// Number of successful writes so far.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.shared.lock().version
    }

    /// Current epoch.
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.shared.lock().epoch
    }

    /// Number of mutations applied but not yet settled.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.shared.lock().in_flight
    }

    /// Returns `true` once [`close`](Self::close) has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.shared.lock().closed
    }

    /// Looks up a record by key.
    #[must_use]
    pub fn get(&self, key: &R::Key) -> Option<R> {
        self.shared
            .lock()
            .records
            .iter()
            .find(|r| r.key() == key)
            .cloned()
    }

    /// Returns `true` if a record with `key` is present.
    #[must_use]
    pub fn contains(&self, key: &R::Key) -> bool {
        self.shared.lock().records.iter().any(|r| r.key() == key)
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shared.lock().records.len()
    }

    /// Returns `true` if the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shared.lock().records.is_empty()
    }

    /// Replaces the whole contents, e.g. with a fresh server listing.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateKey`] or [`StoreError::Closed`]; the
    /// store is left unchanged in both cases.
    pub fn replace(&self, records: Vec<R>) -> Result<u64, StoreError> {
        let mut state = self.shared.lock();
        install(&mut state, records)
    }

    /// Replaces the contents with a listing fetched at `epoch` and
    /// `version`, if nothing has changed since.
    ///
    /// The listing is dropped (`Ok(false)`) when the store was written to,
    /// started a new epoch, or has a mutation in flight: the server may or
    /// may not have seen that mutation when it answered.
    ///
    /// # Errors
    ///
    /// Same as [`replace`](Self::replace).
    pub fn replace_if_unchanged(
        &self,
        epoch: u64,
        version: u64,
        records: Vec<R>,
    ) -> Result<bool, StoreError> {
        let mut state = self.shared.lock();
        if state.epoch != epoch || state.version != version || state.in_flight > 0 {
            tracing::debug!(
                in_flight = state.in_flight,
                version = state.version,
                fetched_at = version,
                "dropping listing overtaken by local changes"
            );
            return Ok(false);
        }
        install(&mut state, records).map(|_| true)
    }

    /// Empties the store and starts a new epoch.
    ///
    /// In-flight mutations from the previous epoch will be discarded when
    /// they resolve.
    pub fn reset(&self) {
        let mut state = self.shared.lock();
        state.records = Arc::new(Vec::new());
        state.version += 1;
        state.epoch += 1;
        tracing::debug!(epoch = state.epoch, "store reset");
    }

    /// Closes the store. Pending results are discarded and further writes
    /// fail with [`StoreError::Closed`].
    pub fn close(&self) {
        let mut state = self.shared.lock();
        state.closed = true;
        state.epoch += 1;
    }

    /// Applies `mutation` optimistically and returns a handle used to settle
    /// it once the server responds.
    ///
    /// # Errors
    ///
    /// Returns whatever [`Mutation::apply`] rejects with, or
    /// [`StoreError::Closed`]. Nothing is changed on error.
    pub fn begin<M: Mutation<R>>(&self, mutation: &M) -> Result<PendingMutation<R>, StoreError> {
        let mut state = self.shared.lock();
        let before = Arc::clone(&state.records);
        let next = mutation.apply(&before)?;
        let version = install(&mut state, next)?;
        state.in_flight += 1;
        Ok(PendingMutation {
            store: Arc::downgrade(&self.shared),
            before,
            version,
            epoch: state.epoch,
        })
    }
}

/// An optimistic change that has been applied but not yet settled.
///
/// Holds only a weak reference to the store, so an abandoned store is freed
/// even while requests are still in flight.
#[derive(Debug)]
pub struct PendingMutation<R> {
    store: Weak<Mutex<State<R>>>,
    before: Snapshot<R>,
    version: u64,
    epoch: u64,
}

impl<R: Record> PendingMutation<R> {
    /// The contents as they were right before the optimistic change.
    #[must_use]
    pub fn before(&self) -> &Snapshot<R> {
        &self.before
    }

    /// Returns `true` if the store still exists and is in the same epoch.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.store
            .upgrade()
            .is_some_and(|shared| shared.lock().epoch == self.epoch)
    }

    /// Reconciles the optimistic change with the server's answer.
    ///
    /// Returns `Ok(false)` if the result was discarded because the store is
    /// gone or in a newer epoch.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the reconciled list is invalid; the store
    /// keeps its current records.
    pub fn commit<M: Mutation<R>>(
        self,
        mutation: &M,
        confirmed: &M::Confirmed,
    ) -> Result<bool, StoreError> {
        self.settle(|state| Arc::new(mutation.reconcile(&state.records, confirmed)))
    }

    /// Undoes the optimistic change.
    ///
    /// If nothing else wrote to the store since the change was applied, the
    /// exact prior snapshot is restored. Otherwise only the records the
    /// mutation touched are put back, leaving concurrent changes intact.
    ///
    /// Returns `Ok(false)` if the rollback was discarded.
    ///
    /// # Errors
    ///
    /// Same as [`commit`](Self::commit).
    pub fn rollback<M: Mutation<R>>(self, mutation: &M) -> Result<bool, StoreError> {
        let version = self.version;
        let before = Arc::clone(&self.before);
        self.settle(|state| {
            if state.version == version {
                before
            } else {
                Arc::new(mutation.revert(&state.records, &before))
            }
        })
    }

    fn settle(self, next: impl FnOnce(&State<R>) -> Snapshot<R>) -> Result<bool, StoreError> {
        let Some(shared) = self.store.upgrade() else {
            return Ok(false);
        };
        let mut state = shared.lock();
        if state.closed || state.epoch != self.epoch {
            tracing::debug!(
                pending_epoch = self.epoch,
                epoch = state.epoch,
                "discarding stale result"
            );
            return Ok(false);
        }
        let candidate = next(&state);
        install_snapshot(&mut state, candidate)
            .inspect_err(|e| tracing::error!(error = %e, "settled state rejected"))?;
        Ok(true)
    }
}

impl<R> Drop for PendingMutation<R> {
    fn drop(&mut self) {
        if let Some(shared) = self.store.upgrade() {
            let mut state = shared.lock();
            state.in_flight = state.in_flight.saturating_sub(1);
        }
    }
}

fn install<R: Record>(state: &mut State<R>, records: Vec<R>) -> Result<u64, StoreError> {
    install_snapshot(state, Arc::new(records))
}

fn install_snapshot<R: Record>(
    state: &mut State<R>,
    records: Snapshot<R>,
) -> Result<u64, StoreError> {
    if state.closed {
        return Err(StoreError::Closed);
    }
    check_unique(&records)?;
    state.records = records;
    state.version += 1;
    Ok(state.version)
}

fn check_unique<R: Record>(records: &[R]) -> Result<(), StoreError> {
    let mut seen = HashSet::with_capacity(records.len());
    for record in records {
        if !seen.insert(record.key()) {
            return Err(StoreError::DuplicateKey(record.key().to_string()));
        }
    }
    Ok(())
}

/// Puts the records with `keys` back the way they were in `before`.
///
/// Records for those keys are removed from `current` and re-inserted at
/// their original positions; every other record of `current` is kept as is.
#[must_use]
pub fn restore_keys<R: Record>(current: &[R], before: &[R], keys: &[R::Key]) -> Vec<R> {
    let mut next: Vec<R> = current
        .iter()
        .filter(|r| !keys.contains(r.key()))
        .cloned()
        .collect();
    for (index, record) in before.iter().enumerate() {
        if keys.contains(record.key()) {
            next.insert(index.min(next.len()), record.clone());
        }
    }
    next
}

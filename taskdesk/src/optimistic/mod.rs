//! Optimistic mutations over a [`LocalStore`].
//!
//! A mutation is applied to the store before its request is sent, then
//! settled once the response arrives: reconciled with the server's answer on
//! success, rolled back on failure, or left alone when the caller decides the
//! failure should not undo anything (e.g. the session expired and the store
//! is being reset anyway).

pub mod store;

use std::fmt;
use std::future::Future;
use std::hash::Hash;

pub use store::{LocalStore, PendingMutation, Snapshot, StoreError, restore_keys};

/// A record that can live in a [`LocalStore`].
pub trait Record: Clone + Send + Sync + 'static {
    /// Unique key of the record within a store.
    type Key: Clone + Eq + Hash + fmt::Display + Send + Sync;

    /// Returns this record's key.
    fn key(&self) -> &Self::Key;
}

/// A local change paired with the request that makes it durable.
pub trait Mutation<R: Record> {
    /// What the server returns when the request succeeds.
    type Confirmed;

    /// Builds the optimistic contents from the current ones.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the change cannot be applied, in which
    /// case nothing is sent.
    fn apply(&self, records: &[R]) -> Result<Vec<R>, StoreError>;

    /// Undoes only this mutation's change on top of `current`, using
    /// `before` (the contents right before [`apply`](Self::apply)).
    ///
    /// Used when other writes landed in between; when nothing else happened
    /// the store restores `before` verbatim instead.
    fn revert(&self, current: &[R], before: &[R]) -> Vec<R>;

    /// Folds the server's answer into `current`.
    ///
    /// Must be idempotent: calling it on contents that already reflect
    /// `confirmed` must not change them.
    fn reconcile(&self, current: &[R], confirmed: &Self::Confirmed) -> Vec<R>;
}

/// What to do with the optimistic change when the request fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnError {
    /// Restore the pre-mutation state.
    Rollback,
    /// Leave the store as it is.
    Keep,
}

/// How a mutation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settled<C, E> {
    /// The server accepted the change and the store was reconciled.
    Confirmed(C),
    /// The request failed and the change was undone.
    RolledBack(E),
    /// The request failed but the change was kept, per [`OnError::Keep`].
    Kept(E),
    /// The store was reset or closed before the request resolved; nothing
    /// was applied. Carries the error, if the request failed.
    Discarded(Option<E>),
}

/// Applies `mutation`, runs `request`, then settles the change.
///
/// The request future is only created after the optimistic change is in
/// place, so any reader of the store sees the change before the request is
/// on the wire. `on_error` picks the fate of the change when the request
/// fails.
///
/// # Errors
///
/// Returns a [`StoreError`] if the mutation could not be applied, in which
/// case the request is not sent, or if settling it would leave the store
/// invalid, in which case the store keeps its current records.
pub async fn mutate<R, M, F, Fut, E>(
    store: &LocalStore<R>,
    mutation: &M,
    request: F,
    on_error: impl FnOnce(&E) -> OnError,
) -> Result<Settled<M::Confirmed, E>, StoreError>
where
    R: Record,
    M: Mutation<R>,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<M::Confirmed, E>>,
{
    let pending = store.begin(mutation)?;
    let settled = match request().await {
        Ok(confirmed) => {
            if pending.commit(mutation, &confirmed)? {
                Settled::Confirmed(confirmed)
            } else {
                Settled::Discarded(None)
            }
        }
        Err(e) => match on_error(&e) {
            OnError::Rollback => {
                if pending.rollback(mutation)? {
                    Settled::RolledBack(e)
                } else {
                    Settled::Discarded(Some(e))
                }
            }
            OnError::Keep => {
                if pending.is_live() {
                    Settled::Kept(e)
                } else {
                    Settled::Discarded(Some(e))
                }
            }
        },
    };
    Ok(settled)
}

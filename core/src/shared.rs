//! A store that can change while serving.

use crate::{Activation, NodeId, OwnedMatch, PatternStore, StoreError, Target};
use parking_lot::{RwLock, RwLockReadGuard};
use std::collections::HashSet;
use std::sync::Arc;

/// Cloneable handle to a [`PatternStore`] behind a readers-writer lock.
///
/// Matches take the read lock and return an [`OwnedMatch`], so no guard
/// outlives the call. Insertion and removal take the write lock and wait for
/// in-flight matches to finish; a match never observes a half-built path.
#[derive(Debug)]
pub struct SharedStore<V> {
    inner: Arc<RwLock<PatternStore<V>>>,
}

impl<V> Clone for SharedStore<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V> Default for SharedStore<V> {
    fn default() -> Self {
        Self::new(PatternStore::new())
    }
}

impl<V> From<PatternStore<V>> for SharedStore<V> {
    fn from(store: PatternStore<V>) -> Self {
        Self::new(store)
    }
}

impl<V> SharedStore<V> {
    /// Wrap a built store.
    #[must_use]
    pub fn new(store: PatternStore<V>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(store)),
        }
    }

    /// Insert under the write lock. See [`PatternStore::insert`].
    ///
    /// # Errors
    ///
    /// As for [`PatternStore::insert`].
    pub fn insert<S: AsRef<str>>(
        &self,
        primary: &[S],
        context: &[S],
        scope: &[S],
        payload: V,
    ) -> Result<NodeId, StoreError> {
        self.inner.write().insert(primary, context, scope, payload)
    }

    /// Remove under the write lock. See [`PatternStore::remove`].
    ///
    /// # Errors
    ///
    /// As for [`PatternStore::remove`].
    pub fn remove<S: AsRef<str>>(
        &self,
        primary: &[S],
        context: &[S],
        scope: &[S],
    ) -> Result<bool, StoreError> {
        self.inner.write().remove(primary, context, scope)
    }

    /// Tracked match under the read lock.
    ///
    /// # Errors
    ///
    /// As for [`PatternStore::match_query`].
    pub fn match_query<S: AsRef<str>>(
        &self,
        primary: &[S],
        context: &[S],
        scope: &[S],
    ) -> Result<Option<OwnedMatch<V>>, StoreError>
    where
        V: Clone,
    {
        let store = self.inner.read();
        let result = store.match_query(primary, context, scope)?;
        Ok(result.map(|m| m.into_owned()))
    }

    /// Untracked match under the read lock.
    ///
    /// # Errors
    ///
    /// As for [`PatternStore::search`].
    pub fn search<S: AsRef<str>>(
        &self,
        primary: &[S],
        context: &[S],
        scope: &[S],
    ) -> Result<Option<OwnedMatch<V>>, StoreError>
    where
        V: Clone,
    {
        let store = self.inner.read();
        let result = store.search(primary, context, scope)?;
        Ok(result.map(|m| m.into_owned()))
    }

    /// Hold the read lock for a batch of operations.
    #[must_use]
    pub fn read(&self) -> RwLockReadGuard<'_, PatternStore<V>> {
        self.inner.read()
    }

    /// See [`PatternStore::drain_activations`].
    pub fn drain_activations(&self, node: NodeId) -> HashSet<Activation> {
        self.inner.read().drain_activations(node)
    }

    /// See [`PatternStore::checkpoint`].
    pub fn checkpoint(&self) -> Vec<Target<V>>
    where
        V: Clone,
    {
        self.inner.read().checkpoint()
    }

    /// Number of stored patterns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Returns `true` if no pattern is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

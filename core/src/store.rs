//! The pattern store: an owned wildcard trie.
//!
//! Paths are `primary <context> context <scope> scope`, one edge per token.
//! Shared prefixes share nodes, and only the node ending an inserted path
//! carries a payload.

use crate::node::{IdAllocator, Node};
use crate::pattern::EdgeRef;
use crate::search;
use crate::{
    Activation, ActivationLog, ActivationTracker, EmptySegmentPolicy, Match, MatchPolicy, NodeId,
    PatternKey, QueryKey, SearchTrace, Segment, StoreError, MAX_PATH_TOKENS,
};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// A drained activation paired with the current payload of its pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Target<V> {
    /// Terminal node the activation was recorded on.
    pub node: NodeId,
    /// The pattern that matched.
    pub pattern: PatternKey,
    /// The pattern's payload at checkpoint time.
    pub payload: V,
    /// The query that activated the pattern.
    pub query: QueryKey,
}

/// Wildcard trie mapping three-segment patterns to payloads.
///
/// Mutation takes `&mut self`; [`search`](Self::search) and
/// [`match_query`](Self::match_query) take `&self`, so an
/// `Arc<PatternStore<V>>` can serve concurrent readers once built. Use
/// [`SharedStore`](crate::SharedStore) when the store must change while
/// serving.
pub struct PatternStore<V> {
    root: Node<V>,
    policy: MatchPolicy,
    tracker: Arc<dyn ActivationTracker>,
    ids: IdAllocator,
    categories: usize,
    max_path_len: usize,
}

impl<V> Default for PatternStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> fmt::Debug for PatternStore<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatternStore")
            .field("categories", &self.categories)
            .field("nodes", &self.node_count())
            .field("max_path_len", &self.max_path_len)
            .field("policy", &self.policy)
            .field("tracker", &self.tracker)
            .finish()
    }
}

impl<V> PatternStore<V> {
    /// Empty store with the default policy and an unbounded [`ActivationLog`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_policy(MatchPolicy::default())
    }

    /// Empty store with the given policy.
    #[must_use]
    pub fn with_policy(policy: MatchPolicy) -> Self {
        Self {
            root: Node::new(NodeId::ROOT),
            policy,
            tracker: Arc::new(ActivationLog::new()),
            ids: IdAllocator::new(),
            categories: 0,
            max_path_len: 0,
        }
    }

    /// Replace the activation tracker.
    #[must_use]
    pub fn with_tracker(mut self, tracker: Arc<dyn ActivationTracker>) -> Self {
        self.tracker = tracker;
        self
    }

    /// The store's policy.
    #[must_use]
    pub fn policy(&self) -> MatchPolicy {
        self.policy
    }

    /// The activation tracker in use.
    #[must_use]
    pub fn tracker(&self) -> &Arc<dyn ActivationTracker> {
        &self.tracker
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Insertion and removal
    // ═══════════════════════════════════════════════════════════════════════

    /// Insert a pattern, overwriting the payload if the exact path exists.
    ///
    /// Returns the terminal node.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] for reserved tokens, empty segments under
    /// [`EmptySegmentPolicy::Reject`], or paths over [`MAX_PATH_TOKENS`].
    pub fn insert<S: AsRef<str>>(
        &mut self,
        primary: &[S],
        context: &[S],
        scope: &[S],
        payload: V,
    ) -> Result<NodeId, StoreError> {
        let key = PatternKey::new(primary, context, scope)?;
        self.insert_key(key, payload).map(|(id, _)| id)
    }

    /// Like [`insert`](Self::insert), but returns the payload it displaced.
    ///
    /// # Errors
    ///
    /// As for [`insert`](Self::insert).
    pub fn replace<S: AsRef<str>>(
        &mut self,
        primary: &[S],
        context: &[S],
        scope: &[S],
        payload: V,
    ) -> Result<Option<V>, StoreError> {
        let key = PatternKey::new(primary, context, scope)?;
        self.insert_key(key, payload).map(|(_, old)| old)
    }

    /// Insert an already parsed pattern.
    ///
    /// # Errors
    ///
    /// As for [`insert`](Self::insert), minus reserved tokens.
    pub fn insert_key(&mut self, key: PatternKey, payload: V) -> Result<(NodeId, Option<V>), StoreError> {
        let key = key.normalized(self.policy.empty_segment)?;
        let len = key.path_len();
        if len > MAX_PATH_TOKENS {
            return Err(StoreError::PathTooLong {
                len,
                max: MAX_PATH_TOKENS,
            });
        }

        let ids = &mut self.ids;
        let mut node = &mut self.root;
        for edge in key.edges() {
            node = node.child_or_insert_with(edge, || ids.next_id());
        }
        let id = node.id;
        let old = node.payload.replace(payload);

        if old.is_none() {
            self.categories += 1;
        }
        self.max_path_len = self.max_path_len.max(len);
        tracing::debug!(pattern = %key, node = %id, replaced = old.is_some(), "inserted pattern");
        Ok((id, old))
    }

    /// Remove a pattern. Returns `Ok(false)` if it was never inserted.
    ///
    /// Nodes left without children or payload are pruned bottom-up, and the
    /// tracker forgets the terminal node.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the pattern itself is malformed.
    pub fn remove<S: AsRef<str>>(
        &mut self,
        primary: &[S],
        context: &[S],
        scope: &[S],
    ) -> Result<bool, StoreError> {
        let key = PatternKey::new(primary, context, scope)?;
        self.remove_key(&key).map(|removed| removed.is_some())
    }

    /// Remove an already parsed pattern, returning its payload.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::EmptySegment`] under [`EmptySegmentPolicy::Reject`].
    pub fn remove_key(&mut self, key: &PatternKey) -> Result<Option<V>, StoreError> {
        let key = key.clone().normalized(self.policy.empty_segment)?;
        let edges: Vec<EdgeRef<'_>> = key.edges().collect();
        let Some((id, payload)) = prune(&mut self.root, &edges) else {
            tracing::debug!(pattern = %key, "remove: pattern not found");
            return Ok(None);
        };
        self.categories -= 1;
        self.tracker.forget(id);
        tracing::debug!(pattern = %key, node = %id, "removed pattern");
        Ok(Some(payload))
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Exact lookup and introspection
    // ═══════════════════════════════════════════════════════════════════════

    /// Exact lookup: wildcards in the arguments only match wildcard edges.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the pattern is malformed.
    pub fn get<S: AsRef<str>>(
        &self,
        primary: &[S],
        context: &[S],
        scope: &[S],
    ) -> Result<Option<&V>, StoreError> {
        self.get_key(&PatternKey::new(primary, context, scope)?)
    }

    /// Exact lookup of an already parsed pattern.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::EmptySegment`] under [`EmptySegmentPolicy::Reject`].
    pub fn get_key(&self, key: &PatternKey) -> Result<Option<&V>, StoreError> {
        let key = key.clone().normalized(self.policy.empty_segment)?;
        Ok(self.terminal(&key).and_then(|n| n.payload.as_ref()))
    }

    fn terminal(&self, key: &PatternKey) -> Option<&Node<V>> {
        key.edges().try_fold(&self.root, |node, edge| node.child(edge))
    }

    /// Number of stored patterns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.categories
    }

    /// Returns `true` if no pattern is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.categories == 0
    }

    /// Number of trie nodes, root included.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.root.subtree_len()
    }

    /// Longest path ever inserted, separators included.
    ///
    /// This is a high-water mark; removals do not lower it.
    #[must_use]
    pub fn max_path_len(&self) -> usize {
        self.max_path_len
    }

    /// All stored patterns with their payloads, sorted by pattern.
    pub fn iter(&self) -> impl Iterator<Item = (PatternKey, &V)> + '_ {
        let mut out = Vec::with_capacity(self.categories);
        collect(&self.root, &mut Vec::new(), &mut out);
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out.into_iter()
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Matching
    // ═══════════════════════════════════════════════════════════════════════

    /// Find the best matching pattern for a query, without tracking.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] for reserved tokens in the query, or an empty
    /// segment under [`EmptySegmentPolicy::Reject`]. No match is `Ok(None)`.
    pub fn search<S: AsRef<str>>(
        &self,
        primary: &[S],
        context: &[S],
        scope: &[S],
    ) -> Result<Option<Match<'_, V>>, StoreError> {
        self.search_key(&QueryKey::new(primary, context, scope)?)
    }

    /// [`search`](Self::search) for an already validated query.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::EmptySegment`] under [`EmptySegmentPolicy::Reject`].
    pub fn search_key(&self, query: &QueryKey) -> Result<Option<Match<'_, V>>, StoreError> {
        self.check_query(query)?;
        let (result, _) = search::run(&self.root, query, self.policy.branch_order, false);
        match &result {
            Some(m) => tracing::trace!(query = %query, pattern = %m.pattern(), node = %m.node(), "matched"),
            None => tracing::trace!(query = %query, "no match"),
        }
        Ok(result)
    }

    /// Search and record every attempted branch.
    ///
    /// # Errors
    ///
    /// As for [`search`](Self::search).
    pub fn search_with_trace<S: AsRef<str>>(
        &self,
        primary: &[S],
        context: &[S],
        scope: &[S],
    ) -> Result<SearchTrace<'_, V>, StoreError> {
        let query = QueryKey::new(primary, context, scope)?;
        self.check_query(&query)?;
        let (result, steps) = search::run(&self.root, &query, self.policy.branch_order, true);
        Ok(SearchTrace { result, steps })
    }

    /// [`search`](Self::search), then record the activation on the matched node.
    ///
    /// Tracking failures are logged and do not affect the result.
    ///
    /// # Errors
    ///
    /// As for [`search`](Self::search).
    pub fn match_query<S: AsRef<str>>(
        &self,
        primary: &[S],
        context: &[S],
        scope: &[S],
    ) -> Result<Option<Match<'_, V>>, StoreError> {
        self.match_key(&QueryKey::new(primary, context, scope)?)
    }

    /// [`match_query`](Self::match_query) for an already validated query.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::EmptySegment`] under [`EmptySegmentPolicy::Reject`].
    pub fn match_key(&self, query: &QueryKey) -> Result<Option<Match<'_, V>>, StoreError> {
        let result = self.search_key(query)?;
        if let Some(m) = &result {
            let activation = Activation {
                pattern: m.pattern().clone(),
                query: m.query().clone(),
            };
            if let Err(err) = self.tracker.record(m.node(), activation) {
                tracing::warn!(node = %m.node(), error = %err, "failed to record activation");
            }
        }
        Ok(result)
    }

    fn check_query(&self, query: &QueryKey) -> Result<(), StoreError> {
        if self.policy.empty_segment == EmptySegmentPolicy::Reject {
            if let Some(segment) = Segment::ALL
                .into_iter()
                .find(|s| query.segment(*s).is_empty())
            {
                return Err(StoreError::EmptySegment { segment });
            }
        }
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Usage tracking
    // ═══════════════════════════════════════════════════════════════════════

    /// Take every activation recorded on `node`.
    ///
    /// This is destructive: a second call returns an empty set until new
    /// matches land on the node.
    pub fn drain_activations(&self, node: NodeId) -> HashSet<Activation> {
        self.tracker.drain(node)
    }

    /// Drain all activations and pair each with its pattern's current payload.
    ///
    /// Activations whose pattern has been removed since they were recorded
    /// are dropped. The result is sorted by pattern, then query.
    pub fn checkpoint(&self) -> Vec<Target<V>>
    where
        V: Clone,
    {
        let mut targets = Vec::new();
        for (node, activations) in self.tracker.drain_all() {
            for activation in activations {
                let live = self
                    .terminal(&activation.pattern)
                    .filter(|n| n.id == node)
                    .and_then(|n| n.payload.as_ref());
                let Some(payload) = live else {
                    tracing::debug!(node = %node, pattern = %activation.pattern, "dropping stale activation");
                    continue;
                };
                targets.push(Target {
                    node,
                    payload: payload.clone(),
                    pattern: activation.pattern,
                    query: activation.query,
                });
            }
        }
        targets.sort_by(|a, b| (&a.pattern, &a.query).cmp(&(&b.pattern, &b.query)));
        tracing::info!(targets = targets.len(), "checkpoint");
        targets
    }
}

/// Clear the payload at the end of `edges` and prune emptied nodes on the way
/// back up. Returns the terminal id and payload if one was there.
fn prune<V>(node: &mut Node<V>, edges: &[EdgeRef<'_>]) -> Option<(NodeId, V)> {
    let Some((&first, rest)) = edges.split_first() else {
        let payload = node.payload.take()?;
        return Some((node.id, payload));
    };
    let child = node.child_mut(first)?;
    let removed = prune(child, rest)?;
    if child.is_prunable() {
        node.remove_child(first);
    }
    Some(removed)
}

fn collect<'a, V>(node: &'a Node<V>, path: &mut Vec<EdgeRef<'a>>, out: &mut Vec<(PatternKey, &'a V)>) {
    if let Some(payload) = &node.payload {
        out.push((PatternKey::from_edges(path.iter().copied()), payload));
    }
    for (edge, child) in node.children() {
        path.push(edge);
        collect(child, path, out);
        path.pop();
    }
}

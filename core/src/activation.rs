//! Usage tracking.
//!
//! Every successful tracked match reports which query activated which
//! terminal node. The store never reads this data back while matching; it is
//! drained by an offline consumer through [`PatternStore::checkpoint`] or
//! [`PatternStore::drain_activations`].
//!
//! [`PatternStore::checkpoint`]: crate::PatternStore::checkpoint
//! [`PatternStore::drain_activations`]: crate::PatternStore::drain_activations

use crate::{NodeId, PatternKey, QueryKey, TrackingError};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::fmt::Debug;

/// One recorded activation: the pattern that matched and the query that
/// matched it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Activation {
    /// The matched pattern, wildcards included.
    pub pattern: PatternKey,
    /// The query as the caller supplied it.
    pub query: QueryKey,
}

/// Sink for activations.
///
/// Implementations are shared by every concurrent match on a store, so they
/// must synchronize internally.
pub trait ActivationTracker: Send + Sync + Debug {
    /// Record an activation of `node`. Recording the same activation twice
    /// is a no-op; returns whether the activation was new.
    ///
    /// # Errors
    ///
    /// Returns a [`TrackingError`] when the activation cannot be stored. The
    /// store logs the error and the match still succeeds.
    fn record(&self, node: NodeId, activation: Activation) -> Result<bool, TrackingError>;

    /// Remove and return every activation recorded for `node`.
    fn drain(&self, node: NodeId) -> HashSet<Activation>;

    /// Remove and return every activation recorded for every node.
    fn drain_all(&self) -> Vec<(NodeId, HashSet<Activation>)>;

    /// Discard whatever was recorded for `node`; called when its payload is removed.
    fn forget(&self, node: NodeId);
}

// ═══════════════════════════════════════════════════════════════════════════════
// ActivationLog
// ═══════════════════════════════════════════════════════════════════════════════

/// In-memory activation sets keyed by node, behind a mutex.
#[derive(Debug, Default)]
pub struct ActivationLog {
    nodes: Mutex<HashMap<NodeId, HashSet<Activation>>>,
    max_per_node: Option<usize>,
}

impl ActivationLog {
    /// Unbounded log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Log that refuses new activations for a node once it holds `max` of them.
    #[must_use]
    pub fn with_capacity_per_node(max: usize) -> Self {
        Self {
            nodes: Mutex::default(),
            max_per_node: Some(max),
        }
    }

    /// Number of activations currently held for `node`.
    #[must_use]
    pub fn count(&self, node: NodeId) -> usize {
        self.nodes.lock().get(&node).map_or(0, HashSet::len)
    }

    /// Number of nodes with at least one pending activation.
    #[must_use]
    pub fn activated_nodes(&self) -> usize {
        self.nodes.lock().len()
    }
}

impl ActivationTracker for ActivationLog {
    fn record(&self, node: NodeId, activation: Activation) -> Result<bool, TrackingError> {
        let mut nodes = self.nodes.lock();
        let held = match nodes.get(&node) {
            Some(set) if set.contains(&activation) => return Ok(false),
            Some(set) => set.len(),
            None => 0,
        };
        if let Some(max) = self.max_per_node {
            if held >= max {
                return Err(TrackingError::CapacityExceeded { node, max });
            }
        }
        Ok(nodes.entry(node).or_default().insert(activation))
    }

    fn drain(&self, node: NodeId) -> HashSet<Activation> {
        self.nodes.lock().remove(&node).unwrap_or_default()
    }

    fn drain_all(&self) -> Vec<(NodeId, HashSet<Activation>)> {
        self.nodes.lock().drain().collect()
    }

    fn forget(&self, node: NodeId) {
        self.nodes.lock().remove(&node);
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// NoopTracker
// ═══════════════════════════════════════════════════════════════════════════════

/// Tracker that records nothing. Used when tracking is disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTracker;

impl ActivationTracker for NoopTracker {
    fn record(&self, _node: NodeId, _activation: Activation) -> Result<bool, TrackingError> {
        Ok(false)
    }

    fn drain(&self, _node: NodeId) -> HashSet<Activation> {
        HashSet::new()
    }

    fn drain_all(&self) -> Vec<(NodeId, HashSet<Activation>)> {
        Vec::new()
    }

    fn forget(&self, _node: NodeId) {}
}

//! Trie vertices.
//!
//! Literal children live in a hash map for O(1) lookup by borrowed `&str`.
//! Wildcard and separator children each get a dedicated slot, so a node can
//! never hold two `_` or two `*` children.

use crate::pattern::EdgeRef;
use std::collections::HashMap;
use std::fmt;

/// Stable handle to a trie node.
///
/// Ids are allocated per store and never reused, so a handle to a pruned node
/// stays dangling rather than aliasing a newer node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeId(pub(crate) u64);

impl NodeId {
    /// The root node of every store.
    pub const ROOT: NodeId = NodeId(0);

    /// The raw id.
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Hands out fresh [`NodeId`]s.
#[derive(Debug)]
pub(crate) struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    pub(crate) fn new() -> Self {
        // 0 is the root
        Self { next: 1 }
    }

    pub(crate) fn next_id(&mut self) -> NodeId {
        let id = NodeId(self.next);
        self.next += 1;
        id
    }
}

#[derive(Debug)]
pub(crate) struct Node<V> {
    pub(crate) id: NodeId,
    /// Present only on nodes that end an inserted path.
    pub(crate) payload: Option<V>,
    words: HashMap<String, Node<V>>,
    wild_one: Option<Box<Node<V>>>,
    wild_any: Option<Box<Node<V>>>,
    context: Option<Box<Node<V>>>,
    scope: Option<Box<Node<V>>>,
}

impl<V> Node<V> {
    pub(crate) fn new(id: NodeId) -> Self {
        Self {
            id,
            payload: None,
            words: HashMap::new(),
            wild_one: None,
            wild_any: None,
            context: None,
            scope: None,
        }
    }

    pub(crate) fn child(&self, edge: EdgeRef<'_>) -> Option<&Node<V>> {
        match edge {
            EdgeRef::Word(w) => self.words.get(w),
            EdgeRef::WildOne => self.wild_one.as_deref(),
            EdgeRef::WildAny => self.wild_any.as_deref(),
            EdgeRef::Context => self.context.as_deref(),
            EdgeRef::Scope => self.scope.as_deref(),
        }
    }

    pub(crate) fn child_mut(&mut self, edge: EdgeRef<'_>) -> Option<&mut Node<V>> {
        match edge {
            EdgeRef::Word(w) => self.words.get_mut(w),
            EdgeRef::WildOne => self.wild_one.as_deref_mut(),
            EdgeRef::WildAny => self.wild_any.as_deref_mut(),
            EdgeRef::Context => self.context.as_deref_mut(),
            EdgeRef::Scope => self.scope.as_deref_mut(),
        }
    }

    /// Get the child on `edge`, creating it if absent.
    pub(crate) fn child_or_insert_with(
        &mut self,
        edge: EdgeRef<'_>,
        make_id: impl FnOnce() -> NodeId,
    ) -> &mut Node<V> {
        let slot = match edge {
            EdgeRef::Word(w) => {
                return self
                    .words
                    .entry(w.to_owned())
                    .or_insert_with(|| Node::new(make_id()));
            }
            EdgeRef::WildOne => &mut self.wild_one,
            EdgeRef::WildAny => &mut self.wild_any,
            EdgeRef::Context => &mut self.context,
            EdgeRef::Scope => &mut self.scope,
        };
        slot.get_or_insert_with(|| Box::new(Node::new(make_id())))
    }

    pub(crate) fn remove_child(&mut self, edge: EdgeRef<'_>) -> Option<Node<V>> {
        match edge {
            EdgeRef::Word(w) => self.words.remove(w),
            EdgeRef::WildOne => self.wild_one.take().map(|n| *n),
            EdgeRef::WildAny => self.wild_any.take().map(|n| *n),
            EdgeRef::Context => self.context.take().map(|n| *n),
            EdgeRef::Scope => self.scope.take().map(|n| *n),
        }
    }

    pub(crate) fn has_children(&self) -> bool {
        !self.words.is_empty()
            || self.wild_one.is_some()
            || self.wild_any.is_some()
            || self.context.is_some()
            || self.scope.is_some()
    }

    /// A node with neither children nor payload must not stay in the trie.
    pub(crate) fn is_prunable(&self) -> bool {
        self.payload.is_none() && !self.has_children()
    }

    /// Children with their edge labels, in no particular order.
    pub(crate) fn children(&self) -> impl Iterator<Item = (EdgeRef<'_>, &Node<V>)> {
        let fixed = [
            (EdgeRef::WildOne, &self.wild_one),
            (EdgeRef::WildAny, &self.wild_any),
            (EdgeRef::Context, &self.context),
            (EdgeRef::Scope, &self.scope),
        ];
        self.words
            .iter()
            .map(|(w, n)| (EdgeRef::Word(w), n))
            .chain(
                fixed
                    .into_iter()
                    .filter_map(|(edge, slot)| slot.as_deref().map(|n| (edge, n))),
            )
    }

    /// Number of nodes in this subtree, this node included.
    pub(crate) fn subtree_len(&self) -> usize {
        1 + self.children().map(|(_, n)| n.subtree_len()).sum::<usize>()
    }
}

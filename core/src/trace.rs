//! Search trace types for debugging match behavior.
//!
//! A [`SearchTrace`] carries the same result as
//! [`PatternStore::search`](crate::PatternStore::search) plus every branch the
//! backtracking search attempted, in the order it attempted them.
//!
//! # Example
//!
//! ```
//! use wildtrie::prelude::*;
//!
//! let mut store = PatternStore::new();
//! store.insert(&["hello", "*"], &["*"], &["*"], 1).unwrap();
//!
//! let trace = store.search_with_trace(&["hello", "there"], &["x"], &["y"]).unwrap();
//! assert!(trace.result.is_some());
//! for step in &trace.steps {
//!     println!("{step}");
//! }
//! ```

use crate::{Edge, Match, NodeId};
use std::fmt;

/// Which move the search made from a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Branch {
    /// Entered the `_` child.
    WildOne,
    /// Entered the child labelled with the next query token.
    Literal,
    /// Entered the `*` child.
    WildAny,
    /// Stayed on a wildcard node and bound one more token.
    Extend,
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::WildOne => "wild-one",
            Self::Literal => "literal",
            Self::WildAny => "wild-any",
            Self::Extend => "extend",
        })
    }
}

/// One attempted move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceStep {
    /// Recursion depth at which the move was made (root is 0).
    pub depth: usize,
    /// Node the move was made from.
    pub node: NodeId,
    /// The kind of move.
    pub branch: Branch,
    /// Edge followed, `None` for [`Branch::Extend`].
    pub edge: Option<Edge>,
    /// Query token consumed by the move.
    pub token: String,
    /// Whether the subtree entered by this move produced the match.
    pub matched: bool,
}

impl fmt::Display for TraceStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = if self.matched { '+' } else { '-' };
        write!(
            f,
            "{:indent$}{mark} {} {} \"{}\"",
            "",
            self.node,
            self.branch,
            self.token,
            indent = self.depth * 2
        )?;
        if let Some(edge) = &self.edge {
            write!(f, " via {edge}")?;
        }
        Ok(())
    }
}

/// Trace of a full search.
///
/// # INV: `result` == `search()` result
///
/// The trace is collected by the same search routine that backs
/// [`PatternStore::search`](crate::PatternStore::search); only the recording
/// differs.
pub struct SearchTrace<'a, V> {
    /// The final result (identical to what `search()` returns).
    pub result: Option<Match<'a, V>>,
    /// Every attempted move, in attempt order.
    pub steps: Vec<TraceStep>,
}

impl<V> SearchTrace<'_, V> {
    /// Number of moves that were undone by backtracking.
    #[must_use]
    pub fn backtracks(&self) -> usize {
        self.steps.iter().filter(|s| !s.matched).count()
    }
}

impl<V: fmt::Debug> fmt::Debug for SearchTrace<'_, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchTrace")
            .field("result", &self.result)
            .field("steps", &self.steps)
            .finish()
    }
}

impl<V> fmt::Display for SearchTrace<'_, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.steps {
            writeln!(f, "{step}")?;
        }
        match &self.result {
            Some(m) => write!(f, "=> {} at {}", m.pattern(), m.node()),
            None => f.write_str("=> no match"),
        }
    }
}

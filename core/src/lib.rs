//! wildtrie - segment-aware wildcard pattern trie
//!
//! Routes a composite three-segment key (primary, context, scope) to a stored
//! payload. Patterns may contain two wildcard kinds that bind one or more
//! tokens each; matching is a backtracking search over a shared-prefix trie.
//!
//! # Architecture
//!
//! - [`PatternStore`]: owns the trie; insertion, removal, exact lookup
//! - [`PatternStore::search`]: pure backtracking match, returns a [`Match`]
//! - [`PatternStore::match_query`]: `search` plus usage tracking
//! - [`ActivationTracker`]: injected telemetry sink (default [`ActivationLog`])
//! - [`SharedStore`]: readers-writer-locked store for serve-time mutation
//!
//! # Key Design Points
//!
//! 1. **Typed edges**: wildcards and segment separators are [`Edge`] variants,
//!    never strings, so caller words cannot collide with them inside the trie.
//!
//! 2. **Priority**: `_` is tried before a literal continuation, which is tried
//!    before `*` ([`BranchOrder::Reference`]). [`BranchOrder::LiteralFirst`]
//!    puts literals ahead of both wildcards.
//!
//! 3. **Shortest binding first**: a wildcard binds one token, and only grows
//!    when everything below it has failed.
//!
//! 4. **No match is not an error**: `search` returns `Ok(None)`; `Err` is
//!    reserved for malformed input ([`StoreError`]).
//!
//! # Example
//!
//! ```
//! use wildtrie::prelude::*;
//!
//! let mut store = PatternStore::new();
//! store.insert(&["book", "a", "flight"], &["*"], &["*"], "P1").unwrap();
//! store.insert(&["book", "a", "*"], &["*"], &["*"], "P2").unwrap();
//!
//! let hit = store.search(&["book", "a", "flight"], &["x"], &["y"]).unwrap().unwrap();
//! assert_eq!(*hit.payload(), "P1");
//!
//! let hit = store.search(&["book", "a", "car"], &["x"], &["y"]).unwrap().unwrap();
//! assert_eq!(*hit.payload(), "P2");
//! assert_eq!(hit.captures(Segment::Primary), &[vec!["car".to_string()]]);
//! ```

// ═══════════════════════════════════════════════════════════════════════════════
// Modules
// ═══════════════════════════════════════════════════════════════════════════════

mod activation;
mod node;
mod pattern;
mod policy;
mod search;
mod shared;
mod store;
mod trace;

#[cfg(feature = "config")]
mod config;

// ═══════════════════════════════════════════════════════════════════════════════
// Public API
// ═══════════════════════════════════════════════════════════════════════════════

pub use activation::{Activation, ActivationLog, ActivationTracker, NoopTracker};
pub use node::NodeId;
pub use pattern::{
    split_tokens, Edge, PatternKey, PatternToken, QueryKey, Segment, SEG_CONTEXT, SEG_SCOPE,
    WILD_ANY, WILD_ONE,
};
pub use policy::{BranchOrder, EmptySegmentPolicy, MatchPolicy};
pub use search::{Match, OwnedMatch};
pub use shared::SharedStore;
pub use store::{PatternStore, Target};
pub use trace::{Branch, SearchTrace, TraceStep};

#[cfg(feature = "config")]
pub use config::{CategoryConfig, ConfigError, StoreConfig, TrackingConfig};

// ═══════════════════════════════════════════════════════════════════════════════
// Prelude
// ═══════════════════════════════════════════════════════════════════════════════

/// Prelude module for convenient imports.
///
/// ```
/// use wildtrie::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        Activation, ActivationLog, ActivationTracker, BranchOrder, EmptySegmentPolicy, Match,
        MatchPolicy, NodeId, NoopTracker, OwnedMatch, PatternKey, PatternStore, PatternToken,
        QueryKey, Segment, SharedStore, StoreError, Target,
    };
}

// ═══════════════════════════════════════════════════════════════════════════════
// Constants
// ═══════════════════════════════════════════════════════════════════════════════

/// Maximum number of tokens in one inserted path, separators included.
///
/// Search recursion depth is bounded by the longest inserted path, so this
/// also bounds the stack used by a single match.
pub const MAX_PATH_TOKENS: usize = 256;

// ═══════════════════════════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════════════════════════

/// Errors from malformed patterns or queries.
///
/// These are caller bugs and are returned before the trie is touched. A query
/// that simply finds nothing is `Ok(None)`, and removing an unknown path is
/// `Ok(false)`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// A segment was empty under [`EmptySegmentPolicy::Reject`].
    #[error("{segment} segment is empty; supply at least one token or use the wildcard empty-segment policy")]
    EmptySegment {
        /// The empty segment.
        segment: Segment,
    },
    /// Caller data contains a reserved wildcard or separator spelling.
    #[error("reserved token \"{token}\" in {segment} segment")]
    ReservedToken {
        /// The offending token as given.
        token: String,
        /// Segment the token appeared in.
        segment: Segment,
    },
    /// The flattened path exceeds [`MAX_PATH_TOKENS`].
    #[error("path has {len} tokens, but maximum allowed is {max}")]
    PathTooLong {
        /// Actual path length, separators included.
        len: usize,
        /// Maximum allowed.
        max: usize,
    },
}

/// Errors raised by an [`ActivationTracker`] while recording.
///
/// Never surfaced to callers of [`PatternStore::match_query`]; the store logs
/// them and carries on.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TrackingError {
    /// The node's activation set is full.
    #[error("activation set for node {node} is full ({max} entries)")]
    CapacityExceeded {
        /// Node whose set is full.
        node: NodeId,
        /// Configured per-node capacity.
        max: usize,
    },
}

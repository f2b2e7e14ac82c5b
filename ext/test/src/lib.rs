//! wildtrie-test: conformance fixtures for wildtrie
//!
//! Provides [`TestQuery`], a whitespace-tokenized query builder, and the YAML
//! [`fixture`] runner used by the conformance suite.
//!
//! # Example
//!
//! ```
//! use wildtrie_test::prelude::*;
//!
//! let mut store = PatternStore::new();
//! store.insert(&["book", "a", "*"], &["*"], &["*"], "P2").unwrap();
//!
//! let m = TestQuery::new("book a car")
//!     .with_context("x")
//!     .with_scope("y")
//!     .search(&store)
//!     .unwrap()
//!     .unwrap();
//! assert_eq!(*m.payload(), "P2");
//! ```

use wildtrie::prelude::*;
use wildtrie::split_tokens;

pub mod fixture;

/// A query written as three whitespace-separated strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestQuery {
    primary: String,
    context: String,
    scope: String,
}

impl TestQuery {
    /// Query with only a primary segment.
    #[must_use]
    pub fn new(primary: impl Into<String>) -> Self {
        Self {
            primary: primary.into(),
            ..Self::default()
        }
    }

    /// Set the context segment (builder pattern).
    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    /// Set the scope segment (builder pattern).
    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    /// The three token lists.
    #[must_use]
    pub fn tokens(&self) -> [Vec<&str>; 3] {
        [
            split_tokens(&self.primary),
            split_tokens(&self.context),
            split_tokens(&self.scope),
        ]
    }

    /// Untracked search.
    ///
    /// # Errors
    ///
    /// As for [`PatternStore::search`].
    pub fn search<'a, V>(&self, store: &'a PatternStore<V>) -> Result<Option<Match<'a, V>>, StoreError> {
        let [primary, context, scope] = self.tokens();
        store.search(&primary, &context, &scope)
    }

    /// Tracked match.
    ///
    /// # Errors
    ///
    /// As for [`PatternStore::match_query`].
    pub fn match_in<'a, V>(&self, store: &'a PatternStore<V>) -> Result<Option<Match<'a, V>>, StoreError> {
        let [primary, context, scope] = self.tokens();
        store.match_query(&primary, &context, &scope)
    }
}

impl std::fmt::Display for TestQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} | {} | {}", self.primary, self.context, self.scope)
    }
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use super::TestQuery;
    pub use wildtrie::prelude::*;
    pub use wildtrie::split_tokens;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_builder() {
        let q = TestQuery::new("  hello   there ").with_context("greeting");
        assert_eq!(
            q.tokens(),
            [vec!["hello", "there"], vec!["greeting"], Vec::<&str>::new()]
        );
        assert_eq!(q.to_string(), "  hello   there  | greeting | ");
    }

    #[test]
    fn test_blank_segments_match_wildcards() {
        let mut store = PatternStore::new();
        store.insert(&["hello", "*"], &["*"], &["*"], 1).unwrap();
        let m = TestQuery::new("hello world").search(&store).unwrap().unwrap();
        assert_eq!(m.capture_text(Segment::Primary, 0).as_deref(), Some("world"));
        assert_eq!(m.capture_text(Segment::Scope, 0).as_deref(), Some(""));
    }

    #[test]
    fn test_match_in_tracks() {
        let mut store = PatternStore::new();
        let node = store.insert(&["hi"], &["*"], &["*"], 1).unwrap();
        TestQuery::new("hi").with_context("x").match_in(&store).unwrap();
        assert_eq!(store.drain_activations(node).len(), 1);
    }

    #[test]
    fn test_reserved_tokens_surface_as_errors() {
        let store: PatternStore<()> = PatternStore::new();
        let err = TestQuery::new("<context>").search(&store).unwrap_err();
        assert!(matches!(err, StoreError::ReservedToken { .. }));
    }
}

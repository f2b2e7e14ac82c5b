//! Config-driven store construction.
//!
//! A [`StoreConfig`] deserializes from YAML or JSON and builds a
//! [`PatternStore<String>`] whose payloads are the category templates.
//!
//! ```yaml
//! policy:
//!   branch_order: reference
//!   empty_segment: wildcard
//! tracking:
//!   enabled: true
//!   max_per_node: 1024
//! categories:
//!   - pattern: "book a flight"
//!     context: "*"
//!     scope: "*"
//!     template: "P1"
//! ```
//!
//! Segment text is split on whitespace. An omitted `context` or `scope` is
//! empty and handled by the configured [`EmptySegmentPolicy`](crate::EmptySegmentPolicy).

use crate::{
    split_tokens, ActivationLog, ActivationTracker, MatchPolicy, NoopTracker, PatternStore,
    StoreError,
};
use serde::Deserialize;
use std::sync::Arc;

/// Errors from loading or building a [`StoreConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The YAML document did not parse into a config.
    #[error("invalid YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The JSON document did not parse into a config.
    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),

    /// A category was rejected by the store.
    #[error("category {index} (\"{pattern}\"): {source}")]
    Category {
        /// Position in `categories`, 0-based.
        index: usize,
        /// The category's primary pattern text.
        pattern: String,
        /// Why the store rejected it.
        #[source]
        source: StoreError,
    },

    /// A pattern listed for removal was rejected by the store.
    #[error("removed entry {index} (\"{pattern}\"): {source}")]
    Removal {
        /// Position in the removal list, 0-based.
        index: usize,
        /// The entry's primary pattern text.
        pattern: String,
        /// Why the store rejected it.
        #[source]
        source: StoreError,
    },
}

/// Top-level store configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Matching policy.
    pub policy: MatchPolicy,

    /// Usage tracking settings.
    pub tracking: TrackingConfig,

    /// Patterns to insert, in order. A later duplicate replaces an earlier one.
    pub categories: Vec<CategoryConfig>,
}

/// Usage tracking settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrackingConfig {
    /// Record activations on tracked matches.
    pub enabled: bool,

    /// Per-node cap on distinct activations. Unbounded when absent.
    pub max_per_node: Option<usize>,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_per_node: None,
        }
    }
}

impl TrackingConfig {
    /// The tracker these settings describe.
    #[must_use]
    pub fn tracker(&self) -> Arc<dyn ActivationTracker> {
        match (self.enabled, self.max_per_node) {
            (false, _) => Arc::new(NoopTracker),
            (true, None) => Arc::new(ActivationLog::new()),
            (true, Some(max)) => Arc::new(ActivationLog::with_capacity_per_node(max)),
        }
    }
}

/// One pattern and its template.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CategoryConfig {
    /// Primary segment text.
    pub pattern: String,

    /// Context segment text.
    #[serde(default)]
    pub context: String,

    /// Scope segment text.
    #[serde(default)]
    pub scope: String,

    /// Payload stored on the pattern's terminal node.
    pub template: String,
}

impl StoreConfig {
    /// Parse a YAML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the document is not a valid config.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Parse a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] if the document is not a valid config.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Build a store holding every category.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Category`] for the first category the store
    /// rejects.
    pub fn build(&self) -> Result<PatternStore<String>, ConfigError> {
        let mut store = PatternStore::with_policy(self.policy).with_tracker(self.tracking.tracker());
        for (index, category) in self.categories.iter().enumerate() {
            let replaced = store
                .replace(
                    &split_tokens(&category.pattern),
                    &split_tokens(&category.context),
                    &split_tokens(&category.scope),
                    category.template.clone(),
                )
                .map_err(|source| ConfigError::Category {
                    index,
                    pattern: category.pattern.clone(),
                    source,
                })?;
            if replaced.is_some() {
                tracing::warn!(index, pattern = %category.pattern, "duplicate category replaces an earlier one");
            }
        }
        tracing::info!(
            categories = store.len(),
            nodes = store.node_count(),
            "store built"
        );
        Ok(store)
    }
}

//! Conformance test fixture runner
//!
//! Loads YAML fixtures and runs them against a store built from their
//! categories.
//!
//! ```yaml
//! name: literal beats wild-any
//! description: the third token prefers the literal child
//! categories:
//!   - { pattern: "book a flight", context: "*", scope: "*", template: P1 }
//!   - { pattern: "book a *", context: "*", scope: "*", template: P2 }
//! cases:
//!   - name: wildcard
//!     primary: book a car
//!     context: x
//!     scope: y
//!     expect: P2
//!     captures:
//!       primary: [car]
//! ```

use crate::TestQuery;
use serde::Deserialize;
use std::collections::BTreeMap;
use wildtrie::{CategoryConfig, ConfigError, MatchPolicy, Segment, StoreConfig};

/// A complete test fixture
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Fixture {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub policy: MatchPolicy,
    pub categories: Vec<CategoryConfig>,
    /// Categories removed after every category is inserted.
    #[serde(default)]
    pub removed: Vec<RemovedCategory>,
    pub cases: Vec<TestCase>,
}

/// A pattern to remove before running the cases.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RemovedCategory {
    pub pattern: String,
    #[serde(default)]
    pub context: String,
    #[serde(default)]
    pub scope: String,
}

/// Test case
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestCase {
    pub name: String,
    pub primary: String,
    #[serde(default)]
    pub context: String,
    #[serde(default)]
    pub scope: String,
    /// Expected template, `None` for no match.
    pub expect: Option<String>,
    /// Expected captures per segment, each joined with single spaces.
    /// Segments not listed are not checked.
    #[serde(default)]
    pub captures: BTreeMap<Segment, Vec<String>>,
}

impl TestCase {
    /// The case's query.
    pub fn query(&self) -> TestQuery {
        TestQuery::new(self.primary.as_str())
            .with_context(self.context.as_str())
            .with_scope(self.scope.as_str())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Runner
// ═══════════════════════════════════════════════════════════════════════════════

/// Result of running a single test case
#[derive(Debug)]
pub struct CaseResult {
    pub case_name: String,
    pub passed: bool,
    pub expected: Option<String>,
    pub actual: Option<String>,
    /// Why a case failed beyond the payload comparison.
    pub detail: Option<String>,
}

impl Fixture {
    /// Parse a fixture from YAML
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Parse multiple fixtures from a YAML file with `---` separators
    pub fn from_yaml_multi(yaml: &str) -> Result<Vec<Self>, serde_yaml::Error> {
        let mut fixtures = Vec::new();
        for doc in serde_yaml::Deserializer::from_str(yaml) {
            fixtures.push(Self::deserialize(doc)?);
        }
        Ok(fixtures)
    }

    fn store_config(&self) -> StoreConfig {
        StoreConfig {
            policy: self.policy,
            categories: self.categories.clone(),
            ..StoreConfig::default()
        }
    }

    /// Run all test cases and return results
    pub fn run(&self) -> Result<Vec<CaseResult>, ConfigError> {
        let mut store = self.store_config().build()?;
        for (index, removed) in self.removed.iter().enumerate() {
            let tokens = TestQuery::new(removed.pattern.as_str())
                .with_context(removed.context.as_str())
                .with_scope(removed.scope.as_str());
            let [primary, context, scope] = tokens.tokens();
            store
                .remove(&primary, &context, &scope)
                .map_err(|source| ConfigError::Removal {
                    index,
                    pattern: removed.pattern.clone(),
                    source,
                })?;
        }

        let results = self
            .cases
            .iter()
            .map(|case| {
                let outcome = case.query().search(&store);
                let (actual, detail) = match outcome {
                    Err(err) => (None, Some(format!("query rejected: {err}"))),
                    Ok(None) => (None, None),
                    Ok(Some(m)) => {
                        let mismatch = case.captures.iter().find_map(|(segment, want)| {
                            let got: Vec<String> =
                                m.captures(*segment).iter().map(|c| c.join(" ")).collect();
                            (&got != want)
                                .then(|| format!("{segment} captures: expected {want:?}, got {got:?}"))
                        });
                        (Some(m.payload().clone()), mismatch)
                    }
                };
                CaseResult {
                    case_name: case.name.clone(),
                    passed: actual == case.expect && detail.is_none(),
                    expected: case.expect.clone(),
                    actual,
                    detail,
                }
            })
            .collect();
        Ok(results)
    }

    /// Run all test cases and panic on first failure
    pub fn run_and_assert(&self) {
        let results = self
            .run()
            .unwrap_or_else(|e| panic!("Fixture '{}' failed to build: {e}", self.name));
        for result in results {
            assert!(
                result.passed,
                "Fixture '{}' case '{}' failed: expected {:?}, got {:?}{}",
                self.name,
                result.case_name,
                result.expected,
                result.actual,
                result.detail.map(|d| format!(" ({d})")).unwrap_or_default()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"
name: flights
description: literal beats wild-any
categories:
  - { pattern: "book a flight", context: "*", scope: "*", template: P1 }
  - { pattern: "book a *", context: "*", scope: "*", template: P2 }
cases:
  - name: literal
    primary: book a flight
    context: x
    scope: y
    expect: P1
  - name: wildcard
    primary: book a car
    context: x
    scope: y
    expect: P2
    captures:
      primary: [car]
  - name: too short
    primary: book a
    expect: null
"#;

    #[test]
    fn parses_and_passes() {
        let fixture = Fixture::from_yaml(FIXTURE).unwrap();
        assert_eq!(fixture.cases.len(), 3);
        assert_eq!(fixture.cases[1].captures[&Segment::Primary], vec!["car"]);
        let results = fixture.run().unwrap();
        assert!(results.iter().all(|r| r.passed), "{results:?}");
    }

    #[test]
    fn capture_mismatch_fails_case() {
        let mut fixture = Fixture::from_yaml(FIXTURE).unwrap();
        fixture.cases[1]
            .captures
            .insert(Segment::Primary, vec!["boat".into()]);
        let results = fixture.run().unwrap();
        assert!(!results[1].passed);
        assert!(results[1].detail.as_deref().unwrap().contains("boat"));
    }

    #[test]
    fn multi_document() {
        let yaml = format!("{FIXTURE}\n---\n{FIXTURE}");
        assert_eq!(Fixture::from_yaml_multi(&yaml).unwrap().len(), 2);
    }

    #[test]
    fn removed_categories_are_gone() {
        let yaml = r#"
name: removal
categories:
  - { pattern: "a b", template: ab }
  - { pattern: "a *", template: astar }
removed:
  - { pattern: "a b" }
cases:
  - { name: falls back, primary: a b, expect: astar, captures: { primary: [b] } }
"#;
        let fixture = Fixture::from_yaml(yaml).unwrap();
        let results = fixture.run().unwrap();
        assert!(results[0].passed, "{results:?}");
    }

    #[test]
    fn bad_removal_names_the_removed_list() {
        let yaml = r#"
name: bad removal
categories:
  - { pattern: "a b", template: ab }
removed:
  - { pattern: "a <context> b" }
cases: []
"#;
        let err = Fixture::from_yaml(yaml).unwrap().run().unwrap_err();
        assert!(matches!(err, ConfigError::Removal { index: 0, .. }), "{err:?}");
        assert!(err.to_string().starts_with("removed entry 0"), "{err}");
    }
}

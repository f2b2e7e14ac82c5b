//! Conformance tests that run YAML fixtures against wildtrie
//!
//! Run with: cargo test -p wildtrie-test --test conformance

use std::fs;
use std::path::{Path, PathBuf};
use wildtrie_test::fixture::Fixture;

/// The `fixtures/` directory at the workspace root
fn fixtures_dir() -> PathBuf {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");

    // Go up: ext/test -> ext -> workspace root
    let root = Path::new(manifest_dir)
        .parent()
        .and_then(Path::parent)
        .expect("Could not find workspace root");

    root.join("fixtures")
}

/// Load and run every fixture in one file
fn run_fixture_file(name: &str) {
    let path = fixtures_dir().join(name);
    let yaml = fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e));

    // Parse potentially multiple fixtures (separated by ---)
    let fixtures = Fixture::from_yaml_multi(&yaml).unwrap_or_else(|e| {
        panic!("Failed to parse {}: {}", path.display(), e);
    });
    assert!(!fixtures.is_empty(), "{} holds no fixtures", path.display());

    for fixture in fixtures {
        println!("  Running: {}", fixture.name);
        fixture.run_and_assert();
    }
}

#[test]
fn test_literals() {
    run_fixture_file("01_literals.yaml");
}

#[test]
fn test_wildcards() {
    run_fixture_file("02_wildcards.yaml");
}

#[test]
fn test_priority() {
    run_fixture_file("03_priority.yaml");
}

#[test]
fn test_segments() {
    run_fixture_file("04_segments.yaml");
}

#[test]
fn test_removal() {
    run_fixture_file("05_removal.yaml");
}

#[test]
fn every_fixture_file_is_listed() {
    let mut names: Vec<String> = fs::read_dir(fixtures_dir())
        .expect("read fixtures dir")
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".yaml") || name.ends_with(".yml"))
        .collect();
    names.sort();
    assert_eq!(
        names,
        [
            "01_literals.yaml",
            "02_wildcards.yaml",
            "03_priority.yaml",
            "04_segments.yaml",
            "05_removal.yaml",
        ]
    );
}

//! Search benchmarks, the hot path.
//!
//! Measures literal hits, wildcard captures, deep backtracking, misses, and
//! the overhead of tracking and tracing on top of a plain search.

use wildtrie::prelude::*;

fn main() {
    divan::main();
}

// ═══════════════════════════════════════════════════════════════════════════════
// Fixtures
// ═══════════════════════════════════════════════════════════════════════════════

const ANY: &[&str] = &["*"];

/// `n` literal patterns `route i step`, plus a catch-all per prefix.
fn routes(n: usize) -> PatternStore<usize> {
    let mut store = PatternStore::new();
    for i in 0..n {
        let word = format!("r{i}");
        store.insert(&["route", word.as_str(), "step"], ANY, ANY, i).unwrap();
        store.insert(&["route", word.as_str(), "*"], ANY, ANY, n + i).unwrap();
    }
    store.insert(&["*"], ANY, ANY, usize::MAX).unwrap();
    store
}

fn words(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("w{i}")).collect()
}

// ═══════════════════════════════════════════════════════════════════════════════
// Hits
// ═══════════════════════════════════════════════════════════════════════════════

#[divan::bench(args = [10, 100, 1000])]
fn literal_hit(bencher: divan::Bencher, n: usize) {
    let store = routes(n);
    let last = format!("r{}", n - 1);
    bencher.bench_local(|| store.search(&["route", last.as_str(), "step"], &["x"], &["y"]));
}

#[divan::bench(args = [10, 100, 1000])]
fn wildcard_capture(bencher: divan::Bencher, n: usize) {
    let store = routes(n);
    bencher.bench_local(|| store.search(&["route", "r0", "a", "b", "c"], &["x"], &["y"]));
}

#[divan::bench]
fn miss_falls_to_catch_all(bencher: divan::Bencher) {
    let store = routes(100);
    bencher.bench_local(|| store.search(&["nothing", "here"], &["x"], &["y"]));
}

// ═══════════════════════════════════════════════════════════════════════════════
// Backtracking
// ═══════════════════════════════════════════════════════════════════════════════

/// `* a * a * … end`: every star is tried at every width before the tail
/// fails, so this grows with query length.
#[divan::bench(args = [4, 8, 16, 32])]
fn backtrack_alternating_stars(bencher: divan::Bencher, len: usize) {
    let mut store = PatternStore::new();
    store.insert(&["*", "a", "*", "a", "*", "end"], ANY, ANY, ()).unwrap();
    let query: Vec<String> = (0..len)
        .map(|i| if i % 2 == 0 { "a".to_string() } else { "b".to_string() })
        .collect();
    bencher.bench_local(|| store.search(&query, &["x".to_string()], &["y".to_string()]));
}

#[divan::bench(args = [8, 64, 200])]
fn long_query_single_star(bencher: divan::Bencher, len: usize) {
    let mut store = PatternStore::new();
    store.insert(&["start", "*"], ANY, ANY, ()).unwrap();
    let mut query = vec!["start".to_string()];
    query.extend(words(len));
    bencher.bench_local(|| store.search(&query, &["x".to_string()], &["y".to_string()]));
}

// ═══════════════════════════════════════════════════════════════════════════════
// Overhead
// ═══════════════════════════════════════════════════════════════════════════════

#[divan::bench]
fn tracked_match(bencher: divan::Bencher) {
    let store = routes(100);
    bencher.bench_local(|| store.match_query(&["route", "r5", "step"], &["x"], &["y"]).map(|m| m.is_some()));
}

#[divan::bench]
fn traced_search(bencher: divan::Bencher) {
    let store = routes(100);
    bencher.bench_local(|| {
        store
            .search_with_trace(&["route", "r5", "other"], &["x"], &["y"])
            .map(|t| t.steps.len())
    });
}

#[divan::bench]
fn shared_store_match(bencher: divan::Bencher) {
    let shared = SharedStore::new(routes(100));
    bencher.bench_local(|| shared.match_query(&["route", "r5", "step"], &["x"], &["y"]));
}

//! wildtrie CLI: driving adapter for the wildtrie pattern store.
//!
//! Subcommands:
//! - `match <config> --primary .. [--context ..] [--scope ..] [--trace]`: run one query
//! - `check <config>`: validate that the config builds
//! - `stats <config>`: print store size and policy
//! - `replay <config> <queries>`: run a query file, then print the checkpoint as JSON
//!
//! Logging goes to stderr and is controlled by `RUST_LOG` (default `warn`).

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use wildtrie::{split_tokens, Match, PatternStore, Segment, StoreConfig, Target};

/// Query a wildcard pattern store built from a YAML or JSON config.
#[derive(Parser, Debug)]
#[command(name = "wildtrie", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Match one query and print the template and captures
    Match {
        /// Config file (.yaml, .yml or .json)
        config: PathBuf,
        /// Primary segment text
        #[arg(long)]
        primary: String,
        /// Context segment text
        #[arg(long, default_value = "")]
        context: String,
        /// Scope segment text
        #[arg(long, default_value = "")]
        scope: String,
        /// Print every branch the search tried
        #[arg(long)]
        trace: bool,
    },
    /// Validate that a config builds
    Check {
        /// Config file
        config: PathBuf,
    },
    /// Print store statistics
    Stats {
        /// Config file
        config: PathBuf,
    },
    /// Run `primary | context | scope` queries from a file, then print the checkpoint
    Replay {
        /// Config file
        config: PathBuf,
        /// Query file, one query per line; `#` starts a comment line
        queries: PathBuf,
    },
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Match {
            config,
            primary,
            context,
            scope,
            trace,
        } => cmd_match(&config, [&primary, &context, &scope], trace),
        Command::Check { config } => cmd_check(&config),
        Command::Stats { config } => cmd_stats(&config),
        Command::Replay { config, queries } => cmd_replay(&config, &queries),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// ═══════════════════════════════════════════════════════════════════════════════
// Commands
// ═══════════════════════════════════════════════════════════════════════════════

fn cmd_match(config_path: &Path, query: [&str; 3], trace: bool) -> Result<(), String> {
    let store = build_store(config_path)?;
    let [primary, context, scope] = query.map(split_tokens);

    if trace {
        let traced = store
            .search_with_trace(&primary, &context, &scope)
            .map_err(|e| format!("invalid query: {e}"))?;
        println!("{traced}");
        println!("({} backtracks)", traced.backtracks());
    }

    let found = store
        .match_query(&primary, &context, &scope)
        .map_err(|e| format!("invalid query: {e}"))?;
    match found {
        Some(m) => println!("{}", describe(&m)),
        None => println!("(no match)"),
    }
    Ok(())
}

fn cmd_check(config_path: &Path) -> Result<(), String> {
    let store = build_store(config_path)?;
    println!("Config valid ({} categories)", store.len());
    Ok(())
}

fn cmd_stats(config_path: &Path) -> Result<(), String> {
    let store = build_store(config_path)?;
    let policy = store.policy();
    println!("categories:    {}", store.len());
    println!("nodes:         {}", store.node_count());
    println!("max path len:  {}", store.max_path_len());
    println!("branch order:  {:?}", policy.branch_order);
    println!("empty segment: {:?}", policy.empty_segment);
    Ok(())
}

fn cmd_replay(config_path: &Path, queries_path: &Path) -> Result<(), String> {
    let store = build_store(config_path)?;
    let content = std::fs::read_to_string(queries_path)
        .map_err(|e| format!("failed to read \"{}\": {e}", queries_path.display()))?;

    let targets = replay(&store, &content)?;
    let json = serde_json::to_string_pretty(&targets).map_err(|e| format!("JSON encode error: {e}"))?;
    println!("{json}");
    Ok(())
}

/// Run every query line through `match_query` and drain the checkpoint.
fn replay(store: &PatternStore<String>, content: &str) -> Result<Vec<Target<String>>, String> {
    let mut matched = 0usize;
    let mut total = 0usize;
    for (n, line) in content.lines().enumerate() {
        let Some(query) = parse_query_line(line).map_err(|e| format!("line {}: {e}", n + 1))? else {
            continue;
        };
        let [primary, context, scope] = query.map(split_tokens);
        total += 1;
        let found = store
            .match_query(&primary, &context, &scope)
            .map_err(|e| format!("line {}: invalid query: {e}", n + 1))?;
        if found.is_some() {
            matched += 1;
        }
    }
    tracing::info!(total, matched, "replay finished");
    Ok(store.checkpoint())
}

// ═══════════════════════════════════════════════════════════════════════════════
// Config loading
// ═══════════════════════════════════════════════════════════════════════════════

fn load_config(path: &Path) -> Result<StoreConfig, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read \"{}\": {e}", path.display()))?;

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        StoreConfig::from_json(&content).map_err(|e| e.to_string())
    } else {
        // Default to YAML (handles .yaml and .yml)
        StoreConfig::from_yaml(&content).map_err(|e| e.to_string())
    }
}

fn build_store(path: &Path) -> Result<PatternStore<String>, String> {
    load_config(path)?
        .build()
        .map_err(|e| format!("config invalid: {e}"))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Formatting and parsing
// ═══════════════════════════════════════════════════════════════════════════════

fn describe(m: &Match<'_, String>) -> String {
    let mut out = format!("{}\n  pattern: {}\n  node:    {}", m.payload(), m.pattern(), m.node());
    for segment in Segment::ALL {
        let captures = m.captures(segment);
        if captures.is_empty() {
            continue;
        }
        let joined: Vec<String> = captures.iter().map(|c| format!("\"{}\"", c.join(" "))).collect();
        out.push_str(&format!("\n  {segment}: {}", joined.join(", ")));
    }
    out
}

/// Parse `primary | context | scope`. Blank and `#` lines yield `None`;
/// missing trailing segments are empty.
fn parse_query_line(line: &str) -> Result<Option<[&str; 3]>, String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let mut parts = line.split('|').map(str::trim);
    let query = [
        parts.next().unwrap_or_default(),
        parts.next().unwrap_or_default(),
        parts.next().unwrap_or_default(),
    ];
    if parts.next().is_some() {
        return Err(format!("expected at most 3 segments in \"{line}\""));
    }
    Ok(Some(query))
}

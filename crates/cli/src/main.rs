// ABOUTME: CLI for normalizing Atom feeds with the atom-feed library.
// ABOUTME: Reads feeds from files or stdin and prints the normalized result as JSON.

use std::fs;
use std::io::{self, Read};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use atom_feed::{AtomParser, TracingSink};
use clap::Parser;
use serde_json::json;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Normalize one or more Atom feeds and output JSON.
#[derive(Parser, Debug)]
#[command(name = "atom-feed")]
#[command(about = "Normalize Atom feeds and print JSON", long_about = None)]
struct Args {
    /// Local file paths. Use "-" to read one feed from stdin.
    #[arg(required = true)]
    targets: Vec<String>,

    /// Output compact JSON instead of pretty.
    #[arg(long, default_value_t = false)]
    compact: bool,

    /// Log skipped entries and dump the raw input of feeds with warnings.
    #[arg(long, default_value_t = false)]
    debug: bool,

    /// Minutes until the suggested next poll.
    #[arg(long, default_value_t = 10)]
    refresh_minutes: u64,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = if args.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();

    if args.targets.iter().filter(|t| t.as_str() == "-").count() > 1 {
        bail!("stdin (\"-\") can only be read once");
    }

    let refresh = Duration::from_secs(args.refresh_minutes.saturating_mul(60));
    let mut builder = AtomParser::builder().refresh_interval(refresh);
    if args.debug {
        builder = builder.diagnostics(Arc::new(TracingSink));
    }
    let parser = builder.build();

    let mut results = Vec::new();
    for target in &args.targets {
        let parsed = load_bytes(target)
            .and_then(|bytes| parser.parse(&bytes).map_err(anyhow::Error::new));

        match parsed {
            Ok(feed) => results.push(json!({
                "target": target,
                "ok": true,
                "feed": feed,
                "error": null
            })),
            Err(err) => {
                tracing::warn!(path = %target, error = %err, "failed to parse feed");
                results.push(json!({
                    "target": target,
                    "ok": false,
                    "feed": null,
                    "error": format!("{:#}", err)
                }))
            }
        }
    }

    // A single successful target prints the bare feed; everything else gets an envelope.
    let output = match results.as_slice() {
        [only] if only.get("ok").and_then(|v| v.as_bool()) == Some(true) => {
            only.get("feed").cloned().unwrap_or_else(|| json!({}))
        }
        _ => {
            let parsed = results
                .iter()
                .filter(|r| r.get("ok").and_then(|v| v.as_bool()) == Some(true))
                .count();
            json!({
                "feeds": results,
                "total_feeds": results.len(),
                "parsed": parsed,
                "failed": results.len() - parsed
            })
        }
    };

    if args.compact {
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("{}", serde_json::to_string_pretty(&output)?);
    }

    Ok(())
}

fn load_bytes(target: &str) -> Result<Vec<u8>> {
    if target == "-" {
        let mut buf = Vec::new();
        io::stdin()
            .read_to_end(&mut buf)
            .context("failed to read stdin")?;
        return Ok(buf);
    }

    let path = Path::new(target);
    if !path.exists() {
        bail!("file not found: {}", target);
    }
    fs::read(path).with_context(|| format!("failed to read {}", target))
}

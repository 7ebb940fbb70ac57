//! Covenant node entry point.
//!
//! ```text
//! covenant-node scenario.json --pretty
//! ```

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use covenant_engine::EngineConfig;
use covenant_node::{parse_script, Runner};
use covenant_telemetry::{init_telemetry, TelemetryConfig};

/// Replay an agreement call script and print the per-step report.
#[derive(Parser, Debug)]
#[command(name = "covenant-node")]
#[command(about = "Replays agreement call scripts against an in-memory covenant deployment")]
#[command(version)]
struct Args {
    /// Path to the JSON script
    script: PathBuf,

    /// Pretty-print the JSON report
    #[arg(short, long)]
    pretty: bool,

    /// Log filter, overrides COVENANT_LOG_LEVEL
    #[arg(short, long)]
    log_level: Option<String>,

    /// Stop at the first reverted call
    #[arg(long)]
    fail_fast: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut telemetry = TelemetryConfig::from_env();
    if let Some(level) = &args.log_level {
        telemetry = telemetry.with_log_level(level.clone());
    }
    init_telemetry(&telemetry).context("Failed to initialize logging")?;

    let text = fs::read_to_string(&args.script)
        .with_context(|| format!("Failed to read script {}", args.script.display()))?;
    let script = parse_script(&text)?;

    let config = EngineConfig::from_env();
    info!(
        steps = script.steps.len(),
        max_parties = config.max_parties,
        "[covenant] Replaying script"
    );

    let runner = Runner::new(config);
    let report = runner.run(&script, args.fail_fast)?;
    info!(
        committed = report.calls_committed,
        rejected = report.calls_rejected,
        "[covenant] Script finished"
    );

    let rendered = if args.pretty {
        serde_json::to_string_pretty(&report)
    } else {
        serde_json::to_string(&report)
    }
    .context("Failed to render report")?;
    println!("{rendered}");
    Ok(())
}

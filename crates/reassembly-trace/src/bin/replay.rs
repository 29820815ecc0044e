// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! reassembly-replay - Replay a fragment trace through the reassembly engine.
//!
//! Usage:
//!   reassembly-replay --input capture.jsonl
//!   reassembly-replay --input capture.jsonl --passes 3 --format json
//!   reassembly-replay --input capture.jsonl --config replay.toml --dump-tables
//!   reassembly-replay gen-config --output replay.toml

use clap::{Parser, Subcommand};
use reassembly_trace::{IdFilter, Player, Report, ReplayConfig, ReportFormat, TraceReader};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "reassembly-replay")]
#[command(about = "Replay a fragment trace and verify replay idempotence")]
#[command(version)]
struct Args {
    /// Input trace (JSON Lines)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Total passes (first pass plus replays, at least 2)
    #[arg(short, long)]
    passes: Option<u32>,

    /// Report format (text, json)
    #[arg(short, long)]
    format: Option<ReportFormat>,

    /// Only report these message ids (comma-separated, ranges like 10-20)
    #[arg(long)]
    ids: Option<String>,

    /// List every fragment of each completed message
    #[arg(long)]
    nodes: bool,

    /// Print both reassembly tables after playback
    #[arg(long)]
    dump_tables: bool,

    /// Exit with success even when replays diverge
    #[arg(long)]
    allow_violations: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a default configuration file
    GenConfig {
        /// Output file path (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Setup logging
    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Some(Commands::GenConfig { output }) = &args.command {
        return cmd_gen_config(output.as_ref());
    }

    let config = build_config(&args)?;
    let Some(input) = &args.input else {
        anyhow::bail!("Missing --input");
    };
    if !input.exists() {
        anyhow::bail!("Input file not found: {}", input.display());
    }

    let mut player = Player::new(config.clone())?;
    let loaded = player.load(TraceReader::open(input)?)?;
    info!("Loaded {} events from {}", loaded, input.display());

    player.run()?;

    let report = Report::build(&player, &config.report);
    match config.report.format {
        ReportFormat::Text => print!("{}", report.to_text()),
        ReportFormat::Json => println!("{}", report.to_json()?),
    }

    if args.dump_tables {
        eprint!("{}", player.datagram_tables().dump());
        eprint!("{}", player.rpc_tables().dump());
    }

    if !report.is_clean() && config.fail_on_violation {
        anyhow::bail!("{} replay violation(s) detected", report.violations.len());
    }

    Ok(())
}

/// File values first, then command-line overrides.
fn build_config(args: &Args) -> anyhow::Result<ReplayConfig> {
    let mut config = match &args.config {
        Some(path) => ReplayConfig::from_file(path)?,
        None => ReplayConfig::default(),
    };

    if let Some(passes) = args.passes {
        config.passes = passes;
    }
    if let Some(format) = args.format {
        config.report.format = format;
    }
    if let Some(ids) = &args.ids {
        config.report.include_ids = IdFilter::split_list(ids);
        config.report.exclude_ids.clear();
    }
    if args.nodes {
        config.report.include_nodes = true;
    }
    if args.allow_violations {
        config.fail_on_violation = false;
    }

    config.validate()?;
    Ok(config)
}

fn cmd_gen_config(output: Option<&PathBuf>) -> anyhow::Result<()> {
    let text = format!(
        "# reassembly-replay configuration\n# passes: first pass plus replays (>= 2)\n\n{}",
        ReplayConfig::default().to_toml()?
    );
    match output {
        Some(path) => {
            std::fs::write(path, text)?;
            println!("Configuration written to {}", path.display());
        }
        None => print!("{}", text),
    }
    Ok(())
}

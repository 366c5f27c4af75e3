// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Brute-force detection harness
//!
//! Runs the burst and control scenarios against a classification endpoint
//! and prints a verdict for each, or serves a local mock classifier.
//!
//! ## Configuration
//!
//! Defaults, then environment variables, then command-line flags:
//!
//! - `PROBE_ENDPOINT`: classification endpoint (default: http://localhost:8000/analyze)
//! - `PROBE_TIMEOUT_SECS`: per-request timeout (default: 30)
//! - `PROBE_COOLDOWN_MS`: pause between scenarios (default: 3000)
//! - `MOCK_BIND_ADDR`: mock bind address (default: 127.0.0.1:8000)
//! - `MOCK_THRESHOLD`: mock requests per window before flagging (default: 5)

use brute_force_harness::{
    config::Config,
    mock,
    probe::HttpProbe,
    suite::{run_suite, Selection},
};
use clap::{Parser, Subcommand, ValueEnum};
use tokio::net::TcpListener;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(
    name = "brute-force-harness",
    version,
    about = "Checks that an analysis endpoint flags request bursts and not normal traffic"
)]
struct Args {
    /// Emit JSON log lines instead of human-readable ones
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the detection scenarios (default)
    Run(RunArgs),

    /// Serve the local mock classifier
    ServeMock(MockArgs),
}

#[derive(clap::Args, Default)]
struct RunArgs {
    /// Classification endpoint URL
    #[arg(long)]
    endpoint: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Pause between burst and control scenarios in milliseconds
    #[arg(long)]
    cooldown_ms: Option<u64>,

    /// Scenarios to run
    #[arg(long, value_enum, default_value_t = Selection::All)]
    scenario: Selection,

    /// Report format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[derive(clap::Args)]
struct MockArgs {
    /// Bind address
    #[arg(long)]
    bind: Option<String>,

    /// Requests allowed per window before flagging
    #[arg(long)]
    threshold: Option<usize>,

    /// Sliding window length in milliseconds
    #[arg(long)]
    window_ms: Option<u64>,
}

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.log_json);

    let config = Config::from_env()?;
    match args.command.unwrap_or(Command::Run(RunArgs::default())) {
        Command::Run(run_args) => run(config, run_args).await,
        Command::ServeMock(mock_args) => serve_mock(config, mock_args).await,
    }
}

/// Logs go to stderr so stdout carries only the report.
fn init_tracing(json: bool) {
    let filter = EnvFilter::builder()
        .with_default_directive(Level::INFO.into())
        .from_env_lossy();
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}

async fn run(mut config: Config, args: RunArgs) -> anyhow::Result<()> {
    if let Some(endpoint) = args.endpoint {
        config.endpoint = endpoint;
    }
    if let Some(timeout_secs) = args.timeout_secs {
        config.timeout_secs = timeout_secs;
    }
    if let Some(cooldown_ms) = args.cooldown_ms {
        config.cooldown_ms = cooldown_ms;
    }
    config.validate()?;

    let probe = HttpProbe::from_config(&config)?;
    info!(
        endpoint = %probe.endpoint(),
        timeout_secs = config.timeout_secs,
        cooldown_ms = config.cooldown_ms,
        scenario = ?args.scenario,
        "Starting brute force detection suite"
    );

    let report = run_suite(&config, args.scenario, &probe).await;

    match args.format {
        OutputFormat::Text => {
            for verdict in report.verdicts() {
                println!("{}", verdict);
            }
            if report.all_passed() {
                println!("✨ All tests passed");
            } else {
                println!("⚠️  Some tests failed");
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    Ok(())
}

async fn serve_mock(mut config: Config, args: MockArgs) -> anyhow::Result<()> {
    if let Some(bind) = args.bind {
        config.mock.bind_addr = bind;
    }
    if let Some(threshold) = args.threshold {
        config.mock.threshold = threshold;
    }
    if let Some(window_ms) = args.window_ms {
        config.mock.window_ms = window_ms;
    }

    info!(
        bind_addr = %config.mock.bind_addr,
        threshold = config.mock.threshold,
        window_ms = config.mock.window_ms,
        "Starting mock classifier"
    );

    let listener = TcpListener::bind(&config.mock.bind_addr).await?;
    mock::serve(listener, config.mock).await?;

    Ok(())
}

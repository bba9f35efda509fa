//! War room CLI - emergency shutdown of every registered vault and strategy
//!
//! One invocation performs one shutdown run:
//! - confirm the fee schedule with the operator
//! - check the caller may use the pause gate
//! - walk the registry and classify every production vault
//! - pause the access-control module, non-gated vaults, strategies, and the
//!   singleton modules, one transaction at a time

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use warroom_adapters::SnapshotLedger;
use warroom_core::{Address, Caller, FeeConfigurator, ShutdownOrchestrator, WarRoomConfig};

mod error;
mod output;
mod prompt;

use error::{CliError, CliResult};
use output::ConsoleReporter;
use prompt::TerminalFeePrompt;

/// War room CLI application
#[derive(Parser)]
#[command(name = "warroom")]
#[command(about = "Pause every registered vault and strategy", long_about = None)]
#[command(version)]
struct Cli {
    /// Ledger snapshot (JSON) to run against
    #[arg(short, long, env = "WARROOM_SNAPSHOT")]
    snapshot: PathBuf,

    /// Address that signs the pause transactions
    #[arg(long, env = "WARROOM_CALLER")]
    caller: String,

    /// Label for the caller in logs and reports
    #[arg(long)]
    caller_label: Option<String>,

    /// Configuration file path
    #[arg(short, long, env = "WARROOM_CONFIG")]
    config: Option<String>,

    /// Use the configured fee schedule without prompting
    #[arg(short = 'y', long)]
    non_interactive: bool,

    /// Run preflight and discovery, print the plan, send nothing
    #[arg(long)]
    dry_run: bool,

    /// Log level (overrides logging.level)
    #[arg(long)]
    log_level: Option<String>,

    /// JSON logs and a JSON report on stdout
    #[arg(long)]
    json: bool,
}

fn init_tracing(level: &str, json: bool) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| level.to_string().into());

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn operator(cli: &Cli) -> CliResult<Caller> {
    let address: Address = cli.caller.parse()?;
    Ok(match &cli.caller_label {
        Some(label) => Caller::new(address).with_label(label.clone()),
        None => Caller::new(address),
    })
}

async fn run(cli: Cli) -> anyhow::Result<u8> {
    let config = WarRoomConfig::load(cli.config.as_deref()).context("loading configuration")?;

    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| config.logging.level.clone());
    let json = cli.json || config.logging.json;
    init_tracing(&level, json);

    let caller = operator(&cli)?;
    let exit_policy = config.execution.exit_policy;

    let configurator = FeeConfigurator::new(config.fee.schedule()?);
    let fees = if cli.non_interactive {
        configurator.default_schedule()
    } else {
        configurator.configure(&mut TerminalFeePrompt)?
    };

    let ledger = SnapshotLedger::open(&cli.snapshot)
        .await
        .map_err(CliError::from)
        .with_context(|| format!("opening snapshot {}", cli.snapshot.display()))?;
    info!(
        snapshot = %cli.snapshot.display(),
        caller = %caller,
        fees = %fees,
        "Ledger snapshot loaded"
    );

    let orchestrator = ShutdownOrchestrator::builder()
        .with_ledger(Arc::new(ledger))
        .with_config(config)
        .build()?;

    let mut reporter = ConsoleReporter::new(json);
    let prepared = orchestrator.prepare(caller, fees, &mut reporter).await?;

    if cli.dry_run {
        if json {
            output::print_json(&prepared.plan)?;
        } else {
            output::print_plan(&prepared.plan);
        }
        return Ok(0);
    }

    reporter.start_execution(prepared.plan.len());
    let report = orchestrator.execute(prepared, &mut reporter).await;

    if json {
        output::print_json(&report)?;
    } else {
        output::print_report(&report);
    }

    Ok(u8::try_from(exit_policy.exit_code(&report.status)).unwrap_or(1))
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            output::print_error(&format!("{:#}", err));
            ExitCode::from(1)
        }
    }
}

use std::path::PathBuf;

use anyhow::bail;
use clap::{Parser, Subcommand};

use driftline::batch::{self, BatchOptions, BatchReport};
use driftline_core::config::{AnalysisConfig, TrackingMetric};
use driftline_core::run::{Role, Scenario};

#[derive(Parser)]
#[command(
    name = "driftline",
    about = "Normalize chrony/ntpq/ptp4l sync reports into comparable tables and plots"
)]
struct Cli {
    /// Output directory (defaults to the configured outdir).
    #[arg(long, global = true)]
    outdir: Option<PathBuf>,

    /// Force the scenario instead of inferring it from input names.
    #[arg(long, global = true)]
    scenario: Option<Scenario>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse chrony tracking/sourcestats capture pairs.
    Chrony {
        /// Capture directories or either file of a pair.
        inputs: Vec<PathBuf>,

        /// Which tracking metric to plot as the offset series.
        #[arg(long)]
        tracking_metric: Option<TrackingMetric>,
    },
    /// Parse ntpq peer-table snapshot logs.
    Ntp {
        inputs: Vec<PathBuf>,

        /// Force the role instead of inferring it from input names.
        #[arg(long)]
        role: Option<Role>,
    },
    /// Parse ptp4l daemon logs.
    Ptp {
        inputs: Vec<PathBuf>,

        /// Force the role instead of inferring it from input names.
        #[arg(long)]
        role: Option<Role>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("RUST_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = AnalysisConfig::load()?;

    let mut opts = BatchOptions {
        outdir: cli.outdir.unwrap_or(config.output.outdir),
        forced_role: None,
        forced_scenario: cli.scenario,
        tracking_metric: config.chrony.tracking_metric,
    };

    let report = match cli.command {
        Command::Chrony {
            inputs,
            tracking_metric,
        } => {
            if let Some(metric) = tracking_metric {
                opts.tracking_metric = metric;
            }
            require_inputs(&inputs)?;
            batch::run_chrony(&inputs, &opts)?
        }
        Command::Ntp { inputs, role } => {
            opts.forced_role = role;
            require_inputs(&inputs)?;
            batch::run_ntp(&inputs, &opts)?
        }
        Command::Ptp { inputs, role } => {
            opts.forced_role = role;
            require_inputs(&inputs)?;
            batch::run_ptp(&inputs, &opts)?
        }
    };

    finish(report)
}

fn require_inputs(inputs: &[PathBuf]) -> anyhow::Result<()> {
    if inputs.is_empty() {
        bail!("no inputs given");
    }
    Ok(())
}

fn finish(report: BatchReport) -> anyhow::Result<()> {
    for (input, err) in &report.failed {
        tracing::error!(input = %input.display(), %err, "run failed");
    }
    if report.completed == 0 {
        bail!("no run completed ({} failed)", report.failed.len());
    }
    tracing::info!(
        completed = report.completed,
        failed = report.failed.len(),
        "batch finished"
    );
    Ok(())
}

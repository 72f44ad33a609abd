use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use truelevel_core::period::ReportPeriod;

mod config;
mod workflow;

#[derive(Parser)]
#[command(name = "truelevel", version, about = "Chemical usage and cost-per-car reports for car-wash sites")]
struct Cli {
    /// Knowledge base directory
    #[arg(long, global = true, default_value = "./data")]
    data: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build a cost-per-car report for a site and period
    Report {
        #[arg(long)]
        site: String,
        /// Period start (RFC 3339), exclusive
        #[arg(long)]
        from: DateTime<Utc>,
        /// Period end (RFC 3339), inclusive
        #[arg(long)]
        to: DateTime<Utc>,
        /// Output directory (defaults to <data>/reports/<site>_<timestamp>)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Show the tank status board for a site
    Status {
        #[arg(long)]
        site: String,
    },
    /// Convert a depth reading to gallons with a container profile
    Convert {
        #[arg(long)]
        profile: String,
        #[arg(long)]
        inches: f64,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "truelevel=info,truelevel_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let kb = config::KnowledgeBase::load(&cli.data)
        .with_context(|| format!("Failed to load knowledge base from {:?}", cli.data))?;

    match cli.command {
        Command::Report { site, from, to, out } => {
            anyhow::ensure!(from < to, "--from must be earlier than --to");
            let output_dir = out.unwrap_or_else(|| {
                cli.data
                    .join("reports")
                    .join(format!("{}_{}", site, Utc::now().format("%Y%m%d_%H%M%S")))
            });
            workflow::run_report(&kb, &site, ReportPeriod::new(from, to), &output_dir)?;
            println!("\nReport written to {:?}", output_dir);
        }
        Command::Status { site } => workflow::run_status(&kb, &site)?,
        Command::Convert { profile, inches } => workflow::run_convert(&kb, &profile, inches)?,
    }

    Ok(())
}

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

mod batch;
mod bcd_writer;
mod config;
mod datatypes;
mod error;
mod metrics;
mod post_processor;
mod report_parser;
mod rotation;
mod scan_list;

#[derive(Debug, Parser)]
#[command(
    name = "microfe",
    version,
    about = "Boundary conditions and post-processing for registered 3D-TB microFE models"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Write a scan-specific boundary condition file for every scan
    Bcd(BcdArgs),
    /// Compute stiffness and failure load from solver reports
    Post(PostArgs),
}

#[derive(Debug, Args)]
struct CommonArgs {
    #[arg(long, help = "Scan list csv with registration angles")]
    scans: PathBuf,

    #[arg(long, help = "Json file overriding the study parameters")]
    config: Option<PathBuf>,

    #[arg(long, default_value_t = false, help = "Skip failing scans instead of aborting")]
    keep_going: bool,
}

#[derive(Debug, Args)]
struct BcdArgs {
    #[command(flatten)]
    common: CommonArgs,

    #[arg(long, help = "Template BCD file")]
    template: PathBuf,

    #[arg(long)]
    out_dir: PathBuf,
}

#[derive(Debug, Args)]
struct PostArgs {
    #[command(flatten)]
    common: CommonArgs,

    #[arg(long, help = "Directory holding the LISTING and POSTLIST files")]
    reports: PathBuf,

    #[arg(long, help = "Results csv, appended to")]
    results: PathBuf,
}

fn run(cli: Cli) -> Result<batch::BatchSummary, error::MicroFeError> {
    match cli.command {
        Commands::Bcd(args) => {
            let params = config::load(args.common.config.as_deref())?;
            bcd_writer::run(
                &args.common.scans,
                &args.template,
                &args.out_dir,
                &params,
                args.common.keep_going,
            )
        }
        Commands::Post(args) => {
            let params = config::load(args.common.config.as_deref())?;
            post_processor::run(
                &args.common.scans,
                &args.reports,
                &args.results,
                &params,
                args.common.keep_going,
            )
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(summary) if summary.failed == 0 => ExitCode::SUCCESS,
        Ok(summary) => {
            error!("{} scans failed", summary.failed);
            ExitCode::FAILURE
        }
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

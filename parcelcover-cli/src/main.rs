//! Parcelcover CLI - command-line driver for the overlay statistics engine.

mod commands;
mod error;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;

use crate::error::CliError;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum KindArg {
    /// Polygon layers only
    Polygon,
    /// Polyline layers only
    Polyline,
}

#[derive(Parser)]
#[command(name = "parcelcover")]
#[command(version = parcelcover::VERSION)]
#[command(about = "Land-cover overlap statistics over a vector workspace", long_about = None)]
pub struct Cli {
    /// Workspace directory (one JSON file per dataset)
    #[arg(long, short = 'w')]
    workspace: PathBuf,

    /// Configuration file (INI)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Reference layer every input is intersected with
    #[arg(long)]
    reference: Option<String>,

    /// Area unit for measured fields (acres, hectares, square_meters, ...)
    #[arg(long)]
    area_unit: Option<String>,

    /// Length unit for polyline measurements (feet, meters, miles)
    #[arg(long)]
    length_unit: Option<String>,

    /// Attribute field carrying the ownership class
    #[arg(long)]
    ownership_field: Option<String>,

    /// Ownership class to keep (matched case-insensitively)
    #[arg(long)]
    ownership_value: Option<String>,

    /// Coverage percentage threshold for the export stage
    #[arg(long)]
    threshold: Option<f64>,

    /// Worker threads (0 = one per core)
    #[arg(long)]
    workers: Option<usize>,

    /// Only process layers whose name matches this regex
    #[arg(long)]
    filter: Option<String>,

    /// Directory for the run log
    #[arg(long, default_value = "logs")]
    log_dir: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// List datasets in the workspace
    List {
        /// Restrict the listing to one geometry kind
        #[arg(long, value_enum)]
        kind: Option<KindArg>,
    },
    /// Run the full pipeline over every input layer
    Run,
    /// Select features by ownership and overlap, materializing the result
    Select,
    /// Add and fill the measurement fields on existing selections
    Measure,
    /// Overlay existing selections with the reference layer
    Intersect,
    /// Sum measured overlay fragments per parent feature
    Summarize,
    /// Copy summed coverage back onto selections and derive percentages
    Join,
    /// Export features at or above the coverage threshold
    Export,
}

fn main() {
    let cli = Cli::parse();

    let _guard = match parcelcover::logging::init_logging(
        &cli.log_dir,
        parcelcover::logging::default_log_file(),
    ) {
        Ok(guard) => guard,
        Err(err) => CliError::LoggingInit(err).exit(),
    };
    info!(version = parcelcover::VERSION, "parcelcover starting");

    match commands::dispatch(&cli) {
        Ok(code) => process::exit(code),
        Err(err) => err.exit(),
    }
}

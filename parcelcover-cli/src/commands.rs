//! Command dispatch: turns parsed arguments into pipeline runs.

use regex::Regex;

use parcelcover::config::RunConfig;
use parcelcover::geometry::{AreaUnit, GeometryKind, LengthUnit, PlanarOps};
use parcelcover::pipeline::{list_datasets, Pipeline, RunReport, Stage};
use parcelcover::workspace::JsonWorkspace;

use crate::error::CliError;
use crate::{Cli, Command, KindArg};

/// Runs the selected command and returns the process exit code.
pub fn dispatch(cli: &Cli) -> Result<i32, CliError> {
    let config = build_config(cli)?;
    let filter = cli
        .filter
        .as_deref()
        .map(Regex::new)
        .transpose()?;

    let ws = JsonWorkspace::open(&cli.workspace)?;
    let ops = PlanarOps::new();
    let pipeline = Pipeline::new(&ws, &ops, &config);

    let report = match &cli.command {
        Command::List { kind } => {
            let kind = kind.map(|k| match k {
                KindArg::Polygon => GeometryKind::Polygon,
                KindArg::Polyline => GeometryKind::Polyline,
            });
            for name in list_datasets(&ws, kind, filter.as_ref())? {
                println!("{name}");
            }
            return Ok(0);
        }
        Command::Run => pipeline.run(filter.as_ref())?,
        Command::Select => pipeline.run_stage(Stage::Select, filter.as_ref())?,
        Command::Measure => pipeline.run_stage(Stage::Measure, filter.as_ref())?,
        Command::Intersect => pipeline.run_stage(Stage::Intersect, filter.as_ref())?,
        Command::Summarize => pipeline.run_stage(Stage::Summarize, filter.as_ref())?,
        Command::Join => pipeline.run_stage(Stage::Join, filter.as_ref())?,
        Command::Export => pipeline.run_stage(Stage::Export, filter.as_ref())?,
    };

    print_report(&report);
    Ok(report.exit_code())
}

/// Config file values overlaid with command-line flags.
fn build_config(cli: &Cli) -> Result<RunConfig, CliError> {
    let mut config = match &cli.config {
        Some(path) => RunConfig::load_from(path)?,
        None => RunConfig::default(),
    };

    if let Some(reference) = &cli.reference {
        config.reference_layer = reference.clone();
    }
    if let Some(name) = &cli.area_unit {
        config.units.area = AreaUnit::from_name(name).ok_or(CliError::InvalidFlag {
            flag: "--area-unit",
            value: name.clone(),
        })?;
    }
    if let Some(name) = &cli.length_unit {
        config.units.length = LengthUnit::from_name(name).ok_or(CliError::InvalidFlag {
            flag: "--length-unit",
            value: name.clone(),
        })?;
    }
    if let Some(field) = &cli.ownership_field {
        config.fields.ownership = field.clone();
    }
    if let Some(value) = &cli.ownership_value {
        config.fields.ownership_value = value.clone();
    }
    if let Some(threshold) = cli.threshold {
        if !(0.0..=100.0).contains(&threshold) {
            return Err(CliError::InvalidFlag {
                flag: "--threshold",
                value: threshold.to_string(),
            });
        }
        config.pct_threshold = threshold;
    }
    if let Some(workers) = cli.workers {
        config.pipeline.workers = workers;
    }
    Ok(config)
}

fn print_report(report: &RunReport) {
    print!("{}", report.render());
}

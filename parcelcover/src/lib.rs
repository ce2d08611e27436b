//! Parcelcover - land-cover overlap statistics for vector workspaces
//!
//! This library computes, for every parcel layer in a workspace, how much of
//! each parcel is covered by a reference layer (typically forest cover): it
//! selects features by ownership and location, intersects them with the
//! reference layer, measures the fragments, sums them per parent feature,
//! and writes the covered area and percentage back onto the parents.
//!
//! # High-Level API
//!
//! The [`pipeline`] module drives the whole sequence:
//!
//! ```ignore
//! use parcelcover::config::RunConfig;
//! use parcelcover::geometry::PlanarOps;
//! use parcelcover::pipeline::Pipeline;
//! use parcelcover::workspace::JsonWorkspace;
//!
//! let ws = JsonWorkspace::open("data/county")?;
//! let mut config = RunConfig::default();
//! config.reference_layer = "forest".to_string();
//!
//! let ops = PlanarOps::new();
//! let report = Pipeline::new(&ws, &ops, &config).run(None)?;
//! std::process::exit(report.exit_code());
//! ```

pub mod aggregate;
pub mod cancel;
pub mod catalog;
pub mod config;
pub mod error;
pub mod geometry;
pub mod join;
pub mod logging;
pub mod measure;
pub mod model;
pub mod overlay;
pub mod pipeline;
pub mod select;
pub mod workspace;

/// Version of the parcelcover library and CLI.
///
/// Defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

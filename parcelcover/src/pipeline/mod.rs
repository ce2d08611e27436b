//! The batch pipeline: stage sequence, parallel driver, and run report.
//!
//! # Architecture
//!
//! ```text
//! discover → [per layer] select → measure → intersect → summarize → join → export
//! ```
//!
//! Layers run independently over a bounded worker pool; each finishes with
//! a [`LayerOutcome`] and the whole run with a [`RunReport`]. One layer's
//! failure never aborts another's run.

mod report;
mod runner;

pub use report::{LayerOutcome, LayerStatus, RunReport, Stage, StageTiming};
pub use runner::{list_datasets, Pipeline};

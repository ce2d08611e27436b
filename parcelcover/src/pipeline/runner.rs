//! The per-layer pipeline and its parallel driver.
//!
//! Each input layer runs the same stage sequence:
//!
//! ```text
//! select → measure → intersect → summarize → join → export
//! ```
//!
//! Layers are independent, so the driver fans them out over a bounded
//! rayon pool. A failure in one layer is recorded in its outcome and never
//! aborts the others; cancellation is cooperative and shows up as a
//! `Cancelled` failure on whichever layers had not finished.

use std::time::Instant;

use rayon::prelude::*;
use regex::Regex;
use tracing::{info, warn};

use super::report::{LayerOutcome, LayerStatus, RunReport, Stage, StageTiming};
use crate::aggregate::{persist, summarize};
use crate::cancel::CancelToken;
use crate::catalog::{self, PairingStrategy};
use crate::config::{export_name, intersect_name, selected_name, summary_name, RunConfig};
use crate::error::{EngineError, EngineResult};
use crate::geometry::GeometryOps;
use crate::join::{attach_and_copy, derive_ratio, KeyField};
use crate::measure::{ensure_field, measure, UnitConfig};
use crate::model::{DatasetKind, FieldType, SelectionMode, SummaryTable};
use crate::overlay::{self, back_ref_field, OverlayOptions, OverlayOutcome};
use crate::select::{materialize, select_by_attribute, select_by_location, AttributePredicate, LocationTarget};
use crate::workspace::Workspace;

/// Drives the stage sequence over a workspace.
pub struct Pipeline<'a> {
    ws: &'a dyn Workspace,
    ops: &'a dyn GeometryOps,
    config: &'a RunConfig,
    cancel: CancelToken,
}

impl<'a> Pipeline<'a> {
    pub fn new(ws: &'a dyn Workspace, ops: &'a dyn GeometryOps, config: &'a RunConfig) -> Self {
        Self {
            ws,
            ops,
            config,
            cancel: CancelToken::new(),
        }
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Input layers: every layer in the workspace except the reference
    /// layer and datasets this engine itself derives (selections, overlay
    /// outputs, threshold exports; summary tables are excluded by kind).
    pub fn discover(&self, filter: Option<&Regex>) -> EngineResult<Vec<String>> {
        let entries = self.ws.list()?;
        let selected_marker = format!("_{}", self.config.naming.selected_suffix);
        Ok(entries
            .into_iter()
            .filter(|e| matches!(e.kind, DatasetKind::Layer(_)))
            .map(|e| e.name)
            .filter(|name| name != &self.config.reference_layer)
            .filter(|name| !name.contains(&selected_marker))
            .filter(|name| !is_export_name(name))
            .filter(|name| filter.map_or(true, |re| re.is_match(name)))
            .collect())
    }

    /// Pairs every discovered input layer with a reference layer for
    /// overlay. With a single configured reference this is a cross join;
    /// keeping the strategy here means other pairings slot in without
    /// touching the stages.
    pub fn plan(&self, filter: Option<&Regex>) -> EngineResult<Vec<(String, String)>> {
        let inputs = self.discover(filter)?;
        let references = vec![self.config.reference_layer.clone()];
        Ok(catalog::pair(&inputs, &references, PairingStrategy::CrossJoin))
    }

    /// Runs the full stage sequence over every planned (input, reference)
    /// pair.
    pub fn run(&self, filter: Option<&Regex>) -> EngineResult<RunReport> {
        let started = Instant::now();
        self.require_reference()?;
        let pairs = self.plan(filter)?;
        info!(layers = pairs.len(), "pipeline run starting");

        let outcomes = self.drive(&pairs, |pair| self.run_layer(&pair.0, &pair.1))?;
        Ok(RunReport {
            outcomes,
            elapsed: started.elapsed(),
        })
    }

    /// Runs a single stage over every discovered layer, mirroring the
    /// stage-at-a-time batch workflow this engine descends from.
    pub fn run_stage(&self, stage: Stage, filter: Option<&Regex>) -> EngineResult<RunReport> {
        let started = Instant::now();
        if matches!(stage, Stage::Select | Stage::Intersect) {
            self.require_reference()?;
        }
        let pairs = self.plan(filter)?;

        let outcomes = self.drive(&pairs, |pair| {
            let (layer, reference) = (pair.0.as_str(), pair.1.as_str());
            let layer_started = Instant::now();
            let mut timings = Vec::new();
            let mut empty_intersection = false;
            let result = run_timed(&mut timings, stage, || {
                self.single_stage(stage, layer, reference, &mut empty_intersection)
            });
            finish_layer(layer, result, timings, empty_intersection, layer_started)
        })?;
        Ok(RunReport {
            outcomes,
            elapsed: started.elapsed(),
        })
    }

    /// Runs the whole stage sequence for one layer against one reference,
    /// recording timings and converting any stage error into a `Failed`
    /// status.
    pub fn run_layer(&self, layer: &str, reference: &str) -> LayerOutcome {
        let started = Instant::now();
        let mut timings = Vec::new();
        let mut empty_intersection = false;
        let result = self.execute_layer(layer, reference, &mut timings, &mut empty_intersection);
        finish_layer(layer, result, timings, empty_intersection, started)
    }

    fn execute_layer(
        &self,
        layer: &str,
        reference: &str,
        timings: &mut Vec<StageTiming>,
        empty_intersection: &mut bool,
    ) -> Result<(), (Stage, EngineError)> {
        let selected = run_timed(timings, Stage::Select, || self.select_stage(layer, reference))?;
        run_timed(timings, Stage::Measure, || self.measure_stage(&selected))?;
        let overlay = run_timed(timings, Stage::Intersect, || {
            self.intersect_stage(&selected, reference)
        })?;
        *empty_intersection = overlay.empty;
        let summary = run_timed(timings, Stage::Summarize, || self.summarize_stage(&selected))?;
        run_timed(timings, Stage::Join, || self.join_stage(&selected, &summary))?;
        run_timed(timings, Stage::Export, || self.export_stage(&selected))?;
        Ok(())
    }

    fn single_stage(
        &self,
        stage: Stage,
        layer: &str,
        reference: &str,
        empty_intersection: &mut bool,
    ) -> EngineResult<()> {
        let selected = selected_name(layer, self.config);
        match stage {
            Stage::Select => self.select_stage(layer, reference).map(|_| ()),
            Stage::Measure => self.measure_stage(&selected),
            Stage::Intersect => self.intersect_stage(&selected, reference).map(|outcome| {
                *empty_intersection = outcome.empty;
            }),
            Stage::Summarize => self.summarize_stage(&selected).map(|_| ()),
            Stage::Join => {
                // The summary is recomputed from the persisted overlay
                // output, so a standalone join sees exactly the data a
                // standalone summarize would have written.
                let summary = self.summarize_stage(&selected)?;
                self.join_stage(&selected, &summary)
            }
            Stage::Export => self.export_stage(&selected).map(|_| ()),
        }
    }

    /// Ownership selection narrowed by spatial overlap with the reference
    /// layer, materialized under the derived selection name.
    fn select_stage(&self, layer: &str, reference: &str) -> EngineResult<String> {
        let c = self.config;
        let by_owner = select_by_attribute(
            self.ws,
            layer,
            &AttributePredicate::TextEquals {
                field: c.fields.ownership.clone(),
                value: c.fields.ownership_value.clone(),
            },
        )?;
        let near_reference = select_by_location(
            self.ws,
            self.ops,
            LocationTarget::Selection(&by_owner),
            reference,
            SelectionMode::Subset,
        )?;
        let output = selected_name(layer, c);
        let count = materialize(self.ws, &near_reference, &output)?;
        info!(layer, output = %output, features = count, "selection materialized");
        Ok(output)
    }

    /// Adds the measurement fields to the selection and fills in the
    /// parent-feature size.
    fn measure_stage(&self, selected: &str) -> EngineResult<()> {
        let c = self.config;
        for field in [&c.fields.parcel_area, &c.fields.cover_area, &c.fields.cover_pct] {
            ensure_field(self.ws, selected, field, FieldType::Double)?;
        }
        measure(self.ws, self.ops, selected, &c.fields.parcel_area, &self.units())?;
        Ok(())
    }

    /// Overlays the selection with the reference layer and measures each
    /// output fragment.
    fn intersect_stage(&self, selected: &str, reference: &str) -> EngineResult<OverlayOutcome> {
        let c = self.config;
        let output = intersect_name(selected, c);
        let options = OverlayOptions {
            batch_size: c.pipeline.overlay_batch_size,
            cancel: self.cancel.clone(),
        };
        let outcome = overlay::intersect(self.ws, self.ops, selected, reference, &output, &options)?;

        ensure_field(self.ws, &output, &c.fields.cover_area, FieldType::Double)?;
        measure(self.ws, self.ops, &output, &c.fields.cover_area, &self.units())?;
        Ok(outcome)
    }

    /// Sums the measured fragments per parent feature and persists the
    /// summary table.
    fn summarize_stage(&self, selected: &str) -> EngineResult<SummaryTable> {
        let c = self.config;
        let intersect = intersect_name(selected, c);
        let dataset = self.ws.read_dataset(&intersect)?;
        let summary = summarize(&dataset, &c.fields.cover_area, &back_ref_field(selected))?;
        persist(self.ws, &summary, &summary_name(&intersect, c))?;
        Ok(summary)
    }

    /// Copies each parent's summed cover back onto the selection and
    /// derives the percentage field.
    fn join_stage(&self, selected: &str, summary: &SummaryTable) -> EngineResult<()> {
        let c = self.config;
        attach_and_copy(self.ws, selected, &KeyField::FeatureId, summary, &c.fields.cover_area)?;
        derive_ratio(
            self.ws,
            selected,
            &c.fields.cover_area,
            &c.fields.parcel_area,
            &c.fields.cover_pct,
            100.0,
        )?;
        Ok(())
    }

    /// Materializes the features at or above the percentage threshold.
    fn export_stage(&self, selected: &str) -> EngineResult<usize> {
        let c = self.config;
        let over_threshold = select_by_attribute(
            self.ws,
            selected,
            &AttributePredicate::AtLeast {
                field: c.fields.cover_pct.clone(),
                threshold: c.pct_threshold,
            },
        )?;
        materialize(self.ws, &over_threshold, &export_name(selected, c.pct_threshold))
    }

    fn units(&self) -> UnitConfig {
        UnitConfig {
            area: self.config.units.area,
            length: self.config.units.length,
        }
    }

    fn require_reference(&self) -> EngineResult<()> {
        if self.config.reference_layer.is_empty() {
            return Err(EngineError::NotFound {
                kind: "layer",
                name: "(no reference layer configured)".to_string(),
            });
        }
        if !self.ws.exists(&self.config.reference_layer)? {
            return Err(EngineError::NotFound {
                kind: "layer",
                name: self.config.reference_layer.clone(),
            });
        }
        Ok(())
    }

    /// Fans work items out over a bounded worker pool; 0 workers means one
    /// per available core.
    fn drive<T, F>(&self, items: &[T], per_item: F) -> EngineResult<Vec<LayerOutcome>>
    where
        T: Sync,
        F: Fn(&T) -> LayerOutcome + Send + Sync,
    {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.pipeline.workers)
            .build()
            .map_err(|e| EngineError::Io(format!("worker pool: {e}")))?;
        Ok(pool.install(|| items.par_iter().map(|item| per_item(item)).collect()))
    }
}

/// Lists datasets matching the catalog filters, for the `list` command.
pub fn list_datasets(
    ws: &dyn Workspace,
    kind: Option<crate::geometry::GeometryKind>,
    pattern: Option<&Regex>,
) -> EngineResult<Vec<String>> {
    catalog::list(ws, kind, pattern)
}

fn run_timed<T>(
    timings: &mut Vec<StageTiming>,
    stage: Stage,
    f: impl FnOnce() -> EngineResult<T>,
) -> Result<T, (Stage, EngineError)> {
    let started = Instant::now();
    let result = f();
    timings.push(StageTiming {
        stage,
        elapsed: started.elapsed(),
    });
    result.map_err(|err| (stage, err))
}

fn finish_layer(
    layer: &str,
    result: Result<(), (Stage, EngineError)>,
    timings: Vec<StageTiming>,
    empty_intersection: bool,
    started: Instant,
) -> LayerOutcome {
    let status = match result {
        Ok(()) => LayerStatus::Finalized,
        Err((stage, err)) => {
            warn!(layer, %stage, error = %err, "layer failed");
            LayerStatus::Failed {
                stage,
                kind: err.kind(),
                message: err.to_string(),
            }
        }
    };
    LayerOutcome {
        layer: layer.to_string(),
        status,
        empty_intersection,
        timings,
        elapsed: started.elapsed(),
    }
}

/// Recognizes derived threshold-export names such as `parcels_10pct` or
/// `parcels_12_5pct`.
fn is_export_name(name: &str) -> bool {
    let Some(stripped) = name.strip_suffix("pct") else {
        return false;
    };
    let Some(idx) = stripped.rfind('_') else {
        return false;
    };
    let digits = &stripped[idx + 1..];
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

//! Configuration structs and file loading.

use std::path::Path;

use ini::Ini;
use thiserror::Error;

use super::defaults::*;
use super::parser::parse_ini;
use crate::geometry::{AreaUnit, LengthUnit};

/// Errors raised while loading or validating a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Read(#[from] ini::Error),

    #[error("invalid config value [{section}] {key} = {value}: {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },
}

/// Field names the pipeline reads and writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSettings {
    /// Attribute holding the ownership class on input layers.
    pub ownership: String,
    /// Ownership class kept by the selection stage.
    pub ownership_value: String,
    /// Parent-feature area field.
    pub parcel_area: String,
    /// Covered-area field on overlay outputs and (after join) parents.
    pub cover_area: String,
    /// Derived percentage field.
    pub cover_pct: String,
}

impl Default for FieldSettings {
    fn default() -> Self {
        Self {
            ownership: DEFAULT_OWNERSHIP_FIELD.to_string(),
            ownership_value: DEFAULT_OWNERSHIP_VALUE.to_string(),
            parcel_area: DEFAULT_PARCEL_AREA_FIELD.to_string(),
            cover_area: DEFAULT_COVER_AREA_FIELD.to_string(),
            cover_pct: DEFAULT_COVER_PCT_FIELD.to_string(),
        }
    }
}

/// Measurement units for area and length fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitSettings {
    pub area: AreaUnit,
    pub length: LengthUnit,
}

impl Default for UnitSettings {
    fn default() -> Self {
        Self {
            area: AreaUnit::Acres,
            length: LengthUnit::Feet,
        }
    }
}

/// Suffixes used to derive output dataset names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingSettings {
    pub selected_suffix: String,
    pub intersect_suffix: String,
    pub summary_suffix: String,
}

impl Default for NamingSettings {
    fn default() -> Self {
        Self {
            selected_suffix: DEFAULT_SELECTED_SUFFIX.to_string(),
            intersect_suffix: DEFAULT_INTERSECT_SUFFIX.to_string(),
            summary_suffix: DEFAULT_SUMMARY_SUFFIX.to_string(),
        }
    }
}

/// Execution tuning for the pipeline runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineSettings {
    /// Worker threads; 0 means one per available core.
    pub workers: usize,
    /// Feature pairs written per overlay batch.
    pub overlay_batch_size: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            overlay_batch_size: DEFAULT_OVERLAY_BATCH_SIZE,
        }
    }
}

/// Complete configuration for a pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    /// Name of the reference (cover) layer every input is intersected with.
    pub reference_layer: String,
    /// Threshold (percent) for the final export stage.
    pub pct_threshold: f64,
    pub fields: FieldSettings,
    pub units: UnitSettings,
    pub naming: NamingSettings,
    pub pipeline: PipelineSettings,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            reference_layer: String::new(),
            pct_threshold: DEFAULT_PCT_THRESHOLD,
            fields: FieldSettings::default(),
            units: UnitSettings::default(),
            naming: NamingSettings::default(),
            pipeline: PipelineSettings::default(),
        }
    }
}

impl RunConfig {
    /// Loads a configuration file, overlaying its values on the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_file(path)?;
        parse_ini(&ini)
    }
}

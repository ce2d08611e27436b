//! Run configuration for the overlay engine.
//!
//! A [`RunConfig`] starts from built-in defaults and is overlaid from an INI
//! file; the CLI then applies its own flag overrides on top. The parser is
//! the single place where INI key names map to struct fields.

mod defaults;
mod names;
mod parser;
mod settings;

pub use defaults::{
    DEFAULT_COVER_AREA_FIELD, DEFAULT_COVER_PCT_FIELD, DEFAULT_OWNERSHIP_FIELD,
    DEFAULT_OWNERSHIP_VALUE, DEFAULT_PARCEL_AREA_FIELD, DEFAULT_PCT_THRESHOLD,
};
pub use names::{export_name, intersect_name, selected_name, summary_name};
pub use settings::{
    ConfigError, FieldSettings, NamingSettings, PipelineSettings, RunConfig, UnitSettings,
};

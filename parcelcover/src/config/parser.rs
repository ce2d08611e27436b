//! INI parsing logic for converting `Ini` → `RunConfig`.

use ini::Ini;

use super::settings::{ConfigError, RunConfig};
use crate::geometry::{AreaUnit, LengthUnit};

/// Parse an `Ini` object into a `RunConfig`.
///
/// Starts from `RunConfig::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<RunConfig, ConfigError> {
    let mut config = RunConfig::default();

    // [run] section
    if let Some(section) = ini.section(Some("run")) {
        if let Some(v) = section.get("reference_layer") {
            let v = v.trim();
            if !v.is_empty() {
                config.reference_layer = v.to_string();
            }
        }
        if let Some(v) = section.get("pct_threshold") {
            let parsed: f64 = v.parse().map_err(|_| ConfigError::InvalidValue {
                section: "run".to_string(),
                key: "pct_threshold".to_string(),
                value: v.to_string(),
                reason: "must be a number (percent)".to_string(),
            })?;
            if !(0.0..=100.0).contains(&parsed) {
                return Err(ConfigError::InvalidValue {
                    section: "run".to_string(),
                    key: "pct_threshold".to_string(),
                    value: v.to_string(),
                    reason: "must be between 0 and 100".to_string(),
                });
            }
            config.pct_threshold = parsed;
        }
    }

    // [fields] section
    if let Some(section) = ini.section(Some("fields")) {
        for (key, slot) in [
            ("ownership", &mut config.fields.ownership),
            ("ownership_value", &mut config.fields.ownership_value),
            ("parcel_area", &mut config.fields.parcel_area),
            ("cover_area", &mut config.fields.cover_area),
            ("cover_pct", &mut config.fields.cover_pct),
        ] {
            if let Some(v) = section.get(key) {
                let v = v.trim();
                if !v.is_empty() {
                    *slot = v.to_string();
                }
            }
        }
    }

    // [units] section
    if let Some(section) = ini.section(Some("units")) {
        if let Some(v) = section.get("area") {
            config.units.area =
                AreaUnit::from_name(v).ok_or_else(|| ConfigError::InvalidValue {
                    section: "units".to_string(),
                    key: "area".to_string(),
                    value: v.to_string(),
                    reason: "must be one of: acres, hectares, square_meters, square_feet, square_miles"
                        .to_string(),
                })?;
        }
        if let Some(v) = section.get("length") {
            config.units.length =
                LengthUnit::from_name(v).ok_or_else(|| ConfigError::InvalidValue {
                    section: "units".to_string(),
                    key: "length".to_string(),
                    value: v.to_string(),
                    reason: "must be one of: meters, feet, miles".to_string(),
                })?;
        }
    }

    // [naming] section
    if let Some(section) = ini.section(Some("naming")) {
        for (key, slot) in [
            ("selected_suffix", &mut config.naming.selected_suffix),
            ("intersect_suffix", &mut config.naming.intersect_suffix),
            ("summary_suffix", &mut config.naming.summary_suffix),
        ] {
            if let Some(v) = section.get(key) {
                let v = v.trim();
                if !v.is_empty() {
                    *slot = v.to_string();
                }
            }
        }
    }

    // [pipeline] section
    if let Some(section) = ini.section(Some("pipeline")) {
        if let Some(v) = section.get("workers") {
            config.pipeline.workers = v.parse().map_err(|_| ConfigError::InvalidValue {
                section: "pipeline".to_string(),
                key: "workers".to_string(),
                value: v.to_string(),
                reason: "must be a non-negative integer (0 = one per core)".to_string(),
            })?;
        }
        if let Some(v) = section.get("overlay_batch_size") {
            let parsed: usize = v.parse().map_err(|_| ConfigError::InvalidValue {
                section: "pipeline".to_string(),
                key: "overlay_batch_size".to_string(),
                value: v.to_string(),
                reason: "must be a positive integer".to_string(),
            })?;
            if parsed == 0 {
                return Err(ConfigError::InvalidValue {
                    section: "pipeline".to_string(),
                    key: "overlay_batch_size".to_string(),
                    value: v.to_string(),
                    reason: "must be a positive integer".to_string(),
                });
            }
            config.pipeline.overlay_batch_size = parsed;
        }
    }

    Ok(config)
}

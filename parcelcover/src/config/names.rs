//! Derived output dataset names.
//!
//! Every stage writes its output under a name derived from its input, so a
//! whole run is reproducible from the input layer names alone and re-runs
//! replace rather than accumulate (`parcels_privateforest`, never
//! `parcels_privateforest2`).

use super::settings::RunConfig;

/// Name of the materialized ownership-and-location selection for `layer`.
pub fn selected_name(layer: &str, config: &RunConfig) -> String {
    format!("{layer}_{}", config.naming.selected_suffix)
}

/// Name of the pairwise overlay output for a selection.
pub fn intersect_name(selected: &str, config: &RunConfig) -> String {
    format!("{selected}_{}", config.naming.intersect_suffix)
}

/// Name of the group-by-sum summary table for an overlay output.
pub fn summary_name(intersect: &str, config: &RunConfig) -> String {
    format!("{intersect}_{}", config.naming.summary_suffix)
}

/// Name of the threshold export for `layer`, e.g. `parcels_10pct`.
///
/// Whole thresholds format without a decimal point; fractional ones replace
/// the point with an underscore to keep the name storage-safe.
pub fn export_name(layer: &str, threshold: f64) -> String {
    if threshold.fract() == 0.0 {
        format!("{layer}_{}pct", threshold as i64)
    } else {
        format!("{layer}_{}pct", threshold.to_string().replace('.', "_"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_names_chain() {
        let config = RunConfig::default();
        let selected = selected_name("parcels", &config);
        assert_eq!(selected, "parcels_privateforest");
        let intersect = intersect_name(&selected, &config);
        assert_eq!(intersect, "parcels_privateforest_intersect");
        assert_eq!(
            summary_name(&intersect, &config),
            "parcels_privateforest_intersect_summary"
        );
    }

    #[test]
    fn test_export_name_formats() {
        assert_eq!(export_name("parcels", 10.0), "parcels_10pct");
        assert_eq!(export_name("parcels", 12.5), "parcels_12_5pct");
    }
}

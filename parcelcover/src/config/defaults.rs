//! Built-in configuration defaults.

/// Attribute field carrying the ownership class.
pub const DEFAULT_OWNERSHIP_FIELD: &str = "OWN_TYPE";

/// Ownership class the selection stage keeps (matched case-insensitively).
pub const DEFAULT_OWNERSHIP_VALUE: &str = "private";

/// Area field written onto input layers before overlay.
pub const DEFAULT_PARCEL_AREA_FIELD: &str = "Parcel_Acres";

/// Per-feature covered area field.
pub const DEFAULT_COVER_AREA_FIELD: &str = "Forest_Acres";

/// Per-feature covered percentage field.
pub const DEFAULT_COVER_PCT_FIELD: &str = "Forest_pct";

/// Threshold (percent) for the final export stage.
pub const DEFAULT_PCT_THRESHOLD: f64 = 10.0;

/// Suffix for the materialized ownership-and-location selection.
pub const DEFAULT_SELECTED_SUFFIX: &str = "privateforest";

/// Suffix for pairwise overlay outputs.
pub const DEFAULT_INTERSECT_SUFFIX: &str = "intersect";

/// Suffix for group-by-sum summary tables.
pub const DEFAULT_SUMMARY_SUFFIX: &str = "summary";

/// Feature pairs written per batch during overlay.
pub const DEFAULT_OVERLAY_BATCH_SIZE: usize = 512;

/// Worker thread count; 0 means one per available core.
pub const DEFAULT_WORKERS: usize = 0;

//! Group-by sum aggregation into a summary table.
//!
//! `summarize` is pure: it reads a dataset value and returns an immutable
//! [`SummaryTable`]. Writing the summary to storage is a separate, explicit
//! step (`persist`), decoupled from the accumulation logic.

use crate::error::{EngineError, EngineResult};
use crate::model::{Dataset, SummaryRow, SummaryTable, Value};
use crate::workspace::{replace_dataset, Workspace};
use std::collections::HashMap;
use tracing::debug;

/// Partitions records by `group_field` and sums `measure_field` per
/// partition with plain f64 accumulation (no intermediate rounding).
///
/// Only group values actually observed in at least one record produce a
/// summary row; there is no synthetic zero row for keys never seen, and the
/// join's zero-match default covers those. Null measurements contribute
/// nothing to their group's sum (but the group still appears). Rows are
/// ordered by first appearance of their key.
pub fn summarize(
    dataset: &Dataset,
    measure_field: &str,
    group_field: &str,
) -> EngineResult<SummaryTable> {
    let schema = dataset.schema();
    let measure_idx = schema
        .field_index(measure_field)
        .ok_or_else(|| EngineError::NotFound {
            kind: "field",
            name: format!("{}.{measure_field}", dataset.name()),
        })?;
    let group_idx = schema
        .field_index(group_field)
        .ok_or_else(|| EngineError::NotFound {
            kind: "field",
            name: format!("{}.{group_field}", dataset.name()),
        })?;

    let records: Vec<(&Value, &Value)> = match dataset {
        Dataset::Layer(layer) => layer
            .features
            .iter()
            .map(|f| (f.value(group_idx), f.value(measure_idx)))
            .collect(),
        Dataset::Table(table) => table
            .rows
            .iter()
            .map(|r| (r.value(group_idx), r.value(measure_idx)))
            .collect(),
    };

    let mut order: Vec<Value> = Vec::new();
    let mut totals: HashMap<Value, f64> = HashMap::new();
    for (group, measured) in records {
        let entry = totals.entry(group.clone()).or_insert_with(|| {
            order.push(group.clone());
            0.0
        });
        if let Some(v) = measured.as_f64() {
            *entry += v;
        }
    }

    let rows = order
        .into_iter()
        .map(|key| {
            let total = totals[&key];
            SummaryRow { key, total }
        })
        .collect();

    debug!(
        dataset = dataset.name(),
        measure_field, group_field, "summarized"
    );
    Ok(SummaryTable::new(group_field, measure_field, rows))
}

/// Persists a summary as a standalone table under `table_name`, atomically
/// replacing any prior table of that name.
pub fn persist(ws: &dyn Workspace, summary: &SummaryTable, table_name: &str) -> EngineResult<()> {
    let table = summary.to_table(table_name);
    replace_dataset(ws, Dataset::Table(table), table_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Geometry, GeometryKind};
    use crate::model::{Feature, Field, Layer, Schema};
    use crate::workspace::{read_table, MemoryWorkspace};
    use geo_types::MultiPolygon;

    fn empty_polygon() -> Geometry {
        Geometry::Polygon(MultiPolygon(vec![]))
    }

    fn intersect_layer(rows: Vec<(i64, Value)>) -> Dataset {
        let mut layer = Layer::new(
            "parcels_intersect",
            GeometryKind::Polygon,
            Schema::new(vec![
                Field::integer("FID_parcels"),
                Field::double("Forest_Acres"),
            ]),
        );
        for (i, (fid, acres)) in rows.into_iter().enumerate() {
            layer.features.push(Feature::new(
                (i + 1) as u64,
                empty_polygon(),
                vec![Value::Integer(fid), acres],
            ));
        }
        Dataset::Layer(layer)
    }

    #[test]
    fn test_summarize_groups_and_sums() {
        let dataset = intersect_layer(vec![
            (1, Value::Double(2.0)),
            (2, Value::Double(0.25)),
            (1, Value::Double(1.5)),
        ]);
        let summary = summarize(&dataset, "Forest_Acres", "FID_parcels").unwrap();

        assert_eq!(summary.len(), 2);
        assert_eq!(summary.get(&Value::Integer(1)), Some(3.5));
        assert_eq!(summary.get(&Value::Integer(2)), Some(0.25));
        // First-seen order
        assert_eq!(summary.rows()[0].key, Value::Integer(1));
    }

    #[test]
    fn test_summarize_only_observed_keys() {
        let dataset = intersect_layer(vec![(7, Value::Double(1.0))]);
        let summary = summarize(&dataset, "Forest_Acres", "FID_parcels").unwrap();
        assert_eq!(summary.len(), 1);
        assert_eq!(summary.get(&Value::Integer(1)), None);
    }

    #[test]
    fn test_summarize_empty_dataset_is_empty_table() {
        let dataset = intersect_layer(vec![]);
        let summary = summarize(&dataset, "Forest_Acres", "FID_parcels").unwrap();
        assert!(summary.is_empty());
    }

    #[test]
    fn test_summarize_null_measurement_counts_as_nothing() {
        let dataset = intersect_layer(vec![(1, Value::Null), (1, Value::Double(2.0))]);
        let summary = summarize(&dataset, "Forest_Acres", "FID_parcels").unwrap();
        assert_eq!(summary.get(&Value::Integer(1)), Some(2.0));
    }

    #[test]
    fn test_summarize_missing_field_is_not_found() {
        let dataset = intersect_layer(vec![]);
        let err = summarize(&dataset, "ghost", "FID_parcels").unwrap_err();
        assert_eq!(err.kind(), "NotFound");
    }

    #[test]
    fn test_exact_sum_no_intermediate_rounding() {
        // 0.1 added ten times differs from 1.0 in f64; the summary must
        // carry the accumulated value, not a rounded one.
        let rows = (0..10).map(|_| (1, Value::Double(0.1))).collect();
        let summary = summarize(&intersect_layer(rows), "Forest_Acres", "FID_parcels").unwrap();
        let expected: f64 = (0..10).map(|_| 0.1).sum();
        assert_eq!(summary.get(&Value::Integer(1)), Some(expected));
    }

    #[test]
    fn test_persist_writes_table() {
        let ws = MemoryWorkspace::new();
        let dataset = intersect_layer(vec![(1, Value::Double(2.0))]);
        let summary = summarize(&dataset, "Forest_Acres", "FID_parcels").unwrap();

        persist(&ws, &summary, "parcels_intersect_summary").unwrap();
        let table = read_table(&ws, "parcels_intersect_summary").unwrap();
        assert_eq!(table.rows.len(), 1);
        assert_eq!(
            table.row_value(&table.rows[0], "SUM_Forest_Acres").as_f64(),
            Some(2.0)
        );

        // Re-persisting replaces, never duplicates
        persist(&ws, &summary, "parcels_intersect_summary").unwrap();
        assert_eq!(ws.list().unwrap().len(), 1);
    }
}

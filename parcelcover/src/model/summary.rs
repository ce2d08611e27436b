//! Summary tables: the result of group-by aggregation.

use super::dataset::Table;
use super::feature::Row;
use super::field::{Field, FieldType, Schema};
use super::value::Value;

/// One aggregated group: a distinct observed key and its summed measurement.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub key: Value,
    pub total: f64,
}

/// An immutable ordered sequence of `(group key, aggregate)` rows.
///
/// Keys are unique by construction and appear in first-seen order. The
/// summary is a pure value; persisting it to a workspace is a separate,
/// explicit step ([`crate::aggregate::persist`]).
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryTable {
    /// Name of the field the rows were grouped by.
    pub group_field: String,
    /// Name of the measurement field that was summed.
    pub measure_field: String,
    rows: Vec<SummaryRow>,
}

impl SummaryTable {
    /// Builds a summary from pre-aggregated rows.
    ///
    /// Callers guarantee key uniqueness; [`crate::aggregate::summarize`] is
    /// the normal constructor.
    pub fn new(
        group_field: impl Into<String>,
        measure_field: impl Into<String>,
        rows: Vec<SummaryRow>,
    ) -> Self {
        Self {
            group_field: group_field.into(),
            measure_field: measure_field.into(),
            rows,
        }
    }

    pub fn rows(&self) -> &[SummaryRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of rows whose key equals `key` (0 or 1 by construction, but
    /// the join enforces rather than assumes this).
    pub fn matches(&self, key: &Value) -> usize {
        self.rows.iter().filter(|r| &r.key == key).count()
    }

    /// The aggregate for `key`, if exactly one row carries it.
    pub fn get(&self, key: &Value) -> Option<f64> {
        let mut hits = self.rows.iter().filter(|r| &r.key == key);
        let first = hits.next()?;
        if hits.next().is_some() {
            return None;
        }
        Some(first.total)
    }

    /// Name of the aggregate column in the persisted table (`SUM_<field>`).
    pub fn sum_field_name(&self) -> String {
        format!("SUM_{}", self.measure_field)
    }

    /// Materializes the summary as a standalone attribute table.
    pub fn to_table(&self, name: &str) -> Table {
        let key_type = self
            .rows
            .iter()
            .find_map(|r| r.key.field_type())
            .unwrap_or(FieldType::Integer);
        let schema = Schema::new(vec![
            Field::new(&self.group_field, key_type),
            Field::double(self.sum_field_name()),
        ]);

        let mut table = Table::new(name, schema);
        for (i, row) in self.rows.iter().enumerate() {
            table.rows.push(Row::new(
                (i + 1) as u64,
                vec![row.key.clone(), Value::Double(row.total)],
            ));
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SummaryTable {
        SummaryTable::new(
            "FID_Parcels_Test_privateforest",
            "Forest_Acres",
            vec![
                SummaryRow {
                    key: Value::Integer(1),
                    total: 2.0,
                },
                SummaryRow {
                    key: Value::Integer(2),
                    total: 0.5,
                },
            ],
        )
    }

    #[test]
    fn test_get_unique_key() {
        let summary = sample();
        assert_eq!(summary.get(&Value::Integer(1)), Some(2.0));
        assert_eq!(summary.get(&Value::Integer(9)), None);
    }

    #[test]
    fn test_matches_counts_duplicates() {
        let summary = SummaryTable::new(
            "k",
            "v",
            vec![
                SummaryRow {
                    key: Value::Integer(1),
                    total: 1.0,
                },
                SummaryRow {
                    key: Value::Integer(1),
                    total: 2.0,
                },
            ],
        );
        assert_eq!(summary.matches(&Value::Integer(1)), 2);
        // get() refuses an ambiguous key
        assert_eq!(summary.get(&Value::Integer(1)), None);
    }

    #[test]
    fn test_to_table_schema_and_rows() {
        let table = sample().to_table("Parcels_Test_intersect_summary");

        assert_eq!(table.schema.len(), 2);
        assert_eq!(table.schema.fields()[1].name, "SUM_Forest_Acres");
        assert_eq!(table.rows.len(), 2);
        assert_eq!(
            table.row_value(&table.rows[0], "SUM_Forest_Acres").as_f64(),
            Some(2.0)
        );
    }

    #[test]
    fn test_empty_summary_to_table() {
        let summary = SummaryTable::new("k", "Forest_Acres", vec![]);
        let table = summary.to_table("empty_summary");
        assert!(table.rows.is_empty());
        assert_eq!(table.schema.len(), 2);
    }
}

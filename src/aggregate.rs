//! Grouping and mean aggregation over result rows.
//!
//! Buckets are identified by a composite key: the row's values for each
//! group-by field joined with [`KEY_SEPARATOR`]. Field values may contain
//! `-` or `,`, so neither is safe as a separator.

use std::collections::HashMap;

use crate::data::Row;
use crate::error::{Result, ShapeError};

/// ASCII unit separator.
pub const KEY_SEPARATOR: char = '\u{1f}';

/// Join already-extracted key parts into a composite key.
pub fn join_key<S: AsRef<str>>(parts: &[S]) -> String {
    let mut key = String::new();
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            key.push(KEY_SEPARATOR);
        }
        key.push_str(part.as_ref());
    }
    key
}

/// Composite key of `row` for the given group-by fields.
pub fn composite_key(row: &Row, group_by: &[&str]) -> Result<String> {
    let mut parts = Vec::with_capacity(group_by.len());
    for field in group_by {
        let cell = row
            .get(*field)
            .ok_or_else(|| ShapeError::malformed(format!("row is missing field '{field}'")))?;
        parts.push(cell.value.as_key());
    }
    Ok(join_key(&parts))
}

#[derive(Debug, Clone, Copy, Default)]
struct Bucket {
    sum: f64,
    count: usize,
}

/// Mean per composite key, remembering first-seen key order.
#[derive(Debug, Clone, Default)]
pub struct Aggregates {
    order: Vec<String>,
    buckets: HashMap<String, Bucket>,
}

impl Aggregates {
    /// Mean for `key`, or `None` when no row contributed a value.
    pub fn get(&self, key: &str) -> Option<f64> {
        self.buckets
            .get(key)
            .filter(|b| b.count > 0)
            .map(|b| b.sum / b.count as f64)
    }

    /// Mean for `key` zero-filled, with a flag telling whether it was present.
    pub fn value_or_zero(&self, key: &str) -> (f64, bool) {
        match self.get(key) {
            Some(v) => (v, true),
            None => (0.0, false),
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// `(key, mean)` pairs in first-seen order. Keys whose rows had no numeric
    /// measure value are skipped.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.order
            .iter()
            .filter_map(move |k| self.get(k).map(|v| (k.as_str(), v)))
    }
}

/// Group `rows` by `group_by` and average `measure` within each group.
///
/// Rows are visited once in input order, so float accumulation order is
/// fixed for a given input. Null or non-numeric measure cells do not count
/// towards the mean.
pub fn aggregate(rows: &[Row], group_by: &[&str], measure: &str) -> Result<Aggregates> {
    let mut aggregates = Aggregates::default();

    for row in rows {
        let key = composite_key(row, group_by)?;
        let cell = row
            .get(measure)
            .ok_or_else(|| ShapeError::malformed(format!("row is missing measure '{measure}'")))?;

        if !aggregates.buckets.contains_key(&key) {
            aggregates.order.push(key.clone());
        }
        let bucket = aggregates.buckets.entry(key).or_default();

        if let Some(v) = cell.value.as_number() {
            bucket.sum += v;
            bucket.count += 1;
        }
    }

    tracing::debug!(
        groups = aggregates.len(),
        rows = rows.len(),
        measure,
        "aggregated rows"
    );
    Ok(aggregates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Cell, CellValue};

    fn row(pairs: &[(&str, Cell)]) -> Row {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn test_mean_of_duplicates() {
        let rows = vec![
            row(&[("region", "east".into()), ("sales", 10.0.into())]),
            row(&[("region", "east".into()), ("sales", 20.0.into())]),
            row(&[("region", "west".into()), ("sales", 7.0.into())]),
        ];
        let agg = aggregate(&rows, &["region"], "sales").unwrap();
        assert_eq!(agg.get("east"), Some(15.0));
        assert_eq!(agg.get("west"), Some(7.0));
        let order: Vec<&str> = agg.iter().map(|(k, _)| k).collect();
        assert_eq!(order, vec!["east", "west"]);
    }

    #[test]
    fn test_unique_key_returns_row_value() {
        let rows = vec![
            row(&[("region", "east".into()), ("sales", 12.25.into())]),
            row(&[("region", "north".into()), ("sales", (-3.0).into())]),
        ];
        let agg = aggregate(&rows, &["region"], "sales").unwrap();
        assert_eq!(agg.get("east"), Some(12.25));
        assert_eq!(agg.get("north"), Some(-3.0));
    }

    #[test]
    fn test_separator_does_not_collide_on_dashes() {
        // With a "-" join both rows would share the key "a-b-c".
        let rows = vec![
            row(&[("x", "a-b".into()), ("y", "c".into()), ("m", 1.0.into())]),
            row(&[("x", "a".into()), ("y", "b-c".into()), ("m", 3.0.into())]),
        ];
        let agg = aggregate(&rows, &["x", "y"], "m").unwrap();
        assert_eq!(agg.len(), 2);
        assert_eq!(agg.get(&join_key(&["a-b", "c"])), Some(1.0));
        assert_eq!(agg.get(&join_key(&["a", "b-c"])), Some(3.0));
    }

    #[test]
    fn test_null_measure_is_not_counted() {
        let rows = vec![
            row(&[("region", "east".into()), ("sales", 10.0.into())]),
            row(&[("region", "east".into()), ("sales", Cell::new(CellValue::Null))]),
            row(&[("region", "west".into()), ("sales", Cell::new(CellValue::Null))]),
        ];
        let agg = aggregate(&rows, &["region"], "sales").unwrap();
        assert_eq!(agg.get("east"), Some(10.0));
        assert_eq!(agg.get("west"), None);
        assert_eq!(agg.value_or_zero("west"), (0.0, false));
    }

    #[test]
    fn test_missing_field_is_malformed() {
        let rows = vec![row(&[("sales", 1.0.into())])];
        assert!(matches!(
            aggregate(&rows, &["region"], "sales"),
            Err(ShapeError::MalformedResult(_))
        ));
    }

    #[test]
    fn test_repeated_calls_are_identical() {
        let rows: Vec<Row> = (0..50)
            .map(|i| {
                row(&[
                    ("k", (if i % 3 == 0 { "a" } else { "b" }).into()),
                    ("m", (0.1 * i as f64).into()),
                ])
            })
            .collect();
        let first = aggregate(&rows, &["k"], "m").unwrap();
        let second = aggregate(&rows, &["k"], "m").unwrap();
        assert_eq!(first.get("a").map(f64::to_bits), second.get("a").map(f64::to_bits));
        assert_eq!(first.get("b").map(f64::to_bits), second.get("b").map(f64::to_bits));
    }
}

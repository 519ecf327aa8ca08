use std::collections::HashSet;

use crate::aggregate::{aggregate, composite_key, join_key, Aggregates};
use crate::data::{FieldDescriptor, Row};
use crate::error::Result;
use crate::ir::{ChartData, Series};

/// Main entry point: turn rows into chart labels and series.
///
/// Labels are the distinct primary-dimension values in first-seen order.
/// Without a pivot there is one series per measure; with a pivot there is
/// one series per measure and pivot value, pivot values sorted ascending.
/// Every series of measure `m` is drawn against axis `y{m}`.
pub fn expand(
    rows: &[Row],
    primary: &str,
    pivot: Option<&str>,
    measures: &[FieldDescriptor],
) -> Result<ChartData> {
    let labels = distinct_values(rows, primary)?;

    let series = match pivot {
        None => expand_flat(rows, primary, measures, &labels)?,
        Some(pivot) => {
            let mut pivot_values = distinct_values(rows, pivot)?;
            pivot_values.sort();
            expand_pivoted(rows, primary, pivot, &pivot_values, measures, &labels)?
        }
    };

    tracing::debug!(
        labels = labels.len(),
        series = series.len(),
        pivot = pivot.unwrap_or("-"),
        "expanded chart series"
    );

    Ok(ChartData { labels, series })
}

/// Distinct values of `field` in first-seen order
pub fn distinct_values(rows: &[Row], field: &str) -> Result<Vec<String>> {
    let mut seen = HashSet::new();
    let mut values = Vec::new();
    for row in rows {
        let value = composite_key(row, &[field])?;
        if seen.insert(value.clone()) {
            values.push(value);
        }
    }
    Ok(values)
}

fn axis_id(measure_index: usize) -> String {
    format!("y{measure_index}")
}

fn expand_flat(
    rows: &[Row],
    primary: &str,
    measures: &[FieldDescriptor],
    labels: &[String],
) -> Result<Vec<Series>> {
    let mut series = Vec::with_capacity(measures.len());
    for (m, measure) in measures.iter().enumerate() {
        let agg = aggregate(rows, &[primary], &measure.name)?;
        series.push(build_series(
            measure.display_label().to_string(),
            axis_id(m),
            labels.iter().map(|l| agg.value_or_zero(l)),
        ));
    }
    Ok(series)
}

fn expand_pivoted(
    rows: &[Row],
    primary: &str,
    pivot: &str,
    pivot_values: &[String],
    measures: &[FieldDescriptor],
    labels: &[String],
) -> Result<Vec<Series>> {
    let mut series = Vec::with_capacity(measures.len() * pivot_values.len());
    for (m, measure) in measures.iter().enumerate() {
        let agg: Aggregates = aggregate(rows, &[primary, pivot], &measure.name)?;
        for pivot_value in pivot_values {
            series.push(build_series(
                format!("{} - {}", measure.display_label(), pivot_value),
                axis_id(m),
                labels
                    .iter()
                    .map(|l| agg.value_or_zero(&join_key(&[l.as_str(), pivot_value.as_str()]))),
            ));
        }
    }
    Ok(series)
}

fn build_series(key: String, axis_id: String, cells: impl Iterator<Item = (f64, bool)>) -> Series {
    let (values, present) = cells.unzip();
    Series {
        key,
        values,
        axis_id,
        present,
    }
}

//! Table presentation: flat tables, pivot tables with heat-map intensity,
//! number formatting and plain-text rendering.

use serde::{Deserialize, Serialize};

use crate::aggregate::{aggregate, join_key};
use crate::data::{CellValue, FieldDescriptor, Row};
use crate::error::Result;
use crate::ir::{HeatCell, PivotColumn, PivotRow, PivotTable, ShapedResult, TableView};
use crate::transform::distinct_values;

/// Separators used when displaying numbers. Defaults to en-US.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberFormat {
    #[serde(default = "default_grouping")]
    pub grouping: char,
    #[serde(default = "default_decimal")]
    pub decimal: char,
}

fn default_grouping() -> char { ',' }
fn default_decimal() -> char { '.' }

impl Default for NumberFormat {
    fn default() -> Self {
        Self {
            grouping: default_grouping(),
            decimal: default_decimal(),
        }
    }
}

impl NumberFormat {
    /// Group thousands and keep at most three fraction digits, trailing
    /// zeros trimmed. Display only; never feeds back into computation.
    pub fn format(&self, n: f64) -> String {
        if !n.is_finite() {
            return n.to_string();
        }

        let fixed = format!("{:.3}", n.abs());
        let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
        let frac = frac_part.trim_end_matches('0');

        let mut out = String::with_capacity(fixed.len() + int_part.len() / 3 + 1);
        if n < 0.0 && (int_part != "0" || !frac.is_empty()) {
            out.push('-');
        }
        let digits = int_part.len();
        for (i, ch) in int_part.chars().enumerate() {
            if i > 0 && (digits - i) % 3 == 0 {
                out.push(self.grouping);
            }
            out.push(ch);
        }
        if !frac.is_empty() {
            out.push(self.decimal);
            out.push_str(frac);
        }
        out
    }

    pub fn format_cell(&self, value: &CellValue) -> String {
        match value {
            CellValue::Number(n) => self.format(*n),
            other => other.as_key(),
        }
    }
}

/// Raw rows under dimension columns, then measure columns. No aggregation.
pub fn table_view(rows: &[Row], dimensions: &[FieldDescriptor], measures: &[FieldDescriptor]) -> TableView {
    TableView {
        columns: dimensions.iter().chain(measures).cloned().collect(),
        dimension_count: dimensions.len(),
        rows: rows.to_vec(),
    }
}

impl TableView {
    pub fn headers(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.display_label().to_string()).collect()
    }

    /// Display strings per row and column. Measure numbers get thousands
    /// separators; dimension values print as-is.
    pub fn display_rows(&self, format: &NumberFormat) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .enumerate()
                    .map(|(i, col)| match row.get(&col.name) {
                        Some(cell) if i >= self.dimension_count => format.format_cell(&cell.value),
                        Some(cell) => cell.value.as_key(),
                        None => String::new(),
                    })
                    .collect()
            })
            .collect()
    }
}

/// `(value - min) / (max - min)`, or 0 when the range is empty.
pub fn heat_intensity(value: f64, min: f64, max: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    let range = max - min;
    if range == 0.0 || !range.is_finite() {
        return 0.0;
    }
    ((value - min) / range).clamp(0.0, 1.0)
}

/// 2D grid keyed by (primary value, pivot value) for each measure.
///
/// Primary and pivot values are sorted ascending. Columns run pivot-major,
/// measure-minor. Cells hold the mean of matching rows, or a zero-filled
/// absent cell. Min and max span every displayed cell.
pub fn pivot_table(
    rows: &[Row],
    primary: &FieldDescriptor,
    pivot: &str,
    measures: &[FieldDescriptor],
) -> Result<PivotTable> {
    let mut primary_values = distinct_values(rows, &primary.name)?;
    primary_values.sort();
    let mut pivot_values = distinct_values(rows, pivot)?;
    pivot_values.sort();

    let aggregates = measures
        .iter()
        .map(|m| aggregate(rows, &[primary.name.as_str(), pivot], &m.name))
        .collect::<Result<Vec<_>>>()?;

    let mut columns = Vec::with_capacity(pivot_values.len() * measures.len());
    for pivot_value in &pivot_values {
        for measure in measures {
            columns.push(PivotColumn {
                pivot_value: pivot_value.clone(),
                measure: measure.clone(),
            });
        }
    }

    let grid: Vec<Vec<(f64, bool)>> = primary_values
        .iter()
        .map(|pv| {
            pivot_values
                .iter()
                .flat_map(|col| {
                    let key = join_key(&[pv.as_str(), col.as_str()]);
                    aggregates.iter().map(move |agg| agg.value_or_zero(&key))
                })
                .collect()
        })
        .collect();

    let (min, max) = grid
        .iter()
        .flatten()
        .fold(None, |acc: Option<(f64, f64)>, &(v, _)| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
        .unwrap_or((0.0, 0.0));

    let rows = primary_values
        .into_iter()
        .zip(grid)
        .map(|(label, cells)| PivotRow {
            label,
            cells: cells
                .into_iter()
                .map(|(value, present)| HeatCell {
                    value,
                    present,
                    intensity: heat_intensity(value, min, max),
                })
                .collect(),
        })
        .collect();

    Ok(PivotTable {
        primary: primary.clone(),
        columns,
        rows,
        min,
        max,
    })
}

/// Render any shaped result as an aligned plain-text table.
pub fn render_text(shaped: &ShapedResult, format: &NumberFormat) -> String {
    match shaped {
        ShapedResult::Summary { text } => text.clone(),
        ShapedResult::Table(table) => layout(&table.headers(), &table.display_rows(format)),
        ShapedResult::PivotTable(pivot) => {
            let mut headers = vec![pivot.primary.display_label().to_string()];
            headers.extend(pivot.columns.iter().map(PivotColumn::header));
            let body: Vec<Vec<String>> = pivot
                .rows
                .iter()
                .map(|r| {
                    std::iter::once(r.label.clone())
                        .chain(r.cells.iter().map(|c| format.format(c.value)))
                        .collect()
                })
                .collect();
            layout(&headers, &body)
        }
        ShapedResult::Chart { data, .. } => {
            let mut headers = vec![String::new()];
            headers.extend(data.series.iter().map(|s| s.key.clone()));
            let body: Vec<Vec<String>> = data
                .labels
                .iter()
                .enumerate()
                .map(|(i, label)| {
                    std::iter::once(label.clone())
                        .chain(data.series.iter().map(|s| format.format(s.values.get(i).copied().unwrap_or(0.0))))
                        .collect()
                })
                .collect();
            layout(&headers, &body)
        }
    }
}

fn layout(headers: &[String], body: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in body {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }

    let line = |cells: &[String]| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(c, &w)| format!("{:<w$}", c, w = w))
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };

    let mut out = String::new();
    out.push_str(&line(headers));
    out.push('\n');
    out.push_str(
        &widths
            .iter()
            .map(|&w| "-".repeat(w))
            .collect::<Vec<_>>()
            .join("-+-"),
    );
    out.push('\n');
    for row in body {
        out.push_str(&line(row));
        out.push('\n');
    }
    out
}

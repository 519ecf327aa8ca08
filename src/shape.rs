//! Entry points combining a query result with a shape request.
//!
//! Everything here is a pure function of its inputs; callers re-run it on
//! every control change instead of caching.

use crate::classify::classify;
use crate::data::{FieldDescriptor, QueryResult};
use crate::error::{Result, ShapeError};
use crate::ir::{FieldMode, ShapeRequest, ShapedResult, ViewType};
use crate::sort::sort_by_total;
use crate::table::{pivot_table, table_view};
use crate::transform::expand;

/// Shape `result` as described by `request`.
///
/// Measures-only results become a summary, dimensions-only results a flat
/// table of the untouched rows. Mixed results become a table, a pivot table
/// or a chart depending on the view type, sorted by label total when the
/// request carries a direction.
pub fn shape(result: &QueryResult, request: &ShapeRequest) -> Result<ShapedResult> {
    let fields = result.fields();
    let mode = classify(fields)?;
    tracing::debug!(?mode, rows = result.rows.len(), view = ?request.view_type, "shaping result");

    match mode {
        FieldMode::MeasuresOnly => {
            let text = serde_json::to_string_pretty(&result.rows)
                .map_err(|e| ShapeError::malformed(format!("rows are not serializable: {e}")))?;
            Ok(ShapedResult::Summary { text })
        }
        FieldMode::DimensionsOnly => Ok(ShapedResult::Table(table_view(
            &result.rows,
            &fields.dimensions,
            &[],
        ))),
        FieldMode::Mixed => shape_mixed(result, request),
    }
}

fn shape_mixed(result: &QueryResult, request: &ShapeRequest) -> Result<ShapedResult> {
    let primary = result
        .dimension(&request.primary_dimension)
        .ok_or_else(|| ShapeError::unknown_field(request.primary_dimension.clone()))?;

    let pivot = match request.pivot_dimension.as_deref() {
        None => None,
        Some(p) if p == primary.name => {
            return Err(ShapeError::invalid_request(format!(
                "pivot dimension '{p}' is also the primary dimension"
            )))
        }
        Some(p) => Some(
            result
                .dimension(p)
                .ok_or_else(|| ShapeError::unknown_field(p))?
                .name
                .as_str(),
        ),
    };

    let measures = resolve_measures(result, &request.measures)?;

    match (request.view_type, pivot) {
        (ViewType::Table, None) => Ok(ShapedResult::Table(table_view(
            &result.rows,
            &result.fields().dimensions,
            &measures,
        ))),
        (ViewType::Table, Some(pivot)) => Ok(ShapedResult::PivotTable(pivot_table(
            &result.rows,
            primary,
            pivot,
            &measures,
        )?)),
        (view, pivot) => {
            let data = expand(&result.rows, &primary.name, pivot, &measures)?;
            let chart = ShapedResult::Chart { view, data };
            Ok(match request.sort_direction {
                Some(direction) => sort_by_total(&chart, direction),
                None => chart,
            })
        }
    }
}

fn resolve_measures(result: &QueryResult, requested: &[FieldDescriptor]) -> Result<Vec<FieldDescriptor>> {
    if requested.is_empty() {
        return Ok(result.fields().measures.clone());
    }
    requested
        .iter()
        .map(|m| {
            result
                .measure(&m.name)
                .cloned()
                .ok_or_else(|| ShapeError::unknown_field(m.name.clone()))
        })
        .collect()
}

/// Re-shape with a different pivot dimension, keeping every other choice
/// of `request` (including its sort direction).
pub fn resort_with_new_pivot(
    result: &QueryResult,
    request: &ShapeRequest,
    pivot: Option<&str>,
) -> Result<ShapedResult> {
    let mut next = request.clone();
    next.pivot_dimension = pivot.map(str::to_string);
    shape(result, &next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Cell, Fields, Row};
    use crate::ir::SortDirection;
    use pretty_assertions::assert_eq;

    fn field(name: &str) -> FieldDescriptor {
        FieldDescriptor::new(name, name)
    }

    fn row(pairs: &[(&str, Cell)]) -> Row {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    fn sales_result() -> QueryResult {
        QueryResult::new(
            Fields {
                dimensions: vec![field("region"), field("quarter")],
                measures: vec![field("sales")],
            },
            vec![
                row(&[("region", "east".into()), ("quarter", "Q1".into()), ("sales", 100.0.into())]),
                row(&[("region", "east".into()), ("quarter", "Q2".into()), ("sales", 200.0.into())]),
                row(&[("region", "west".into()), ("quarter", "Q1".into()), ("sales", 50.0.into())]),
            ],
        )
    }

    #[test]
    fn test_pivoted_chart() {
        let request = ShapeRequest::new("region").with_pivot("quarter");
        let shaped = shape(&sales_result(), &request).unwrap();
        let chart = shaped.as_chart().unwrap();
        assert_eq!(chart.labels, vec!["east", "west"]);
        assert_eq!(chart.series[0].key, "sales - Q1");
        assert_eq!(chart.series[0].values, vec![100.0, 50.0]);
        assert_eq!(chart.series[1].key, "sales - Q2");
        assert_eq!(chart.series[1].values, vec![200.0, 0.0]);
    }

    #[test]
    fn test_sorted_when_direction_given() {
        let request = ShapeRequest::new("region").with_sort(SortDirection::Asc);
        let shaped = shape(&sales_result(), &request).unwrap();
        assert_eq!(shaped.as_chart().unwrap().labels, vec!["west", "east"]);
    }

    #[test]
    fn test_measures_only_is_summary() {
        let result = QueryResult::new(
            Fields { dimensions: vec![], measures: vec![field("total")] },
            vec![row(&[("total", 42.0.into())])],
        );
        match shape(&result, &ShapeRequest::default_for(&result)).unwrap() {
            ShapedResult::Summary { text } => assert!(text.contains("42")),
            other => panic!("expected summary, got {}", other.kind()),
        }
    }

    #[test]
    fn test_dimensions_only_returns_rows_unchanged() {
        let rows = vec![
            row(&[("name", "b".into())]),
            row(&[("name", "a".into())]),
            row(&[("name", "b".into())]),
        ];
        let result = QueryResult::new(
            Fields { dimensions: vec![field("name")], measures: vec![] },
            rows.clone(),
        );
        // Even a chart request cannot aggregate a result without measures.
        let request = ShapeRequest::new("name").with_sort(SortDirection::Desc);
        match shape(&result, &request).unwrap() {
            ShapedResult::Table(table) => {
                assert_eq!(table.rows, rows);
                assert_eq!(table.columns, vec![field("name")]);
            }
            other => panic!("expected table, got {}", other.kind()),
        }
    }

    #[test]
    fn test_table_view_and_pivot_table() {
        let result = sales_result();
        let table = shape(&result, &ShapeRequest::new("region").with_view(ViewType::Table)).unwrap();
        assert!(matches!(table, ShapedResult::Table(ref t) if t.rows.len() == 3));

        let request = ShapeRequest::new("region")
            .with_pivot("quarter")
            .with_view(ViewType::Table);
        assert!(matches!(shape(&result, &request).unwrap(), ShapedResult::PivotTable(_)));
    }

    #[test]
    fn test_unknown_fields() {
        let result = sales_result();
        assert!(matches!(
            shape(&result, &ShapeRequest::new("city")),
            Err(ShapeError::UnknownField(_))
        ));
        assert!(matches!(
            shape(&result, &ShapeRequest::new("region").with_pivot("sales")),
            Err(ShapeError::UnknownField(_))
        ));
        assert!(matches!(
            shape(&result, &ShapeRequest::new("region").with_measures(vec![field("profit")])),
            Err(ShapeError::UnknownField(_))
        ));
    }

    #[test]
    fn test_pivot_equal_to_primary_is_rejected() {
        let request = ShapeRequest::new("region").with_pivot("region");
        assert!(matches!(
            shape(&sales_result(), &request),
            Err(ShapeError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_empty_fields_is_malformed() {
        let result = QueryResult::new(Fields::default(), vec![]);
        assert!(matches!(
            shape(&result, &ShapeRequest::new("x")),
            Err(ShapeError::MalformedResult(_))
        ));
    }

    #[test]
    fn test_resort_with_new_pivot_keeps_sort() {
        let result = sales_result();
        let request = ShapeRequest::new("region").with_sort(SortDirection::Desc);
        let shaped = resort_with_new_pivot(&result, &request, Some("quarter")).unwrap();
        let chart = shaped.as_chart().unwrap();
        assert_eq!(chart.labels, vec!["east", "west"]);
        assert_eq!(chart.series.len(), 2);

        let unpivoted = resort_with_new_pivot(&result, &request, None).unwrap();
        assert_eq!(unpivoted.as_chart().unwrap().series.len(), 1);
    }
}

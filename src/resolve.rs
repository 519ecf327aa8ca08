use crate::data::QueryResult;
use crate::error::{Result, ShapeError};
use crate::ir::ShapeRequest;
use crate::parser::ast::{Labels, RequestSpec};

/// Resolve a parsed request against a concrete result.
///
/// The primary dimension defaults to the first dimension of the result.
/// Measure names are looked up in the result metadata so the request
/// carries their display labels.
pub fn resolve_request(spec: &RequestSpec, result: &QueryResult) -> Result<ShapeRequest> {
    // Measures (empty = all)
    let measures = spec
        .measures
        .iter()
        .map(|name| {
            result
                .measure(name)
                .cloned()
                .ok_or_else(|| ShapeError::unknown_field(name.clone()))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut request = ShapeRequest::default_for(result)
        .with_measures(measures)
        .with_view(spec.view.kind);
    if let Some(x) = &spec.view.x {
        request.primary_dimension = x.clone();
    }
    request.pivot_dimension = spec.view.pivot.clone();
    request.sort_direction = spec.sort;
    Ok(request)
}

/// Labels for rendering: explicit `labs(...)` values win, otherwise the
/// primary dimension's label on x and the measure label on y when there is
/// exactly one measure.
pub fn resolve_labels(spec: &RequestSpec, request: &ShapeRequest, result: &QueryResult) -> Labels {
    let explicit = spec.labels.clone().unwrap_or_default();

    let x = explicit.x.or_else(|| {
        result
            .dimension(&request.primary_dimension)
            .map(|d| d.display_label().to_string())
    });

    let measures = if request.measures.is_empty() {
        &result.fields().measures
    } else {
        &request.measures
    };
    let y = explicit.y.or_else(|| match measures.as_slice() {
        [only] => Some(only.display_label().to_string()),
        _ => None,
    });

    Labels {
        title: explicit.title,
        x,
        y,
    }
}

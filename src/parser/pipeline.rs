// Pipeline parser for the request DSL

use super::ast::{Labels, RequestSpec, ViewSpec};
use super::lexer::ws;
use super::options::{parse_labs, parse_measures, parse_sort};
use super::view::parse_view;
use crate::ir::SortDirection;
use nom::{
    branch::alt,
    bytes::complete::tag,
    combinator::{eof, map},
    error::{Error, ErrorKind},
    multi::separated_list1,
    IResult,
};

#[derive(Debug)]
enum PipelineComponent {
    View(ViewSpec),
    Measures(Vec<String>),
    Sort(SortDirection),
    Labels(Labels),
}

fn parse_pipeline_component(input: &str) -> IResult<&str, PipelineComponent> {
    alt((
        map(parse_view, PipelineComponent::View),
        map(parse_measures, PipelineComponent::Measures),
        map(parse_sort, PipelineComponent::Sort),
        map(parse_labs, PipelineComponent::Labels),
    ))(input)
}

/// Parse a complete request
/// Format: component | component | ...
pub fn parse_request_spec(input: &str) -> IResult<&str, RequestSpec> {
    let (input, components) = separated_list1(ws(tag("|")), parse_pipeline_component)(input)?;

    // Consume trailing whitespace and ensure end of input
    let (input, _) = ws(eof)(input)?;

    let mut view = None;
    let mut measures = Vec::new();
    let mut sort = None;
    let mut labels = None;

    for comp in components {
        match comp {
            PipelineComponent::View(v) => {
                // Exactly one view per request
                if view.is_some() {
                    return Err(nom::Err::Failure(Error::new(input, ErrorKind::Verify)));
                }
                view = Some(v);
            }
            PipelineComponent::Measures(m) => measures.extend(m),
            PipelineComponent::Sort(s) => sort = Some(s),
            PipelineComponent::Labels(l) => labels = Some(l),
        }
    }

    let Some(view) = view else {
        return Err(nom::Err::Error(Error::new(input, ErrorKind::Verify)));
    };

    Ok((
        input,
        RequestSpec {
            view,
            measures,
            sort,
            labels,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::ViewType;

    #[test]
    fn test_parse_view_only() {
        let result = parse_request_spec("bar()");
        assert!(result.is_ok());
        let (_, spec) = result.unwrap();
        assert_eq!(spec.view.kind, ViewType::Bar);
        assert!(spec.measures.is_empty());
        assert_eq!(spec.sort, None);
    }

    #[test]
    fn test_parse_full_pipeline() {
        let result = parse_request_spec(
            r#"bar(x: orders.region, pivot: orders.quarter) | measures(orders.sales) | sort(desc) | labs(title: "Sales")"#,
        );
        assert!(result.is_ok());
        let (rest, spec) = result.unwrap();
        assert_eq!(rest, "");
        assert_eq!(spec.view.pivot, Some("orders.quarter".to_string()));
        assert_eq!(spec.measures, vec!["orders.sales"]);
        assert_eq!(spec.sort, Some(SortDirection::Desc));
        assert_eq!(spec.labels.unwrap().title, Some("Sales".to_string()));
    }

    #[test]
    fn test_modifiers_before_view() {
        let (_, spec) = parse_request_spec("sort(asc) | line(x: day)").unwrap();
        assert_eq!(spec.view.kind, ViewType::Line);
        assert_eq!(spec.sort, Some(SortDirection::Asc));
    }

    #[test]
    fn test_measures_accumulate() {
        let (_, spec) = parse_request_spec("table() | measures(a) | measures(b, c)").unwrap();
        assert_eq!(spec.measures, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_missing_view_fails() {
        assert!(parse_request_spec("measures(a) | sort(asc)").is_err());
    }

    #[test]
    fn test_two_views_fail() {
        assert!(parse_request_spec("bar() | line()").is_err());
    }

    #[test]
    fn test_trailing_garbage_fails() {
        assert!(parse_request_spec("bar() extra").is_err());
    }
}

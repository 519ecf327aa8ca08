// Request modifiers: measures(...), sort(...) and labs(...)

use super::ast::Labels;
use super::lexer::{field_name, string_literal, ws};
use crate::ir::SortDirection;
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::char,
    combinator::{map, value},
    multi::{separated_list0, separated_list1},
    sequence::preceded,
    IResult,
};

#[derive(Debug)]
enum LabelArg {
    Title(String),
    X(String),
    Y(String),
}

/// Parse a measure selection
/// Format: measures(orders.sales, orders.margin)
pub fn parse_measures(input: &str) -> IResult<&str, Vec<String>> {
    let (input, _) = ws(tag("measures"))(input)?;
    let (input, _) = ws(char('('))(input)?;
    let (input, names) = separated_list1(ws(char(',')), ws(field_name))(input)?;
    let (input, _) = ws(char(')'))(input)?;
    Ok((input, names))
}

/// Parse sort-by-total
/// Format: sort(asc) or sort(desc)
pub fn parse_sort(input: &str) -> IResult<&str, SortDirection> {
    let (input, _) = ws(tag("sort"))(input)?;
    let (input, _) = ws(char('('))(input)?;
    let (input, direction) = ws(alt((
        value(SortDirection::Asc, tag("asc")),
        value(SortDirection::Desc, tag("desc")),
    )))(input)?;
    let (input, _) = ws(char(')'))(input)?;
    Ok((input, direction))
}

/// Parse chart labels; a repeated key keeps its last value
/// Format: labs(title: "Sales", x: "Region", y: "Revenue")
pub fn parse_labs(input: &str) -> IResult<&str, Labels> {
    let (input, _) = ws(tag("labs"))(input)?;
    let (input, _) = ws(char('('))(input)?;
    let (input, args) = separated_list0(
        ws(char(',')),
        alt((
            map(preceded(ws(tag("title:")), ws(string_literal)), LabelArg::Title),
            map(preceded(ws(tag("x:")), ws(string_literal)), LabelArg::X),
            map(preceded(ws(tag("y:")), ws(string_literal)), LabelArg::Y),
        )),
    )(input)?;
    let (input, _) = ws(char(')'))(input)?;

    let labels = args.into_iter().fold(Labels::default(), |mut labels, arg| {
        match arg {
            LabelArg::Title(v) => labels.title = Some(v),
            LabelArg::X(v) => labels.x = Some(v),
            LabelArg::Y(v) => labels.y = Some(v),
        }
        labels
    });
    Ok((input, labels))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_measures() {
        let (_, names) = parse_measures("measures(orders.sales, orders.margin)").unwrap();
        assert_eq!(names, vec!["orders.sales", "orders.margin"]);
    }

    #[test]
    fn test_parse_measures_empty_fails() {
        assert!(parse_measures("measures()").is_err());
    }

    #[test]
    fn test_parse_sort() {
        assert_eq!(parse_sort("sort(desc)").unwrap().1, SortDirection::Desc);
        assert_eq!(parse_sort("sort( asc )").unwrap().1, SortDirection::Asc);
        assert!(parse_sort("sort(up)").is_err());
    }

    #[test]
    fn test_parse_labs() {
        let (_, labels) = parse_labs(r#"labs(title: "My Chart", x: "X Axis")"#).unwrap();
        assert_eq!(labels.title, Some("My Chart".to_string()));
        assert_eq!(labels.x, Some("X Axis".to_string()));
        assert_eq!(labels.y, None);
    }

    #[test]
    fn test_parse_labs_requires_strings() {
        assert!(parse_labs("labs(title: Sales)").is_err());
    }
}

// View command parser: bar(...), line(...), table(...)

use super::ast::ViewSpec;
use super::lexer::{field_name, ws};
use crate::ir::ViewType;
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::char,
    combinator::map,
    multi::separated_list0,
    sequence::preceded,
    IResult,
};

/// Parse `<name>(x: field, pivot: field)`; both arguments optional, any order
fn parse_view_named<'a>(name: &'static str, kind: ViewType) -> impl FnMut(&'a str) -> IResult<&'a str, ViewSpec> {
    move |input: &'a str| {
        let (input, _) = ws(tag(name))(input)?;
        let (input, _) = ws(char('('))(input)?;

        let (input, args) = separated_list0(
            ws(char(',')),
            alt((
                map(preceded(ws(tag("x:")), ws(field_name)), |v| ("x", v)),
                map(preceded(ws(tag("pivot:")), ws(field_name)), |v| ("pivot", v)),
            )),
        )(input)?;

        let (input, _) = ws(char(')'))(input)?;

        let mut view = ViewSpec { kind, ..ViewSpec::default() };
        for (key, val) in args {
            match key {
                "x" => view.x = Some(val),
                "pivot" => view.pivot = Some(val),
                _ => {}
            }
        }

        Ok((input, view))
    }
}

/// Parse a bar chart view
/// Format: bar() or bar(x: orders.region, pivot: orders.quarter)
pub fn parse_bar(input: &str) -> IResult<&str, ViewSpec> {
    parse_view_named("bar", ViewType::Bar)(input)
}

/// Parse a line chart view
pub fn parse_line(input: &str) -> IResult<&str, ViewSpec> {
    parse_view_named("line", ViewType::Line)(input)
}

/// Parse a table view; with a pivot it becomes a pivot table
pub fn parse_table(input: &str) -> IResult<&str, ViewSpec> {
    parse_view_named("table", ViewType::Table)(input)
}

/// Parse any view command
pub fn parse_view(input: &str) -> IResult<&str, ViewSpec> {
    alt((parse_bar, parse_line, parse_table))(input)
}

// Shared token parsers for the request DSL

use nom::{
    branch::alt,
    bytes::complete::{tag, take_till},
    character::complete::{alpha1, alphanumeric1, char, multispace0},
    combinator::{map, recognize},
    error::ParseError,
    multi::many0,
    sequence::{delimited, pair},
    IResult, Parser,
};

/// Wrap a parser so it skips surrounding whitespace
pub fn ws<'a, F, O, E>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O, E>
where
    F: Parser<&'a str, O, E>,
    E: ParseError<&'a str>,
{
    delimited(multispace0, inner, multispace0)
}

/// Field name: letters, digits, `_` and `.` (as in `orders.region`),
/// not starting with a digit or `.`
pub fn identifier(input: &str) -> IResult<&str, String> {
    map(
        recognize(pair(
            alt((alpha1, tag("_"))),
            many0(alt((alphanumeric1, tag("_"), tag(".")))),
        )),
        |s: &str| s.to_string(),
    )(input)
}

/// Double-quoted string, no escapes
pub fn string_literal(input: &str) -> IResult<&str, String> {
    map(
        delimited(char('"'), take_till(|c| c == '"'), char('"')),
        |s: &str| s.to_string(),
    )(input)
}

/// A field reference: bare identifier or quoted name
pub fn field_name(input: &str) -> IResult<&str, String> {
    alt((string_literal, identifier))(input)
}

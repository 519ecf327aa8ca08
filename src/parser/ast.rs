// Abstract Syntax Tree for the request DSL

use crate::ir::{SortDirection, ViewType};

/// Complete request: one view plus optional modifiers
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSpec {
    pub view: ViewSpec,
    /// Measure names; empty means every measure of the result
    pub measures: Vec<String>,
    pub sort: Option<SortDirection>,
    pub labels: Option<Labels>,
}

/// The view command: `bar(...)`, `line(...)` or `table(...)`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ViewSpec {
    pub kind: ViewType,
    /// Primary dimension (None = first dimension of the result)
    pub x: Option<String>,
    pub pivot: Option<String>,
}

/// Chart labels (title, axes)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Labels {
    pub title: Option<String>,
    pub x: Option<String>,
    pub y: Option<String>,
}

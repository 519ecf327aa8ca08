// Library exports for resultshaper

pub mod data;
pub mod error;
pub mod graph;
pub mod parser;

// Shaping pipeline
pub mod ir;
pub mod classify;
pub mod aggregate;
pub mod transform;
pub mod sort;
pub mod table;
pub mod shape;
pub mod resolve;
pub mod scale;

// Upstream query flow
pub mod query;
pub mod prompt;
pub mod chat;
pub mod mock;

pub mod config;
pub mod logging;

pub use config::{OutputFormat, RenderOptions, ShaperConfig};
pub use data::QueryResult;
pub use error::{Result, ShapeError};
pub use ir::{ShapeRequest, ShapedResult, SortDirection, ViewType};
pub use shape::{resort_with_new_pivot, shape};
pub use sort::sort_by_total;

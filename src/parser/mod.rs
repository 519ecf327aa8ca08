// Request DSL Parser Module

pub mod ast;
pub mod lexer;
pub mod options;
pub mod pipeline;
pub mod view;

// Public API re-exports
pub use ast::{Labels, RequestSpec, ViewSpec};
pub use pipeline::parse_request_spec;

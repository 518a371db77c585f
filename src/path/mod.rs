//! Record Sub-Paths
//!
//! A small relative path language in the ElementTree style, evaluated against
//! a single record:
//! - `.` the record root
//! - `A/B` child steps, `.//A` descendant steps, `*` any element
//! - `[@attr]` and `[@attr='value']` attribute predicates

pub mod cache;
pub mod eval;
pub mod lexer;
pub mod parser;

pub use cache::compile_cached;
pub use eval::select;
pub use parser::{parse, PathExpr};

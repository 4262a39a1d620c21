//! Syntax tree model.

pub mod types;
pub mod visitor;

pub use types::*;
pub use visitor::{node_at, walk_command, walk_expr, walk_script, walk_word, NodeRef, Visitor};

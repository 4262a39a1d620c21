//! tclint - static analysis for Tcl-family dialects
//!
//! This library provides the core analysis engine behind the `tclint` and
//! `tclfmt` tools: a context-sensitive Tcl parser, a command registry with
//! dialect tables and static plugins, a rule engine, and a formatter.

pub mod ast;
pub mod commands;
pub mod config;
pub mod driver;
pub mod format;
pub mod lint;
pub mod parser;

pub use ast::types::{Pos, Script, Span, Word};
pub use commands::{CommandRegistry, Dialect, Plugin};
pub use config::{Config, RunConfig, Style};
pub use driver::{format_source, lint, symbols};
pub use lint::{Rule, Violation};
pub use parser::{Parser, TclSyntaxError};

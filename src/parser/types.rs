//! Parser error types.

use thiserror::Error;

use crate::ast::types::Pos;

/// Unrecoverable syntax error: unterminated brace, bracket, or quote, or a
/// token that cannot start a command. The position anchors the diagnostic
/// at the opening delimiter.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct TclSyntaxError {
    pub message: String,
    pub pos: Pos,
}

impl TclSyntaxError {
    pub fn new(message: impl Into<String>, pos: Pos) -> Self {
        Self { message: message.into(), pos }
    }
}

/// Raised by command validators and handlers when a command's arguments are
/// invalid. Becomes a `command-args` violation anchored at the command.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct CommandArgError(pub String);

impl CommandArgError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

//! Rule identifiers and violation reporting.

use std::fmt;

use crate::ast::types::Span;

/// Whether a rule checks functional correctness or style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Func,
    Style,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Func => write!(f, "func"),
            Category::Style => write!(f, "style"),
        }
    }
}

/// Lint rules. The enum serves a few purposes: it defines symbols for rule
/// IDs used in code, maps them to the names shown in the UI, and provides
/// validation for user-supplied IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Rule {
    SyntaxError,
    CommandArgs,
    RedefinedBuiltin,
    UnbracedExpr,
    RedundantExpr,
    LineLength,
    TrailingWhitespace,
    BlankLines,
    Indent,
    Spacing,
    BackslashSpacing,
    ExprFormat,
    SpacesInBraces,
}

impl Rule {
    pub const ALL: [Rule; 13] = [
        Rule::SyntaxError,
        Rule::CommandArgs,
        Rule::RedefinedBuiltin,
        Rule::UnbracedExpr,
        Rule::RedundantExpr,
        Rule::LineLength,
        Rule::TrailingWhitespace,
        Rule::BlankLines,
        Rule::Indent,
        Rule::Spacing,
        Rule::BackslashSpacing,
        Rule::ExprFormat,
        Rule::SpacesInBraces,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Rule::SyntaxError => "syntax-error",
            Rule::CommandArgs => "command-args",
            Rule::RedefinedBuiltin => "redefined-builtin",
            Rule::UnbracedExpr => "unbraced-expr",
            Rule::RedundantExpr => "redundant-expr",
            Rule::LineLength => "line-length",
            Rule::TrailingWhitespace => "trailing-whitespace",
            Rule::BlankLines => "blank-lines",
            Rule::Indent => "indent",
            Rule::Spacing => "spacing",
            Rule::BackslashSpacing => "backslash-spacing",
            Rule::ExprFormat => "expr-format",
            Rule::SpacesInBraces => "spaces-in-braces",
        }
    }

    pub fn category(&self) -> Category {
        match self {
            Rule::SyntaxError
            | Rule::CommandArgs
            | Rule::RedefinedBuiltin
            | Rule::UnbracedExpr
            | Rule::RedundantExpr => Category::Func,
            _ => Category::Style,
        }
    }

    pub fn from_id(id: &str) -> Option<Rule> {
        Rule::ALL.iter().copied().find(|rule| rule.id() == id)
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// A single diagnostic: rule, message, and the source span it covers.
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    pub rule: Rule,
    pub message: String,
    pub span: Span,
}

impl Violation {
    pub fn new(rule: Rule, message: impl Into<String>, span: Span) -> Self {
        Self { rule, message: message.into(), span }
    }

    /// Sort key: start position, then rule id.
    pub fn sort_key(&self) -> (usize, usize, &'static str) {
        (self.span.start.line, self.span.start.col, self.rule.id())
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: {} [{}]",
            self.span.start.line,
            self.span.start.col,
            self.message,
            self.rule.id()
        )
    }
}

//! Syntax Tree Types for Tcl
//!
//! This module defines the syntax tree produced by the parser. The tree is a
//! concrete one: every node carries the span it was parsed from, and word
//! nodes retain enough of the original text for the formatter to re-emit
//! source without losing information.

use std::fmt;

// =============================================================================
// POSITIONS
// =============================================================================

/// A 1-based (line, column) position in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Pos {
    pub line: usize,
    pub col: usize,
}

impl Pos {
    pub fn new(line: usize, col: usize) -> Self {
        Self { line, col }
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

/// Span of a parsed region. `end` is the position of the first character
/// after the region (exclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: Pos,
    pub end: Pos,
}

impl Span {
    pub fn new(start: Pos, end: Pos) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, pos: Pos) -> bool {
        self.start <= pos && pos < self.end
    }
}

// =============================================================================
// SCRIPTS & COMMANDS
// =============================================================================

/// A sequence of commands and comments. Appears at top level, inside `[...]`
/// command substitutions, and as the re-parsed contents of script arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct Script {
    pub items: Vec<ScriptItem>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScriptItem {
    Command(Command),
    Comment(Comment),
}

impl ScriptItem {
    pub fn span(&self) -> Span {
        match self {
            ScriptItem::Command(c) => c.span,
            ScriptItem::Comment(c) => c.span,
        }
    }
}

/// A single command: the name word followed by argument words.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub words: Vec<Word>,
    pub span: Span,
    /// Set when the command is followed on the same line by a comment.
    pub trailing_comment: bool,
}

impl Command {
    /// Literal text of the command name, when statically known.
    pub fn routine(&self) -> Option<String> {
        self.words.first().and_then(|w| w.contents())
    }

    pub fn args(&self) -> &[Word] {
        if self.words.len() < 2 {
            &[]
        } else {
            &self.words[1..]
        }
    }
}

/// A comment. `text` holds everything after the `#`, including any
/// backslash-newline continuations.
#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub text: String,
    pub span: Span,
}

// =============================================================================
// WORDS
// =============================================================================

/// The delimiter a re-parsed argument word was written with. The formatter
/// uses this to re-emit the word in its original quoting style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordDelim {
    Braces,
    Quotes,
    Bare,
}

/// A single command argument (or command name).
#[derive(Debug, Clone, PartialEq)]
pub enum Word {
    Bare(BareWord),
    Quoted(QuotedWord),
    Braced(BracedWord),
    Compound(CompoundWord),
    VarSub(VarSub),
    CmdSub(CmdSub),
    ArgExpansion(ArgExpansion),
    BackslashSub(BackslashSub),
    /// Structured braced list, produced by command-specific re-parsing.
    List(ListWord),
    /// Script argument, produced by command-specific re-parsing.
    Script(ScriptArg),
    /// Expression argument, produced by command-specific re-parsing.
    Expr(ExprArg),
}

/// An unquoted literal run of characters.
#[derive(Debug, Clone, PartialEq)]
pub struct BareWord {
    pub text: String,
    pub span: Span,
}

/// A double-quoted word. Parts are `Bare`, `VarSub`, `CmdSub`, or
/// `BackslashSub` nodes; plain text between substitutions is kept verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct QuotedWord {
    pub parts: Vec<Word>,
    pub span: Span,
}

/// A brace-quoted word. The contents are literal bytes; no substitution
/// happens inside braces.
#[derive(Debug, Clone, PartialEq)]
pub struct BracedWord {
    pub text: String,
    pub span: Span,
}

/// Concatenation of sub-words with no intervening whitespace, e.g.
/// `prefix-$suffix`.
#[derive(Debug, Clone, PartialEq)]
pub struct CompoundWord {
    pub parts: Vec<Word>,
    pub span: Span,
}

/// `$name`, `$name(index)`, or `${name}`.
#[derive(Debug, Clone, PartialEq)]
pub struct VarSub {
    pub name: String,
    pub braced: bool,
    /// Parts of the array index, empty when there is none.
    pub index: Vec<Word>,
    pub span: Span,
}

/// `[...]` holding a nested script.
#[derive(Debug, Clone, PartialEq)]
pub struct CmdSub {
    pub script: Script,
    pub span: Span,
}

/// `{*}word`.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgExpansion {
    pub word: Box<Word>,
    pub span: Span,
}

/// A backslash escape sequence, e.g. `\n` or `\ `.
#[derive(Debug, Clone, PartialEq)]
pub struct BackslashSub {
    pub text: String,
    pub span: Span,
}

/// A braced word re-parsed as a Tcl list. The original text is retained.
#[derive(Debug, Clone, PartialEq)]
pub struct ListWord {
    pub items: Vec<Word>,
    pub text: String,
    pub span: Span,
}

/// A word re-parsed as a script. The original text and delimiter are
/// retained so the formatter can fall back to them.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptArg {
    pub script: Script,
    pub delim: WordDelim,
    pub text: String,
    pub span: Span,
}

/// A word re-parsed as an expression.
#[derive(Debug, Clone, PartialEq)]
pub struct ExprArg {
    pub expr: Box<Expr>,
    pub delim: WordDelim,
    pub text: String,
    pub span: Span,
}

impl Word {
    pub fn span(&self) -> Span {
        match self {
            Word::Bare(w) => w.span,
            Word::Quoted(w) => w.span,
            Word::Braced(w) => w.span,
            Word::Compound(w) => w.span,
            Word::VarSub(w) => w.span,
            Word::CmdSub(w) => w.span,
            Word::ArgExpansion(w) => w.span,
            Word::BackslashSub(w) => w.span,
            Word::List(w) => w.span,
            Word::Script(w) => w.span,
            Word::Expr(w) => w.span,
        }
    }

    /// The literal text of the word, when it is statically known. Words that
    /// involve variable or command substitution have no static contents.
    pub fn contents(&self) -> Option<String> {
        match self {
            Word::Bare(w) => Some(w.text.clone()),
            Word::Braced(w) => Some(w.text.clone()),
            Word::BackslashSub(w) => Some(w.text.clone()),
            Word::Quoted(w) => {
                let mut out = String::new();
                for part in &w.parts {
                    out.push_str(&part.contents()?);
                }
                Some(out)
            }
            Word::Compound(w) => {
                let mut out = String::new();
                for part in &w.parts {
                    out.push_str(&part.contents()?);
                }
                Some(out)
            }
            Word::ArgExpansion(w) => w.word.contents(),
            Word::VarSub(_) | Word::CmdSub(_) => None,
            Word::List(_) | Word::Script(_) | Word::Expr(_) => None,
        }
    }

    /// Position of the first character of the word's contents. One column
    /// past the start for delimited words.
    pub fn contents_pos(&self) -> Pos {
        let start = self.span().start;
        match self {
            Word::Braced(_) | Word::Quoted(_) => Pos::new(start.line, start.col + 1),
            _ => start,
        }
    }
}

// =============================================================================
// EXPRESSIONS
// =============================================================================

/// An operator token inside an expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Operator {
    pub text: String,
    pub span: Span,
}

/// A node of the `expr` sub-language.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Leaf operand: a number or string literal, variable substitution,
    /// command substitution, or braced/quoted word.
    Word(Word),
    Unary(UnaryOp),
    Binary(BinaryOp),
    Ternary(TernaryOp),
    Function(FunctionCall),
    Paren(ParenExpr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnaryOp {
    pub op: Operator,
    pub operand: Box<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryOp {
    pub op: Operator,
    pub left: Box<Expr>,
    pub right: Box<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TernaryOp {
    pub cond: Box<Expr>,
    pub question: Operator,
    pub then_expr: Box<Expr>,
    pub colon: Operator,
    pub else_expr: Box<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    pub name_span: Span,
    pub lparen: Pos,
    pub args: Vec<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParenExpr {
    pub inner: Box<Expr>,
    pub span: Span,
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Word(w) => w.span(),
            Expr::Unary(e) => e.span,
            Expr::Binary(e) => e.span,
            Expr::Ternary(e) => e.span,
            Expr::Function(e) => e.span,
            Expr::Paren(e) => e.span,
        }
    }
}

// =============================================================================
// DEBUG DUMP
// =============================================================================

impl Script {
    /// Compact structural dump, used by debug output and tests.
    pub fn pretty(&self) -> String {
        let mut out = String::from("Script(");
        push_items(&mut out, &self.items);
        out.push(')');
        out
    }
}

fn push_items(out: &mut String, items: &[ScriptItem]) {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        match item {
            ScriptItem::Command(c) => push_command(out, c),
            ScriptItem::Comment(c) => {
                out.push_str("Comment(");
                push_quoted(out, &c.text);
                out.push(')');
            }
        }
    }
}

fn push_command(out: &mut String, cmd: &Command) {
    out.push_str("Command(");
    for (i, w) in cmd.words.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        push_word(out, w);
    }
    out.push(')');
}

fn push_word(out: &mut String, word: &Word) {
    match word {
        Word::Bare(w) => {
            out.push_str("BareWord(");
            push_quoted(out, &w.text);
            out.push(')');
        }
        Word::Braced(w) => {
            out.push_str("BracedWord(");
            push_quoted(out, &w.text);
            out.push(')');
        }
        Word::BackslashSub(w) => {
            out.push_str("BackslashSub(");
            push_quoted(out, &w.text);
            out.push(')');
        }
        Word::Quoted(w) => {
            out.push_str("QuotedWord(");
            push_word_list(out, &w.parts);
            out.push(')');
        }
        Word::Compound(w) => {
            out.push_str("CompoundWord(");
            push_word_list(out, &w.parts);
            out.push(')');
        }
        Word::VarSub(w) => {
            out.push_str("VarSub(");
            push_quoted(out, &w.name);
            if !w.index.is_empty() {
                out.push_str(", ");
                push_word_list(out, &w.index);
            }
            out.push(')');
        }
        Word::CmdSub(w) => {
            out.push_str("CommandSub(");
            push_items(out, &w.script.items);
            out.push(')');
        }
        Word::ArgExpansion(w) => {
            out.push_str("ArgExpansion(");
            push_word(out, &w.word);
            out.push(')');
        }
        Word::List(w) => {
            out.push_str("List(");
            push_word_list(out, &w.items);
            out.push(')');
        }
        Word::Script(w) => {
            out.push_str("Script(");
            push_items(out, &w.script.items);
            out.push(')');
        }
        Word::Expr(w) => {
            if w.delim == WordDelim::Braces {
                out.push_str("BracedExpression(");
            } else {
                out.push_str("Expression(");
            }
            push_expr(out, &w.expr);
            out.push(')');
        }
    }
}

fn push_word_list(out: &mut String, words: &[Word]) {
    for (i, w) in words.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        push_word(out, w);
    }
}

fn push_expr(out: &mut String, expr: &Expr) {
    match expr {
        Expr::Word(w) => push_word(out, w),
        Expr::Unary(e) => {
            out.push_str("UnaryOp(");
            push_quoted(out, &e.op.text);
            out.push_str(", ");
            push_expr(out, &e.operand);
            out.push(')');
        }
        Expr::Binary(e) => {
            out.push_str("BinaryOp(");
            push_expr(out, &e.left);
            out.push_str(", ");
            push_quoted(out, &e.op.text);
            out.push_str(", ");
            push_expr(out, &e.right);
            out.push(')');
        }
        Expr::Ternary(e) => {
            out.push_str("TernaryOp(");
            push_expr(out, &e.cond);
            out.push_str(", ");
            push_expr(out, &e.then_expr);
            out.push_str(", ");
            push_expr(out, &e.else_expr);
            out.push(')');
        }
        Expr::Function(e) => {
            out.push_str("Function(");
            push_quoted(out, &e.name);
            for arg in &e.args {
                out.push_str(", ");
                push_expr(out, arg);
            }
            out.push(')');
        }
        Expr::Paren(e) => {
            out.push_str("ParenExpression(");
            push_expr(out, &e.inner);
            out.push(')');
        }
    }
}

fn push_quoted(out: &mut String, text: &str) {
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out.push('"');
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span() -> Span {
        Span::new(Pos::new(1, 1), Pos::new(1, 2))
    }

    #[test]
    fn test_span_contains() {
        let s = Span::new(Pos::new(1, 3), Pos::new(2, 1));
        assert!(s.contains(Pos::new(1, 3)));
        assert!(s.contains(Pos::new(1, 99)));
        assert!(!s.contains(Pos::new(2, 1)));
        assert!(!s.contains(Pos::new(1, 2)));
    }

    #[test]
    fn test_quoted_contents() {
        let word = Word::Quoted(QuotedWord {
            parts: vec![
                Word::Bare(BareWord { text: "a".into(), span: span() }),
                Word::BackslashSub(BackslashSub { text: "\\n".into(), span: span() }),
            ],
            span: span(),
        });
        assert_eq!(word.contents(), Some("a\\n".into()));
    }

    #[test]
    fn test_contents_none_with_substitution() {
        let word = Word::Compound(CompoundWord {
            parts: vec![
                Word::Bare(BareWord { text: "pre-".into(), span: span() }),
                Word::VarSub(VarSub {
                    name: "x".into(),
                    braced: false,
                    index: vec![],
                    span: span(),
                }),
            ],
            span: span(),
        });
        assert_eq!(word.contents(), None);
    }

    #[test]
    fn test_empty_quoted_contents() {
        let word = Word::Quoted(QuotedWord { parts: vec![], span: span() });
        assert_eq!(word.contents(), Some(String::new()));
    }
}

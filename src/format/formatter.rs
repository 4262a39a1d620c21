//! Style-driven source re-emission.
//!
//! The formatter walks the tree depth-first with an indentation level and
//! re-emits canonical source. Line breaks between sibling nodes are
//! inherited from the original positions ("break hints"): two nodes that
//! shared a line stay on one line, nodes on separate lines stay separated.
//! The formatter never reorders words and never introduces or removes a
//! newline inside a verbatim word.
//!
//! Invariants, in priority order: re-parsing the output yields an
//! equivalent tree, formatting is idempotent, and the output satisfies the
//! style profile.

use crate::ast::types::{
    CmdSub, Command, Expr, ExprArg, ListWord, Pos, Script, ScriptArg, ScriptItem, Word, WordDelim,
};
use crate::config::Style;

pub struct Formatter<'a> {
    style: &'a Style,
}

impl<'a> Formatter<'a> {
    pub fn new(style: &'a Style) -> Self {
        Self { style }
    }

    /// Format a whole source tree. Output ends with exactly one newline
    /// unless the input is empty.
    pub fn format(&self, tree: &Script) -> String {
        if tree.items.is_empty() {
            return String::new();
        }
        let mut out = String::new();
        self.fmt_body(&tree.items, 0, &mut out);
        out.push('\n');
        out
    }

    fn indent_str(&self, levels: usize) -> String {
        self.style.indent.string_for(levels)
    }

    fn pad(&self) -> &'static str {
        if self.style.spaces_in_braces {
            " "
        } else {
            ""
        }
    }

    /// Emit script items at an indentation level: indentation before each
    /// line, blank runs clamped to `max-blank-lines`, same-line commands
    /// joined with `;`, inline comments attached as `;#`.
    fn fmt_body(&self, items: &[ScriptItem], indent: usize, out: &mut String) {
        let mut last_end_line: Option<usize> = None;

        for item in items {
            let start_line = item.span().start.line;
            match last_end_line {
                None => out.push_str(&self.indent_str(indent)),
                Some(last) if start_line == last => match item {
                    ScriptItem::Comment(_) => out.push_str(" ;"),
                    ScriptItem::Command(_) => out.push_str("; "),
                },
                Some(last) => {
                    let newlines = (start_line - last).min(self.style.max_blank_lines + 1);
                    for _ in 0..newlines {
                        out.push('\n');
                    }
                    out.push_str(&self.indent_str(indent));
                }
            }

            match item {
                ScriptItem::Command(command) => self.fmt_command(command, indent, out),
                ScriptItem::Comment(comment) => {
                    out.push('#');
                    out.push_str(comment.text.trim_end());
                }
            }
            last_end_line = Some(item.span().end.line);
        }
    }

    /// Like `fmt_body` but without leading indentation, for script items
    /// living inside inline delimiters (single-line braces, quotes,
    /// single-command brackets).
    fn fmt_items_inline(&self, items: &[ScriptItem], indent: usize, out: &mut String) {
        let mut last_end_line: Option<usize> = None;

        for item in items {
            match last_end_line {
                None => {}
                Some(last) if item.span().start.line == last => match item {
                    ScriptItem::Comment(_) => out.push_str(" ;"),
                    ScriptItem::Command(_) => out.push_str("; "),
                },
                Some(_) => {
                    out.push('\n');
                    out.push_str(&self.indent_str(indent + 1));
                }
            }

            match item {
                ScriptItem::Command(command) => self.fmt_command(command, indent, out),
                ScriptItem::Comment(comment) => {
                    out.push('#');
                    out.push_str(comment.text.trim_end());
                }
            }
            last_end_line = Some(item.span().end.line);
        }
    }

    /// One space between words on a line; a break hint becomes a
    /// backslash continuation indented one level past the command.
    fn fmt_command(&self, command: &Command, indent: usize, out: &mut String) {
        let ns_eval_flat = !self.style.indent_namespace_eval
            && command.routine().as_deref() == Some("namespace")
            && command.args().first().and_then(|w| w.contents()).as_deref() == Some("eval");

        let mut prev_end_line: Option<usize> = None;
        for word in &command.words {
            if let Some(prev) = prev_end_line {
                if word.span().start.line > prev {
                    out.push_str(" \\\n");
                    out.push_str(&self.indent_str(indent + 1));
                } else {
                    out.push(' ');
                }
            }
            match word {
                Word::Script(script_arg) if ns_eval_flat => {
                    self.fmt_script_arg_step(script_arg, indent, 0, out);
                }
                _ => self.fmt_word(word, indent, false, out),
            }
            prev_end_line = Some(word.span().end.line);
        }
    }

    /// `inline` marks words nested inside other words (quoted strings,
    /// compounds, variable indices), where multi-line expansion is not
    /// allowed.
    fn fmt_word(&self, word: &Word, indent: usize, inline: bool, out: &mut String) {
        match word {
            Word::Bare(w) => out.push_str(&w.text),
            Word::BackslashSub(w) => out.push_str(&w.text),
            Word::Braced(w) => {
                out.push('{');
                out.push_str(&w.text);
                out.push('}');
            }
            Word::Quoted(w) => {
                out.push('"');
                for part in &w.parts {
                    self.fmt_word(part, indent, true, out);
                }
                out.push('"');
            }
            Word::Compound(w) => {
                for part in &w.parts {
                    self.fmt_word(part, indent, true, out);
                }
            }
            Word::VarSub(w) => {
                if w.braced {
                    out.push_str("${");
                    out.push_str(&w.name);
                    out.push('}');
                } else {
                    out.push('$');
                    out.push_str(&w.name);
                    if !w.index.is_empty() {
                        out.push('(');
                        for part in &w.index {
                            self.fmt_word(part, indent, true, out);
                        }
                        out.push(')');
                    }
                }
            }
            Word::ArgExpansion(w) => {
                out.push_str("{*}");
                self.fmt_word(&w.word, indent, inline, out);
            }
            Word::CmdSub(w) => self.fmt_cmd_sub(w, indent, inline, out),
            Word::Script(w) => self.fmt_script_arg(w, indent, out),
            Word::List(w) => self.fmt_list(w, indent, out),
            Word::Expr(w) => self.fmt_expr_arg(w, indent, out),
        }
    }

    /// A command substitution holding several items gets its brackets on
    /// their own lines; with a single command the brackets stay inline.
    /// Inside another word the brackets always stay inline, since a word
    /// must not grow new newlines.
    fn fmt_cmd_sub(&self, cmd_sub: &CmdSub, indent: usize, inline: bool, out: &mut String) {
        let items = &cmd_sub.script.items;

        if !inline && items.len() >= 2 {
            out.push_str("[\n");
            self.fmt_body(items, indent + 1, out);
            out.push('\n');
            out.push_str(&self.indent_str(indent));
            out.push(']');
            return;
        }

        out.push('[');
        self.fmt_items_inline(items, indent, out);
        out.push(']');
    }

    fn fmt_script_arg(&self, script_arg: &ScriptArg, indent: usize, out: &mut String) {
        self.fmt_script_arg_step(script_arg, indent, 1, out);
    }

    /// `step` is the extra indentation the body gets; 0 keeps the body at
    /// the parent level (used for `namespace eval` when
    /// `indent-namespace-eval` is off).
    fn fmt_script_arg_step(
        &self,
        script_arg: &ScriptArg,
        indent: usize,
        step: usize,
        out: &mut String,
    ) {
        let items = &script_arg.script.items;
        match script_arg.delim {
            WordDelim::Braces => {
                if items.is_empty() {
                    out.push_str("{}");
                } else if script_arg.text.contains('\n') {
                    out.push_str("{\n");
                    self.fmt_body(items, indent + step, out);
                    out.push('\n');
                    out.push_str(&self.indent_str(indent));
                    out.push('}');
                } else {
                    out.push('{');
                    out.push_str(self.pad());
                    self.fmt_items_inline(items, indent, out);
                    out.push_str(self.pad());
                    out.push('}');
                }
            }
            WordDelim::Quotes => {
                out.push('"');
                self.fmt_items_inline(items, indent, out);
                out.push('"');
            }
            WordDelim::Bare => self.fmt_items_inline(items, indent, out),
        }
    }

    fn fmt_list(&self, list: &ListWord, indent: usize, out: &mut String) {
        if list.items.is_empty() {
            out.push_str("{}");
            return;
        }

        if list.text.contains('\n') {
            out.push_str("{\n");
            out.push_str(&self.indent_str(indent + 1));
            let mut last_end_line: Option<usize> = None;
            for item in &list.items {
                if let Some(last) = last_end_line {
                    if item.span().start.line > last {
                        out.push('\n');
                        out.push_str(&self.indent_str(indent + 1));
                    } else {
                        out.push(' ');
                    }
                }
                self.fmt_word(item, indent + 1, false, out);
                last_end_line = Some(item.span().end.line);
            }
            out.push('\n');
            out.push_str(&self.indent_str(indent));
            out.push('}');
        } else {
            out.push('{');
            out.push_str(self.pad());
            for (i, item) in list.items.iter().enumerate() {
                if i > 0 {
                    out.push(' ');
                }
                self.fmt_word(item, indent, false, out);
            }
            out.push_str(self.pad());
            out.push('}');
        }
    }

    fn fmt_expr_arg(&self, expr_arg: &ExprArg, indent: usize, out: &mut String) {
        match expr_arg.delim {
            WordDelim::Braces => {
                if expr_arg.text.contains('\n') {
                    out.push_str("{\n");
                    out.push_str(&self.indent_str(indent + 1));
                    self.fmt_expr(&expr_arg.expr, indent + 1, out);
                    out.push('\n');
                    out.push_str(&self.indent_str(indent));
                    out.push('}');
                } else {
                    out.push('{');
                    out.push_str(self.pad());
                    self.fmt_expr(&expr_arg.expr, indent, out);
                    out.push_str(self.pad());
                    out.push('}');
                }
            }
            WordDelim::Quotes => {
                out.push('"');
                self.fmt_expr(&expr_arg.expr, indent, out);
                out.push('"');
            }
            // a bare expression cannot gain internal spaces without
            // changing its word count, so it stays verbatim
            WordDelim::Bare => out.push_str(&expr_arg.text),
        }
    }

    fn fmt_expr(&self, expr: &Expr, indent: usize, out: &mut String) {
        match expr {
            Expr::Word(w) => self.fmt_word(w, indent, true, out),
            Expr::Unary(e) => {
                out.push_str(&e.op.text);
                self.fmt_expr(&e.operand, indent, out);
            }
            Expr::Binary(e) => {
                self.fmt_expr(&e.left, indent, out);
                self.expr_sep(e.left.span().end, e.op.span.start, indent, out);
                out.push_str(&e.op.text);
                self.expr_sep(e.op.span.end, e.right.span().start, indent, out);
                self.fmt_expr(&e.right, indent, out);
            }
            Expr::Ternary(e) => {
                self.fmt_expr(&e.cond, indent, out);
                self.expr_sep(e.cond.span().end, e.question.span.start, indent, out);
                out.push('?');
                self.expr_sep(e.question.span.end, e.then_expr.span().start, indent, out);
                self.fmt_expr(&e.then_expr, indent, out);
                self.expr_sep(e.then_expr.span().end, e.colon.span.start, indent, out);
                out.push(':');
                self.expr_sep(e.colon.span.end, e.else_expr.span().start, indent, out);
                self.fmt_expr(&e.else_expr, indent, out);
            }
            Expr::Function(e) => {
                out.push_str(&e.name);
                out.push('(');
                for (i, arg) in e.args.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    self.fmt_expr(arg, indent, out);
                }
                out.push(')');
            }
            Expr::Paren(e) => {
                out.push('(');
                self.fmt_expr(&e.inner, indent, out);
                out.push(')');
            }
        }
    }

    /// Single space between expression tokens, or a preserved line break
    /// re-indented to the expression body level.
    fn expr_sep(&self, prev_end: Pos, next_start: Pos, indent: usize, out: &mut String) {
        if next_start.line > prev_end.line {
            out.push('\n');
            out.push_str(&self.indent_str(indent));
        } else {
            out.push(' ');
        }
    }
}

// =============================================================================
// ROUND-TRIP EQUIVALENCE
// =============================================================================

/// Structural equivalence of two parses: same command/comment sequence and,
/// for each command, the same number and kinds of argument words. Used by
/// debug mode to verify the formatter preserved the tree.
pub fn trees_equivalent(a: &Script, b: &Script) -> bool {
    if a.items.len() != b.items.len() {
        return false;
    }
    a.items.iter().zip(&b.items).all(|(x, y)| match (x, y) {
        (ScriptItem::Comment(cx), ScriptItem::Comment(cy)) => {
            cx.text.trim_end() == cy.text.trim_end()
        }
        (ScriptItem::Command(cx), ScriptItem::Command(cy)) => {
            cx.words.len() == cy.words.len()
                && cx.words.iter().zip(&cy.words).all(|(wx, wy)| words_equivalent(wx, wy))
        }
        _ => false,
    })
}

fn words_equivalent(a: &Word, b: &Word) -> bool {
    match (a, b) {
        (Word::Bare(x), Word::Bare(y)) => x.text == y.text,
        (Word::Braced(x), Word::Braced(y)) => x.text == y.text,
        (Word::BackslashSub(x), Word::BackslashSub(y)) => x.text == y.text,
        (Word::Quoted(x), Word::Quoted(y)) => x.parts.len() == y.parts.len(),
        (Word::Compound(x), Word::Compound(y)) => x.parts.len() == y.parts.len(),
        (Word::VarSub(x), Word::VarSub(y)) => x.name == y.name,
        (Word::CmdSub(x), Word::CmdSub(y)) => trees_equivalent(&x.script, &y.script),
        (Word::ArgExpansion(x), Word::ArgExpansion(y)) => words_equivalent(&x.word, &y.word),
        (Word::Script(x), Word::Script(y)) => trees_equivalent(&x.script, &y.script),
        (Word::List(x), Word::List(y)) => {
            x.items.len() == y.items.len()
                && x.items.iter().zip(&y.items).all(|(ix, iy)| words_equivalent(ix, iy))
        }
        (Word::Expr(_), Word::Expr(_)) => true,
        _ => false,
    }
}

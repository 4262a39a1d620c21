//! Lint checks.
//!
//! Text-level checks (line length, whitespace, blank lines) scan the raw
//! source; structural checks walk the syntax tree. `run_checks` drives all
//! of them over one file.

use std::collections::HashSet;

use regex_lite::Regex;

use crate::ast::types::{
    Command, Expr, Pos, Script, ScriptItem, Span, Word, WordDelim,
};
use crate::ast::visitor::{walk_script, Visitor};
use crate::commands::CommandRegistry;
use crate::config::{Config, Indent};
use crate::lint::violations::{Rule, Violation};

pub fn run_checks(
    source: &str,
    tree: &Script,
    config: &Config,
    registry: &CommandRegistry,
) -> Vec<Violation> {
    let mut violations = Vec::new();

    violations.extend(check_line_length(source, &config.style));
    violations.extend(check_trailing_whitespace(source));
    violations.extend(check_blank_lines(source, &config.style));
    violations.extend(check_backslash_spacing(source, tree));

    let mut redefined = RedefinedBuiltinChecker { registry, violations: Vec::new() };
    walk_script(&mut redefined, tree);
    violations.extend(redefined.violations);

    let mut unbraced = UnbracedExprChecker { violations: Vec::new() };
    walk_script(&mut unbraced, tree);
    violations.extend(unbraced.violations);

    let mut redundant = RedundantExprChecker { violations: Vec::new() };
    walk_script(&mut redundant, tree);
    violations.extend(redundant.violations);

    let mut spacing = SpacingChecker {
        allow_aligned_sets: config.style.allow_aligned_sets,
        violations: Vec::new(),
    };
    spacing.check_items(&tree.items);
    violations.extend(spacing.violations);

    let mut indent = IndentChecker {
        lines: source.lines().collect(),
        indent: &config.style.indent,
        indent_namespace_eval: config.style.indent_namespace_eval,
        violations: Vec::new(),
    };
    indent.check_items(&tree.items, 0);
    violations.extend(indent.violations);

    let mut expr_format = ExprFormatChecker { violations: Vec::new() };
    walk_script(&mut expr_format, tree);
    violations.extend(expr_format.violations);

    let mut spaces = SpacesInBracesChecker {
        spaces_in_braces: config.style.spaces_in_braces,
        violations: Vec::new(),
    };
    walk_script(&mut spaces, tree);
    violations.extend(spaces.violations);

    violations
}

fn line_span(lineno: usize, start_col: usize, end_col: usize) -> Span {
    Span::new(Pos::new(lineno, start_col), Pos::new(lineno, end_col))
}

/// Ensures lines aren't too long. Lines containing a URL are exempt.
fn check_line_length(source: &str, style: &crate::config::Style) -> Vec<Violation> {
    let url_re = Regex::new(r"[a-z]+://\S+").expect("valid regex");
    let mut violations = Vec::new();

    for (i, line) in source.lines().enumerate() {
        if url_re.is_match(line) {
            continue;
        }
        let width = line.chars().count();
        if width > style.line_length {
            violations.push(Violation::new(
                Rule::LineLength,
                format!(
                    "line length is {width}, maximum allowed is {}",
                    style.line_length
                ),
                line_span(i + 1, 1, width + 1),
            ));
        }
    }

    violations
}

fn check_trailing_whitespace(source: &str) -> Vec<Violation> {
    let mut violations = Vec::new();

    for (i, line) in source.lines().enumerate() {
        if line.ends_with(' ') || line.ends_with('\t') {
            let trimmed_width = line.trim_end_matches([' ', '\t']).chars().count();
            violations.push(Violation::new(
                Rule::TrailingWhitespace,
                "line has trailing whitespace",
                line_span(i + 1, trimmed_width + 1, line.chars().count() + 1),
            ));
        }
    }

    violations
}

fn check_blank_lines(source: &str, style: &crate::config::Style) -> Vec<Violation> {
    let mut violations = Vec::new();
    let mut run_start = None;
    let mut run_len = 0;

    let flush = |start: Option<usize>, len: usize, violations: &mut Vec<Violation>| {
        if let Some(start) = start {
            if len > style.max_blank_lines {
                violations.push(Violation::new(
                    Rule::BlankLines,
                    format!(
                        "found {len} consecutive blank lines, expected no more than {}",
                        style.max_blank_lines
                    ),
                    Span::new(Pos::new(start, 1), Pos::new(start + len, 1)),
                ));
            }
        }
    };

    for (i, line) in source.lines().enumerate() {
        if line.trim().is_empty() {
            if run_start.is_none() {
                run_start = Some(i + 1);
            }
            run_len += 1;
        } else {
            flush(run_start.take(), run_len, &mut violations);
            run_len = 0;
        }
    }
    flush(run_start.take(), run_len, &mut violations);

    violations
}

/// Line-continuation backslashes should be preceded by exactly one space.
/// Only continuations between command words are checked; backslash-newlines
/// inside braced literals are verbatim content.
fn check_backslash_spacing(source: &str, tree: &Script) -> Vec<Violation> {
    struct Checker<'a> {
        lines: Vec<&'a str>,
        seen: HashSet<usize>,
        violations: Vec<Violation>,
    }

    impl Checker<'_> {
        fn check_continuation_line(&mut self, lineno: usize) {
            if !self.seen.insert(lineno) {
                return;
            }
            let Some(line) = self.lines.get(lineno - 1) else {
                return;
            };
            let Some(stripped) = line.strip_suffix('\\') else {
                return;
            };
            if stripped.trim().is_empty() {
                // continuation on an otherwise-empty line
                return;
            }
            let one_space = stripped.ends_with(' ')
                && !stripped.ends_with("  ")
                && !stripped.ends_with("\t ");
            if !one_space {
                let col = stripped.chars().count() + 1;
                self.violations.push(Violation::new(
                    Rule::BackslashSpacing,
                    "expected one space before line-continuation backslash",
                    line_span(lineno, col, col + 1),
                ));
            }
        }
    }

    impl Visitor for Checker<'_> {
        fn visit_command(&mut self, command: &Command) {
            for pair in command.words.windows(2) {
                let prev_end = pair[0].span().end;
                let next_start = pair[1].span().start;
                if next_start.line > prev_end.line {
                    for lineno in prev_end.line..next_start.line {
                        self.check_continuation_line(lineno);
                    }
                }
            }
        }
    }

    let mut checker = Checker {
        lines: source.lines().collect(),
        seen: HashSet::new(),
        violations: Vec::new(),
    };
    walk_script(&mut checker, tree);
    checker.violations
}

/// Ensures names of built-in commands aren't reused by proc definitions.
struct RedefinedBuiltinChecker<'a> {
    registry: &'a CommandRegistry,
    violations: Vec<Violation>,
}

impl Visitor for RedefinedBuiltinChecker<'_> {
    fn visit_command(&mut self, command: &Command) {
        if command.routine().as_deref() != Some("proc") {
            return;
        }
        let args = command.args();
        if args.is_empty() {
            // syntax error, already reported as command-args
            return;
        }
        let Some(name) = args[0].contents() else {
            return;
        };
        if self.registry.contains(&name) {
            let end = args.get(1).map_or(args[0].span().end, |w| w.span().end);
            self.violations.push(Violation::new(
                Rule::RedefinedBuiltin,
                format!("redefinition of built-in command '{name}'"),
                Span::new(command.span.start, end),
            ));
        }
    }
}

/// Flags expr commands whose expression is not safely braced.
struct UnbracedExprChecker {
    violations: Vec<Violation>,
}

impl Visitor for UnbracedExprChecker {
    fn visit_command(&mut self, command: &Command) {
        if command.routine().as_deref() != Some("expr") {
            return;
        }
        let args = command.args();
        if args.is_empty() {
            return;
        }

        let span = Span::new(args[0].span().start, args.last().expect("non-empty").span().end);

        if args.len() == 1 {
            match &args[0] {
                // parsed fine, or already reported as command-args
                Word::Expr(_) | Word::Braced(_) => {}
                word if word.contents().is_none() => {
                    self.violations.push(Violation::new(
                        Rule::UnbracedExpr,
                        "expression with substitutions should be enclosed by braces",
                        span,
                    ));
                }
                _ => {}
            }
            return;
        }

        if args.iter().any(|a| a.contents().is_none()) {
            self.violations.push(Violation::new(
                Rule::UnbracedExpr,
                "expression with substitutions should be enclosed by braces",
                span,
            ));
        } else if args.iter().any(|a| matches!(a, Word::Braced(_) | Word::Quoted(_))) {
            self.violations.push(Violation::new(
                Rule::UnbracedExpr,
                "expression containing braced or quoted words should be enclosed by braces",
                span,
            ));
        }
        // multiple concrete bare words (e.g. `expr 1 + 1`) are legal without braces
    }
}

/// Flags `[expr ...]` command substitutions used as expression operands.
struct RedundantExprChecker {
    violations: Vec<Violation>,
}

impl RedundantExprChecker {
    fn check_operand(&mut self, operand: &Expr) {
        let Expr::Word(Word::CmdSub(cmd_sub)) = operand else {
            return;
        };
        if cmd_sub.script.items.len() != 1 {
            return;
        }
        let ScriptItem::Command(command) = &cmd_sub.script.items[0] else {
            return;
        };
        if command.routine().as_deref() == Some("expr") {
            self.violations.push(Violation::new(
                Rule::RedundantExpr,
                "unnecessary command substitution within expression",
                cmd_sub.span,
            ));
        }
    }
}

impl Visitor for RedundantExprChecker {
    fn visit_word(&mut self, word: &Word) {
        if let Word::Expr(expr_arg) = word {
            self.check_operand(&expr_arg.expr);
        }
    }

    fn visit_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Word(_) => {}
            Expr::Unary(e) => self.check_operand(&e.operand),
            Expr::Binary(e) => {
                self.check_operand(&e.left);
                self.check_operand(&e.right);
            }
            Expr::Ternary(e) => {
                self.check_operand(&e.cond);
                self.check_operand(&e.then_expr);
                self.check_operand(&e.else_expr);
            }
            Expr::Function(e) => {
                for arg in &e.args {
                    self.check_operand(arg);
                }
            }
            Expr::Paren(e) => self.check_operand(&e.inner),
        }
    }
}

/// Flags more than one space between argument words on the same line.
/// Contiguous `set` commands that vertically align their values are exempt
/// when `allow-aligned-sets` is on.
struct SpacingChecker {
    allow_aligned_sets: bool,
    violations: Vec<Violation>,
}

impl SpacingChecker {
    fn check_items(&mut self, items: &[ScriptItem]) {
        let aligned = if self.allow_aligned_sets {
            find_aligned_sets(items)
        } else {
            HashSet::new()
        };

        for (idx, item) in items.iter().enumerate() {
            let ScriptItem::Command(command) = item else {
                continue;
            };
            for (i, pair) in command.words.windows(2).enumerate() {
                let prev_end = pair[0].span().end;
                let next_start = pair[1].span().start;
                if prev_end.line != next_start.line {
                    continue;
                }
                let gap = next_start.col.saturating_sub(prev_end.col);
                // i == 1 is the gap before a set command's value
                if gap > 1 && !(aligned.contains(&idx) && i == 1) {
                    self.violations.push(Violation::new(
                        Rule::Spacing,
                        format!("expected 1 space between words, got {gap}"),
                        Span::new(prev_end, next_start),
                    ));
                }
            }
            for word in &command.words {
                self.check_word(word);
            }
        }
    }

    fn check_word(&mut self, word: &Word) {
        match word {
            Word::Script(s) => self.check_items(&s.script.items),
            Word::CmdSub(c) => self.check_items(&c.script.items),
            Word::List(l) => {
                for item in &l.items {
                    self.check_word(item);
                }
            }
            Word::ArgExpansion(a) => self.check_word(&a.word),
            Word::Quoted(q) => {
                for part in &q.parts {
                    self.check_word(part);
                }
            }
            Word::Compound(c) => {
                for part in &c.parts {
                    self.check_word(part);
                }
            }
            Word::VarSub(v) => {
                for part in &v.index {
                    self.check_word(part);
                }
            }
            _ => {}
        }
    }
}

/// Indices of commands in an aligned run of `set` commands.
fn find_aligned_sets(items: &[ScriptItem]) -> HashSet<usize> {
    let mut aligned = HashSet::new();
    let mut run: Vec<(usize, usize)> = Vec::new(); // (item index, value column)
    let mut prev_line = 0;

    let flush = |run: &mut Vec<(usize, usize)>, aligned: &mut HashSet<usize>| {
        if run.len() >= 2 && run.iter().all(|(_, col)| *col == run[0].1) {
            aligned.extend(run.iter().map(|(idx, _)| *idx));
        }
        run.clear();
    };

    for (idx, item) in items.iter().enumerate() {
        let set_like = match item {
            ScriptItem::Command(cmd) => {
                cmd.routine().as_deref() == Some("set")
                    && cmd.words.len() == 3
                    && cmd.span.start.line == cmd.span.end.line
            }
            ScriptItem::Comment(_) => false,
        };

        if set_like {
            let ScriptItem::Command(cmd) = item else { unreachable!() };
            let line = cmd.span.start.line;
            if !run.is_empty() && line != prev_line + 1 {
                flush(&mut run, &mut aligned);
            }
            run.push((idx, cmd.words[2].span().start.col));
            prev_line = line;
        } else {
            flush(&mut run, &mut aligned);
        }
    }
    flush(&mut run, &mut aligned);

    aligned
}

/// Legacy check: leading whitespace should match the nesting depth.
/// Superseded by the formatter but kept for lint-only setups.
struct IndentChecker<'a> {
    lines: Vec<&'a str>,
    indent: &'a Indent,
    indent_namespace_eval: bool,
    violations: Vec<Violation>,
}

impl IndentChecker<'_> {
    fn check_items(&mut self, items: &[ScriptItem], depth: usize) {
        for item in items {
            self.check_line_start(item.span().start, depth);

            let ScriptItem::Command(command) = item else {
                continue;
            };

            let mut prev_end_line = command.span.start.line;
            for word in &command.words {
                if word.span().start.line > prev_end_line {
                    self.check_line_start(word.span().start, depth + 1);
                }
                prev_end_line = prev_end_line.max(word.span().end.line);
            }

            let ns_eval = command.routine().as_deref() == Some("namespace")
                && command.args().first().and_then(|w| w.contents()).as_deref() == Some("eval");
            let script_step = usize::from(!ns_eval || self.indent_namespace_eval);

            for word in &command.words {
                self.check_word(word, depth, script_step);
            }
        }
    }

    fn check_word(&mut self, word: &Word, depth: usize, script_step: usize) {
        match word {
            Word::Script(s) if s.text.contains('\n') => {
                self.check_items(&s.script.items, depth + script_step);
            }
            Word::CmdSub(c) if c.span.start.line != c.span.end.line => {
                self.check_items(&c.script.items, depth + 1);
            }
            Word::List(l) if l.text.contains('\n') => {
                for item in &l.items {
                    self.check_line_start(item.span().start, depth + 1);
                    if let Word::Script(s) = item {
                        if s.text.contains('\n') {
                            self.check_items(&s.script.items, depth + 2);
                        }
                    }
                }
            }
            Word::ArgExpansion(a) => self.check_word(&a.word, depth, script_step),
            _ => {}
        }
    }

    fn check_line_start(&mut self, pos: Pos, depth: usize) {
        let Some(line) = self.lines.get(pos.line - 1) else {
            return;
        };
        let leading: String = line.chars().take_while(|c| *c == ' ' || *c == '\t').collect();
        if leading.chars().count() + 1 != pos.col {
            // not the first token on its line
            return;
        }
        let expected = self.indent.string_for(depth);
        if leading != expected {
            let (unit, want) = match self.indent {
                Indent::Spaces(n) => ("spaces", n * depth),
                Indent::Tab => ("tabs", depth),
                Indent::Mixed { .. } => ("columns", expected.chars().count()),
            };
            self.violations.push(Violation::new(
                Rule::Indent,
                format!("expected indent of {want} {unit}, got {}", leading.chars().count()),
                line_span(pos.line, 1, pos.col),
            ));
        }
    }
}

/// Operator spacing inside structured expressions.
struct ExprFormatChecker {
    violations: Vec<Violation>,
}

impl ExprFormatChecker {
    fn gap(&mut self, prev_end: Pos, next_start: Pos, want: usize, message: &str) {
        if prev_end.line != next_start.line {
            return;
        }
        if next_start.col.saturating_sub(prev_end.col) != want {
            self.violations.push(Violation::new(
                Rule::ExprFormat,
                message.to_string(),
                Span::new(prev_end, next_start),
            ));
        }
    }
}

impl Visitor for ExprFormatChecker {
    fn visit_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Binary(e) => {
                let message = format!("expected 1 space around operator '{}'", e.op.text);
                self.gap(e.left.span().end, e.op.span.start, 1, &message);
                self.gap(e.op.span.end, e.right.span().start, 1, &message);
            }
            Expr::Ternary(e) => {
                self.gap(e.cond.span().end, e.question.span.start, 1, "expected 1 space around '?'");
                self.gap(e.question.span.end, e.then_expr.span().start, 1, "expected 1 space around '?'");
                self.gap(e.then_expr.span().end, e.colon.span.start, 1, "expected 1 space around ':'");
                self.gap(e.colon.span.end, e.else_expr.span().start, 1, "expected 1 space around ':'");
            }
            Expr::Unary(e) => {
                self.gap(
                    e.op.span.end,
                    e.operand.span().start,
                    0,
                    "unexpected space after unary operator",
                );
            }
            Expr::Function(e) => {
                self.gap(
                    e.name_span.end,
                    e.lparen,
                    0,
                    "unexpected space before function parenthesis",
                );
            }
            _ => {}
        }
    }
}

/// Single-line braced scripts, expressions, and lists should match the
/// configured `spaces-in-braces` padding.
struct SpacesInBracesChecker {
    spaces_in_braces: bool,
    violations: Vec<Violation>,
}

impl SpacesInBracesChecker {
    fn check_padding(&mut self, text: &str, span: Span) {
        if text.contains('\n') || text.trim().is_empty() {
            return;
        }

        let leading = text.len() - text.trim_start().len();
        let trailing = text.len() - text.trim_end().len();

        if self.spaces_in_braces {
            if !(text.starts_with(' ') && leading == 1 && text.ends_with(' ') && trailing == 1) {
                self.violations.push(Violation::new(
                    Rule::SpacesInBraces,
                    "expected one space inside braces",
                    span,
                ));
            }
        } else if leading > 1 || trailing > 1 || text.starts_with('\t') || text.ends_with('\t') {
            // without spaces-in-braces both {x} and { x } are accepted; the
            // formatter normalizes the padding, the linter only flags
            // whitespace that is wrong in either style
            self.violations.push(Violation::new(
                Rule::SpacesInBraces,
                "expected at most one space inside braces",
                span,
            ));
        }
    }
}

impl Visitor for SpacesInBracesChecker {
    fn visit_word(&mut self, word: &Word) {
        match word {
            Word::Script(s) if s.delim == WordDelim::Braces => {
                self.check_padding(&s.text, s.span);
            }
            Word::Expr(e) if e.delim == WordDelim::Braces => {
                self.check_padding(&e.text, e.span);
            }
            Word::List(l) => self.check_padding(&l.text, l.span),
            _ => {}
        }
    }
}

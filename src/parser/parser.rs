//! Recursive Descent Parser for Tcl Scripts
//!
//! The parser consumes fragment tokens from the lexer and builds the syntax
//! tree. Since many built-in Tcl commands take scripts or expressions as
//! arguments, building a complete tree requires looking up command names in
//! the registry mid-parse and possibly re-parsing their argument words. This
//! mirrors how the Tcl interpreter itself evaluates scripts and handles edge
//! cases a grammar-driven parser cannot. For example, this may look like
//! valid Tcl:
//!
//! ```text
//! proc foo {a} {
//!     # output }
//!     puts "}"
//! }
//! ```
//!
//! but the `}` in the comment actually terminates the body of the proc. The
//! parser gets this right because braced words are scanned as literal text
//! first and re-parsed as scripts only on behalf of the enclosing command.
//!
//! Recoverable errors (bad arguments, stray tokens) become violations and
//! parsing resumes at the next command separator.

use crate::ast::types::{
    ArgExpansion, BackslashSub, BareWord, BracedWord, CmdSub, Command, Comment, CompoundWord,
    ExprArg, ListWord, Pos, QuotedWord, Script, ScriptArg, ScriptItem, Span, VarSub, Word,
    WordDelim,
};
use crate::commands::CommandRegistry;
use crate::lint::violations::{Rule, Violation};
use crate::parser::expr;
use crate::parser::lexer::{TokenStream, TokenType};
use crate::parser::types::{CommandArgError, TclSyntaxError};

/// Helper for constructing word nodes out of multiple segments. Plain text
/// accumulates into `BareWord` segments; substitution nodes flush the
/// pending text first.
pub(crate) struct WordBuilder {
    parts: Vec<Word>,
    current: String,
    current_start: Option<Pos>,
}

impl WordBuilder {
    pub(crate) fn new() -> Self {
        Self { parts: Vec::new(), current: String::new(), current_start: None }
    }

    pub(crate) fn add_tok(&mut self, ts: &TokenStream) {
        if self.current_start.is_none() {
            self.current_start = Some(ts.pos());
        }
        self.current.push_str(ts.value());
    }

    pub(crate) fn add_text(&mut self, text: &str, pos: Pos) {
        if self.current_start.is_none() {
            self.current_start = Some(pos);
        }
        self.current.push_str(text);
    }

    pub(crate) fn add_node(&mut self, node: Word) {
        if !self.current.is_empty() {
            let start = self.current_start.take().expect("segment start tracked");
            self.parts.push(Word::Bare(BareWord {
                text: std::mem::take(&mut self.current),
                span: Span::new(start, node.span().start),
            }));
        }
        self.current_start = None;
        self.parts.push(node);
    }

    pub(crate) fn resolve(mut self, end: Pos) -> Vec<Word> {
        if !self.current.is_empty() {
            let start = self.current_start.take().expect("segment start tracked");
            self.parts.push(Word::Bare(BareWord {
                text: std::mem::take(&mut self.current),
                span: Span::new(start, end),
            }));
        }
        self.parts
    }
}

fn word_delim(word: &Word) -> WordDelim {
    match word {
        Word::Braced(_) => WordDelim::Braces,
        Word::Quoted(_) => WordDelim::Quotes,
        _ => WordDelim::Bare,
    }
}

/// The Tcl parser. One instance handles one source unit; violations found
/// during parsing (bad command arguments, recoverable syntax errors)
/// accumulate in `violations`.
pub struct Parser<'r> {
    registry: &'r CommandRegistry,
    pub violations: Vec<Violation>,
    cmd_sub: bool,
}

impl<'r> Parser<'r> {
    pub fn new(registry: &'r CommandRegistry) -> Self {
        Self { registry, violations: Vec::new(), cmd_sub: false }
    }

    /// Parse a complete source unit.
    pub fn parse(&mut self, input: &str) -> Script {
        self.parse_at(input, Pos::new(1, 1))
    }

    /// Parse a source unit whose first character sits at `start` in the
    /// enclosing document. Used when re-parsing argument words.
    pub fn parse_at(&mut self, input: &str, start: Pos) -> Script {
        let mut ts = TokenStream::scan(input, start);
        match self.parse_script(&mut ts) {
            Ok(script) => script,
            Err(e) => {
                let pos = e.pos;
                self.violations.push(Violation::new(
                    Rule::SyntaxError,
                    e.message,
                    Span::new(pos, ts.pos()),
                ));
                Script { items: Vec::new(), span: Span::new(start, ts.pos()) }
            }
        }
    }

    fn parse_script(&mut self, ts: &mut TokenStream) -> Result<Script, TclSyntaxError> {
        let pos = ts.pos();
        let mut items: Vec<ScriptItem> = Vec::new();

        loop {
            // strip whitespace at start of command
            while matches!(ts.token_type(), TokenType::Ws | TokenType::BackslashNewline) {
                ts.advance();
            }

            if ts.at_eof() {
                if self.cmd_sub {
                    return Err(TclSyntaxError::new(
                        format!(
                            "reached end of file without finding end of command \
                             substitution starting at {pos}"
                        ),
                        pos,
                    ));
                }
                break;
            }

            if ts.token_type() == TokenType::Hash {
                let comment = self.parse_comment(ts);
                if let Some(ScriptItem::Command(prev)) = items.last_mut() {
                    if prev.span.end.line == comment.span.start.line {
                        prev.trailing_comment = true;
                    }
                }
                items.push(ScriptItem::Comment(comment));
            } else {
                match self.parse_command(ts) {
                    Ok(Some(command)) => items.push(ScriptItem::Command(command)),
                    Ok(None) => {}
                    Err(e) => {
                        let err_pos = e.pos;
                        self.violations.push(Violation::new(
                            Rule::SyntaxError,
                            e.message,
                            Span::new(err_pos, ts.pos()),
                        ));
                        self.recover(ts);
                        continue;
                    }
                }
            }

            // in command sub mode, a script is terminated by ]
            if self.cmd_sub && ts.token_type() == TokenType::RBracket {
                return Ok(Script { items, span: Span::new(pos, ts.pos()) });
            }

            match ts.token_type() {
                TokenType::Eof => {}
                TokenType::Newline | TokenType::Semi => ts.advance(),
                _ => {
                    let err_pos = ts.pos();
                    let token_len = ts.value().chars().count();
                    self.violations.push(Violation::new(
                        Rule::SyntaxError,
                        format!("expected newline or semicolon, got '{}'", ts.value()),
                        Span::new(err_pos, Pos::new(err_pos.line, err_pos.col + token_len)),
                    ));
                    self.recover(ts);
                }
            }
        }

        Ok(Script { items, span: Span::new(pos, ts.pos()) })
    }

    /// Skip tokens until the next command separator so parsing can continue
    /// after a recoverable error.
    fn recover(&mut self, ts: &mut TokenStream) {
        loop {
            match ts.token_type() {
                TokenType::Eof => break,
                TokenType::Newline | TokenType::Semi => {
                    ts.advance();
                    break;
                }
                TokenType::RBracket if self.cmd_sub => break,
                _ => ts.advance(),
            }
        }
    }

    fn parse_comment(&mut self, ts: &mut TokenStream) -> Comment {
        let pos = ts.pos();
        ts.advance(); // Hash

        let mut text = String::new();
        while !matches!(ts.token_type(), TokenType::Newline | TokenType::Eof) {
            text.push_str(ts.value());
            ts.advance();
        }

        Comment { text, span: Span::new(pos, ts.pos()) }
    }

    fn parse_command(&mut self, ts: &mut TokenStream) -> Result<Option<Command>, TclSyntaxError> {
        let pos = ts.pos();

        let Some(routine) = self.parse_word(ts)? else {
            return Ok(None);
        };

        let mut args = Vec::new();
        loop {
            if !matches!(ts.token_type(), TokenType::Ws | TokenType::BackslashNewline) {
                break;
            }
            while matches!(ts.token_type(), TokenType::Ws | TokenType::BackslashNewline) {
                ts.advance();
            }
            match self.parse_word(ts)? {
                Some(word) => args.push(word),
                None => break,
            }
        }

        let args = self.check_command_args(&routine, args, pos);

        let mut words = vec![routine];
        words.extend(args);
        Ok(Some(Command {
            words,
            span: Span::new(pos, ts.pos()),
            trailing_comment: false,
        }))
    }

    /// Look up the command in the registry and run its validator or handler.
    /// Handlers may replace argument words with re-parsed structures; errors
    /// become `command-args` violations anchored at the command.
    fn check_command_args(&mut self, routine: &Word, args: Vec<Word>, cmd_pos: Pos) -> Vec<Word> {
        let Some(name) = routine.contents() else {
            return args;
        };
        let registry = self.registry;
        let Some(entry) = registry.lookup(&name) else {
            return args;
        };

        match entry.check(&name, &args, self) {
            Ok(Some(new_args)) => new_args,
            Ok(None) => args,
            Err(e) => {
                let end = args.last().map_or(routine.span().end, |w| w.span().end);
                self.violations.push(Violation::new(
                    Rule::CommandArgs,
                    e.0,
                    Span::new(cmd_pos, end),
                ));
                args
            }
        }
    }

    pub(crate) fn parse_word(
        &mut self,
        ts: &mut TokenStream,
    ) -> Result<Option<Word>, TclSyntaxError> {
        match ts.token_type() {
            TokenType::ArgExpansion => Ok(Some(self.parse_arg_expansion(ts)?)),
            TokenType::LBrace => Ok(Some(self.parse_braced_word(ts)?)),
            TokenType::Quote => Ok(Some(self.parse_quoted_word(ts)?)),
            _ => self.parse_bare_word(ts),
        }
    }

    fn parse_arg_expansion(&mut self, ts: &mut TokenStream) -> Result<Word, TclSyntaxError> {
        let pos = ts.pos();
        ts.advance(); // {*}

        // {*} is just a braced word holding * when nothing follows it
        let standalone = matches!(
            ts.token_type(),
            TokenType::Ws
                | TokenType::BackslashNewline
                | TokenType::Newline
                | TokenType::Semi
                | TokenType::Eof
        ) || (self.cmd_sub && ts.token_type() == TokenType::RBracket);
        if standalone {
            return Ok(Word::Braced(BracedWord {
                text: "*".into(),
                span: Span::new(pos, ts.pos()),
            }));
        }

        match self.parse_word(ts)? {
            Some(word) => Ok(Word::ArgExpansion(ArgExpansion {
                word: Box::new(word),
                span: Span::new(pos, ts.pos()),
            })),
            None => Ok(Word::Braced(BracedWord {
                text: "*".into(),
                span: Span::new(pos, ts.pos()),
            })),
        }
    }

    pub(crate) fn parse_braced_word(&mut self, ts: &mut TokenStream) -> Result<Word, TclSyntaxError> {
        let pos = ts.pos();
        ts.advance(); // LBrace

        let mut text = String::new();
        // position for each brace we still expect to match, for error messages
        let mut expected_braces = vec![pos];
        loop {
            match ts.token_type() {
                TokenType::Eof => {
                    let open = *expected_braces.last().expect("at least one open brace");
                    return Err(TclSyntaxError::new(
                        format!("reached end of file without finding match for brace at {open}"),
                        open,
                    ));
                }
                TokenType::LBrace => {
                    expected_braces.push(ts.pos());
                }
                TokenType::RBrace => {
                    expected_braces.pop();
                    if expected_braces.is_empty() {
                        ts.advance();
                        break;
                    }
                }
                _ => {}
            }
            text.push_str(ts.value());
            ts.advance();
        }

        Ok(Word::Braced(BracedWord { text, span: Span::new(pos, ts.pos()) }))
    }

    pub(crate) fn parse_quoted_word(&mut self, ts: &mut TokenStream) -> Result<Word, TclSyntaxError> {
        let pos = ts.pos();
        ts.advance(); // Quote

        let mut builder = WordBuilder::new();
        loop {
            match ts.token_type() {
                TokenType::Quote => break,
                TokenType::Eof => {
                    return Err(TclSyntaxError::new(
                        format!("reached end of file without finding match for quote at {pos}"),
                        pos,
                    ));
                }
                TokenType::Dollar => self.parse_dollar(ts, &mut builder)?,
                TokenType::LBracket => {
                    let word = self.parse_command_sub(ts)?;
                    builder.add_node(word);
                }
                TokenType::BackslashSub => {
                    builder.add_node(Word::BackslashSub(BackslashSub {
                        text: ts.value().into(),
                        span: Span::new(ts.pos(), ts.peek_pos()),
                    }));
                    ts.advance();
                }
                _ => {
                    builder.add_tok(ts);
                    ts.advance();
                }
            }
        }

        let parts = builder.resolve(ts.pos());
        ts.advance(); // Quote

        Ok(Word::Quoted(QuotedWord { parts, span: Span::new(pos, ts.pos()) }))
    }

    fn parse_bare_word(&mut self, ts: &mut TokenStream) -> Result<Option<Word>, TclSyntaxError> {
        let pos = ts.pos();
        let mut builder = WordBuilder::new();

        loop {
            let tt = ts.token_type();
            let done = matches!(
                tt,
                TokenType::Ws
                    | TokenType::BackslashNewline
                    | TokenType::Newline
                    | TokenType::Semi
                    | TokenType::Eof
            ) || (self.cmd_sub && tt == TokenType::RBracket);
            if done {
                break;
            }

            match tt {
                TokenType::Dollar => self.parse_dollar(ts, &mut builder)?,
                TokenType::LBracket => {
                    let word = self.parse_command_sub(ts)?;
                    builder.add_node(word);
                }
                TokenType::BackslashSub => {
                    builder.add_node(Word::BackslashSub(BackslashSub {
                        text: ts.value().into(),
                        span: Span::new(ts.pos(), ts.peek_pos()),
                    }));
                    ts.advance();
                }
                _ => {
                    builder.add_tok(ts);
                    ts.advance();
                }
            }
        }

        let mut parts = builder.resolve(ts.pos());
        match parts.len() {
            0 => Ok(None),
            1 => Ok(Some(parts.pop().expect("one part"))),
            _ => Ok(Some(Word::Compound(CompoundWord {
                parts,
                span: Span::new(pos, ts.pos()),
            }))),
        }
    }

    /// `$` either starts a variable substitution or is a literal dollar sign.
    fn parse_dollar(
        &mut self,
        ts: &mut TokenStream,
        builder: &mut WordBuilder,
    ) -> Result<(), TclSyntaxError> {
        let dollar_pos = ts.pos();
        match self.parse_var_sub(ts)? {
            Some(var_sub) => builder.add_node(var_sub),
            None => builder.add_text("$", dollar_pos),
        }
        Ok(())
    }

    pub(crate) fn parse_var_sub(&mut self, ts: &mut TokenStream) -> Result<Option<Word>, TclSyntaxError> {
        let pos = ts.pos();
        ts.advance(); // Dollar

        if ts.token_type() == TokenType::LBrace {
            let brace_pos = ts.pos();
            ts.advance();
            let mut name = String::new();
            while ts.token_type() != TokenType::RBrace {
                if ts.at_eof() {
                    return Err(TclSyntaxError::new(
                        format!(
                            "reached end of file without finding match for brace at {brace_pos}"
                        ),
                        brace_pos,
                    ));
                }
                name.push_str(ts.value());
                ts.advance();
            }
            ts.advance();
            return Ok(Some(Word::VarSub(VarSub {
                name,
                braced: true,
                index: Vec::new(),
                span: Span::new(pos, ts.pos()),
            })));
        }

        let mut name = String::new();
        while matches!(
            ts.token_type(),
            TokenType::AlphaChars | TokenType::NumChars | TokenType::NamespaceSep
        ) {
            name.push_str(ts.value());
            ts.advance();
        }

        if name.is_empty() {
            return Ok(None);
        }

        let mut index = Vec::new();
        if ts.token_type() == TokenType::LParen {
            let paren_pos = ts.pos();
            ts.advance();
            let mut builder = WordBuilder::new();
            while ts.token_type() != TokenType::RParen {
                if ts.at_eof() {
                    return Err(TclSyntaxError::new(
                        format!(
                            "reached end of file without finding match for paren at {paren_pos}"
                        ),
                        paren_pos,
                    ));
                }
                match ts.token_type() {
                    TokenType::Dollar => self.parse_dollar(ts, &mut builder)?,
                    TokenType::LBracket => {
                        let word = self.parse_command_sub(ts)?;
                        builder.add_node(word);
                    }
                    _ => {
                        builder.add_tok(ts);
                        ts.advance();
                    }
                }
            }
            index = builder.resolve(ts.pos());
            ts.advance();
        }

        Ok(Some(Word::VarSub(VarSub {
            name,
            braced: false,
            index,
            span: Span::new(pos, ts.pos()),
        })))
    }

    pub(crate) fn parse_command_sub(&mut self, ts: &mut TokenStream) -> Result<Word, TclSyntaxError> {
        let pos = ts.pos();
        ts.advance(); // LBracket

        let saved_cmd_sub = self.cmd_sub;
        self.cmd_sub = true;
        let result = self.parse_script(ts);
        self.cmd_sub = saved_cmd_sub;
        let mut script = result?;

        debug_assert_eq!(ts.token_type(), TokenType::RBracket);
        ts.advance();

        let span = Span::new(pos, ts.pos());
        script.span = span;
        Ok(Word::CmdSub(CmdSub { script, span }))
    }

    // -------------------------------------------------------------------------
    // Entry points for command handlers
    // -------------------------------------------------------------------------

    /// Re-parse an argument word as a script. The word must have statically
    /// known contents; a word produced by substitution is ambiguous.
    pub fn parse_script_arg(&mut self, word: &Word) -> Result<Word, CommandArgError> {
        let Some(text) = word.contents() else {
            return Err(CommandArgError::new("ambiguous script argument"));
        };
        let delim = word_delim(word);
        let mut ts = TokenStream::scan(&text, word.contents_pos());

        let saved_cmd_sub = self.cmd_sub;
        self.cmd_sub = false;
        let result = self.parse_script(&mut ts);
        self.cmd_sub = saved_cmd_sub;

        let script = result
            .map_err(|e| CommandArgError::new(format!("invalid script argument: {}", e.message)))?;
        Ok(Word::Script(ScriptArg { script, delim, text, span: word.span() }))
    }

    /// Re-parse an argument word as an expression. A word produced by
    /// substitution cannot be parsed; it is left as-is and flagged
    /// `unbraced-expr`.
    pub fn parse_expr_arg(&mut self, word: &Word) -> Result<Word, CommandArgError> {
        let Some(text) = word.contents() else {
            self.violations.push(Violation::new(
                Rule::UnbracedExpr,
                "expression with substitutions should be enclosed by braces",
                word.span(),
            ));
            return Ok(word.clone());
        };
        let delim = word_delim(word);
        let parsed = expr::parse_expression(&text, word.contents_pos(), self)
            .map_err(|e| CommandArgError::new(format!("failed to parse expression: {}", e.message)))?;
        Ok(Word::Expr(ExprArg { expr: Box::new(parsed), delim, text, span: word.span() }))
    }

    /// Re-parse an argument word as a Tcl list.
    pub fn parse_list_arg(&mut self, word: &Word) -> Result<ListWord, CommandArgError> {
        let Some(text) = word.contents() else {
            return Err(CommandArgError::new("ambiguous list argument"));
        };
        let mut ts = TokenStream::scan(&text, word.contents_pos());
        let mut items = Vec::new();

        loop {
            while matches!(
                ts.token_type(),
                TokenType::Ws | TokenType::BackslashNewline | TokenType::Newline
            ) {
                ts.advance();
            }
            if ts.at_eof() {
                break;
            }

            match ts.token_type() {
                TokenType::LBrace => {
                    // braced words never substitute, so the regular parse works
                    let item = self.parse_braced_word(&mut ts).map_err(|e| {
                        CommandArgError::new(format!("invalid list: {}", e.message))
                    })?;
                    items.push(item);
                }
                TokenType::Quote => {
                    let quote_pos = ts.pos();
                    ts.advance();
                    let word_pos = ts.pos();
                    let mut contents = String::new();
                    while !matches!(ts.token_type(), TokenType::Quote | TokenType::Eof) {
                        contents.push_str(ts.value());
                        ts.advance();
                    }
                    if ts.at_eof() {
                        return Err(CommandArgError::new(format!(
                            "invalid list: unmatched quote at {quote_pos}"
                        )));
                    }
                    let inner = Word::Bare(BareWord {
                        text: contents,
                        span: Span::new(word_pos, ts.pos()),
                    });
                    ts.advance();
                    items.push(Word::Quoted(QuotedWord {
                        parts: vec![inner],
                        span: Span::new(quote_pos, ts.pos()),
                    }));
                }
                _ => {
                    let pos = ts.pos();
                    let mut contents = String::new();
                    while !matches!(
                        ts.token_type(),
                        TokenType::Ws
                            | TokenType::BackslashNewline
                            | TokenType::Newline
                            | TokenType::Eof
                    ) {
                        contents.push_str(ts.value());
                        ts.advance();
                    }
                    items.push(Word::Bare(BareWord {
                        text: contents,
                        span: Span::new(pos, ts.pos()),
                    }));
                }
            }
        }

        Ok(ListWord { items, text, span: word.span() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{CommandRegistry, Dialect};

    fn parse(input: &str) -> (Script, Vec<Violation>) {
        let registry = CommandRegistry::new(Dialect::Tcl);
        let mut parser = Parser::new(&registry);
        let tree = parser.parse(input);
        (tree, parser.violations)
    }

    fn pretty(input: &str) -> String {
        let (tree, violations) = parse(input);
        assert!(violations.is_empty(), "unexpected violations: {violations:?}");
        tree.pretty()
    }

    #[test]
    fn test_null() {
        assert_eq!(pretty(""), "Script()");
    }

    #[test]
    fn test_simple_command() {
        assert_eq!(
            pretty("puts hello"),
            r#"Script(Command(BareWord("puts"), BareWord("hello")))"#
        );
    }

    #[test]
    fn test_escaped_brace() {
        assert_eq!(
            pretty(r"puts {Dinosaur dan\} {asdf}}"),
            r#"Script(Command(BareWord("puts"), BracedWord("Dinosaur dan\\} {asdf}")))"#
        );
    }

    #[test]
    fn test_comments() {
        let source = "# lonely comment\nputs \"hello\"; # comment after command\n";
        let (tree, violations) = parse(source);
        assert!(violations.is_empty());
        assert_eq!(tree.items.len(), 3);
        let ScriptItem::Comment(first) = &tree.items[0] else {
            panic!("expected comment");
        };
        assert_eq!(first.text, " lonely comment");
        let ScriptItem::Command(command) = &tree.items[1] else {
            panic!("expected command");
        };
        assert!(command.trailing_comment);
        let ScriptItem::Comment(inline) = &tree.items[2] else {
            panic!("expected comment");
        };
        assert_eq!(inline.text, " comment after command");
    }

    #[test]
    fn test_comment_continuation() {
        // a backslash-newline continues a comment; an escaped backslash
        // does not
        let source = "# multiline \\\ncomment\n# over \\\\\nputs hi\n";
        let (tree, _) = parse(source);
        assert_eq!(tree.items.len(), 3);
        let ScriptItem::Comment(first) = &tree.items[0] else {
            panic!("expected comment");
        };
        assert_eq!(first.text, " multiline \\\ncomment");
        let ScriptItem::Comment(second) = &tree.items[1] else {
            panic!("expected comment");
        };
        assert_eq!(second.text, " over \\\\");
    }

    #[test]
    fn test_hash_not_at_command_start() {
        assert_eq!(
            pretty("puts a#b"),
            r##"Script(Command(BareWord("puts"), BareWord("a#b")))"##
        );
    }

    #[test]
    fn test_proc_in_proc() {
        let source = "proc proc_in_proc {} {\n  proc asdf {} {\n    puts \"Hello world\"\n  }\n}";
        assert_eq!(
            pretty(source),
            concat!(
                r#"Script(Command(BareWord("proc"), BareWord("proc_in_proc"), List(), "#,
                r#"Script(Command(BareWord("proc"), BareWord("asdf"), List(), "#,
                r#"Script(Command(BareWord("puts"), QuotedWord(BareWord("Hello world"))))))))"#
            )
        );

        let (tree, _) = parse(source);
        let ScriptItem::Command(outer) = &tree.items[0] else { panic!() };
        assert_eq!(outer.span.start.line, 1);
        let Word::Script(outer_body) = &outer.words[3] else { panic!() };
        let ScriptItem::Command(inner) = &outer_body.script.items[0] else { panic!() };
        assert_eq!(inner.span.start.line, 2);
        let Word::Script(inner_body) = &inner.words[3] else { panic!() };
        let ScriptItem::Command(puts) = &inner_body.script.items[0] else { panic!() };
        assert_eq!(puts.span.start.line, 3);
    }

    #[test]
    fn test_arg_expansion() {
        assert_eq!(
            pretty("puts {*}{foo bar baz}; {*}  "),
            concat!(
                r#"Script(Command(BareWord("puts"), ArgExpansion(BracedWord("foo bar baz"))), "#,
                r#"Command(BracedWord("*")))"#
            )
        );
    }

    #[test]
    fn test_weird_code_block() {
        // The } that appears to be in a comment actually terminates the
        // body of the proc.
        let source = "proc foo {} {\n    # bar }\n    puts baz\n}";
        assert_eq!(
            pretty(source),
            concat!(
                r#"Script(Command(BareWord("proc"), BareWord("foo"), List(), "#,
                r#"Script(Comment(" bar "))), "#,
                r#"Command(BareWord("puts"), BareWord("baz")), "#,
                r#"Command(BareWord("}")))"#
            )
        );
    }

    #[test]
    fn test_var_sub() {
        assert_eq!(
            pretty("puts \"Hello $name\""),
            r#"Script(Command(BareWord("puts"), QuotedWord(BareWord("Hello "), VarSub("name"))))"#
        );
        assert_eq!(
            pretty("puts prefix-$suffix"),
            r#"Script(Command(BareWord("puts"), CompoundWord(BareWord("prefix-"), VarSub("suffix"))))"#
        );
        assert_eq!(
            pretty("puts $hElLo__h0w::areyou:::"),
            r#"Script(Command(BareWord("puts"), VarSub("hElLo__h0w::areyou:::")))"#
        );
        assert_eq!(
            pretty("puts $:"),
            r#"Script(Command(BareWord("puts"), BareWord("$:")))"#
        );
        assert_eq!(
            pretty("puts ${as\"{]$l}"),
            r#"Script(Command(BareWord("puts"), VarSub("as\"{]$l")))"#
        );
    }

    #[test]
    fn test_fancy_var_sub() {
        assert_eq!(
            pretty("$name([calculate index]-middle-$suffix)"),
            concat!(
                r#"Script(Command(VarSub("name", "#,
                r#"CommandSub(Command(BareWord("calculate"), BareWord("index"))), "#,
                r#"BareWord("-middle-"), VarSub("suffix"))))"#
            )
        );
    }

    #[test]
    fn test_command_sub() {
        assert_eq!(
            pretty(r#""hello [puts {[} [nested \] command]]""#),
            concat!(
                r#"Script(Command(QuotedWord(BareWord("hello "), "#,
                r#"CommandSub(Command(BareWord("puts"), BracedWord("["), "#,
                r#"CommandSub(Command(BareWord("nested"), BackslashSub("\\]"), BareWord("command"))))))))"#
            )
        );
    }

    #[test]
    fn test_weird_words() {
        assert_eq!(
            pretty(r#"puts "hello {{}""#),
            r#"Script(Command(BareWord("puts"), QuotedWord(BareWord("hello {{}"))))"#
        );
        assert_eq!(
            pretty(r#"puts h"llo"#),
            r#"Script(Command(BareWord("puts"), BareWord("h\"llo")))"#
        );
        assert_eq!(
            pretty("puts h}{llo"),
            r#"Script(Command(BareWord("puts"), BareWord("h}{llo")))"#
        );
    }

    #[test]
    fn test_multiline_quoted_word() {
        // The backslash-newline stays in the word text verbatim.
        let source = "puts \"Multiline \\\n    Word\"";
        assert_eq!(
            pretty(source),
            r#"Script(Command(BareWord("puts"), QuotedWord(BareWord("Multiline \\\n    Word"))))"#
        );
    }

    #[test]
    fn test_multiline_braces() {
        let source = "if {1} {\n    cmd arg1 \\\n        arg2 \\\n        arg3\n    }";
        assert_eq!(
            pretty(source),
            concat!(
                r#"Script(Command(BareWord("if"), BracedExpression(BareWord("1")), "#,
                r#"Script(Command(BareWord("cmd"), BareWord("arg1"), BareWord("arg2"), BareWord("arg3")))))"#
            )
        );
    }

    #[test]
    fn test_line_numbers() {
        let source = "# line 1\n# line 2\nif {1} {\n    # line 4\n}\n# line 6\n";
        let (tree, _) = parse(source);
        assert_eq!(tree.items[0].span().start, Pos::new(1, 1));
        assert_eq!(tree.items[1].span().start, Pos::new(2, 1));
        let ScriptItem::Command(if_cmd) = &tree.items[2] else { panic!() };
        let Word::Script(body) = &if_cmd.words[2] else { panic!() };
        assert_eq!(body.script.items[0].span().start, Pos::new(4, 5));
        assert_eq!(tree.items[3].span().start, Pos::new(6, 1));
        assert_eq!(tree.span.end, Pos::new(7, 1));
    }

    #[test]
    fn test_syntax_error_recovery() {
        let (tree, violations) = parse("puts \"hello");
        assert!(tree.items.is_empty());
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].rule, Rule::SyntaxError);
        assert_eq!(violations[0].span.start, Pos::new(1, 6));

        // parsing resumes at the next separator
        let (tree, violations) = parse("puts {a}b\nputs ok\n");
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].rule, Rule::SyntaxError);
        assert_eq!(tree.items.len(), 2);
    }

    #[test]
    fn test_unterminated_brace() {
        let (_, violations) = parse("puts {hello");
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].rule, Rule::SyntaxError);
        assert!(violations[0].message.contains("brace at 1:6"));
    }

    #[test]
    fn test_unterminated_command_sub() {
        let (_, violations) = parse("puts [foo");
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.contains("command substitution"));
    }

    #[test]
    fn test_switch() {
        let source = "switch -regexp $foo { \"a\" {\n        puts \"a\"\n    }\n    \"b\" {\n        puts \"b\"\n    }\n}";
        assert_eq!(
            pretty(source),
            concat!(
                r#"Script(Command(BareWord("switch"), BareWord("-regexp"), VarSub("foo"), "#,
                r#"List(QuotedWord(BareWord("a")), "#,
                r#"Script(Command(BareWord("puts"), QuotedWord(BareWord("a")))), "#,
                r#"QuotedWord(BareWord("b")), "#,
                r#"Script(Command(BareWord("puts"), QuotedWord(BareWord("b")))))))"#
            )
        );

        // positions of list items come from the original source
        let (tree, _) = parse(source);
        let ScriptItem::Command(switch) = &tree.items[0] else { panic!() };
        let Word::List(list) = &switch.words[3] else { panic!() };
        assert_eq!(list.items[0].span().start, Pos::new(1, 23));
        let Word::Script(body) = &list.items[1] else { panic!() };
        assert_eq!(body.script.items[0].span().start.line, 2);
    }

    #[test]
    fn test_other_switch() {
        assert_eq!(
            pretty(r#"switch $switchopt -- $foo "a" "puts a" "b" "puts b""#),
            concat!(
                r#"Script(Command(BareWord("switch"), VarSub("switchopt"), BareWord("--"), "#,
                r#"VarSub("foo"), QuotedWord(BareWord("a")), "#,
                r#"Script(Command(BareWord("puts"), BareWord("a"))), "#,
                r#"QuotedWord(BareWord("b")), "#,
                r#"Script(Command(BareWord("puts"), BareWord("b")))))"#
            )
        );
    }

    #[test]
    fn test_puts_blank() {
        assert_eq!(
            pretty(r#"puts """#),
            r#"Script(Command(BareWord("puts"), QuotedWord()))"#
        );
    }

    #[test]
    fn test_eval() {
        assert_eq!(
            pretty("eval {puts {a b c}}"),
            r#"Script(Command(BareWord("eval"), Script(Command(BareWord("puts"), BracedWord("a b c")))))"#
        );
    }

    #[test]
    fn test_eval_joins_bare_args() {
        assert_eq!(
            pretty("eval set x 1"),
            r#"Script(Command(BareWord("eval"), Script(Command(BareWord("set"), BareWord("x"), BareWord("1")))))"#
        );
    }

    #[test]
    fn test_dict_for() {
        assert_eq!(
            pretty("dict for {key value} mydict {\n    puts \"$key $value\"\n}"),
            concat!(
                r#"Script(Command(BareWord("dict"), BareWord("for"), BracedWord("key value"), "#,
                r#"BareWord("mydict"), "#,
                r#"Script(Command(BareWord("puts"), QuotedWord(VarSub("key"), BareWord(" "), VarSub("value"))))))"#
            )
        );
    }

    #[test]
    fn test_namespace_eval_lines() {
        let (tree, _) = parse("namespace eval my_namespace {\n    puts \"asdf\"\n}");
        let ScriptItem::Command(ns) = &tree.items[0] else { panic!() };
        let Word::Script(body) = &ns.words[3] else { panic!() };
        assert_eq!(body.script.items[0].span().start.line, 2);
    }

    #[test]
    fn test_recursive_parse_in_cmd_sub() {
        assert_eq!(
            pretty("[catch {analyze_power_grid -net $net -corner $corner} err]"),
            concat!(
                r#"Script(Command(CommandSub(Command(BareWord("catch"), "#,
                r#"Script(Command(BareWord("analyze_power_grid"), BareWord("-net"), VarSub("net"), "#,
                r#"BareWord("-corner"), VarSub("corner"))), BareWord("err")))))"#
            )
        );
    }

    #[test]
    fn test_cmd_args_checked_in_cmd_sub() {
        let (_, violations) = parse("[puts]");
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].rule, Rule::CommandArgs);
    }

    #[test]
    fn test_parse_list() {
        let registry = CommandRegistry::new(Dialect::Tcl);
        let mut parser = Parser::new(&registry);
        let word = Word::Braced(BracedWord {
            text: "alpha beta gamma".into(),
            span: Span::new(Pos::new(1, 1), Pos::new(1, 18)),
        });
        let list = parser.parse_list_arg(&word).expect("valid list");
        let texts: Vec<Option<String>> = list.items.iter().map(|w| w.contents()).collect();
        assert_eq!(
            texts,
            vec![Some("alpha".into()), Some("beta".into()), Some("gamma".into())]
        );
        // items start one column into the braced word
        assert_eq!(list.items[0].span().start, Pos::new(1, 2));
    }

    #[test]
    fn test_expr_simple() {
        // a single word without substitutions parses as an expression even
        // without braces
        assert_eq!(
            pretty(r#"expr "5""#),
            r#"Script(Command(BareWord("expr"), Expression(BareWord("5"))))"#
        );
    }

    #[test]
    fn test_expr_sub_brace() {
        assert_eq!(
            pretty("expr {int($foo)}"),
            r#"Script(Command(BareWord("expr"), BracedExpression(Function("int", VarSub("foo")))))"#
        );
    }

    #[test]
    fn test_expr_sub_no_brace() {
        // not wrapped in braces, so it silently parses as normal Tcl; a
        // separate lint check flags it
        let registry = CommandRegistry::new(Dialect::Tcl);
        let mut parser = Parser::new(&registry);
        let tree = parser.parse("expr int($foo)");
        assert_eq!(
            tree.pretty(),
            r#"Script(Command(BareWord("expr"), CompoundWord(BareWord("int("), VarSub("foo"), BareWord(")"))))"#
        );
    }

    #[test]
    fn test_expr_precedence() {
        assert_eq!(
            pretty("expr {$x == $x && $x + 1 != $x}"),
            concat!(
                r#"Script(Command(BareWord("expr"), BracedExpression("#,
                r#"BinaryOp(BinaryOp(VarSub("x"), "==", VarSub("x")), "&&", "#,
                r#"BinaryOp(BinaryOp(VarSub("x"), "+", BareWord("1")), "!=", VarSub("x"))))))"#
            )
        );
    }

    #[test]
    fn test_expr_newline() {
        let source = "expr {\"conditional\" ? $::env(FOO) : \\\n    {foo}}";
        assert_eq!(
            pretty(source),
            concat!(
                r#"Script(Command(BareWord("expr"), BracedExpression("#,
                r#"TernaryOp(QuotedWord(BareWord("conditional")), "#,
                r#"VarSub("::env", BareWord("FOO")), BracedWord("foo")))))"#
            )
        );
    }

    #[test]
    fn test_expr_no_spaces_binop() {
        assert_eq!(
            pretty("expr {1-1}; expr {1eq1};"),
            concat!(
                r#"Script(Command(BareWord("expr"), BracedExpression(BinaryOp(BareWord("1"), "-", BareWord("1")))), "#,
                r#"Command(BareWord("expr"), BracedExpression(BinaryOp(BareWord("1"), "eq", BareWord("1")))))"#
            )
        );
    }

    #[test]
    fn test_subparsed_positions() {
        let source = "if {1} pwd\nif 1 {\n    pwd\n}";
        let (tree, _) = parse(source);

        let ScriptItem::Command(if0) = &tree.items[0] else { panic!() };
        let Word::Expr(expr0) = &if0.words[1] else { panic!() };
        assert_eq!(expr0.expr.span().start, Pos::new(1, 5));
        let Word::Script(body0) = &if0.words[2] else { panic!() };
        assert_eq!(body0.script.items[0].span().start, Pos::new(1, 8));

        let ScriptItem::Command(if1) = &tree.items[1] else { panic!() };
        let Word::Expr(expr1) = &if1.words[1] else { panic!() };
        assert_eq!(expr1.expr.span().start, Pos::new(2, 4));
        let Word::Script(body1) = &if1.words[2] else { panic!() };
        assert_eq!(body1.script.items[0].span().start, Pos::new(3, 5));
    }

    #[test]
    fn test_ambiguous_script_argument() {
        let (tree, violations) = parse("if $cond $body");
        let command_args: Vec<_> =
            violations.iter().filter(|v| v.rule == Rule::CommandArgs).collect();
        assert_eq!(command_args.len(), 1);
        assert!(command_args[0].message.contains("ambiguous script argument"));

        // the words stay unstructured
        let ScriptItem::Command(if_cmd) = &tree.items[0] else { panic!() };
        assert!(matches!(if_cmd.words[2], Word::VarSub(_)));
    }

    #[test]
    fn test_arg_expansion_disables_count() {
        // $foo may be a list with two items, which is legal
        let (_, violations) = parse("rename {*}$foo");
        assert!(violations.is_empty());
    }

    #[test]
    fn test_arg_expansion_in_final_argument() {
        let (_, violations) = parse("puts a {*}$x");
        assert!(violations.iter().all(|v| v.rule != Rule::CommandArgs));
    }

    #[test]
    fn test_too_many_args() {
        let (_, violations) = parse("puts a b c d e");
        assert_eq!(violations.len(), 1);
        assert_eq!(
            violations[0].message,
            "too many args for puts: got 5, expected no more than 3"
        );
    }

    #[test]
    fn test_unknown_command_unchecked() {
        let (_, violations) = parse("frobnicate a b c d e f g");
        assert!(violations.is_empty());
    }
}

//! Expression Sub-Parser
//!
//! Parses the `expr` sub-language used by `expr`, `if`, `while`, and `for`.
//! Operator precedence follows Tcl's `expr` man page; the implementation is
//! a Pratt parser driven by a binding-power table instead of one function
//! per precedence level.
//!
//! Operands are left as word nodes (numbers and barewords, `$var`, `[cmd]`,
//! quoted and braced words); only the operator structure is interpreted.

use crate::ast::types::{
    BinaryOp, BracedWord, Expr, FunctionCall, Operator, ParenExpr, Pos, Span, TernaryOp, UnaryOp,
    Word,
};
use crate::parser::lexer::{TokenStream, TokenType};
use crate::parser::parser::Parser;
use crate::parser::types::TclSyntaxError;

// Binding powers derived from Tcl's precedence levels; higher binds tighter.
// `**` and `? :` are right-associative.
const BP_TERNARY: u8 = 2;
const BP_UNARY: u8 = 28;

fn binary_binding(op: &str) -> Option<(u8, u8)> {
    let bp = match op {
        "**" => return Some((26, 25)),
        "*" | "/" | "%" => 24,
        "+" | "-" => 22,
        "<<" | ">>" => 20,
        "<" | "<=" | ">" | ">=" => 18,
        "eq" | "ne" | "in" | "ni" => 16,
        "==" | "!=" => 14,
        "&" => 12,
        "^" => 10,
        "|" => 8,
        "&&" => 6,
        "||" => 4,
        _ => return None,
    };
    Some((bp, bp + 1))
}

/// Parse `input` as a complete expression. `start` locates the first
/// character in the enclosing document so spans line up with the source.
pub fn parse_expression(
    input: &str,
    start: Pos,
    parser: &mut Parser,
) -> Result<Expr, TclSyntaxError> {
    let mut ts = TokenStream::scan(input, start);
    let mut ep = ExprParser { ts: &mut ts, parser };
    ep.skip_ws();
    if ep.ts.at_eof() {
        return Err(TclSyntaxError::new("empty expression", start));
    }
    let expr = ep.parse_bp(0)?;
    ep.skip_ws();
    if !ep.ts.at_eof() {
        return Err(TclSyntaxError::new(
            format!("unexpected '{}' in expression", ep.ts.value()),
            ep.ts.pos(),
        ));
    }
    Ok(expr)
}

struct ExprParser<'a, 'p, 'r> {
    ts: &'a mut TokenStream,
    parser: &'p mut Parser<'r>,
}

impl ExprParser<'_, '_, '_> {
    fn skip_ws(&mut self) {
        while matches!(
            self.ts.token_type(),
            TokenType::Ws | TokenType::BackslashNewline | TokenType::Newline
        ) {
            self.ts.advance();
        }
    }

    fn parse_bp(&mut self, min_bp: u8) -> Result<Expr, TclSyntaxError> {
        self.skip_ws();
        let mut lhs = self.parse_primary()?;

        loop {
            self.skip_ws();
            let Some(op_text) = self.peek_operator() else {
                break;
            };

            if op_text == "?" {
                if BP_TERNARY < min_bp {
                    break;
                }
                let question = self.consume_operator(&op_text);
                let then_expr = self.parse_bp(0)?;
                self.skip_ws();
                if !(self.ts.token_type() == TokenType::Char && self.ts.value() == ":") {
                    return Err(TclSyntaxError::new(
                        "expected ':' in conditional expression",
                        self.ts.pos(),
                    ));
                }
                let colon = Operator {
                    text: ":".into(),
                    span: Span::new(self.ts.pos(), self.ts.peek_pos()),
                };
                self.ts.advance();
                let else_expr = self.parse_bp(BP_TERNARY - 1)?;
                let span = Span::new(lhs.span().start, else_expr.span().end);
                lhs = Expr::Ternary(TernaryOp {
                    cond: Box::new(lhs),
                    question,
                    then_expr: Box::new(then_expr),
                    colon,
                    else_expr: Box::new(else_expr),
                    span,
                });
                continue;
            }

            let Some((l_bp, r_bp)) = binary_binding(&op_text) else {
                break;
            };
            if l_bp < min_bp {
                break;
            }

            let op = self.consume_operator(&op_text);
            let rhs = self.parse_bp(r_bp)?;
            let span = Span::new(lhs.span().start, rhs.span().end);
            lhs = Expr::Binary(BinaryOp {
                op,
                left: Box::new(lhs),
                right: Box::new(rhs),
                span,
            });
        }

        Ok(lhs)
    }

    /// Returns the operator text starting at the current token, if any.
    /// Multi-character operators only match when their tokens are adjacent.
    fn peek_operator(&self) -> Option<String> {
        match self.ts.token_type() {
            TokenType::AlphaChars => {
                let v = self.ts.value();
                if matches!(v, "eq" | "ne" | "in" | "ni") {
                    Some(v.to_string())
                } else {
                    None
                }
            }
            TokenType::Star => {
                if self.ts.peek_type() == TokenType::Star {
                    Some("**".into())
                } else {
                    Some("*".into())
                }
            }
            TokenType::Char => {
                let c = self.ts.value();
                let next = if self.ts.peek_type() == TokenType::Char {
                    self.ts.peek_value()
                } else {
                    ""
                };
                let pair = format!("{c}{next}");
                match pair.as_str() {
                    "&&" | "||" | "==" | "!=" | "<=" | ">=" | "<<" | ">>" => Some(pair),
                    _ => match c {
                        "&" | "|" | "^" | "<" | ">" | "+" | "-" | "/" | "%" | "?" => {
                            Some(c.to_string())
                        }
                        _ => None,
                    },
                }
            }
            _ => None,
        }
    }

    fn consume_operator(&mut self, text: &str) -> Operator {
        let pos = self.ts.pos();
        let mut taken = 0;
        while taken < text.chars().count() {
            taken += self.ts.value().chars().count();
            self.ts.advance();
        }
        Operator {
            text: text.to_string(),
            span: Span::new(pos, Pos::new(pos.line, pos.col + text.chars().count())),
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, TclSyntaxError> {
        self.skip_ws();
        let pos = self.ts.pos();

        match self.ts.token_type() {
            TokenType::Dollar => {
                let var = self.parser.parse_var_sub(self.ts)?;
                match var {
                    Some(word) => Ok(Expr::Word(word)),
                    None => Err(TclSyntaxError::new("expected variable name after '$'", pos)),
                }
            }
            TokenType::LBracket => Ok(Expr::Word(self.parser.parse_command_sub(self.ts)?)),
            TokenType::Quote => Ok(Expr::Word(self.parser.parse_quoted_word(self.ts)?)),
            TokenType::LBrace => Ok(Expr::Word(self.parser.parse_braced_word(self.ts)?)),
            TokenType::ArgExpansion => {
                // {*} is just a braced word holding * inside an expression
                self.ts.advance();
                Ok(Expr::Word(Word::Braced(BracedWord {
                    text: "*".into(),
                    span: Span::new(pos, self.ts.pos()),
                })))
            }
            TokenType::LParen => {
                self.ts.advance();
                let inner = self.parse_bp(0)?;
                self.skip_ws();
                if self.ts.token_type() != TokenType::RParen {
                    return Err(TclSyntaxError::new(
                        format!("expected ')' to match paren at {pos}"),
                        pos,
                    ));
                }
                self.ts.advance();
                Ok(Expr::Paren(ParenExpr {
                    inner: Box::new(inner),
                    span: Span::new(pos, self.ts.pos()),
                }))
            }
            TokenType::Char if matches!(self.ts.value(), "-" | "+" | "!" | "~") => {
                let op = Operator {
                    text: self.ts.value().to_string(),
                    span: Span::new(pos, self.ts.peek_pos()),
                };
                self.ts.advance();
                let operand = self.parse_bp(BP_UNARY)?;
                let span = Span::new(pos, operand.span().end);
                Ok(Expr::Unary(UnaryOp { op, operand: Box::new(operand), span }))
            }
            TokenType::NumChars => self.parse_number(),
            TokenType::Char if self.ts.value() == "." && self.ts.peek_type() == TokenType::NumChars => {
                self.parse_number()
            }
            TokenType::AlphaChars | TokenType::NamespaceSep => self.parse_name(),
            _ => Err(TclSyntaxError::new(
                format!("unexpected '{}' in expression", self.ts.value()),
                pos,
            )),
        }
    }

    /// Numeric literal: decimal, float (`1.5`, `.5`, `1e9`), or hex (`0xff`).
    fn parse_number(&mut self) -> Result<Expr, TclSyntaxError> {
        let pos = self.ts.pos();
        let mut text = String::new();

        if self.ts.token_type() == TokenType::NumChars {
            text.push_str(self.ts.value());
            self.ts.advance();

            // hex: "0" immediately followed by x...
            if text == "0"
                && self.ts.token_type() == TokenType::AlphaChars
                && matches!(self.ts.value().chars().next(), Some('x' | 'X'))
            {
                while matches!(self.ts.token_type(), TokenType::AlphaChars | TokenType::NumChars)
                    && self.ts.value().chars().all(|c| c.is_ascii_hexdigit() || c == 'x' || c == 'X')
                {
                    text.push_str(self.ts.value());
                    self.ts.advance();
                }
                return Ok(self.number_word(text, pos));
            }
        }

        if self.ts.token_type() == TokenType::Char
            && self.ts.value() == "."
            && self.ts.peek_type() == TokenType::NumChars
        {
            text.push('.');
            self.ts.advance();
            text.push_str(self.ts.value());
            self.ts.advance();
        }

        // exponent without sign, e.g. 1e9
        if self.ts.token_type() == TokenType::AlphaChars
            && matches!(self.ts.value(), "e" | "E")
            && self.ts.peek_type() == TokenType::NumChars
        {
            text.push_str(self.ts.value());
            self.ts.advance();
            text.push_str(self.ts.value());
            self.ts.advance();
        }

        Ok(self.number_word(text, pos))
    }

    fn number_word(&self, text: String, pos: Pos) -> Expr {
        Expr::Word(Word::Bare(crate::ast::types::BareWord {
            text,
            span: Span::new(pos, self.ts.pos()),
        }))
    }

    /// A bareword operand (`true`, `inf`) or a function call like
    /// `max($a, $b)` or `tcl::mathfunc::min(1, 2)`.
    fn parse_name(&mut self) -> Result<Expr, TclSyntaxError> {
        let pos = self.ts.pos();
        let mut name = String::new();
        while matches!(
            self.ts.token_type(),
            TokenType::AlphaChars | TokenType::NumChars | TokenType::NamespaceSep
        ) {
            name.push_str(self.ts.value());
            self.ts.advance();
        }
        let name_end = self.ts.pos();

        self.skip_ws();
        if self.ts.token_type() != TokenType::LParen {
            return Ok(Expr::Word(Word::Bare(crate::ast::types::BareWord {
                text: name,
                span: Span::new(pos, name_end),
            })));
        }

        let lparen = self.ts.pos();
        self.ts.advance();
        let mut args = Vec::new();
        self.skip_ws();
        if self.ts.token_type() != TokenType::RParen {
            loop {
                args.push(self.parse_bp(0)?);
                self.skip_ws();
                if self.ts.token_type() == TokenType::Char && self.ts.value() == "," {
                    self.ts.advance();
                    continue;
                }
                break;
            }
        }
        if self.ts.token_type() != TokenType::RParen {
            return Err(TclSyntaxError::new(
                format!("expected ')' to close argument list of {name}()"),
                lparen,
            ));
        }
        self.ts.advance();

        Ok(Expr::Function(FunctionCall {
            name,
            name_span: Span::new(pos, name_end),
            lparen,
            args,
            span: Span::new(pos, self.ts.pos()),
        }))
    }
}

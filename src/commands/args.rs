//! Argument-counting and eval-style helpers shared by command validators.

use crate::ast::types::{Pos, ScriptArg, Span, Word, WordDelim};
use crate::parser::parser::Parser;
use crate::parser::types::CommandArgError;

/// Returns the number of arguments in `args`, taking `{*}` into account.
///
/// If the list contains an argument expansion that cannot be statically
/// expanded, the second return value is true and the count is the minimum
/// possible number of arguments. Validators should always use this rather
/// than `args.len()`.
pub fn arg_count(args: &[Word], parser: &mut Parser) -> (usize, bool) {
    let mut count = 0;
    let mut has_arg_expansion = false;

    for arg in args {
        if let Word::ArgExpansion(exp) = arg {
            if exp.word.contents().is_none() {
                has_arg_expansion = true;
                continue;
            }
            match parser.parse_list_arg(&exp.word) {
                Ok(list) => count += list.items.len(),
                Err(_) => has_arg_expansion = true,
            }
        } else {
            count += 1;
        }
    }

    (count, has_arg_expansion)
}

pub fn check_count(
    name: &str,
    min: Option<usize>,
    max: Option<usize>,
    args: &[Word],
    parser: &mut Parser,
) -> Result<Option<Vec<Word>>, CommandArgError> {
    if min.is_none() && max.is_none() {
        return Ok(None);
    }

    let (count, has_arg_expansion) = arg_count(args, parser);

    if !has_arg_expansion && min.is_some() && min == max && count != min.expect("checked") {
        return Err(CommandArgError::new(format!(
            "wrong # of args for {name}: got {count}, expected {}",
            min.expect("checked")
        )));
    }

    if !has_arg_expansion {
        if let Some(min) = min {
            if count < min {
                return Err(CommandArgError::new(format!(
                    "not enough args for {name}: got {count}, expected at least {min}"
                )));
            }
        }
    }

    if let Some(max) = max {
        if count > max {
            return Err(CommandArgError::new(format!(
                "too many args for {name}: got {count}, expected no more than {max}"
            )));
        }
    }

    Ok(None)
}

/// Join eval-style arguments into a single script word.
///
/// The script text is reconstructed with the original whitespace between
/// arguments so positions (and therefore style checks) line up with the
/// source. Multiple braced or quoted arguments cannot be combined this way;
/// each argument word must map to one node for style checking.
pub fn eval_script(
    args: &[Word],
    parser: &mut Parser,
    command: &str,
) -> Result<Vec<Word>, CommandArgError> {
    if args.is_empty() {
        return Err(CommandArgError::new(format!(
            "not enough args for {command}: expected a script"
        )));
    }

    if args.len() == 1 {
        return Ok(vec![parser.parse_script_arg(&args[0])?]);
    }

    if args.iter().any(|a| matches!(a, Word::Quoted(_) | Word::Braced(_))) {
        return Err(CommandArgError::new(format!(
            "unable to parse multiple {command} arguments when one includes a braced \
             or quoted word"
        )));
    }

    let mut text = String::new();
    let mut prev_end: Option<Pos> = None;
    for arg in args {
        let contents = arg.contents().ok_or_else(|| {
            CommandArgError::new(format!(
                "{command} received an argument with a substitution, unable to parse \
                 its arguments"
            ))
        })?;

        if let Some(prev) = prev_end {
            let start = arg.span().start;
            if prev.line != start.line {
                // arguments on separate lines imply a backslash-newline;
                // re-add it so the re-parse sees one command
                for _ in 0..(start.line - prev.line) {
                    text.push_str("\\\n");
                }
                text.push_str(&" ".repeat(start.col.saturating_sub(1)));
            } else {
                text.push_str(&" ".repeat(start.col.saturating_sub(prev.col)));
            }
        }
        text.push_str(&contents);
        prev_end = Some(arg.span().end);
    }

    let start = args[0].span().start;
    let end = args.last().expect("non-empty").span().end;
    let span = Span::new(start, end);
    let mut script = parser.parse_at(&text, start);
    script.span = span;

    Ok(vec![Word::Script(ScriptArg { script, delim: WordDelim::Bare, text, span })])
}

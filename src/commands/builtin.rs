//! Parse-time handling of Tcl's builtin commands.
//!
//! Note that the following commands are not currently supported:
//!
//! - Anything related to TclOO (`my`, `next`, `class`, `copy`, `define`,
//!   `object`, `self`)
//! - Things imported via `package require` (`dde`, `http`, `msgcat`, ...)
//! - Tcl library commands and the `unknown` command
//! - `tcl::mathfunc` / `tcl::mathop` namespaces

use indexmap::IndexMap;

use crate::ast::types::{ListWord, Word};
use crate::commands::args::eval_script;
use crate::commands::{CommandEntry, SubTable};
use crate::parser::parser::Parser;
use crate::parser::types::CommandArgError;

fn exactly(n: usize) -> CommandEntry {
    CommandEntry::Count { min: Some(n), max: Some(n) }
}

fn at_least(n: usize) -> CommandEntry {
    CommandEntry::Count { min: Some(n), max: None }
}

fn at_most(n: usize) -> CommandEntry {
    CommandEntry::Count { min: None, max: Some(n) }
}

fn between(min: usize, max: usize) -> CommandEntry {
    CommandEntry::Count { min: Some(min), max: Some(max) }
}

fn handler(f: crate::commands::Handler) -> CommandEntry {
    CommandEntry::Handler(f)
}

fn sub(entries: Vec<(&str, CommandEntry)>, default: Option<CommandEntry>) -> CommandEntry {
    CommandEntry::Sub(SubTable {
        subs: entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
        default: default.map(Box::new),
    })
}

/// Check a 'code' argument as used by `return` and `try`.
fn check_code(arg: &Word) -> Result<(), CommandArgError> {
    let Some(val) = arg.contents() else {
        return Ok(());
    };

    if val.parse::<i64>().is_ok() {
        return Ok(());
    }
    if matches!(val.as_str(), "ok" | "error" | "return" | "break" | "continue") {
        return Ok(());
    }

    Err(CommandArgError::new(format!(
        "got {val}, expected one of ok, error, return, break, continue, or an integer"
    )))
}

fn after_cmd(args: &[Word], parser: &mut Parser) -> Result<Option<Vec<Word>>, CommandArgError> {
    // ref: https://www.tcl.tk/man/tcl/TclCmd/after.html
    if args.len() <= 1 {
        return Ok(None);
    }
    let mut new_args = vec![args[0].clone()];
    new_args.extend(eval_script(&args[1..], parser, "after")?);
    Ok(Some(new_args))
}

fn after_idle(args: &[Word], parser: &mut Parser) -> Result<Option<Vec<Word>>, CommandArgError> {
    Ok(Some(eval_script(args, parser, "after idle")?))
}

fn apply_cmd(args: &[Word], parser: &mut Parser) -> Result<Option<Vec<Word>>, CommandArgError> {
    // ref: https://www.tcl.tk/man/tcl/TclCmd/apply.html
    if args.is_empty() {
        return Err(CommandArgError::new(
            "not enough args for apply: got 0, expected at least 1",
        ));
    }

    let func_list = parser.parse_list_arg(&args[0])?;
    let list_len = func_list.items.len();
    if !(2..=3).contains(&list_len) {
        return Err(CommandArgError::new(format!(
            "invalid first argument to apply: got list of {list_len} elements, expected 2 or 3"
        )));
    }

    let mut items = func_list.items;
    items[1] = parser.parse_script_arg(&items[1])?;

    let mut new_args = vec![Word::List(ListWord {
        items,
        text: func_list.text,
        span: func_list.span,
    })];
    new_args.extend(args[1..].iter().cloned());
    Ok(Some(new_args))
}

fn catch_cmd(args: &[Word], parser: &mut Parser) -> Result<Option<Vec<Word>>, CommandArgError> {
    if args.is_empty() {
        return Err(CommandArgError::new(
            "not enough args for catch: got 0, expected at least 1",
        ));
    }
    if args.len() > 3 {
        return Err(CommandArgError::new(format!(
            "too many args for catch: got {}, expected no more than 3",
            args.len()
        )));
    }

    let mut new_args = vec![parser.parse_script_arg(&args[0])?];
    new_args.extend(args[1..].iter().cloned());
    Ok(Some(new_args))
}

fn dict_filter(args: &[Word], parser: &mut Parser) -> Result<Option<Vec<Word>>, CommandArgError> {
    // ref: https://www.tcl.tk/man/tcl/TclCmd/dict.html#M8
    if args.len() < 2 {
        return Err(CommandArgError::new(format!(
            "not enough args for 'dict filter': got {}, expected at least 2",
            args.len()
        )));
    }

    let filter_type = args[1].contents();
    if !matches!(filter_type.as_deref(), Some("key" | "script" | "value")) {
        return Err(CommandArgError::new(
            "invalid argument to 'dict filter': expected filter type to be one of key, \
             script, or value",
        ));
    }

    if filter_type.as_deref() == Some("script") {
        if args.len() != 4 {
            return Err(CommandArgError::new(format!(
                "wrong # of args for 'dict filter script': got {}, expected 4",
                args.len()
            )));
        }
        let kv_pair = parser.parse_list_arg(&args[2])?;
        let list_len = kv_pair.items.len();
        if list_len != 2 {
            return Err(CommandArgError::new(format!(
                "invalid argument to 'dict filter': expected list of 2 elements in \
                 second-to-last argument, got {list_len}"
            )));
        }
        let mut new_args = args[0..2].to_vec();
        new_args.push(Word::List(kv_pair));
        new_args.push(parser.parse_script_arg(&args[3])?);
        return Ok(Some(new_args));
    }

    Ok(None)
}

fn dict_map_for(
    name: &str,
    args: &[Word],
    parser: &mut Parser,
) -> Result<Option<Vec<Word>>, CommandArgError> {
    if args.len() != 3 {
        return Err(CommandArgError::new(format!(
            "wrong # of args for '{name}': got {}, expected 3",
            args.len()
        )));
    }

    let mut new_args = args[0..2].to_vec();
    new_args.push(parser.parse_script_arg(&args[2])?);
    Ok(Some(new_args))
}

fn dict_for(args: &[Word], parser: &mut Parser) -> Result<Option<Vec<Word>>, CommandArgError> {
    dict_map_for("dict for", args, parser)
}

fn dict_map(args: &[Word], parser: &mut Parser) -> Result<Option<Vec<Word>>, CommandArgError> {
    dict_map_for("dict map", args, parser)
}

fn dict_update(args: &[Word], parser: &mut Parser) -> Result<Option<Vec<Word>>, CommandArgError> {
    // ref: https://www.tcl.tk/man/tcl/TclCmd/dict.html#M25
    if args.len() < 4 {
        return Err(CommandArgError::new(format!(
            "not enough args for 'dict update': got {}, expected at least 4",
            args.len()
        )));
    }
    if args.len() % 2 != 0 {
        return Err(CommandArgError::new(
            "invalid # of args for 'dict update': expected an even number",
        ));
    }

    let mut new_args = args[..args.len() - 1].to_vec();
    new_args.push(parser.parse_script_arg(args.last().expect("checked"))?);
    Ok(Some(new_args))
}

fn dict_with(args: &[Word], parser: &mut Parser) -> Result<Option<Vec<Word>>, CommandArgError> {
    // ref: https://www.tcl.tk/man/tcl/TclCmd/dict.html#M27
    if args.len() < 2 {
        return Err(CommandArgError::new(format!(
            "not enough args for 'dict with': got {}, expected at least 2",
            args.len()
        )));
    }

    let mut new_args = args[..args.len() - 1].to_vec();
    new_args.push(parser.parse_script_arg(args.last().expect("checked"))?);
    Ok(Some(new_args))
}

fn eval_cmd(args: &[Word], parser: &mut Parser) -> Result<Option<Vec<Word>>, CommandArgError> {
    if args.is_empty() {
        return Err(CommandArgError::new(
            "not enough args for eval: got 0, expected at least 1",
        ));
    }
    Ok(Some(eval_script(args, parser, "eval")?))
}

fn expr_cmd(args: &[Word], parser: &mut Parser) -> Result<Option<Vec<Word>>, CommandArgError> {
    if args.is_empty() {
        return Err(CommandArgError::new(
            "not enough args for expr: got 0, expected at least 1",
        ));
    }

    if args.len() == 1 && args[0].contents().is_some() {
        return Ok(Some(vec![parser.parse_expr_arg(&args[0])?]));
    }

    // Multiple words or words with substitutions are left unstructured; the
    // unbraced-expr check reports them when appropriate.
    Ok(None)
}

fn fileevent_cmd(_args: &[Word], _parser: &mut Parser) -> Result<Option<Vec<Word>>, CommandArgError> {
    Err(CommandArgError::new(
        "argument parsing for 'fileevent' not implemented, script argument will not be \
         checked for violations",
    ))
}

fn for_cmd(args: &[Word], parser: &mut Parser) -> Result<Option<Vec<Word>>, CommandArgError> {
    // ref: https://www.tcl.tk/man/tcl/TclCmd/for.html
    if args.len() != 4 {
        return Err(CommandArgError::new(format!(
            "wrong # of args for for: got {}, expected 4",
            args.len()
        )));
    }

    Ok(Some(vec![
        parser.parse_script_arg(&args[0])?,
        parser.parse_expr_arg(&args[1])?,
        parser.parse_script_arg(&args[2])?,
        parser.parse_script_arg(&args[3])?,
    ]))
}

fn foreach_cmd(args: &[Word], parser: &mut Parser) -> Result<Option<Vec<Word>>, CommandArgError> {
    // ref: https://www.tcl.tk/man/tcl/TclCmd/foreach.html
    if args.len() < 3 {
        return Err(CommandArgError::new(format!(
            "not enough args for foreach: got {}, expected at least 3",
            args.len()
        )));
    }

    let mut new_args = args[..args.len() - 1].to_vec();
    new_args.push(parser.parse_script_arg(args.last().expect("checked"))?);
    Ok(Some(new_args))
}

fn if_cmd(args: &[Word], parser: &mut Parser) -> Result<Option<Vec<Word>>, CommandArgError> {
    // ref: https://www.tcl.tk/man/tcl/TclCmd/if.html
    if args.is_empty() {
        return Err(CommandArgError::new(
            "wrong # of args for if: expected an expression",
        ));
    }

    let mut new_args = vec![parser.parse_expr_arg(&args[0])?];

    while new_args.len() < args.len() {
        let arg = &args[new_args.len()];
        match arg.contents().as_deref() {
            Some("then") | Some("else") => {
                new_args.push(arg.clone());
                continue;
            }
            Some("elseif") => {
                new_args.push(arg.clone());
                let expr_arg = args.get(new_args.len()).ok_or_else(|| {
                    CommandArgError::new("wrong # of args for if: expected expression after elseif")
                })?;
                new_args.push(parser.parse_expr_arg(expr_arg)?);
                continue;
            }
            _ => {}
        }
        new_args.push(parser.parse_script_arg(arg)?);
    }

    Ok(Some(new_args))
}

fn interp_eval(args: &[Word], parser: &mut Parser) -> Result<Option<Vec<Word>>, CommandArgError> {
    if args.len() < 2 {
        return Err(CommandArgError::new(format!(
            "not enough args for 'interp eval': got {}, expected at least 2",
            args.len()
        )));
    }
    let mut new_args = vec![args[0].clone()];
    new_args.extend(eval_script(&args[1..], parser, "interp eval")?);
    Ok(Some(new_args))
}

fn lmap_cmd(args: &[Word], parser: &mut Parser) -> Result<Option<Vec<Word>>, CommandArgError> {
    // ref: https://www.tcl.tk/man/tcl/TclCmd/lmap.html
    if args.len() < 3 {
        return Err(CommandArgError::new(format!(
            "not enough args for lmap: got {}, expected at least 3",
            args.len()
        )));
    }

    let mut new_args = args[..args.len() - 1].to_vec();
    new_args.push(parser.parse_script_arg(args.last().expect("checked"))?);
    Ok(Some(new_args))
}

fn namespace_code(args: &[Word], parser: &mut Parser) -> Result<Option<Vec<Word>>, CommandArgError> {
    // ref: https://www.tcl.tk/man/tcl/TclCmd/namespace.html#M6
    if args.len() != 1 {
        return Err(CommandArgError::new(format!(
            "wrong # of args for 'namespace code': got {}, expected 1",
            args.len()
        )));
    }
    Ok(Some(vec![parser.parse_script_arg(&args[0])?]))
}

fn namespace_eval(args: &[Word], parser: &mut Parser) -> Result<Option<Vec<Word>>, CommandArgError> {
    if args.len() < 2 {
        return Err(CommandArgError::new(format!(
            "not enough args for 'namespace eval': got {}, expected at least 2",
            args.len()
        )));
    }
    let mut new_args = vec![args[0].clone()];
    new_args.extend(eval_script(&args[1..], parser, "namespace eval")?);
    Ok(Some(new_args))
}

fn namespace_inscope(
    _args: &[Word],
    _parser: &mut Parser,
) -> Result<Option<Vec<Word>>, CommandArgError> {
    Err(CommandArgError::new(
        "'namespace inscope' is not meant to be called directly, consider using \
         'namespace code' or 'namespace eval' instead",
    ))
}

fn package_ifneeded(
    _args: &[Word],
    _parser: &mut Parser,
) -> Result<Option<Vec<Word>>, CommandArgError> {
    Err(CommandArgError::new(
        "argument parsing for 'package ifneeded' not implemented, any script argument \
         will not be checked for violations",
    ))
}

fn proc_cmd(args: &[Word], parser: &mut Parser) -> Result<Option<Vec<Word>>, CommandArgError> {
    if args.len() != 3 {
        return Err(CommandArgError::new(format!(
            "wrong # of args for proc: got {}, expected 3",
            args.len()
        )));
    }

    let params = if matches!(args[1], Word::Braced(_)) {
        Word::List(parser.parse_list_arg(&args[1])?)
    } else {
        args[1].clone()
    };

    Ok(Some(vec![
        args[0].clone(),
        params,
        parser.parse_script_arg(&args[2])?,
    ]))
}

fn return_cmd(args: &[Word], _parser: &mut Parser) -> Result<Option<Vec<Word>>, CommandArgError> {
    let mut i = 0;
    while i < args.len() {
        let option = args[i].contents();
        i += 1;

        match option.as_deref() {
            Some("-code") => {
                let arg = args.get(i).ok_or_else(|| {
                    CommandArgError::new("not enough args for return: expected value after -code")
                })?;
                i += 1;
                check_code(arg).map_err(|e| {
                    CommandArgError::new(format!("invalid value for return -code: {e}"))
                })?;
            }
            Some("-level") => {
                let arg = args.get(i).ok_or_else(|| {
                    CommandArgError::new("not enough args for return: expected value after -level")
                })?;
                i += 1;
                if let Some(val) = arg.contents() {
                    if val.parse::<i64>().map_or(true, |n| n < 0) {
                        return Err(CommandArgError::new(format!(
                            "invalid value for return -level: got {val}, expected a \
                             non-negative integer"
                        )));
                    }
                }
            }
            Some("-errorcode" | "-errorinfo" | "-errorstack" | "-options") => {
                let option = option.expect("matched");
                args.get(i).ok_or_else(|| {
                    CommandArgError::new(format!(
                        "not enough args for return: expected value after {option}"
                    ))
                })?;
                i += 1;
            }
            _ => break,
        }
    }

    // At most one plain result argument may follow the explicit options.
    if i < args.len() {
        return Err(CommandArgError::new(
            "too many arguments for return: expected no more than 1 argument after \
             explicit options. Provide -options argument if you intend to specify \
             additional return options.",
        ));
    }

    Ok(None)
}

fn switch_cmd(args: &[Word], parser: &mut Parser) -> Result<Option<Vec<Word>>, CommandArgError> {
    // ref: https://www.tcl.tk/man/tcl/TclCmd/switch.html
    let contents: Vec<Option<String>> = args.iter().map(|a| a.contents()).collect();

    let mut arg_i = 0;
    if let Some(idx) = contents.iter().position(|c| c.as_deref() == Some("--")) {
        arg_i = idx + 1;
    } else {
        loop {
            match contents.get(arg_i).and_then(|c| c.as_deref()) {
                Some("-exact" | "-glob" | "-regexp" | "-nocase") => arg_i += 1,
                Some("-matchvar" | "-indexvar") => arg_i += 2,
                _ => break,
            }
        }
    }

    // account for the string to be matched
    arg_i += 1;

    if arg_i > args.len() {
        return Err(CommandArgError::new(format!(
            "not enough args for switch: got {}",
            args.len()
        )));
    }

    let mut new_args: Vec<Word> = args[..arg_i].to_vec();

    // one argument left => form where patterns and bodies are in a list
    let last_arg_is_list = arg_i + 1 == args.len();

    if last_arg_is_list {
        let list = parser.parse_list_arg(&args[arg_i])?;
        if list.items.len() % 2 != 0 {
            return Err(CommandArgError::new(
                "expected even number of patterns and commands",
            ));
        }
        let mut parsed = Vec::with_capacity(list.items.len());
        for (i, item) in list.items.into_iter().enumerate() {
            if i % 2 == 0 {
                parsed.push(item);
            } else {
                parsed.push(parser.parse_script_arg(&item)?);
            }
        }
        new_args.push(Word::List(ListWord {
            items: parsed,
            text: list.text,
            span: list.span,
        }));
    } else {
        let pairs = &args[arg_i..];
        if pairs.len() % 2 != 0 {
            return Err(CommandArgError::new(
                "expected even number of patterns and commands",
            ));
        }
        for (i, item) in pairs.iter().enumerate() {
            if i % 2 == 0 {
                new_args.push(item.clone());
            } else {
                new_args.push(parser.parse_script_arg(item)?);
            }
        }
    }

    Ok(Some(new_args))
}

fn time_cmd(args: &[Word], parser: &mut Parser) -> Result<Option<Vec<Word>>, CommandArgError> {
    // ref: https://www.tcl.tk/man/tcl/TclCmd/time.html
    if args.is_empty() {
        return Err(CommandArgError::new(
            "not enough args for time: got 0, expected at least 1",
        ));
    }
    if args.len() > 2 {
        return Err(CommandArgError::new(format!(
            "too many args for time: got {}, expected no more than 2",
            args.len()
        )));
    }

    if args.len() == 2 {
        if let Some(val) = args[1].contents() {
            if val.parse::<i64>().is_err() {
                return Err(CommandArgError::new(
                    "invalid argument to time: expected integer for last argument",
                ));
            }
        }
    }

    let mut new_args = vec![parser.parse_script_arg(&args[0])?];
    new_args.extend(args[1..].iter().cloned());
    Ok(Some(new_args))
}

fn timerate_cmd(args: &[Word], parser: &mut Parser) -> Result<Option<Vec<Word>>, CommandArgError> {
    // ref: https://www.tcl.tk/man/tcl/TclCmd/timerate.html
    let mut new_args = Vec::new();
    let mut i = 0;

    let script_arg = loop {
        let Some(arg) = args.get(i) else {
            return Err(CommandArgError::new(
                "invalid arguments for timerate: expected script body",
            ));
        };
        i += 1;

        match arg.contents().as_deref() {
            Some("-direct" | "-calibrate") => new_args.push(arg.clone()),
            Some("-overhead") => {
                new_args.push(arg.clone());
                let val = args.get(i).ok_or_else(|| {
                    CommandArgError::new(
                        "invalid argument to timerate: -overhead must be followed by a double",
                    )
                })?;
                i += 1;
                if let Some(v) = val.contents() {
                    if v.parse::<f64>().is_err() {
                        return Err(CommandArgError::new(
                            "invalid argument to timerate: -overhead must be followed by a double",
                        ));
                    }
                }
                new_args.push(val.clone());
            }
            _ => break arg,
        }
    };

    new_args.push(parser.parse_script_arg(script_arg)?);

    let rest = &args[i..];
    if rest.len() > 2 {
        return Err(CommandArgError::new(
            "too many arguments for timerate: expected no more than 2 arguments \
             following script body",
        ));
    }
    for arg in rest {
        if let Some(val) = arg.contents() {
            if val.parse::<i64>().is_err() {
                return Err(CommandArgError::new(
                    "invalid argument to timerate: expected one or two integers \
                     following script body",
                ));
            }
        }
        new_args.push(arg.clone());
    }

    Ok(Some(new_args))
}

fn try_cmd(args: &[Word], parser: &mut Parser) -> Result<Option<Vec<Word>>, CommandArgError> {
    // ref: https://www.tcl.tk/man/tcl/TclCmd/try.html
    let mut new_args = Vec::new();
    let mut i = 0;

    loop {
        let Some(body) = args.get(i) else {
            return Err(CommandArgError::new(
                "invalid arguments for try: missing script body",
            ));
        };
        i += 1;
        new_args.push(parser.parse_script_arg(body)?);

        let Some(handler_word) = args.get(i) else {
            break;
        };
        i += 1;
        new_args.push(handler_word.clone());

        match handler_word.contents().as_deref() {
            Some("on") => {
                let code = args.get(i).ok_or_else(|| {
                    CommandArgError::new(
                        "invalid arguments for try: expected 3 arguments after 'on' handler",
                    )
                })?;
                i += 1;
                check_code(code).map_err(|e| {
                    CommandArgError::new(format!(
                        "invalid code argument to 'on' handler in try: {e}"
                    ))
                })?;
                new_args.push(code.clone());
                let vars = args.get(i).ok_or_else(|| {
                    CommandArgError::new(
                        "invalid arguments for try: expected 3 arguments after 'on' handler",
                    )
                })?;
                i += 1;
                new_args.push(vars.clone());
            }
            Some("trap") => {
                for _ in 0..2 {
                    let arg = args.get(i).ok_or_else(|| {
                        CommandArgError::new(
                            "invalid arguments for try: expected 3 arguments after 'trap' handler",
                        )
                    })?;
                    i += 1;
                    new_args.push(arg.clone());
                }
            }
            Some("finally") => continue,
            _ => {
                return Err(CommandArgError::new(
                    "invalid handler argument to try: expected one of 'on', 'trap', or 'finally'",
                ));
            }
        }
    }

    Ok(Some(new_args))
}

fn uplevel_cmd(args: &[Word], parser: &mut Parser) -> Result<Option<Vec<Word>>, CommandArgError> {
    // ref: https://www.tcl.tk/man/tcl/TclCmd/uplevel.html
    if args.is_empty() {
        return Err(CommandArgError::new(
            "not enough args for uplevel: got 0, expected at least 1",
        ));
    }

    let is_level = |val: &str| {
        let digits = val.strip_prefix('#').unwrap_or(val);
        !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
    };

    let mut new_args = Vec::new();
    let mut rest = args;
    if let Some(val) = args[0].contents() {
        if is_level(&val) {
            new_args.push(args[0].clone());
            rest = &args[1..];
        }
    }

    if rest.is_empty() {
        return Err(CommandArgError::new(
            "not enough args for uplevel: expected a script after level",
        ));
    }

    new_args.extend(eval_script(rest, parser, "uplevel")?);
    Ok(Some(new_args))
}

fn while_cmd(args: &[Word], parser: &mut Parser) -> Result<Option<Vec<Word>>, CommandArgError> {
    if args.len() != 2 {
        return Err(CommandArgError::new(format!(
            "wrong # of args for while: got {}, expected 2",
            args.len()
        )));
    }

    Ok(Some(vec![
        parser.parse_expr_arg(&args[0])?,
        parser.parse_script_arg(&args[1])?,
    ]))
}

/// The builtin Tcl command table.
pub fn commands() -> IndexMap<String, CommandEntry> {
    let entries: Vec<(&str, CommandEntry)> = vec![
        (
            "after",
            sub(
                vec![
                    ("cancel", at_least(1)),
                    ("idle", handler(after_idle)),
                    ("info", at_most(1)),
                ],
                Some(handler(after_cmd)),
            ),
        ),
        ("append", at_least(1)),
        ("apply", handler(apply_cmd)),
        // TODO: check subcommands
        ("array", CommandEntry::Known),
        (
            "binary",
            sub(
                vec![
                    ("decode", at_least(2)),
                    ("encode", at_least(2)),
                    ("format", at_least(1)),
                    ("scan", at_least(2)),
                ],
                None,
            ),
        ),
        ("break", exactly(0)),
        ("catch", handler(catch_cmd)),
        ("cd", at_most(1)),
        // TODO: check subcommands
        ("chan", CommandEntry::Known),
        // TODO: check subcommands
        ("clock", CommandEntry::Known),
        ("close", between(1, 2)),
        ("concat", CommandEntry::Known),
        ("continue", exactly(0)),
        ("coroutine", at_least(2)),
        (
            "dict",
            sub(
                vec![
                    ("append", at_least(2)),
                    ("create", CommandEntry::Known),
                    ("exists", at_least(2)),
                    ("filter", handler(dict_filter)),
                    ("for", handler(dict_for)),
                    ("get", at_least(1)),
                    ("incr", between(2, 3)),
                    ("info", exactly(1)),
                    ("keys", between(1, 2)),
                    ("lappend", at_least(2)),
                    ("map", handler(dict_map)),
                    ("merge", CommandEntry::Known),
                    ("remove", at_least(1)),
                    ("replace", at_least(1)),
                    ("set", at_least(3)),
                    ("size", exactly(1)),
                    ("unset", at_least(2)),
                    ("update", handler(dict_update)),
                    ("values", between(1, 2)),
                    ("with", handler(dict_with)),
                ],
                None,
            ),
        ),
        (
            "encoding",
            sub(
                vec![
                    ("convertfrom", between(1, 2)),
                    ("convertto", between(1, 2)),
                    ("dirs", at_most(1)),
                    ("names", exactly(0)),
                    ("system", at_most(1)),
                ],
                None,
            ),
        ),
        ("eof", exactly(1)),
        ("error", between(1, 3)),
        ("eval", handler(eval_cmd)),
        ("exec", at_least(1)),
        ("exit", at_most(1)),
        ("expr", handler(expr_cmd)),
        ("fblocked", exactly(1)),
        ("fconfigure", at_least(1)),
        ("fcopy", between(2, 6)),
        // TODO: check subcommands
        ("file", at_least(1)),
        ("fileevent", handler(fileevent_cmd)),
        ("flush", exactly(1)),
        ("for", handler(for_cmd)),
        ("foreach", handler(foreach_cmd)),
        ("format", at_least(1)),
        ("gets", between(1, 2)),
        ("glob", CommandEntry::Known),
        ("global", CommandEntry::Known),
        ("history", CommandEntry::Known),
        ("if", handler(if_cmd)),
        ("incr", between(1, 2)),
        // TODO: check subcommands
        ("info", at_least(1)),
        (
            "interp",
            sub(vec![("eval", handler(interp_eval))], Some(at_least(1))),
        ),
        ("join", between(1, 2)),
        ("lappend", at_least(1)),
        ("lassign", at_least(1)),
        ("lindex", at_least(1)),
        ("linsert", at_least(2)),
        ("list", at_least(0)),
        ("llength", exactly(1)),
        ("lmap", handler(lmap_cmd)),
        ("load", between(1, 6)),
        ("lrange", exactly(3)),
        ("lrepeat", at_least(1)),
        ("lreplace", at_least(3)),
        ("lreverse", exactly(1)),
        ("lsearch", at_least(2)),
        ("lset", at_least(2)),
        ("lsort", at_least(1)),
        (
            "memory",
            sub(
                vec![
                    ("active", exactly(1)),
                    ("break_on_malloc", exactly(1)),
                    ("info", exactly(0)),
                    ("init", exactly(1)),
                    ("objs", exactly(1)),
                    ("onexit", exactly(1)),
                    ("tag", exactly(1)),
                    ("trace", exactly(1)),
                    ("trace_on_at_malloc", exactly(1)),
                    ("validate", exactly(1)),
                ],
                None,
            ),
        ),
        (
            "namespace",
            sub(
                vec![
                    ("children", at_most(2)),
                    ("code", handler(namespace_code)),
                    ("current", exactly(0)),
                    ("delete", CommandEntry::Known),
                    ("eval", handler(namespace_eval)),
                    ("exists", exactly(1)),
                    ("export", CommandEntry::Known),
                    ("forget", CommandEntry::Known),
                    ("import", CommandEntry::Known),
                    ("inscope", handler(namespace_inscope)),
                    ("origin", exactly(1)),
                    ("parent", at_most(1)),
                    ("qualifiers", exactly(1)),
                    ("tail", exactly(1)),
                    ("which", between(1, 2)),
                    (
                        "ensemble",
                        sub(
                            vec![
                                ("create", CommandEntry::Known),
                                ("configure", at_least(1)),
                                ("exists", exactly(1)),
                            ],
                            None,
                        ),
                    ),
                ],
                None,
            ),
        ),
        ("open", between(1, 3)),
        (
            "package",
            sub(
                vec![
                    ("forget", CommandEntry::Known),
                    ("ifneeded", handler(package_ifneeded)),
                    ("names", exactly(0)),
                    ("present", at_least(0)),
                    ("provide", between(1, 2)),
                    ("require", at_least(1)),
                    ("unknown", at_least(1)),
                    ("vcompare", exactly(2)),
                    ("versions", exactly(1)),
                    ("vsatisfies", at_least(2)),
                    ("prefer", exactly(1)),
                ],
                None,
            ),
        ),
        ("pid", at_most(1)),
        ("pkg::create", at_least(2)),
        ("pkg_mkIndex", at_least(1)),
        ("proc", handler(proc_cmd)),
        ("puts", between(1, 3)),
        ("pwd", exactly(0)),
        ("read", between(1, 2)),
        ("regexp", at_least(2)),
        ("regsub", at_least(3)),
        ("rename", exactly(2)),
        ("return", handler(return_cmd)),
        // TODO: check subcommands
        ("safe", at_least(1)),
        ("scan", at_least(2)),
        ("seek", between(2, 3)),
        ("set", between(1, 2)),
        ("socket", at_least(2)),
        ("source", between(1, 3)),
        ("split", between(1, 2)),
        // TODO: check subcommands
        ("string", at_least(2)),
        ("subst", between(1, 4)),
        ("switch", handler(switch_cmd)),
        ("tailcall", at_least(1)),
        (
            "tcl::prefix",
            sub(
                vec![
                    ("all", exactly(2)),
                    ("longest", exactly(2)),
                    ("match", at_least(2)),
                ],
                None,
            ),
        ),
        (
            "tcl::tm::path",
            sub(
                vec![
                    ("add", CommandEntry::Known),
                    ("remove", CommandEntry::Known),
                    ("list", exactly(0)),
                ],
                None,
            ),
        ),
        ("tcl::tm::roots", CommandEntry::Known),
        ("tell", exactly(1)),
        ("throw", exactly(2)),
        ("time", handler(time_cmd)),
        ("timerate", handler(timerate_cmd)),
        // TODO: check subcommands
        ("trace", at_least(2)),
        ("try", handler(try_cmd)),
        ("unload", between(1, 6)),
        ("unset", CommandEntry::Known),
        ("update", at_most(1)),
        ("uplevel", handler(uplevel_cmd)),
        ("upvar", at_least(2)),
        ("variable", at_least(1)),
        ("vwait", exactly(1)),
        ("while", handler(while_cmd)),
        ("yield", at_most(1)),
        ("yieldto", at_least(2)),
        // TODO: check subcommands
        ("zlib", at_least(3)),
    ];

    entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}

#[cfg(test)]
mod tests {
    use crate::commands::{CommandRegistry, Dialect};
    use crate::lint::violations::{Rule, Violation};
    use crate::parser::Parser;

    fn violations(source: &str) -> Vec<Violation> {
        let registry = CommandRegistry::new(Dialect::Tcl);
        let mut parser = Parser::new(&registry);
        parser.parse(source);
        parser.violations
    }

    fn assert_clean(source: &str) {
        let found = violations(source);
        assert!(found.is_empty(), "{source:?} produced {found:?}");
    }

    fn assert_command_args(source: &str, fragment: &str) {
        let found = violations(source);
        let matched = found
            .iter()
            .any(|v| v.rule == Rule::CommandArgs && v.message.contains(fragment));
        assert!(matched, "{source:?}: expected command-args containing {fragment:?}, got {found:?}");
    }

    #[test]
    fn test_return() {
        assert_clean("return");
        assert_clean("return 5");
        assert_clean("return -code error whoops");
        assert_clean("return -level 2 -code break");
        assert_command_args("return 5 + 2", "too many arguments for return");
        assert_command_args("return -code bogus x", "invalid value for return -code");
        assert_command_args("return -level -1 x", "invalid value for return -level");
    }

    #[test]
    fn test_try() {
        assert_clean("try {puts a} on error {msg opts} {puts $msg} finally {puts done}");
        assert_clean("try {puts a} trap {POSIX ENOENT} {msg opts} {puts gone}");
        assert_command_args("try", "missing script body");
        assert_command_args("try {a} bogus {b}", "invalid handler argument to try");
        assert_command_args("try {a} on banana {m} {b}", "invalid code argument");
        assert_command_args("try {a} on error", "expected 3 arguments after 'on'");
        assert_command_args("try {a} on error {m}", "missing script body");
    }

    #[test]
    fn test_catch() {
        assert_clean("catch {puts a} err");
        assert_command_args("catch", "not enough args for catch");
        assert_command_args("catch {a} b c d", "too many args for catch");
    }

    #[test]
    fn test_proc() {
        assert_clean("proc f {x y} {puts $x}");
        assert_command_args("proc f {}", "wrong # of args for proc: got 2, expected 3");
    }

    #[test]
    fn test_if_elseif() {
        assert_clean("if {1} {a} else {b}");
        assert_clean("if {1} then {a} elseif {2} {b} else {c}");
        assert_command_args("if {1} {a} elseif", "expected expression after elseif");
    }

    #[test]
    fn test_while_and_for() {
        assert_clean("while {$x < 5} {incr x}");
        assert_command_args("while {1}", "wrong # of args for while: got 1, expected 2");
        assert_clean("for {set i 0} {$i < 5} {incr i} {puts $i}");
        assert_command_args("for {set i 0} {1}", "wrong # of args for for");
    }

    #[test]
    fn test_foreach_lmap() {
        assert_clean("foreach x {1 2 3} {puts $x}");
        assert_clean("foreach {a b} $pairs {puts $a}");
        assert_command_args("foreach x", "not enough args for foreach");
        assert_clean("lmap x {1 2 3} {expr {$x * 2}}");
    }

    #[test]
    fn test_time_and_timerate() {
        assert_clean("time {puts a} 100");
        assert_command_args("time {puts a} abc", "expected integer");
        assert_clean("timerate -overhead 1.5 {puts a} 100");
        assert_command_args("timerate -overhead x {puts a}", "must be followed by a double");
        assert_command_args("timerate {puts a} 1 2 3", "no more than 2 arguments");
    }

    #[test]
    fn test_uplevel() {
        assert_clean("uplevel #0 {puts a}");
        assert_clean("uplevel 1 set x 5");
        assert_clean("uplevel {set x 5}");
        assert_command_args("uplevel", "not enough args for uplevel");
    }

    #[test]
    fn test_dict() {
        assert_clean("dict for {k v} $d {puts $k}");
        assert_clean("dict with d {puts $k}");
        assert_clean("dict update d k v {puts $v}");
        assert_clean("dict filter $d script {k v} {string match a* $k}");
        assert_command_args("dict for {k v} $d", "wrong # of args for 'dict for'");
        assert_command_args("dict bogus x", "invalid subcommand for dict");
        assert_command_args("dict", "no subcommand provided for dict");
    }

    #[test]
    fn test_namespace() {
        assert_clean("namespace eval ns {puts a}");
        assert_clean("namespace delete a b c");
        assert_command_args("namespace inscope ns {a}", "not meant to be called directly");
        assert_command_args("namespace eval ns", "not enough args for 'namespace eval'");
    }

    #[test]
    fn test_apply() {
        assert_clean("apply {{x} {puts $x}} 5");
        assert_command_args("apply {{x}} 1", "expected 2 or 3");
    }

    #[test]
    fn test_after() {
        assert_clean("after 100 {puts hi}");
        assert_clean("after 100");
        assert_clean("after idle {puts hi}");
        assert_clean("after info");
        assert_command_args("after cancel", "not enough args for after cancel");
    }

    #[test]
    fn test_interp() {
        assert_clean("interp eval slave {puts hi}");
        assert_clean("interp create slave");
    }

    #[test]
    fn test_eval_restrictions() {
        assert_command_args(
            "eval puts {a b c}",
            "unable to parse multiple eval arguments",
        );
        assert_command_args("eval $cmd extra", "argument with a substitution");
    }

    #[test]
    fn test_expr_multiple_args_unchecked() {
        assert_clean("expr 1 + 1");
        assert_command_args("expr", "not enough args for expr");
    }
}

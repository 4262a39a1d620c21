//! Structured command grammars.
//!
//! An [`ArgSpec`] declares a command's switches and positional arguments.
//! Validation partitions incoming words into switches and positionals,
//! checks presence and repetition, maps positionals against the spec, and
//! re-parses script- or expression-typed positionals.

use indexmap::IndexMap;

use crate::ast::types::Word;
use crate::parser::parser::Parser;
use crate::parser::types::CommandArgError;

#[derive(Debug, Clone, Default)]
pub struct ArgSpec {
    pub switches: IndexMap<String, SwitchSpec>,
    pub positionals: Vec<PositionalSpec>,
}

#[derive(Debug, Clone)]
pub struct SwitchSpec {
    pub required: bool,
    pub repeated: bool,
    pub value: SwitchValue,
    pub metavar: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchValue {
    None,
    Any,
    Variadic,
}

#[derive(Debug, Clone)]
pub struct PositionalSpec {
    pub name: String,
    pub required: bool,
    pub value: PositionalValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionalValue {
    Any,
    Variadic,
    Script,
    Expression,
}

fn is_switch_like(word: &Word) -> Option<String> {
    if let Word::Bare(bare) = word {
        if bare.text.starts_with('-') {
            return Some(bare.text.clone());
        }
    }
    None
}

pub fn check_arg_spec(
    name: &str,
    args: &[Word],
    parser: &mut Parser,
    spec: &ArgSpec,
) -> Result<Option<Vec<Word>>, CommandArgError> {
    let mut positional_idx: Vec<usize> = Vec::new();
    let mut seen: Vec<&str> = Vec::new();
    let mut switches_done = false;

    let mut i = 0;
    while i < args.len() {
        let arg = &args[i];
        i += 1;

        let switch = if switches_done { None } else { is_switch_like(arg) };
        let Some(switch) = switch else {
            positional_idx.push(i - 1);
            continue;
        };

        if switch == "--" {
            switches_done = true;
            continue;
        }

        // A `-`-prefixed word that matches no known switch counts as a
        // positional, consistent with how Tcl commands treat their args.
        let Some((key, sw)) = spec.switches.get_key_value(switch.as_str()) else {
            positional_idx.push(i - 1);
            continue;
        };

        if !sw.repeated && seen.contains(&key.as_str()) {
            return Err(CommandArgError::new(format!(
                "duplicate argument for {name}: {switch}"
            )));
        }
        seen.push(key.as_str());

        match sw.value {
            SwitchValue::None => {}
            SwitchValue::Any => {
                if i >= args.len() {
                    return Err(CommandArgError::new(format!(
                        "invalid arguments for {name}: expected value after {switch}"
                    )));
                }
                i += 1;
            }
            SwitchValue::Variadic => {
                let start = i;
                while i < args.len() && is_switch_like(&args[i]).is_none() {
                    i += 1;
                }
                if i == start {
                    return Err(CommandArgError::new(format!(
                        "invalid arguments for {name}: expected value after {switch}"
                    )));
                }
            }
        }
    }

    let missing: Vec<&str> = spec
        .switches
        .iter()
        .filter(|(key, sw)| sw.required && !seen.contains(&key.as_str()))
        .map(|(key, _)| key.as_str())
        .collect();
    if missing.len() == 1 {
        return Err(CommandArgError::new(format!(
            "missing required argument for {name}: {}",
            missing[0]
        )));
    }
    if missing.len() > 1 {
        return Err(CommandArgError::new(format!(
            "missing required arguments for {name}: {}",
            missing.join(", ")
        )));
    }

    let positionals: Vec<&Word> = positional_idx.iter().map(|&i| &args[i]).collect();
    let mapping = map_positionals(&positionals, &spec.positionals, name)?;

    let mut new_args: Vec<Word> = args.to_vec();
    let mut changed = false;
    for (arg_i, spec_indices) in positional_idx.iter().zip(mapping.iter()) {
        let has_type = |value: PositionalValue| {
            spec_indices.iter().any(|&s| spec.positionals[s].value == value)
        };
        if has_type(PositionalValue::Script) {
            new_args[*arg_i] = parser.parse_script_arg(&args[*arg_i])?;
            changed = true;
        } else if has_type(PositionalValue::Expression) {
            new_args[*arg_i] = parser.parse_expr_arg(&args[*arg_i])?;
            changed = true;
        }
    }

    if changed {
        Ok(Some(new_args))
    } else {
        Ok(None)
    }
}

/// Maps positional argument words to entries of the positional spec.
///
/// The result has one entry per argument, each a list of indices into
/// `spec`: a variadic spec entry may appear for several arguments, and an
/// argument expansion may cover several spec entries. Raises
/// `CommandArgError` when no legal mapping exists. When several mappings
/// exist, some mapping is returned.
fn map_positionals(
    args: &[&Word],
    spec: &[PositionalSpec],
    name: &str,
) -> Result<Vec<Vec<usize>>, CommandArgError> {
    if args.len() == spec.len() {
        // 1:1 match in argument count is always a legal mapping
        return Ok((0..args.len()).map(|i| vec![i]).collect());
    }

    let mut mapping: Vec<Vec<usize>> = Vec::new();
    let mut i = 0;

    if args.len() > spec.len() {
        // Map greedily and let the first variadic absorb the extras.
        let mut extra = args.len() - spec.len();
        for _arg in args {
            if i >= spec.len() {
                return Err(CommandArgError::new(format!(
                    "too many arguments for {name}: got {}, expected no more than {}",
                    args.len(),
                    spec.len()
                )));
            }
            mapping.push(vec![i]);
            if spec[i].value == PositionalValue::Variadic && extra > 0 {
                extra -= 1;
            } else {
                i += 1;
            }
        }
        return Ok(mapping);
    }

    let required: Vec<&str> = spec
        .iter()
        .filter(|s| s.required)
        .map(|s| s.name.as_str())
        .collect();
    let num_required = required.len();

    if args.len() < num_required {
        // Map only required spec entries and let the first arg expansion
        // cover what's missing.
        let mut missing = num_required - args.len();
        for arg in args {
            while i < spec.len() && !spec[i].required {
                i += 1;
            }
            if i >= spec.len() {
                break;
            }
            mapping.push(vec![i]);
            i += 1;

            if matches!(arg, Word::ArgExpansion(_)) {
                while missing > 0 && i < spec.len() {
                    if spec[i].required {
                        mapping.last_mut().expect("mapping entry").push(i);
                        missing -= 1;
                    }
                    i += 1;
                }
            }
        }

        if missing > 0 {
            let names = required[required.len() - missing..].join(", ");
            let plural = if missing > 1 { "s" } else { "" };
            return Err(CommandArgError::new(format!(
                "missing required argument{plural} for {name}: {names}"
            )));
        }
        return Ok(mapping);
    }

    // Argument count falls between the required and total number of
    // positionals: map all required entries and as many optionals as needed.
    let mut optionals = args.len() - num_required;
    for _arg in args {
        if i < spec.len() && !spec[i].required && optionals > 0 {
            mapping.push(vec![i]);
            i += 1;
            optionals -= 1;
            continue;
        }
        while i < spec.len() && !spec[i].required {
            i += 1;
        }
        if i >= spec.len() {
            return Err(CommandArgError::new(format!(
                "too many arguments for {name}: got {}, expected no more than {}",
                args.len(),
                spec.len()
            )));
        }
        mapping.push(vec![i]);
        i += 1;
    }

    Ok(mapping)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::types::ScriptItem;
    use crate::commands::{CommandRegistry, Dialect};
    use crate::parser::Parser;

    fn switch(name: &str, value: SwitchValue) -> (String, SwitchSpec) {
        (
            name.to_string(),
            SwitchSpec { required: false, repeated: false, value, metavar: None },
        )
    }

    fn required_switch(name: &str, value: SwitchValue) -> (String, SwitchSpec) {
        (
            name.to_string(),
            SwitchSpec { required: true, repeated: false, value, metavar: None },
        )
    }

    fn positional(name: &str, required: bool, value: PositionalValue) -> PositionalSpec {
        PositionalSpec { name: name.to_string(), required, value }
    }

    /// Parse `source` as a single command of an unknown name and run the
    /// spec over its argument words.
    fn validate(source: &str, spec: &ArgSpec) -> Result<Option<Vec<Word>>, CommandArgError> {
        let registry = CommandRegistry::new(Dialect::Tcl);
        let mut parser = Parser::new(&registry);
        let tree = parser.parse(source);
        let ScriptItem::Command(command) = &tree.items[0] else {
            panic!("expected a command");
        };
        check_arg_spec("cmd", command.args(), &mut parser, spec)
    }

    #[test]
    fn test_switch_with_value() {
        let spec = ArgSpec {
            switches: [switch("-name", SwitchValue::Any)].into_iter().collect(),
            positionals: vec![],
        };
        assert!(validate("cmd -name foo", &spec).is_ok());
        let err = validate("cmd -name", &spec).expect_err("missing value");
        assert!(err.0.contains("expected value after -name"));
    }

    #[test]
    fn test_unknown_dash_word_is_positional() {
        let spec = ArgSpec {
            switches: IndexMap::new(),
            positionals: vec![positional("target", true, PositionalValue::Any)],
        };
        assert!(validate("cmd -not-a-switch", &spec).is_ok());
    }

    #[test]
    fn test_double_dash_ends_switches() {
        let spec = ArgSpec {
            switches: [switch("-x", SwitchValue::None)].into_iter().collect(),
            positionals: vec![positional("target", true, PositionalValue::Any)],
        };
        // after --, -x counts as the positional
        assert!(validate("cmd -- -x", &spec).is_ok());
        // without --, the switch is consumed and the positional is missing
        let err = validate("cmd -x", &spec).expect_err("missing positional");
        assert!(err.0.contains("missing required argument for cmd: target"));
    }

    #[test]
    fn test_duplicate_switch() {
        let spec = ArgSpec {
            switches: [switch("-x", SwitchValue::None)].into_iter().collect(),
            positionals: vec![],
        };
        let err = validate("cmd -x -x", &spec).expect_err("duplicate");
        assert!(err.0.contains("duplicate argument for cmd: -x"));
    }

    #[test]
    fn test_repeated_switch_allowed() {
        let mut entry = switch("-through", SwitchValue::Any);
        entry.1.repeated = true;
        let spec = ArgSpec { switches: [entry].into_iter().collect(), positionals: vec![] };
        assert!(validate("cmd -through a -through b", &spec).is_ok());
    }

    #[test]
    fn test_missing_required_switch() {
        let spec = ArgSpec {
            switches: [required_switch("-period", SwitchValue::Any)].into_iter().collect(),
            positionals: vec![],
        };
        let err = validate("cmd", &spec).expect_err("missing switch");
        assert!(err.0.contains("missing required argument for cmd: -period"));
    }

    #[test]
    fn test_variadic_positional_absorbs_extras() {
        let spec = ArgSpec {
            switches: IndexMap::new(),
            positionals: vec![
                positional("first", true, PositionalValue::Any),
                positional("rest", true, PositionalValue::Variadic),
            ],
        };
        assert!(validate("cmd a b c d", &spec).is_ok());
        let err = validate("cmd a b c", &ArgSpec {
            switches: IndexMap::new(),
            positionals: vec![positional("only", true, PositionalValue::Any)],
        })
        .expect_err("too many");
        assert!(err.0.contains("too many arguments for cmd"));
    }

    #[test]
    fn test_optional_positional() {
        let spec = ArgSpec {
            switches: IndexMap::new(),
            positionals: vec![
                positional("a", true, PositionalValue::Any),
                positional("b", false, PositionalValue::Any),
            ],
        };
        assert!(validate("cmd x", &spec).is_ok());
        assert!(validate("cmd x y", &spec).is_ok());
    }

    #[test]
    fn test_script_positional_reparsed() {
        let spec = ArgSpec {
            switches: IndexMap::new(),
            positionals: vec![positional("body", true, PositionalValue::Script)],
        };
        let result = validate("cmd {puts hi}", &spec).expect("valid");
        let words = result.expect("replacement words");
        assert!(matches!(words[0], Word::Script(_)));
    }

    #[test]
    fn test_expression_positional_reparsed() {
        let spec = ArgSpec {
            switches: IndexMap::new(),
            positionals: vec![positional("cond", true, PositionalValue::Expression)],
        };
        let result = validate("cmd {$x > 1}", &spec).expect("valid");
        let words = result.expect("replacement words");
        assert!(matches!(words[0], Word::Expr(_)));
    }

    #[test]
    fn test_arg_expansion_covers_missing_positionals() {
        let spec = ArgSpec {
            switches: IndexMap::new(),
            positionals: vec![
                positional("a", true, PositionalValue::Any),
                positional("b", true, PositionalValue::Any),
            ],
        };
        assert!(validate("cmd {*}$pair", &spec).is_ok());
    }
}

//! Command registry and dispatch.
//!
//! The registry maps command names to validation entries. It is layered:
//! the Tcl builtins come first, then the table for the active dialect
//! (SDC, XDC, or UPF), then any plugins. Later layers shadow earlier ones
//! by command name.

pub mod args;
pub mod builtin;
pub mod plugins;
pub mod sdc;
pub mod spec;
pub mod upf;

use indexmap::IndexMap;

use crate::ast::types::Word;
use crate::parser::parser::Parser;
use crate::parser::types::CommandArgError;
pub use plugins::Plugin;
pub use spec::{ArgSpec, PositionalSpec, PositionalValue, SwitchSpec, SwitchValue};

/// A command handler: receives the argument words and a parser handle, and
/// returns replacement words, `None` to leave the words as-is, or an error
/// that becomes a `command-args` violation.
pub type Handler = fn(&[Word], &mut Parser) -> Result<Option<Vec<Word>>, CommandArgError>;

/// How a known command's arguments are validated.
#[derive(Debug, Clone)]
pub enum CommandEntry {
    /// The command is known but its arguments are not checked.
    Known,
    /// Plain argument-count check.
    Count { min: Option<usize>, max: Option<usize> },
    /// Dispatch on the first argument.
    Sub(SubTable),
    /// Custom handler that may re-parse argument words.
    Handler(Handler),
    /// Declarative switch/positional grammar.
    Spec(ArgSpec),
}

#[derive(Debug, Clone)]
pub struct SubTable {
    pub subs: IndexMap<String, CommandEntry>,
    pub default: Option<Box<CommandEntry>>,
}

impl CommandEntry {
    pub fn check(
        &self,
        name: &str,
        args: &[Word],
        parser: &mut Parser,
    ) -> Result<Option<Vec<Word>>, CommandArgError> {
        match self {
            CommandEntry::Known => Ok(None),
            CommandEntry::Count { min, max } => {
                args::check_count(name, *min, *max, args, parser)
            }
            CommandEntry::Handler(handler) => handler(args, parser),
            CommandEntry::Spec(arg_spec) => spec::check_arg_spec(name, args, parser, arg_spec),
            CommandEntry::Sub(table) => {
                let subcommand = args.first().and_then(|w| w.contents());

                if let Some(sub_name) = subcommand.as_deref() {
                    if let Some(entry) = table.subs.get(sub_name) {
                        let full_name = format!("{name} {sub_name}");
                        return match entry.check(&full_name, &args[1..], parser)? {
                            None => Ok(None),
                            Some(mut new_args) => {
                                let mut words = vec![args[0].clone()];
                                words.append(&mut new_args);
                                Ok(Some(words))
                            }
                        };
                    }
                }

                if let Some(default) = &table.default {
                    return default.check(name, args, parser);
                }

                let expected = table.subs.keys().cloned().collect::<Vec<_>>().join(", ");
                match subcommand {
                    Some(sub_name) => Err(CommandArgError::new(format!(
                        "invalid subcommand for {name}: got {sub_name}, expected one of {expected}"
                    ))),
                    None => Err(CommandArgError::new(format!(
                        "no subcommand provided for {name}, expected one of {expected}"
                    ))),
                }
            }
        }
    }
}

/// Dialect of the file being analyzed, selected from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    #[default]
    Tcl,
    Sdc,
    Xdc,
    Upf,
}

impl Dialect {
    pub fn from_extension(ext: &str) -> Dialect {
        match ext.to_ascii_lowercase().as_str() {
            "sdc" => Dialect::Sdc,
            "xdc" => Dialect::Xdc,
            "upf" => Dialect::Upf,
            _ => Dialect::Tcl,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CommandRegistry {
    commands: IndexMap<String, CommandEntry>,
}

impl CommandRegistry {
    pub fn new(dialect: Dialect) -> Self {
        Self::with_plugins(dialect, &[])
    }

    pub fn with_plugins(dialect: Dialect, plugins: &[Plugin]) -> Self {
        let mut commands = builtin::commands();
        match dialect {
            Dialect::Tcl => {}
            Dialect::Sdc => commands.extend(sdc::commands()),
            Dialect::Xdc => {
                commands.extend(sdc::commands());
                commands.extend(sdc::xdc_commands());
            }
            Dialect::Upf => commands.extend(upf::commands()),
        }
        for plugin in plugins {
            commands.extend(plugin.commands.clone());
        }
        Self { commands }
    }

    pub fn lookup(&self, name: &str) -> Option<&CommandEntry> {
        self.commands.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.commands.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialect_from_extension() {
        assert_eq!(Dialect::from_extension("tcl"), Dialect::Tcl);
        assert_eq!(Dialect::from_extension("SDC"), Dialect::Sdc);
        assert_eq!(Dialect::from_extension("xdc"), Dialect::Xdc);
        assert_eq!(Dialect::from_extension("upf"), Dialect::Upf);
        assert_eq!(Dialect::from_extension("txt"), Dialect::Tcl);
    }

    #[test]
    fn test_dialect_layering() {
        let tcl = CommandRegistry::new(Dialect::Tcl);
        assert!(tcl.contains("proc"));
        assert!(!tcl.contains("create_clock"));

        let sdc = CommandRegistry::new(Dialect::Sdc);
        assert!(sdc.contains("proc"));
        assert!(sdc.contains("create_clock"));
        assert!(!sdc.contains("set_property"));

        let xdc = CommandRegistry::new(Dialect::Xdc);
        assert!(xdc.contains("create_clock"));
        assert!(xdc.contains("set_property"));

        let upf = CommandRegistry::new(Dialect::Upf);
        assert!(upf.contains("create_power_domain"));
    }

    #[test]
    fn test_plugin_shadows_builtin() {
        let plugin = Plugin {
            name: "test".into(),
            commands: IndexMap::from([("puts".into(), CommandEntry::Known)]),
        };
        let registry = CommandRegistry::with_plugins(Dialect::Tcl, &[plugin]);
        assert!(matches!(registry.lookup("puts"), Some(CommandEntry::Known)));
    }
}

//! Static command-spec plugins.
//!
//! A plugin is a JSON file declaring command specs:
//!
//! ```json
//! {
//!   "name": "my-tool",
//!   "commands": {
//!     "my_cmd": {
//!       "switches": {"-flag": {"required": false, "repeated": false, "value": null}},
//!       "positionals": [{"name": "target", "required": true, "value": {"type": "any"}}]
//!     },
//!     "other_cmd": null,
//!     "group": {"subcommands": {"run": null}}
//!   }
//! }
//! ```
//!
//! Plugins are loaded only from a path given explicitly in the
//! configuration; they are data, never code. A malformed spec rejects the
//! plugin whole.

use std::path::Path;

use indexmap::IndexMap;
use serde_json::Value;
use thiserror::Error;

use crate::commands::spec::{ArgSpec, PositionalSpec, PositionalValue, SwitchSpec, SwitchValue};
use crate::commands::{CommandEntry, SubTable};

#[derive(Debug, Error)]
pub enum PluginError {
    #[error("failed to read plugin file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid plugin JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid plugin spec: {0}")]
    Invalid(String),
}

fn invalid(message: impl Into<String>) -> PluginError {
    PluginError::Invalid(message.into())
}

/// A loaded plugin layer for the command registry.
#[derive(Debug, Clone)]
pub struct Plugin {
    pub name: String,
    pub commands: IndexMap<String, CommandEntry>,
}

pub fn load(path: &Path) -> Result<Plugin, PluginError> {
    let data = std::fs::read_to_string(path)?;
    parse(&data)
}

pub fn parse(data: &str) -> Result<Plugin, PluginError> {
    let value: Value = serde_json::from_str(data)?;
    let obj = value
        .as_object()
        .ok_or_else(|| invalid("expected top-level object"))?;

    for key in obj.keys() {
        if key != "name" && key != "commands" {
            return Err(invalid(format!("unknown key '{key}'")));
        }
    }

    let name = obj
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| invalid("missing or non-string 'name'"))?;
    let commands_value = obj
        .get("commands")
        .and_then(Value::as_object)
        .ok_or_else(|| invalid("missing 'commands' table"))?;

    let mut commands = IndexMap::new();
    for (cmd, spec) in commands_value {
        commands.insert(cmd.clone(), convert_entry(cmd, spec)?);
    }

    Ok(Plugin { name: name.to_string(), commands })
}

fn convert_entry(cmd: &str, value: &Value) -> Result<CommandEntry, PluginError> {
    if value.is_null() {
        return Ok(CommandEntry::Known);
    }

    let obj = value
        .as_object()
        .ok_or_else(|| invalid(format!("{cmd}: expected object or null")))?;

    if let Some(subs_value) = obj.get("subcommands") {
        if obj.len() != 1 {
            return Err(invalid(format!(
                "{cmd}: 'subcommands' cannot be combined with other keys"
            )));
        }
        let subs_obj = subs_value
            .as_object()
            .ok_or_else(|| invalid(format!("{cmd}: 'subcommands' must be an object")))?;

        let mut subs = IndexMap::new();
        let mut default = None;
        for (sub_name, sub_value) in subs_obj {
            let entry = convert_entry(&format!("{cmd} {sub_name}"), sub_value)?;
            if sub_name.is_empty() {
                default = Some(Box::new(entry));
            } else {
                subs.insert(sub_name.clone(), entry);
            }
        }
        return Ok(CommandEntry::Sub(SubTable { subs, default }));
    }

    for key in obj.keys() {
        if key != "switches" && key != "positionals" {
            return Err(invalid(format!("{cmd}: unknown key '{key}'")));
        }
    }

    let mut arg_spec = ArgSpec::default();

    if let Some(switches) = obj.get("switches") {
        let switches = switches
            .as_object()
            .ok_or_else(|| invalid(format!("{cmd}: 'switches' must be an object")))?;
        for (switch_name, switch_value) in switches {
            arg_spec
                .switches
                .insert(switch_name.clone(), convert_switch(cmd, switch_name, switch_value)?);
        }
    }

    if let Some(positionals) = obj.get("positionals") {
        let positionals = positionals
            .as_array()
            .ok_or_else(|| invalid(format!("{cmd}: 'positionals' must be an array")))?;
        for positional in positionals {
            arg_spec.positionals.push(convert_positional(cmd, positional)?);
        }
    }

    Ok(CommandEntry::Spec(arg_spec))
}

fn convert_switch(cmd: &str, name: &str, value: &Value) -> Result<SwitchSpec, PluginError> {
    let obj = value
        .as_object()
        .ok_or_else(|| invalid(format!("{cmd}: switch {name} must be an object")))?;

    for key in obj.keys() {
        if !matches!(key.as_str(), "required" | "repeated" | "value" | "metavar") {
            return Err(invalid(format!("{cmd}: switch {name}: unknown key '{key}'")));
        }
    }

    let required = get_bool(obj, "required")
        .ok_or_else(|| invalid(format!("{cmd}: switch {name}: missing bool 'required'")))?;
    let repeated = get_bool(obj, "repeated")
        .ok_or_else(|| invalid(format!("{cmd}: switch {name}: missing bool 'repeated'")))?;

    let value = match obj.get("value") {
        None | Some(Value::Null) => SwitchValue::None,
        Some(v) => match value_type(v) {
            Some("any") => SwitchValue::Any,
            Some("variadic") => SwitchValue::Variadic,
            _ => {
                return Err(invalid(format!(
                    "{cmd}: switch {name}: value type must be \"any\" or \"variadic\""
                )))
            }
        },
    };

    let metavar = obj.get("metavar").and_then(Value::as_str).map(str::to_string);

    Ok(SwitchSpec { required, repeated, value, metavar })
}

fn convert_positional(cmd: &str, value: &Value) -> Result<PositionalSpec, PluginError> {
    let obj = value
        .as_object()
        .ok_or_else(|| invalid(format!("{cmd}: positional must be an object")))?;

    for key in obj.keys() {
        if !matches!(key.as_str(), "name" | "required" | "value") {
            return Err(invalid(format!("{cmd}: positional: unknown key '{key}'")));
        }
    }

    let name = obj
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| invalid(format!("{cmd}: positional: missing string 'name'")))?;
    let required = get_bool(obj, "required")
        .ok_or_else(|| invalid(format!("{cmd}: positional {name}: missing bool 'required'")))?;

    let value = match obj.get("value").and_then(value_type) {
        Some("any") => PositionalValue::Any,
        Some("variadic") => PositionalValue::Variadic,
        Some("script") => PositionalValue::Script,
        Some("expression") => PositionalValue::Expression,
        _ => {
            return Err(invalid(format!(
                "{cmd}: positional {name}: value type must be one of \"any\", \
                 \"variadic\", \"script\", \"expression\""
            )))
        }
    };

    Ok(PositionalSpec { name: name.to_string(), required, value })
}

fn get_bool(obj: &serde_json::Map<String, Value>, key: &str) -> Option<bool> {
    obj.get(key).and_then(Value::as_bool)
}

fn value_type(value: &Value) -> Option<&str> {
    value.as_object()?.get("type")?.as_str()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plugin() {
        let plugin = parse(
            r#"{
                "name": "openroad",
                "commands": {
                    "read_def": {
                        "switches": {
                            "-order_wires": {"required": false, "repeated": false, "value": null},
                            "-floorplan_initialize": {"required": false, "repeated": false, "value": null}
                        },
                        "positionals": [
                            {"name": "filename", "required": true, "value": {"type": "any"}}
                        ]
                    },
                    "unchecked": null,
                    "report": {"subcommands": {"checks": null, "": null}}
                }
            }"#,
        )
        .expect("valid plugin");

        assert_eq!(plugin.name, "openroad");
        assert!(matches!(plugin.commands.get("unchecked"), Some(CommandEntry::Known)));
        let Some(CommandEntry::Spec(spec)) = plugin.commands.get("read_def") else {
            panic!("expected spec entry");
        };
        assert_eq!(spec.switches.len(), 2);
        assert_eq!(spec.positionals.len(), 1);
        let Some(CommandEntry::Sub(table)) = plugin.commands.get("report") else {
            panic!("expected sub table");
        };
        assert!(table.subs.contains_key("checks"));
        assert!(table.default.is_some());
    }

    #[test]
    fn test_reject_unknown_key() {
        let result = parse(r#"{"name": "x", "commands": {}, "extra": 1}"#);
        assert!(matches!(result, Err(PluginError::Invalid(_))));
    }

    #[test]
    fn test_reject_bad_value_type() {
        let result = parse(
            r#"{"name": "x", "commands": {"c": {"switches": {"-s": {"required": false, "repeated": false, "value": {"type": "bogus"}}}}}}"#,
        );
        assert!(matches!(result, Err(PluginError::Invalid(_))));
    }

    #[test]
    fn test_reject_missing_name() {
        let result = parse(r#"{"commands": {}}"#);
        assert!(matches!(result, Err(PluginError::Invalid(_))));
    }
}

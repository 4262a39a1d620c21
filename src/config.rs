//! Configuration.
//!
//! The TOML schema:
//!
//! ```toml
//! exclude = ["generated/"]
//! ignore = ["indent", { path = "legacy/", rules = ["spacing"] }]
//! extensions = ["tcl", "sdc", "xdc", "upf"]
//! commands = "plugin.json"
//!
//! [style]
//! indent = 4            # or "tab" or "mixed,<spaces>,<tabs>"
//! line-length = 100
//! max-blank-lines = 2
//! indent-namespace-eval = true
//! spaces-in-braces = false
//! allow-aligned-sets = false
//!
//! [[fileset]]
//! paths = ["rtl/"]
//! # overrides of everything above except exclude/extensions
//! ```
//!
//! Unknown keys are configuration errors; unknown rule ids in `ignore` are
//! reported as warnings and skipped. The first fileset whose path matches a
//! file wins.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::lint::violations::Rule;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config file: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Indentation unit for the formatter and the `indent` rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Indent {
    Spaces(usize),
    Tab,
    /// Indentation is `spaces` columns per level, emitted as tabs of width
    /// `tabs` followed by spaces for the remainder.
    Mixed { spaces: usize, tabs: usize },
}

impl Indent {
    pub fn string_for(&self, levels: usize) -> String {
        match self {
            Indent::Spaces(n) => " ".repeat(n * levels),
            Indent::Tab => "\t".repeat(levels),
            Indent::Mixed { spaces, tabs } => {
                let total = spaces * levels;
                let mut out = "\t".repeat(total / tabs);
                out.push_str(&" ".repeat(total % tabs));
                out
            }
        }
    }

    pub fn parse(value: &toml::Value) -> Result<Indent, ConfigError> {
        match value {
            toml::Value::Integer(n) if *n > 0 => Ok(Indent::Spaces(*n as usize)),
            toml::Value::String(s) => Indent::parse_str(s),
            _ => Err(ConfigError::Invalid(
                "indent must be a positive integer, \"tab\", or \"mixed,<spaces>,<tabs>\"".into(),
            )),
        }
    }

    pub fn parse_str(s: &str) -> Result<Indent, ConfigError> {
        if s == "tab" {
            return Ok(Indent::Tab);
        }
        if let Some(rest) = s.strip_prefix("mixed,") {
            let parts: Vec<&str> = rest.split(',').collect();
            if parts.len() == 2 {
                let spaces = parts[0].trim().parse::<usize>().ok();
                let tabs = parts[1].trim().parse::<usize>().ok();
                if let (Some(spaces), Some(tabs)) = (spaces, tabs) {
                    if spaces > 0 && tabs > 0 {
                        return Ok(Indent::Mixed { spaces, tabs });
                    }
                }
            }
            return Err(ConfigError::Invalid(
                "indent \"mixed\" must have the form \"mixed,<spaces>,<tabs>\"".into(),
            ));
        }
        if let Ok(n) = s.parse::<usize>() {
            if n > 0 {
                return Ok(Indent::Spaces(n));
            }
        }
        Err(ConfigError::Invalid(
            "indent must be a positive integer, \"tab\", or \"mixed,<spaces>,<tabs>\"".into(),
        ))
    }
}

/// Style options consumed by the formatter and the style rules.
#[derive(Debug, Clone, PartialEq)]
pub struct Style {
    pub indent: Indent,
    pub line_length: usize,
    pub max_blank_lines: usize,
    pub indent_namespace_eval: bool,
    pub spaces_in_braces: bool,
    pub allow_aligned_sets: bool,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            indent: Indent::Spaces(4),
            line_length: 100,
            max_blank_lines: 2,
            indent_namespace_eval: true,
            spaces_in_braces: false,
            allow_aligned_sets: false,
        }
    }
}

/// A single `ignore` entry: a rule disabled globally or under a path.
#[derive(Debug, Clone, PartialEq)]
pub enum IgnoreEntry {
    Rule(Rule),
    Path { path: PathBuf, rules: Vec<Rule> },
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub exclude: Vec<String>,
    pub ignore: Vec<IgnoreEntry>,
    pub extensions: Vec<String>,
    pub commands: Option<PathBuf>,
    pub style: Style,
}

impl Config {
    pub fn new() -> Self {
        Self {
            extensions: vec!["tcl".into(), "sdc".into(), "xdc".into(), "upf".into()],
            // the legacy indent rule overlaps with tclfmt; setting `ignore`
            // in the config replaces this default, which re-enables it
            ignore: vec![IgnoreEntry::Rule(Rule::Indent)],
            ..Self::default()
        }
    }

    /// Rules ignored for `path` (or globally when `path` is `None`).
    pub fn ignored_rules(&self, path: Option<&Path>) -> Vec<Rule> {
        let mut rules = Vec::new();
        for entry in &self.ignore {
            match entry {
                IgnoreEntry::Rule(rule) => rules.push(*rule),
                IgnoreEntry::Path { path: ignore_path, rules: path_rules } => {
                    if let Some(path) = path {
                        if path.starts_with(ignore_path) {
                            rules.extend(path_rules.iter().copied());
                        }
                    }
                }
            }
        }
        rules
    }
}

/// The full run configuration: global settings plus per-fileset overrides.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub global: Config,
    pub filesets: Vec<(Vec<PathBuf>, Config)>,
    pub warnings: Vec<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self { global: Config::new(), filesets: Vec::new(), warnings: Vec::new() }
    }
}

impl RunConfig {
    pub fn from_path(path: &Path) -> Result<RunConfig, ConfigError> {
        let data = std::fs::read_to_string(path)?;
        Self::from_str(&data)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(data: &str) -> Result<RunConfig, ConfigError> {
        let raw: RawConfig = toml::from_str(data)?;
        let mut warnings = Vec::new();

        let mut global = Config::new();
        if let Some(exclude) = raw.exclude {
            global.exclude = exclude;
        }
        if let Some(extensions) = raw.extensions {
            global.extensions = extensions;
        }
        if let Some(ignore) = &raw.ignore {
            global.ignore = convert_ignore(ignore, &mut warnings)?;
        }
        if let Some(commands) = raw.commands {
            global.commands = Some(commands);
        }
        if let Some(style) = &raw.style {
            apply_style(&mut global.style, style)?;
        }

        let mut filesets = Vec::new();
        for raw_fileset in raw.fileset.unwrap_or_default() {
            if raw_fileset.paths.is_empty() {
                return Err(ConfigError::Invalid(
                    "'fileset' table requires a non-empty 'paths' entry".into(),
                ));
            }
            let mut config = global.clone();
            if let Some(ignore) = &raw_fileset.ignore {
                config.ignore = convert_ignore(ignore, &mut warnings)?;
            }
            if let Some(commands) = raw_fileset.commands {
                config.commands = Some(commands);
            }
            if let Some(style) = &raw_fileset.style {
                apply_style(&mut config.style, style)?;
            }
            filesets.push((raw_fileset.paths, config));
        }

        Ok(RunConfig { global, filesets, warnings })
    }

    /// Returns the configuration for `path`. The first matching fileset
    /// wins; files matching no fileset get the global configuration.
    pub fn get_for_path(&self, path: Option<&Path>) -> &Config {
        if let Some(path) = path {
            for (paths, config) in &self.filesets {
                if paths.iter().any(|p| path.starts_with(p)) {
                    return config;
                }
            }
        }
        &self.global
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    exclude: Option<Vec<String>>,
    ignore: Option<Vec<toml::Value>>,
    extensions: Option<Vec<String>>,
    commands: Option<PathBuf>,
    style: Option<RawStyle>,
    fileset: Option<Vec<RawFileset>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawStyle {
    indent: Option<toml::Value>,
    #[serde(rename = "line-length")]
    line_length: Option<usize>,
    #[serde(rename = "max-blank-lines")]
    max_blank_lines: Option<usize>,
    #[serde(rename = "indent-namespace-eval")]
    indent_namespace_eval: Option<bool>,
    #[serde(rename = "spaces-in-braces")]
    spaces_in_braces: Option<bool>,
    #[serde(rename = "allow-aligned-sets")]
    allow_aligned_sets: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFileset {
    paths: Vec<PathBuf>,
    ignore: Option<Vec<toml::Value>>,
    commands: Option<PathBuf>,
    style: Option<RawStyle>,
}

fn apply_style(style: &mut Style, raw: &RawStyle) -> Result<(), ConfigError> {
    if let Some(indent) = &raw.indent {
        style.indent = Indent::parse(indent)?;
    }
    if let Some(line_length) = raw.line_length {
        style.line_length = line_length;
    }
    if let Some(max_blank_lines) = raw.max_blank_lines {
        style.max_blank_lines = max_blank_lines;
    }
    if let Some(indent_namespace_eval) = raw.indent_namespace_eval {
        style.indent_namespace_eval = indent_namespace_eval;
    }
    if let Some(spaces_in_braces) = raw.spaces_in_braces {
        style.spaces_in_braces = spaces_in_braces;
    }
    if let Some(allow_aligned_sets) = raw.allow_aligned_sets {
        style.allow_aligned_sets = allow_aligned_sets;
    }
    Ok(())
}

fn convert_ignore(
    entries: &[toml::Value],
    warnings: &mut Vec<String>,
) -> Result<Vec<IgnoreEntry>, ConfigError> {
    let mut out = Vec::new();
    for entry in entries {
        match entry {
            toml::Value::String(id) => match Rule::from_id(id) {
                Some(rule) => out.push(IgnoreEntry::Rule(rule)),
                None => warnings.push(format!("unknown rule id in 'ignore': {id}")),
            },
            toml::Value::Table(table) => {
                let path = table
                    .get("path")
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| {
                        ConfigError::Invalid("'ignore' table requires a 'path' string".into())
                    })?;
                let rule_values = table
                    .get("rules")
                    .and_then(|v| v.as_array())
                    .ok_or_else(|| {
                        ConfigError::Invalid("'ignore' table requires a 'rules' array".into())
                    })?;
                for key in table.keys() {
                    if key != "path" && key != "rules" {
                        return Err(ConfigError::Invalid(format!(
                            "unknown key '{key}' in 'ignore' table"
                        )));
                    }
                }
                let mut rules = Vec::new();
                for value in rule_values {
                    let id = value.as_str().ok_or_else(|| {
                        ConfigError::Invalid("'ignore' rules must be strings".into())
                    })?;
                    match Rule::from_id(id) {
                        Some(rule) => rules.push(rule),
                        None => warnings.push(format!("unknown rule id in 'ignore': {id}")),
                    }
                }
                out.push(IgnoreEntry::Path { path: PathBuf::from(path), rules });
            }
            _ => {
                return Err(ConfigError::Invalid(
                    "'ignore' entries must be rule ids or { path, rules } tables".into(),
                ))
            }
        }
    }
    Ok(out)
}

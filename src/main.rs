use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, Parser};

use tclint::commands::plugins;
use tclint::config::{Indent, RunConfig};
use tclint::{CommandRegistry, Dialect, Plugin, Rule};

// exit code flags
const EXIT_OK: u8 = 0;
const EXIT_LINT_VIOLATIONS: u8 = 1;
const EXIT_SYNTAX_ERROR: u8 = 2;
const EXIT_INPUT_ERROR: u8 = 4;

#[derive(Parser)]
#[command(name = "tclint")]
#[command(about = "Lint Tcl, SDC, XDC, and UPF scripts")]
#[command(version)]
struct Cli {
    /// Files or directories to lint. Provide '-' to read from stdin
    #[arg(required = true)]
    source: Vec<PathBuf>,

    /// Path to config file
    #[arg(short = 'c', long = "config", value_name = "path")]
    config: Option<PathBuf>,

    /// Display debug output (repeat to increase verbosity)
    #[arg(short = 'd', long = "debug", action = ArgAction::Count)]
    debug: u8,

    /// Print the category tag for each violation
    #[arg(long = "show-categories")]
    show_categories: bool,

    /// Override style.indent (e.g. 4, "tab", or "mixed,<spaces>,<tabs>")
    #[arg(long = "style-indent", value_name = "indent")]
    style_indent: Option<String>,

    /// Override style.line-length
    #[arg(long = "style-line-length", value_name = "n")]
    style_line_length: Option<usize>,
}

const DEFAULT_CONFIGS: [&str; 2] = ["tclint.toml", ".tclint"];

fn load_config(explicit: Option<&Path>) -> Result<RunConfig, String> {
    if let Some(path) = explicit {
        if !path.exists() {
            return Err(format!("path {} doesn't exist", path.display()));
        }
        return RunConfig::from_path(path).map_err(|e| e.to_string());
    }

    for name in DEFAULT_CONFIGS {
        let path = Path::new(name);
        if path.exists() {
            return RunConfig::from_path(path).map_err(|e| e.to_string());
        }
    }

    Ok(RunConfig::default())
}

/// Resolve CLI paths to files to lint. Directories are walked recursively
/// for files with a configured extension; `None` stands for stdin.
///
/// Exclusion uses a simplified pattern match: a pattern excludes a file
/// when it names one of its path components or a suffix of its path.
fn resolve_sources(
    paths: &[PathBuf],
    exclude: &[String],
    extensions: &[String],
) -> Result<Vec<Option<PathBuf>>, String> {
    let is_excluded = |path: &Path| {
        exclude.iter().any(|pattern| {
            let pattern = pattern.trim_end_matches('/');
            path.components()
                .any(|c| c.as_os_str().to_string_lossy() == pattern)
                || path.to_string_lossy().ends_with(pattern)
        })
    };

    let mut sources = Vec::new();
    for path in paths {
        if path.as_os_str() == "-" {
            sources.push(None);
            continue;
        }
        if !path.exists() {
            return Err(format!("path {} does not exist", path.display()));
        }
        if is_excluded(path) {
            continue;
        }
        if !path.is_dir() {
            sources.push(Some(path.clone()));
            continue;
        }
        for entry in walkdir::WalkDir::new(path)
            .sort_by_file_name()
            .into_iter()
            .filter_map(Result::ok)
        {
            if !entry.file_type().is_file() {
                continue;
            }
            let child = entry.path();
            let ext = child
                .extension()
                .map(|e| e.to_string_lossy().to_lowercase())
                .unwrap_or_default();
            if extensions.contains(&ext) && !is_excluded(child) {
                sources.push(Some(child.to_path_buf()));
            }
        }
    }

    Ok(sources)
}

fn dialect_for(path: Option<&Path>) -> Dialect {
    path.and_then(|p| p.extension())
        .map(|e| Dialect::from_extension(&e.to_string_lossy()))
        .unwrap_or(Dialect::Tcl)
}

fn run() -> u8 {
    let cli = Cli::parse();

    let mut run_config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid config file: {e}");
            return EXIT_INPUT_ERROR;
        }
    };
    for warning in &run_config.warnings {
        eprintln!("Warning: {warning}");
    }

    // CLI style overrides apply to the global config and every fileset
    if let Some(indent) = &cli.style_indent {
        let indent = match Indent::parse_str(indent) {
            Ok(indent) => indent,
            Err(e) => {
                eprintln!("{e}");
                return EXIT_INPUT_ERROR;
            }
        };
        run_config.global.style.indent = indent.clone();
        for (_, config) in &mut run_config.filesets {
            config.style.indent = indent.clone();
        }
    }
    if let Some(line_length) = cli.style_line_length {
        run_config.global.style.line_length = line_length;
        for (_, config) in &mut run_config.filesets {
            config.style.line_length = line_length;
        }
    }

    let sources = match resolve_sources(
        &cli.source,
        &run_config.global.exclude,
        &run_config.global.extensions,
    ) {
        Ok(sources) => sources,
        Err(e) => {
            eprintln!("Invalid path provided: {e}");
            return EXIT_INPUT_ERROR;
        }
    };

    let mut plugin_cache: HashMap<PathBuf, Vec<Plugin>> = HashMap::new();
    let mut retcode = EXIT_OK;

    for source in sources {
        let (script, display) = match &source {
            None => {
                let mut buf = String::new();
                if let Err(e) = std::io::stdin().read_to_string(&mut buf) {
                    eprintln!("failed to read stdin: {e}");
                    retcode |= EXIT_INPUT_ERROR;
                    continue;
                }
                (buf, "(stdin)".to_string())
            }
            Some(path) => match std::fs::read_to_string(path) {
                Ok(script) => (script, path.display().to_string()),
                Err(e) => {
                    eprintln!("failed to read {}: {e}", path.display());
                    retcode |= EXIT_INPUT_ERROR;
                    continue;
                }
            },
        };

        let path = source.as_deref();
        let config = run_config.get_for_path(path).clone();

        let plugins: Vec<Plugin> = match &config.commands {
            None => Vec::new(),
            Some(plugin_path) => match plugin_cache.get(plugin_path) {
                Some(cached) => cached.clone(),
                None => {
                    let loaded = match plugins::load(plugin_path) {
                        Ok(plugin) => vec![plugin],
                        Err(e) => {
                            eprintln!("Warning: rejecting plugin {}: {e}", plugin_path.display());
                            retcode |= EXIT_INPUT_ERROR;
                            Vec::new()
                        }
                    };
                    plugin_cache.insert(plugin_path.clone(), loaded.clone());
                    loaded
                }
            },
        };

        let dialect = dialect_for(path);

        if cli.debug > 0 {
            let registry = CommandRegistry::with_plugins(dialect, &plugins);
            let mut parser = tclint::Parser::new(&registry);
            let tree = parser.parse(&script);
            println!("{}", tree.pretty());
        }

        let result = tclint::lint(&script, &config, dialect, &plugins, path);
        for warning in &result.warnings {
            eprintln!("{display}: Warning: {warning}");
        }

        for violation in &result.violations {
            if cli.show_categories {
                println!("{display}:{violation} ({})", violation.rule.category());
            } else {
                println!("{display}:{violation}");
            }
            if violation.rule == Rule::SyntaxError {
                retcode |= EXIT_SYNTAX_ERROR;
            } else {
                retcode |= EXIT_LINT_VIOLATIONS;
            }
        }
    }

    retcode
}

fn main() -> ExitCode {
    ExitCode::from(run())
}

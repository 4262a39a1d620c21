use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;

use tclint::commands::plugins;
use tclint::config::RunConfig;
use tclint::driver::FormatError;
use tclint::{Dialect, Plugin};

const EXIT_OK: u8 = 0;
const EXIT_WOULD_REFORMAT: u8 = 1;
const EXIT_SYNTAX_ERROR: u8 = 2;
const EXIT_INPUT_ERROR: u8 = 4;

#[derive(Parser)]
#[command(name = "tclfmt")]
#[command(about = "Format Tcl, SDC, XDC, and UPF scripts")]
#[command(version)]
struct Cli {
    /// Files to format. Provide '-' to read from stdin
    #[arg(required = true)]
    source: Vec<PathBuf>,

    /// Path to config file
    #[arg(short = 'c', long = "config", value_name = "path")]
    config: Option<PathBuf>,

    /// Rewrite files in place instead of printing to stdout
    #[arg(long = "in-place", conflicts_with = "check")]
    in_place: bool,

    /// Exit non-zero if any file would be reformatted, without writing
    #[arg(long = "check")]
    check: bool,

    /// Verify that the formatted output parses to an equivalent tree
    #[arg(short = 'd', long = "debug")]
    debug: bool,
}

fn load_config(explicit: Option<&Path>) -> Result<RunConfig, String> {
    if let Some(path) = explicit {
        if !path.exists() {
            return Err(format!("path {} doesn't exist", path.display()));
        }
        return RunConfig::from_path(path).map_err(|e| e.to_string());
    }
    for name in ["tclint.toml", ".tclint"] {
        let path = Path::new(name);
        if path.exists() {
            return RunConfig::from_path(path).map_err(|e| e.to_string());
        }
    }
    Ok(RunConfig::default())
}

fn run() -> u8 {
    let cli = Cli::parse();

    let run_config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid config file: {e}");
            return EXIT_INPUT_ERROR;
        }
    };
    for warning in &run_config.warnings {
        eprintln!("Warning: {warning}");
    }

    let mut retcode = EXIT_OK;

    for source in &cli.source {
        let stdin = source.as_os_str() == "-";
        let (script, display) = if stdin {
            let mut buf = String::new();
            use std::io::Read;
            if let Err(e) = std::io::stdin().read_to_string(&mut buf) {
                eprintln!("failed to read stdin: {e}");
                retcode |= EXIT_INPUT_ERROR;
                continue;
            }
            (buf, "(stdin)".to_string())
        } else {
            match std::fs::read_to_string(source) {
                Ok(script) => (script, source.display().to_string()),
                Err(e) => {
                    eprintln!("failed to read {}: {e}", source.display());
                    retcode |= EXIT_INPUT_ERROR;
                    continue;
                }
            }
        };

        let path = if stdin { None } else { Some(source.as_path()) };
        let config = run_config.get_for_path(path);

        let plugins: Vec<Plugin> = match &config.commands {
            None => Vec::new(),
            Some(plugin_path) => match plugins::load(plugin_path) {
                Ok(plugin) => vec![plugin],
                Err(e) => {
                    eprintln!("Warning: rejecting plugin {}: {e}", plugin_path.display());
                    retcode |= EXIT_INPUT_ERROR;
                    Vec::new()
                }
            },
        };

        let dialect = path
            .and_then(|p| p.extension())
            .map(|e| Dialect::from_extension(&e.to_string_lossy()))
            .unwrap_or(Dialect::Tcl);

        let result = tclint::format_source(&script, config, dialect, &plugins, cli.debug);
        let output = match result {
            Ok(result) => result.output,
            Err(e @ FormatError::Syntax(_)) => {
                eprintln!("{display}: {e}");
                retcode |= EXIT_SYNTAX_ERROR;
                continue;
            }
            Err(e) => {
                // round-trip failure is a bug in the formatter, not the input
                eprintln!("{display}: internal error: {e}");
                retcode |= EXIT_INPUT_ERROR;
                continue;
            }
        };

        if cli.check {
            if output != script {
                println!("would reformat {display}");
                retcode |= EXIT_WOULD_REFORMAT;
            }
        } else if cli.in_place && !stdin {
            if output != script {
                if let Err(e) = std::fs::write(source, &output) {
                    eprintln!("failed to write {}: {e}", source.display());
                    retcode |= EXIT_INPUT_ERROR;
                }
            }
        } else {
            print!("{output}");
        }
    }

    retcode
}

fn main() -> ExitCode {
    ExitCode::from(run())
}

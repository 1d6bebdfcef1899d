//! `glintc` - compiles and runs a Glint script.
//!
//! Pipeline: source text -> `glintc_parser::compile` (Lexer + Parser +
//! Emitter) -> `CodeObject` -> `glintc_vm::Vm::run`. Every phase's error
//! converts into `GlintError` via `?`, and this binary is the only place
//! that turns one into a process exit code.

mod config;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser as ClapParser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use config::Config;
use glintc_util::error::GlintError;
use glintc_vm::{Vm, VmConfig};

/// Run a Glint script from a file or inline source.
#[derive(ClapParser, Debug)]
#[command(name = "glintc")]
#[command(author = "Glint Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Compile and run a Glint script", long_about = None)]
struct Cli {
    /// Source file to run. Omit when using `--eval`.
    script: Option<PathBuf>,

    /// Inline source to run instead of a file.
    #[arg(short = 'e', long = "eval")]
    eval: Option<String>,

    /// Path to a TOML configuration file.
    #[arg(long, env = "GLINTC_CONFIG")]
    config: Option<PathBuf>,

    /// Overrides the configured VM stack size.
    #[arg(long)]
    stack_size: Option<usize>,

    /// Overrides the configured argv offset to 3 (script path occupies the
    /// skipped slot).
    #[arg(long)]
    file_first_argv: bool,

    /// Arguments passed through to the running script as its argv.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    script_args: Vec<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("glintc: {err}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("GLINTC_LOG")
        .or_else(|_| EnvFilter::try_from_env("RUST_LOG"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .try_init();
}

fn run(cli: Cli) -> Result<(), GlintError> {
    let config = match cli.config.as_deref() {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };

    let source = load_source(cli.script.as_deref(), cli.eval.as_deref())?;
    let code = glintc_parser::compile(&source)?;

    let vm_config = VmConfig {
        stack_size: cli.stack_size.unwrap_or(config.stack_size),
        argv_offset: if cli.file_first_argv || config.file_first_argv { 3 } else { 2 },
    };
    let mut vm = Vm::new(vm_config, cli.script_args);
    vm.run(&code)?;
    Ok(())
}

fn load_source(script: Option<&Path>, eval: Option<&str>) -> Result<String, GlintError> {
    match (script, eval) {
        (Some(path), _) => std::fs::read_to_string(path).map_err(|source| GlintError::Io {
            path: path.display().to_string(),
            source,
        }),
        (None, Some(src)) => Ok(src.to_string()),
        (None, None) => Err(GlintError::Io {
            path: "<none>".to_string(),
            source: std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "no script path or --eval source given",
            ),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_inline_eval_flag() {
        let cli = Cli::parse_from(["glintc", "-e", "print 1;"]);
        assert_eq!(cli.eval.as_deref(), Some("print 1;"));
        assert!(cli.script.is_none());
    }

    #[test]
    fn parses_script_path_and_trailing_args() {
        let cli = Cli::parse_from(["glintc", "script.glint", "one", "two"]);
        assert_eq!(cli.script, Some(PathBuf::from("script.glint")));
        assert_eq!(cli.script_args, vec!["one".to_string(), "two".to_string()]);
    }

    #[test]
    fn load_source_prefers_file_over_eval() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("a.glint");
        std::fs::write(&path, "print 1;").unwrap();
        let src = load_source(Some(&path), Some("print 2;")).unwrap();
        assert_eq!(src, "print 1;");
    }

    #[test]
    fn load_source_errors_with_neither_script_nor_eval() {
        assert!(load_source(None, None).is_err());
    }
}

use std::ffi::OsString;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

mod check;
mod cli_args;
mod error_map;
mod project_loader;
mod runner;

pub(crate) use check::run_check;
pub(crate) use cli_args::{CheckArgs, Cli, Mode, RunArgs};
pub(crate) use error_map::{
    emit_error, map_cli_limits_invalid, map_cli_limits_read, map_cli_output,
    map_cli_source_path, map_cli_source_read, map_cli_source_scan, map_tag_parse, CliError,
};
pub(crate) use project_loader::{read_limits, read_project_scripts, resolve_project_dir};
pub(crate) use runner::run_project;

/// Installs the stderr log subscriber. `RUST_LOG` overrides the `warn`
/// default.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn run_cli_from_args<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => {
            let _ = error.print();
            return error.exit_code();
        }
    };
    match run(cli) {
        Ok(code) => code,
        Err(error) => emit_error(error),
    }
}

fn run(cli: Cli) -> Result<i32, CliError> {
    match cli.command {
        Mode::Check(args) => run_check(args),
        Mode::Run(args) => run_project(args),
    }
}

#[cfg(test)]
mod cli_test_support;

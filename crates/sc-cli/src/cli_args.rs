use clap::{Args, Parser, Subcommand};

pub(crate) const DEFAULT_MAX_FRAMES: u64 = 10_000;

#[derive(Debug, Parser)]
#[command(name = "sc-cli")]
#[command(about = "Scenario tag engine CLI")]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Mode,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Mode {
    /// Parse one tag document and list its commands.
    Check(CheckArgs),
    /// Run a script project frame by frame.
    Run(RunArgs),
}

#[derive(Debug, Args)]
pub(crate) struct CheckArgs {
    #[arg(long = "file")]
    pub(crate) file: String,
    #[arg(long = "limits")]
    pub(crate) limits: Option<String>,
    #[arg(long = "json")]
    pub(crate) json: bool,
}

#[derive(Debug, Args)]
pub(crate) struct RunArgs {
    #[arg(long = "project-dir")]
    pub(crate) project_dir: String,
    #[arg(long = "scenario")]
    pub(crate) scenario: Option<String>,
    #[arg(long = "max-frames", default_value_t = DEFAULT_MAX_FRAMES)]
    pub(crate) max_frames: u64,
    #[arg(long = "limits")]
    pub(crate) limits: Option<String>,
}

use std::fmt::{self, Display};

use sc_api::ApiError;
use sc_core::{DispatchError, ParseError};
use tracing::error;

/// Error block the CLI reports on stdout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CliError {
    pub(crate) code: String,
    pub(crate) message: String,
}

impl CliError {
    pub(crate) fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl From<ApiError> for CliError {
    fn from(error: ApiError) -> Self {
        Self::new(error.code(), error.to_string())
    }
}

impl From<DispatchError> for CliError {
    fn from(error: DispatchError) -> Self {
        Self::new(error.code(), error.to_string())
    }
}

fn map_error(code: &'static str, error: impl Display) -> CliError {
    CliError::new(code, error.to_string())
}

pub(crate) fn emit_error(error: CliError) -> i32 {
    error!(code = %error.code, "{}", error.message);
    println!("RESULT:ERROR");
    println!("ERROR_CODE:{}", error.code);
    println!(
        "ERROR_MSG_JSON:{}",
        serde_json::to_string(&error.message).unwrap_or_else(|_| "\"Unknown error\"".to_string())
    );
    1
}

pub(crate) fn map_tag_parse(file: &str, error: ParseError) -> CliError {
    CliError::new(error.code(), error.diagnostic(file).to_string())
}

pub(crate) fn map_cli_source_path(error: std::io::Error) -> CliError {
    map_error("CLI_SOURCE_PATH", error)
}

pub(crate) fn map_cli_source_scan(error: std::path::StripPrefixError) -> CliError {
    map_error("CLI_SOURCE_SCAN", error)
}

pub(crate) fn map_cli_source_read(error: std::io::Error) -> CliError {
    map_error("CLI_SOURCE_READ", error)
}

pub(crate) fn map_cli_limits_read(error: std::io::Error) -> CliError {
    map_error("CLI_LIMITS_READ", error)
}

pub(crate) fn map_cli_limits_invalid(error: serde_json::Error) -> CliError {
    map_error("CLI_LIMITS_INVALID", error)
}

pub(crate) fn map_cli_output(error: serde_json::Error) -> CliError {
    map_error("CLI_OUTPUT", error)
}

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use sc_core::ParseLimits;
use tracing::debug;
use walkdir::WalkDir;

use crate::{
    map_cli_limits_invalid, map_cli_limits_read, map_cli_source_path, map_cli_source_read,
    map_cli_source_scan, CliError,
};

pub(crate) const SCRIPT_EXTENSION: &str = ".rhai";

pub(crate) fn resolve_project_dir(project_dir: &str) -> Result<PathBuf, CliError> {
    let path = PathBuf::from(project_dir);
    let absolute = if path.is_absolute() {
        path
    } else {
        std::env::current_dir()
            .map_err(map_cli_source_path)?
            .join(path)
    };

    if !absolute.exists() {
        return Err(CliError::new(
            "CLI_SOURCE_NOT_FOUND",
            format!("project-dir does not exist: {}", absolute.display()),
        ));
    }

    if !absolute.is_dir() {
        return Err(CliError::new(
            "CLI_SOURCE_NOT_DIR",
            format!("project-dir is not a directory: {}", absolute.display()),
        ));
    }

    Ok(absolute)
}

/// Collects every `.rhai` file under `project_dir`, keyed by its relative
/// `/`-separated path.
pub(crate) fn read_project_scripts(
    project_dir: &Path,
) -> Result<BTreeMap<String, String>, CliError> {
    let mut scripts = BTreeMap::new();

    for entry in WalkDir::new(project_dir)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
    {
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        if !path.to_string_lossy().ends_with(SCRIPT_EXTENSION) {
            continue;
        }

        let relative = path
            .strip_prefix(project_dir)
            .map_err(map_cli_source_scan)?
            .to_string_lossy()
            .replace('\\', "/");

        let content = fs::read_to_string(path).map_err(map_cli_source_read)?;
        debug!(script = %relative, "found project script");
        scripts.insert(relative, content);
    }

    if scripts.is_empty() {
        return Err(CliError::new(
            "CLI_SOURCE_EMPTY",
            format!("No .rhai files under {}", project_dir.display()),
        ));
    }

    Ok(scripts)
}

/// Reads parser limits from a JSON file; missing fields keep their defaults.
pub(crate) fn read_limits(path: Option<&str>) -> Result<ParseLimits, CliError> {
    let Some(path) = path else {
        return Ok(ParseLimits::default());
    };
    let raw = fs::read_to_string(path).map_err(map_cli_limits_read)?;
    serde_json::from_str(&raw).map_err(map_cli_limits_invalid)
}

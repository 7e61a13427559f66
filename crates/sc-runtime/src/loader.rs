use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use sc_core::{LoadError, ParseLimits};
use sc_parser::parse_tag_document_into;
use tracing::{debug, info, warn};

use crate::table::{CommandTable, TableError};

/// File-content collaborator used to fetch tag documents by identifier.
pub trait SourceLoader {
    fn load_content(&self, path: &str) -> io::Result<Vec<u8>>;
}

/// Reads documents relative to a root directory.
#[derive(Debug, Clone)]
pub struct FsSourceLoader {
    root: PathBuf,
}

impl FsSourceLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> io::Result<PathBuf> {
        let relative = Path::new(path);
        let escapes_root = relative.components().any(|component| {
            matches!(
                component,
                Component::ParentDir | Component::RootDir | Component::Prefix(_)
            )
        });
        if escapes_root {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("path escapes the project root: {}", path),
            ));
        }
        Ok(self.root.join(relative))
    }
}

impl SourceLoader for FsSourceLoader {
    fn load_content(&self, path: &str) -> io::Result<Vec<u8>> {
        fs::read(self.resolve(path)?)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemorySourceLoader {
    files: BTreeMap<String, String>,
}

impl MemorySourceLoader {
    pub fn new(files: BTreeMap<String, String>) -> Self {
        Self { files }
    }

    pub fn insert(&mut self, path: impl Into<String>, content: impl Into<String>) {
        self.files.insert(path.into(), content.into());
    }
}

impl SourceLoader for MemorySourceLoader {
    fn load_content(&self, path: &str) -> io::Result<Vec<u8>> {
        self.files
            .get(path)
            .map(|content| content.as_bytes().to_vec())
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("no such file: {}", path)))
    }
}

/// Replaces the table with the commands of `file`.
///
/// A read failure leaves the table untouched. Once the text is read the table
/// is reset, and any parse failure leaves it empty.
pub fn load_scenario(
    table: &mut CommandTable,
    loader: &dyn SourceLoader,
    limits: &ParseLimits,
    file: &str,
) -> Result<(), LoadError> {
    debug!(file, "loading scenario");

    let bytes = loader.load_content(file).map_err(|source| LoadError::Io {
        file: file.to_string(),
        source,
    })?;
    let text = String::from_utf8(bytes).map_err(|error| LoadError::Io {
        file: file.to_string(),
        source: io::Error::new(io::ErrorKind::InvalidData, error),
    })?;

    table.reset();

    if let Err(error) = parse_tag_document_into(&text, limits, table) {
        table.reset();
        let error = match error {
            TableError::Parse(error) => LoadError::Parse {
                file: file.to_string(),
                error,
            },
            TableError::OutOfMemory => LoadError::OutOfMemory {
                file: file.to_string(),
            },
        };
        warn!(diagnostic = %error.diagnostic(), "scenario load failed");
        return Err(error);
    }

    table.set_current_file(file);
    info!(file, commands = table.len(), "scenario loaded");
    Ok(())
}

use std::fmt;

use thiserror::Error;

/// Operator-facing error line: `<file>:<line>: error: <message>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub file: String,
    pub line: usize,
    pub message: String,
}

impl Diagnostic {
    pub fn new(file: impl Into<String>, line: usize, message: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            line,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: error: {}", self.file, self.line, self.message)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("Invalid character.")]
    InvalidCharacter,
    #[error("Tag name too long.")]
    TagNameTooLong,
    #[error("Property name too long.")]
    PropertyNameTooLong,
    #[error("Property value too long.")]
    PropertyValueTooLong,
    #[error("Too many properties.")]
    TooManyProperties,
    #[error("Too many commands.")]
    TooManyCommands,
    #[error("Unexpected EOF")]
    UnexpectedEof,
}

impl ParseErrorKind {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidCharacter => "TAG_INVALID_CHARACTER",
            Self::TagNameTooLong => "TAG_NAME_TOO_LONG",
            Self::PropertyNameTooLong => "TAG_PROPERTY_NAME_TOO_LONG",
            Self::PropertyValueTooLong => "TAG_PROPERTY_VALUE_TOO_LONG",
            Self::TooManyProperties => "TAG_TOO_MANY_PROPERTIES",
            Self::TooManyCommands => "TAG_TOO_MANY_COMMANDS",
            Self::UnexpectedEof => "TAG_UNEXPECTED_EOF",
        }
    }
}

/// Failure of one parse attempt. `line` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{kind}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub line: usize,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, line: usize) -> Self {
        Self { kind, line }
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn diagnostic(&self, file: &str) -> Diagnostic {
        Diagnostic::new(file, self.line, self.kind.to_string())
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Could not read file \"{file}\": {source}")]
    Io {
        file: String,
        #[source]
        source: std::io::Error,
    },
    #[error("tag error: {file}:{}: {}", .error.line, .error.kind)]
    Parse {
        file: String,
        #[source]
        error: ParseError,
    },
    #[error("Out of memory.")]
    OutOfMemory { file: String },
}

impl LoadError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Io { .. } => "LOAD_IO",
            Self::Parse { error, .. } => error.code(),
            Self::OutOfMemory { .. } => "LOAD_OUT_OF_MEMORY",
        }
    }

    pub fn file(&self) -> &str {
        match self {
            Self::Io { file, .. } | Self::Parse { file, .. } | Self::OutOfMemory { file } => file,
        }
    }

    pub fn diagnostic(&self) -> Diagnostic {
        match self {
            Self::Io { file, source } => Diagnostic::new(file.as_str(), 0, source.to_string()),
            Self::Parse { file, error } => error.diagnostic(file),
            Self::OutOfMemory { file } => Diagnostic::new(file.as_str(), 0, "Out of memory."),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptErrorKind {
    Compile,
    MissingFunction,
    Runtime,
}

/// Error reported by the script runtime, positioned in script source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{file}:{line}: error: {message}")]
pub struct ScriptError {
    pub kind: ScriptErrorKind,
    pub file: String,
    pub line: usize,
    pub message: String,
}

impl ScriptError {
    pub fn new(
        kind: ScriptErrorKind,
        file: impl Into<String>,
        line: usize,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            file: file.into(),
            line,
            message: message.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self.kind {
            ScriptErrorKind::Compile => "SCRIPT_COMPILE",
            ScriptErrorKind::MissingFunction => "SCRIPT_FUNCTION_MISSING",
            ScriptErrorKind::Runtime => "SCRIPT_RUNTIME",
        }
    }

    pub fn diagnostic(&self) -> Diagnostic {
        Diagnostic::new(self.file.as_str(), self.line, self.message.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("{file}:0: error: No tag left to run.")]
    EndOfScenario { file: String },
    #[error("{file}:{line}: error: Handler \"{tag}\" is not defined.")]
    MissingHandler {
        file: String,
        line: usize,
        tag: String,
    },
    #[error(transparent)]
    Handler(#[from] ScriptError),
}

impl DispatchError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::EndOfScenario { .. } => "DISPATCH_END_OF_SCENARIO",
            Self::MissingHandler { .. } => "DISPATCH_HANDLER_MISSING",
            Self::Handler(error) => error.code(),
        }
    }

    pub fn diagnostic(&self) -> Diagnostic {
        match self {
            Self::EndOfScenario { file } => Diagnostic::new(file.as_str(), 0, "No tag left to run."),
            Self::MissingHandler { file, line, tag } => Diagnostic::new(
                file.as_str(),
                *line,
                format!("Handler \"{}\" is not defined.", tag),
            ),
            Self::Handler(error) => error.diagnostic(),
        }
    }
}

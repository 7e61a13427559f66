use sc_core::{Command, ParseError};
use sc_parser::TagSink;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TableError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("Out of memory.")]
    OutOfMemory,
}

/// Commands of the currently loaded tag document plus the execution cursor.
///
/// `cursor` stays within `0..=len`; `generation` increases on every reset so a
/// dispatcher can tell that a handler replaced the table under it.
#[derive(Debug, Default)]
pub struct CommandTable {
    commands: Vec<Command>,
    cursor: usize,
    current_file: Option<String>,
    generation: u64,
}

impl CommandTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn current_file(&self) -> Option<&str> {
        self.current_file.as_deref()
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn get(&self, index: usize) -> Option<&Command> {
        self.commands.get(index)
    }

    pub fn current(&self) -> Option<&Command> {
        self.commands.get(self.cursor)
    }

    pub fn is_finished(&self) -> bool {
        self.cursor >= self.commands.len()
    }

    pub fn advance(&mut self) {
        if self.cursor < self.commands.len() {
            self.cursor += 1;
        }
    }

    pub fn rewind(&mut self) {
        self.cursor = 0;
    }

    pub fn reset(&mut self) {
        self.commands = Vec::new();
        self.cursor = 0;
        self.current_file = None;
        self.generation += 1;
    }

    pub(crate) fn set_current_file(&mut self, file: &str) {
        self.current_file = Some(file.to_string());
    }
}

impl TagSink for CommandTable {
    type Error = TableError;

    fn accept(&mut self, command: Command) -> Result<(), TableError> {
        self.commands
            .try_reserve(1)
            .map_err(|_| TableError::OutOfMemory)?;
        self.commands.push(command);
        Ok(())
    }
}

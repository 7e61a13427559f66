use sc_core::{DispatchError, ScriptErrorKind, ScriptValue};
use tracing::{debug, warn};

use crate::engine::ScenarioEngine;
use crate::script::ScriptRuntime;

/// Result of one frame tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The handler finished and the cursor moved to the next tag.
    Advanced,
    /// The handler returned `false`; the same tag runs again next tick.
    Held,
    /// The handler replaced the command table; the cursor is at the start of it.
    Jumped,
    /// No tag left; nothing was called.
    Finished,
}

impl StepOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Advanced => "advanced",
            Self::Held => "held",
            Self::Jumped => "jumped",
            Self::Finished => "finished",
        }
    }
}

impl<R: ScriptRuntime> ScenarioEngine<R> {
    /// Calls the handler named after the tag at the cursor.
    ///
    /// The cursor is left where it is; see [`ScenarioEngine::step`] for the
    /// frame-tick policy.
    pub fn run_current(&mut self) -> Result<ScriptValue, DispatchError> {
        let (file, tag, args, line) = {
            let table = self.scenario().table();
            let file = table.current_file().unwrap_or_default().to_string();
            let Some(command) = table.current() else {
                return Err(DispatchError::EndOfScenario { file });
            };
            (
                file,
                command.tag_name.clone(),
                command.argument_map(),
                command.line,
            )
        };

        debug!(file = %file, tag = %tag, line, "dispatching tag");

        self.runtime_mut().call(&tag, args).map_err(|error| {
            let error = match error.kind {
                ScriptErrorKind::MissingFunction => DispatchError::MissingHandler {
                    file,
                    line,
                    tag,
                },
                _ => DispatchError::Handler(error),
            };
            warn!(diagnostic = %error.diagnostic(), "tag dispatch failed");
            error
        })
    }

    /// Runs one frame tick.
    ///
    /// A handler returning `false` holds its tag for the next tick. A handler
    /// that loads a scenario leaves the cursor at the start of the new table.
    /// Errors leave the cursor unchanged.
    pub fn step(&mut self) -> Result<StepOutcome, DispatchError> {
        let generation = {
            let table = self.scenario().table();
            if table.is_finished() {
                return Ok(StepOutcome::Finished);
            }
            table.generation()
        };

        let value = self.run_current()?;

        let mut table = self.scenario().table_mut();
        if table.generation() != generation {
            return Ok(StepOutcome::Jumped);
        }
        if value.requests_hold() {
            return Ok(StepOutcome::Held);
        }
        table.advance();
        Ok(StepOutcome::Advanced)
    }
}

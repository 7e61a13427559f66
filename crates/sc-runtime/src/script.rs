use std::collections::BTreeMap;

use sc_core::{ScriptError, ScriptValue};

/// Embedded script environment the dispatcher calls tag handlers in.
///
/// A missing handler must be reported with `ScriptErrorKind::MissingFunction`
/// so the dispatcher can position the error in the tag document instead.
pub trait ScriptRuntime {
    fn call(
        &mut self,
        function: &str,
        args: BTreeMap<String, String>,
    ) -> Result<ScriptValue, ScriptError>;

    fn has_function(&self, name: &str, arity: usize) -> bool;
}

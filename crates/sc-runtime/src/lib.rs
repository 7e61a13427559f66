mod dispatch;
mod engine;
mod loader;
mod rhai_bridge;
mod rhai_runtime;
mod script;
mod table;

pub use dispatch::StepOutcome;
pub use engine::{ScenarioEngine, ScenarioHandle};
pub use loader::{load_scenario, FsSourceLoader, MemorySourceLoader, SourceLoader};
pub use rhai_runtime::{RhaiRuntimeOptions, RhaiScriptRuntime, DEFAULT_MAX_OPERATIONS};
pub use script::ScriptRuntime;
pub use table::{CommandTable, TableError};

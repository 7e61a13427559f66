use std::collections::BTreeMap;

use sc_core::{DispatchError, LoadError, ParseLimits, ScriptError, ScriptValue};
use sc_runtime::{
    RhaiRuntimeOptions, RhaiScriptRuntime, ScenarioEngine, ScenarioHandle, ScriptRuntime,
    SourceLoader, StepOutcome,
};
use thiserror::Error;
use tracing::{debug, info};

pub const SETUP_HOOK: &str = "setup";
pub const FIRST_HOOK: &str = "first";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Script(#[from] ScriptError),
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    #[error("setup() returned an invalid value: {0}")]
    SetupInvalid(String),
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Script(error) => error.code(),
            Self::Load(error) => error.code(),
            Self::Dispatch(error) => error.code(),
            Self::SetupInvalid(_) => "API_SETUP_INVALID",
        }
    }
}

/// Window settings a project declares through `setup()`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetupInfo {
    pub title: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

pub struct CreatePlayerOptions<L> {
    /// Script sources keyed by file name, registered in key order.
    pub scripts: BTreeMap<String, String>,
    pub loader: L,
    pub entry_scenario: Option<String>,
    pub limits: ParseLimits,
    pub runtime: RhaiRuntimeOptions,
}

impl<L> CreatePlayerOptions<L> {
    pub fn new(scripts: BTreeMap<String, String>, loader: L) -> Self {
        Self {
            scripts,
            loader,
            entry_scenario: None,
            limits: ParseLimits::default(),
            runtime: RhaiRuntimeOptions::default(),
        }
    }
}

/// A scenario engine wired to a Rhai project, ready for frame ticks.
pub struct ScenarioPlayer {
    engine: ScenarioEngine<RhaiScriptRuntime>,
    setup: SetupInfo,
}

impl ScenarioPlayer {
    pub fn setup(&self) -> &SetupInfo {
        &self.setup
    }

    pub fn engine(&self) -> &ScenarioEngine<RhaiScriptRuntime> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut ScenarioEngine<RhaiScriptRuntime> {
        &mut self.engine
    }

    pub fn step(&mut self) -> Result<StepOutcome, DispatchError> {
        self.engine.step()
    }

    pub fn is_finished(&self) -> bool {
        self.engine.is_finished()
    }

    pub fn take_output(&self) -> Vec<String> {
        self.engine.runtime().take_output()
    }

    pub fn into_engine(self) -> ScenarioEngine<RhaiScriptRuntime> {
        self.engine
    }
}

/// Builds a player: registers every script, installs the scenario API, reads
/// `setup()`, loads the entry scenario if one is named, then calls `first()`.
pub fn create_player<L>(options: CreatePlayerOptions<L>) -> Result<ScenarioPlayer, ApiError>
where
    L: SourceLoader + 'static,
{
    let scenario = ScenarioHandle::new(options.loader, options.limits);
    let mut runtime = RhaiScriptRuntime::new(options.runtime);
    runtime.install_scenario_api(&scenario);
    for (file, source) in &options.scripts {
        runtime.register_source(file, source)?;
    }
    debug!(scripts = options.scripts.len(), "project scripts registered");

    let setup = read_setup(&mut runtime)?;

    let mut engine = ScenarioEngine::new(scenario, runtime);
    if let Some(entry) = &options.entry_scenario {
        engine.move_to_scenario(entry)?;
        info!(scenario = %entry, "entry scenario loaded");
    }
    if engine.runtime().has_function(FIRST_HOOK, 0) {
        engine.runtime_mut().call_hook(FIRST_HOOK)?;
    }

    Ok(ScenarioPlayer { engine, setup })
}

/// Calls `setup()` when the project defines it. A missing hook or a unit
/// return yields the empty default.
pub fn read_setup(runtime: &mut RhaiScriptRuntime) -> Result<SetupInfo, ApiError> {
    if !runtime.has_function(SETUP_HOOK, 0) {
        return Ok(SetupInfo::default());
    }

    let value = runtime.call_hook(SETUP_HOOK)?;
    let fields = match &value {
        ScriptValue::Unit => return Ok(SetupInfo::default()),
        ScriptValue::Map(fields) => fields,
        other => {
            return Err(ApiError::SetupInvalid(format!(
                "expected a map, got {}",
                other.type_name()
            )))
        }
    };

    let title = match fields.get("title") {
        None | Some(ScriptValue::Unit) => None,
        Some(ScriptValue::String(title)) => Some(title.clone()),
        Some(other) => {
            return Err(ApiError::SetupInvalid(format!(
                "\"title\" must be a string, got {}",
                other.type_name()
            )))
        }
    };

    Ok(SetupInfo {
        title,
        width: dimension(fields, "width")?,
        height: dimension(fields, "height")?,
    })
}

fn dimension(
    fields: &BTreeMap<String, ScriptValue>,
    name: &str,
) -> Result<Option<u32>, ApiError> {
    match fields.get(name) {
        None | Some(ScriptValue::Unit) => Ok(None),
        Some(ScriptValue::Number(value))
            if value.fract() == 0.0 && *value >= 0.0 && *value <= f64::from(u32::MAX) =>
        {
            Ok(Some(*value as u32))
        }
        Some(other) => Err(ApiError::SetupInvalid(format!(
            "\"{}\" must be a non-negative integer, got {}",
            name,
            match other {
                ScriptValue::Number(value) => value.to_string(),
                _ => other.type_name().to_string(),
            }
        ))),
    }
}

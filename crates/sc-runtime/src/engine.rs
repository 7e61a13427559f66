use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

use sc_core::{LoadError, ParseLimits};

use crate::loader::{load_scenario, SourceLoader};
use crate::table::CommandTable;

struct ScenarioState {
    table: RefCell<CommandTable>,
    loader: Box<dyn SourceLoader>,
    limits: ParseLimits,
}

/// Shared access to the command table and the loader that rebuilds it.
///
/// Clones point at the same table, which lets a tag handler running inside the
/// script runtime jump to another scenario while the engine is dispatching.
#[derive(Clone)]
pub struct ScenarioHandle {
    state: Rc<ScenarioState>,
}

impl ScenarioHandle {
    pub fn new(loader: impl SourceLoader + 'static, limits: ParseLimits) -> Self {
        Self {
            state: Rc::new(ScenarioState {
                table: RefCell::new(CommandTable::new()),
                loader: Box::new(loader),
                limits,
            }),
        }
    }

    pub fn limits(&self) -> &ParseLimits {
        &self.state.limits
    }

    pub fn load(&self, file: &str) -> Result<(), LoadError> {
        let mut table = self.state.table.borrow_mut();
        load_scenario(
            &mut table,
            self.state.loader.as_ref(),
            &self.state.limits,
            file,
        )
    }

    pub fn table(&self) -> Ref<'_, CommandTable> {
        self.state.table.borrow()
    }

    pub(crate) fn table_mut(&self) -> RefMut<'_, CommandTable> {
        self.state.table.borrow_mut()
    }

    pub fn current_file(&self) -> Option<String> {
        self.table().current_file().map(str::to_string)
    }
}

/// Owns the loaded scenario and the script runtime its tags dispatch into.
pub struct ScenarioEngine<R> {
    scenario: ScenarioHandle,
    runtime: R,
}

impl<R> ScenarioEngine<R> {
    pub fn new(scenario: ScenarioHandle, runtime: R) -> Self {
        Self { scenario, runtime }
    }

    pub fn scenario(&self) -> &ScenarioHandle {
        &self.scenario
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    pub fn runtime_mut(&mut self) -> &mut R {
        &mut self.runtime
    }

    pub fn table(&self) -> Ref<'_, CommandTable> {
        self.scenario.table()
    }

    pub fn move_to_scenario(&self, file: &str) -> Result<(), LoadError> {
        self.scenario.load(file)
    }

    pub fn is_finished(&self) -> bool {
        self.scenario.table().is_finished()
    }
}

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use rhai::{CallFnOptions, Dynamic, Engine, EvalAltResult, Map, Position, Scope, AST};
use sc_core::{LoadError, ScriptError, ScriptErrorKind, ScriptValue};
use tracing::debug;

use crate::engine::ScenarioHandle;
use crate::rhai_bridge::{args_to_map, dynamic_to_value};
use crate::script::ScriptRuntime;

pub const DEFAULT_MAX_OPERATIONS: u64 = 1_000_000;
const UNKNOWN_SCRIPT_FILE: &str = "<script>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RhaiRuntimeOptions {
    /// Operation budget per call; `0` disables the limit.
    pub max_operations: u64,
}

impl Default for RhaiRuntimeOptions {
    fn default() -> Self {
        Self {
            max_operations: DEFAULT_MAX_OPERATIONS,
        }
    }
}

/// Rhai-backed script runtime.
///
/// Each registered source is compiled on its own so compile errors name their
/// file, then its functions are merged into one library. Top-level statements
/// of a source run once, at registration.
pub struct RhaiScriptRuntime {
    engine: Engine,
    library: AST,
    scope: Scope<'static>,
    function_files: HashMap<String, String>,
    output: Rc<RefCell<Vec<String>>>,
}

impl RhaiScriptRuntime {
    pub fn new(options: RhaiRuntimeOptions) -> Self {
        let mut engine = Engine::new();
        engine.set_max_operations(options.max_operations);

        let output = Rc::new(RefCell::new(Vec::new()));
        let print_sink = Rc::clone(&output);
        engine.on_print(move |text| print_sink.borrow_mut().push(text.to_string()));
        engine.on_debug(|text, source, position| {
            debug!(
                target: "sc_runtime::script",
                source = source.unwrap_or(UNKNOWN_SCRIPT_FILE),
                line = position.line().unwrap_or(0),
                "{}",
                text
            );
        });

        Self {
            engine,
            library: AST::empty(),
            scope: Scope::new(),
            function_files: HashMap::new(),
            output,
        }
    }

    pub fn register_source(&mut self, file: &str, source: &str) -> Result<(), ScriptError> {
        let mut ast = self.engine.compile(source).map_err(|error| {
            ScriptError::new(
                ScriptErrorKind::Compile,
                file,
                error.position().line().unwrap_or(0),
                error.err_type().to_string(),
            )
        })?;
        ast.set_source(file);

        for function in ast.iter_functions() {
            self.function_files
                .insert(function.name.to_string(), file.to_string());
        }

        let mut runnable = self.library.clone_functions_only();
        runnable.combine(ast.clone());
        self.engine
            .run_ast_with_scope(&mut self.scope, &runnable)
            .map_err(|error| self.describe_error(file, *error))?;

        self.library.combine(ast.clone_functions_only());
        debug!(file, "script source registered");
        Ok(())
    }

    /// Calls a zero-argument script function such as `setup` or `first`.
    pub fn call_hook(&mut self, name: &str) -> Result<ScriptValue, ScriptError> {
        let options = CallFnOptions::new().eval_ast(false).rewind_scope(true);
        let result = self.engine.call_fn_with_options::<Dynamic>(
            options,
            &mut self.scope,
            &self.library,
            name,
            (),
        );
        self.finish_call(name, result, Conversion::Strict)
    }

    /// Drains text written by `print` since the last call.
    pub fn take_output(&self) -> Vec<String> {
        std::mem::take(&mut *self.output.borrow_mut())
    }

    /// Exposes scenario control to scripts:
    /// `move_to_scenario(file)`, `move_to_scenario(#{ file: ... })` and
    /// `current_scenario()`.
    pub fn install_scenario_api(&mut self, scenario: &ScenarioHandle) {
        let handle = scenario.clone();
        self.engine.register_fn(
            "move_to_scenario",
            move |file: &str| -> Result<(), Box<EvalAltResult>> {
                handle.load(file).map_err(load_error_to_rhai)
            },
        );

        let handle = scenario.clone();
        self.engine.register_fn(
            "move_to_scenario",
            move |param: Map| -> Result<(), Box<EvalAltResult>> {
                let file = param.get("file").and_then(param_text).ok_or_else(|| {
                    Box::new(EvalAltResult::ErrorRuntime(
                        "move_to_scenario expects a \"file\" string.".into(),
                        Position::NONE,
                    ))
                })?;
                handle.load(&file).map_err(load_error_to_rhai)
            },
        );

        let handle = scenario.clone();
        self.engine.register_fn("current_scenario", move || -> String {
            handle.current_file().unwrap_or_default()
        });
    }

    fn finish_call(
        &self,
        function: &str,
        result: Result<Dynamic, Box<EvalAltResult>>,
        conversion: Conversion,
    ) -> Result<ScriptValue, ScriptError> {
        let value = match result {
            Ok(value) => value,
            Err(error) => {
                if let EvalAltResult::ErrorFunctionNotFound(signature, _) = error.as_ref() {
                    if is_signature_of(signature, function) {
                        return Err(ScriptError::new(
                            ScriptErrorKind::MissingFunction,
                            self.file_of(function),
                            0,
                            format!("Function \"{}\" is not defined.", function),
                        ));
                    }
                }
                return Err(self.describe_error(&self.file_of(function), *error));
            }
        };

        match (dynamic_to_value(value), conversion) {
            (Ok(value), _) => Ok(value),
            (Err(message), Conversion::Lenient) => {
                debug!(function, message = %message, "handler return value ignored");
                Ok(ScriptValue::Unit)
            }
            (Err(message), Conversion::Strict) => Err(ScriptError::new(
                ScriptErrorKind::Runtime,
                self.file_of(function),
                0,
                message,
            )),
        }
    }

    fn file_of(&self, function: &str) -> String {
        self.function_files
            .get(function)
            .cloned()
            .unwrap_or_else(|| UNKNOWN_SCRIPT_FILE.to_string())
    }

    /// Positions an error at the innermost script function that raised it.
    fn describe_error(&self, fallback_file: &str, error: EvalAltResult) -> ScriptError {
        let mut current = error;
        let mut file = fallback_file.to_string();
        while let EvalAltResult::ErrorInFunctionCall(name, source, inner, _) = current {
            file = match self.function_files.get(name.as_str()) {
                Some(owner) => owner.clone(),
                None if !source.is_empty() => source,
                None => file,
            };
            current = *inner;
        }

        let line = current.position().line().unwrap_or(0);
        let message = match current {
            EvalAltResult::ErrorRuntime(value, _) => value.to_string(),
            mut other => other.clear_position().to_string(),
        };
        ScriptError::new(ScriptErrorKind::Runtime, file, line, message)
    }
}

impl Default for RhaiScriptRuntime {
    fn default() -> Self {
        Self::new(RhaiRuntimeOptions::default())
    }
}

impl ScriptRuntime for RhaiScriptRuntime {
    fn call(
        &mut self,
        function: &str,
        args: BTreeMap<String, String>,
    ) -> Result<ScriptValue, ScriptError> {
        let options = CallFnOptions::new().eval_ast(false).rewind_scope(true);
        let result = self.engine.call_fn_with_options::<Dynamic>(
            options,
            &mut self.scope,
            &self.library,
            function,
            (args_to_map(args),),
        );
        self.finish_call(function, result, Conversion::Lenient)
    }

    fn has_function(&self, name: &str, arity: usize) -> bool {
        self.library
            .iter_functions()
            .any(|function| function.name == name && function.params.len() == arity)
    }
}

/// How a returned value that has no `ScriptValue` form is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Conversion {
    /// Reported as a runtime error; used where the caller reads the value.
    Strict,
    /// Replaced by `Unit`; a handler only signals flow through `false`.
    Lenient,
}

/// Text of a map parameter; numbers are formatted like `%d` and `%f`.
fn param_text(value: &Dynamic) -> Option<String> {
    if value.is_string() {
        return value.clone().into_string().ok();
    }
    if let Ok(number) = value.as_int() {
        return Some(number.to_string());
    }
    if let Ok(number) = value.as_float() {
        return Some(format!("{:.6}", number));
    }
    None
}

fn is_signature_of(signature: &str, function: &str) -> bool {
    signature == function
        || signature
            .strip_prefix(function)
            .is_some_and(|rest| rest.starts_with(" ("))
}

fn load_error_to_rhai(error: LoadError) -> Box<EvalAltResult> {
    Box::new(EvalAltResult::ErrorRuntime(
        error.to_string().into(),
        Position::NONE,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::StepOutcome;
    use crate::engine::ScenarioEngine;
    use crate::loader::MemorySourceLoader;
    use sc_core::{DispatchError, ParseLimits};

    fn runtime(sources: &[(&str, &str)]) -> RhaiScriptRuntime {
        let mut runtime = RhaiScriptRuntime::default();
        for (file, source) in sources {
            runtime
                .register_source(file, source)
                .expect("script should register");
        }
        runtime
    }

    fn args(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn call_passes_mapping_and_converts_return_value() {
        let mut runtime = runtime(&[(
            "game.rhai",
            r#"
fn greet(param) {
    "Hello, " + param.name + " (" + param.mood + ")"
}
"#,
        )]);

        let value = runtime
            .call("greet", args(&[("name", "Aki"), ("mood", "happy")]))
            .expect("call should pass");
        assert_eq!(value, ScriptValue::String("Hello, Aki (happy)".to_string()));
        assert!(runtime.has_function("greet", 1));
        assert!(!runtime.has_function("greet", 0));
    }

    #[test]
    fn functions_from_several_sources_can_call_each_other() {
        let mut runtime = runtime(&[
            ("lib.rhai", "fn shout(text) { text.to_upper() }"),
            ("game.rhai", "fn say(param) { shout(param.text) }"),
        ]);
        let value = runtime
            .call("say", args(&[("text", "hi")]))
            .expect("call should pass");
        assert_eq!(value, ScriptValue::String("HI".to_string()));
    }

    #[test]
    fn top_level_statements_run_once_at_registration() {
        let runtime = runtime(&[("game.rhai", "print(\"loaded\");\nfn end(param) { }")]);
        assert_eq!(runtime.take_output(), vec!["loaded".to_string()]);
        assert!(runtime.take_output().is_empty());
    }

    #[test]
    fn print_output_is_captured_per_call() {
        let mut runtime = runtime(&[("game.rhai", "fn say(param) { print(param.text); }")]);
        runtime
            .call("say", args(&[("text", "line one")]))
            .expect("call should pass");
        assert_eq!(runtime.take_output(), vec!["line one".to_string()]);
    }

    #[test]
    fn compile_error_reports_file_and_line() {
        let mut runtime = RhaiScriptRuntime::default();
        let error = runtime
            .register_source("broken.rhai", "fn ok(p) { 1 }\n\nfn bad(p) { let = ; }")
            .expect_err("compile should fail");
        assert_eq!(error.kind, ScriptErrorKind::Compile);
        assert_eq!(error.file, "broken.rhai");
        assert_eq!(error.line, 3);
        assert_eq!(error.code(), "SCRIPT_COMPILE");
    }

    #[test]
    fn missing_function_is_reported_as_missing() {
        let mut runtime = runtime(&[("game.rhai", "fn other(param) { }")]);
        let error = runtime
            .call("ghost", BTreeMap::new())
            .expect_err("missing function");
        assert_eq!(error.kind, ScriptErrorKind::MissingFunction);

        let error = runtime.call_hook("other").expect_err("wrong arity");
        assert_eq!(error.kind, ScriptErrorKind::MissingFunction);
    }

    #[test]
    fn runtime_error_points_at_innermost_script_function() {
        let mut runtime = runtime(&[
            ("lib.rhai", "fn explode() {\n    throw \"kaboom\";\n}"),
            ("game.rhai", "fn boom(param) {\n    explode();\n}"),
        ]);
        let error = runtime
            .call("boom", BTreeMap::new())
            .expect_err("handler should fail");
        assert_eq!(error.kind, ScriptErrorKind::Runtime);
        assert_eq!(error.file, "lib.rhai");
        assert_eq!(error.line, 2);
        assert_eq!(error.message, "kaboom");
    }

    #[test]
    fn calling_undefined_function_inside_handler_is_runtime_error() {
        let mut runtime = runtime(&[("game.rhai", "fn boom(param) {\n    nowhere(1);\n}")]);
        let error = runtime
            .call("boom", BTreeMap::new())
            .expect_err("inner call should fail");
        assert_eq!(error.kind, ScriptErrorKind::Runtime);
        assert_eq!(error.file, "game.rhai");
        assert_eq!(error.line, 2);
    }

    #[test]
    fn operation_budget_stops_runaway_handlers() {
        let mut runtime = RhaiScriptRuntime::new(RhaiRuntimeOptions {
            max_operations: 1_000,
        });
        runtime
            .register_source("game.rhai", "fn spin(param) { loop { } }")
            .expect("script should register");
        let error = runtime
            .call("spin", BTreeMap::new())
            .expect_err("budget should stop the loop");
        assert_eq!(error.kind, ScriptErrorKind::Runtime);
        assert_eq!(error.file, "game.rhai");
    }

    #[test]
    fn unsupported_hook_return_type_is_runtime_error() {
        let mut runtime = runtime(&[("game.rhai", "fn f() { || 1 }")]);
        let error = runtime
            .call_hook("f")
            .expect_err("closure return should fail");
        assert_eq!(error.kind, ScriptErrorKind::Runtime);
        assert!(error.message.contains("Unsupported handler return type"));
    }

    #[test]
    fn unsupported_handler_return_type_is_treated_as_unit() {
        let mut runtime = runtime(&[("game.rhai", "fn show(param) { blob(2) }")]);
        let value = runtime
            .call("show", BTreeMap::new())
            .expect("handler should succeed");
        assert_eq!(value, ScriptValue::Unit);
    }

    #[test]
    fn param_text_formats_numbers_like_the_host() {
        assert_eq!(param_text(&Dynamic::from("a.tags")), Some("a.tags".to_string()));
        assert_eq!(param_text(&Dynamic::from_int(3)), Some("3".to_string()));
        assert_eq!(
            param_text(&Dynamic::from_float(1.5)),
            Some("1.500000".to_string())
        );
        assert_eq!(param_text(&Dynamic::from_bool(true)), None);
    }

    #[test]
    fn signature_matching_requires_exact_function_name() {
        assert!(is_signature_of("greet", "greet"));
        assert!(is_signature_of("greet (map)", "greet"));
        assert!(!is_signature_of("greeting (map)", "greet"));
        assert!(!is_signature_of("other", "greet"));
    }

    fn scripted_engine(
        tags: &[(&str, &str)],
        script: &str,
    ) -> ScenarioEngine<RhaiScriptRuntime> {
        let mut loader = MemorySourceLoader::default();
        for (path, content) in tags {
            loader.insert(*path, *content);
        }
        let scenario = ScenarioHandle::new(loader, ParseLimits::default());
        let mut runtime = RhaiScriptRuntime::default();
        runtime.install_scenario_api(&scenario);
        runtime
            .register_source("game.rhai", script)
            .expect("script should register");
        ScenarioEngine::new(scenario, runtime)
    }

    #[test]
    fn scenario_api_jumps_from_inside_a_handler() {
        let mut engine = scripted_engine(
            &[
                (
                    "one.tags",
                    "[say text=\"first\"]\n[jump file=\"two.tags\"]\n[say text=\"skipped\"]",
                ),
                ("two.tags", "[say text=\"second\"]"),
            ],
            r#"
fn say(param) { print(current_scenario() + ": " + param.text); }
fn jump(param) { move_to_scenario(param); }
"#,
        );
        engine.move_to_scenario("one.tags").expect("load should pass");

        let mut outcomes = Vec::new();
        loop {
            let outcome = engine.step().expect("step should pass");
            outcomes.push(outcome);
            if outcome == StepOutcome::Finished {
                break;
            }
        }

        assert_eq!(
            outcomes,
            vec![
                StepOutcome::Advanced,
                StepOutcome::Jumped,
                StepOutcome::Advanced,
                StepOutcome::Finished,
            ]
        );
        assert_eq!(
            engine.runtime().take_output(),
            vec!["one.tags: first".to_string(), "two.tags: second".to_string()]
        );
    }

    #[test]
    fn scenario_api_accepts_plain_file_argument() {
        let mut engine = scripted_engine(
            &[("a.tags", "[jump]"), ("b.tags", "[end]\n[end]")],
            "fn jump(param) { move_to_scenario(\"b.tags\"); }\nfn end(param) { }",
        );
        engine.move_to_scenario("a.tags").expect("load should pass");
        assert_eq!(engine.step(), Ok(StepOutcome::Jumped));
        assert_eq!(engine.table().len(), 2);
        assert_eq!(engine.table().current_file(), Some("b.tags"));
    }

    #[test]
    fn failed_scenario_jump_raises_script_error_and_empties_table() {
        let mut engine = scripted_engine(
            &[("a.tags", "[jump]"), ("bad.tags", "[x]\n!")],
            "fn jump(param) {\n    move_to_scenario(\"bad.tags\");\n}",
        );
        engine.move_to_scenario("a.tags").expect("load should pass");

        let error = engine.step().expect_err("jump should fail");
        let DispatchError::Handler(script_error) = &error else {
            panic!("expected handler error, got {:?}", error);
        };
        assert_eq!(script_error.file, "game.rhai");
        assert_eq!(script_error.line, 2);
        assert_eq!(script_error.message, "tag error: bad.tags:2: Invalid character.");
        assert!(engine.table().is_empty());
        assert_eq!(engine.table().cursor(), 0);
    }

    #[test]
    fn handler_with_unconvertible_return_runs_once_and_advances() {
        let mut engine = scripted_engine(
            &[("a.tags", "[show]\n[end]")],
            "fn show(param) { print(\"shown\"); blob(2) }\nfn end(param) { }",
        );
        engine.move_to_scenario("a.tags").expect("load should pass");

        assert_eq!(engine.step(), Ok(StepOutcome::Advanced));
        assert_eq!(engine.table().cursor(), 1);
        assert_eq!(engine.step(), Ok(StepOutcome::Advanced));
        assert_eq!(engine.runtime().take_output(), vec!["shown".to_string()]);
    }

    #[test]
    fn scenario_api_accepts_numeric_file_in_map() {
        let mut engine = scripted_engine(
            &[("a.tags", "[jump]"), ("7", "[end]")],
            "fn jump(param) { move_to_scenario(#{ file: 7 }); }\nfn end(param) { }",
        );
        engine.move_to_scenario("a.tags").expect("load should pass");
        assert_eq!(engine.step(), Ok(StepOutcome::Jumped));
        assert_eq!(engine.table().current_file(), Some("7"));
    }

    #[test]
    fn scenario_api_rejects_map_without_file() {
        let mut engine = scripted_engine(
            &[("a.tags", "[jump]")],
            "fn jump(param) { move_to_scenario(#{ name: \"x\" }); }",
        );
        engine.move_to_scenario("a.tags").expect("load should pass");
        let error = engine.step().expect_err("jump should fail");
        assert!(error.to_string().contains("expects a \"file\" string"));
        assert_eq!(engine.table().len(), 1);
    }

    #[test]
    fn missing_tag_handler_maps_to_dispatch_error() {
        let mut engine = scripted_engine(&[("a.tags", "\n[ghost]")], "fn other(param) { }");
        engine.move_to_scenario("a.tags").expect("load should pass");
        let error = engine.step().expect_err("handler is missing");
        assert_eq!(
            error.to_string(),
            "a.tags:2: error: Handler \"ghost\" is not defined."
        );
    }

    #[test]
    fn handler_returning_false_holds_the_tag() {
        let mut engine = scripted_engine(
            &[("a.tags", "[wait]\n[end]")],
            "fn wait(param) { false }\nfn end(param) { true }",
        );
        engine.move_to_scenario("a.tags").expect("load should pass");
        assert_eq!(engine.step(), Ok(StepOutcome::Held));
        assert_eq!(engine.step(), Ok(StepOutcome::Held));
        assert_eq!(engine.table().cursor(), 0);
    }

    #[test]
    fn call_hook_runs_zero_argument_functions() {
        let mut runtime = runtime(&[(
            "game.rhai",
            "fn setup() { #{ title: \"Demo\", width: 640 } }",
        )]);
        let value = runtime.call_hook("setup").expect("setup should run");
        let map = value.as_map().expect("setup returns a map");
        assert_eq!(map.get("title"), Some(&ScriptValue::String("Demo".to_string())));
        assert_eq!(map.get("width"), Some(&ScriptValue::Number(640.0)));
    }
}

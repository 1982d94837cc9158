//==================================================
// File: runtime/mod.rs
//==================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Owned wrapper around the embedded script engine
// Objective: Hold the engine, the shared global scope, and the host state
//            behind one mutable owner so every mutation is sequenced
//==================================================

pub mod globals;
pub mod value;

use std::cell::RefCell;
use std::rc::Rc;

use rhai::{Array, Dynamic, Engine, EvalAltResult, Map, Scope, AST};
use thiserror::Error;

use crate::bindings::BindingRegistry;
use crate::context::{ContextPaths, EnvironmentContext};
pub use value::{render_dynamic, Null, ScriptValue, Undefined};

/// Evaluation failure, already flattened to its message so it can travel
/// through the session layer freely.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("{0}")]
    Parse(String),
    #[error("{0}")]
    Eval(String),
}

impl From<rhai::ParseError> for RuntimeError {
    fn from(error: rhai::ParseError) -> Self {
        RuntimeError::Parse(error.to_string())
    }
}

impl From<Box<EvalAltResult>> for RuntimeError {
    fn from(error: Box<EvalAltResult>) -> Self {
        RuntimeError::Eval(error.to_string())
    }
}

/// State shared between the runtime and the host callables registered on
/// the engine: the binding registry plus the queue of include sources
/// waiting for the current evaluation to finish.
pub struct HostState {
    pub bindings: BindingRegistry,
    pub pending_sources: Vec<(String, String)>,
}

//==================================================
// Section 1.0 - Script Runtime
//==================================================

/// Single owner of the embedded engine and the script-visible global
/// scope. Constructed once per process; all evaluation flows through it in
/// strict sequence.
pub struct ScriptRuntime {
    engine: Engine,
    scope: Scope<'static>,
    fn_lib: AST,
    state: Rc<RefCell<HostState>>,
}

impl ScriptRuntime {
    pub fn new(paths: &ContextPaths) -> Self {
        let mut engine = Engine::new();
        let state = Rc::new(RefCell::new(HostState {
            bindings: BindingRegistry::new(paths.library_dir()),
            pending_sources: Vec::new(),
        }));
        globals::register_host_functions(&mut engine, Rc::clone(&state));

        let mut scope = Scope::new();
        scope.push_constant("null", Dynamic::from(Null));
        scope.push_constant("undefined", Dynamic::from(Undefined));

        Self {
            engine,
            scope,
            fn_lib: AST::empty(),
            state,
        }
    }

    /// Publish the environment context as the `__` global. Call once,
    /// before anything evaluates.
    pub fn inject_context(&mut self, context: &EnvironmentContext) {
        let map = context_map(context);
        self.scope.push("__", map);
    }

    /// Update one field of the `__` global (log paths, prompt overrides).
    pub fn set_context_field(&mut self, key: &str, value: impl Into<Dynamic>) {
        if let Some(mut map) = self.scope.get_value::<Map>("__") {
            map.insert(key.into(), value.into());
            self.scope.set_value("__", map);
        }
    }

    /// Read one field of the `__` global.
    pub fn context_field(&self, key: &str) -> Option<Dynamic> {
        self.scope
            .get_value::<Map>("__")
            .and_then(|map| map.get(key).cloned())
    }

    /// Evaluate a source fragment in the shared global scope. Function
    /// definitions persist across calls; queued includes run right after
    /// the fragment completes.
    pub fn eval(&mut self, source: &str) -> Result<ScriptValue, RuntimeError> {
        let value = self.eval_dynamic(source)?;
        self.drain_includes();
        Ok(ScriptValue::classify(value))
    }

    /// Current prompt text: the `__.prompt` expression evaluated through
    /// the engine, so scripts can restyle it at will.
    pub fn prompt(&mut self) -> Result<String, RuntimeError> {
        let source = self
            .context_field("prompt")
            .map(|value| value.to_string())
            .unwrap_or_else(|| "\"revel> \"".to_string());
        let value = self
            .engine
            .eval_with_scope::<Dynamic>(&mut self.scope, &source)?;
        Ok(value.to_string())
    }

    fn eval_dynamic(&mut self, source: &str) -> Result<Dynamic, RuntimeError> {
        let ast = self.engine.compile(source)?;
        let unit = self.fn_lib.merge(&ast);
        let value = self
            .engine
            .eval_ast_with_scope::<Dynamic>(&mut self.scope, &unit)?;
        self.fn_lib += ast.clone_functions_only();
        Ok(value)
    }

    /// Evaluate include sources queued by the last fragment. Includes can
    /// queue further includes; failures are reported on the error stream
    /// and do not disturb the session.
    fn drain_includes(&mut self) {
        loop {
            let pending = {
                let mut state = self.state.borrow_mut();
                std::mem::take(&mut state.pending_sources)
            };
            if pending.is_empty() {
                break;
            }
            for (origin, source) in pending {
                if let Err(error) = self.eval_dynamic(&source) {
                    eprintln!("{origin}: {error}");
                }
            }
        }
    }
}

fn context_map(context: &EnvironmentContext) -> Map {
    let mut map = Map::new();

    let arg: Array = context
        .args
        .iter()
        .map(|a| Dynamic::from(a.clone()))
        .collect();
    map.insert("arg".into(), Dynamic::from_array(arg));
    map.insert("argc".into(), Dynamic::from(context.args.len() as i64));

    map.insert("version".into(), context.version.as_str().into());
    map.insert(
        "binaryPathFile".into(),
        context.paths.binary_path_file().display().to_string().into(),
    );
    map.insert("domain".into(), context.domain.as_str().into());
    map.insert("userName".into(), context.user_name.as_str().into());
    map.insert("userProfile".into(), context.user_profile.as_str().into());
    map.insert(
        "processId".into(),
        Dynamic::from(i64::from(context.process_id)),
    );

    map.insert(
        "binaryPath".into(),
        context.paths.binary_dir().display().to_string().into(),
    );
    map.insert(
        "autoloadPath".into(),
        context.paths.autoload_dir().display().to_string().into(),
    );
    map.insert(
        "pluginsPath".into(),
        context.paths.plugins_dir().display().to_string().into(),
    );
    map.insert(
        "settingsPath".into(),
        context.paths.settings_dir().display().to_string().into(),
    );
    map.insert(
        "libraryPath".into(),
        context.paths.library_dir().display().to_string().into(),
    );

    map.insert("startTime".into(), context.start_time.as_str().into());
    map.insert("prompt".into(), context.prompt.as_str().into());
    map
}

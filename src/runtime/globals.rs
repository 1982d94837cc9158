//==================================================
// File: runtime/globals.rs
//==================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Script-visible host callables
// Objective: Register the global functions scripts rely on, routing
//            attachment and include requests through the shared host state
//==================================================

use std::cell::RefCell;
use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::rc::Rc;

use rhai::{Array, Dynamic, Engine, EvalAltResult};

use super::value::{Null, Undefined};
use super::HostState;
use crate::glob::{self, HostArray};

/// Register every host callable and engine hook on a fresh engine.
pub(crate) fn register_host_functions(engine: &mut Engine, state: Rc<RefCell<HostState>>) {
    engine.on_print(|text| println!("{text}"));
    engine.on_debug(|text, source, position| {
        tracing::debug!(source, %position, "script debug: {text}");
    });

    // Attached namespaces resolve here when a name misses the scope, which
    // makes them visible to the expression right after `attach` returns.
    let resolver = Rc::clone(&state);
    engine.on_var(move |name, _index, _context| Ok(resolver.borrow().bindings.resolve(name)));

    register_markers(engine);
    register_host_arrays(engine);
    register_io(engine, Rc::clone(&state));
    register_process(engine);
    register_attachments(engine, state);
}

//==================================================
// Section 1.0 - Marker Types
//==================================================

fn register_markers(engine: &mut Engine) {
    engine.register_type_with_name::<Null>("null");
    engine.register_type_with_name::<Undefined>("undefined");
    engine.register_fn("to_string", |_: &mut Null| "null".to_string());
    engine.register_fn("to_string", |_: &mut Undefined| "undefined".to_string());
    engine.register_fn("to_debug", |_: &mut Null| "null".to_string());
    engine.register_fn("to_debug", |_: &mut Undefined| "undefined".to_string());
    engine.register_fn("==", |_: Null, _: Null| true);
    engine.register_fn("!=", |_: Null, _: Null| false);
    engine.register_fn("==", |_: Undefined, _: Undefined| true);
    engine.register_fn("!=", |_: Undefined, _: Undefined| false);
}

//==================================================
// Section 2.0 - Host Arrays & Globbing
//==================================================

fn register_host_arrays(engine: &mut Engine) {
    engine.register_type_with_name::<HostArray>("HostArray");
    engine.register_get("length", |array: &mut HostArray| array.len() as i64);
    engine.register_fn("len", |array: &mut HostArray| array.len() as i64);
    engine.register_fn("to_string", |array: &mut HostArray| array.to_string());
    engine.register_fn("to_debug", |array: &mut HostArray| array.to_string());
    engine.register_indexer_get(
        |array: &mut HostArray, index: i64| -> Result<String, Box<EvalAltResult>> {
            array
                .0
                .get(index as usize)
                .cloned()
                .ok_or_else(|| format!("index {index} out of range").into())
        },
    );

    engine.register_fn("toArray", |array: HostArray| -> Array {
        array.0.into_iter().map(Dynamic::from).collect()
    });
    engine.register_fn("toArray", |array: Array| array);

    engine.register_fn("glob", |wild: &str| -> Result<HostArray, Box<EvalAltResult>> {
        glob::glob(wild).map_err(|error| error.to_string().into())
    });
    engine.register_fn(
        "globall",
        |wild: &str| -> Result<HostArray, Box<EvalAltResult>> {
            glob::glob_all(wild).map_err(|error| error.to_string().into())
        },
    );
}

//==================================================
// Section 3.0 - File & Console I/O
//==================================================

fn register_io(engine: &mut Engine, state: Rc<RefCell<HostState>>) {
    engine.register_fn("readline", || -> String {
        let mut line = String::new();
        let _ = std::io::stdin().lock().read_line(&mut line);
        while line.ends_with(['\n', '\r']) {
            line.pop();
        }
        line
    });

    engine.register_fn("slurp", |path: &str| -> Result<String, Box<EvalAltResult>> {
        std::fs::read_to_string(path).map_err(|error| format!("{path}: {error}").into())
    });

    // Shared-read open: no lock is taken, so files another process is still
    // appending to read fine.
    engine.register_fn("inhale", |path: &str| -> Result<String, Box<EvalAltResult>> {
        let file = OpenOptions::new()
            .read(true)
            .open(path)
            .map_err(|error| -> Box<EvalAltResult> { format!("{path}: {error}").into() })?;
        let mut text = String::new();
        BufReader::new(file)
            .read_to_string(&mut text)
            .map_err(|error| -> Box<EvalAltResult> { format!("{path}: {error}").into() })?;
        Ok(text)
    });

    // `include` returns the file's text immediately; the evaluation itself
    // is queued on the host state and runs in the shared global scope as
    // soon as the current evaluation completes.
    engine.register_fn(
        "include",
        move |path: &str| -> Result<String, Box<EvalAltResult>> {
            if !Path::new(path).exists() {
                eprintln!("{path} not found.");
                return Ok(format!("{path} not found."));
            }
            let text = std::fs::read_to_string(path)
                .map_err(|error| -> Box<EvalAltResult> { format!("{path}: {error}").into() })?;
            state
                .borrow_mut()
                .pending_sources
                .push((path.to_string(), text.clone()));
            Ok(text)
        },
    );
}

//==================================================
// Section 4.0 - Process Control
//==================================================

fn register_process(engine: &mut Engine) {
    engine.register_fn("exit", |code: i64| {
        std::process::exit(code as i32);
    });

    engine.register_fn("die", |message: &str| {
        println!("{message}");
        std::process::exit(1);
    });
    engine.register_fn("die", || {
        println!();
        std::process::exit(1);
    });

    engine.register_fn("systypeof", |value: Dynamic| value.type_name().to_string());
}

//==================================================
// Section 5.0 - Attachment Operations
//==================================================

fn register_attachments(engine: &mut Engine, state: Rc<RefCell<HostState>>) {
    let attach = Rc::clone(&state);
    engine.register_fn("attach", move |path: &str| {
        attach.borrow_mut().bindings.attach_path(path, None).report()
    });

    let attach_as = Rc::clone(&state);
    engine.register_fn("attach", move |path: &str, name: &str| {
        attach_as
            .borrow_mut()
            .bindings
            .attach_path(path, Some(name))
            .report()
    });

    let attach_named = Rc::clone(&state);
    engine.register_fn("attachNamed", move |path: &str, name: &str| {
        attach_named
            .borrow_mut()
            .bindings
            .attach_declared(path, name)
            .report()
    });

    let plug = Rc::clone(&state);
    engine.register_fn("plugin", move |path: &str| {
        plug.borrow_mut().bindings.attach_path(path, None).report()
    });

    let asm = state;
    engine.register_fn("assembly", move |logical: &str, internal: &str| {
        asm.borrow_mut()
            .bindings
            .attach_logical(logical, internal)
            .report()
    });
}

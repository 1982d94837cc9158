//==================================================
// File: main.rs
//==================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Revel binary entry point
// Objective: Parse the command line, build the environment context, run
//            autoload, and dispatch to one-shot or interactive execution
//==================================================

use std::path::Path;
use std::process;

use revel::cli::{self, Mode, SessionState, UsageError};
use revel::config::HostConfig;
use revel::context::{ContextPaths, EnvironmentContext};
use revel::runtime::ScriptRuntime;
use revel::transcript::TranscriptLogger;
use revel::{autoload, session};

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let state = match cli::parse(&args) {
        Ok(state) => state,
        Err(UsageError::Empty) => {
            eprintln!("revel {{run|repl|debug}} {{script}} [--bindebug] [-- args...]");
            process::exit(-1);
        }
        Err(UsageError::UnknownMode(_)) => {
            eprintln!("run or repl");
            process::exit(-1);
        }
    };

    init_tracing(state.bin_debug() || state.mode == Mode::Debug);

    // Target validation happens before any directory is touched.
    if matches!(state.mode, Mode::Run | Mode::Debug) {
        if state.target.is_empty() {
            println!("No script.");
            process::exit(-1);
        }
        if !Path::new(&state.target).exists() {
            println!("{} not found.", state.target);
            process::exit(-1);
        }
    }

    if let Err(error) = run(&state) {
        eprintln!("revel: {error:?}");
        process::exit(1);
    }
}

fn run(state: &SessionState) -> anyhow::Result<()> {
    let paths = ContextPaths::discover()?;
    let context = EnvironmentContext::build(paths.clone(), &state.script_args)?;
    let (config, _config_path) = HostConfig::load(&paths.settings_dir())?;

    let mut runtime = ScriptRuntime::new(&paths);
    runtime.inject_context(&context);
    if let Some(prompt) = &config.prompt {
        // Stored quoted: `__.prompt` holds an expression, not a literal.
        runtime.set_context_field("prompt", format!("{prompt:?}"));
    }

    if config.autoload {
        autoload::run_autoload(&mut runtime, &paths.autoload_dir())?;
    }

    match state.mode {
        Mode::Run | Mode::Debug => {
            session::run_one_shot(&mut runtime, Path::new(&state.target))?;
        }
        Mode::Repl => {
            if !state.target.is_empty() && Path::new(&state.target).exists() {
                session::run_one_shot(&mut runtime, Path::new(&state.target))?;
            }
            let transcript_dir = config
                .transcript_dir
                .clone()
                .unwrap_or_else(|| std::env::temp_dir().join("revel"));
            let transcript = TranscriptLogger::create(&transcript_dir)?;
            runtime.set_context_field("logPath", transcript_dir.display().to_string());
            runtime.set_context_field("logFile", transcript.path().display().to_string());
            println!("Logging to {}", transcript.path().display());
            session::run_repl(&mut runtime, &transcript)?;
        }
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "revel=debug" } else { "revel=warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

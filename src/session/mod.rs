//==================================================
// File: session/mod.rs
//==================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Session orchestration: one-shot evaluation and the REPL loop
// Objective: Drive the fixed-at-startup execution mode, keeping the
//            interactive loop alive across script-level errors while
//            mirroring the session to its transcript
//==================================================

use std::fs;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::Path;

use anyhow::Context;
use rhai::Dynamic;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::runtime::{ScriptRuntime, ScriptValue};
use crate::transcript::TranscriptLogger;

//==================================================
// Section 1.0 - One-Shot Evaluation
//==================================================

/// Read, compile, and evaluate a whole script. The result is printed
/// unless it is the void or undefined non-value. Errors here are fatal:
/// this path runs trusted startup code, so they propagate to the caller.
pub fn run_one_shot(runtime: &mut ScriptRuntime, script: &Path) -> anyhow::Result<()> {
    let source = fs::read_to_string(script)
        .with_context(|| format!("reading script {}", script.display()))?;
    let value = runtime.eval(&source)?;
    match value {
        ScriptValue::Void | ScriptValue::Undefined => {}
        other => println!("{}", other.render()),
    }
    Ok(())
}

//==================================================
// Section 2.0 - Interactive Loop
//==================================================

/// What one interactive turn decided about the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    Continue,
    Exit,
}

/// Process one line of interactive input.
///
/// The literal `exit` terminates the session and is never logged. Every
/// other line is appended to the transcript verbatim before evaluation.
/// Evaluation errors of any kind print their message on standard output
/// and collapse the turn's result to the empty string; the loop survives.
/// Transcript order per turn is fixed: raw input, then result comment.
pub fn repl_turn(
    runtime: &mut ScriptRuntime,
    transcript: &TranscriptLogger,
    line: &str,
) -> anyhow::Result<TurnOutcome> {
    if line == "exit" {
        return Ok(TurnOutcome::Exit);
    }
    transcript.record_input(line)?;

    let value = match runtime.eval(line) {
        Ok(value) => value,
        Err(error) => {
            println!("{error}");
            ScriptValue::Value(Dynamic::from(String::new()))
        }
    };

    match &value {
        ScriptValue::Void => {}
        other => {
            let text = other.render();
            println!("{text}");
            transcript.record_result(&text)?;
        }
    }
    Ok(TurnOutcome::Continue)
}

/// The unbounded interactive loop. Each turn re-evaluates `__.prompt`
/// through the engine, so scripts control what the prompt looks like.
/// End-of-input terminates the session like `exit` does.
pub fn run_repl(runtime: &mut ScriptRuntime, transcript: &TranscriptLogger) -> anyhow::Result<()> {
    let mut reader = LineReader::new()?;
    loop {
        let prompt = runtime.prompt()?;
        let Some(line) = reader.read(&prompt)? else {
            break;
        };
        match repl_turn(runtime, transcript, &line)? {
            TurnOutcome::Exit => break,
            TurnOutcome::Continue => {}
        }
    }
    Ok(())
}

/// Console input, line-edited when attached to a terminal and plain
/// buffered reads otherwise so piped sessions behave.
enum LineReader {
    Interactive(Box<DefaultEditor>),
    Piped,
}

impl LineReader {
    fn new() -> anyhow::Result<Self> {
        if io::stdin().is_terminal() {
            Ok(LineReader::Interactive(Box::new(DefaultEditor::new()?)))
        } else {
            Ok(LineReader::Piped)
        }
    }

    fn read(&mut self, prompt: &str) -> anyhow::Result<Option<String>> {
        match self {
            LineReader::Interactive(editor) => loop {
                match editor.readline(prompt) {
                    Ok(line) => {
                        let _ = editor.add_history_entry(line.as_str());
                        break Ok(Some(line));
                    }
                    Err(ReadlineError::Interrupted) => continue,
                    Err(ReadlineError::Eof) => break Ok(None),
                    Err(error) => break Err(error.into()),
                }
            },
            LineReader::Piped => {
                print!("{prompt}");
                io::stdout().flush()?;
                let mut line = String::new();
                let read = io::stdin().lock().read_line(&mut line)?;
                if read == 0 {
                    return Ok(None);
                }
                while line.ends_with(['\n', '\r']) {
                    line.pop();
                }
                Ok(Some(line))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{ContextPaths, EnvironmentContext};
    use tempfile::tempdir;

    fn runtime_in(base: &Path) -> ScriptRuntime {
        let paths = ContextPaths::rooted(base);
        let context =
            EnvironmentContext::build(paths.clone(), &[]).expect("context builds");
        let mut runtime = ScriptRuntime::new(&paths);
        runtime.inject_context(&context);
        runtime
    }

    #[test]
    fn one_shot_prints_nothing_for_void_results() {
        let base = tempdir().expect("create temp dir");
        let script = base.path().join("job.rvl");
        fs::write(&script, "let quiet = 1;").expect("write fixture");
        let mut runtime = runtime_in(base.path());
        run_one_shot(&mut runtime, &script).expect("one-shot succeeds");
    }

    #[test]
    fn one_shot_fails_on_broken_scripts() {
        let base = tempdir().expect("create temp dir");
        let script = base.path().join("bad.rvl");
        fs::write(&script, "this is ( not a script").expect("write fixture");
        let mut runtime = runtime_in(base.path());
        assert!(run_one_shot(&mut runtime, &script).is_err());
    }

    #[test]
    fn one_shot_fails_on_missing_scripts() {
        let base = tempdir().expect("create temp dir");
        let mut runtime = runtime_in(base.path());
        assert!(run_one_shot(&mut runtime, Path::new("/no/such/script.rvl")).is_err());
    }

    #[test]
    fn exit_terminates_the_turn_without_logging() {
        let base = tempdir().expect("create temp dir");
        let transcript = TranscriptLogger::at(base.path().join("session.txt"));
        let mut runtime = runtime_in(base.path());
        let outcome = repl_turn(&mut runtime, &transcript, "exit").expect("turn succeeds");
        assert_eq!(outcome, TurnOutcome::Exit);
        assert!(!transcript.path().exists());
    }

    #[test]
    fn transcript_records_input_then_result_and_skips_exit() {
        let base = tempdir().expect("create temp dir");
        let transcript = TranscriptLogger::at(base.path().join("session.txt"));
        let mut runtime = runtime_in(base.path());

        repl_turn(&mut runtime, &transcript, "1+1").expect("turn succeeds");
        let outcome = repl_turn(&mut runtime, &transcript, "exit").expect("turn succeeds");
        assert_eq!(outcome, TurnOutcome::Exit);

        let contents = fs::read_to_string(transcript.path()).expect("read transcript");
        assert_eq!(contents, "1+1\r\n// 2\r\n");
    }

    #[test]
    fn an_evaluation_error_does_not_end_the_session() {
        let base = tempdir().expect("create temp dir");
        let transcript = TranscriptLogger::at(base.path().join("session.txt"));
        let mut runtime = runtime_in(base.path());

        let outcome =
            repl_turn(&mut runtime, &transcript, "no_such_symbol").expect("turn survives");
        assert_eq!(outcome, TurnOutcome::Continue);

        // The next turn still evaluates and `exit` still works.
        repl_turn(&mut runtime, &transcript, "2+2").expect("turn succeeds");
        let outcome = repl_turn(&mut runtime, &transcript, "exit").expect("turn succeeds");
        assert_eq!(outcome, TurnOutcome::Exit);

        let contents = fs::read_to_string(transcript.path()).expect("read transcript");
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines, vec!["no_such_symbol", "// ", "2+2", "// 4"]);
    }

    #[test]
    fn null_results_are_logged_as_a_comment_marker() {
        let base = tempdir().expect("create temp dir");
        let transcript = TranscriptLogger::at(base.path().join("session.txt"));
        let mut runtime = runtime_in(base.path());

        repl_turn(&mut runtime, &transcript, "null").expect("turn succeeds");
        let contents = fs::read_to_string(transcript.path()).expect("read transcript");
        assert_eq!(contents, "null\r\n// null\r\n");
    }

    #[test]
    fn void_results_leave_no_result_comment() {
        let base = tempdir().expect("create temp dir");
        let transcript = TranscriptLogger::at(base.path().join("session.txt"));
        let mut runtime = runtime_in(base.path());

        repl_turn(&mut runtime, &transcript, "let x = 3;").expect("turn succeeds");
        let contents = fs::read_to_string(transcript.path()).expect("read transcript");
        assert_eq!(contents, "let x = 3;\r\n");
    }
}

//! Mode and argument parsing for the host command line.
//!
//! Grammar: `revel mode [target] [--flag ...] [-- passthrough...]`. The
//! target may be omitted (or elided when the second token is a flag), which
//! is only legal for `repl`. Tokens after a bare `--` pass through to the
//! script untouched; unrecognized bare tokens are dropped with a
//! diagnostic, not treated as errors.

use std::fmt;
use std::str::FromStr;

/// Execution mode fixed at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Run,
    Repl,
    Debug,
}

impl FromStr for Mode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "run" => Ok(Mode::Run),
            "repl" => Ok(Mode::Repl),
            "debug" => Ok(Mode::Debug),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Mode::Run => "run",
            Mode::Repl => "repl",
            Mode::Debug => "debug",
        };
        f.write_str(text)
    }
}

/// Why the command line could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UsageError {
    /// No arguments at all.
    Empty,
    /// First token is not a recognized mode.
    UnknownMode(String),
}

/// Parsed command line. Read-only for the rest of the run.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub mode: Mode,
    pub target: String,
    pub flags: Vec<String>,
    pub script_args: Vec<String>,
}

impl SessionState {
    pub fn bin_debug(&self) -> bool {
        self.flags.iter().any(|flag| flag == "--bindebug")
    }
}

/// Parse the post-binary arguments. Diagnostics for dropped tokens go to
/// standard output, matching the usage-error stream split.
pub fn parse(args: &[String]) -> Result<SessionState, UsageError> {
    let mut tokens = args.iter();
    let mode_token = tokens.next().ok_or(UsageError::Empty)?;
    let mode = Mode::from_str(mode_token)
        .map_err(|()| UsageError::UnknownMode(mode_token.clone()))?;

    let mut rest: Vec<String> = tokens.cloned().collect();
    let target = match rest.first() {
        Some(token) if !token.starts_with("--") => rest.remove(0),
        _ => String::new(),
    };

    let mut flags = Vec::new();
    let mut script_args = Vec::new();
    let mut drain = rest.into_iter();
    while let Some(token) = drain.next() {
        if token == "--" {
            script_args.extend(drain);
            break;
        }
        if token.starts_with("--") {
            flags.push(token);
        } else {
            // Nothing else is allowed between the target and the separator.
            println!("ignoring {token}");
        }
    }

    Ok(SessionState {
        mode,
        target,
        flags,
        script_args,
    })
}

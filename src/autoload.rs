//==================================================
// File: autoload.rs
//==================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Startup evaluation of the autoload directory
// Objective: Evaluate every recognized script in the autoload directory
//            before the user's program runs, treating failures as fatal
//==================================================

use std::fs;
use std::path::Path;

use anyhow::Context;

use crate::runtime::ScriptRuntime;

/// Extensions the autoloader recognizes: the engine's own plus the two
/// project extensions.
pub const SCRIPT_EXTENSIONS: [&str; 3] = ["rhai", "rvl", "rvs"];

/// Evaluate every recognized script directly inside `dir`, in whatever
/// order the file system lists them. The order is implementation-defined
/// and deliberately left unsorted.
///
/// Autoload files are trusted bootstrap code: an evaluation failure here is
/// not caught and takes the whole process down, unlike attachment failures.
pub fn run_autoload(runtime: &mut ScriptRuntime, dir: &Path) -> anyhow::Result<()> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("listing autoload directory {}", dir.display()))?;
    for entry in entries {
        let entry = entry
            .with_context(|| format!("listing autoload directory {}", dir.display()))?;
        let path = entry.path();
        if !path.is_file() || !is_script(&path) {
            continue;
        }
        tracing::debug!(file = %path.display(), "autoloading");
        let source = fs::read_to_string(&path)
            .with_context(|| format!("reading autoload file {}", path.display()))?;
        runtime
            .eval(&source)
            .with_context(|| format!("evaluating autoload file {}", path.display()))?;
    }
    Ok(())
}

fn is_script(path: &Path) -> bool {
    path.extension()
        .and_then(|extension| extension.to_str())
        .map_or(false, |extension| SCRIPT_EXTENSIONS.contains(&extension))
}

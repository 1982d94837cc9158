//==================================================
// File: context/mod.rs
//==================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Per-process environment context for scripts
// Objective: Collect process facts and bootstrap directories once at
//            startup for injection into the script global scope
//==================================================

pub mod version;

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub use version::Version;

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("unable to locate the running binary: {0}")]
    BinaryPath(std::io::Error),
    #[error("the running binary has no parent directory")]
    NoBinaryDir,
    #[error("creating {path}: {error}")]
    CreateDir {
        path: PathBuf,
        error: std::io::Error,
    },
}

//==================================================
// Section 1.0 - Bootstrap Paths
//==================================================

/// The five filesystem locations the host works from. The four auxiliary
/// directories are created before any script runs; creation is idempotent.
#[derive(Debug, Clone)]
pub struct ContextPaths {
    binary_path_file: PathBuf,
    binary_dir: PathBuf,
}

impl ContextPaths {
    /// Locate the paths next to the running binary. `REVEL_HOME` overrides
    /// the base directory, which keeps relocatable installs and test
    /// fixtures off the real install tree.
    pub fn discover() -> Result<Self, ContextError> {
        let binary_path_file = env::current_exe().map_err(ContextError::BinaryPath)?;
        let binary_dir = match env::var_os("REVEL_HOME") {
            Some(home) => PathBuf::from(home),
            None => binary_path_file
                .parent()
                .ok_or(ContextError::NoBinaryDir)?
                .to_path_buf(),
        };
        Ok(Self {
            binary_path_file,
            binary_dir,
        })
    }

    /// Root the auxiliary directories at an explicit base.
    pub fn rooted(base: &Path) -> Self {
        Self {
            binary_path_file: base.join("revel"),
            binary_dir: base.to_path_buf(),
        }
    }

    pub fn binary_path_file(&self) -> &Path {
        &self.binary_path_file
    }

    pub fn binary_dir(&self) -> &Path {
        &self.binary_dir
    }

    pub fn autoload_dir(&self) -> PathBuf {
        self.binary_dir.join("autoload")
    }

    pub fn plugins_dir(&self) -> PathBuf {
        self.binary_dir.join("plugins")
    }

    pub fn settings_dir(&self) -> PathBuf {
        self.binary_dir.join("settings")
    }

    pub fn library_dir(&self) -> PathBuf {
        self.binary_dir.join("library")
    }

    /// Create the four auxiliary directories. Succeeds whether or not they
    /// already exist.
    pub fn ensure_directories(&self) -> Result<(), ContextError> {
        for dir in [
            self.autoload_dir(),
            self.plugins_dir(),
            self.settings_dir(),
            self.library_dir(),
        ] {
            fs::create_dir_all(&dir).map_err(|error| ContextError::CreateDir {
                path: dir.clone(),
                error,
            })?;
        }
        Ok(())
    }
}

//==================================================
// Section 2.0 - Environment Context
//==================================================

/// Process-wide facts handed to scripts as the `__` namespace.
///
/// Build exactly once per process, before anything evaluates; the single
/// call site is the binary entry point. Identity fields fall back to empty
/// strings on platforms that do not define them.
#[derive(Debug, Clone)]
pub struct EnvironmentContext {
    pub args: Vec<String>,
    pub version: String,
    pub paths: ContextPaths,
    pub domain: String,
    pub user_name: String,
    pub user_profile: String,
    pub process_id: u32,
    pub start_time: String,
    pub prompt: String,
}

impl EnvironmentContext {
    pub fn build(paths: ContextPaths, args: &[String]) -> Result<Self, ContextError> {
        paths.ensure_directories()?;
        Ok(Self {
            args: args.to_vec(),
            version: Version::from_build_metadata().banner(),
            paths,
            domain: identity_var(&["USERDOMAIN", "HOSTNAME"]),
            user_name: identity_var(&["USERNAME", "USER", "LOGNAME"]),
            user_profile: profile_dir(),
            process_id: std::process::id(),
            start_time: chrono::Utc::now().to_rfc3339(),
            prompt: "\"revel> \"".to_string(),
        })
    }
}

fn identity_var(names: &[&str]) -> String {
    names
        .iter()
        .find_map(|name| env::var(name).ok())
        .unwrap_or_default()
}

fn profile_dir() -> String {
    env::var("USERPROFILE")
        .ok()
        .or_else(|| dirs::home_dir().map(|p| p.to_string_lossy().into_owned()))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn directories_are_created_once_and_survive_rebuilds() {
        let base = tempdir().expect("create temp dir");
        let paths = ContextPaths::rooted(base.path());
        paths.ensure_directories().expect("first creation succeeds");
        assert!(paths.autoload_dir().is_dir());
        assert!(paths.plugins_dir().is_dir());
        assert!(paths.settings_dir().is_dir());
        assert!(paths.library_dir().is_dir());

        // Pre-existing tree: no error, no duplicates.
        paths.ensure_directories().expect("second creation succeeds");
        let entries = fs::read_dir(base.path()).expect("list base").count();
        assert_eq!(entries, 4);
    }

    #[test]
    fn empty_argument_list_is_valid() {
        let base = tempdir().expect("create temp dir");
        let context = EnvironmentContext::build(ContextPaths::rooted(base.path()), &[])
            .expect("context builds");
        assert!(context.args.is_empty());
        assert!(context.version.contains('['));
    }

    #[test]
    fn arguments_are_preserved_in_order() {
        let base = tempdir().expect("create temp dir");
        let args = vec!["alpha".to_string(), "beta".to_string()];
        let context = EnvironmentContext::build(ContextPaths::rooted(base.path()), &args)
            .expect("context builds");
        assert_eq!(context.args, args);
    }
}

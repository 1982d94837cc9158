//==================================================
// File: glob.rs
//==================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Wildcard file matching for the script surface
// Objective: Resolve directory/pattern splits and return direct or
//            recursive matches as host array values
//==================================================

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Debug, Error)]
pub enum GlobError {
    #[error("listing {path}: {error}")]
    List {
        path: PathBuf,
        error: std::io::Error,
    },
    #[error("bad pattern '{pattern}': {error}")]
    Pattern { pattern: String, error: regex::Error },
}

/// Host-native array of file paths, as handed back by `glob`/`globall`.
/// Scripts index it directly or convert it with `toArray`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostArray(pub Vec<String>);

impl HostArray {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for HostArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (index, item) in self.0.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            write!(f, "\"{item}\"")?;
        }
        write!(f, "]")
    }
}

/// Direct-children matches for a path-like wildcard. The directory part
/// defaults to the current directory when the pattern has none.
pub fn glob(wild: &str) -> Result<HostArray, GlobError> {
    let (dir, pattern) = split_pattern(wild);
    let matcher = wildcard_regex(&pattern)?;
    let mut matches = Vec::new();
    let entries = fs::read_dir(&dir).map_err(|error| GlobError::List {
        path: dir.clone(),
        error,
    })?;
    for entry in entries {
        let entry = entry.map_err(|error| GlobError::List {
            path: dir.clone(),
            error,
        })?;
        if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            continue;
        }
        let name = entry.file_name();
        if let Some(name) = name.to_str() {
            if matcher.is_match(name) {
                matches.push(entry.path().display().to_string());
            }
        }
    }
    Ok(HostArray(matches))
}

/// Matches from the directory and every nested directory below it.
pub fn glob_all(wild: &str) -> Result<HostArray, GlobError> {
    let (dir, pattern) = split_pattern(wild);
    let matcher = wildcard_regex(&pattern)?;
    let mut matches = Vec::new();
    for entry in WalkDir::new(&dir).into_iter().filter_map(Result::ok) {
        if !entry.file_type().is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            if matcher.is_match(name) {
                matches.push(entry.path().display().to_string());
            }
        }
    }
    Ok(HostArray(matches))
}

/// Split a path-like wildcard into its directory and file-name pattern.
fn split_pattern(wild: &str) -> (PathBuf, String) {
    let path = Path::new(wild);
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let pattern = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    (dir, pattern)
}

/// Translate a `*`/`?` wildcard into an anchored regular expression over
/// the file name.
fn wildcard_regex(pattern: &str) -> Result<Regex, GlobError> {
    let mut translated = String::with_capacity(pattern.len() + 8);
    translated.push('^');
    for ch in pattern.chars() {
        match ch {
            '*' => translated.push_str(".*"),
            '?' => translated.push('.'),
            other => translated.push_str(&regex::escape(&other.to_string())),
        }
    }
    translated.push('$');
    Regex::new(&translated).map_err(|error| GlobError::Pattern {
        pattern: pattern.to_string(),
        error,
    })
}

//! Session transcript logging for interactive runs.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TranscriptError {
    #[error("creating transcript directory {path}: {error}")]
    CreateDir {
        path: PathBuf,
        error: std::io::Error,
    },
    #[error("appending to transcript {path}: {error}")]
    Append {
        path: PathBuf,
        error: std::io::Error,
    },
}

/// Append-only log of one interactive session: every input line verbatim,
/// every non-void result as a commented line. Each append opens, writes,
/// and closes the file, so the transcript is intact up to the last
/// completed append even if the host dies mid-session.
#[derive(Debug)]
pub struct TranscriptLogger {
    path: PathBuf,
}

impl TranscriptLogger {
    /// Open a fresh transcript under `dir`, named with a UTC timestamp to
    /// millisecond precision. The directory is created when absent.
    pub fn create(dir: &Path) -> Result<Self, TranscriptError> {
        fs::create_dir_all(dir).map_err(|error| TranscriptError::CreateDir {
            path: dir.to_path_buf(),
            error,
        })?;
        let stamp = chrono::Utc::now().format("%Y-%m-%d-%H-%M-%S-%3f");
        let path = dir.join(format!("repl_{stamp}.txt"));
        Ok(Self { path })
    }

    /// Transcript logger over an explicit file path.
    pub fn at(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record one raw input line, verbatim.
    pub fn record_input(&self, line: &str) -> Result<(), TranscriptError> {
        self.append(line)
    }

    /// Record one evaluation result as a commented line.
    pub fn record_result(&self, text: &str) -> Result<(), TranscriptError> {
        self.append(&format!("// {text}"))
    }

    fn append(&self, line: &str) -> Result<(), TranscriptError> {
        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)
            .map_err(|error| TranscriptError::Append {
                path: self.path.clone(),
                error,
            })?;
        file.write_all(line.as_bytes())
            .and_then(|()| file.write_all(b"\r\n"))
            .map_err(|error| TranscriptError::Append {
                path: self.path.clone(),
                error,
            })
    }
}

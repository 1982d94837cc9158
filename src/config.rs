//! Settings-directory configuration for the host.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration file name inside the settings directory.
const CONFIG_FILE: &str = "revel.toml";

/// Host configuration loaded from TOML. Everything is optional; absent
/// files fall back to defaults so a fresh install runs with no setup.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HostConfig {
    /// Override for the REPL prompt text (stored quoted in `__.prompt`, so
    /// scripts can keep rewriting it afterwards).
    pub prompt: Option<String>,
    /// Whether the autoload directory is evaluated at startup.
    pub autoload: bool,
    /// Override for the transcript directory.
    pub transcript_dir: Option<PathBuf>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            prompt: None,
            autoload: true,
            transcript_dir: None,
        }
    }
}

impl HostConfig {
    /// Load configuration from the settings directory or fall back to
    /// defaults when the file is absent.
    pub fn load(settings_dir: &Path) -> anyhow::Result<(Self, PathBuf)> {
        let path = settings_dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok((Self::default(), path));
        }
        let data = fs::read_to_string(&path)
            .with_context(|| format!("reading configuration from {}", path.display()))?;
        let config: Self = toml::from_str(&data)
            .with_context(|| format!("parsing configuration {}", path.display()))?;
        Ok((config, path))
    }
}

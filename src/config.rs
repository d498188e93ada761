//! Settings for log exchange and persistence.
//!
//! Defaults work out of the box; a TOML file can override individual fields.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::stream::logfile::DEFAULT_EXTENSION;

/// Runtime settings for a stream manager and the CLI.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Name of the agent using the manager, e.g. "annotation-processor" or
    /// "gui". Used in log/tracing output only.
    pub agent: String,
    /// Human-readable (indented) output when persisting logs. Off by
    /// default to keep files small.
    pub pretty_printing: bool,
    /// Directory for auto-named log files.
    pub log_dir: PathBuf,
    /// Extension for auto-named log files.
    pub log_extension: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            agent: "vizlog".to_string(),
            pretty_printing: false,
            log_dir: PathBuf::from("."),
            log_extension: DEFAULT_EXTENSION.to_string(),
        }
    }
}

/// TOML overlay: every field optional, missing fields keep their defaults.
#[derive(Debug, Clone, Default, Deserialize)]
struct TomlSettings {
    agent: Option<String>,
    pretty_printing: Option<bool>,
    log_dir: Option<PathBuf>,
    log_extension: Option<String>,
}

impl Settings {
    pub fn for_agent(agent: impl Into<String>) -> Self {
        Self {
            agent: agent.into(),
            ..Self::default()
        }
    }

    /// Load settings from a TOML file, falling back to defaults for missing
    /// fields. A missing or unparsable file yields the defaults.
    pub fn load_from(path: &Path) -> Self {
        let overlay = match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<TomlSettings>(&contents) {
                Ok(parsed) => parsed,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "ignoring invalid settings file");
                    TomlSettings::default()
                }
            },
            Err(_) => TomlSettings::default(),
        };

        let defaults = Self::default();
        Self {
            agent: overlay.agent.unwrap_or(defaults.agent),
            pretty_printing: overlay.pretty_printing.unwrap_or(defaults.pretty_printing),
            log_dir: overlay.log_dir.unwrap_or(defaults.log_dir),
            log_extension: overlay.log_extension.unwrap_or(defaults.log_extension),
        }
    }
}

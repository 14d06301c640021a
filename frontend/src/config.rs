//! `monitor.toml`: session defaults read at startup.
//!
//! ```toml
//! machine = "sandbox"
//! roms = "/path/to/roms"
//! dasm_lines = 8
//! mem_lines = 4
//! encoding = "az26"
//! trace = false
//! history = true
//! breakpoints = ["$e000"]
//! startup = ["mem lines 8"]
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MonitorConfig {
    pub machine: Option<String>,
    pub roms: Option<PathBuf>,
    pub dasm_lines: Option<usize>,
    pub mem_lines: Option<usize>,
    pub encoding: Option<String>,
    pub trace: bool,
    /// Keep line history between sessions. On unless set to false.
    pub history: Option<bool>,
    pub history_file: Option<PathBuf>,
    /// Breakpoints set before the first prompt, as monitor numerals.
    pub breakpoints: Vec<String>,
    /// Monitor commands run before the first prompt.
    pub startup: Vec<String>,
}

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(PathBuf, toml::de::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(path, e) => write!(f, "{}: {e}", path.display()),
            Self::Parse(path, e) => write!(f, "{}: {e}", path.display()),
        }
    }
}

impl std::error::Error for ConfigError {}

impl MonitorConfig {
    /// `<config dir>/scanline/monitor.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("scanline").join("monitor.toml"))
    }

    pub fn parse(text: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))
    }

    /// Load `path`. A missing file is only an error when `required`.
    pub fn load(path: &Path, required: bool) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(text) => {
                tracing::debug!("config loaded from {}", path.display());
                Self::parse(&text, path)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && !required => {
                Ok(Self::default())
            }
            Err(e) => Err(ConfigError::Io(path.to_path_buf(), e)),
        }
    }

    /// Where line history lives, or `None` when history is off.
    pub fn history_path(&self) -> Option<PathBuf> {
        if self.history == Some(false) {
            return None;
        }
        self.history_file
            .clone()
            .or_else(|| dirs::data_dir().map(|dir| dir.join("scanline").join("history")))
    }
}

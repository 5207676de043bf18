//! Configuration loading and data folder resolution
//!
//! Resolution priority for every setting:
//! 1. Command-line argument (highest priority, handled by the service binary)
//! 2. Environment variable
//! 3. TOML config file (`~/.config/mkat/<module>.toml`, then `/etc/mkat/<module>.toml`)
//! 4. OS-dependent compiled default (fallback)
//!
//! A missing or unreadable TOML file never fails startup: a warning is logged
//! and the compiled defaults are used.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Primary environment variable for the data folder
pub const DATA_FOLDER_ENV: &str = "MKAT_DATA_FOLDER";

/// Short alias accepted for the data folder
pub const DATA_FOLDER_ENV_ALIAS: &str = "MKAT_DATA";

/// Database file name inside the data folder
pub const DATABASE_FILE_NAME: &str = "mkat.db";

/// Compiled-in defaults for the current platform
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledDefaults {
    pub data_folder: PathBuf,
    pub log_level: String,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        Self {
            data_folder: default_data_folder(),
            log_level: "info".to_string(),
        }
    }
}

/// `[logging]` table of the TOML config
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// TOML configuration file contents
///
/// Every field is optional so that partial files are accepted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub data_folder: Option<PathBuf>,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub bind_address: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    /// Bearer secret expected from the external scheduler
    #[serde(default)]
    pub trigger_secret: Option<String>,
    /// Enables the in-process scheduler when set
    #[serde(default)]
    pub schedule_interval_secs: Option<u64>,
}

impl TomlConfig {
    /// Parse TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
    }

    /// Read and parse a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// Load the module's TOML config, falling back to defaults
    pub fn load_for_module(module_name: &str) -> Self {
        match find_config_file(module_name) {
            Some(path) => match Self::from_file(&path) {
                Ok(config) => {
                    debug!("Loaded config file: {}", path.display());
                    config
                }
                Err(e) => {
                    warn!("Ignoring config file {}: {}", path.display(), e);
                    Self::default()
                }
            },
            None => {
                debug!("No config file for module '{}', using defaults", module_name);
                Self::default()
            }
        }
    }
}

/// Candidate config file locations for a module, highest priority first
pub fn config_file_candidates(module_name: &str) -> Vec<PathBuf> {
    let file_name = format!("{}.toml", module_name);
    let mut candidates = Vec::new();

    if let Some(dir) = dirs::config_dir() {
        candidates.push(dir.join("mkat").join(&file_name));
    }
    if cfg!(unix) {
        candidates.push(PathBuf::from("/etc/mkat").join(&file_name));
    }

    candidates
}

fn find_config_file(module_name: &str) -> Option<PathBuf> {
    config_file_candidates(module_name)
        .into_iter()
        .find(|path| path.exists())
}

/// Get OS-dependent default data folder path
fn default_data_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("mkat"))
        .unwrap_or_else(|| PathBuf::from("./mkat_data"))
}

/// Resolves the data folder using CLI → ENV → TOML → default priority
#[derive(Debug, Clone, Default)]
pub struct DataFolderResolver {
    cli_override: Option<PathBuf>,
}

impl DataFolderResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a command-line supplied folder (priority 1)
    pub fn with_cli_override(mut self, folder: Option<PathBuf>) -> Self {
        self.cli_override = folder;
        self
    }

    /// Resolve against an already-loaded TOML config
    pub fn resolve_with(&self, toml_config: &TomlConfig) -> PathBuf {
        if let Some(folder) = &self.cli_override {
            return folder.clone();
        }

        for var in [DATA_FOLDER_ENV, DATA_FOLDER_ENV_ALIAS] {
            if let Ok(value) = std::env::var(var) {
                if !value.trim().is_empty() {
                    return PathBuf::from(value);
                }
            }
        }

        if let Some(folder) = &toml_config.data_folder {
            return folder.clone();
        }

        CompiledDefaults::for_current_platform().data_folder
    }
}

/// Creates the data folder and locates the database inside it
pub struct DataFolderInitializer {
    data_folder: PathBuf,
}

impl DataFolderInitializer {
    pub fn new(data_folder: PathBuf) -> Self {
        Self { data_folder }
    }

    /// Create the data folder (and parents) if missing; idempotent
    pub fn ensure_directory_exists(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_folder)?;
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_folder.join(DATABASE_FILE_NAME)
    }

    pub fn database_exists(&self) -> bool {
        self.database_path().exists()
    }
}

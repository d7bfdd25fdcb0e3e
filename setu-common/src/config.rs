//! Configuration loading and root folder resolution
//!
//! Root folder priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`SETU_ROOT_FOLDER`, then `SETU_ROOT`)
//! 3. TOML config file (`root_folder` key)
//! 4. OS-dependent compiled default (fallback)
//!
//! A missing or unreadable TOML file is never fatal; it logs a warning and
//! resolution falls through to the next tier.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Database file name inside the root folder
pub const DATABASE_FILE: &str = "setu.db";

/// Document store subdirectory inside the root folder
pub const DOCUMENTS_DIR: &str = "contracts";

/// Compiled default values used when nothing else is configured
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub root_folder: PathBuf,
    pub log_level: String,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        Self {
            root_folder: default_root_folder(),
            log_level: "info".to_string(),
        }
    }
}

/// Logging section of a TOML config file
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
pub struct LoggingConfig {
    pub level: Option<String>,
}

/// Keys shared by every service's TOML file
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TomlConfig {
    pub root_folder: Option<PathBuf>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Resolves the root folder for a named service
pub struct RootFolderResolver {
    module_name: String,
    cli_arg: Option<PathBuf>,
    toml_value: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new(module_name: &str) -> Self {
        Self {
            module_name: module_name.to_string(),
            cli_arg: None,
            toml_value: None,
        }
    }

    /// Set the command-line override (tier 1)
    pub fn with_cli_arg(mut self, cli_arg: Option<PathBuf>) -> Self {
        self.cli_arg = cli_arg;
        self
    }

    /// Use a `root_folder` the caller already read from its own TOML file
    /// (tier 3) instead of looking the file up again
    pub fn with_toml_value(mut self, toml_value: Option<PathBuf>) -> Self {
        self.toml_value = toml_value;
        self
    }

    pub fn resolve(&self) -> PathBuf {
        // Priority 1: Command-line argument
        if let Some(path) = &self.cli_arg {
            return path.clone();
        }

        // Priority 2: Environment variables
        for var in ["SETU_ROOT_FOLDER", "SETU_ROOT"] {
            if let Ok(path) = std::env::var(var) {
                if !path.trim().is_empty() {
                    return PathBuf::from(path);
                }
            }
        }

        // Priority 3: TOML config file
        if let Some(path) = &self.toml_value {
            return path.clone();
        }
        if let Some(config_path) = config_file_path(&self.module_name) {
            match load_toml::<TomlConfig>(&config_path) {
                Ok(config) => {
                    if let Some(root_folder) = config.root_folder {
                        return root_folder;
                    }
                }
                Err(e) => warn!("Ignoring config file {}: {}", config_path.display(), e),
            }
        }

        // Priority 4: OS-dependent compiled default
        CompiledDefaults::for_current_platform().root_folder
    }
}

/// Creates the root folder layout and hands out paths inside it
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    pub fn root_folder(&self) -> &Path {
        &self.root_folder
    }

    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE)
    }

    pub fn documents_path(&self) -> PathBuf {
        self.root_folder.join(DOCUMENTS_DIR)
    }

    /// Create the root folder if missing (idempotent)
    pub fn ensure_directory_exists(&self) -> Result<()> {
        std::fs::create_dir_all(&self.root_folder).map_err(|e| {
            Error::Config(format!(
                "Failed to create root folder {}: {}",
                self.root_folder.display(),
                e
            ))
        })
    }
}

/// Locate the TOML config file for a service, if one exists
///
/// Linux checks `~/.config/setu/<module>.toml` then `/etc/setu/<module>.toml`.
pub fn config_file_path(module_name: &str) -> Option<PathBuf> {
    let file_name = format!("{}.toml", module_name);
    let user_config = dirs::config_dir().map(|d| d.join("setu").join(&file_name));

    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/setu").join(&file_name);
        if system_config.exists() {
            return Some(system_config);
        }
    }

    debug!("No config file found for {}", module_name);
    None
}

/// Parse a TOML file into any deserializable config struct
pub fn load_toml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read TOML failed: {}", e)))?;
    toml::from_str(&content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
}

/// Get OS-dependent default root folder path
fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        dirs::data_local_dir()
            .map(|d| d.join("setu"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/setu"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("setu"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/setu"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("setu"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\setu"))
    } else {
        PathBuf::from("./setu_data")
    }
}

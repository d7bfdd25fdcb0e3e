//! Service configuration for setu-ca
//!
//! Each setting resolves CLI flag → environment variable → TOML file →
//! compiled default. clap covers the first two tiers (`#[arg(env)]`); the
//! TOML file is `setu-ca.toml` in the Setu config directory.

use clap::Parser;
use serde::Deserialize;
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use setu_common::config::{config_file_path, load_toml, LoggingConfig, RootFolderResolver};

use crate::analysis::{FixedScorer, PlaceholderScorer, RiskScorer};

/// Module name; also the TOML file stem
pub const MODULE_NAME: &str = "setu-ca";

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:5740";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Which `RiskScorer` to run
///
/// TOML goes through the same 0-100 check as the CLI form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(try_from = "RawScorerSetting")]
pub enum ScorerSetting {
    #[default]
    Placeholder,
    /// Always the given score (demos, deterministic deployments)
    Fixed(u8),
}

/// Unchecked TOML shape of `ScorerSetting`
#[derive(Deserialize)]
#[serde(rename_all = "lowercase")]
enum RawScorerSetting {
    Placeholder,
    Fixed(u8),
}

impl TryFrom<RawScorerSetting> for ScorerSetting {
    type Error = String;

    fn try_from(raw: RawScorerSetting) -> Result<Self, Self::Error> {
        match raw {
            RawScorerSetting::Placeholder => Ok(ScorerSetting::Placeholder),
            RawScorerSetting::Fixed(score) => ScorerSetting::fixed(score),
        }
    }
}

impl ScorerSetting {
    fn fixed(score: u8) -> Result<Self, String> {
        if score > 100 {
            return Err(format!("fixed score must be 0-100, got {}", score));
        }
        Ok(ScorerSetting::Fixed(score))
    }

    pub fn build(&self) -> Arc<dyn RiskScorer> {
        match self {
            ScorerSetting::Placeholder => Arc::new(PlaceholderScorer),
            ScorerSetting::Fixed(score) => Arc::new(FixedScorer::new(*score as i64)),
        }
    }
}

impl FromStr for ScorerSetting {
    type Err = String;

    /// Accepts `placeholder` or `fixed:<0-100>`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().split_once(':') {
            None if s.trim().eq_ignore_ascii_case("placeholder") => Ok(ScorerSetting::Placeholder),
            Some((kind, value)) if kind.eq_ignore_ascii_case("fixed") => {
                let score: u8 = value
                    .trim()
                    .parse()
                    .map_err(|_| format!("invalid fixed score: {}", value))?;
                ScorerSetting::fixed(score)
            }
            _ => Err(format!("unknown scorer '{}' (expected placeholder or fixed:<score>)", s)),
        }
    }
}

impl fmt::Display for ScorerSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScorerSetting::Placeholder => f.write_str("placeholder"),
            ScorerSetting::Fixed(score) => write!(f, "fixed:{}", score),
        }
    }
}

/// Command-line arguments (each also readable from the environment)
#[derive(Debug, Parser, Default)]
#[command(name = "setu-ca", version, about = "Setu contract risk analyzer")]
pub struct Cli {
    /// Root folder holding the database and stored contracts
    #[arg(long, env = "SETU_ROOT_FOLDER")]
    pub root_folder: Option<PathBuf>,

    /// Listen address
    #[arg(long, env = "SETU_CA_BIND_ADDR")]
    pub bind_addr: Option<SocketAddr>,

    /// Largest accepted contract upload, in bytes
    #[arg(long, env = "SETU_CA_MAX_UPLOAD_BYTES")]
    pub max_upload_bytes: Option<usize>,

    /// Risk scorer: `placeholder` or `fixed:<score>`
    #[arg(long, env = "SETU_CA_SCORER")]
    pub scorer: Option<ScorerSetting>,

    /// Explicit config file (defaults to the platform config directory)
    #[arg(long, env = "SETU_CA_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Keys read from `setu-ca.toml`
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ServiceToml {
    pub root_folder: Option<PathBuf>,
    pub bind_addr: Option<SocketAddr>,
    pub max_upload_bytes: Option<usize>,
    pub scorer: Option<ScorerSetting>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Fully resolved configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub root_folder: PathBuf,
    pub bind_addr: SocketAddr,
    pub max_upload_bytes: usize,
    pub scorer: ScorerSetting,
    pub log_level: Option<String>,
}

/// Outcome of looking for the TOML file; logged once tracing is up
#[derive(Debug)]
pub enum ConfigSource {
    Defaults,
    Loaded(PathBuf),
    Ignored(PathBuf, setu_common::Error),
}

impl ServiceConfig {
    /// Merge CLI/env values over the TOML file over compiled defaults
    ///
    /// An unreadable or malformed file is ignored, not fatal.
    pub fn resolve(cli: Cli) -> (Self, ConfigSource) {
        let toml_path = cli.config.clone().or_else(|| config_file_path(MODULE_NAME));
        let (file, source) = match toml_path {
            Some(path) => match load_toml::<ServiceToml>(&path) {
                Ok(file) => (file, ConfigSource::Loaded(path)),
                Err(e) => (ServiceToml::default(), ConfigSource::Ignored(path, e)),
            },
            None => (ServiceToml::default(), ConfigSource::Defaults),
        };

        (Self::merge(cli, file), source)
    }

    pub fn merge(cli: Cli, file: ServiceToml) -> Self {
        let root_folder = RootFolderResolver::new(MODULE_NAME)
            .with_cli_arg(cli.root_folder)
            .with_toml_value(file.root_folder)
            .resolve();

        let bind_addr = cli.bind_addr.or(file.bind_addr).unwrap_or_else(|| {
            DEFAULT_BIND_ADDR
                .parse()
                .unwrap_or_else(|_| SocketAddr::from(([127, 0, 0, 1], 5740)))
        });

        Self {
            root_folder,
            bind_addr,
            max_upload_bytes: cli
                .max_upload_bytes
                .or(file.max_upload_bytes)
                .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            scorer: cli.scorer.or(file.scorer).unwrap_or_default(),
            log_level: file.logging.level,
        }
    }
}

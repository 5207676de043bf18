//! Service configuration
//!
//! Each setting resolves in order: command line, environment (both via
//! clap), TOML file, compiled default.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use mkat_common::config::{CompiledDefaults, DataFolderInitializer, DataFolderResolver, TomlConfig};

/// Module name used for config file lookup and the health response
pub const MODULE_NAME: &str = "mkat-ap";

pub const DEFAULT_PORT: u16 = 5760;
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1";

/// Command-line arguments for mkat-ap
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "mkat-ap")]
#[command(about = "Marketing autopilot optimization service")]
#[command(version)]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, env = "MKAT_AP_PORT")]
    pub port: Option<u16>,

    /// Address to bind the HTTP server to
    #[arg(long, env = "MKAT_AP_BIND_ADDRESS")]
    pub bind_address: Option<String>,

    /// Data folder holding mkat.db
    #[arg(short, long, env = "MKAT_DATA_FOLDER")]
    pub data_folder: Option<PathBuf>,

    /// Bearer token required on /autopilot routes
    #[arg(long, env = "MKAT_AP_TRIGGER_SECRET", hide_env_values = true)]
    pub trigger_secret: Option<String>,

    /// Run the cycle in-process every N seconds
    #[arg(long, env = "MKAT_AP_SCHEDULE_INTERVAL_SECS")]
    pub schedule_interval_secs: Option<u64>,
}

/// Fully resolved configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub data_folder: PathBuf,
    pub database_path: PathBuf,
    pub bind_address: String,
    pub port: u16,
    /// `None` disables trigger authentication
    pub trigger_secret: Option<String>,
    /// `None` leaves scheduling to an external trigger
    pub schedule_interval: Option<Duration>,
    pub log_level: String,
    /// Extra log sink next to stderr
    pub log_file: Option<PathBuf>,
}

impl Config {
    /// Resolve against the TOML file found for this module
    pub fn load(args: &Args) -> Self {
        Self::resolve(args, &TomlConfig::load_for_module(MODULE_NAME))
    }

    pub fn resolve(args: &Args, toml_config: &TomlConfig) -> Self {
        let data_folder = DataFolderResolver::new()
            .with_cli_override(args.data_folder.clone())
            .resolve_with(toml_config);
        let database_path = DataFolderInitializer::new(data_folder.clone()).database_path();

        let trigger_secret = args
            .trigger_secret
            .clone()
            .or_else(|| toml_config.trigger_secret.clone())
            .filter(|secret| !secret.trim().is_empty());

        let schedule_interval = args
            .schedule_interval_secs
            .or(toml_config.schedule_interval_secs)
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        let log_level = if toml_config.logging.level.trim().is_empty() {
            CompiledDefaults::for_current_platform().log_level
        } else {
            toml_config.logging.level.clone()
        };

        Self {
            data_folder,
            database_path,
            bind_address: args
                .bind_address
                .clone()
                .or_else(|| toml_config.bind_address.clone())
                .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string()),
            port: args.port.or(toml_config.port).unwrap_or(DEFAULT_PORT),
            trigger_secret,
            schedule_interval,
            log_level,
            log_file: toml_config.logging.file.clone(),
        }
    }

    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

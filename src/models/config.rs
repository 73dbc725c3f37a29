use crate::models::config_validator::validate_config;
use crate::models::error::{ExporterError, Result};
use clap::ValueEnum;
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Where cloud backup information comes from. One mode per deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CloudMode {
    /// Read `cloud_backup_registry.json` written by the backup script
    Registry,
    /// List the remote with rclone, cached for `cloud_cache_ttl_secs`
    Rclone,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default = "default_backup_dir")]
    pub backup_dir: String,
    #[serde(default = "default_rclone_remote")]
    pub rclone_remote: String,
    #[serde(default = "default_rclone_path")]
    pub rclone_path: String,
    #[serde(default = "default_rclone_binary")]
    pub rclone_binary: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_address")]
    pub address: String,
    #[serde(default = "default_cloud_mode")]
    pub cloud_mode: CloudMode,
    #[serde(default = "default_command_timeout_secs")]
    pub command_timeout_secs: u64,
    #[serde(default = "default_cloud_cache_ttl_secs")]
    pub cloud_cache_ttl_secs: u64,
}

fn default_backup_dir() -> String {
    "/opt/backups/paperless".to_string()
}
fn default_rclone_remote() -> String {
    "gdrive-crypt".to_string()
}
fn default_rclone_path() -> String {
    "paperless-backup".to_string()
}
fn default_rclone_binary() -> String {
    "rclone".to_string()
}
fn default_address() -> String {
    "0.0.0.0".to_string()
}
const fn default_port() -> u16 {
    9116
}
const fn default_cloud_mode() -> CloudMode {
    CloudMode::Registry
}
const fn default_command_timeout_secs() -> u64 {
    30
}
const fn default_cloud_cache_ttl_secs() -> u64 {
    3600
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backup_dir: default_backup_dir(),
            rclone_remote: default_rclone_remote(),
            rclone_path: default_rclone_path(),
            rclone_binary: default_rclone_binary(),
            port: default_port(),
            address: default_address(),
            cloud_mode: default_cloud_mode(),
            command_timeout_secs: default_command_timeout_secs(),
            cloud_cache_ttl_secs: default_cloud_cache_ttl_secs(),
        }
    }
}

/// Values given on the command line (or through their env vars).
/// Anything set here wins over the config file.
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    pub backup_dir: Option<String>,
    pub rclone_remote: Option<String>,
    pub rclone_path: Option<String>,
    pub rclone_binary: Option<String>,
    pub port: Option<u16>,
    pub address: Option<String>,
    pub cloud_mode: Option<CloudMode>,
    pub command_timeout_secs: Option<u64>,
    pub cloud_cache_ttl_secs: Option<u64>,
}

impl Config {
    pub fn apply_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(backup_dir) = overrides.backup_dir {
            self.backup_dir = backup_dir;
        }
        if let Some(remote) = overrides.rclone_remote {
            self.rclone_remote = remote;
        }
        if let Some(path) = overrides.rclone_path {
            self.rclone_path = path;
        }
        if let Some(binary) = overrides.rclone_binary {
            self.rclone_binary = binary;
        }
        if let Some(port) = overrides.port {
            self.port = port;
        }
        if let Some(address) = overrides.address {
            self.address = address;
        }
        if let Some(mode) = overrides.cloud_mode {
            self.cloud_mode = mode;
        }
        if let Some(timeout) = overrides.command_timeout_secs {
            self.command_timeout_secs = timeout;
        }
        if let Some(ttl) = overrides.cloud_cache_ttl_secs {
            self.cloud_cache_ttl_secs = ttl;
        }
        self
    }
}

/// Build the effective config: defaults, then the optional JSON file, then overrides.
pub fn setup_config(config_file: Option<String>, overrides: ConfigOverrides) -> Result<Config> {
    let base = match config_file {
        Some(config_file) => load_config_file(config_file)?,
        None => Config::default(),
    };

    let config = base.apply_overrides(overrides);
    validate_config(&config)?;

    Ok(config)
}

fn load_config_file(config_file: String) -> Result<Config> {
    let config_path = PathBuf::from(config_file);
    info!("Loading config from: {}", config_path.display());

    let config_str = fs::read_to_string(&config_path).map_err(|cause| {
        ExporterError::ConfigRead {
            path: config_path.clone(),
            cause,
        }
    })?;

    serde_json::from_str(&config_str).map_err(|cause| ExporterError::ConfigParse {
        path: config_path,
        cause,
    })
}

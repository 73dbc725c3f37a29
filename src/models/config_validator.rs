use crate::models::config::{CloudMode, Config};
use crate::models::error::{ExporterError, Result};
use log::{info, warn};
use std::net::IpAddr;
use std::path::Path;

/// Validates the entire configuration
pub fn validate_config(config: &Config) -> Result<()> {
    info!("Validating configuration...");

    validate_numeric_values(config)?;

    validate_address(&config.address)?;

    validate_backup_dir(&config.backup_dir)?;

    validate_cloud_settings(config)?;

    info!("Configuration validation passed");
    Ok(())
}

/// Validate numeric configuration values
fn validate_numeric_values(config: &Config) -> Result<()> {
    if config.port == 0 {
        return Err(ExporterError::ConfigInvalid(
            "port must be greater than 0".to_string(),
        ));
    }

    if config.command_timeout_secs == 0 {
        return Err(ExporterError::ConfigInvalid(
            "command_timeout_secs must be greater than 0".to_string(),
        ));
    }

    if config.cloud_cache_ttl_secs == 0 {
        return Err(ExporterError::ConfigInvalid(
            "cloud_cache_ttl_secs must be greater than 0".to_string(),
        ));
    }

    Ok(())
}

fn validate_address(address: &str) -> Result<()> {
    address.parse::<IpAddr>().map(|_| ()).map_err(|e| {
        ExporterError::ConfigInvalid(format!("address '{}' is not an IP address: {}", address, e))
    })
}

/// The backup directory may be missing (reported as zero backups) but must not be a file
fn validate_backup_dir(backup_dir: &str) -> Result<()> {
    if backup_dir.is_empty() {
        return Err(ExporterError::ConfigInvalid(
            "backup_dir must not be empty".to_string(),
        ));
    }

    let path = Path::new(backup_dir);
    if !path.exists() {
        warn!(
            "Backup directory does not exist yet: {}. Local backups will be reported as 0.",
            backup_dir
        );
        return Ok(());
    }

    if !path.is_dir() {
        return Err(ExporterError::ConfigInvalid(format!(
            "backup_dir exists but is not a directory: {}",
            backup_dir
        )));
    }

    Ok(())
}

fn validate_cloud_settings(config: &Config) -> Result<()> {
    if config.cloud_mode != CloudMode::Rclone {
        return Ok(());
    }

    if config.rclone_remote.trim().is_empty() {
        return Err(ExporterError::ConfigInvalid(
            "rclone_remote must be set when cloud_mode is rclone".to_string(),
        ));
    }

    if config.rclone_binary.trim().is_empty() {
        return Err(ExporterError::ConfigInvalid(
            "rclone_binary must be set when cloud_mode is rclone".to_string(),
        ));
    }

    if config.command_timeout_secs > config.cloud_cache_ttl_secs {
        warn!(
            "command_timeout_secs ({}) exceeds cloud_cache_ttl_secs ({}). Slow listings may be refetched on every scrape.",
            config.command_timeout_secs, config.cloud_cache_ttl_secs
        );
    }

    Ok(())
}

use crate::models::cloud_record::CloudBackupRecord;
use crate::models::config::{CloudMode, Config};
use crate::service::cloud_registry::read_registry;
use crate::service::cloud_remote::{CloudCache, RcloneSettings, RemoteListingReader};
use chrono::{DateTime, Utc};
use log::error;
use std::path::PathBuf;
use std::time::Duration;

/// The cloud reader chosen for this deployment.
#[derive(Debug)]
pub enum CloudSource {
    Registry { backup_dir: PathBuf },
    Remote(RemoteListingReader),
}

impl CloudSource {
    pub fn from_config(config: &Config) -> Self {
        match config.cloud_mode {
            CloudMode::Registry => CloudSource::Registry {
                backup_dir: PathBuf::from(&config.backup_dir),
            },
            CloudMode::Rclone => CloudSource::Remote(RemoteListingReader::new(
                RcloneSettings {
                    binary: config.rclone_binary.clone(),
                    remote: config.rclone_remote.clone(),
                    path: config.rclone_path.clone(),
                    timeout: Duration::from_secs(config.command_timeout_secs),
                },
                CloudCache::new(Duration::from_secs(config.cloud_cache_ttl_secs)),
            )),
        }
    }

    pub async fn read(&self, now: DateTime<Utc>) -> Vec<CloudBackupRecord> {
        match self {
            CloudSource::Registry { backup_dir } => {
                let backup_dir = backup_dir.clone();
                tokio::task::spawn_blocking(move || read_registry(&backup_dir, now))
                    .await
                    .unwrap_or_else(|e| {
                        error!("Cloud backup registry task failed: {}", e);
                        Vec::new()
                    })
            }
            CloudSource::Remote(reader) => reader.read(now).await,
        }
    }
}

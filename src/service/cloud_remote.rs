use crate::models::cloud_record::{CloudBackupRecord, RemoteBackup, RemoteListingEntry};
use crate::models::error::{ExporterError, Result};
use crate::service::recency::classify;
use crate::utils::command::run_with_timeout;
use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use serde_json::Value;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// How to reach the remote holding the cloud backups.
#[derive(Debug, Clone)]
pub struct RcloneSettings {
    pub binary: String,
    pub remote: String,
    pub path: String,
    pub timeout: Duration,
}

impl RcloneSettings {
    fn target(&self, sub_path: Option<&str>) -> String {
        match sub_path {
            Some(sub_path) => format!("{}:{}/{}", self.remote, self.path, sub_path),
            None => format!("{}:{}", self.remote, self.path),
        }
    }
}

/// Last successful remote listing and when it was taken.
#[derive(Debug)]
pub struct CloudCache {
    value: Option<Vec<RemoteBackup>>,
    fetched_at: Option<Instant>,
    ttl: Duration,
}

impl CloudCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            value: None,
            fetched_at: None,
            ttl,
        }
    }

    /// The cached listing if it was fetched less than `ttl` before `now`.
    pub fn fresh(&self, now: Instant) -> Option<&[RemoteBackup]> {
        match (&self.value, self.fetched_at) {
            (Some(value), Some(fetched_at))
                if now.saturating_duration_since(fetched_at) < self.ttl =>
            {
                Some(value.as_slice())
            }
            _ => None,
        }
    }

    pub fn store(&mut self, value: Vec<RemoteBackup>, now: Instant) {
        self.value = Some(value);
        self.fetched_at = Some(now);
    }
}

/// Lists backup directories on an rclone remote, caching the listing between scrapes.
#[derive(Debug)]
pub struct RemoteListingReader {
    settings: RcloneSettings,
    cache: Mutex<CloudCache>,
}

impl RemoteListingReader {
    pub fn new(settings: RcloneSettings, cache: CloudCache) -> Self {
        Self {
            settings,
            cache: Mutex::new(cache),
        }
    }

    /// Cloud backups newest first. Never fails: a broken listing yields nothing this cycle.
    pub async fn read(&self, now: DateTime<Utc>) -> Vec<CloudBackupRecord> {
        let backups = self.cached_or_fetch().await;

        let mut records: Vec<CloudBackupRecord> = backups
            .into_iter()
            .map(|backup| {
                let (age_hours, is_recent) = classify(backup.created_at, now);
                CloudBackupRecord {
                    timestamp: Some(backup.created_at.timestamp()),
                    name: backup.name,
                    size_bytes: backup.size_bytes,
                    created_at: backup.created_at,
                    age_hours,
                    is_recent,
                }
            })
            .collect();
        records.sort_by(CloudBackupRecord::cmp_newest_first);
        records
    }

    // The lock is held across the fetch so concurrent scrapes wait for one listing.
    async fn cached_or_fetch(&self) -> Vec<RemoteBackup> {
        let mut cache = self.cache.lock().await;

        if let Some(cached) = cache.fresh(Instant::now()) {
            info!("Using cached cloud backup data");
            return cached.to_vec();
        }

        info!("Fetching fresh cloud backup data from {}", self.settings.target(None));
        match self.fetch().await {
            Ok(backups) => {
                cache.store(backups.clone(), Instant::now());
                backups
            }
            Err(e) => {
                error!("Error getting cloud backups: {}", e);
                Vec::new()
            }
        }
    }

    async fn fetch(&self) -> Result<Vec<RemoteBackup>> {
        let args = vec!["lsjson".to_string(), self.settings.target(None)];
        let output = run_with_timeout(&self.settings.binary, &args, self.settings.timeout).await?;
        debug!("rclone lsjson exited with {:?}", output.code);
        if !output.stderr.trim().is_empty() {
            debug!("rclone lsjson stderr: {}", output.stderr.trim());
        }

        let listing: Vec<Value> =
            serde_json::from_str(&output.stdout).map_err(|e| ExporterError::OutputParse {
                command: format!("{} lsjson", self.settings.binary),
                reason: e.to_string(),
            })?;

        let mut backups = Vec::new();
        for (index, element) in listing.into_iter().enumerate() {
            let entry: RemoteListingEntry = match serde_json::from_value(element) {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping malformed listing entry {}: {}", index, e);
                    continue;
                }
            };
            if !entry.is_dir {
                continue;
            }
            let name = entry.path.clone();
            match self.fetch_backup(entry).await {
                Ok(backup) => backups.push(backup),
                Err(e) => error!("Error processing cloud backup {}: {}", name, e),
            }
        }
        Ok(backups)
    }

    async fn fetch_backup(&self, entry: RemoteListingEntry) -> Result<RemoteBackup> {
        let created_at = DateTime::parse_from_rfc3339(&entry.mod_time)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| ExporterError::OutputParse {
                command: format!("{} lsjson", self.settings.binary),
                reason: format!("invalid ModTime '{}': {}", entry.mod_time, e),
            })?;

        let args = vec!["size".to_string(), self.settings.target(Some(&entry.path))];
        let output = run_with_timeout(&self.settings.binary, &args, self.settings.timeout).await?;
        let size_bytes =
            parse_size_output(&output.stdout).ok_or_else(|| ExporterError::OutputParse {
                command: format!("{} size", self.settings.binary),
                reason: format!("no byte count in '{}'", output.stdout.trim()),
            })?;

        debug!("Cloud backup {}: {} bytes", entry.path, size_bytes);
        Ok(RemoteBackup {
            name: entry.path,
            size_bytes,
            created_at,
        })
    }
}

/// Byte count from `rclone size` output, e.g. `Total size: 4.259 GiB (4,574,074,345 Bytes)`.
pub fn parse_size_output(output: &str) -> Option<u64> {
    output
        .lines()
        .filter(|line| line.trim_start().starts_with("Total size:"))
        .find_map(|line| {
            let start = line.rfind('(')?;
            let end = start + line[start..].find(')')?;
            let inner = line[start + 1..end].trim();
            let digits = inner
                .strip_suffix("Bytes")
                .or_else(|| inner.strip_suffix("Byte"))?
                .trim()
                .replace(',', "");
            digits.parse().ok()
        })
}

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::cmp::Ordering;

/// A backup known to exist on the cloud side.
#[derive(Debug, Clone, PartialEq)]
pub struct CloudBackupRecord {
    pub name: String,
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
    /// Unix seconds exposed as `backup_cloud_timestamp`, when known
    pub timestamp: Option<i64>,
    pub age_hours: f64,
    pub is_recent: bool,
}

impl CloudBackupRecord {
    /// Descending by creation time, ties by name.
    pub fn cmp_newest_first(&self, other: &Self) -> Ordering {
        other
            .created_at
            .cmp(&self.created_at)
            .then_with(|| other.name.cmp(&self.name))
    }
}

/// One element of `cloud_backup_registry.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistryEntry {
    pub name: String,
    pub size_bytes: u64,
    /// Unix seconds; the backup script may write fractional seconds
    pub timestamp: f64,
}

/// One element of `rclone lsjson` output. Only the fields we read.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RemoteListingEntry {
    pub path: String,
    pub mod_time: String,
    #[serde(default)]
    pub is_dir: bool,
}

/// Raw remote data kept in the cache; age is recomputed on every scrape.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteBackup {
    pub name: String,
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
}

use crate::models::cloud_record::{CloudBackupRecord, RegistryEntry};
use crate::models::error::{ExporterError, Result};
use crate::service::recency::classify;
use chrono::{DateTime, Utc};
use log::{error, info, warn};
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Registry written next to the local backups by the cloud sync script.
pub const REGISTRY_FILE_NAME: &str = "cloud_backup_registry.json";

/// Cloud backups recorded in `<backup_dir>/cloud_backup_registry.json`, newest first.
///
/// A missing registry means no cloud backups. An unreadable one is logged and
/// reported as empty; a malformed element only drops that element.
pub fn read_registry(backup_dir: &Path, now: DateTime<Utc>) -> Vec<CloudBackupRecord> {
    let registry_path = backup_dir.join(REGISTRY_FILE_NAME);

    if !registry_path.exists() {
        info!("Cloud backup registry file not found, no cloud backups to report");
        return Vec::new();
    }

    let elements = match load_registry(&registry_path) {
        Ok(elements) => elements,
        Err(e) => {
            error!("Error reading cloud backup registry: {}", e);
            return Vec::new();
        }
    };

    let mut records: Vec<CloudBackupRecord> = elements
        .into_iter()
        .enumerate()
        .filter_map(|(idx, element)| match record_from_element(element, now) {
            Ok(record) => Some(record),
            Err(reason) => {
                warn!("Skipping cloud backup registry entry #{}: {}", idx + 1, reason);
                None
            }
        })
        .collect();

    records.sort_by(CloudBackupRecord::cmp_newest_first);
    info!("Loaded {} cloud backups from registry", records.len());
    records
}

/// The registry must be a JSON array; its elements are decoded one by one later.
fn load_registry(registry_path: &Path) -> Result<Vec<Value>> {
    let content = fs::read_to_string(registry_path).map_err(|cause| ExporterError::RegistryRead {
        path: registry_path.to_path_buf(),
        cause,
    })?;

    serde_json::from_str(&content).map_err(|cause| ExporterError::RegistryParse {
        path: registry_path.to_path_buf(),
        cause,
    })
}

fn record_from_element(
    element: Value,
    now: DateTime<Utc>,
) -> std::result::Result<CloudBackupRecord, String> {
    let entry: RegistryEntry = serde_json::from_value(element).map_err(|e| e.to_string())?;

    let created_at = DateTime::from_timestamp_micros((entry.timestamp * 1_000_000.0).round() as i64)
        .ok_or_else(|| format!("timestamp {} is out of range", entry.timestamp))?;
    let (age_hours, is_recent) = classify(created_at, now);

    Ok(CloudBackupRecord {
        name: entry.name,
        size_bytes: entry.size_bytes,
        created_at,
        timestamp: Some(entry.timestamp.floor() as i64),
        age_hours,
        is_recent,
    })
}

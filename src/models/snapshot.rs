use crate::models::backup_instance::{ArtifactKind, LocalBackupEntry};
use crate::models::cloud_record::CloudBackupRecord;

/// Everything one scrape exposes. Built per request, never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsSnapshot {
    pub local_count: usize,
    pub local_total_size: u64,
    pub local_entries: Vec<LocalBackupEntry>,
    pub cloud_count: usize,
    pub cloud_total_size: u64,
    pub cloud_records: Vec<CloudBackupRecord>,
    pub latest_local_age_hours: Option<f64>,
    pub latest_cloud_age_hours: Option<f64>,
    pub local_success: bool,
    pub cloud_success: bool,
}

impl MetricsSnapshot {
    /// Aggregate scanner and reader output. Both inputs must already be sorted newest first.
    pub fn aggregate(
        local_entries: Vec<LocalBackupEntry>,
        cloud_records: Vec<CloudBackupRecord>,
    ) -> Self {
        // Only the per-directory totals count; named artifacts are already inside them.
        let local_total_size = local_entries
            .iter()
            .filter(|entry| entry.artifact.kind == ArtifactKind::Total)
            .map(|entry| entry.artifact.size_bytes)
            .sum();
        let cloud_total_size = cloud_records.iter().map(|r| r.size_bytes).sum();

        let latest_local = local_entries.first().map(|e| &e.instance);
        let latest_cloud = cloud_records.first();

        Self {
            local_count: local_entries.len(),
            local_total_size,
            cloud_count: cloud_records.len(),
            cloud_total_size,
            latest_local_age_hours: latest_local.map(|i| i.age_hours),
            latest_cloud_age_hours: latest_cloud.map(|r| r.age_hours),
            local_success: latest_local.is_some_and(|i| i.is_recent),
            cloud_success: latest_cloud.is_some_and(|r| r.is_recent),
            local_entries,
            cloud_records,
        }
    }
}

use crate::models::backup_instance::{
    ArtifactKind, BackupArtifact, BackupInstance, LocalBackupEntry, WELL_KNOWN_FILES,
};
use crate::models::error::{ExporterError, Result};
use crate::service::recency::classify;
use crate::service::timestamp::{resolve_created_at, BACKUP_PREFIX};
use crate::utils::directory::{get_directory_size, get_prefixed_dirs};
use chrono::{DateTime, Utc};
use log::{debug, error, info};
use std::fs;
use std::path::Path;

/// Scan `backup_dir` for `backup-*` directories and return one entry per artifact,
/// newest first. A missing root yields no entries; a broken instance is logged and skipped.
pub fn scan_local_backups(backup_dir: &Path, now: DateTime<Utc>) -> Vec<LocalBackupEntry> {
    if !backup_dir.exists() {
        info!(
            "Backup directory {} does not exist, no local backups to report",
            backup_dir.display()
        );
        return Vec::new();
    }

    let instance_dirs = match get_prefixed_dirs(backup_dir, BACKUP_PREFIX) {
        Ok(dirs) => dirs,
        Err(e) => {
            error!("Error listing local backups: {}", e);
            return Vec::new();
        }
    };

    let mut entries = Vec::new();
    for instance_dir in instance_dirs {
        match scan_instance(&instance_dir, now) {
            Ok(instance_entries) => entries.extend(instance_entries),
            Err(e) => error!("Error processing backup {}: {}", instance_dir.display(), e),
        }
    }

    entries.sort_by(LocalBackupEntry::cmp_newest_first);
    debug!("Found {} local backup entries", entries.len());
    entries
}

/// Entries for one backup directory: each well-known file present, then the Total.
fn scan_instance(instance_dir: &Path, now: DateTime<Utc>) -> Result<Vec<LocalBackupEntry>> {
    let name = instance_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let created_at = resolve_created_at(&name, instance_dir)?;
    let (age_hours, is_recent) = classify(created_at, now);
    let instance = BackupInstance {
        name,
        path: instance_dir.display().to_string(),
        created_at,
        age_hours,
        is_recent,
    };

    let mut artifacts = Vec::new();
    for (file_name, kind) in WELL_KNOWN_FILES {
        let file_path = instance_dir.join(file_name);
        if !file_path.is_file() {
            continue;
        }
        let metadata = fs::metadata(&file_path).map_err(|cause| ExporterError::MetadataError {
            path: file_path.clone(),
            cause,
        })?;
        artifacts.push(BackupArtifact {
            kind,
            size_bytes: metadata.len(),
        });
    }
    artifacts.push(BackupArtifact {
        kind: ArtifactKind::Total,
        size_bytes: get_directory_size(instance_dir)?,
    });

    debug!(
        "Scanned {} ({} artifacts including total)",
        instance.path,
        artifacts.len()
    );
    Ok(artifacts
        .into_iter()
        .map(|artifact| LocalBackupEntry {
            instance: instance.clone(),
            artifact,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::timestamp::parse_backup_name;
    use chrono::Duration;
    use tempfile::TempDir;

    fn make_backup(root: &Path, name: &str, files: &[(&str, usize)]) {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        for (file_name, size) in files {
            let path = dir.join(file_name);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(path, vec![b'x'; *size]).unwrap();
        }
    }

    fn kinds(entries: &[LocalBackupEntry]) -> Vec<(String, ArtifactKind)> {
        entries
            .iter()
            .map(|e| (e.instance.name.clone(), e.artifact.kind))
            .collect()
    }

    #[test]
    fn test_missing_root_is_empty() {
        let temp_dir = TempDir::new().unwrap();

        let entries = scan_local_backups(&temp_dir.path().join("missing"), Utc::now());

        assert!(entries.is_empty());
    }

    #[test]
    fn test_empty_root_is_empty() {
        let temp_dir = TempDir::new().unwrap();

        assert!(scan_local_backups(temp_dir.path(), Utc::now()).is_empty());
    }

    #[test]
    fn test_single_database_backup_at_25_hours() {
        let temp_dir = TempDir::new().unwrap();
        make_backup(temp_dir.path(), "backup-20240101_120000", &[("database.sql", 10)]);
        let now = parse_backup_name("backup-20240102_130000").unwrap();

        let entries = scan_local_backups(temp_dir.path(), now);

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].artifact.kind, ArtifactKind::Total);
        assert_eq!(entries[0].artifact.size_bytes, 10);
        assert_eq!(entries[1].artifact.kind, ArtifactKind::Database);
        assert_eq!(entries[1].artifact.size_bytes, 10);
        for entry in &entries {
            assert_eq!(entry.instance.age_hours, 25.0);
            assert!(!entry.instance.is_recent);
        }
    }

    #[test]
    fn test_total_includes_unknown_and_nested_files() {
        let temp_dir = TempDir::new().unwrap();
        make_backup(
            temp_dir.path(),
            "backup-20240101_120000",
            &[
                ("database.sql", 10),
                ("media.tar.gz", 100),
                ("backup-info.txt", 3),
                ("extra/notes.md", 7),
            ],
        );
        let now = parse_backup_name("backup-20240101_130000").unwrap();

        let entries = scan_local_backups(temp_dir.path(), now);
        let total = entries
            .iter()
            .find(|e| e.artifact.kind == ArtifactKind::Total)
            .unwrap();

        assert_eq!(entries.len(), 3);
        assert_eq!(total.artifact.size_bytes, 120);
        assert!(total.instance.is_recent);
    }

    #[test]
    fn test_sorted_by_time_then_kind_descending() {
        let temp_dir = TempDir::new().unwrap();
        make_backup(
            temp_dir.path(),
            "backup-20240101_120000",
            &[("database.sql", 1), ("static.tar.gz", 1)],
        );
        make_backup(
            temp_dir.path(),
            "backup-20240102_120000",
            &[
                ("data.tar.gz", 1),
                ("database.sql", 1),
                ("export.tar.gz", 1),
                ("media.tar.gz", 1),
            ],
        );
        let now = parse_backup_name("backup-20240103_000000").unwrap();

        let entries = scan_local_backups(temp_dir.path(), now);

        let newer = "backup-20240102_120000".to_string();
        let older = "backup-20240101_120000".to_string();
        assert_eq!(
            kinds(&entries),
            vec![
                (newer.clone(), ArtifactKind::Total),
                (newer.clone(), ArtifactKind::Media),
                (newer.clone(), ArtifactKind::Export),
                (newer.clone(), ArtifactKind::Database),
                (newer, ArtifactKind::Data),
                (older.clone(), ArtifactKind::Total),
                (older.clone(), ArtifactKind::Static),
                (older, ArtifactKind::Database),
            ]
        );
    }

    #[test]
    fn test_ignores_non_matching_entries() {
        let temp_dir = TempDir::new().unwrap();
        make_backup(temp_dir.path(), "old-20240101_120000", &[("database.sql", 1)]);
        fs::write(temp_dir.path().join("backup-20240101_120000.tar"), "x").unwrap();
        fs::write(temp_dir.path().join("cloud_backup_registry.json"), "[]").unwrap();

        assert!(scan_local_backups(temp_dir.path(), Utc::now()).is_empty());
    }

    #[test]
    fn test_well_known_name_that_is_a_directory_is_not_an_artifact() {
        let temp_dir = TempDir::new().unwrap();
        make_backup(temp_dir.path(), "backup-20240101_120000", &[("media.tar.gz/part1", 4)]);
        let now = parse_backup_name("backup-20240101_120000").unwrap();

        let entries = scan_local_backups(temp_dir.path(), now);

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].artifact.kind, ArtifactKind::Total);
        assert_eq!(entries[0].artifact.size_bytes, 4);
    }

    #[test]
    fn test_unparseable_name_uses_modification_time() {
        let temp_dir = TempDir::new().unwrap();
        make_backup(temp_dir.path(), "backup-manual", &[("database.sql", 2)]);
        let modified: DateTime<Utc> = fs::metadata(temp_dir.path().join("backup-manual"))
            .unwrap()
            .modified()
            .unwrap()
            .into();
        let now = modified + Duration::hours(2);

        let entries = scan_local_backups(temp_dir.path(), now);

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].instance.created_at, modified);
        assert_eq!(entries[0].instance.age_hours, 2.0);
        assert!(entries[0].instance.is_recent);
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_link_keeps_instance() {
        use std::os::unix::fs::symlink;

        let temp_dir = TempDir::new().unwrap();
        make_backup(temp_dir.path(), "backup-20240102_120000", &[("database.sql", 10)]);
        symlink(
            temp_dir.path().join("missing.log"),
            temp_dir.path().join("backup-20240102_120000/latest.log"),
        )
        .unwrap();
        let now = parse_backup_name("backup-20240102_120000").unwrap();

        let entries = scan_local_backups(temp_dir.path(), now);

        assert_eq!(
            kinds(&entries),
            vec![
                ("backup-20240102_120000".to_string(), ArtifactKind::Total),
                ("backup-20240102_120000".to_string(), ArtifactKind::Database),
            ]
        );
        assert_eq!(entries[0].artifact.size_bytes, 10);
        assert_eq!(entries[0].instance.age_hours, 0.0);
        assert!(entries[0].instance.is_recent);
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_instance_does_not_abort_scan() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        make_backup(temp_dir.path(), "backup-20240101_120000", &[("database.sql", 3)]);
        make_backup(
            temp_dir.path(),
            "backup-20240102_120000",
            &[("database.sql", 5), ("locked/part1", 1)],
        );
        let locked = temp_dir.path().join("backup-20240102_120000/locked");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        if fs::read_dir(&locked).is_ok() {
            // running with privileges that ignore permissions
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }
        let now = parse_backup_name("backup-20240103_000000").unwrap();

        let entries = scan_local_backups(temp_dir.path(), now);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        assert_eq!(entries.len(), 2);
        assert!(entries
            .iter()
            .all(|e| e.instance.name == "backup-20240101_120000"));
    }
}

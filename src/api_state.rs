use crate::models::config::Config;
use crate::models::snapshot::MetricsSnapshot;
use crate::service::cloud_source::CloudSource;
use crate::service::local_scan::scan_local_backups;
use chrono::{DateTime, Utc};
use log::{debug, error};
use std::path::PathBuf;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Root holding the `backup-*` directories
    backup_dir: Arc<PathBuf>,

    /// Cloud reader for this deployment, including its listing cache
    cloud: Arc<CloudSource>,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self {
            backup_dir: Arc::new(PathBuf::from(&config.backup_dir)),
            cloud: Arc::new(CloudSource::from_config(config)),
        }
    }

    /// Scan local and cloud backups and aggregate them as of `now`. Never fails.
    pub async fn collect_snapshot(&self, now: DateTime<Utc>) -> MetricsSnapshot {
        let backup_dir = self.backup_dir.clone();
        let local = tokio::task::spawn_blocking(move || scan_local_backups(&backup_dir, now))
            .await
            .unwrap_or_else(|e| {
                error!("Local backup scan task failed: {}", e);
                Vec::new()
            });

        let cloud = self.cloud.read(now).await;

        debug!(
            "Collected {} local entries and {} cloud records",
            local.len(),
            cloud.len()
        );
        MetricsSnapshot::aggregate(local, cloud)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::cloud_registry::REGISTRY_FILE_NAME;
    use crate::service::render::render;
    use crate::service::timestamp::parse_backup_name;
    use std::fs;
    use tempfile::TempDir;

    fn state_for(dir: &TempDir) -> AppState {
        AppState::new(&Config {
            backup_dir: dir.path().to_str().unwrap().to_string(),
            ..Config::default()
        })
    }

    #[test]
    fn test_unchanged_backups_render_identically() {
        let temp_dir = TempDir::new().unwrap();
        let backup = temp_dir.path().join("backup-20240101_120000");
        fs::create_dir(&backup).unwrap();
        fs::write(backup.join("database.sql"), vec![b'x'; 10]).unwrap();
        fs::write(backup.join("static.tar.gz"), vec![b'x'; 5]).unwrap();
        fs::write(
            temp_dir.path().join(REGISTRY_FILE_NAME),
            r#"[{"name": "backup-20240101_120000", "size_bytes": 15, "timestamp": 1704110400}]"#,
        )
        .unwrap();
        let state = state_for(&temp_dir);
        let now = parse_backup_name("backup-20240101_180000").unwrap();

        let (first, second) = rocket::execute(async {
            let first = state.collect_snapshot(now).await;
            let second = state.collect_snapshot(now).await;
            (first, second)
        });

        assert_eq!(first, second);
        assert_eq!(render(&first), render(&second));
        assert_eq!(first.local_count, 3);
        assert_eq!(first.local_total_size, 15);
        assert!(first.local_success);
        assert_eq!(first.cloud_count, 1);
    }

    #[test]
    fn test_scenario_exactly_25_hours_old() {
        let temp_dir = TempDir::new().unwrap();
        let backup = temp_dir.path().join("backup-20240101_120000");
        fs::create_dir(&backup).unwrap();
        fs::write(backup.join("database.sql"), vec![b'x'; 10]).unwrap();
        let state = state_for(&temp_dir);
        let now = parse_backup_name("backup-20240102_130000").unwrap();

        let snapshot = rocket::execute(state.collect_snapshot(now));
        let output = render(&snapshot);

        assert_eq!(snapshot.local_count, 2);
        assert_eq!(snapshot.latest_local_age_hours, Some(25.0));
        assert!(output.lines().any(|l| l == "backup_local_count 2"));
        assert!(output.lines().any(|l| l == "backup_latest_local_age_hours 25.0"));
        assert!(output.lines().any(|l| l == "backup_local_success 0"));
        assert!(output.contains(
            "backup_local_is_recent{name=\"backup-20240101_120000\",type=\"Database\"} 0"
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_fresh_backup_with_dangling_link_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let now = Utc::now();
        let name = format!(
            "backup-{}",
            now.with_timezone(&chrono::Local).format("%Y%m%d_%H%M%S")
        );
        let backup = temp_dir.path().join(&name);
        fs::create_dir(&backup).unwrap();
        fs::write(backup.join("database.sql"), vec![b'x'; 10]).unwrap();
        std::os::unix::fs::symlink(temp_dir.path().join("gone.log"), backup.join("latest.log"))
            .unwrap();
        let state = state_for(&temp_dir);

        let snapshot = rocket::execute(state.collect_snapshot(now));

        assert_eq!(snapshot.local_count, 2);
        assert_eq!(snapshot.local_total_size, 10);
        assert!(snapshot.latest_local_age_hours.is_some_and(|age| age < 1.0 / 3600.0));
        assert!(snapshot.local_success);
    }

    #[test]
    fn test_missing_backup_dir_is_empty_snapshot() {
        let state = AppState::new(&Config {
            backup_dir: "/this/does/not/exist".to_string(),
            ..Config::default()
        });

        let snapshot = rocket::execute(state.collect_snapshot(Utc::now()));

        assert_eq!(snapshot, MetricsSnapshot::aggregate(Vec::new(), Vec::new()));
    }
}

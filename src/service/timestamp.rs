use crate::models::error::{ExporterError, Result};
use chrono::{DateTime, Local, LocalResult, NaiveDateTime, TimeDelta, TimeZone, Utc};
use log::{debug, warn};
use std::fs;
use std::path::Path;

/// Prefix of every backup directory name.
pub const BACKUP_PREFIX: &str = "backup-";

/// Layout of the timestamp following the prefix, e.g. `20240101_120000`.
pub const BACKUP_TIME_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Parse the creation time out of a `backup-YYYYMMDD_HHMMSS` name.
///
/// The backup script stamps names with the host's local time.
pub fn parse_backup_name(name: &str) -> std::result::Result<DateTime<Utc>, String> {
    let stamp = name
        .strip_prefix(BACKUP_PREFIX)
        .ok_or_else(|| format!("name does not start with '{}'", BACKUP_PREFIX))?;

    let naive = NaiveDateTime::parse_from_str(stamp, BACKUP_TIME_FORMAT)
        .map_err(|e| format!("'{}' does not match {}: {}", stamp, BACKUP_TIME_FORMAT, e))?;

    resolve_local_time(&naive, |naive| {
        Local
            .from_local_datetime(naive)
            .map(|local| local.with_timezone(&Utc))
    })
    .ok_or_else(|| format!("'{}' does not exist in the local time zone", stamp))
}

/// Earliest instant for a wall-clock time. A time skipped by a DST
/// spring-forward is read one hour later, where the clock resumed.
fn resolve_local_time<F>(naive: &NaiveDateTime, to_utc: F) -> Option<DateTime<Utc>>
where
    F: Fn(&NaiveDateTime) -> LocalResult<DateTime<Utc>>,
{
    to_utc(naive).earliest().or_else(|| {
        let shifted = *naive + TimeDelta::hours(1);
        debug!("{} falls in a DST gap, using {}", naive, shifted);
        to_utc(&shifted).earliest()
    })
}

/// Creation time of a backup directory: from its name, else its modification time.
///
/// Only fails when the name is unparseable and the modification time can't be read.
pub fn resolve_created_at(name: &str, path: &Path) -> Result<DateTime<Utc>> {
    match parse_backup_name(name) {
        Ok(created_at) => {
            debug!("Extracted timestamp from name {}: {}", name, created_at);
            Ok(created_at)
        }
        Err(reason) => {
            warn!("Could not parse timestamp from name {}: {}", name, reason);
            modified_time(path)
        }
    }
}

fn modified_time(path: &Path) -> Result<DateTime<Utc>> {
    let modified = fs::metadata(path)
        .and_then(|metadata| metadata.modified())
        .map_err(|cause| ExporterError::MetadataError {
            path: path.to_path_buf(),
            cause,
        })?;
    Ok(DateTime::<Utc>::from(modified))
}

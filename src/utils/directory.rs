use crate::models::error::{ExporterError, Result};
use log::debug;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Immediate child directories of `dir` whose name starts with `prefix`, sorted by name.
pub fn get_prefixed_dirs(dir: &Path, prefix: &str) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|cause| ExporterError::DirectoryRead {
        path: dir.to_path_buf(),
        cause,
    })?;

    let mut dirs = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|cause| ExporterError::DirectoryRead {
            path: dir.to_path_buf(),
            cause,
        })?;
        let path = entry.path();
        let file_name = entry.file_name();
        let name = file_name.to_string_lossy();
        if !name.starts_with(prefix) {
            continue;
        }
        if file_name.to_str().is_none() {
            debug!("Directory name {} is not valid UTF-8", path.display());
        }
        if path.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}

/// Sum of the sizes of every file below `dir`, following symlinks.
///
/// Dangling links and link loops below `dir` are not files and are skipped;
/// any other error, or an error on `dir` itself, fails the walk.
pub fn get_directory_size(dir: &Path) -> Result<u64> {
    let mut total = 0;
    for entry in WalkDir::new(dir).follow_links(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(cause) if cause.depth() > 0 && is_unresolvable(&cause) => {
                debug!(
                    "Skipping unresolvable entry {}: {}",
                    cause.path().unwrap_or(dir).display(),
                    cause
                );
                continue;
            }
            Err(cause) => {
                return Err(ExporterError::DirectoryWalk {
                    path: dir.to_path_buf(),
                    cause,
                })
            }
        };
        if entry.file_type().is_dir() {
            continue;
        }
        let metadata = match entry.metadata() {
            Ok(metadata) => metadata,
            Err(cause) if is_unresolvable(&cause) => {
                debug!("Skipping vanished entry {}: {}", entry.path().display(), cause);
                continue;
            }
            Err(cause) => {
                return Err(ExporterError::DirectoryWalk {
                    path: entry.path().to_path_buf(),
                    cause,
                })
            }
        };
        if metadata.is_file() {
            total += metadata.len();
        }
    }
    Ok(total)
}

fn is_unresolvable(error: &walkdir::Error) -> bool {
    error.loop_ancestor().is_some()
        || error
            .io_error()
            .is_some_and(|e| e.kind() == io::ErrorKind::NotFound)
}

use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::fmt;

/// Kind of file inside a backup directory. `Total` stands for the whole directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    Database,
    Media,
    Data,
    Export,
    Static,
    Total,
}

/// Well-known files looked up in every backup directory.
pub const WELL_KNOWN_FILES: [(&str, ArtifactKind); 5] = [
    ("database.sql", ArtifactKind::Database),
    ("media.tar.gz", ArtifactKind::Media),
    ("data.tar.gz", ArtifactKind::Data),
    ("export.tar.gz", ArtifactKind::Export),
    ("static.tar.gz", ArtifactKind::Static),
];

impl ArtifactKind {
    pub fn label(&self) -> &'static str {
        match self {
            ArtifactKind::Database => "Database",
            ArtifactKind::Media => "Media",
            ArtifactKind::Data => "Data",
            ArtifactKind::Export => "Export",
            ArtifactKind::Static => "Static",
            ArtifactKind::Total => "Total",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// Kinds order by their label so ties on creation time sort the same way as the exposed `type` label.
impl Ord for ArtifactKind {
    fn cmp(&self, other: &Self) -> Ordering {
        self.label().cmp(other.label())
    }
}

impl PartialOrd for ArtifactKind {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// One backup directory, e.g. `backup-20240101_120000`.
#[derive(Debug, Clone, PartialEq)]
pub struct BackupInstance {
    pub name: String,
    pub path: String,
    pub created_at: DateTime<Utc>,
    pub age_hours: f64,
    pub is_recent: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackupArtifact {
    pub kind: ArtifactKind,
    pub size_bytes: u64,
}

/// One exposed local series: an artifact together with the instance it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalBackupEntry {
    pub instance: BackupInstance,
    pub artifact: BackupArtifact,
}

impl LocalBackupEntry {
    /// Descending by creation time, then by kind label.
    pub fn cmp_newest_first(&self, other: &Self) -> Ordering {
        other
            .instance
            .created_at
            .cmp(&self.instance.created_at)
            .then_with(|| other.artifact.kind.cmp(&self.artifact.kind))
    }
}

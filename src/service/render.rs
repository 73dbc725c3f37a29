use crate::models::snapshot::MetricsSnapshot;
use std::fmt::Display;

/// Value exposed for the latest age when there is no backup at all.
const MISSING_AGE: &str = "-1";

/// Accumulates the text exposition format line by line.
struct Exposition {
    lines: Vec<String>,
}

impl Exposition {
    fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// HELP and TYPE header; every family here is a gauge.
    fn family(&mut self, name: &str, help: &str) -> &mut Self {
        self.lines.push(format!("# HELP {} {}", name, help));
        self.lines.push(format!("# TYPE {} gauge", name));
        self
    }

    fn sample(&mut self, name: &str, labels: &[(&str, &str)], value: impl Display) -> &mut Self {
        if labels.is_empty() {
            self.lines.push(format!("{} {}", name, value));
        } else {
            let labels = labels
                .iter()
                .map(|(key, value)| format!("{}=\"{}\"", key, escape_label_value(value)))
                .collect::<Vec<_>>()
                .join(",");
            self.lines.push(format!("{}{{{}}} {}", name, labels, value));
        }
        self
    }

    fn finish(self) -> String {
        let mut output = self.lines.join("\n");
        output.push('\n');
        output
    }
}

/// Escape `\`, `"` and newlines so names from disk or the registry can't break the output.
pub fn escape_label_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Shortest round-trip form that always keeps a fractional part, e.g. `25.0`.
fn format_hours(hours: f64) -> String {
    format!("{:?}", hours)
}

fn format_latest(hours: Option<f64>) -> String {
    hours.map(format_hours).unwrap_or_else(|| MISSING_AGE.to_string())
}

fn flag(value: bool) -> u8 {
    u8::from(value)
}

/// Serialize a snapshot. The same snapshot always renders to the same bytes.
pub fn render(snapshot: &MetricsSnapshot) -> String {
    let mut out = Exposition::new();

    out.family("backup_local_count", "Number of local backups")
        .sample("backup_local_count", &[], snapshot.local_count);
    out.family(
        "backup_local_total_size_bytes",
        "Total size of all local backups in bytes",
    )
    .sample("backup_local_total_size_bytes", &[], snapshot.local_total_size);

    out.family("backup_local_size_bytes", "Size of a local backup artifact in bytes");
    for entry in &snapshot.local_entries {
        let labels = [
            ("name", entry.instance.name.as_str()),
            ("type", entry.artifact.kind.label()),
        ];
        out.sample("backup_local_size_bytes", &labels, entry.artifact.size_bytes);
    }
    out.family("backup_local_age_hours", "Age of a local backup in hours");
    for entry in &snapshot.local_entries {
        let labels = [
            ("name", entry.instance.name.as_str()),
            ("type", entry.artifact.kind.label()),
        ];
        out.sample(
            "backup_local_age_hours",
            &labels,
            format_hours(entry.instance.age_hours),
        );
    }
    out.family(
        "backup_local_timestamp",
        "Creation time of a local backup as a Unix timestamp",
    );
    for entry in &snapshot.local_entries {
        let labels = [
            ("name", entry.instance.name.as_str()),
            ("type", entry.artifact.kind.label()),
        ];
        out.sample(
            "backup_local_timestamp",
            &labels,
            entry.instance.created_at.timestamp(),
        );
    }
    out.family(
        "backup_local_is_recent",
        "1 if the local backup is younger than 25 hours, 0 otherwise",
    );
    for entry in &snapshot.local_entries {
        let labels = [
            ("name", entry.instance.name.as_str()),
            ("type", entry.artifact.kind.label()),
        ];
        out.sample("backup_local_is_recent", &labels, flag(entry.instance.is_recent));
    }

    out.family("backup_cloud_count", "Number of cloud backups")
        .sample("backup_cloud_count", &[], snapshot.cloud_count);
    out.family(
        "backup_cloud_total_size_bytes",
        "Total size of all cloud backups in bytes",
    )
    .sample("backup_cloud_total_size_bytes", &[], snapshot.cloud_total_size);

    out.family("backup_cloud_size_bytes", "Size of a cloud backup in bytes");
    for record in &snapshot.cloud_records {
        out.sample(
            "backup_cloud_size_bytes",
            &[("name", record.name.as_str())],
            record.size_bytes,
        );
    }
    out.family("backup_cloud_age_hours", "Age of a cloud backup in hours");
    for record in &snapshot.cloud_records {
        out.sample(
            "backup_cloud_age_hours",
            &[("name", record.name.as_str())],
            format_hours(record.age_hours),
        );
    }
    out.family(
        "backup_cloud_timestamp",
        "Creation time of a cloud backup as a Unix timestamp",
    );
    for record in &snapshot.cloud_records {
        if let Some(timestamp) = record.timestamp {
            out.sample(
                "backup_cloud_timestamp",
                &[("name", record.name.as_str())],
                timestamp,
            );
        }
    }
    out.family(
        "backup_cloud_is_recent",
        "1 if the cloud backup is younger than 25 hours, 0 otherwise",
    );
    for record in &snapshot.cloud_records {
        out.sample(
            "backup_cloud_is_recent",
            &[("name", record.name.as_str())],
            flag(record.is_recent),
        );
    }

    out.family(
        "backup_latest_local_age_hours",
        "Age of latest local backup in hours",
    )
    .sample(
        "backup_latest_local_age_hours",
        &[],
        format_latest(snapshot.latest_local_age_hours),
    );
    out.family(
        "backup_latest_cloud_age_hours",
        "Age of latest cloud backup in hours",
    )
    .sample(
        "backup_latest_cloud_age_hours",
        &[],
        format_latest(snapshot.latest_cloud_age_hours),
    );

    out.family(
        "backup_local_success",
        "1 if recent local backup exists, 0 otherwise",
    )
    .sample("backup_local_success", &[], flag(snapshot.local_success));
    out.family(
        "backup_cloud_success",
        "1 if recent cloud backup exists, 0 otherwise",
    )
    .sample("backup_cloud_success", &[], flag(snapshot.cloud_success));

    out.finish()
}

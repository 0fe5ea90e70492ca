//! Version snapshot naming.
//!
//! Snapshots live at `<domain>/<versions>/<file key>/<id>.html` where the id
//! is a UTC timestamp with `:` replaced so it is safe on every filesystem,
//! optionally followed by `-N` when two snapshots land in the same
//! millisecond.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H-%M-%S%.3fZ";
pub(crate) const SNAPSHOT_EXTENSION: &str = "html";

/// Immutable copy of a file's content at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionSnapshot {
    /// Identifier accepted by `read_version`/`restore_version`
    pub id: String,
    pub domain: String,
    pub file: String,
    pub created_at: DateTime<Utc>,
    pub size: u64,
}

/// Directory key for a domain-relative file: `blog/post.html` -> `blog__post.html`.
pub(crate) fn file_key(file: &str) -> String {
    file.replace('/', "__")
}

pub(crate) fn snapshot_id(at: DateTime<Utc>, sequence: u32) -> String {
    let stamp = at.format(TIMESTAMP_FORMAT).to_string();
    if sequence == 0 {
        stamp
    } else {
        format!("{}-{}", stamp, sequence)
    }
}

/// Parse an id back into its timestamp and collision sequence.
pub(crate) fn parse_snapshot_id(id: &str) -> Option<(DateTime<Utc>, u32)> {
    let z = id.rfind('Z')?;
    let (stamp, rest) = id.split_at(z + 1);
    let sequence = match rest.strip_prefix('-') {
        Some(n) => n.parse().ok()?,
        None if rest.is_empty() => 0,
        None => return None,
    };
    let naive = NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).ok()?;
    Some((naive.and_utc(), sequence))
}

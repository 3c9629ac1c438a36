//! VCS activity source. Parses the repository reflog from disk; no
//! subprocess is spawned.

use std::path::Path;
use std::sync::OnceLock;

use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Only reflog entries younger than this many seconds are reported.
const ACTIVITY_WINDOW_SECS: i64 = 3600;

/// At most this many entries are kept, newest first.
const MAX_ENTRIES: usize = 3;

/// Reflog line format: <old-sha> <new-sha> <name> <email> <timestamp> <tz>\t<message>
fn reflog_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[0-9a-f]+ [0-9a-f]+ .+ <.+> (\d+) [+-]\d{4}\t(.+)$")
            .expect("reflog regex is valid")
    })
}

/// One recent reflog entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VcsEntry {
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

/// Parse recent reflog entries from `<repo>/.git/logs/HEAD`.
///
/// Returns `None` when there is no repository, no reflog, or no entry
/// within the last hour.
pub fn gather_vcs(repo_path: &Path, now: DateTime<Utc>) -> Result<Option<Vec<VcsEntry>>> {
    let git_dir = repo_path.join(".git");
    if !git_dir.is_dir() {
        return Ok(None);
    }

    let reflog_path = git_dir.join("logs").join("HEAD");
    if !reflog_path.exists() {
        return Ok(None);
    }

    let text = std::fs::read_to_string(&reflog_path)?;
    let cutoff = now - Duration::seconds(ACTIVITY_WINDOW_SECS);

    let mut recent = Vec::new();
    for line in text.lines().rev() {
        let Some(caps) = reflog_re().captures(line) else {
            continue;
        };
        let epoch: i64 = caps[1].parse().unwrap_or(0);
        let Some(timestamp) = DateTime::from_timestamp(epoch, 0) else {
            continue;
        };
        if timestamp < cutoff {
            // Reflog is append-ordered; everything earlier is older still.
            break;
        }
        recent.push(VcsEntry {
            timestamp,
            message: caps[2].to_string(),
        });
        if recent.len() >= MAX_ENTRIES {
            break;
        }
    }

    Ok(if recent.is_empty() { None } else { Some(recent) })
}

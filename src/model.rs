use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// One boss attempt, ready for offset conversion. `pull_time` is always a
/// zero-padded 24-hour `HH:MM:SS` time-of-day; no date is stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullEntry {
    pub id: String,
    pub name: String,
    pub pull_time: String,
}

pub(crate) struct EntryIdGenerator {
    seed: u64,
    counter: AtomicU64,
}

impl EntryIdGenerator {
    pub(crate) fn new() -> Self {
        let timestamp_nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|duration| duration.as_nanos() as u64)
            .unwrap_or(0);

        Self {
            seed: timestamp_nanos ^ u64::from(std::process::id()),
            counter: AtomicU64::new(0),
        }
    }

    pub(crate) fn next_id(&self) -> String {
        let sequence = self.counter.fetch_add(1, Ordering::Relaxed);
        format!("{:x}-{sequence}", self.seed)
    }
}

pub(crate) fn assemble_pull_name(
    pull_number: &str,
    phase: Option<&str>,
    boss_health: Option<&str>,
    duration: Option<&str>,
) -> String {
    let mut name = format!("Pull {pull_number}");

    if let Some(phase) = phase {
        name.push_str(": ");
        name.push_str(phase);
    }

    if let Some(boss_health) = boss_health {
        name.push_str(" - ");
        name.push_str(boss_health);
        name.push('%');
    }

    if let Some(duration) = duration {
        name.push_str(" (");
        name.push_str(duration);
        name.push(')');
    }

    name
}

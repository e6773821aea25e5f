use chrono::NaiveTime;

use crate::clock::parse_clock;
use crate::model::PullEntry;

const SECONDS_PER_DAY: i64 = 86_400;

pub const INVALID_TIME_PLACEHOLDER: &str = "--:--";

/// Seconds from the reference time to the pull time, both read as instants on
/// the same calendar day. A negative difference always wraps forward across
/// midnight.
pub fn offset_seconds(reference: NaiveTime, pull: NaiveTime) -> i64 {
    let difference = pull.signed_duration_since(reference).num_seconds();
    if difference < 0 {
        difference + SECONDS_PER_DAY
    } else {
        difference
    }
}

/// Render a duration the way video descriptions expect chapter stamps:
/// `H:MM:SS` once there is a whole hour, `M:SS` below that.
pub fn format_video_timestamp(total_seconds: i64) -> String {
    let total_seconds = total_seconds.max(0);
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes:02}:{seconds:02}")
    }
}

/// One `<offset> <name>` line per entry, newline-joined, in list order.
/// A malformed pull time keeps its line as a placeholder instead of aborting
/// the batch.
pub fn render_chapter_lines(reference: NaiveTime, entries: &[PullEntry]) -> String {
    let mut lines = Vec::with_capacity(entries.len());

    for entry in entries {
        match parse_clock(&entry.pull_time) {
            Ok(pull_time) => {
                let offset = offset_seconds(reference, pull_time);
                lines.push(format!("{} {}", format_video_timestamp(offset), entry.name));
            }
            Err(parse_error) => {
                tracing::warn!(
                    pull_name = %entry.name,
                    pull_time = %entry.pull_time,
                    %parse_error,
                    "Skipping offset for pull with malformed time"
                );
                lines.push(format!("{INVALID_TIME_PLACEHOLDER} {}", entry.name));
            }
        }
    }

    lines.join("\n")
}

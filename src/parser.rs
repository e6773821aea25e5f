use lazy_static::lazy_static;
use regex::Regex;

use crate::clock::{compose_clock, to_24_hour};
use crate::error::{ConvertError, ConvertResult};
use crate::model::{assemble_pull_name, EntryIdGenerator, PullEntry};

const MAX_ADJACENT_NAME_LENGTH: usize = 50;
const MIN_CLEANED_NAME_LENGTH: usize = 2;

/// Which heuristic reads the pasted log text.
///
/// `Structured` expects the analytics site's pull table layout: pull number
/// and duration, boss health, and phase on their own lines, closed out by a
/// 12-hour wall time. `BareTime` is the older heuristic that accepts any line
/// carrying an embedded `H:MM:SS` time and names the pull from the adjacent
/// text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseStrategy {
    #[default]
    Structured,
    BareTime,
}

lazy_static! {
    static ref PULL_HEADER_PATTERN: Regex =
        Regex::new(r"^(\d+)\s+\((\d{1,2}):(\d{2})\)").expect("pull header pattern");
    static ref PHASE_PATTERN: Regex = Regex::new(r"\b([PI]\d+)\b").expect("phase pattern");
    static ref BOSS_HEALTH_PATTERN: Regex = Regex::new(r"^(\d+)%").expect("boss health pattern");
    static ref MERIDIEM_TIME_PATTERN: Regex =
        Regex::new(r"(?i)\b(\d{1,2}):(\d{2})\s*(am|pm)\b").expect("meridiem time pattern");
    static ref BARE_TIME_PATTERN: Regex =
        Regex::new(r"(?i)\b(\d{1,2}):(\d{2}):(\d{2})\b(?:\s*(am|pm)\b)?").expect("bare time pattern");
    static ref NOISE_PULL_PHRASE_PATTERN: Regex =
        Regex::new(r"(?i)\bpull\s*\d+\b").expect("pull phrase pattern");
    static ref NOISE_PARENTHETICAL_PATTERN: Regex =
        Regex::new(r"\([^)]*\)").expect("parenthetical pattern");
    static ref NOISE_STATUS_WORD_PATTERN: Regex =
        Regex::new(r"(?i)\b(wipe|kill|attempt)\b").expect("status word pattern");
}

/// Extract pull entries from pasted raid-log text.
///
/// Never panics on malformed input: blank input and zero matches come back as
/// error values, everything else is skipped line by line.
pub fn parse_log_text(text: &str, strategy: ParseStrategy) -> ConvertResult<Vec<PullEntry>> {
    if text.trim().is_empty() {
        return Err(ConvertError::EmptyInput);
    }

    let ids = EntryIdGenerator::new();
    let entries = match strategy {
        ParseStrategy::Structured => scan_structured(text, &ids),
        ParseStrategy::BareTime => scan_bare_time(text, &ids),
    };

    if entries.is_empty() {
        return Err(ConvertError::NoMatches);
    }

    Ok(entries)
}

#[derive(Debug, Default)]
struct RunningFields {
    pull_number: Option<String>,
    duration: Option<String>,
    phase: Option<String>,
    boss_health: Option<String>,
}

fn scan_structured(text: &str, ids: &EntryIdGenerator) -> Vec<PullEntry> {
    let mut entries = Vec::new();
    let mut fields = RunningFields::default();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        // A time line closes the pull using only fields from earlier lines.
        if fields.pull_number.is_some() {
            if let Some(pull_time) = match_meridiem_time(line) {
                if let Some(entry) = emit_structured_entry(&mut fields, pull_time, ids) {
                    entries.push(entry);
                }
                fields = RunningFields::default();
                continue;
            }
        }

        if let Some(captures) = PULL_HEADER_PATTERN.captures(line) {
            fields.pull_number = Some(captures[1].to_string());
            fields.duration = Some(format!("{}:{}", &captures[2], &captures[3]));
        }

        if let Some(captures) = PHASE_PATTERN.captures(line) {
            fields.phase = Some(captures[1].to_string());
        }

        if let Some(captures) = BOSS_HEALTH_PATTERN.captures(line) {
            fields.boss_health = Some(captures[1].to_string());
        }
    }

    entries
}

fn match_meridiem_time(line: &str) -> Option<String> {
    let captures = MERIDIEM_TIME_PATTERN.captures(line)?;
    let hour: u32 = captures[1].parse().ok()?;
    let minute: u32 = captures[2].parse().ok()?;
    let is_pm = captures[3].eq_ignore_ascii_case("pm");

    compose_clock(to_24_hour(hour, is_pm), minute, 0)
}

fn emit_structured_entry(
    fields: &mut RunningFields,
    pull_time: String,
    ids: &EntryIdGenerator,
) -> Option<PullEntry> {
    let pull_number = fields.pull_number.take()?;
    let name = assemble_pull_name(
        &pull_number,
        fields.phase.as_deref(),
        fields.boss_health.as_deref(),
        fields.duration.as_deref(),
    );

    Some(PullEntry {
        id: ids.next_id(),
        name,
        pull_time,
    })
}

fn scan_bare_time(text: &str, ids: &EntryIdGenerator) -> Vec<PullEntry> {
    let mut entries = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let Some(captures) = BARE_TIME_PATTERN.captures(line) else {
            continue;
        };

        let Some(pull_time) = bare_time_from_captures(&captures) else {
            continue;
        };

        let matched = match captures.get(0) {
            Some(whole) => whole.range(),
            None => continue,
        };
        let placeholder = format!("Pull {}", entries.len() + 1);
        let name = adjacent_pull_name(line, matched, &placeholder);

        entries.push(PullEntry {
            id: ids.next_id(),
            name,
            pull_time,
        });
    }

    entries
}

fn bare_time_from_captures(captures: &regex::Captures<'_>) -> Option<String> {
    let hour: u32 = captures[1].parse().ok()?;
    let minute: u32 = captures[2].parse().ok()?;
    let second: u32 = captures[3].parse().ok()?;

    let hour = match captures.get(4) {
        Some(meridiem) => to_24_hour(hour, meridiem.as_str().eq_ignore_ascii_case("pm")),
        None => hour,
    };

    compose_clock(hour, minute, second)
}

fn adjacent_pull_name(line: &str, matched: std::ops::Range<usize>, placeholder: &str) -> String {
    let before = line[..matched.start].trim();
    let after = line[matched.end..].trim();

    let candidate = if !before.is_empty() && before.len() <= MAX_ADJACENT_NAME_LENGTH {
        before
    } else if !after.is_empty() && after.len() <= MAX_ADJACENT_NAME_LENGTH {
        after
    } else {
        placeholder
    };

    cleaned_pull_name(candidate)
}

fn cleaned_pull_name(candidate: &str) -> String {
    let mut cleaned = NOISE_PULL_PHRASE_PATTERN
        .replace_all(candidate, "")
        .into_owned();
    cleaned = NOISE_PARENTHETICAL_PATTERN
        .replace_all(&cleaned, "")
        .into_owned();
    cleaned = NOISE_STATUS_WORD_PATTERN
        .replace_all(&cleaned, "")
        .into_owned();

    let cleaned = cleaned
        .split_whitespace()
        .collect::<Vec<&str>>()
        .join(" ");
    let cleaned = cleaned.trim_matches(&['-', ':', ',', '.'][..]).trim();

    if cleaned.chars().count() >= MIN_CLEANED_NAME_LENGTH {
        cleaned.to_string()
    } else {
        candidate.to_string()
    }
}

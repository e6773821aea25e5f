use chrono::NaiveTime;

use crate::error::{ConvertError, ConvertResult};

/// Strict parse of a zero-padded 24-hour `HH:MM:SS` clock string.
pub fn parse_clock(text: &str) -> ConvertResult<NaiveTime> {
    let parts: Vec<&str> = text.split(':').collect();
    if parts.len() != 3 {
        return Err(ConvertError::InvalidClock(text.to_string()));
    }

    let mut fields = [0u32; 3];
    for (index, part) in parts.iter().enumerate() {
        if part.len() != 2 || !part.chars().all(|character| character.is_ascii_digit()) {
            return Err(ConvertError::InvalidClock(text.to_string()));
        }
        fields[index] = part
            .parse()
            .map_err(|_| ConvertError::InvalidClock(text.to_string()))?;
    }

    NaiveTime::from_hms_opt(fields[0], fields[1], fields[2])
        .ok_or_else(|| ConvertError::InvalidClock(text.to_string()))
}

/// Canonicalize a free-form clock string into 24-hour `HH:MM:SS`.
///
/// A two-part value that is not a valid `HH:MM` is read as the evening-raid
/// shorthand: an hour below 12 is taken as PM. Shapes outside the 2/3-part
/// forms pass through unchanged so the caller's strict parse reports them.
pub fn normalize_clock_text(input: &str) -> ConvertResult<String> {
    let trimmed = input.trim();
    let parts: Vec<&str> = trimmed.split(':').collect();

    match parts.len() {
        3 => {
            parse_clock(trimmed)?;
            Ok(trimmed.to_string())
        }
        2 => Ok(normalize_two_part(trimmed, parts[0], parts[1])),
        _ => Ok(input.to_string()),
    }
}

fn normalize_two_part(original: &str, hour_text: &str, minute_text: &str) -> String {
    if is_strict_clock_field(hour_text, 23) && is_strict_clock_field(minute_text, 59) {
        return format!("{original}:00");
    }

    let Ok(hour) = hour_text.parse::<u32>() else {
        return original.to_string();
    };

    let evening_hour = if hour < 12 { hour + 12 } else { hour };
    format!("{evening_hour:02}:{minute_text}:00")
}

fn is_strict_clock_field(text: &str, maximum: u32) -> bool {
    text.len() == 2
        && text.chars().all(|character| character.is_ascii_digit())
        && text.parse::<u32>().map_or(false, |value| value <= maximum)
}

/// Convert a 12-hour clock hour to 24-hour form. PM adds 12 unless the hour
/// is already 12 or above; 12 AM maps to 0.
pub fn to_24_hour(hour: u32, is_pm: bool) -> u32 {
    if is_pm {
        if hour >= 12 {
            hour
        } else {
            hour + 12
        }
    } else if hour == 12 {
        0
    } else {
        hour
    }
}

pub(crate) fn compose_clock(hour: u32, minute: u32, second: u32) -> Option<String> {
    NaiveTime::from_hms_opt(hour, minute, second)?;
    Some(format!("{hour:02}:{minute:02}:{second:02}"))
}

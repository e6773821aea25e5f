use crate::clock::{normalize_clock_text, parse_clock};
use crate::error::{ConvertError, ConvertResult};
use crate::model::{EntryIdGenerator, PullEntry};
use crate::offset::render_chapter_lines;

/// In-memory pull list for one conversion session. Every mutation is a
/// discrete action processed to completion by the single caller; `generate`
/// recomputes from current state each time.
pub struct MarkerSession {
    entries: Vec<PullEntry>,
    ids: EntryIdGenerator,
}

impl MarkerSession {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            ids: EntryIdGenerator::new(),
        }
    }

    pub fn entries(&self) -> &[PullEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append a manually entered pull. The time goes through the same
    /// normalization as the reference time, then a strict parse gates it.
    /// Returns the new entry's id.
    pub fn add_manual(&mut self, name: &str, time_text: &str) -> ConvertResult<String> {
        let name = name.trim();
        if name.is_empty() || time_text.trim().is_empty() {
            return Err(ConvertError::EmptyInput);
        }

        let pull_time = normalize_clock_text(time_text)?;
        parse_clock(&pull_time)?;

        let id = self.ids.next_id();
        self.entries.push(PullEntry {
            id: id.clone(),
            name: name.to_string(),
            pull_time,
        });

        Ok(id)
    }

    /// Append parsed or fetched entries, keeping their order.
    pub fn import(&mut self, entries: Vec<PullEntry>) {
        self.entries.extend(entries);
    }

    /// Remove exactly the entry with the given id. Returns whether an entry
    /// was removed; the relative order of the rest is untouched.
    pub fn delete(&mut self, id: &str) -> bool {
        let Some(position) = self.entries.iter().position(|entry| entry.id == id) else {
            return false;
        };

        self.entries.remove(position);
        true
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Render the chapter text for the current entry list against the given
    /// recording start time.
    pub fn generate(&self, reference_text: &str) -> ConvertResult<String> {
        if reference_text.trim().is_empty() || self.entries.is_empty() {
            return Err(ConvertError::EmptyInput);
        }

        let normalized = normalize_clock_text(reference_text)?;
        let reference = parse_clock(&normalized)?;

        Ok(render_chapter_lines(reference, &self.entries))
    }
}

impl Default for MarkerSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::MarkerSession;
    use crate::error::ConvertError;
    use crate::parser::{parse_log_text, ParseStrategy};

    fn session_with_three_pulls() -> MarkerSession {
        let mut session = MarkerSession::new();
        session
            .add_manual("Pull 1", "19:46:00")
            .expect("Expected first manual add to succeed");
        session
            .add_manual("Pull 2", "19:52:00")
            .expect("Expected second manual add to succeed");
        session
            .add_manual("Pull 3", "20:01:00")
            .expect("Expected third manual add to succeed");
        session
    }

    #[test]
    fn manual_adds_normalize_their_times() {
        let mut session = MarkerSession::new();
        session
            .add_manual("Queen Ansurek", "7:46")
            .expect("Expected evening shorthand to be accepted");

        assert_eq!(session.entries()[0].pull_time, "19:46:00");
        assert_eq!(session.entries()[0].name, "Queen Ansurek");
    }

    #[test]
    fn manual_adds_reject_blank_fields_and_bad_times() {
        let mut session = MarkerSession::new();

        let error = session
            .add_manual("  ", "19:46:00")
            .expect_err("Expected a blank name to fail");
        assert!(matches!(error, ConvertError::EmptyInput));

        let error = session
            .add_manual("Pull 1", "late o'clock")
            .expect_err("Expected an unparseable time to fail");
        assert!(matches!(error, ConvertError::InvalidClock(_)));

        assert!(session.is_empty());
    }

    #[test]
    fn delete_removes_exactly_one_entry_and_keeps_order() {
        let mut session = session_with_three_pulls();
        let middle_id = session.entries()[1].id.clone();

        assert!(session.delete(&middle_id));
        assert_eq!(session.len(), 2);
        assert_eq!(session.entries()[0].name, "Pull 1");
        assert_eq!(session.entries()[1].name, "Pull 3");

        assert!(!session.delete(&middle_id));
        assert_eq!(session.len(), 2);
    }

    #[test]
    fn generate_renders_current_entries_only() {
        let mut session = session_with_three_pulls();

        let before = session
            .generate("19:30")
            .expect("Expected generation to succeed");
        assert_eq!(before.lines().count(), 3);

        let deleted_id = session.entries()[1].id.clone();
        session.delete(&deleted_id);

        let after = session
            .generate("19:30")
            .expect("Expected regeneration to succeed");
        assert_eq!(after, "16:00 Pull 1\n31:00 Pull 3");
    }

    #[test]
    fn generate_requires_a_reference_time_and_entries() {
        let session = session_with_three_pulls();
        let error = session
            .generate("   ")
            .expect_err("Expected a blank reference time to fail");
        assert!(matches!(error, ConvertError::EmptyInput));

        let empty_session = MarkerSession::new();
        let error = empty_session
            .generate("19:30")
            .expect_err("Expected an empty session to fail");
        assert!(matches!(error, ConvertError::EmptyInput));
    }

    #[test]
    fn imported_entries_join_manual_entries_in_order() {
        let mut session = MarkerSession::new();
        session
            .add_manual("Warmup", "19:35:00")
            .expect("Expected manual add to succeed");

        let parsed = parse_log_text("1  (3:24)\n48%\nP2\n7:46 PM\n", ParseStrategy::Structured)
            .expect("Expected parse to succeed");
        session.import(parsed);

        let rendered = session
            .generate("19:30")
            .expect("Expected generation to succeed");
        assert_eq!(rendered, "05:00 Warmup\n16:00 Pull 1: P2 - 48% (3:24)");
    }

    #[test]
    fn clear_empties_the_session() {
        let mut session = session_with_three_pulls();
        session.clear();
        assert!(session.is_empty());
    }
}

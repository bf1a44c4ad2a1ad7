//! Journal entry numbers (`JE-0001`, `JE-0002`, ...).

pub const ENTRY_NUMBER_PREFIX: &str = "JE";

/// Numeric sequence of an entry number: its last `-`-separated segment.
///
/// `"JE-0042"` → 42, `"JE-2025-003"` → 3, `"MANUAL"` → `None`.
pub fn entry_sequence(entry_number: &str) -> Option<u32> {
    let (_, tail) = entry_number.rsplit_once('-')?;
    tail.trim().parse().ok()
}

pub fn format_entry_number(sequence: u32) -> String {
    format!("{ENTRY_NUMBER_PREFIX}-{sequence:04}")
}

/// Next number after the highest sequence among `existing`.
///
/// Numbers without a parsable sequence are ignored; an empty ledger starts
/// at `JE-0001`.
pub fn next_entry_number<'a>(existing: impl IntoIterator<Item = &'a str>) -> String {
    let last = existing
        .into_iter()
        .filter_map(entry_sequence)
        .max()
        .unwrap_or(0);
    format_entry_number(last.saturating_add(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_ledger_starts_at_one() {
        assert_eq!(next_entry_number([]), "JE-0001");
    }

    #[test]
    fn continues_from_highest_sequence() {
        let existing = ["JE-0002", "JE-0010", "JE-0009"];
        assert_eq!(next_entry_number(existing), "JE-0011");
    }

    #[test]
    fn year_scoped_numbers_use_last_segment() {
        assert_eq!(entry_sequence("JE-2025-006"), Some(6));
        assert_eq!(next_entry_number(["JE-2025-006"]), "JE-0007");
    }

    #[test]
    fn unparsable_numbers_are_ignored() {
        assert_eq!(entry_sequence("OPENING"), None);
        assert_eq!(entry_sequence("JE-X"), None);
        assert_eq!(next_entry_number(["OPENING", "JE-0003"]), "JE-0004");
    }

    #[test]
    fn wide_sequences_are_not_truncated() {
        assert_eq!(format_entry_number(12345), "JE-12345");
    }
}

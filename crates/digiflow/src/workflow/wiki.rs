//! Process log ("wiki") entries.
//!
//! Each process carries a plain-text log of notable events. Entries are
//! newline-separated lines of the form `timestamp - kind - message`.

use chrono::{DateTime, Utc};

/// Category of a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WikiKind {
    Error,
    Info,
    User,
}

impl WikiKind {
    fn label(self) -> &'static str {
        match self {
            WikiKind::Error => "error",
            WikiKind::Info => "info",
            WikiKind::User => "user",
        }
    }
}

/// Appends an entry to an existing log, returning the new log text.
pub fn append_entry(
    existing: &str,
    kind: WikiKind,
    message: &str,
    timestamp: DateTime<Utc>,
) -> String {
    let line = format!(
        "{} - {} - {}",
        timestamp.format("%Y-%m-%d %H:%M:%S"),
        kind.label(),
        message
    );
    if existing.is_empty() {
        line
    } else {
        format!("{}\n{}", existing, line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0).unwrap()
    }

    #[test]
    fn test_append_to_empty_log() {
        let log = append_entry("", WikiKind::Info, "imported", ts());
        assert_eq!(log, "2026-03-14 09:30:00 - info - imported");
    }

    #[test]
    fn test_append_preserves_existing_lines() {
        let first = append_entry("", WikiKind::Error, "scan failed", ts());
        let second = append_entry(&first, WikiKind::User, "rescanned page 3", ts());

        let lines: Vec<&str> = second.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("error - scan failed"));
        assert!(lines[1].contains("user - rescanned page 3"));
    }
}

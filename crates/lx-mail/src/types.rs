//! Mailbox data types

use chrono::{DateTime, Duration, Utc};

/// A message fetched as a possible match, before relevance filtering
///
/// Ephemeral: produced by the session, consumed by the filter and the
/// extraction client, then discarded.
#[derive(Debug, Clone)]
pub struct CandidateMessage {
    /// Backend message id (IMAP sequence number)
    pub id: u32,
    pub subject: Option<String>,
    pub from: Option<String>,
    /// Raw `Date:` header text, kept verbatim for record metadata
    pub date: Option<String>,
    /// Resolved plain-text body
    pub body: String,
    /// Whether the backend reported the message as already read
    pub seen: bool,
}

/// Recency window for candidate search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchWindow {
    pub hours: i64,
}

impl SearchWindow {
    /// The default 24-hour window
    pub fn last_24_hours() -> Self {
        Self { hours: 24 }
    }

    pub fn hours(hours: i64) -> Self {
        Self { hours }
    }

    /// Oldest acceptable message timestamp
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::hours(self.hours)
    }

    /// Window start as `DD-MMM-YYYY`, the format IMAP `SINCE` expects
    pub fn since_date(&self, now: DateTime<Utc>) -> String {
        self.cutoff(now).format("%d-%b-%Y").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_since_date_format() {
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap();
        let window = SearchWindow::last_24_hours();
        assert_eq!(window.since_date(now), "14-Mar-2024");
    }

    #[test]
    fn test_cutoff() {
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap();
        let cutoff = SearchWindow::hours(48).cutoff(now);
        assert_eq!(cutoff, Utc.with_ymd_and_hms(2024, 3, 13, 12, 0, 0).unwrap());
    }
}

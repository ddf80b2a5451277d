//! Mailbox client seam
//!
//! Wire-level mailbox operations, kept narrow so the session logic can be
//! exercised against in-memory stubs. The IMAP adapter implements this
//! trait behind the `imap` feature.

use async_trait::async_trait;

use crate::error::Result;

/// One search strategy
///
/// Strategies form an ordered fallback chain: unread and date-bounded
/// first, unread-only second, everything last (with unread status and
/// recency checked per message afterwards).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchQuery {
    /// Unread messages since a `DD-MMM-YYYY` date (primary strategy)
    UnreadSince { since: String },
    /// Unread messages, no date bound
    Unread,
    /// Every message; the caller filters post-hoc
    All,
}

impl SearchQuery {
    /// Render as IMAP SEARCH criteria
    pub fn imap_criteria(&self) -> String {
        match self {
            SearchQuery::UnreadSince { since } => format!("(SINCE \"{since}\" UNSEEN)"),
            SearchQuery::Unread => "UNSEEN".to_string(),
            SearchQuery::All => "ALL".to_string(),
        }
    }
}

/// Wire-level mailbox operations
///
/// Implementations are not required to tolerate concurrent calls; the
/// session serializes everything against one connection.
#[async_trait]
pub trait MailboxClient: Send {
    /// Connect and authenticate with an XOAUTH2 bearer token
    async fn connect(&mut self, user: &str, token: &str) -> Result<()>;

    /// Message ids matching a search strategy
    async fn search(&mut self, query: &SearchQuery) -> Result<Vec<u32>>;

    /// Raw RFC822 bytes of one message
    async fn fetch(&mut self, id: u32) -> Result<Vec<u8>>;

    /// Whether the backend flags the message as already read
    async fn is_seen(&mut self, id: u32) -> Result<bool>;

    /// Flag a message as read (present but disabled in the pipeline)
    async fn mark_seen(&mut self, id: u32) -> Result<()>;

    /// Release the connection
    async fn close(&mut self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_imap_criteria() {
        let since = SearchQuery::UnreadSince {
            since: "14-Mar-2024".to_string(),
        };
        assert_eq!(since.imap_criteria(), "(SINCE \"14-Mar-2024\" UNSEEN)");
        assert_eq!(SearchQuery::Unread.imap_criteria(), "UNSEEN");
        assert_eq!(SearchQuery::All.imap_criteria(), "ALL");
    }
}

//! lx-mail: Mailbox access for lx-gateway
//!
//! Produces candidate messages ("unread, recent, primary") for the
//! extraction pipeline. Credentials and the wire protocol sit behind the
//! `CredentialProvider` and `MailboxClient` seams; the session layers the
//! authentication retry and the ordered search-strategy fallback on top.

pub mod client;
pub mod credentials;
pub mod error;
pub mod relevance;
pub mod session;
pub mod types;

#[cfg(feature = "imap")]
pub mod imap;

pub use client::{MailboxClient, SearchQuery};
pub use credentials::{
    xoauth2_string, BearerToken, CredentialProvider, EnvCredentials, TokenFileCredentials,
};
pub use error::{MailError, Result};
pub use relevance::{is_relevant, matched_keywords, TRUCKING_KEYWORDS};
pub use session::{plain_text_body, MailboxSession, SessionConfig};
pub use types::{CandidateMessage, SearchWindow};

#[cfg(feature = "imap")]
pub use imap::{ImapConfig, ImapMailbox};

//! Error types for lx-mail

use thiserror::Error;

/// lx-mail error type
///
/// `Auth` and `Search` are fatal to a run; `Message` and `Parse` cover a
/// single message and never abort the remaining batch.
#[derive(Error, Debug)]
pub enum MailError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Mailbox search failed: {0}")]
    Search(String),

    #[error("Message error: {0}")]
    Message(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Message parsing error: {0}")]
    Parse(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, MailError>;

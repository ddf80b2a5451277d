//! Mailbox session: authentication retry and search fallback
//!
//! Produces candidate messages "unread, within the window" without assuming
//! the backend supports one query syntax. Search strategies run strictly in
//! order and the first one returning any ids wins; authentication retries a
//! bounded number of times, re-fetching credentials between attempts so a
//! refreshed token is picked up.

use chrono::{DateTime, Utc};
use mail_parser::MessageParser;
use tracing::{debug, info, warn};

use crate::client::{MailboxClient, SearchQuery};
use crate::credentials::CredentialProvider;
use crate::error::{MailError, Result};
use crate::types::{CandidateMessage, SearchWindow};

/// Bounded attempts for the XOAUTH2 handshake
const MAX_AUTH_ATTEMPTS: usize = 3;

/// Session tuning
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Mailbox account address
    pub user: String,
    /// Cap on candidate messages per run
    pub max_candidates: usize,
    /// Recency window
    pub window: SearchWindow,
}

impl SessionConfig {
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            max_candidates: 10,
            window: SearchWindow::last_24_hours(),
        }
    }
}

/// An authenticated mailbox session
///
/// Obtained from [`MailboxSession::open`]; must be released with
/// [`MailboxSession::close`], which consumes the session so it cannot be
/// released twice.
pub struct MailboxSession<C: MailboxClient> {
    client: C,
    config: SessionConfig,
}

impl<C: MailboxClient> MailboxSession<C> {
    /// Authenticate against the mailbox, retrying with refreshed credentials
    ///
    /// Fails with [`MailError::Auth`] when no credentials are available or
    /// when all attempts are exhausted.
    pub async fn open(
        mut client: C,
        provider: &dyn CredentialProvider,
        config: SessionConfig,
    ) -> Result<Self> {
        let mut token = provider.get_token().await.ok_or_else(|| {
            MailError::Auth("no valid credentials found, please log in again".to_string())
        })?;

        let mut attempt = 0;
        loop {
            attempt += 1;
            debug!(attempt, user = %config.user, "authenticating mailbox session");

            match client.connect(&config.user, token.secret()).await {
                Ok(()) => {
                    info!("mailbox session established for {}", config.user);
                    return Ok(Self { client, config });
                }
                Err(e) if attempt < MAX_AUTH_ATTEMPTS => {
                    warn!("authentication attempt {attempt} failed: {e}");
                    token = provider.refresh().await.ok_or_else(|| {
                        MailError::Auth("failed to refresh credentials".to_string())
                    })?;
                }
                Err(e) => {
                    return Err(MailError::Auth(format!(
                        "authentication failed after {MAX_AUTH_ATTEMPTS} attempts: {e}"
                    )));
                }
            }
        }
    }

    /// Candidate messages via the ordered search fallback chain
    ///
    /// Later strategies only run when an earlier one returned nothing. Under
    /// the `All` strategy, messages already read or older than the window
    /// are discarded here instead of relying on the query. The candidate
    /// count is capped before any body is fetched.
    pub async fn list_candidates(&mut self) -> Result<Vec<CandidateMessage>> {
        let now = Utc::now();
        let strategies = [
            SearchQuery::UnreadSince {
                since: self.config.window.since_date(now),
            },
            SearchQuery::Unread,
            SearchQuery::All,
        ];
        let strategy_count = strategies.len();

        let mut ids = Vec::new();
        let mut used = None;
        let mut errors = 0;
        for query in strategies {
            match self.client.search(&query).await {
                Ok(found) if !found.is_empty() => {
                    info!("search {query:?} found {} messages", found.len());
                    ids = found;
                    used = Some(query);
                    break;
                }
                Ok(_) => {
                    debug!("search {query:?} found no messages, falling through");
                }
                Err(e) => {
                    warn!("search {query:?} failed: {e}");
                    errors += 1;
                }
            }
        }

        let Some(used) = used else {
            if errors == strategy_count {
                return Err(MailError::Search(
                    "all search strategies failed".to_string(),
                ));
            }
            info!("no messages found with any search strategy");
            return Ok(Vec::new());
        };

        if ids.len() > self.config.max_candidates {
            info!(
                "limiting to {} of {} messages found",
                self.config.max_candidates,
                ids.len()
            );
            ids.truncate(self.config.max_candidates);
        }

        // Only the catch-all strategy needs post-hoc unread/recency checks
        let post_hoc = used == SearchQuery::All;
        let cutoff = self.config.window.cutoff(now);

        let mut candidates = Vec::new();
        for id in ids {
            match self.candidate_if_eligible(id, post_hoc, cutoff).await {
                Ok(Some(message)) => candidates.push(message),
                Ok(None) => {}
                Err(e) => {
                    // a broken message must not abort the rest of the batch
                    warn!("error processing message {id}: {e}");
                }
            }
        }
        Ok(candidates)
    }

    /// Fetch one message and apply post-hoc filtering when required
    async fn candidate_if_eligible(
        &mut self,
        id: u32,
        post_hoc: bool,
        cutoff: DateTime<Utc>,
    ) -> Result<Option<CandidateMessage>> {
        let mut seen = false;
        if post_hoc {
            seen = self.client.is_seen(id).await?;
            if seen {
                debug!("skipping read message {id}");
                return Ok(None);
            }
        }

        let mut candidate = self.fetch_candidate(id).await?;
        candidate.seen = seen;

        if post_hoc {
            match candidate.date.as_deref().and_then(parse_rfc3339_utc) {
                Some(date) if date < cutoff => {
                    debug!("skipping old message {id} from {date}");
                    return Ok(None);
                }
                Some(_) => {}
                // an unparseable date is processed anyway
                None => debug!("message {id} has no parseable date, processing anyway"),
            }
        }

        Ok(Some(candidate))
    }

    /// Fetch one message and resolve headers plus plain-text body
    pub async fn fetch_candidate(&mut self, id: u32) -> Result<CandidateMessage> {
        debug!("fetching body for message {id}");
        let raw = self.client.fetch(id).await?;

        let message = MessageParser::default()
            .parse(&raw[..])
            .ok_or_else(|| MailError::Parse(format!("message {id} did not parse")))?;

        let subject = message.subject().map(|s| s.to_string());
        let from = message
            .from()
            .and_then(|addrs| addrs.first())
            .and_then(|addr| addr.address())
            .map(|s| s.to_string());
        let date = message.date().map(|d| d.to_rfc3339());

        let body = message
            .body_text(0)
            .map(|s| s.to_string())
            .ok_or_else(|| MailError::Parse(format!("message {id} has no text body")))?;

        Ok(CandidateMessage {
            id,
            subject,
            from,
            date,
            body,
            seen: false,
        })
    }

    /// Plain-text body of one message
    pub async fn fetch_body(&mut self, id: u32) -> Result<String> {
        Ok(self.fetch_candidate(id).await?.body)
    }

    /// Release the session
    ///
    /// Consumes the session, so release happens exactly once per open.
    pub async fn close(mut self) -> Result<()> {
        self.client.close().await
    }
}

/// Message date as UTC, if the header was usable
fn parse_rfc3339_utc(date: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(date)
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

/// First `text/plain` part of a raw message
///
/// Decoding is tolerant: a broken charset degrades to a lossy decode
/// instead of an error.
pub fn plain_text_body(raw: &[u8]) -> Option<String> {
    MessageParser::default()
        .parse(raw)
        .and_then(|message| message.body_text(0).map(|s| s.to_string()))
}

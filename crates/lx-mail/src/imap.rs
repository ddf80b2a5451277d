//! IMAP mailbox adapter
//!
//! TLS-wrapped IMAP with XOAUTH2 bearer authentication. Fetches use
//! `BODY.PEEK[]` so the adapter never sets `\Seen` as a side effect; read
//! status only changes through the explicit `mark_seen` operation.

use std::time::Duration;

use async_imap::types::{Fetch, Flag};
use async_imap::Session;
use async_native_tls::{TlsConnector, TlsStream};
use async_trait::async_trait;
use futures::StreamExt;
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

use crate::client::{MailboxClient, SearchQuery};
use crate::credentials::xoauth2_string;
use crate::error::{MailError, Result};

/// Wire settings for the IMAP adapter
#[derive(Debug, Clone)]
pub struct ImapConfig {
    pub host: String,
    pub port: u16,
    /// Per-operation timeout in seconds
    pub timeout_secs: u64,
}

impl ImapConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            timeout_secs: 30,
        }
    }
}

type ImapSession = Session<TlsStream<TcpStream>>;

/// IMAP-backed mailbox client
pub struct ImapMailbox {
    config: ImapConfig,
    session: Option<ImapSession>,
}

impl ImapMailbox {
    pub fn new(config: ImapConfig) -> Self {
        Self {
            config,
            session: None,
        }
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.timeout_secs)
    }

    fn session(&mut self) -> Result<&mut ImapSession> {
        self.session
            .as_mut()
            .ok_or_else(|| MailError::Connection("session not connected".to_string()))
    }

    async fn fetch_one(&mut self, id: u32, query: &str) -> Result<Vec<Fetch>> {
        let session = self.session()?;
        let stream = session
            .fetch(id.to_string(), query)
            .await
            .map_err(|e| MailError::Message(format!("FETCH {id} failed: {e}")))?;
        let items: Vec<Fetch> = stream
            .collect::<Vec<_>>()
            .await
            .into_iter()
            .filter_map(|r| r.ok())
            .collect();
        Ok(items)
    }
}

struct XOAuth2Authenticator {
    response: Vec<u8>,
    sent: bool,
}

impl XOAuth2Authenticator {
    fn new(response: Vec<u8>) -> Self {
        Self {
            response,
            sent: false,
        }
    }
}

impl async_imap::Authenticator for XOAuth2Authenticator {
    type Response = Vec<u8>;

    fn process(&mut self, _challenge: &[u8]) -> Self::Response {
        if !self.sent {
            self.sent = true;
            self.response.clone()
        } else {
            // the server sent an error challenge; an empty reply lets it
            // finish the handshake with its final NO/BAD
            Vec::new()
        }
    }
}

#[async_trait]
impl MailboxClient for ImapMailbox {
    async fn connect(&mut self, user: &str, token: &str) -> Result<()> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        info!("connecting to {addr}");

        let host = self.config.host.clone();
        let timeout = self.timeout();

        let tcp = tokio::time::timeout(timeout, TcpStream::connect(&addr))
            .await
            .map_err(|_| MailError::Connection(format!("TCP connect to {addr} timed out")))?
            .map_err(|e| MailError::Connection(format!("TCP connect to {addr} failed: {e}")))?;

        let tls = TlsConnector::new();
        let tls_stream = tokio::time::timeout(timeout, tls.connect(&host, tcp))
            .await
            .map_err(|_| MailError::Connection("TLS handshake timed out".to_string()))?
            .map_err(|e| MailError::Connection(format!("TLS handshake with {host} failed: {e}")))?;

        let mut client = async_imap::Client::new(tls_stream);

        // Consume the server greeting before AUTHENTICATE; the handshake
        // loop would otherwise read the greeting instead of the "+"
        // continuation.
        let _greeting = client
            .read_response()
            .await
            .transpose()
            .map_err(|e| MailError::Connection(format!("failed to read greeting: {e}")))?;

        debug!("authenticating with XOAUTH2 for {user}");
        let authenticator =
            XOAuth2Authenticator::new(xoauth2_string(user, token).into_bytes());
        let mut session = client
            .authenticate("XOAUTH2", authenticator)
            .await
            .map_err(|(e, _)| MailError::Auth(format!("XOAUTH2 auth failed for {user}: {e}")))?;

        session
            .select("INBOX")
            .await
            .map_err(|e| MailError::Connection(format!("SELECT INBOX failed: {e}")))?;

        info!("IMAP session established for {user}");
        self.session = Some(session);
        Ok(())
    }

    async fn search(&mut self, query: &SearchQuery) -> Result<Vec<u32>> {
        let criteria = query.imap_criteria();
        debug!("searching with criteria: {criteria}");

        let timeout = self.timeout();
        let session = self.session()?;
        let found = tokio::time::timeout(timeout, session.search(&criteria))
            .await
            .map_err(|_| MailError::Search(format!("SEARCH {criteria} timed out")))?
            .map_err(|e| MailError::Search(format!("SEARCH {criteria} failed: {e}")))?;

        // ascending sequence numbers keep processing in arrival order
        let mut ids: Vec<u32> = found.into_iter().collect();
        ids.sort_unstable();
        Ok(ids)
    }

    async fn fetch(&mut self, id: u32) -> Result<Vec<u8>> {
        let timeout = self.timeout();
        let items = tokio::time::timeout(timeout, self.fetch_one(id, "(BODY.PEEK[])"))
            .await
            .map_err(|_| MailError::Message(format!("FETCH {id} timed out")))??;

        items
            .iter()
            .find_map(|fetch| fetch.body().map(|body| body.to_vec()))
            .ok_or_else(|| MailError::Message(format!("message {id} returned no body")))
    }

    async fn is_seen(&mut self, id: u32) -> Result<bool> {
        let timeout = self.timeout();
        let items = tokio::time::timeout(timeout, self.fetch_one(id, "(FLAGS)"))
            .await
            .map_err(|_| MailError::Message(format!("FLAGS fetch for {id} timed out")))??;

        Ok(items
            .iter()
            .any(|fetch| fetch.flags().any(|flag| matches!(flag, Flag::Seen))))
    }

    async fn mark_seen(&mut self, id: u32) -> Result<()> {
        let session = self.session()?;
        let stream = session
            .store(id.to_string(), "+FLAGS (\\Seen)")
            .await
            .map_err(|e| MailError::Message(format!("STORE {id} failed: {e}")))?;
        let _ = stream.collect::<Vec<_>>().await;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(mut session) = self.session.take() {
            if let Err(e) = session.logout().await {
                warn!("IMAP logout failed: {e}");
            }
        }
        Ok(())
    }
}

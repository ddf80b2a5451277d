//! Credential provider seam
//!
//! Token issuance and the OAuth consent flow live outside this repository.
//! The session only needs a bearer token, and a way to re-acquire one
//! between authentication attempts so an out-of-band refresh is picked up.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

/// Bearer access token for XOAUTH2
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token value
    pub fn secret(&self) -> &str {
        &self.0
    }
}

/// Supplies bearer tokens for the mailbox handshake
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Current token, if any
    async fn get_token(&self) -> Option<BearerToken>;

    /// Re-acquire after an auth failure
    ///
    /// Called between retry attempts; implementations should return the
    /// freshest token available rather than a cached copy.
    async fn refresh(&self) -> Option<BearerToken>;
}

#[async_trait]
impl CredentialProvider for Box<dyn CredentialProvider> {
    async fn get_token(&self) -> Option<BearerToken> {
        (**self).get_token().await
    }

    async fn refresh(&self) -> Option<BearerToken> {
        (**self).refresh().await
    }
}

/// Reads the token from an environment variable
///
/// Defaults to `MAIL_ACCESS_TOKEN`.
pub struct EnvCredentials {
    var: String,
}

impl EnvCredentials {
    pub fn new() -> Self {
        Self::from_var("MAIL_ACCESS_TOKEN")
    }

    pub fn from_var(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl Default for EnvCredentials {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialProvider for EnvCredentials {
    async fn get_token(&self) -> Option<BearerToken> {
        match std::env::var(&self.var) {
            Ok(token) if !token.is_empty() => Some(BearerToken::new(token)),
            _ => {
                debug!("no token in ${}", self.var);
                None
            }
        }
    }

    async fn refresh(&self) -> Option<BearerToken> {
        self.get_token().await
    }
}

#[derive(Debug, Deserialize)]
struct TokenFile {
    token: String,
}

/// Reads `{"token": "..."}` from a JSON file on every call
///
/// The file is rewritten by the external OAuth flow whenever it refreshes
/// the token, so re-reading between attempts observes the new token.
pub struct TokenFileCredentials {
    path: PathBuf,
}

impl TokenFileCredentials {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn read_token(&self) -> Option<BearerToken> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("failed to read token file {}: {e}", self.path.display());
                return None;
            }
        };
        match serde_json::from_slice::<TokenFile>(&bytes) {
            Ok(file) if !file.token.is_empty() => Some(BearerToken::new(file.token)),
            Ok(_) => None,
            Err(e) => {
                warn!("token file {} is not valid JSON: {e}", self.path.display());
                None
            }
        }
    }
}

#[async_trait]
impl CredentialProvider for TokenFileCredentials {
    async fn get_token(&self) -> Option<BearerToken> {
        self.read_token().await
    }

    async fn refresh(&self) -> Option<BearerToken> {
        self.read_token().await
    }
}

/// XOAUTH2 initial client response
///
/// `user=<addr>\x01auth=Bearer <token>\x01\x01`, handed to the backend's
/// SASL handshake (the transport applies the base64 framing).
pub fn xoauth2_string(user: &str, token: &str) -> String {
    format!("user={user}\x01auth=Bearer {token}\x01\x01")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xoauth2_string() {
        let s = xoauth2_string("me@example.com", "tok123");
        assert_eq!(s, "user=me@example.com\x01auth=Bearer tok123\x01\x01");
    }

    #[tokio::test]
    async fn test_env_credentials_missing() {
        let provider = EnvCredentials::from_var("LX_TEST_NO_SUCH_TOKEN_VAR");
        assert!(provider.get_token().await.is_none());
    }

    #[tokio::test]
    async fn test_env_credentials_present() {
        // SAFETY: ユニークな変数名なので他のテストと競合しない
        unsafe { std::env::set_var("LX_TEST_TOKEN_VAR", "abc") };
        let provider = EnvCredentials::from_var("LX_TEST_TOKEN_VAR");
        assert_eq!(provider.get_token().await.unwrap().secret(), "abc");
    }

    #[tokio::test]
    async fn test_token_file_reread_observes_refresh() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        tokio::fs::write(&path, r#"{"token":"first"}"#).await.unwrap();

        let provider = TokenFileCredentials::new(&path);
        assert_eq!(provider.get_token().await.unwrap().secret(), "first");

        tokio::fs::write(&path, r#"{"token":"second"}"#).await.unwrap();
        assert_eq!(provider.refresh().await.unwrap().secret(), "second");
    }

    #[tokio::test]
    async fn test_token_file_missing_or_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let provider = TokenFileCredentials::new(dir.path().join("absent.json"));
        assert!(provider.get_token().await.is_none());

        let path = dir.path().join("bad.json");
        tokio::fs::write(&path, "not json").await.unwrap();
        let provider = TokenFileCredentials::new(&path);
        assert!(provider.get_token().await.is_none());
    }
}

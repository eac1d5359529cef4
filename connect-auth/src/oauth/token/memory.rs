//! In-process token store.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tracing::debug;
use dashmap::DashMap;
use secrecy::{ExposeSecret, SecretString};

use super::{encryption, Storage, TokenSet};
use crate::error::Error;

/// A token set as held by [`MemoryStorage`]: every token sealed when a key is configured.
#[derive(Debug, Clone)]
struct StoredTokens {
    access_token: String,
    refresh_token: Option<String>,
    id_token: Option<String>,
    expires_at: Option<DateTime<Utc>>,
    token_type: String,
    scopes: Vec<String>,
    last_used: DateTime<Utc>,
}

impl StoredTokens {
    /// Nothing can use this entry again: its access token has expired, or no request
    /// has read it for longer than `retention`.
    fn is_stale(&self, retention: Duration, now: DateTime<Utc>) -> bool {
        let expired = self.expires_at.is_some_and(|expires| expires <= now);
        expired || self.last_used + retention <= now
    }
}

/// [`Storage`] backed by a concurrent map, lost on restart.
///
/// With an encryption key every token is sealed with AES-256-GCM before it is kept.
/// Entries whose session can no longer use them are dropped whenever a token set is put,
/// so sessions that simply expire do not leave their tokens behind.
pub struct MemoryStorage {
    entries: DashMap<String, StoredTokens>,
    encryption_key: Option<SecretString>,
    retention: Duration,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            encryption_key: None,
            retention: Duration::days(1),
        }
    }

    /// How long an unread entry is kept. Match this to the session's inactivity expiry.
    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    /// Seal tokens with the given 64-hex-character key.
    pub fn with_encryption_key(mut self, key_hex: SecretString) -> Self {
        self.encryption_key = Some(key_hex);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop entries with an expired access token or left unread past the retention.
    /// Returns how many were removed.
    pub fn cleanup_expired(&self) -> usize {
        let before = self.entries.len();
        let now = Utc::now();
        self.entries
            .retain(|_, stored| !stored.is_stale(self.retention, now));
        before.saturating_sub(self.entries.len())
    }

    fn seal(&self, value: &str) -> Result<String, Error> {
        match &self.encryption_key {
            Some(key) => encryption::encrypt(value, key.expose_secret()),
            None => Ok(value.to_string()),
        }
    }

    fn open(&self, value: &str) -> Result<SecretString, Error> {
        match &self.encryption_key {
            Some(key) => encryption::decrypt(value, key.expose_secret()).map(SecretString::new),
            None => Ok(SecretString::new(value.to_string())),
        }
    }

    fn seal_optional(&self, value: Option<&SecretString>) -> Result<Option<String>, Error> {
        value.map(|v| self.seal(v.expose_secret())).transpose()
    }

    fn open_optional(&self, value: Option<&str>) -> Result<Option<SecretString>, Error> {
        value.map(|v| self.open(v)).transpose()
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn get(&self, session_id: &str) -> Result<Option<TokenSet>, Error> {
        let stored = match self.entries.get_mut(session_id) {
            Some(mut entry) => {
                entry.last_used = Utc::now();
                entry.value().clone()
            }
            None => return Ok(None),
        };

        Ok(Some(TokenSet {
            access_token: self.open(&stored.access_token)?,
            refresh_token: self.open_optional(stored.refresh_token.as_deref())?,
            id_token: self.open_optional(stored.id_token.as_deref())?,
            expires_at: stored.expires_at,
            token_type: stored.token_type,
            scopes: stored.scopes,
        }))
    }

    async fn put(&self, session_id: &str, tokens: TokenSet) -> Result<(), Error> {
        let stored = StoredTokens {
            access_token: self.seal(tokens.access_token.expose_secret())?,
            refresh_token: self.seal_optional(tokens.refresh_token.as_ref())?,
            id_token: self.seal_optional(tokens.id_token.as_ref())?,
            expires_at: tokens.expires_at,
            token_type: tokens.token_type,
            scopes: tokens.scopes,
            last_used: Utc::now(),
        };

        let evicted = self.cleanup_expired();
        if evicted > 0 {
            debug!("Dropped {} stale token sets", evicted);
        }
        self.entries.insert(session_id.to_string(), stored);
        Ok(())
    }

    async fn delete(&self, session_id: &str) -> Result<(), Error> {
        self.entries.remove(session_id);
        Ok(())
    }
}

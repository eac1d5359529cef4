//! Token manager: the only path from a session to a usable token set.

use tracing::debug;

use super::{Storage, TokenSet};
use crate::error::{token_error, Error, TokenErrorKind};

/// Hands out token sets only while they are usable.
///
/// The manager never refreshes. A missing, empty or expired access token is reported as
/// `NotFound` or `Expired` so the caller can send the user through authorization again.
pub struct Manager<S: Storage> {
    storage: S,
}

impl<S: Storage> Manager<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Get the session's token set if its access token can be used right now.
    pub async fn valid_tokens(&self, session_id: &str) -> Result<TokenSet, Error> {
        let tokens = self
            .storage
            .get(session_id)
            .await?
            .ok_or_else(|| token_error(TokenErrorKind::NotFound, "No tokens stored for session"))?;

        if !tokens.is_usable() {
            debug!("Stored access token for session is empty or expired");
            return Err(token_error(
                TokenErrorKind::Expired,
                "Access token is empty or expired",
            ));
        }

        Ok(tokens)
    }

    /// Store tokens for a session.
    pub async fn store_tokens(&self, session_id: &str, tokens: TokenSet) -> Result<(), Error> {
        self.storage.put(session_id, tokens).await
    }

    /// Delete tokens for a session.
    pub async fn delete_tokens(&self, session_id: &str) -> Result<(), Error> {
        self.storage.delete(session_id).await
    }

    /// Get stored tokens for a session (may be expired).
    pub async fn get_tokens(&self, session_id: &str) -> Result<Option<TokenSet>, Error> {
        self.storage.get(session_id).await
    }
}

//! Token store interface.

use async_trait::async_trait;

use super::TokenSet;
use crate::error::Error;

/// Persistence for the token set of each authenticated session.
///
/// The store is the only shared state between concurrent requests of one session.
/// Nothing in this crate refreshes tokens or locks around them, so an implementation
/// that adds refresh must serialize concurrent refresh attempts for the same session
/// itself. Implementations should seal tokens at rest.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Retrieve the token set for a session, if one was stored.
    async fn get(&self, session_id: &str) -> Result<Option<TokenSet>, Error>;

    /// Store (or replace) the token set for a session.
    async fn put(&self, session_id: &str, tokens: TokenSet) -> Result<(), Error>;

    /// Forget the token set for a session.
    async fn delete(&self, session_id: &str) -> Result<(), Error>;
}

//! OAuth provider trait and types.

use async_trait::async_trait;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;

use super::token::TokenSet;
use super::PkceChallenge;
use crate::error::Error;

/// Known OAuth providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    Intuit,
}

impl ProviderKind {
    /// Get the provider identifier string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Intuit => "intuit",
        }
    }
}

/// Where to send the user agent to start (or resume) authorization.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    /// Authorization URL to redirect the user to.
    pub url: String,
    /// CSRF state parameter carried on the URL.
    pub state: String,
}

/// User-info payload exactly as the provider returned it.
///
/// The schema belongs to the provider, so it is kept as an open field map.
pub type UserInfo = Map<String, Value>;

/// An OpenID Connect / OAuth 2.0 provider reached over the backchannel.
///
/// Network operations take the inbound request's cancellation token and abort when it fires.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Get the provider kind.
    fn provider(&self) -> ProviderKind;

    /// The issuer identities created from this provider are tagged with.
    fn issuer(&self) -> &str;

    /// Build the authorization URL carrying `state` and, when given, the PKCE challenge.
    fn authorization_url(
        &self,
        state: &str,
        pkce_challenge: Option<&PkceChallenge>,
    ) -> AuthorizationRequest;

    /// Exchange an authorization code for a token set.
    async fn exchange_code(
        &self,
        code: &str,
        pkce_verifier: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<TokenSet, Error>;

    /// Fetch the user-info document with a bearer access token.
    async fn get_user_info(
        &self,
        access_token: &SecretString,
        cancel: &CancellationToken,
    ) -> Result<UserInfo, Error>;
}

//! OAuth token types.

use chrono::{DateTime, Duration, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::error::{oauth_error, Error, OAuthErrorKind};

/// Access tokens are treated as expired this long before the provider's deadline.
const EXPIRY_SKEW_SECONDS: i64 = 60;

/// The tokens issued for one authenticated session.
#[derive(Debug, Clone)]
pub struct TokenSet {
    /// Bearer token for API requests.
    pub access_token: SecretString,
    /// Refresh token. Stored, never used by this crate.
    pub refresh_token: Option<SecretString>,
    /// OpenID Connect ID token.
    pub id_token: Option<SecretString>,
    /// When the access token expires.
    pub expires_at: Option<DateTime<Utc>>,
    /// Token type (usually "bearer").
    pub token_type: String,
    /// Granted scopes.
    pub scopes: Vec<String>,
}

impl TokenSet {
    /// Check if the access token is expired or expires within the skew window.
    pub fn is_expired(&self) -> bool {
        self.expires_at
            .map(|expires| expires <= Utc::now() + Duration::seconds(EXPIRY_SKEW_SECONDS))
            .unwrap_or(false)
    }

    /// A token set may be used for a downstream call only if its access token is
    /// non-empty and unexpired.
    pub fn is_usable(&self) -> bool {
        !self.access_token.expose_secret().is_empty() && !self.is_expired()
    }

    /// Get the remaining time until expiration.
    pub fn time_until_expiry(&self) -> Option<Duration> {
        self.expires_at.map(|expires| expires - Utc::now())
    }
}

/// Token endpoint response body (RFC 6749 section 5.1 plus the OIDC `id_token`).
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub id_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub scope: Option<String>,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl TokenResponse {
    /// Convert into a [`TokenSet`], anchoring `expires_in` at `issued_at`.
    pub fn into_token_set(self, issued_at: DateTime<Utc>) -> Result<TokenSet, Error> {
        if self.access_token.is_empty() {
            return Err(oauth_error(
                OAuthErrorKind::InvalidResponse,
                "Token endpoint returned an empty access token",
            ));
        }

        Ok(TokenSet {
            access_token: SecretString::new(self.access_token),
            refresh_token: self.refresh_token.map(SecretString::new),
            id_token: self.id_token.map(SecretString::new),
            expires_at: self
                .expires_in
                .map(|seconds| issued_at + Duration::seconds(seconds)),
            token_type: self.token_type,
            scopes: self
                .scope
                .map(|scope| scope.split_whitespace().map(str::to_string).collect())
                .unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_set(access: &str, expires_at: Option<DateTime<Utc>>) -> TokenSet {
        TokenSet {
            access_token: SecretString::new(access.to_string()),
            refresh_token: None,
            id_token: None,
            expires_at,
            token_type: "bearer".to_string(),
            scopes: vec![],
        }
    }

    #[test]
    fn test_token_not_expired() {
        let tokens = token_set("T1", Some(Utc::now() + Duration::hours(1)));
        assert!(!tokens.is_expired());
        assert!(tokens.is_usable());
    }

    #[test]
    fn test_token_expired() {
        let tokens = token_set("T1", Some(Utc::now() - Duration::hours(1)));
        assert!(tokens.is_expired());
        assert!(!tokens.is_usable());
    }

    #[test]
    fn test_token_expiring_within_skew() {
        let tokens = token_set("T1", Some(Utc::now() + Duration::seconds(30)));
        assert!(tokens.is_expired());
    }

    #[test]
    fn test_empty_access_token_is_not_usable() {
        let tokens = token_set("", None);
        assert!(!tokens.is_expired());
        assert!(!tokens.is_usable());
    }

    #[test]
    fn test_token_response_conversion() {
        let response: TokenResponse = serde_json::from_str(
            r#"{"access_token":"T1","refresh_token":"R1","id_token":"I1",
                "expires_in":3600,"token_type":"bearer","x_refresh_token_expires_in":8726400}"#,
        )
        .unwrap();
        let issued_at = Utc::now();
        let tokens = response.into_token_set(issued_at).unwrap();

        assert_eq!(tokens.access_token.expose_secret(), "T1");
        assert_eq!(tokens.refresh_token.unwrap().expose_secret(), "R1");
        assert_eq!(tokens.id_token.unwrap().expose_secret(), "I1");
        assert_eq!(tokens.expires_at, Some(issued_at + Duration::seconds(3600)));
    }

    #[test]
    fn test_token_response_with_empty_access_token_is_rejected() {
        let response: TokenResponse = serde_json::from_str(r#"{"access_token":""}"#).unwrap();
        assert!(response.into_token_set(Utc::now()).is_err());
    }
}

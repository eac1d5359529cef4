//! CSRF state management for the authorization redirect.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use rand::Rng;

use crate::error::{oauth_error, Error, OAuthErrorKind};

/// Data remembered between the challenge and the provider's redirect back.
#[derive(Debug, Clone)]
pub struct StateData {
    /// PKCE verifier if PKCE was used.
    pub pkce_verifier: Option<String>,
    /// Local path to send the user back to once sign-in completes.
    pub return_to: String,
    /// When this state expires.
    pub expires_at: DateTime<Utc>,
}

/// Issues and consumes single-use state tokens.
#[derive(Clone)]
pub struct StateManager {
    states: Arc<DashMap<String, StateData>>,
    ttl: Duration,
}

impl StateManager {
    /// Create a new state manager with default TTL of 10 minutes.
    pub fn new() -> Self {
        Self::with_ttl(Duration::minutes(10))
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            states: Arc::new(DashMap::new()),
            ttl,
        }
    }

    /// Generate a new state token and remember what the callback will need.
    pub fn generate(&self, pkce_verifier: Option<String>, return_to: &str) -> String {
        let state = Self::generate_token();
        self.states.insert(
            state.clone(),
            StateData {
                pkce_verifier,
                return_to: return_to.to_string(),
                expires_at: Utc::now() + self.ttl,
            },
        );
        state
    }

    /// Validate and consume a state token.
    ///
    /// A state can be redeemed once. Unknown and expired states are both `InvalidState`.
    pub fn validate(&self, state: &str) -> Result<StateData, Error> {
        let (_, data) = self
            .states
            .remove(state)
            .ok_or_else(|| oauth_error(OAuthErrorKind::InvalidState, "Unknown state parameter"))?;

        if Utc::now() > data.expires_at {
            return Err(oauth_error(
                OAuthErrorKind::InvalidState,
                "State parameter has expired",
            ));
        }
        Ok(data)
    }

    /// Drop expired states. Returns how many were removed.
    pub fn cleanup_expired(&self) -> usize {
        let before = self.states.len();
        let now = Utc::now();
        self.states.retain(|_, data| data.expires_at > now);
        before.saturating_sub(self.states.len())
    }

    fn generate_token() -> String {
        let random_bytes: [u8; 32] = rand::thread_rng().gen();
        hex::encode(random_bytes)
    }
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}

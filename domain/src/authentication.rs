//! Authentication orchestrator.
//!
//! Decides, for one inbound request, whether the session already carries an identity from
//! the provider and a usable token set, or whether the user agent has to be sent through
//! the provider's authorization endpoint first.

use std::sync::Arc;

use chrono::Duration;
use connect_auth::http::Backchannel;
use connect_auth::oauth::token::{encryption, Manager, MemoryStorage, Storage, TokenSet};
use connect_auth::oauth::{AuthorizationRequest, PkceVerifier, Provider, StateManager};
use connect_auth::{Identity, Principal};
use log::*;
use secrecy::SecretString;
use service::config::Config;

use crate::error::{AuthenticationErrorKind, DomainErrorKind, Error, InternalErrorKind};
use crate::gateway::intuit;
use crate::ticket::TicketOptions;

/// Where a request stands in the authentication flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    ChallengeIssued,
    Authenticated,
    Failed,
}

/// Outcome of validating the session's tokens for the provider scheme.
#[derive(Debug)]
pub enum AuthResult {
    Succeeded(TokenSet, Identity),
    Failed(Error),
}

/// What the caller must do with the current request.
#[derive(Debug)]
pub enum Decision {
    /// Redirect the user agent here. Processing of this request ends.
    Challenge(AuthorizationRequest),
    /// Continue with these tokens on behalf of this identity.
    Proceed { tokens: TokenSet, identity: Identity },
    /// Report the reason to the user. Not retried and not redirected.
    Failed(Error),
}

impl Decision {
    pub fn state(&self) -> AuthState {
        match self {
            Decision::Challenge(_) => AuthState::ChallengeIssued,
            Decision::Proceed { .. } => AuthState::Authenticated,
            Decision::Failed(_) => AuthState::Failed,
        }
    }
}

/// Ties the provider, the token store and the CSRF state together.
pub struct Authenticator<S: Storage> {
    pub(crate) provider: Arc<dyn Provider>,
    pub(crate) tokens: Manager<S>,
    pub(crate) states: StateManager,
    pub(crate) ticket: TicketOptions,
    use_pkce: bool,
}

impl<S: Storage> Authenticator<S> {
    pub fn new(provider: Arc<dyn Provider>, storage: S, ticket: TicketOptions) -> Self {
        Self {
            provider,
            tokens: Manager::new(storage),
            states: StateManager::new(),
            ticket,
            use_pkce: false,
        }
    }

    pub fn with_pkce(mut self, use_pkce: bool) -> Self {
        self.use_pkce = use_pkce;
        self
    }

    pub fn with_state_ttl(mut self, ttl: Duration) -> Self {
        self.states = StateManager::with_ttl(ttl);
        self
    }

    /// Issuer tag of identities created by this authenticator.
    pub fn issuer(&self) -> &str {
        self.provider.issuer()
    }

    /// Build the redirect that starts authorization, remembering `return_to` for the
    /// callback.
    pub fn challenge(&self, return_to: &str) -> AuthorizationRequest {
        let expired = self.states.cleanup_expired();
        if expired > 0 {
            debug!("Dropped {} expired authorization states", expired);
        }

        let verifier = self.use_pkce.then(PkceVerifier::generate);
        let challenge = verifier.as_ref().map(PkceVerifier::challenge);
        let state = self
            .states
            .generate(verifier.map(PkceVerifier::into_string), return_to);

        info!("Issuing authorization challenge via {}", self.provider.provider().as_str());
        self.provider.authorization_url(&state, challenge.as_ref())
    }

    /// Validate the session's tokens for the provider scheme.
    ///
    /// Requires an identity from the provider in `principal` and a non-empty, unexpired
    /// access token in the store under `session_id`. Tokens are never refreshed here, so
    /// a missing identity, token set or access token fails as `ReauthenticationRequired`.
    /// A store that cannot hand back the token set fails as `TokenValidationFailed`.
    pub async fn validate(&self, principal: &Principal, session_id: Option<&str>) -> AuthResult {
        let Some(identity) = principal.identity_for(self.issuer()) else {
            return AuthResult::Failed(reauthenticate("Session has no identity from the provider"));
        };
        let Some(session_id) = session_id else {
            return AuthResult::Failed(reauthenticate("Session has no token set"));
        };

        match self.tokens.valid_tokens(session_id).await {
            Ok(tokens) => AuthResult::Succeeded(tokens, identity.clone()),
            Err(e) if e.requires_reauthentication() => AuthResult::Failed(e.into()),
            Err(e) => AuthResult::Failed(Error {
                source: Some(Box::new(e)),
                error_kind: DomainErrorKind::Authentication(
                    AuthenticationErrorKind::TokenValidationFailed,
                ),
            }),
        }
    }

    /// Decide how to handle a request made on behalf of `principal`.
    ///
    /// No identity from the provider means a challenge, and so does a token set that has
    /// to be obtained again. Any other validation failure is reported as `Failed`.
    pub async fn authorize(
        &self,
        principal: &Principal,
        session_id: Option<&str>,
        return_to: &str,
    ) -> Decision {
        if !principal.has_issuer(self.issuer()) {
            debug!("No identity from {} on the session", self.issuer());
            return Decision::Challenge(self.challenge(return_to));
        }

        match self.validate(principal, session_id).await {
            AuthResult::Succeeded(tokens, identity) => Decision::Proceed { tokens, identity },
            AuthResult::Failed(e) if e.requires_reauthentication() => {
                info!("Stored tokens cannot be used ({}), re-entering authorization", e.reason());
                Decision::Challenge(self.challenge(return_to))
            }
            AuthResult::Failed(e) => {
                warn!("Token validation failed: {}", e);
                Decision::Failed(e)
            }
        }
    }

    /// Forget the token set of a signed-out session.
    pub async fn sign_out(&self, session_id: &str) -> Result<(), Error> {
        Ok(self.tokens.delete_tokens(session_id).await?)
    }
}

fn reauthenticate(message: &str) -> Error {
    Error::new(
        DomainErrorKind::Authentication(AuthenticationErrorKind::ReauthenticationRequired),
        message,
    )
}

impl Authenticator<MemoryStorage> {
    /// Build the authenticator with an in-memory token store from configuration.
    pub fn from_config(config: &Config, http_client: Backchannel) -> Result<Self, Error> {
        let provider = intuit::new_provider(config, http_client)?;
        let ticket = TicketOptions::from_config(config)?;

        let retention = Duration::seconds(config.session_expiry_seconds as i64);
        let storage = match config.token_encryption_key() {
            Some(key) => {
                encryption::encrypt("", &key).map_err(|e| {
                    warn!("TOKEN_ENCRYPTION_KEY is not a 64 character hex string");
                    Error {
                        source: Some(Box::new(e)),
                        error_kind: DomainErrorKind::Internal(InternalErrorKind::Config),
                    }
                })?;
                MemoryStorage::new()
                    .with_retention(retention)
                    .with_encryption_key(SecretString::new(key))
            }
            None => {
                warn!("TOKEN_ENCRYPTION_KEY is not set, tokens are kept unencrypted in memory");
                MemoryStorage::new().with_retention(retention)
            }
        };

        Ok(Self::new(Arc::new(provider), storage, ticket)
            .with_pkce(config.oauth_use_pkce)
            .with_state_ttl(Duration::seconds(config.oauth_state_ttl_secs as i64)))
    }
}

//! Completing sign-in when the provider redirects back with an authorization code.
//!
//! Runs as one linear pipeline: check the provider did not refuse, redeem the CSRF state,
//! exchange the code, create the claims ticket and save the token set. The caller commits
//! the returned identity to the session.

use std::collections::HashMap;

use connect_auth::oauth::token::Storage;
use connect_auth::Identity;
use log::*;
use tokio_util::sync::CancellationToken;

use crate::authentication::Authenticator;
use crate::error::{AuthenticationErrorKind, DomainErrorKind, Error};
use crate::ticket::create_ticket;

/// A completed sign-in, ready to be attached to the session.
#[derive(Debug)]
pub struct SignIn {
    pub identity: Identity,
    /// Local path the user was on when the challenge was issued.
    pub return_to: String,
}

impl<S: Storage> Authenticator<S> {
    /// Handle the redirect back from the provider.
    ///
    /// `inbound_query` is the full query of the redirect. `issued_state` is the state the
    /// caller's own session was challenged with; a redirect carrying any other state was
    /// started in a different browser and is refused. Tokens are stored under
    /// `session_id` before this returns, so they are in place by the time the identity
    /// is committed to the session.
    pub async fn complete_sign_in(
        &self,
        inbound_query: &HashMap<String, String>,
        issued_state: Option<&str>,
        session_id: &str,
        cancel: &CancellationToken,
    ) -> Result<SignIn, Error> {
        if let Some(error) = inbound_query.get("error") {
            let description = inbound_query
                .get("error_description")
                .map(String::as_str)
                .unwrap_or_default();
            warn!("Provider refused authorization: {} {}", error, description);
            return Err(Error::new(
                DomainErrorKind::Authentication(AuthenticationErrorKind::AuthorizationDenied),
                &format!("Authorization was denied by the provider: {}", error),
            ));
        }

        let state = inbound_query.get("state").map(String::as_str).unwrap_or_default();
        if issued_state != Some(state) {
            warn!("Redirect back from provider carries a state not issued to this session");
            return Err(Error::new(
                DomainErrorKind::Authentication(AuthenticationErrorKind::InvalidState),
                "State parameter was not issued to this session",
            ));
        }
        let state_data = self
            .states
            .validate(state)
            .inspect_err(|e| warn!("Rejected redirect back from provider: {}", e))?;

        let code = match inbound_query.get("code") {
            Some(code) if !code.is_empty() => code,
            _ => {
                return Err(Error::new(
                    DomainErrorKind::Authentication(AuthenticationErrorKind::AuthorizationDenied),
                    "Redirect back from the provider carried no authorization code",
                ))
            }
        };

        let tokens = self
            .provider
            .exchange_code(code, state_data.pkce_verifier.as_deref(), cancel)
            .await
            .inspect_err(|e| warn!("Authorization code exchange failed: {}", e))?;

        let identity = create_ticket(
            self.provider.as_ref(),
            &tokens.access_token,
            inbound_query,
            &self.ticket,
            cancel,
        )
        .await?;

        self.tokens
            .store_tokens(session_id, tokens)
            .await
            .inspect_err(|e| warn!("Failed to save tokens for session: {}", e))?;

        info!(
            "Signed in identity from {} for tenant {}",
            identity.authentication_type(),
            identity
                .find_first(&self.ticket.tenant_claim_type)
                .unwrap_or_default()
        );

        Ok(SignIn {
            identity,
            return_to: state_data.return_to,
        })
    }
}

//! Controller for the OAuth authorization-code flow against the accounting provider.
//!
//! These endpoints are reached through browser redirects, so they answer with redirects
//! and never with JSON.

use std::collections::HashMap;

use crate::extractors::{auth_session::AuthSession, request_cancellation::RequestCancellation};
use crate::{AppState, Error};

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect};
use log::*;
use serde::Deserialize;

use super::customer_controller::CUSTOMER_PATH;

/// Query parameters for starting OAuth
#[derive(Debug, Deserialize)]
pub struct AuthorizeParams {
    /// Local path to land on once sign-in completes.
    pub return_to: Option<String>,
}

/// GET /oauth/intuit/authorize
///
/// Starts authorization by redirecting to the provider's authorization endpoint.
pub async fn authorize(
    State(app_state): State<AppState>,
    auth_session: AuthSession,
    Query(params): Query<AuthorizeParams>,
) -> Result<impl IntoResponse, Error> {
    let return_to = local_path(params.return_to.as_deref());
    let request = app_state.authenticator.challenge(return_to);
    auth_session.remember_issued_state(&request.state).await?;
    Ok(Redirect::temporary(&request.url))
}

/// GET /oauth/intuit/callback
///
/// Handles the provider's redirect back. The whole query is handed to the sign-in
/// pipeline since the tenant id travels on it next to `code` and `state`. The state must
/// be the one this session was challenged with. The token set is stored and the identity
/// committed to the session before the user is sent on.
pub async fn callback(
    State(app_state): State<AppState>,
    mut auth_session: AuthSession,
    cancellation: RequestCancellation,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, Error> {
    let issued_state = auth_session.take_issued_state().await?;
    let token_key = auth_session.token_key_or_new();

    let sign_in = app_state
        .authenticator
        .complete_sign_in(
            &params,
            issued_state.as_deref(),
            &token_key,
            cancellation.token(),
        )
        .await?;

    auth_session.sign_in(sign_in.identity, token_key).await?;

    Ok(Redirect::to(local_path(Some(sign_in.return_to.as_str()))))
}

/// POST /oauth/intuit/sign_out
///
/// Forgets the session's identities and its token set.
pub async fn sign_out(
    State(app_state): State<AppState>,
    auth_session: AuthSession,
) -> Result<impl IntoResponse, Error> {
    if let Some(token_key) = auth_session.sign_out().await? {
        app_state.authenticator.sign_out(&token_key).await?;
        info!("Session signed out");
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Only same-origin paths are followed after sign-in.
fn local_path(return_to: Option<&str>) -> &str {
    match return_to {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => {
            path
        }
        _ => CUSTOMER_PATH,
    }
}

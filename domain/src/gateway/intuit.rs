//! Intuit OpenID Connect provider.
//!
//! Builds a configured provider for the authentication orchestrator.

use connect_auth::http::Backchannel;
use connect_auth::oauth::providers::intuit::{Endpoints, Provider, Settings};
use log::*;
use secrecy::SecretString;
use service::config::Config;

use crate::error::{DomainErrorKind, Error, InternalErrorKind};

/// Create a new Intuit provider from configuration.
///
/// The client id and secret have no defaults and must be supplied through the
/// environment, a `.env` file or the command line.
pub fn new_provider(config: &Config, http_client: Backchannel) -> Result<Provider, Error> {
    let client_id = config.oauth_client_id().ok_or_else(|| {
        warn!("OAUTH_CLIENT_ID is not configured");
        Error::new(
            DomainErrorKind::Internal(InternalErrorKind::Config),
            "OAuth client id is not configured",
        )
    })?;
    let client_secret = config.oauth_client_secret().ok_or_else(|| {
        warn!("OAUTH_CLIENT_SECRET is not configured");
        Error::new(
            DomainErrorKind::Internal(InternalErrorKind::Config),
            "OAuth client secret is not configured",
        )
    })?;

    let settings = Settings {
        client_id,
        client_secret: SecretString::new(client_secret),
        redirect_uri: config.oauth_redirect_uri.clone(),
        scopes: config.oauth_scopes.clone(),
        issuer: config.oauth_issuer.clone(),
        endpoints: Endpoints {
            authorization_url: config.oauth_authorization_url.clone(),
            token_url: config.oauth_token_url.clone(),
            userinfo_url: config.oauth_userinfo_url.clone(),
        },
    };

    Ok(Provider::new(settings, http_client)?)
}

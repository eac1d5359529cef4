//! Claims-ticket creation: turns a fresh access token and the provider's redirect back
//! into the identity that gets attached to the session.

use std::collections::HashMap;

use connect_auth::claims::{map_claims, tenant_claim, ClaimMap};
use connect_auth::oauth::Provider;
use connect_auth::Identity;
use log::*;
use secrecy::SecretString;
use service::config::Config;
use tokio_util::sync::CancellationToken;

use crate::error::{DomainErrorKind, Error, InternalErrorKind};

/// How an identity is assembled from the redirect and the user-info payload.
#[derive(Debug, Clone)]
pub struct TicketOptions {
    pub claim_map: ClaimMap,
    /// Query parameter of the redirect back that carries the tenant id.
    pub tenant_query_param: String,
    /// Claim type the tenant id is stored under.
    pub tenant_claim_type: String,
}

impl TicketOptions {
    pub fn from_config(config: &Config) -> Result<Self, Error> {
        let claim_map: ClaimMap = config.oauth_claim_map.parse().map_err(|e| {
            warn!("OAUTH_CLAIM_MAP is malformed: {}", e);
            Error::from(e)
        })?;

        if config.tenant_query_param.is_empty() || config.tenant_claim_type.is_empty() {
            return Err(Error::new(
                DomainErrorKind::Internal(InternalErrorKind::Config),
                "Tenant query parameter and claim type must not be empty",
            ));
        }

        Ok(Self {
            claim_map,
            tenant_query_param: config.tenant_query_param.clone(),
            tenant_claim_type: config.tenant_claim_type.clone(),
        })
    }
}

/// Build the identity for a completed authorization.
///
/// The tenant id is read from `inbound_query` (the redirect back), never from the
/// provider payload, and is required. The user-info call must succeed; any failure
/// aborts the sign-in and nothing partial is returned.
pub async fn create_ticket(
    provider: &dyn Provider,
    access_token: &SecretString,
    inbound_query: &HashMap<String, String>,
    options: &TicketOptions,
    cancel: &CancellationToken,
) -> Result<Identity, Error> {
    let tenant = tenant_claim(
        inbound_query,
        &options.tenant_query_param,
        &options.tenant_claim_type,
    )
    .inspect_err(|e| warn!("Redirect back from provider has no tenant id: {}", e))?;

    let user_info = provider
        .get_user_info(access_token, cancel)
        .await
        .inspect_err(|e| warn!("Failed to fetch user info from provider: {}", e))?;

    let mut identity = Identity::new(provider.issuer());
    identity.add_claim(tenant);
    identity.add_claims(map_claims(&user_info, &options.claim_map));

    debug!(
        "Created identity for issuer {} with {} claims",
        identity.authentication_type(),
        identity.claims().len()
    );
    Ok(identity)
}

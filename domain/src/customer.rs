//! The first-customer lookup: authorize the request, then ask the accounting API for the
//! display name of one customer of the user's company.

use connect_auth::oauth::token::Storage;
use connect_auth::oauth::AuthorizationRequest;
use connect_auth::Principal;
use log::*;
use tokio_util::sync::CancellationToken;

use crate::authentication::{Authenticator, Decision};
use crate::error::Error;
use crate::gateway::accounting::{Client, Query};

/// What the page should show.
#[derive(Debug)]
pub enum CustomerView {
    /// The user has to authorize first. Send them here.
    Challenge(AuthorizationRequest),
    DisplayName(String),
}

/// Look up the display name of the first customer of the signed-in company.
///
/// A session without a provider identity or usable tokens is challenged, never queried.
/// An identity without a tenant claim is passed through as an empty tenant id, which the
/// accounting client rejects before making a request.
pub async fn first_customer_name<S: Storage>(
    authenticator: &Authenticator<S>,
    accounting: &Client,
    principal: &Principal,
    session_id: Option<&str>,
    return_to: &str,
    cancel: &CancellationToken,
) -> Result<CustomerView, Error> {
    let (tokens, identity) = match authenticator.authorize(principal, session_id, return_to).await {
        Decision::Challenge(request) => return Ok(CustomerView::Challenge(request)),
        Decision::Failed(e) => return Err(e),
        Decision::Proceed { tokens, identity } => (tokens, identity),
    };

    let tenant_id = identity
        .find_first(&authenticator.ticket.tenant_claim_type)
        .unwrap_or_default();

    let name = accounting
        .query_display_field(&tokens.access_token, tenant_id, &Query::first_customer(), cancel)
        .await
        .inspect_err(|e| warn!("First customer lookup failed: {}", e))?;

    Ok(CustomerView::DisplayName(name))
}

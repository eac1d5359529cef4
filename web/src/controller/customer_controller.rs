use crate::extractors::{auth_session::AuthSession, request_cancellation::RequestCancellation};
use crate::{AppState, Error};

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use domain::customer::{self, CustomerView};
use log::*;

pub(crate) const CUSTOMER_PATH: &str = "/customer";

/// GET /customer
///
/// Shows the display name of the first customer of the signed-in company. A session that
/// is not signed in with the provider is redirected to authorize first.
pub async fn read(
    State(app_state): State<AppState>,
    auth_session: AuthSession,
    cancellation: RequestCancellation,
) -> Result<Response, Error> {
    let view = customer::first_customer_name(
        app_state.authenticator.as_ref(),
        app_state.accounting.as_ref(),
        &auth_session.principal,
        auth_session.token_key(),
        CUSTOMER_PATH,
        cancellation.token(),
    )
    .await?;

    Ok(match view {
        CustomerView::Challenge(request) => {
            debug!("GET first customer: authorization required");
            auth_session.remember_issued_state(&request.state).await?;
            Redirect::temporary(&request.url).into_response()
        }
        CustomerView::DisplayName(name) => (StatusCode::OK, name).into_response(),
    })
}

pub(crate) mod auth_session;
pub(crate) mod request_cancellation;

use axum::http::StatusCode;

type RejectionType = (StatusCode, String);

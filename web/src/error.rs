use std::error::Error as StdError;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use domain::error::{
    AuthenticationErrorKind, DomainErrorKind, Error as DomainError, ExternalErrorKind,
};
use log::*;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug)]
pub struct Error(DomainError);

impl StdError for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> core::result::Result<(), std::fmt::Error> {
        write!(fmt, "{self:?}")
    }
}

impl Error {
    fn status_code(&self) -> StatusCode {
        match &self.0.error_kind {
            DomainErrorKind::Authentication(AuthenticationErrorKind::InvalidState) => {
                StatusCode::BAD_REQUEST
            }
            DomainErrorKind::Authentication(_) => StatusCode::UNAUTHORIZED,
            DomainErrorKind::Usage(_) => StatusCode::BAD_REQUEST,
            DomainErrorKind::External(ExternalErrorKind::Cancelled) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            DomainErrorKind::External(_) | DomainErrorKind::Schema(_) => StatusCode::BAD_GATEWAY,
            DomainErrorKind::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// List of possible StatusCode variants https://docs.rs/http/latest/http/status/struct.StatusCode.html
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed with {}: {}", status, self.0);
        } else {
            debug!("Request rejected with {}: {}", status, self.0);
        }
        (status, format!("Error: {}", self.0.reason())).into_response()
    }
}

impl<E> From<E> for Error
where
    E: Into<DomainError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

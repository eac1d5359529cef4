//! Error types for the `domain` layer.
use connect_auth::error::{
    ClaimsErrorKind, Error as ConnectAuthError, ErrorKind as ConnectAuthErrorKind,
    HttpErrorKind, OAuthErrorKind, TokenErrorKind,
};
use std::error::Error as StdError;
use std::fmt;

/// Top-level domain error type.
/// Errors in the Domain layer are modeled as a tree structure
/// with `domain::error::Error` as the root type holding a tree of `error_kind`
/// enums that represent the kinds of errors that can occur in the domain layer or
/// in lower layers. The `source` field is used to hold the original error that caused
/// the domain error. `web` maps the kinds onto HTTP status codes and never needs to
/// look at `connect-auth` errors directly.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: DomainErrorKind,
}

/// Enum representing the major categories of errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum DomainErrorKind {
    Internal(InternalErrorKind),
    External(ExternalErrorKind),
    Authentication(AuthenticationErrorKind),
    Schema(SchemaErrorKind),
    Usage(UsageErrorKind),
}

/// Failures inside this service (configuration, storage).
#[derive(Debug, PartialEq)]
pub enum InternalErrorKind {
    Config,
    Other(String),
}

/// Backchannel failures: the provider or the accounting API could not be reached or
/// answered with a non-success status.
#[derive(Debug, PartialEq)]
pub enum ExternalErrorKind {
    Network,
    Status(u16),
    Cancelled,
    Other(String),
}

/// The authentication attempt did not produce a usable identity.
#[derive(Debug, PartialEq)]
pub enum AuthenticationErrorKind {
    /// Token validation for the provider scheme reported failure.
    TokenValidationFailed,
    /// The redirect back from the provider carried no tenant identifier.
    MissingTenant,
    /// The CSRF state on the redirect back was unknown, reused or expired.
    InvalidState,
    /// The provider redirected back with an `error` instead of a code.
    AuthorizationDenied,
    /// No identity or no usable token set: the user has to authorize again.
    ReauthenticationRequired,
}

/// A response was missing an expected key, or an expected array was empty.
#[derive(Debug, PartialEq)]
pub enum SchemaErrorKind {
    NoResult,
    Unexpected(String),
}

/// The caller broke a precondition before any network call was made.
#[derive(Debug, PartialEq)]
pub enum UsageErrorKind {
    MissingAccessToken,
    MissingTenantId,
}

impl Error {
    /// True when the user has to go through authorization again.
    pub fn requires_reauthentication(&self) -> bool {
        self.error_kind
            == DomainErrorKind::Authentication(AuthenticationErrorKind::ReauthenticationRequired)
    }

    pub fn new(error_kind: DomainErrorKind, message: &str) -> Self {
        Error {
            source: Some(message.to_string().into()),
            error_kind,
        }
    }

    /// Human readable reason, without the error kind tree.
    pub fn reason(&self) -> String {
        match &self.source {
            Some(source) => source.to_string(),
            None => format!("{:?}", self.error_kind),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Domain Error: {:?}: {}", self.error_kind, self.reason())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        // Errors that result from issues building the reqwest::Client instance. This
        // type of error will occur prior to any network calls being made.
        if err.is_builder() {
            Error {
                source: Some(Box::new(err)),
                error_kind: DomainErrorKind::Internal(InternalErrorKind::Other(
                    "Failed to build reqwest client".to_string(),
                )),
            }
        // Errors that result from issues with the network call itself.
        } else {
            Error {
                source: Some(Box::new(err)),
                error_kind: DomainErrorKind::External(ExternalErrorKind::Network),
            }
        }
    }
}

// This is where we translate errors from the `connect-auth` layer to the `domain` layer.
impl From<ConnectAuthError> for Error {
    fn from(err: ConnectAuthError) -> Self {
        let error_kind = match &err.error_kind {
            ConnectAuthErrorKind::Http(HttpErrorKind::Status(code)) => {
                DomainErrorKind::External(ExternalErrorKind::Status(*code))
            }
            ConnectAuthErrorKind::Http(HttpErrorKind::Cancelled) => {
                DomainErrorKind::External(ExternalErrorKind::Cancelled)
            }
            ConnectAuthErrorKind::Http(HttpErrorKind::BuilderFailed) => {
                DomainErrorKind::Internal(InternalErrorKind::Other(err.to_string()))
            }
            ConnectAuthErrorKind::Http(_) => DomainErrorKind::External(ExternalErrorKind::Network),
            ConnectAuthErrorKind::OAuth(OAuthErrorKind::InvalidState) => {
                DomainErrorKind::Authentication(AuthenticationErrorKind::InvalidState)
            }
            ConnectAuthErrorKind::OAuth(OAuthErrorKind::AuthorizationFailed) => {
                DomainErrorKind::Authentication(AuthenticationErrorKind::AuthorizationDenied)
            }
            ConnectAuthErrorKind::OAuth(OAuthErrorKind::InvalidConfiguration) => {
                DomainErrorKind::Internal(InternalErrorKind::Config)
            }
            ConnectAuthErrorKind::OAuth(OAuthErrorKind::TokenExchangeFailed)
            | ConnectAuthErrorKind::OAuth(OAuthErrorKind::InvalidResponse) => {
                DomainErrorKind::Schema(SchemaErrorKind::Unexpected(err.to_string()))
            }
            ConnectAuthErrorKind::Claims(ClaimsErrorKind::MissingTenant) => {
                DomainErrorKind::Authentication(AuthenticationErrorKind::MissingTenant)
            }
            ConnectAuthErrorKind::Claims(ClaimsErrorKind::InvalidPayload) => {
                DomainErrorKind::Schema(SchemaErrorKind::Unexpected(err.to_string()))
            }
            ConnectAuthErrorKind::Claims(ClaimsErrorKind::InvalidMapping) => {
                DomainErrorKind::Internal(InternalErrorKind::Config)
            }
            ConnectAuthErrorKind::Token(TokenErrorKind::NotFound)
            | ConnectAuthErrorKind::Token(TokenErrorKind::Expired) => {
                DomainErrorKind::Authentication(AuthenticationErrorKind::ReauthenticationRequired)
            }
            ConnectAuthErrorKind::Token(TokenErrorKind::Storage) => {
                DomainErrorKind::Authentication(AuthenticationErrorKind::TokenValidationFailed)
            }
            ConnectAuthErrorKind::Storage(_) => {
                DomainErrorKind::Internal(InternalErrorKind::Other(err.to_string()))
            }
        };
        Error {
            source: Some(Box::new(err)),
            error_kind,
        }
    }
}

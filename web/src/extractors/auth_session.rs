use crate::extractors::RejectionType;
use crate::Error;
use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};
use domain::error::{DomainErrorKind, Error as DomainError, InternalErrorKind};
use domain::{Identity, Principal};
use log::*;
use tower_sessions::Session;
use uuid::Uuid;

/// Session key of the signed-in principal.
const PRINCIPAL_KEY: &str = "principal";
/// Session key under which the session's token set is kept in the token store.
const TOKEN_KEY: &str = "token_key";
/// Session key of the CSRF state this browser was last challenged with.
const ISSUED_STATE_KEY: &str = "oauth_state";

/// The principal attached to the caller's browser session.
///
/// An anonymous session yields an empty principal, so extraction only fails if the
/// session store itself does.
pub(crate) struct AuthSession {
    session: Session,
    pub(crate) principal: Principal,
    token_key: Option<String>,
}

impl<S> FromRequestParts<S> for AuthSession
where
    S: Send + Sync,
{
    type Rejection = RejectionType;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|(status, msg)| (status, msg.to_string()))?;

        let principal = session
            .get::<Principal>(PRINCIPAL_KEY)
            .await
            .map_err(rejection)?
            .unwrap_or_default();
        let token_key = session.get::<String>(TOKEN_KEY).await.map_err(rejection)?;

        Ok(AuthSession {
            session,
            principal,
            token_key,
        })
    }
}

impl AuthSession {
    pub(crate) fn token_key(&self) -> Option<&str> {
        self.token_key.as_deref()
    }

    /// The token store key for this session, minting one on first sign-in.
    pub(crate) fn token_key_or_new(&self) -> String {
        self.token_key
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string())
    }

    /// Remember the state of a challenge sent to this browser, so only a redirect back
    /// to the same browser can redeem it.
    pub(crate) async fn remember_issued_state(&self, state: &str) -> Result<(), Error> {
        self.session
            .insert(ISSUED_STATE_KEY, state)
            .await
            .map_err(session_error)
    }

    /// Take the remembered challenge state. It can be redeemed at most once.
    pub(crate) async fn take_issued_state(&self) -> Result<Option<String>, Error> {
        self.session
            .remove::<String>(ISSUED_STATE_KEY)
            .await
            .map_err(session_error)
    }

    /// Commit a freshly created identity and save the session.
    ///
    /// The session id is cycled so a session fixed before sign-in cannot be reused.
    pub(crate) async fn sign_in(&mut self, identity: Identity, token_key: String) -> Result<(), Error> {
        self.principal.add_identity(identity);

        self.session.cycle_id().await.map_err(session_error)?;
        self.session
            .insert(PRINCIPAL_KEY, &self.principal)
            .await
            .map_err(session_error)?;
        self.session
            .insert(TOKEN_KEY, &token_key)
            .await
            .map_err(session_error)?;
        self.session.save().await.map_err(session_error)?;

        self.token_key = Some(token_key);
        Ok(())
    }

    /// Drop everything stored for this session. Returns the token store key, if any.
    pub(crate) async fn sign_out(mut self) -> Result<Option<String>, Error> {
        self.session.flush().await.map_err(session_error)?;
        self.principal = Principal::new();
        Ok(self.token_key.take())
    }
}

fn rejection(e: tower_sessions::session::Error) -> RejectionType {
    warn!("Failed to read session: {:?}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Failed to read session".to_string(),
    )
}

fn session_error(e: tower_sessions::session::Error) -> Error {
    warn!("Failed to update session: {:?}", e);
    Error::from(DomainError {
        source: Some(Box::new(e)),
        error_kind: DomainErrorKind::Internal(InternalErrorKind::Other(
            "Failed to update session".to_string(),
        )),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, extract::Request, routing::get, Router};
    use domain::Claim;
    use time::Duration;
    use tower::ServiceExt;
    use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

    const ISSUER: &str = "https://oauth.platform.intuit.com/op/v1";

    async fn sign_in(mut auth_session: AuthSession) -> &'static str {
        let mut identity = Identity::new(ISSUER);
        identity.add_claim(Claim::new("realmId", "Q999"));
        let token_key = auth_session.token_key_or_new();
        auth_session.sign_in(identity, token_key).await.unwrap();
        "signed in"
    }

    async fn whoami(auth_session: AuthSession) -> String {
        match auth_session.principal.identity_for(ISSUER) {
            Some(identity) => format!(
                "{} {}",
                identity.find_first("realmId").unwrap_or_default(),
                auth_session.token_key().is_some()
            ),
            None => "anonymous".to_string(),
        }
    }

    async fn challenge(auth_session: AuthSession) -> &'static str {
        auth_session.remember_issued_state("s-123").await.unwrap();
        "challenged"
    }

    async fn redeem(auth_session: AuthSession) -> String {
        let first = auth_session.take_issued_state().await.unwrap();
        let second = auth_session.take_issued_state().await.unwrap();
        format!("{:?} {:?}", first, second)
    }

    fn app() -> Router {
        let session_layer = SessionManagerLayer::new(MemoryStore::default())
            .with_secure(false)
            .with_expiry(Expiry::OnInactivity(Duration::days(1)));

        Router::new()
            .route("/sign_in", get(sign_in))
            .route("/whoami", get(whoami))
            .route("/challenge", get(challenge))
            .route("/redeem", get(redeem))
            .layer(session_layer)
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_anonymous_session_has_empty_principal() {
        let request = Request::builder().uri("/whoami").body(Body::empty()).unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(body_text(response).await, "anonymous");
    }

    #[tokio::test]
    async fn test_signed_in_identity_is_visible_to_next_request() {
        let app = app();

        let request = Request::builder().uri("/sign_in").body(Body::empty()).unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let cookie = response
            .headers()
            .get("set-cookie")
            .and_then(|c| c.to_str().ok())
            .expect("sign in should set a session cookie")
            .to_string();

        let request = Request::builder()
            .uri("/whoami")
            .header("cookie", cookie)
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(body_text(response).await, "Q999 true");
    }

    #[tokio::test]
    async fn test_issued_state_is_redeemed_once_by_the_same_session() {
        let app = app();

        let request = Request::builder().uri("/challenge").body(Body::empty()).unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let cookie = response
            .headers()
            .get("set-cookie")
            .and_then(|c| c.to_str().ok())
            .expect("challenge should set a session cookie")
            .to_string();

        let request = Request::builder().uri("/redeem").body(Body::empty()).unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(body_text(response).await, "None None");

        let request = Request::builder()
            .uri("/redeem")
            .header("cookie", cookie)
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(body_text(response).await, "Some(\"s-123\") None");
    }
}

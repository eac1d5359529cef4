use crate::controller::{customer_controller, health_check_controller, oauth_controller};
use crate::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use time::Duration;
use tower_sessions::{cookie::SameSite, Expiry, MemoryStore, SessionManagerLayer};

pub fn define_routes(app_state: AppState) -> Router {
    // The provider redirects back with a top-level GET from its own origin, which a
    // `Strict` cookie would not survive.
    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(app_state.config.is_production())
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(Duration::seconds(
            app_state.config.session_expiry_seconds as i64,
        )));

    Router::new()
        .merge(health_routes())
        .merge(oauth_routes(app_state.clone()))
        .merge(customer_routes(app_state))
        .layer(session_layer)
}

fn health_routes() -> Router {
    Router::new().route("/health", get(health_check_controller::health_check))
}

fn oauth_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/oauth/intuit/authorize", get(oauth_controller::authorize))
        .route("/oauth/intuit/callback", get(oauth_controller::callback))
        .route("/oauth/intuit/sign_out", post(oauth_controller::sign_out))
        .with_state(app_state)
}

fn customer_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/customer", get(customer_controller::read))
        .with_state(app_state)
}

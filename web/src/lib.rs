use std::sync::Arc;

use domain::authentication::Authenticator;
use domain::error::{DomainErrorKind, Error as DomainError, InternalErrorKind};
use domain::gateway::{self, accounting};
use domain::MemoryStorage;
use log::*;
use service::config::Config;
use tokio::net::TcpListener;

pub use error::{Error, Result};

mod controller;
mod error;
mod extractors;
mod router;

// Needs to implement Clone to be able to be passed into Router as State
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub authenticator: Arc<Authenticator<MemoryStorage>>,
    pub accounting: Arc<accounting::Client>,
}

impl AppState {
    /// Build the provider, token store and accounting client from configuration. Both
    /// share one backchannel HTTP client.
    pub fn new(config: Config) -> core::result::Result<Self, DomainError> {
        let http_client = gateway::backchannel(&config)?;
        let authenticator = Authenticator::from_config(&config, http_client.clone())?;
        let accounting = accounting::Client::from_config(&config, http_client)?;

        Ok(Self {
            config,
            authenticator: Arc::new(authenticator),
            accounting: Arc::new(accounting),
        })
    }
}

pub async fn init_server(app_state: AppState) -> core::result::Result<(), DomainError> {
    let interface = app_state
        .config
        .interface
        .clone()
        .unwrap_or_else(|| "127.0.0.1".to_string());
    let address = format!("{}:{}", interface, app_state.config.port);

    let listener = TcpListener::bind(&address).await.map_err(|e| {
        error!("Failed to bind {}: {}", address, e);
        DomainError {
            source: Some(Box::new(e)),
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Config),
        }
    })?;

    info!(
        "Server starting... listening for connections on http://{} ({})",
        address, app_state.config.runtime_env
    );

    let router = router::define_routes(app_state);
    axum::serve(listener, router).await.map_err(|e| DomainError {
        source: Some(Box::new(e)),
        error_kind: DomainErrorKind::Internal(InternalErrorKind::Other(
            "Server stopped unexpectedly".to_string(),
        )),
    })
}

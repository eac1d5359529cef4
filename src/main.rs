use log::{error, info};
use service::{config::Config, logging::Logger};

#[tokio::main]
async fn main() {
    let config = Config::new();
    Logger::init_logger(&config as &Config);

    info!(
        "Starting ledger connect [{}], signing in with {}",
        config.runtime_env, config.oauth_issuer
    );

    let app_state = match web::AppState::new(config) {
        Ok(app_state) => app_state,
        Err(e) => {
            error!("Failed to configure the server: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = web::init_server(app_state).await {
        error!("{e}");
        std::process::exit(1);
    }
}

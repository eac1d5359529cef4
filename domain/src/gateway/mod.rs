//! Clients for the third-party services this platform talks to.

use std::time::Duration;

use connect_auth::http::{Backchannel, BackchannelBuilder};
use service::config::Config;

use crate::error::Error;

pub mod accounting;
pub mod intuit;

/// Build the backchannel HTTP client shared by the provider and the accounting API.
pub fn backchannel(config: &Config) -> Result<Backchannel, Error> {
    Ok(BackchannelBuilder::new()
        .with_timeout(Duration::from_secs(config.http_timeout_secs))
        .with_max_retries(config.http_max_retries)
        .with_user_agent(config.http_user_agent.clone())
        .build()?)
}

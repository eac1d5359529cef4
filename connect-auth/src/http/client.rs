//! Backchannel HTTP client builder with middleware.

use std::time::Duration;

use reqwest_middleware::ClientBuilder;
use reqwest_retry::RetryTransientMiddleware;

use super::BackoffPolicy;

/// HTTP client configuration.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Upper bound for a single outbound call.
    pub timeout: Duration,
    /// Maximum number of retries. Zero leaves the retry middleware out entirely.
    pub max_retries: u32,
    /// User agent string.
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_retries: 0,
            user_agent: format!("connect-auth/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Server-to-server HTTP client used for token, user-info and accounting API calls.
pub type Backchannel = reqwest_middleware::ClientWithMiddleware;

/// Builder for backchannel HTTP clients.
///
/// Every client built here has a bounded timeout and identifies itself with the
/// configured user agent. Retries are opt-in.
pub struct BackchannelBuilder {
    config: HttpClientConfig,
}

impl BackchannelBuilder {
    /// Create a new client builder with default configuration.
    pub fn new() -> Self {
        Self {
            config: HttpClientConfig::default(),
        }
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the maximum number of retries.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.config.max_retries = max_retries;
        self
    }

    /// Set the user agent string.
    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.config.user_agent = user_agent;
        self
    }

    /// Build the configured HTTP client.
    pub fn build(self) -> Result<Backchannel, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(self.config.timeout)
            .user_agent(self.config.user_agent)
            .build()?;

        let mut builder = ClientBuilder::new(client);
        if self.config.max_retries > 0 {
            let retry_policy = BackoffPolicy::new(self.config.max_retries);
            builder = builder.with(RetryTransientMiddleware::new_with_policy(retry_policy));
        }

        Ok(builder.build())
    }
}

impl Default for BackchannelBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_default() {
        let builder = BackchannelBuilder::new();
        assert_eq!(builder.config.timeout, Duration::from_secs(30));
        assert_eq!(builder.config.max_retries, 0);
        assert!(builder.config.user_agent.starts_with("connect-auth/"));
    }

    #[test]
    fn test_builder_with_timeout() {
        let builder = BackchannelBuilder::new().with_timeout(Duration::from_secs(60));
        assert_eq!(builder.config.timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_builder_with_max_retries_and_agent() {
        let builder = BackchannelBuilder::new()
            .with_max_retries(2)
            .with_user_agent("ledger-connect".to_string());
        assert_eq!(builder.config.max_retries, 2);
        assert_eq!(builder.config.user_agent, "ledger-connect");
    }

    #[tokio::test]
    async fn test_build_client() {
        assert!(BackchannelBuilder::new().build().is_ok());
        assert!(BackchannelBuilder::new().with_max_retries(3).build().is_ok());
    }
}

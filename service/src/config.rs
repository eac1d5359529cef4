use clap::builder::TypedValueParser as _;
use clap::Parser;
use dotenvy::dotenv;
use log::LevelFilter;
use std::ffi::OsString;
use std::fmt;
use std::str::FromStr;

/// Default Intuit OAuth 2.0 authorization endpoint.
pub const DEFAULT_OAUTH_AUTHORIZATION_URL: &str = "https://appcenter.intuit.com/connect/oauth2";
/// Default Intuit OAuth 2.0 token endpoint.
pub const DEFAULT_OAUTH_TOKEN_URL: &str =
    "https://oauth.platform.intuit.com/oauth2/v1/tokens/bearer";
/// Default Intuit OpenID Connect user-info endpoint (sandbox).
pub const DEFAULT_OAUTH_USERINFO_URL: &str =
    "https://sandbox-accounts.platform.intuit.com/v1/openid_connect/userinfo";
/// Issuer that identities created from Intuit are tagged with.
pub const DEFAULT_OAUTH_ISSUER: &str = "https://oauth.platform.intuit.com/op/v1";
/// Default QuickBooks Online accounting API company collection (sandbox).
pub const DEFAULT_ACCOUNTING_API_BASE_URL: &str =
    "https://sandbox-quickbooks.api.intuit.com/v3/company";

#[derive(Clone, Debug, PartialEq)]
pub enum RustEnv {
    Development,
    Production,
    Staging,
}

#[derive(Debug, PartialEq, Eq)]
pub struct RustEnvParseError;

impl FromStr for RustEnv {
    type Err = RustEnvParseError;
    fn from_str(level: &str) -> Result<RustEnv, Self::Err> {
        match level.to_lowercase().as_str() {
            "development" => Ok(RustEnv::Development),
            "production" => Ok(RustEnv::Production),
            "staging" => Ok(RustEnv::Staging),
            _ => Err(RustEnvParseError),
        }
    }
}

impl fmt::Display for RustEnv {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RustEnv::Development => write!(f, "development"),
            RustEnv::Production => write!(f, "production"),
            RustEnv::Staging => write!(f, "staging"),
        }
    }
}

#[derive(Clone, Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// The host interface to listen for incoming connections
    #[arg(short, long, env, default_value = "127.0.0.1")]
    pub interface: Option<String>,

    /// The host TCP port to listen for incoming connections
    #[arg(short, long, env, default_value_t = 4000)]
    pub port: u16,

    /// Set the log level verbosity threshold (level) to control what gets displayed on console output
    #[arg(
        short,
        long,
        env,
        default_value_t = LevelFilter::Info,
        value_parser = clap::builder::PossibleValuesParser::new(["OFF", "ERROR", "WARN", "INFO", "DEBUG", "TRACE"])
            .map(|s| s.parse::<LevelFilter>().unwrap()),
        )]
    pub log_level_filter: LevelFilter,

    /// Set the Rust runtime environment to use.
    #[arg(
    short,
    long,
    env,
    default_value_t = RustEnv::Development,
    value_parser = clap::builder::PossibleValuesParser::new([
        "DEVELOPMENT", "PRODUCTION", "STAGING",
        "development", "production", "staging"
    ])
        .map(|s| s.parse::<RustEnv>().unwrap()),
    )]
    pub runtime_env: RustEnv,

    /// The OAuth client identifier registered with the provider. Never hard-coded:
    /// supply it through the environment, a `.env` file or the command line.
    #[arg(long, env)]
    oauth_client_id: Option<String>,

    /// The OAuth client secret registered with the provider.
    #[arg(long, env, hide_env_values = true)]
    oauth_client_secret: Option<String>,

    /// The provider's authorization endpoint the user agent is redirected to.
    #[arg(long, env, default_value = DEFAULT_OAUTH_AUTHORIZATION_URL)]
    pub oauth_authorization_url: String,

    /// The provider's token endpoint used to redeem authorization codes.
    #[arg(long, env, default_value = DEFAULT_OAUTH_TOKEN_URL)]
    pub oauth_token_url: String,

    /// The provider's OpenID Connect user-info endpoint.
    #[arg(long, env, default_value = DEFAULT_OAUTH_USERINFO_URL)]
    pub oauth_userinfo_url: String,

    /// Where the provider redirects back to after authorization.
    #[arg(long, env, default_value = "http://localhost:4000/oauth/intuit/callback")]
    pub oauth_redirect_uri: String,

    /// Issuer that identities created from this provider are tagged with.
    #[arg(long, env, default_value = DEFAULT_OAUTH_ISSUER)]
    pub oauth_issuer: String,

    /// Scopes requested on every authorization.
    #[arg(
        long,
        env,
        value_delimiter = ',',
        use_value_delimiter = true,
        default_value = "com.intuit.quickbooks.accounting,openid,profile,email,phone,address"
    )]
    pub oauth_scopes: Vec<String>,

    /// Add a PKCE challenge to the authorization redirect.
    #[arg(long, env, default_value_t = false)]
    pub oauth_use_pkce: bool,

    /// Comma separated `provider_field=claim_type` pairs applied to the user-info payload.
    #[arg(
        long,
        env,
        default_value = "sub=nameidentifier,email=email,givenName=givenname,familyName=surname,phoneNumber=mobilephone"
    )]
    pub oauth_claim_map: String,

    /// Seconds an authorization state stays redeemable.
    #[arg(long, env, default_value_t = 600)]
    pub oauth_state_ttl_secs: u64,

    /// Query parameter of the provider's redirect back that carries the tenant id.
    #[arg(long, env, default_value = "realmId")]
    pub tenant_query_param: String,

    /// Claim type the tenant id is stored under.
    #[arg(long, env, default_value = "realmId")]
    pub tenant_claim_type: String,

    /// Base URL of the accounting API company collection.
    #[arg(long, env, default_value = DEFAULT_ACCOUNTING_API_BASE_URL)]
    pub accounting_api_base_url: String,

    /// The `minorversion` sent with every accounting API query.
    #[arg(long, env, default_value = "73")]
    pub accounting_api_minor_version: String,

    /// User agent the backchannel HTTP client identifies itself with.
    #[arg(long, env, default_value = "ledger-connect")]
    pub http_user_agent: String,

    /// Upper bound in seconds for a single outbound HTTP call.
    #[arg(long, env, default_value_t = 30)]
    pub http_timeout_secs: u64,

    /// Retries for transient outbound failures. Zero disables retrying.
    #[arg(long, env, default_value_t = 0)]
    pub http_max_retries: u32,

    /// Hex encoded 256-bit key used to encrypt tokens held in memory.
    #[arg(long, env, hide_env_values = true)]
    token_encryption_key: Option<String>,

    /// Session expiry duration in seconds (default: 24 hours = 86400 seconds)
    #[arg(long, env, default_value_t = 86400)]
    pub session_expiry_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        // Load .env file first
        dotenv().ok();
        // Then parse the command line parameters and flags
        Config::parse()
    }

    /// Parse an explicit argument list. The first item is the binary name. No `.env`
    /// file is loaded.
    pub fn parse_args<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Config::parse_from(args)
    }

    pub fn oauth_client_id(&self) -> Option<String> {
        self.oauth_client_id.clone()
    }

    pub fn oauth_client_secret(&self) -> Option<String> {
        self.oauth_client_secret.clone()
    }

    pub fn token_encryption_key(&self) -> Option<String> {
        self.token_encryption_key.clone()
    }

    pub fn runtime_env(&self) -> RustEnv {
        self.runtime_env.clone()
    }

    pub fn is_production(&self) -> bool {
        self.runtime_env() == RustEnv::Production
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(args: &[&str]) -> Config {
        Config::parse_args(std::iter::once("ledger_connect_rs").chain(args.iter().copied()))
    }

    #[test]
    fn test_defaults_point_at_intuit_sandbox() {
        let config = config(&[]);
        assert_eq!(config.port, 4000);
        assert_eq!(config.oauth_issuer, DEFAULT_OAUTH_ISSUER);
        assert_eq!(config.accounting_api_base_url, DEFAULT_ACCOUNTING_API_BASE_URL);
        assert_eq!(config.tenant_query_param, "realmId");
        assert_eq!(config.http_max_retries, 0);
        assert!(!config.oauth_use_pkce);
        assert_eq!(
            config.oauth_scopes,
            vec![
                "com.intuit.quickbooks.accounting",
                "openid",
                "profile",
                "email",
                "phone",
                "address"
            ]
        );
    }

    #[test]
    fn test_secrets_have_no_defaults() {
        let config = config(&[]);
        assert_eq!(config.oauth_client_id(), None);
        assert_eq!(config.oauth_client_secret(), None);
        assert_eq!(config.token_encryption_key(), None);
    }

    #[test]
    fn test_flags_override_defaults() {
        let config = config(&[
            "--oauth-client-id",
            "id",
            "--oauth-scopes",
            "openid,email",
            "--runtime-env",
            "production",
            "--log-level-filter",
            "DEBUG",
        ]);
        assert_eq!(config.oauth_client_id(), Some("id".to_string()));
        assert_eq!(config.oauth_scopes, vec!["openid", "email"]);
        assert!(config.is_production());
        assert_eq!(config.log_level_filter, LevelFilter::Debug);
    }

    #[test]
    fn test_rust_env_parsing() {
        assert_eq!("Staging".parse::<RustEnv>(), Ok(RustEnv::Staging));
        assert_eq!("qa".parse::<RustEnv>(), Err(RustEnvParseError));
        assert_eq!(RustEnv::Development.to_string(), "development");
    }
}

//! # connect-auth
//!
//! Protocol plumbing for connecting a user to a third-party OpenID Connect / OAuth 2.0
//! accounting provider:
//! - Identity and claim model, plus the claims mapper that turns a provider
//!   user-info payload into local claims
//! - Backchannel HTTP client building with timeout, retry middleware and cancellation
//! - OAuth 2.0 infrastructure (provider trait, CSRF state, PKCE, token exchange)
//! - Token sets, the token store interface and an in-memory store
//!
//! ## Architecture
//!
//! This crate holds no business decisions. The `domain` crate builds the authentication
//! orchestrator, the sign-in pipeline and the accounting API gateway on top of it.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use connect_auth::{
//!     claims::{map_claims, ClaimMap},
//!     http::BackchannelBuilder,
//!     oauth::{providers::intuit, Provider, token::{Manager, MemoryStorage}},
//! };
//! ```

pub mod claims;
pub mod error;
pub mod http;
pub mod identity;
pub mod oauth;

// Re-export commonly used types
pub use error::{Error, ErrorKind};
pub use identity::{Claim, Identity, Principal};

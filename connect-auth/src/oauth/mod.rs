//! OAuth 2.0 / OpenID Connect client infrastructure.
//!
//! Provides the authorization-code flow with CSRF state and optional PKCE.

mod pkce;
mod provider;
mod state;

pub mod providers;
pub mod token;

pub use pkce::{PkceChallenge, PkceVerifier, CHALLENGE_METHOD};
pub use provider::{AuthorizationRequest, Provider, ProviderKind, UserInfo};
pub use state::{StateData, StateManager};

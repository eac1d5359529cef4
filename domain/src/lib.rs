//! Business layer of the platform.
//!
//! `web` talks to this crate only: the authentication orchestrator, sign-in completion and
//! the accounting API gateway live here, built on the protocol plumbing in `connect-auth`.
//! Identity types are re-exported so that `web` does not need to depend on `connect-auth`
//! to keep a principal in the session.
pub use connect_auth::oauth::token::MemoryStorage;
pub use connect_auth::oauth::AuthorizationRequest;
pub use connect_auth::{Claim, Identity, Principal};

pub mod authentication;
pub mod customer;
pub mod error;
pub mod sign_in;
pub mod ticket;

pub mod gateway;

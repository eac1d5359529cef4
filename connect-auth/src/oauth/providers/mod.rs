//! Concrete OAuth provider implementations.

pub mod intuit;

//! Backchannel HTTP client building with middleware.

mod client;
mod request;
mod retry;

pub use client::{Backchannel, BackchannelBuilder, HttpClientConfig};
pub use request::{read_text, send};
pub use retry::BackoffPolicy;

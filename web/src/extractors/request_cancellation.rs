use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};
use tokio_util::sync::{CancellationToken, DropGuard};

/// Cancellation signal of one inbound request.
///
/// The token fires when the handler future is dropped, which is what happens when the
/// client disconnects before the response is written. Outbound calls made on behalf of the
/// request race against it.
pub(crate) struct RequestCancellation {
    token: CancellationToken,
    _guard: DropGuard,
}

impl RequestCancellation {
    pub(crate) fn new() -> Self {
        let token = CancellationToken::new();
        let _guard = token.clone().drop_guard();
        Self { token, _guard }
    }

    pub(crate) fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl<S> FromRequestParts<S> for RequestCancellation
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(_parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_fires_when_request_is_dropped() {
        let cancellation = RequestCancellation::new();
        let token = cancellation.token().clone();
        assert!(!token.is_cancelled());

        drop(cancellation);

        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn test_dropped_handler_future_cancels_outbound_work() {
        let cancellation = RequestCancellation::new();
        let token = cancellation.token().clone();

        let handler = tokio::spawn(async move {
            let _cancellation = cancellation;
            std::future::pending::<()>().await;
        });
        handler.abort();
        let _ = handler.await;

        tokio::time::timeout(std::time::Duration::from_secs(1), token.cancelled())
            .await
            .unwrap();
    }
}

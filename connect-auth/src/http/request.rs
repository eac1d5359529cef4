//! Cancellable backchannel calls.

use reqwest::Response;
use reqwest_middleware::RequestBuilder;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{http_error, Error, HttpErrorKind};

/// Issue `request`, racing it against `cancel`.
///
/// Only success statuses are returned as `Ok`. Any other status becomes
/// `HttpErrorKind::Status`. The peer's body is only logged at debug level since error
/// messages can end up in front of the user.
pub async fn send(request: RequestBuilder, cancel: &CancellationToken) -> Result<Response, Error> {
    let response = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            debug!("Backchannel call cancelled before a response arrived");
            return Err(cancelled());
        }
        result = request.send() => result?,
    };

    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = read_text(response, cancel).await.unwrap_or_default();
    warn!("Backchannel call failed with status {}", status);
    debug!("Backchannel error body: {}", body);
    Err(http_error(
        HttpErrorKind::Status(status.as_u16()),
        &format!("Upstream service answered {}", status),
    ))
}

/// Read the full response body as text, racing against `cancel`.
pub async fn read_text(response: Response, cancel: &CancellationToken) -> Result<String, Error> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(cancelled()),
        result = response.text() => Ok(result?),
    }
}

fn cancelled() -> Error {
    http_error(HttpErrorKind::Cancelled, "Inbound request was cancelled")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::http::BackchannelBuilder;
    use mockito::Server;

    #[tokio::test]
    async fn test_send_returns_success_response() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/ok")
            .with_status(200)
            .with_body("hello")
            .create_async()
            .await;

        let client = BackchannelBuilder::new().build().unwrap();
        let cancel = CancellationToken::new();
        let response = send(client.get(format!("{}/ok", server.url())), &cancel)
            .await
            .unwrap();
        assert_eq!(read_text(response, &cancel).await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn test_send_maps_error_status() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/denied")
            .with_status(401)
            .with_body("invalid_token")
            .create_async()
            .await;

        let client = BackchannelBuilder::new().build().unwrap();
        let result = send(
            client.get(format!("{}/denied", server.url())),
            &CancellationToken::new(),
        )
        .await;

        let err = result.unwrap_err();
        assert_eq!(err.error_kind, ErrorKind::Http(HttpErrorKind::Status(401)));
        assert!(err.to_string().contains("401"));
        assert!(!err.to_string().contains("invalid_token"));
    }

    #[tokio::test]
    async fn test_cancelled_token_aborts_call() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/slow")
            .with_status(200)
            .expect(0)
            .create_async()
            .await;

        let client = BackchannelBuilder::new().build().unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = send(client.get(format!("{}/slow", server.url())), &cancel).await;
        assert!(matches!(
            result,
            Err(Error {
                error_kind: ErrorKind::Http(HttpErrorKind::Cancelled),
                ..
            })
        ));
        mock.assert_async().await;
    }
}

//! Request plumbing shared by the provider adapters.

use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::{
    error::{Error, Result},
    provider::ProviderId,
};

/// Build a client whose every request is bounded by `timeout`.
pub fn client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| Error::Config(format!("Failed to create HTTP client: {e}")))
}

/// Send `request`, turning transport failures into provider errors.
pub(crate) async fn send(
    provider: ProviderId,
    what: &str,
    request: RequestBuilder,
) -> Result<Response> {
    tracing::debug!(%provider, what, "sending request");

    request.send().await.map_err(|e| {
        if e.is_timeout() {
            Error::Timeout { provider }
        } else {
            Error::upstream(provider, format!("failed to send {what} request: {e}"))
        }
    })
}

/// Read the body and fail unless the status is 2xx.
pub(crate) async fn success_body(
    provider: ProviderId,
    what: &str,
    res: Response,
) -> Result<Vec<u8>> {
    let status = res.status();
    let bytes = res.bytes().await.map_err(|e| {
        if e.is_timeout() {
            Error::Timeout { provider }
        } else {
            Error::upstream(provider, format!("failed to read {what} response body: {e}"))
        }
    })?;

    if !status.is_success() {
        let text = String::from_utf8_lossy(&bytes);
        return Err(Error::upstream(
            provider,
            format!("{what} request failed with status {status}: {}", truncate_body(&text)),
        ));
    }

    Ok(bytes.to_vec())
}

/// Read a 2xx body and decode it as JSON.
pub(crate) async fn success_json<T: DeserializeOwned>(
    provider: ProviderId,
    what: &str,
    res: Response,
) -> Result<T> {
    let body = success_body(provider, what, res).await?;
    serde_json::from_slice(&body)
        .map_err(|e| Error::upstream(provider, format!("failed to parse {what} JSON: {e}")))
}

/// Shorten a response body for inclusion in an error message.
pub fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

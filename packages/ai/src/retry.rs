//! HTTP retry helper for transient provider errors.
//!
//! Providers send requests through [`send_text`] instead of calling
//! `reqwest::RequestBuilder::send()` directly, so every outbound call
//! gets the same bounded-retry policy: connection failures, timeouts,
//! HTTP 429, and HTTP 5xx are retried with exponential backoff; all
//! other 4xx responses are permanent (authentication, malformed
//! request) and returned immediately.

use std::time::Duration;

use crate::AiError;

/// Maximum retry attempts for transient errors. With backoff delays of
/// 2s, 4s and 8s, a fully failing call gives up after ~14s of waiting.
const MAX_RETRIES: u32 = 3;

/// Whether an HTTP status is worth retrying.
#[must_use]
pub fn is_transient_status(status: reqwest::StatusCode) -> bool {
    status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Sends a request, retrying transient failures, and returns the final
/// status and body text.
///
/// The `build_request` closure is called on each attempt to construct a
/// fresh [`reqwest::RequestBuilder`] (builders are consumed by `send()`).
/// A non-success, non-transient status is returned to the caller as data,
/// not an error; providers decode their own error bodies.
///
/// # Errors
///
/// Returns [`AiError::Http`] when the connection still fails after all
/// retries.
pub async fn send_text<F>(build_request: F) -> Result<(reqwest::StatusCode, String), AiError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let mut attempt = 0u32;

    loop {
        let result = build_request().send().await;

        match result {
            Ok(response) => {
                let status = response.status();
                if is_transient_status(status) && attempt < MAX_RETRIES {
                    attempt += 1;
                    let delay = Duration::from_secs(1 << attempt);
                    log::warn!(
                        "Provider returned {status}, retrying in {delay:?} \
                         (attempt {attempt}/{MAX_RETRIES})"
                    );
                    tokio::time::sleep(delay).await;
                    continue;
                }

                let body = response.text().await?;
                return Ok((status, body));
            }
            Err(err) => {
                let transient = err.is_timeout() || err.is_connect() || err.is_request();
                if transient && attempt < MAX_RETRIES {
                    attempt += 1;
                    let delay = Duration::from_secs(1 << attempt);
                    log::warn!(
                        "Request failed ({err}), retrying in {delay:?} \
                         (attempt {attempt}/{MAX_RETRIES})"
                    );
                    tokio::time::sleep(delay).await;
                    continue;
                }
                return Err(AiError::Http(err));
            }
        }
    }
}

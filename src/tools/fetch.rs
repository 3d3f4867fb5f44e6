//! HTTP GET with a single fixed-delay retry.
//!
//! Only transport failures (connect errors, timeouts, dropped connections)
//! are retried. A response with any status code counts as success here; the
//! tools decide what a non-2xx status means.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

/// Default pause between the first failure and the retry.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1000);

/// Run `op`; on failure wait `delay` and run it exactly once more.
///
/// The second attempt's result is returned as-is.
pub async fn retry_once<T, E, F, Fut>(delay: Duration, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    match op().await {
        Ok(value) => Ok(value),
        Err(first) => {
            warn!(error = %first, delay_ms = delay.as_millis() as u64, "request failed, retrying once");
            sleep(delay).await;
            op().await
        }
    }
}

/// `GET url` through `http`, retried once on transport failure.
pub async fn fetch_with_retry(
    http: &reqwest::Client,
    url: &reqwest::Url,
    delay: Duration,
) -> Result<reqwest::Response, reqwest::Error> {
    retry_once(delay, || http.get(url.clone()).send()).await
}

/// Build an HTTP client with the tool timeout applied.
pub fn build_http_client(timeout: Duration) -> reqwest::Client {
    // Fall back to reqwest defaults if builder creation fails for any reason.
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

use crate::config::FetchConfig;
use crate::feed::parser::{parse_feed, ParsedFeed};
use crate::util::{validate_feed_url, UrlValidationError};
use futures::StreamExt;
use reqwest::redirect::Policy;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Redirect hops followed before giving up.
const MAX_REDIRECTS: usize = 3;

/// Errors that can occur while retrieving a submitted feed.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The link was refused before any request was made
    #[error("Invalid feed link: {0}")]
    InvalidUrl(#[from] UrlValidationError),
    /// A redirect was refused (blocked target, loop or too many hops)
    #[error("Redirect refused: {0}")]
    Redirect(String),
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Request exceeded the configured timeout
    #[error("Request timed out")]
    Timeout,
    /// Server returned 429 Too Many Requests after max retries
    #[error("Rate limited after {0} retries")]
    RateLimited(u32),
    /// Response body exceeded the configured size limit
    #[error("Response too large")]
    ResponseTooLarge,
    /// Response was incomplete (received fewer bytes than Content-Length)
    #[error("Incomplete response: expected {expected} bytes, received {received}")]
    IncompleteResponse { expected: u64, received: usize },
    /// Body could not be parsed as RSS, Atom or JSON Feed
    #[error("Parse error: {0}")]
    Parse(String),
}

/// HTTP client for pulling feeds submitted through the add form.
///
/// Clone is cheap: the inner `reqwest::Client` is reference counted.
#[derive(Clone)]
pub struct FeedClient {
    client: reqwest::Client,
    config: FetchConfig,
}

impl FeedClient {
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .redirect(redirect_policy(config.allow_private_hosts))
            .build()?;
        Ok(Self { client, config })
    }

    /// Download and parse the feed at `url`.
    ///
    /// # Behavior
    ///
    /// - 429 and 5xx responses and truncated bodies are retried with
    ///   exponential backoff, up to `max_retries` times
    /// - Other non-2xx responses fail immediately
    /// - Bodies larger than `max_feed_bytes` are rejected while streaming
    pub async fn fetch(&self, url: &str) -> Result<ParsedFeed, FetchError> {
        let url = validate_feed_url(url, self.config.allow_private_hosts)?;
        let bytes = self.fetch_bytes(url.as_str()).await?;
        parse_feed(&bytes).map_err(|e| FetchError::Parse(e.to_string()))
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let max_retries = self.config.max_retries;
        let timeout = Duration::from_secs(self.config.timeout_secs);
        let mut retry_count = 0;

        loop {
            let response = tokio::time::timeout(timeout, self.client.get(url).send())
                .await
                .map_err(|_| FetchError::Timeout)?
                .map_err(|e| {
                    if e.is_timeout() {
                        FetchError::Timeout
                    } else if e.is_redirect() {
                        FetchError::Redirect(redirect_reason(&e))
                    } else {
                        FetchError::Network(e)
                    }
                })?;

            let status = response.status();

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                if retry_count >= max_retries {
                    return Err(FetchError::RateLimited(max_retries));
                }
                let delay = self.backoff(retry_count);
                tracing::warn!(
                    feed = %url,
                    retry = retry_count,
                    delay_ms = delay.as_millis() as u64,
                    "Rate limited, backing off"
                );
                tokio::time::sleep(delay).await;
                retry_count += 1;
                continue;
            }

            if status.is_server_error() {
                if retry_count >= max_retries {
                    return Err(FetchError::HttpStatus(status.as_u16()));
                }
                let delay = self.backoff(retry_count);
                tracing::warn!(
                    feed = %url,
                    status = %status,
                    retry = retry_count,
                    delay_ms = delay.as_millis() as u64,
                    "Server error, retrying after delay"
                );
                tokio::time::sleep(delay).await;
                retry_count += 1;
                continue;
            }

            if !status.is_success() {
                return Err(FetchError::HttpStatus(status.as_u16()));
            }

            match read_limited_bytes(response, self.config.max_feed_bytes).await {
                Ok(bytes) => return Ok(bytes),
                Err(FetchError::IncompleteResponse { expected, received })
                    if retry_count < max_retries =>
                {
                    tracing::debug!(
                        feed = %url,
                        expected = expected,
                        received = received,
                        attempt = retry_count + 1,
                        "Retrying incomplete download"
                    );
                    tokio::time::sleep(self.backoff(retry_count)).await;
                    retry_count += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// `retry_delay_ms * 2^attempt`
    fn backoff(&self, attempt: u32) -> Duration {
        Duration::from_millis(
            self.config
                .retry_delay_ms
                .saturating_mul(2u64.saturating_pow(attempt)),
        )
    }
}

/// Follow at most [`MAX_REDIRECTS`] hops, refuse loops, and run every
/// target through the same URL checks as the submitted link.
fn redirect_policy(allow_private_hosts: bool) -> Policy {
    Policy::custom(move |attempt| {
        match check_redirect(attempt.url(), attempt.previous(), allow_private_hosts) {
            Ok(()) => {
                tracing::debug!(
                    from = %attempt.previous().last().map(|u| u.as_str()).unwrap_or("initial"),
                    to = %attempt.url(),
                    hop = attempt.previous().len(),
                    "Following redirect"
                );
                attempt.follow()
            }
            Err(reason) => attempt.error(reason),
        }
    })
}

/// `previous` holds the submitted URL followed by every hop already taken.
fn check_redirect(next: &Url, previous: &[Url], allow_private_hosts: bool) -> Result<(), String> {
    if previous.len() > MAX_REDIRECTS {
        return Err(format!("too many redirects (max {})", MAX_REDIRECTS));
    }
    if previous.iter().any(|prev| prev.as_str() == next.as_str()) {
        return Err("redirect loop detected".to_string());
    }
    validate_feed_url(next.as_str(), allow_private_hosts)
        .map(|_| ())
        .map_err(|e| format!("{} ({})", e, next))
}

/// Innermost message of a redirect error, without reqwest's URL prefix.
fn redirect_reason(err: &reqwest::Error) -> String {
    let mut source: &dyn std::error::Error = err;
    while let Some(inner) = source.source() {
        source = inner;
    }
    source.to_string()
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    let expected_length = response.content_length();

    if let Some(len) = expected_length {
        if len > limit as u64 {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(FetchError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    if let Some(expected) = expected_length {
        if (bytes.len() as u64) < expected {
            return Err(FetchError::IncompleteResponse {
                expected,
                received: bytes.len(),
            });
        }
    }

    Ok(bytes)
}

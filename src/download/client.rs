//! HTTP client wrapper with retry and streaming-to-disk support.
//!
//! [`HttpClient`] is created once per run and cloned into every task; the
//! clones share one connection pool.

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::{Client, Response};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::constants::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
use super::error::FetchError;
use super::retry::{RetryDecision, RetryPolicy};
use crate::user_agent::DEFAULT_USER_AGENT;

/// Transport settings for [`HttpClient`].
#[derive(Debug, Clone)]
pub struct HttpClientOptions {
    /// User-Agent header sent with every request.
    pub user_agent: String,
    /// Restrict the transport to HTTP/1.1. The comic site misbehaves over
    /// HTTP/2, so this defaults to `true`.
    pub http1_only: bool,
    /// Connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Whole-request timeout in seconds.
    pub read_timeout_secs: u64,
    /// Attempt ceiling and backoff for each fetch.
    pub retry_policy: RetryPolicy,
}

impl Default for HttpClientOptions {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            http1_only: true,
            connect_timeout_secs: CONNECT_TIMEOUT_SECS,
            read_timeout_secs: READ_TIMEOUT_SECS,
            retry_policy: RetryPolicy::default(),
        }
    }
}

/// HTTP client that retries failed GETs with exponential backoff.
///
/// # Example
///
/// ```no_run
/// use comic_crawler::download::HttpClient;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = HttpClient::new();
/// let html = client.fetch_text("https://example.com/book/499").await?;
/// let path = client
///     .download_to_file("https://example.com/1.jpg", Path::new("./comics/x"), "1.jpg")
///     .await?;
/// println!("{} bytes of html, image at {}", html.len(), path.display());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    retry_policy: RetryPolicy,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    /// Creates a client with default options.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new() -> Self {
        Self::with_options(HttpClientOptions::default())
            .expect("failed to build HTTP client with static configuration")
    }

    /// Creates a client with explicit transport and retry options.
    ///
    /// # Errors
    ///
    /// Returns the builder error if the TLS backend cannot be initialised.
    #[instrument(level = "debug", skip(options), fields(http1_only = options.http1_only))]
    pub fn with_options(options: HttpClientOptions) -> Result<Self, reqwest::Error> {
        let mut builder = Client::builder()
            .connect_timeout(Duration::from_secs(options.connect_timeout_secs))
            .timeout(Duration::from_secs(options.read_timeout_secs))
            .gzip(true)
            .user_agent(options.user_agent);
        if options.http1_only {
            builder = builder.http1_only();
        }

        Ok(Self {
            client: builder.build()?,
            retry_policy: options.retry_policy,
        })
    }

    /// Issues a GET for `url`, retrying until a success status is returned.
    ///
    /// The body of every failed attempt is dropped before the backoff sleep
    /// so its connection goes back to the pool.
    ///
    /// # Errors
    ///
    /// Returns the last [`FetchError`] once the attempt ceiling is reached,
    /// or [`FetchError::InvalidUrl`] without sending anything.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn fetch(&self, url: &str) -> Result<Response, FetchError> {
        let parsed = Url::parse(url).map_err(|_| FetchError::invalid_url(url))?;
        let mut attempt = 0u32;

        loop {
            debug!(attempt, "sending request");
            let error = match self.send_once(parsed.clone(), url).await {
                Ok(response) => return Ok(response),
                Err(error) => error,
            };

            match self.retry_policy.should_retry(&error, attempt) {
                RetryDecision::Retry {
                    delay,
                    attempt: next_attempt,
                } => {
                    warn!(
                        attempt = next_attempt,
                        max_attempts = self.retry_policy.max_attempts(),
                        delay_ms = delay.as_millis(),
                        error = %error,
                        "request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt = next_attempt;
                }
                RetryDecision::DoNotRetry { reason } => {
                    debug!(%reason, attempts = attempt + 1, "giving up");
                    return Err(error);
                }
            }
        }
    }

    /// Fetches `url` and returns the body decoded as text.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] if the fetch fails or the body cannot be read.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        let response = self.fetch(url).await?;
        response
            .text()
            .await
            .map_err(|e| FetchError::network(url, e))
    }

    /// Fetches `url` and streams the body to `dir/filename`.
    ///
    /// An existing file at that path is overwritten. A partially written file
    /// is removed when streaming fails.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] if the fetch fails, or [`FetchError::Io`] if the
    /// file cannot be created or written.
    #[instrument(skip(self, dir), fields(url = %url, filename = %filename))]
    pub async fn download_to_file(
        &self,
        url: &str,
        dir: &Path,
        filename: &str,
    ) -> Result<PathBuf, FetchError> {
        let response = self.fetch(url).await?;
        let file_path = dir.join(filename);

        let mut file = File::create(&file_path)
            .await
            .map_err(|e| FetchError::io(file_path.clone(), e))?;

        let stream_result = stream_to_file(&mut file, response, url, &file_path).await;
        if stream_result.is_err() {
            debug!(path = %file_path.display(), "cleaning up partial file after error");
            let _ = tokio::fs::remove_file(&file_path).await;
        }
        let bytes = stream_result?;

        info!(path = %file_path.display(), bytes, "saved");
        Ok(file_path)
    }

    async fn send_once(&self, url: Url, raw_url: &str) -> Result<Response, FetchError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::timeout(raw_url)
            } else {
                FetchError::network(raw_url, e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            drop(response);
            return Err(FetchError::http_status(raw_url, status.as_u16()));
        }

        Ok(response)
    }
}

/// Streams response body to file, returning bytes written.
async fn stream_to_file(
    file: &mut File,
    response: Response,
    url: &str,
    file_path: &Path,
) -> Result<u64, FetchError> {
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| FetchError::network(url, e))?;

        writer
            .write_all(&chunk)
            .await
            .map_err(|e| FetchError::io(file_path.to_path_buf(), e))?;

        bytes_written += chunk.len() as u64;
    }

    writer
        .flush()
        .await
        .map_err(|e| FetchError::io(file_path.to_path_buf(), e))?;

    Ok(bytes_written)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fast_client(max_attempts: u32) -> HttpClient {
        HttpClient::with_options(HttpClientOptions {
            retry_policy: RetryPolicy::new(max_attempts, Duration::from_millis(5)),
            ..HttpClientOptions::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_fetch_sends_browser_user_agent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/book/1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .expect(1)
            .mount(&server)
            .await;

        let client = fast_client(1);
        let body = client
            .fetch_text(&format!("{}/book/1", server.uri()))
            .await
            .unwrap();
        assert_eq!(body, "<html></html>");

        // Compared verbatim: header matchers split values on commas.
        let requests = server.received_requests().await.unwrap();
        let sent = requests[0].headers.get("user-agent").unwrap();
        assert_eq!(sent.to_str().unwrap(), DEFAULT_USER_AGENT);
    }

    #[tokio::test]
    async fn test_fetch_recovers_after_transient_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&server)
            .await;

        let client = fast_client(5);
        let body = client
            .fetch_text(&format!("{}/flaky", server.uri()))
            .await
            .unwrap();
        assert_eq!(body, "ok");
    }

    #[tokio::test]
    async fn test_fetch_exhausts_attempt_ceiling_and_returns_last_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gone"))
            .respond_with(ResponseTemplate::new(404))
            .expect(5)
            .mount(&server)
            .await;

        let client = fast_client(5);
        let result = client.fetch(&format!("{}/gone", server.uri())).await;
        assert!(
            matches!(result, Err(FetchError::HttpStatus { status: 404, .. })),
            "expected HTTP 404 after retries, got {result:?}"
        );
    }

    #[tokio::test]
    async fn test_fetch_invalid_url_is_not_retried() {
        let client = fast_client(5);
        let result = client.fetch("not a url").await;
        assert!(matches!(result, Err(FetchError::InvalidUrl { .. })));
    }

    #[tokio::test]
    async fn test_download_to_file_writes_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/img/0001.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"JPEGDATA".to_vec()))
            .mount(&server)
            .await;

        let temp_dir = TempDir::new().unwrap();
        let client = fast_client(1);
        let saved = client
            .download_to_file(
                &format!("{}/img/0001.jpg", server.uri()),
                temp_dir.path(),
                "0001.jpg",
            )
            .await
            .unwrap();

        assert_eq!(saved, temp_dir.path().join("0001.jpg"));
        assert_eq!(std::fs::read(saved).unwrap(), b"JPEGDATA");
    }

    #[tokio::test]
    async fn test_download_to_file_missing_directory_is_io_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"x".to_vec()))
            .mount(&server)
            .await;

        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("does-not-exist");
        let client = fast_client(1);
        let result = client
            .download_to_file(&format!("{}/a.jpg", server.uri()), &missing, "a.jpg")
            .await;
        assert!(matches!(result, Err(FetchError::Io { .. })));
    }
}

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};
use reqwest::header::{HeaderValue, AUTHORIZATION, USER_AGENT};
use reqwest::{Method, RequestBuilder, Response, Url};

use crate::client::LOGIN_ENDPOINT;
use crate::config::ClientConfig;
use crate::error::DocStatusError;
use crate::session::Session;

/// Requests whose path contains this marker carry the bearer token.
pub(crate) const PROTECTED_PATH_MARKER: &str = "check";

/// How many times a request is attempted and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Delay before the second attempt. Each further delay doubles.
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Exponential schedule without jitter: `base`, `2 * base`, `4 * base`, ...
    #[must_use]
    pub fn backoff(&self) -> ExponentialBuilder {
        let retries = self.max_attempts.saturating_sub(1);
        let max_delay = self
            .base_delay
            .saturating_mul(1u32 << retries.saturating_sub(1).min(16));
        ExponentialBuilder::default()
            .with_min_delay(self.base_delay)
            .with_max_delay(max_delay)
            .with_factor(2.0)
            .with_max_times(retries as usize)
    }
}

impl From<&ClientConfig> for RetryPolicy {
    fn from(config: &ClientConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            base_delay: config.backoff_base,
        }
    }
}

/// Outbound request pipeline. Sets defaults such as the connect and
/// per-attempt timeouts and the user-agent, retries transport failures with exponential backoff, and
/// attaches the session's bearer token to protected endpoints.
///
/// Retry wraps authorization: the token is read from the [`Session`] again on
/// every attempt.
pub struct Request {
    client: reqwest::Client,
    timeout: Duration,
    session: Arc<Session>,
    retry: RetryPolicy,
}

impl Request {
    /// Builds the pipeline for `config`, reading tokens from `session`.
    ///
    /// # Errors
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &ClientConfig, session: Arc<Session>) -> Result<Self, DocStatusError> {
        let builder = reqwest::Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.connect_timeout(config.connect_timeout);
        let client = builder.build().map_err(|e| DocStatusError::Network {
            url: config.base_url.clone(),
            error: format!("failed to build http client: {e}"),
        })?;

        Ok(Self {
            client,
            timeout: config.request_timeout,
            session,
            retry: RetryPolicy::from(config),
        })
    }

    /// Creates a request builder with defaults applied.
    pub(crate) fn req(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.client.request(method, url);
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.timeout(self.timeout);
        builder.header(
            USER_AGENT,
            format!("docstatus-core/{}", env!("CARGO_PKG_VERSION")),
        )
    }

    /// Creates a POST request builder with defaults applied.
    pub(crate) fn post(&self, url: Url) -> RequestBuilder {
        self.req(Method::POST, url)
    }

    /// Sends a request built by `req`/`post`.
    ///
    /// Any HTTP response, whatever its status, ends the retry loop; only
    /// failures where no response arrived are retried.
    pub(crate) async fn handle(
        &self,
        request_builder: RequestBuilder,
    ) -> Result<Response, DocStatusError> {
        let template = request_builder.build().map_err(|e| DocStatusError::Network {
            url: e
                .url()
                .map_or_else(|| "<unknown>".to_string(), ToString::to_string),
            error: format!("request build failed: {e}"),
        })?;
        let url = template.url().to_string();

        if template.try_clone().is_none() {
            return self
                .attempt(template)
                .await
                .map_err(|e| e.into_error(url, 1));
        }

        let attempts = AtomicU32::new(0);
        (|| async {
            attempts.fetch_add(1, Ordering::Relaxed);
            let request = template.try_clone().ok_or_else(|| {
                AttemptError::Permanent("request body is not cloneable".to_string())
            })?;
            self.attempt(request).await
        })
        .retry(self.retry.backoff())
        .when(AttemptError::is_transport)
        .notify(|err: &AttemptError, delay: Duration| {
            log::warn!("request to {url} failed ({err}), retrying in {delay:?}");
        })
        .await
        .map_err(|e| e.into_error(url.clone(), attempts.load(Ordering::Relaxed)))
    }

    /// One attempt: authorize, then execute.
    async fn attempt(&self, mut request: reqwest::Request) -> Result<Response, AttemptError> {
        self.authorize(&mut request)?;
        match self.client.execute(request).await {
            Ok(response) => Ok(response),
            Err(err) if err.is_builder() => {
                Err(AttemptError::Permanent(format!("request failed: {err}")))
            }
            Err(err) if err.is_timeout() => Err(AttemptError::Transport(format!(
                "no response within {:?}: {err}",
                self.timeout
            ))),
            Err(err) => Err(AttemptError::Transport(format!("connect error: {err}"))),
        }
    }

    /// Attaches `Authorization: Bearer <token>` to protected endpoints when a
    /// session is active.
    fn authorize(&self, request: &mut reqwest::Request) -> Result<(), AttemptError> {
        if !requires_auth(request.url().path()) {
            return Ok(());
        }
        let Some(bearer) = self.session.bearer_header() else {
            return Ok(());
        };
        let mut value = HeaderValue::from_str(&bearer).map_err(|e| {
            AttemptError::Permanent(format!("token is not a valid header value: {e}"))
        })?;
        value.set_sensitive(true);
        request.headers_mut().insert(AUTHORIZATION, value);
        Ok(())
    }
}

pub(crate) fn requires_auth(path: &str) -> bool {
    path.contains(PROTECTED_PATH_MARKER) && !path.ends_with(LOGIN_ENDPOINT)
}

/// Why a single attempt produced no response.
#[derive(Debug)]
enum AttemptError {
    /// Nothing came back (connect failure, timeout, reset). Worth retrying.
    Transport(String),
    /// The request itself is broken. Retrying would not help.
    Permanent(String),
}

impl AttemptError {
    const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    fn into_error(self, url: String, attempts: u32) -> DocStatusError {
        match self {
            Self::Transport(error) => DocStatusError::RetriesExhausted {
                url,
                attempts,
                error,
            },
            Self::Permanent(error) => DocStatusError::Network { url, error },
        }
    }
}

impl std::fmt::Display for AttemptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(error) | Self::Permanent(error) => f.write_str(error),
        }
    }
}

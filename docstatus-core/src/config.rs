use std::time::Duration;

use reqwest::Url;

use crate::error::DocStatusError;

/// Base URL of the production verification service.
pub const DEFAULT_BASE_URL: &str = "http://193.58.121.196/api/v1/";

/// Device description sent with a verification when the host supplies none.
pub const DEFAULT_DEVICE_INFO: &str = "Unknown Android Device";

/// Lifetime of an issued token, counted from the moment it was saved.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(30 * 60);

/// Configuration for a [`crate::DocStatusApp`] and the clients it builds.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct ClientConfig {
    /// Base URL of the API; endpoint paths are resolved against it.
    pub base_url: String,
    /// Bound on connection establishment.
    pub connect_timeout: Duration,
    /// Bound on a single attempt, from sending the request to reading the
    /// response headers. An attempt that runs out is retried like any other
    /// transport failure.
    pub request_timeout: Duration,
    /// Total number of attempts for a request that fails at the transport level.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubled for each further attempt.
    pub backoff_base: Duration,
    /// Device description attached to verifications.
    pub device_info: String,
    /// How long a verification result stays on screen before the scanner re-arms.
    pub result_dwell: Duration,
    /// How long a saved token is considered usable.
    pub token_ttl: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(10),
            max_attempts: 3,
            backoff_base: Duration::from_secs(2),
            device_info: DEFAULT_DEVICE_INFO.to_string(),
            result_dwell: Duration::from_secs(4),
            token_ttl: DEFAULT_TOKEN_TTL,
        }
    }
}

impl ClientConfig {
    /// Default configuration pointed at a different API root.
    #[must_use]
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Checks the configuration and returns the parsed base URL, always ending
    /// in `/` so relative endpoint paths resolve beneath it.
    ///
    /// # Errors
    /// Returns [`DocStatusError::InvalidInput`] if the base URL cannot be parsed
    /// or `max_attempts` or `request_timeout` is zero.
    pub fn validate(&self) -> Result<Url, DocStatusError> {
        if self.max_attempts == 0 {
            return Err(DocStatusError::InvalidInput {
                attribute: "max_attempts".to_string(),
                reason: "at least one attempt is required".to_string(),
            });
        }
        if self.request_timeout.is_zero() {
            return Err(DocStatusError::InvalidInput {
                attribute: "request_timeout".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        let mut raw = self.base_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        let url = Url::parse(&raw).map_err(|e| DocStatusError::InvalidInput {
            attribute: "base_url".to_string(),
            reason: e.to_string(),
        })?;
        if url.cannot_be_a_base() {
            return Err(DocStatusError::InvalidInput {
                attribute: "base_url".to_string(),
                reason: "URL cannot be used as a base".to_string(),
            });
        }
        Ok(url)
    }
}

/// Returns the SDK defaults, for hosts that only want to tweak a few fields.
#[uniffi::export]
#[must_use]
pub fn default_client_config() -> ClientConfig {
    ClientConfig::default()
}

//! Calls to the verification service.

use std::sync::Arc;

use reqwest::{Response, Url};
use serde::de::DeserializeOwned;

use crate::{
    config::ClientConfig,
    error::DocStatusError,
    http_request::Request,
    session::Session,
    types::{LoginResponse, VerificationRequest, VerificationResponse},
};

/// Login endpoint, relative to the base URL. Never carries a bearer token.
pub const LOGIN_ENDPOINT: &str = "auth/login";

/// Protected verification endpoint, relative to the base URL.
pub const VERIFY_ENDPOINT: &str = "verify/check";

/// Client for the login and verify-document calls.
#[derive(uniffi::Object)]
pub struct VerificationClient {
    base_url: Url,
    device_info: String,
    request: Request,
}

impl VerificationClient {
    /// Creates a client that authenticates with `session`.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be built.
    pub fn new(config: &ClientConfig, session: Arc<Session>) -> Result<Self, DocStatusError> {
        let base_url = config.validate()?;
        let request = Request::new(config, session)?;
        Ok(Self {
            base_url,
            device_info: config.device_info.clone(),
            request,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, DocStatusError> {
        self.base_url
            .join(path)
            .map_err(|e| DocStatusError::InvalidInput {
                attribute: "endpoint".to_string(),
                reason: format!("{path}: {e}"),
            })
    }
}

#[uniffi::export(async_runtime = "tokio")]
impl VerificationClient {
    /// Authenticates with username and password. Transport and server errors
    /// are returned unchanged; storing the token is up to the caller.
    ///
    /// # Errors
    /// Returns an error on network failure, a non-success status, or an
    /// unparseable body.
    pub async fn login(
        &self,
        username: String,
        password: String,
    ) -> Result<LoginResponse, DocStatusError> {
        let url = self.endpoint(LOGIN_ENDPOINT)?;
        log::debug!("logging in as {username}");
        let builder = self
            .request
            .post(url)
            .form(&[("username", username.as_str()), ("password", password.as_str())]);
        let response = self.request.handle(builder).await?;
        parse_json(response).await
    }

    /// Submits a scanned code for verification. `device_info` falls back to
    /// the configured placeholder.
    ///
    /// # Errors
    /// Returns an error on network failure, a non-success status, or an
    /// unparseable body.
    pub async fn verify(
        &self,
        code: String,
        device_info: Option<String>,
    ) -> Result<VerificationResponse, DocStatusError> {
        let url = self.endpoint(VERIFY_ENDPOINT)?;
        let body = VerificationRequest {
            qr_code_data: &code,
            device_info: Some(device_info.as_deref().unwrap_or(&self.device_info)),
        };
        let builder = self.request.post(url).json(&body);
        let response = self.request.handle(builder).await?;
        parse_json(response).await
    }
}

/// Turns a response into `T`, treating any non-success status as a rejection.
async fn parse_json<T: DeserializeOwned>(response: Response) -> Result<T, DocStatusError> {
    let status = response.status();
    let url = response.url().to_string();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("Unknown error"));
        return Err(DocStatusError::Rejected {
            url,
            status: status.as_u16(),
            body,
        });
    }

    let text = response.text().await.map_err(|e| DocStatusError::Network {
        url: url.clone(),
        error: format!("failed to read response body: {e}"),
    })?;
    serde_json::from_str(&text).map_err(|e| DocStatusError::Serialization {
        error: format!("failed to parse response from {url}: {e}"),
    })
}

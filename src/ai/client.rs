//! SiliconFlow chat-completion client
//!
//! The HTTP exchange sits behind [`Transport`] so the pipeline can run
//! against a stub in tests.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use tracing::{debug, info};
use url::Url;

use super::request::{ChatRequest, build_request};
use crate::core::ModelParams;
use crate::errors::DeobfuscateError;
use crate::response::parse_response;

/// Client-side limit for one completion; large inputs take minutes.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);

/// Status and raw body of an HTTP exchange.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// POSTs `body` as JSON to `url` with a bearer token.
    ///
    /// # Errors
    ///
    /// Returns `Transport` if the request cannot be sent or the body cannot be read.
    /// Non-success statuses are not errors here.
    async fn post_json(
        &self,
        url: &Url,
        api_key: &str,
        body: &ChatRequest,
    ) -> Result<RawResponse, DeobfuscateError>;
}

/// `reqwest`-backed transport.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self, DeobfuscateError> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            DeobfuscateError::Transport(format!("Failed to build HTTP client: {e}"))
        })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post_json(
        &self,
        url: &Url,
        api_key: &str,
        body: &ChatRequest,
    ) -> Result<RawResponse, DeobfuscateError> {
        let mut headers = HeaderMap::new();
        let auth_value = HeaderValue::from_str(&format!("Bearer {api_key}")).map_err(|e| {
            DeobfuscateError::Transport(format!("Invalid Authorization header: {e}"))
        })?;
        headers.insert(AUTHORIZATION, auth_value);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let response = self
            .client
            .post(url.clone())
            .headers(headers)
            .json(body)
            .send()
            .await
            .map_err(|e| DeobfuscateError::Transport(format!("failed to send request: {e}")))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| DeobfuscateError::Transport(format!("failed to read response: {e}")))?;

        Ok(RawResponse {
            status,
            body: body.to_vec(),
        })
    }
}

/// Deobfuscation requests against one API base with one key.
pub struct SiliconFlowClient<T> {
    transport: T,
    api_key: String,
    endpoint: Url,
}

impl<T: Transport> SiliconFlowClient<T> {
    /// # Errors
    ///
    /// Returns an error if `{api_base}/chat/completions` is not a valid URL.
    pub fn new(transport: T, api_key: String, api_base: &Url) -> Result<Self, DeobfuscateError> {
        let endpoint = chat_completions_url(api_base)?;
        Ok(Self {
            transport,
            api_key,
            endpoint,
        })
    }

    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Sends `request` and returns the raw generated text.
    ///
    /// # Errors
    ///
    /// Transport failures and API errors are returned unchanged.
    pub async fn chat(&self, request: &ChatRequest) -> Result<String, DeobfuscateError> {
        #[cfg(feature = "debug-logs")]
        debug!("Chat request: {:?}", request);

        info!(
            "Requesting completion from {} with model {}",
            self.endpoint, request.model
        );

        let raw = self
            .transport
            .post_json(&self.endpoint, &self.api_key, request)
            .await?;

        debug!("API answered with status {} ({} bytes)", raw.status, raw.body.len());
        parse_response(&raw.body, raw.status)
    }

    /// # Errors
    ///
    /// See [`SiliconFlowClient::chat`].
    pub async fn deobfuscate(
        &self,
        params: &ModelParams,
        source: &str,
    ) -> Result<String, DeobfuscateError> {
        self.chat(&build_request(params, source)).await
    }
}

/// Appends `chat/completions` to the base, keeping any path it already has.
///
/// # Errors
///
/// Returns `InvalidApiBase` if the joined URL cannot be formed.
pub fn chat_completions_url(api_base: &Url) -> Result<Url, DeobfuscateError> {
    let mut base = api_base.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join("chat/completions")
        .map_err(|e| DeobfuscateError::InvalidApiBase {
            url: api_base.to_string(),
            message: e.to_string(),
        })
}

//! A [`Facilitator`] implementation that talks to a remote x402 facilitator
//! over HTTP.
//!
//! The client posts the `{x402Version, paymentPayload, paymentRequirements}`
//! envelope to `/verify` and `/settle` and reads the capability list from
//! `GET /supported`. Anything other than HTTP 200 is a failure; the status
//! and body are preserved in the error so callers can log what the
//! facilitator actually said.
//!
//! The client is cheap to clone and internally shares a connection pool via
//! `reqwest::Client`, so a single instance is created at startup and reused
//! by every request. The connect timeout is 5 seconds; an optional read
//! timeout can be layered on with [`FacilitatorClient::with_timeout`].

use http::{HeaderMap, StatusCode};
use reqwest::Client;
use std::time::Duration;
use url::Url;

use xfunc_types::facilitator::Facilitator;
use xfunc_types::proto::SupportedResponse;
use xfunc_types::proto::v1::{FacilitatorRequest, SettleRequest, SettleResponse, VerifyResponse};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// HTTP client for a remote x402 facilitator.
#[derive(Clone, Debug)]
pub struct FacilitatorClient {
    /// Base URL of the facilitator, normalized to end in a single `/`.
    base_url: Url,
    /// Full URL for `POST /verify`.
    verify_url: Url,
    /// Full URL for `POST /settle`.
    settle_url: Url,
    /// Full URL for `GET /supported`.
    supported_url: Url,
    /// Shared reqwest HTTP client.
    client: Client,
    /// Extra headers sent with each request.
    headers: HeaderMap,
    /// Optional per-request read timeout.
    timeout: Option<Duration>,
}

/// Errors that can occur while interacting with a remote facilitator.
#[derive(Debug, thiserror::Error)]
pub enum FacilitatorClientError {
    #[error("URL parse error: {context}: {source}")]
    UrlParse {
        context: &'static str,
        #[source]
        source: url::ParseError,
    },
    #[error("failed to construct HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    #[error("HTTP error: {context}: {source}")]
    Http {
        context: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to deserialize JSON: {context}: {source}")]
    JsonDeserialization {
        context: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("unexpected HTTP status {status}: {context}: {body}")]
    HttpStatus {
        context: &'static str,
        status: StatusCode,
        body: String,
    },
    #[error("failed to read response body: {context}: {source}")]
    ResponseBodyRead {
        context: &'static str,
        #[source]
        source: reqwest::Error,
    },
}

impl FacilitatorClient {
    /// Constructs a client from an already-normalized base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if endpoint URLs cannot be derived from the base or
    /// the underlying HTTP client cannot be built.
    pub fn try_new(base_url: Url) -> Result<Self, FacilitatorClientError> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(FacilitatorClientError::ClientBuild)?;
        let verify_url =
            base_url
                .join("./verify")
                .map_err(|e| FacilitatorClientError::UrlParse {
                    context: "failed to construct ./verify URL",
                    source: e,
                })?;
        let settle_url =
            base_url
                .join("./settle")
                .map_err(|e| FacilitatorClientError::UrlParse {
                    context: "failed to construct ./settle URL",
                    source: e,
                })?;
        let supported_url =
            base_url
                .join("./supported")
                .map_err(|e| FacilitatorClientError::UrlParse {
                    context: "failed to construct ./supported URL",
                    source: e,
                })?;
        Ok(Self {
            base_url,
            verify_url,
            settle_url,
            supported_url,
            client,
            headers: HeaderMap::new(),
            timeout: None,
        })
    }

    /// Returns the base URL used by this client.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Attaches custom headers to all future requests.
    pub fn with_headers(&self, headers: HeaderMap) -> Self {
        let mut this = self.clone();
        this.headers = headers;
        this
    }

    /// Sets a read timeout for all future requests.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        let mut this = self.clone();
        this.timeout = Some(timeout);
        this
    }

    /// Generic POST helper handling JSON serialization, error mapping, and
    /// timeout application.
    ///
    /// `context` is a human-readable identifier used in error messages
    /// (e.g. `"POST /verify"`).
    async fn post_json<T, R>(
        &self,
        url: &Url,
        context: &'static str,
        payload: &T,
    ) -> Result<R, FacilitatorClientError>
    where
        T: serde::Serialize + ?Sized,
        R: serde::de::DeserializeOwned,
    {
        let mut req = self.client.post(url.clone()).json(payload);
        for (key, value) in self.headers.iter() {
            req = req.header(key, value);
        }
        if let Some(timeout) = self.timeout {
            req = req.timeout(timeout);
        }
        let http_response = req
            .send()
            .await
            .map_err(|e| FacilitatorClientError::Http { context, source: e })?;

        if http_response.status() == StatusCode::OK {
            http_response
                .json::<R>()
                .await
                .map_err(|e| FacilitatorClientError::JsonDeserialization { context, source: e })
        } else {
            let status = http_response.status();
            let body = http_response
                .text()
                .await
                .map_err(|e| FacilitatorClientError::ResponseBodyRead { context, source: e })?;
            Err(FacilitatorClientError::HttpStatus {
                context,
                status,
                body,
            })
        }
    }

    /// Generic GET helper with the same error mapping as [`Self::post_json`].
    async fn get_json<R>(
        &self,
        url: &Url,
        context: &'static str,
    ) -> Result<R, FacilitatorClientError>
    where
        R: serde::de::DeserializeOwned,
    {
        let mut req = self.client.get(url.clone());
        for (key, value) in self.headers.iter() {
            req = req.header(key, value);
        }
        if let Some(timeout) = self.timeout {
            req = req.timeout(timeout);
        }
        let http_response = req
            .send()
            .await
            .map_err(|e| FacilitatorClientError::Http { context, source: e })?;

        if http_response.status() == StatusCode::OK {
            http_response
                .json::<R>()
                .await
                .map_err(|e| FacilitatorClientError::JsonDeserialization { context, source: e })
        } else {
            let status = http_response.status();
            let body = http_response
                .text()
                .await
                .map_err(|e| FacilitatorClientError::ResponseBodyRead { context, source: e })?;
            Err(FacilitatorClientError::HttpStatus {
                context,
                status,
                body,
            })
        }
    }
}

impl Facilitator for FacilitatorClient {
    type Error = FacilitatorClientError;

    /// Sends a `POST /verify` request to the facilitator.
    async fn verify(
        &self,
        request: &FacilitatorRequest,
    ) -> Result<VerifyResponse, FacilitatorClientError> {
        let result = self
            .post_json(&self.verify_url, "POST /verify", request)
            .await;
        if let Err(err) = &result {
            tracing::error!(error = %err, "facilitator verify request failed");
        }
        result
    }

    /// Sends a `POST /settle` request to the facilitator.
    async fn settle(
        &self,
        request: &SettleRequest,
    ) -> Result<SettleResponse, FacilitatorClientError> {
        let result = self
            .post_json(&self.settle_url, "POST /settle", request)
            .await;
        if let Err(err) = &result {
            tracing::error!(error = %err, "facilitator settle request failed");
        }
        result
    }

    /// Sends a `GET /supported` request to the facilitator.
    async fn supported(&self) -> Result<SupportedResponse, FacilitatorClientError> {
        self.get_json(&self.supported_url, "GET /supported").await
    }
}

/// Parses a string URL into a client, normalizing trailing slashes once at
/// construction so endpoint joins behave predictably.
impl TryFrom<&str> for FacilitatorClient {
    type Error = FacilitatorClientError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let mut normalized = value.trim_end_matches('/').to_string();
        normalized.push('/');
        let url = Url::parse(&normalized).map_err(|e| FacilitatorClientError::UrlParse {
            context: "failed to parse base url",
            source: e,
        })?;
        FacilitatorClient::try_new(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slashes_normalize_to_one() {
        let client = FacilitatorClient::try_from("https://facilitator.example///").unwrap();
        assert_eq!(client.base_url().as_str(), "https://facilitator.example/");
        assert_eq!(
            client.verify_url.as_str(),
            "https://facilitator.example/verify"
        );
        assert_eq!(
            client.settle_url.as_str(),
            "https://facilitator.example/settle"
        );
        assert_eq!(
            client.supported_url.as_str(),
            "https://facilitator.example/supported"
        );
    }

    #[test]
    fn base_path_is_preserved() {
        let client = FacilitatorClient::try_from("https://facilitator.example/x402").unwrap();
        assert_eq!(
            client.verify_url.as_str(),
            "https://facilitator.example/x402/verify"
        );
    }

    #[test]
    fn invalid_url_is_rejected() {
        assert!(matches!(
            FacilitatorClient::try_from("not a url"),
            Err(FacilitatorClientError::UrlParse { .. })
        ));
    }
}

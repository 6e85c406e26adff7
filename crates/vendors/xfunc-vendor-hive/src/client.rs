//! HTTP client for the Hive services API.

use async_trait::async_trait;
use http::{HeaderName, HeaderValue, StatusCode};
use reqwest::Client;
use serde::de::DeserializeOwned;
use url::Url;

use xfunc_vendor::deployment::{DeploymentConfig, DeploymentStatus};
use xfunc_vendor::{DeployVendor, VendorError};

use crate::types::{CreateServiceData, CreateServiceRequest, HiveEnvelope, ServiceData};

/// Startup configuration for the Hive adapter.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HiveConfig {
    /// Base URL of the Hive API, without the account segment.
    pub base_url: Url,
    /// Account the gateway deploys into; becomes the first path segment.
    pub account: String,
    /// Name of the header carrying the API token.
    #[serde(default = "default_token_header")]
    pub token_header: String,
    /// The API token itself.
    pub token: String,
}

fn default_token_header() -> String {
    "X-Hive-Token".to_string()
}

/// Errors raised while constructing the adapter from config.
#[derive(Debug, thiserror::Error)]
pub enum HiveSetupError {
    #[error("failed to construct account root URL: {0}")]
    RootUrl(url::ParseError),
    #[error("invalid token header name {0:?}")]
    TokenHeaderName(String),
    #[error("token is not a valid header value")]
    TokenValue,
    #[error("failed to construct HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
}

/// The Hive deployment vendor.
///
/// Cheap to clone; one instance is created at startup and shared by every
/// request. All requests carry the configured token header and live under
/// `<base>/<account>/`.
#[derive(Debug, Clone)]
pub struct HiveVendor {
    root: Url,
    client: Client,
    token_header: HeaderName,
    token: HeaderValue,
}

impl HiveVendor {
    /// Builds the adapter, normalizing the account root once.
    ///
    /// # Errors
    ///
    /// Returns [`HiveSetupError`] when the root URL or token header cannot
    /// be constructed.
    pub fn try_new(config: HiveConfig) -> Result<Self, HiveSetupError> {
        let mut root = config.base_url.to_string();
        root.truncate(root.trim_end_matches('/').len());
        let root = Url::parse(&format!("{}/{}/", root, config.account.trim_matches('/')))
            .map_err(HiveSetupError::RootUrl)?;
        let token_header = config
            .token_header
            .parse::<HeaderName>()
            .map_err(|_| HiveSetupError::TokenHeaderName(config.token_header.clone()))?;
        let mut token = config
            .token
            .parse::<HeaderValue>()
            .map_err(|_| HiveSetupError::TokenValue)?;
        token.set_sensitive(true);
        let client = Client::builder()
            .build()
            .map_err(HiveSetupError::ClientBuild)?;
        Ok(Self {
            root,
            client,
            token_header,
            token,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, VendorError> {
        self.root.join(path).map_err(|err| {
            VendorError::new("BAD_URL", format!("failed to construct {path} URL: {err}"))
        })
    }

    /// Sends a request and unwraps Hive's response envelope.
    ///
    /// Non-200 statuses become a [`VendorError`] carrying the platform's
    /// `errCode`/`errMessage` when the body parses as an envelope, or an
    /// `HTTP_<status>` code otherwise. A 200 envelope is returned as-is so
    /// callers decide what a vendor-reported `success == false` means.
    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        context: &'static str,
    ) -> Result<HiveEnvelope<T>, VendorError> {
        let response = request
            .header(self.token_header.clone(), self.token.clone())
            .send()
            .await
            .map_err(|err| VendorError::new("TRANSPORT", format!("{context}: {err}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| VendorError::new("TRANSPORT", format!("{context}: {err}")))?;

        if status != StatusCode::OK {
            let envelope = serde_json::from_str::<HiveEnvelope<serde_json::Value>>(&body).ok();
            return Err(match envelope.and_then(|e| e.err_code.zip(e.err_message)) {
                Some((code, message)) => VendorError::new(code, message),
                None => VendorError::new(format!("HTTP_{}", status.as_u16()), body),
            });
        }

        serde_json::from_str::<HiveEnvelope<T>>(&body)
            .map_err(|err| VendorError::new("BAD_RESPONSE", format!("{context}: {err}")))
    }

    fn envelope_error<T>(envelope: &HiveEnvelope<T>) -> VendorError {
        VendorError::new(
            envelope
                .err_code
                .clone()
                .unwrap_or_else(|| "VENDOR_ERROR".to_string()),
            envelope
                .err_message
                .clone()
                .unwrap_or_else(|| "vendor reported failure".to_string()),
        )
    }

    async fn fetch_status(&self, path: &str, fallback_id: &str) -> Result<DeploymentStatus, VendorError> {
        let url = self.endpoint(path)?;
        let envelope: HiveEnvelope<ServiceData> =
            self.send(self.client.get(url), "GET service").await?;
        if !envelope.success {
            // Vendor-reported failure is a status, not an error.
            let error = Self::envelope_error(&envelope);
            return Ok(DeploymentStatus {
                id: fallback_id.to_string(),
                name: String::new(),
                url: None,
                ready: false,
                message: Some(error.message),
                extra: serde_json::Map::new(),
            });
        }
        let data = envelope
            .data
            .ok_or_else(|| VendorError::new("BAD_RESPONSE", "service reply without data"))?;
        Ok(data.into_status())
    }
}

#[async_trait]
impl DeployVendor for HiveVendor {
    async fn deploy(&self, config: &DeploymentConfig) -> Result<String, VendorError> {
        let url = self.endpoint("services")?;
        let request = CreateServiceRequest::from_config(config);
        tracing::debug!(service = %config.name, "deploying service to hive");
        let envelope: HiveEnvelope<CreateServiceData> = self
            .send(self.client.post(url).json(&request), "POST /services")
            .await?;
        if !envelope.success {
            return Err(VendorError::new(
                "VENDOR_ERROR",
                envelope
                    .err_message
                    .unwrap_or_else(|| "vendor reported failure".to_string()),
            ));
        }
        let data = envelope
            .data
            .ok_or_else(|| VendorError::new("BAD_RESPONSE", "create reply without data"))?;
        tracing::info!(service = %config.name, id = %data.id, "service deployed");
        Ok(data.id)
    }

    async fn status(&self, id: &str) -> Result<DeploymentStatus, VendorError> {
        self.fetch_status(&format!("services/{id}"), id).await
    }

    async fn status_by_name(&self, name: &str) -> Result<DeploymentStatus, VendorError> {
        self.fetch_status(&format!("services/name/{name}"), name)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> HiveConfig {
        HiveConfig {
            base_url: Url::parse("https://hive.example/api/").unwrap(),
            account: "acme".to_string(),
            token_header: default_token_header(),
            token: "secret".to_string(),
        }
    }

    #[test]
    fn root_includes_account_segment() {
        let vendor = HiveVendor::try_new(config()).unwrap();
        assert_eq!(vendor.root.as_str(), "https://hive.example/api/acme/");
        assert_eq!(
            vendor.endpoint("services").unwrap().as_str(),
            "https://hive.example/api/acme/services"
        );
    }

    #[test]
    fn bad_token_header_is_rejected() {
        let mut bad = config();
        bad.token_header = "not a header".to_string();
        assert!(matches!(
            HiveVendor::try_new(bad),
            Err(HiveSetupError::TokenHeaderName(_))
        ));
    }
}

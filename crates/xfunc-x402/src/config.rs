//! Configuration for the payment middleware.
//!
//! Read once at startup, immutable afterwards, shared across all requests.
//! Field defaults match the values the facilitator ecosystem ships with:
//! the `exact` scheme on `base-sepolia` paying in test USDC.

use serde::Deserialize;

/// Startup configuration for [`crate::X402Middleware`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct X402Config {
    /// Master switch. When false every protected route passes through.
    #[serde(default)]
    pub enabled: bool,
    /// x402 scheme identifier copied into every requirement.
    #[serde(default = "config_defaults::scheme")]
    pub scheme: String,
    /// Network identifier copied into every requirement.
    #[serde(default = "config_defaults::network")]
    pub network: String,
    /// Token contract address payments are denominated in.
    #[serde(default = "config_defaults::asset")]
    pub asset: String,
    /// Token decimals used for the human-to-atomic amount conversion.
    #[serde(default = "config_defaults::asset_decimals")]
    pub asset_decimals: u32,
    /// Fallback recipient address when a route does not name one.
    #[serde(default)]
    pub default_pay_to: Option<String>,
    /// Copied into every requirement's `maxTimeoutSeconds`.
    #[serde(default = "config_defaults::max_timeout_seconds")]
    pub max_timeout_seconds: u64,
    /// Optional response MIME type advertised in requirements.
    #[serde(default)]
    pub mime_type: Option<String>,
    /// Optional JSON schema advertised in requirements.
    #[serde(default)]
    pub output_schema: Option<serde_json::Value>,
    /// Optional scheme-specific extra object (e.g., an EIP-712 domain).
    #[serde(default)]
    pub extra: Option<serde_json::Value>,
    /// Base URL of the facilitator. Required when `enabled`.
    #[serde(default)]
    pub facilitator_base_url: Option<String>,
    /// External base URL of this gateway, used to build fully-qualified
    /// resource URLs. Falls back to the request's `Host` header.
    #[serde(default)]
    pub base_url: Option<String>,
}

mod config_defaults {
    pub fn scheme() -> String {
        "exact".to_string()
    }

    pub fn network() -> String {
        "base-sepolia".to_string()
    }

    /// USDC on Base Sepolia.
    pub fn asset() -> String {
        "0x036CbD53842c5426634e7929541eC2318f3dCF7e".to_string()
    }

    pub fn asset_decimals() -> u32 {
        6
    }

    pub fn max_timeout_seconds() -> u64 {
        30
    }
}

impl Default for X402Config {
    fn default() -> Self {
        Self {
            enabled: false,
            scheme: config_defaults::scheme(),
            network: config_defaults::network(),
            asset: config_defaults::asset(),
            asset_decimals: config_defaults::asset_decimals(),
            default_pay_to: None,
            max_timeout_seconds: config_defaults::max_timeout_seconds(),
            mime_type: None,
            output_schema: None,
            extra: None,
            facilitator_base_url: None,
            base_url: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_to_empty_config() {
        let config: X402Config = serde_json::from_str("{}").unwrap();
        assert!(!config.enabled);
        assert_eq!(config.scheme, "exact");
        assert_eq!(config.network, "base-sepolia");
        assert_eq!(config.asset_decimals, 6);
        assert_eq!(config.max_timeout_seconds, 30);
        assert!(config.facilitator_base_url.is_none());
    }

    #[test]
    fn camel_case_keys_parse() {
        let config: X402Config = serde_json::from_str(
            r#"{
                "enabled": true,
                "assetDecimals": 18,
                "defaultPayTo": "0xPayee",
                "maxTimeoutSeconds": 60,
                "facilitatorBaseUrl": "https://facilitator.example/"
            }"#,
        )
        .unwrap();
        assert!(config.enabled);
        assert_eq!(config.asset_decimals, 18);
        assert_eq!(config.default_pay_to.as_deref(), Some("0xPayee"));
        assert_eq!(config.max_timeout_seconds, 60);
        assert_eq!(
            config.facilitator_base_url.as_deref(),
            Some("https://facilitator.example/")
        );
    }
}

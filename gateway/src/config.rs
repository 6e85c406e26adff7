//! Configuration for the xfunc gateway.
//!
//! Read once at startup from a JSON file selected by `--config` (or the
//! `CONFIG` environment variable). Every optional key has a serde default;
//! cross-field requirements are enforced by [`Config::load`] so a bad
//! config fails boot instead of a request.

use clap::Parser;
use serde::Deserialize;
use std::fs;
use std::net::IpAddr;
use std::path::PathBuf;

use xfunc_vendor::quantity::{CpuQuantity, MemoryQuantity};
use xfunc_vendor_hive::HiveConfig;
use xfunc_x402::X402Config;

/// CLI arguments for the gateway.
#[derive(Parser, Debug)]
#[command(name = "xfunc-gateway")]
#[command(about = "xfunc deployment gateway HTTP server")]
struct CliArgs {
    /// Path to the JSON configuration file
    #[arg(long, short, env = "CONFIG", default_value = "config.json")]
    config: PathBuf,
}

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("x402.facilitatorBaseUrl is required when x402.enabled is true")]
    MissingFacilitatorUrl,
    #[error("pricing.price or pricing.priceCalculator is required when x402.enabled is true")]
    MissingPricing,
}

/// Route-level payment metadata for the deployment endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingConfig {
    /// Static human-readable price (e.g., "0.01").
    #[serde(default)]
    pub price: Option<String>,
    /// Name of a registered price calculator for dynamic pricing.
    #[serde(default)]
    pub price_calculator: Option<String>,
    /// Recipient override for the deployment route.
    #[serde(default)]
    pub pay_to: Option<String>,
    /// Shown to the payer in 402 responses.
    #[serde(default)]
    pub description: Option<String>,
}

/// Deployment defaults merged into every service the gateway creates.
///
/// Quantity strings are parsed while the config is read, so a typo here
/// stops the process at boot.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeployDefaults {
    pub cpu_request: Option<CpuQuantity>,
    pub memory_request: Option<MemoryQuantity>,
    pub cpu_limit: Option<CpuQuantity>,
    pub memory_limit: Option<MemoryQuantity>,
    pub min_scale: Option<u32>,
    pub max_scale: Option<u32>,
    pub init_scale: Option<u32>,
    pub window_scale: Option<String>,
    pub metric: Option<String>,
    pub target: Option<u32>,
    pub utilization: Option<u32>,
    pub concurrency_limit: Option<u32>,
    pub readiness_probe: Option<String>,
    pub liveness_probe: Option<String>,
    pub pvc_size: Option<MemoryQuantity>,
    pub docker_config: Option<String>,
}

/// Gateway configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "config_defaults::default_port")]
    port: u16,
    #[serde(default = "config_defaults::default_host")]
    host: IpAddr,
    #[serde(default)]
    x402: X402Config,
    hive: HiveConfig,
    #[serde(default)]
    pricing: PricingConfig,
    #[serde(default)]
    deploy: DeployDefaults,
}

mod config_defaults {
    use std::net::{IpAddr, Ipv4Addr};

    pub fn default_port() -> u16 {
        8080
    }

    pub fn default_host() -> IpAddr {
        IpAddr::V4(Ipv4Addr::UNSPECIFIED)
    }
}

impl Config {
    /// Loads the configuration from the file named on the command line.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read or parsed, or
    /// when payments are enabled without a facilitator URL or pricing.
    pub fn load() -> Result<Self, ConfigError> {
        let args = CliArgs::parse();
        Self::load_from(&args.config)
    }

    fn load_from(path: &PathBuf) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let config: Config =
            serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: path.clone(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.x402.enabled {
            if self.x402.facilitator_base_url.is_none() {
                return Err(ConfigError::MissingFacilitatorUrl);
            }
            if self.pricing.price.is_none() && self.pricing.price_calculator.is_none() {
                return Err(ConfigError::MissingPricing);
            }
        }
        Ok(())
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn host(&self) -> IpAddr {
        self.host
    }

    pub fn x402(&self) -> &X402Config {
        &self.x402
    }

    pub fn hive(&self) -> &HiveConfig {
        &self.hive
    }

    pub fn pricing(&self) -> &PricingConfig {
        &self.pricing
    }

    pub fn deploy(&self) -> &DeployDefaults {
        &self.deploy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal() -> serde_json::Value {
        serde_json::json!({
            "hive": {
                "baseUrl": "https://hive.example/api",
                "account": "acme",
                "token": "secret"
            }
        })
    }

    #[test]
    fn minimal_config_parses_with_defaults() {
        let config: Config = serde_json::from_value(minimal()).unwrap();
        config.validate().unwrap();
        assert_eq!(config.port(), 8080);
        assert!(!config.x402().enabled);
        assert_eq!(config.hive().token_header, "X-Hive-Token");
        assert!(config.deploy().cpu_request.is_none());
    }

    #[test]
    fn enabled_payments_require_facilitator_and_pricing() {
        let mut value = minimal();
        value["x402"] = serde_json::json!({ "enabled": true });
        let config: Config = serde_json::from_value(value.clone()).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingFacilitatorUrl)
        ));

        value["x402"]["facilitatorBaseUrl"] = "https://facilitator.example".into();
        let config: Config = serde_json::from_value(value.clone()).unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::MissingPricing)));

        value["pricing"] = serde_json::json!({ "price": "0.01" });
        let config: Config = serde_json::from_value(value).unwrap();
        config.validate().unwrap();
    }

    #[test]
    fn deploy_defaults_parse_quantities_at_load() {
        let mut value = minimal();
        value["deploy"] = serde_json::json!({
            "cpuRequest": "500m",
            "memoryLimit": "1Gi"
        });
        let config: Config = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(config.deploy().cpu_request.as_ref().unwrap().millis(), 500);

        value["deploy"]["cpuRequest"] = "half a core".into();
        assert!(serde_json::from_value::<Config>(value).is_err());
    }
}

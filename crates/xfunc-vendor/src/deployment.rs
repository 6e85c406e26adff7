//! Canonical, vendor-agnostic deployment model.
//!
//! A [`DeploymentConfig`] describes everything a vendor needs to build and
//! run one service: where the source lives, how to run the container, and
//! how to build it. Adapters translate this model to their platform's wire
//! schema; nothing in here is specific to any one vendor.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::quantity::{CpuQuantity, MemoryQuantity};

/// Where the service source code lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceConfig {
    /// Git repository URL.
    pub git: String,
    /// Branch to build from.
    pub branch: String,
    /// Directory within the repository containing the service.
    pub dir: String,
}

/// Runtime shape of the deployed service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunConfig {
    /// Container port the service listens on.
    pub port: u16,
    /// Environment variables injected at run time.
    #[serde(default)]
    pub envs: HashMap<String, String>,
    /// Maximum in-flight requests per replica.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concurrency_limit: Option<u32>,
    /// HTTP path probed for readiness.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readiness_probe: Option<String>,
    /// HTTP path probed for liveness.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub liveness_probe: Option<String>,
    /// Requested CPU per replica.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_request: Option<CpuQuantity>,
    /// Requested memory per replica.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_request: Option<MemoryQuantity>,
    /// CPU ceiling per replica.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_limit: Option<CpuQuantity>,
    /// Memory ceiling per replica.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_limit: Option<MemoryQuantity>,
    /// Minimum replica count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_scale: Option<u32>,
    /// Maximum replica count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_scale: Option<u32>,
    /// Replica count right after deployment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub init_scale: Option<u32>,
    /// Autoscaler observation window (e.g., "60s").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_scale: Option<String>,
    /// Autoscaling metric name (e.g., "concurrency", "rps").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric: Option<String>,
    /// Autoscaling target value for the metric.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<u32>,
    /// Target utilization percentage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utilization: Option<u32>,
    /// Size of the persistent volume claim, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pvc_size: Option<MemoryQuantity>,
}

/// Build-time configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildConfig {
    /// Registry credentials or docker config reference, vendor-defined.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docker_config: Option<String>,
    /// Environment variables injected at build time.
    #[serde(default)]
    pub build_envs: HashMap<String, String>,
}

/// The canonical deployment request handed to a [`crate::DeployVendor`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentConfig {
    /// Service name, unique within the vendor account.
    pub name: String,
    /// Source location.
    pub source: SourceConfig,
    /// Runtime shape.
    pub run: RunConfig,
    /// Build-time configuration.
    #[serde(default)]
    pub build: BuildConfig,
}

/// Best-effort view of a deployed service.
///
/// Vendor-reported failures surface here as `ready == false` plus a
/// `message`, not as errors; only transport-level failures are errors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentStatus {
    /// Vendor-assigned deployment id.
    pub id: String,
    /// Service name.
    pub name: String,
    /// Public URL, once routable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Whether the service is serving traffic.
    pub ready: bool,
    /// Human-readable state detail, populated when not ready.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Vendor-specific detail, e.g. per-component deployment states.
    #[serde(default)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

//! Service façade: validated commands in, vendor calls out.
//!
//! The façade owns request validation and the translation from the API
//! command shape to the canonical [`DeploymentConfig`], merging in the
//! configured deployment defaults. Handlers stay thin.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::LazyLock;

use regex::Regex;

use xfunc_vendor::deployment::{
    BuildConfig, DeploymentConfig, DeploymentStatus, RunConfig, SourceConfig,
};
use xfunc_vendor::quantity::{CpuQuantity, MemoryQuantity};
use xfunc_vendor::DeployVendor;

use crate::config::DeployDefaults;
use crate::error::ApiError;

static SERVICE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9\-]+$").expect("valid regex"));

const MAX_NAME_LEN: usize = 32;
const MAX_URL_LEN: usize = 2048;
const MAX_BRANCH_LEN: usize = 64;
const MAX_DIR_LEN: usize = 128;

/// Request body for `POST /apis/x402/v1/services`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateServiceCommand {
    /// Service name, unique within the vendor account.
    pub name: String,
    /// Git repository URL.
    pub url: String,
    /// Branch to build from; defaults to `main`.
    #[serde(default)]
    pub branch: Option<String>,
    /// Directory within the repository; defaults to the repository root.
    #[serde(default)]
    pub dir: Option<String>,
    /// Container port the service listens on.
    pub port: u16,
    /// Environment variables injected at run time.
    #[serde(default)]
    pub envs: HashMap<String, String>,
    /// Per-replica CPU request override (e.g., `"500m"`).
    #[serde(default)]
    pub cpu: Option<String>,
    /// Per-replica memory request override (e.g., `"256Mi"`).
    #[serde(default)]
    pub memory: Option<String>,
    /// Minimum replica count override.
    #[serde(default)]
    pub min_scale: Option<u32>,
    /// Maximum replica count override.
    #[serde(default)]
    pub max_scale: Option<u32>,
    /// Environment variables injected at build time.
    #[serde(default)]
    pub build_envs: HashMap<String, String>,
}

/// Response body for a created service.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceCreated {
    pub id: String,
    pub name: String,
}

/// Response body for a status query.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStatusDto {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "serde_json::Map::is_empty")]
    pub details: serde_json::Map<String, serde_json::Value>,
}

impl From<DeploymentStatus> for ServiceStatusDto {
    fn from(status: DeploymentStatus) -> Self {
        Self {
            id: status.id,
            name: status.name,
            url: status.url,
            ready: status.ready,
            message: status.message,
            details: status.extra,
        }
    }
}

/// Orchestrates service creation and status queries against the configured
/// vendor. Process-lived, shared across requests.
pub struct ServiceFacade {
    vendor: Arc<dyn DeployVendor>,
    defaults: DeployDefaults,
}

impl ServiceFacade {
    pub fn new(vendor: Arc<dyn DeployVendor>, defaults: DeployDefaults) -> Self {
        Self { vendor, defaults }
    }

    /// Validates the command, translates it, and deploys.
    ///
    /// # Errors
    ///
    /// [`ApiError::Validation`] for constraint failures,
    /// [`ApiError::Vendor`] when the vendor rejects the deployment.
    pub async fn create(&self, cmd: CreateServiceCommand) -> Result<ServiceCreated, ApiError> {
        validate(&cmd)?;
        let name = cmd.name.clone();
        let config = self.to_deployment_config(cmd)?;
        let id = self.vendor.deploy(&config).await?;
        Ok(ServiceCreated { id, name })
    }

    /// Fetches deployment status by vendor id.
    pub async fn status(&self, id: &str) -> Result<ServiceStatusDto, ApiError> {
        let status = self.vendor.status(id).await?;
        Ok(status.into())
    }

    /// Fetches deployment status by service name.
    pub async fn status_by_name(&self, name: &str) -> Result<ServiceStatusDto, ApiError> {
        let status = self.vendor.status_by_name(name).await?;
        Ok(status.into())
    }

    /// Builds the canonical deployment config from the command, patching the
    /// configured defaults with the command's quantity overrides.
    fn to_deployment_config(
        &self,
        cmd: CreateServiceCommand,
    ) -> Result<DeploymentConfig, ApiError> {
        let defaults = &self.defaults;
        let cpu_request = patch_cpu(defaults.cpu_request.as_ref(), cmd.cpu.as_deref())?;
        let memory_request = patch_memory(defaults.memory_request.as_ref(), cmd.memory.as_deref())?;
        Ok(DeploymentConfig {
            name: cmd.name,
            source: SourceConfig {
                git: cmd.url,
                branch: cmd.branch.unwrap_or_else(|| "main".to_string()),
                dir: cmd.dir.unwrap_or_else(|| ".".to_string()),
            },
            run: RunConfig {
                port: cmd.port,
                envs: cmd.envs,
                concurrency_limit: defaults.concurrency_limit,
                readiness_probe: defaults.readiness_probe.clone(),
                liveness_probe: defaults.liveness_probe.clone(),
                cpu_request,
                memory_request,
                cpu_limit: defaults.cpu_limit.clone(),
                memory_limit: defaults.memory_limit.clone(),
                min_scale: cmd.min_scale.or(defaults.min_scale),
                max_scale: cmd.max_scale.or(defaults.max_scale),
                init_scale: defaults.init_scale,
                window_scale: defaults.window_scale.clone(),
                metric: defaults.metric.clone(),
                target: defaults.target,
                utilization: defaults.utilization,
                pvc_size: defaults.pvc_size.clone(),
            },
            build: BuildConfig {
                docker_config: defaults.docker_config.clone(),
                build_envs: cmd.build_envs,
            },
        })
    }
}

fn patch_cpu(
    default: Option<&CpuQuantity>,
    overriding: Option<&str>,
) -> Result<Option<CpuQuantity>, ApiError> {
    match (default, overriding) {
        (Some(default), overriding) => default
            .patch(overriding)
            .map(Some)
            .map_err(|err| ApiError::validation(format!("cpu: {err}"))),
        (None, Some(raw)) if !raw.trim().is_empty() => CpuQuantity::parse(raw)
            .map(Some)
            .map_err(|err| ApiError::validation(format!("cpu: {err}"))),
        (None, _) => Ok(None),
    }
}

fn patch_memory(
    default: Option<&MemoryQuantity>,
    overriding: Option<&str>,
) -> Result<Option<MemoryQuantity>, ApiError> {
    match (default, overriding) {
        (Some(default), overriding) => default
            .patch(overriding)
            .map(Some)
            .map_err(|err| ApiError::validation(format!("memory: {err}"))),
        (None, Some(raw)) if !raw.trim().is_empty() => MemoryQuantity::parse(raw)
            .map(Some)
            .map_err(|err| ApiError::validation(format!("memory: {err}"))),
        (None, _) => Ok(None),
    }
}

fn validate(cmd: &CreateServiceCommand) -> Result<(), ApiError> {
    if cmd.name.is_empty() || cmd.name.len() > MAX_NAME_LEN || !SERVICE_NAME.is_match(&cmd.name) {
        return Err(ApiError::validation(format!(
            "name must match ^[A-Za-z0-9-]+$ and be at most {MAX_NAME_LEN} characters"
        )));
    }
    if cmd.url.trim().is_empty() || cmd.url.len() > MAX_URL_LEN {
        return Err(ApiError::validation(format!(
            "url must be non-blank and at most {MAX_URL_LEN} characters"
        )));
    }
    if let Some(branch) = &cmd.branch {
        if branch.len() > MAX_BRANCH_LEN {
            return Err(ApiError::validation(format!(
                "branch must be at most {MAX_BRANCH_LEN} characters"
            )));
        }
    }
    if let Some(dir) = &cmd.dir {
        if dir.len() > MAX_DIR_LEN {
            return Err(ApiError::validation(format!(
                "dir must be at most {MAX_DIR_LEN} characters"
            )));
        }
    }
    if cmd.port == 0 {
        return Err(ApiError::validation("port must be between 1 and 65535"));
    }
    Ok(())
}

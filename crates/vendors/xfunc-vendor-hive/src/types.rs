//! Wire types for the Hive services API.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use xfunc_vendor::deployment::{DeploymentConfig, DeploymentStatus};

/// Envelope wrapping every Hive response body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct HiveEnvelope<T> {
    pub success: bool,
    #[serde(default)]
    pub err_code: Option<String>,
    #[serde(default)]
    pub err_message: Option<String>,
    #[serde(default)]
    pub data: Option<T>,
}

/// Source block of a Hive service, always git-backed here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HiveSource {
    #[serde(rename = "type")]
    pub source_type: String,
    pub uri: String,
    pub branch: String,
    pub dir: String,
}

/// Request body for `POST /services`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateServiceRequest {
    pub name: String,
    pub source: HiveSource,
    pub port: u16,
    #[serde(default)]
    pub envs: HashMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concurrency_limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub readiness_probe: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub liveness_probe: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_request: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_request: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_limit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_limit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_scale: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_scale: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub init_scale: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_scale: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utilization: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pvc_size: Option<String>,
    #[serde(default)]
    pub build_envs: HashMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docker_config: Option<String>,
}

impl CreateServiceRequest {
    /// Translates the canonical deployment model into Hive's schema.
    ///
    /// Quantities are rendered as the raw strings the operator wrote;
    /// Hive parses them on its side.
    pub fn from_config(config: &DeploymentConfig) -> Self {
        let run = &config.run;
        Self {
            name: config.name.clone(),
            source: HiveSource {
                source_type: "GIT".to_string(),
                uri: config.source.git.clone(),
                branch: config.source.branch.clone(),
                dir: config.source.dir.clone(),
            },
            port: run.port,
            envs: run.envs.clone(),
            concurrency_limit: run.concurrency_limit,
            readiness_probe: run.readiness_probe.clone(),
            liveness_probe: run.liveness_probe.clone(),
            cpu_request: run.cpu_request.as_ref().map(ToString::to_string),
            memory_request: run.memory_request.as_ref().map(ToString::to_string),
            cpu_limit: run.cpu_limit.as_ref().map(ToString::to_string),
            memory_limit: run.memory_limit.as_ref().map(ToString::to_string),
            min_scale: run.min_scale,
            max_scale: run.max_scale,
            init_scale: run.init_scale,
            window_scale: run.window_scale.clone(),
            metric: run.metric.clone(),
            target: run.target,
            utilization: run.utilization,
            pvc_size: run.pvc_size.as_ref().map(ToString::to_string),
            build_envs: config.build.build_envs.clone(),
            docker_config: config.build.docker_config.clone(),
        }
    }
}

/// `data` member of a successful `POST /services` reply.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateServiceData {
    pub id: String,
}

/// Per-component rollout state inside a service status reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HiveComponent {
    pub name: String,
    pub state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// `data` member of a `GET /services/{id}` reply.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceData {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub ready: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub components: Vec<HiveComponent>,
}

impl ServiceData {
    /// Maps a Hive service reply into the canonical status, tucking the
    /// per-component rollout states under `extra.details`.
    pub fn into_status(self) -> DeploymentStatus {
        let mut extra = serde_json::Map::new();
        if !self.components.is_empty() {
            extra.insert(
                "details".to_string(),
                serde_json::to_value(&self.components).unwrap_or_default(),
            );
        }
        DeploymentStatus {
            id: self.id,
            name: self.name,
            url: self.url,
            ready: self.ready,
            message: self.message,
            extra,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xfunc_vendor::deployment::{BuildConfig, RunConfig, SourceConfig};
    use xfunc_vendor::quantity::{CpuQuantity, MemoryQuantity};

    #[test]
    fn translation_renders_quantities_as_written() {
        let config = DeploymentConfig {
            name: "echo".to_string(),
            source: SourceConfig {
                git: "https://github.com/acme/echo".to_string(),
                branch: "main".to_string(),
                dir: ".".to_string(),
            },
            run: RunConfig {
                port: 8080,
                cpu_request: Some(CpuQuantity::parse("500m").unwrap()),
                memory_limit: Some(MemoryQuantity::parse("1Gi").unwrap()),
                max_scale: Some(3),
                ..RunConfig::default()
            },
            build: BuildConfig::default(),
        };
        let request = CreateServiceRequest::from_config(&config);
        assert_eq!(request.source.source_type, "GIT");
        assert_eq!(request.source.uri, "https://github.com/acme/echo");
        assert_eq!(request.cpu_request.as_deref(), Some("500m"));
        assert_eq!(request.memory_limit.as_deref(), Some("1Gi"));
        assert_eq!(request.max_scale, Some(3));

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["source"]["type"], "GIT");
        assert_eq!(value["cpuRequest"], "500m");
        assert!(value.get("pvcSize").is_none());
    }

    #[test]
    fn status_mapping_collects_component_details() {
        let data = ServiceData {
            id: "svc-1".to_string(),
            name: "echo".to_string(),
            url: Some("https://echo.hive.example".to_string()),
            ready: true,
            message: None,
            components: vec![HiveComponent {
                name: "web".to_string(),
                state: "Running".to_string(),
                message: None,
            }],
        };
        let status = data.into_status();
        assert!(status.ready);
        assert_eq!(status.extra["details"][0]["state"], "Running");
    }
}

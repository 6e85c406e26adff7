//! The deployment provider interface.

use async_trait::async_trait;

use crate::deployment::{DeploymentConfig, DeploymentStatus};

/// A failure reported by (or while talking to) a deployment vendor.
///
/// `code` is the vendor's machine-readable error code where one exists,
/// otherwise a transport-derived code such as `HTTP_503`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{code}: {message}")]
pub struct VendorError {
    /// Machine-readable error code.
    pub code: String,
    /// Human-readable description.
    pub message: String,
}

impl VendorError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// A serverless platform that can deploy services from git sources.
///
/// Implementations are process-lived singletons, shared across requests,
/// and must be safe for concurrent use.
#[async_trait]
pub trait DeployVendor: Send + Sync {
    /// Deploys a service and returns the vendor-assigned id.
    ///
    /// # Errors
    ///
    /// Returns [`VendorError`] when the vendor rejects the deployment or
    /// the request cannot be delivered.
    async fn deploy(&self, config: &DeploymentConfig) -> Result<String, VendorError>;

    /// Fetches the status of a deployment by vendor id.
    ///
    /// Vendor-*reported* failures (unknown id, failed rollout) come back as
    /// a status with `ready == false` and a message; only transport-level
    /// failures are errors.
    async fn status(&self, id: &str) -> Result<DeploymentStatus, VendorError>;

    /// Fetches the status of a deployment by service name.
    ///
    /// Same failure contract as [`DeployVendor::status`].
    async fn status_by_name(&self, name: &str) -> Result<DeploymentStatus, VendorError>;
}

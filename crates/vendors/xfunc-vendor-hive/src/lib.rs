//! Hive adapter for the xfunc deployment interface.
//!
//! Hive exposes an account-scoped HTTP API: every path lives under
//! `<base>/<account>/`, authenticated by a token carried in a configurable
//! header. Responses are wrapped in a `{success, errCode, errMessage, data}`
//! envelope; HTTP-level failures reuse the same envelope when the platform
//! managed to produce one.
//!
//! This crate translates the canonical [`xfunc_vendor::DeploymentConfig`]
//! into Hive's service schema and maps Hive's replies back into
//! [`xfunc_vendor::DeploymentStatus`].

mod client;
mod types;

pub use client::{HiveConfig, HiveSetupError, HiveVendor};

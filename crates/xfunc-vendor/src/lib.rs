//! Vendor-agnostic deployment interface for the xfunc gateway.
//!
//! A *vendor* is a serverless platform that can build and run a service
//! from a git source. This crate defines the canonical deployment request
//! and status model ([`deployment`]), the resource-quantity value objects
//! that normalize CPU and memory fields ([`quantity`]), and the
//! [`DeployVendor`] trait concrete adapters implement. The Hive adapter
//! lives in `xfunc-vendor-hive`.

pub mod deployment;
pub mod quantity;
mod vendor;

pub use deployment::{
    BuildConfig, DeploymentConfig, DeploymentStatus, RunConfig, SourceConfig,
};
pub use quantity::{CpuQuantity, InvalidQuantity, MemoryQuantity};
pub use vendor::{DeployVendor, VendorError};

//! xfunc gateway HTTP entrypoint.
//!
//! This binary launches an Axum-based HTTP server that deploys serverless
//! services on a vendor platform, charging for deployments over the x402
//! payment protocol.
//!
//! Endpoints:
//! - `POST /apis/x402/v1/services` – Deploy a service (402-protected when payments are enabled)
//! - `GET /apis/x402/v1/services/{id}` – Deployment status by vendor id
//! - `GET /apis/x402/v1/services/name/{name}` – Deployment status by service name
//! - `GET /healthz` – Liveness probe
//!
//! Environment:
//! - `.env` values loaded at startup
//! - `CONFIG` selects the JSON configuration file
//! - `RUST_LOG` controls tracing verbosity

mod calculators;
mod config;
mod error;
mod handlers;
mod run;
mod service;
mod shutdown;

use std::process;

use crate::run::run;

#[tokio::main]
async fn main() {
    let result = run().await;
    if let Err(e) = result {
        eprintln!("{e}");
        process::exit(1)
    }
}

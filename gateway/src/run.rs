//! Gateway startup and wiring.
//!
//! Loads configuration, builds the vendor adapter and service façade,
//! conditionally wraps the deployment route in the payment layer, and
//! serves until a shutdown signal arrives.

use axum::Router;
use axum::http::Method;
use dotenvy::dotenv;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use xfunc_vendor_hive::HiveVendor;
use xfunc_x402::{CalculatorRegistry, PaymentTag, X402Middleware};

use crate::calculators::{DEPLOY_SIZE, DeploySizeCalculator};
use crate::config::Config;
use crate::handlers::{self, AppState};
use crate::service::ServiceFacade;
use crate::shutdown::SigDown;

/// Initializes and serves the gateway.
///
/// - Loads `.env` variables and the JSON config file.
/// - Connects the Hive vendor adapter and the facilitator client.
/// - Starts an Axum HTTP server with the deployment endpoints.
///
/// Binds to the address specified by the `host` and `port` config keys.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize rustls crypto provider (ring)
    rustls::crypto::CryptoProvider::install_default(rustls::crypto::ring::default_provider())
        .expect("Failed to initialize rustls crypto provider");

    // Load .env variables
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::load()?;

    let vendor = HiveVendor::try_new(config.hive().clone())?;
    let services = Arc::new(ServiceFacade::new(
        Arc::new(vendor),
        config.deploy().clone(),
    ));
    let state = AppState { services };

    let create = handlers::create_service_route();
    let create = if config.x402().enabled {
        let registry =
            CalculatorRegistry::new().and_register(DEPLOY_SIZE, Arc::new(DeploySizeCalculator::default()));
        let x402 = X402Middleware::from_config(config.x402().clone(), registry)?;
        let pricing = config.pricing();
        let tag = PaymentTag {
            price: pricing.price.clone(),
            pay_to: pricing.pay_to.clone(),
            description: pricing
                .description
                .clone()
                .or_else(|| Some("Deploy a service on xfunc".to_string())),
            price_calculator: pricing.price_calculator.clone(),
        };
        tracing::info!("x402 payments enabled for service deployment");
        create.layer(x402.with_payment(tag))
    } else {
        tracing::warn!("x402 payments disabled; deployments are free");
        create
    };

    let http_endpoints = Router::new()
        .merge(handlers::routes())
        .route("/apis/x402/v1/services", create)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            cors::CorsLayer::new()
                .allow_origin(cors::Any)
                .allow_methods([Method::GET, Method::POST])
                .allow_headers(cors::Any),
        );

    let addr = SocketAddr::new(config.host(), config.port());
    tracing::info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .inspect_err(|e| tracing::error!("Failed to bind to {}: {}", addr, e))?;

    let sig_down = SigDown::try_new()?;
    let cancellation_token = sig_down.cancellation_token();
    let graceful_shutdown = async move { cancellation_token.cancelled().await };
    axum::serve(listener, http_endpoints)
        .with_graceful_shutdown(graceful_shutdown)
        .await?;

    Ok(())
}

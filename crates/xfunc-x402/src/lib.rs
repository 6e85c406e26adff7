//! Axum middleware enforcing [x402](https://www.x402.org) payments on
//! protected gateway routes.
//!
//! A protected route advertises its payment terms in a `402 Payment
//! Required` response. A client retries with a payment proof in the
//! `X-PAYMENT` header; the middleware has a remote facilitator verify the
//! proof, runs the inner handler, and, only when the handler succeeded,
//! asks the facilitator to settle the payment on-chain, attaching the
//! settlement receipt to the response as `X-PAYMENT-RESPONSE`.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use axum::{Router, routing::post};
//! use axum::response::IntoResponse;
//! use http::StatusCode;
//! use xfunc_x402::{CalculatorRegistry, PaymentTag, X402Config, X402Middleware};
//!
//! let config = X402Config {
//!     enabled: true,
//!     facilitator_base_url: Some("https://facilitator.example".to_string()),
//!     default_pay_to: Some("0xADDRESS".to_string()),
//!     ..X402Config::default()
//! };
//! let x402 = X402Middleware::from_config(config, CalculatorRegistry::new()).unwrap();
//!
//! let app: Router = Router::new().route(
//!     "/deploy",
//!     post(my_handler).layer(
//!         x402.with_payment(
//!             PaymentTag::price("0.01").with_description("Deploy a service"),
//!         ),
//!     ),
//! );
//!
//! async fn my_handler() -> impl IntoResponse {
//!     (StatusCode::CREATED, "deployed")
//! }
//! ```
//!
//! ## Ordering guarantees
//!
//! For a single request, verification happens before the inner handler
//! runs, which happens before settlement. Verification and settlement are
//! each attempted at most once; there are no retries. A handler response
//! with status >= 400 is returned as-is and never settled.

pub mod config;
pub mod facilitator_client;
pub mod layer;
pub mod paygate;
pub mod pricing;

pub use config::X402Config;
pub use facilitator_client::{FacilitatorClient, FacilitatorClientError};
pub use layer::{X402Layer, X402Middleware, X402SetupError};
pub use paygate::{PaymentContext, X_PAYMENT_HEADER, X_PAYMENT_RESPONSE_HEADER};
pub use pricing::{
    CalculatorRegistry, PaymentTag, PriceCalcError, PriceCalculator, PriceError, PriceRequest,
};

//! Tower layer wiring the payment gate onto protected routes.
//!
//! A single [`X402Middleware`] is created at startup from [`X402Config`];
//! each protected route gets its own [`X402Layer`] carrying that route's
//! [`PaymentTag`]. Routes without a layer are untouched, and when the
//! config's `enabled` flag is off the layer passes every request through.

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum_core::extract::Request;
use axum_core::response::Response;
use tower::util::BoxCloneSyncService;
use tower::{Layer, Service};

use xfunc_types::facilitator::Facilitator;

use crate::config::X402Config;
use crate::facilitator_client::{FacilitatorClient, FacilitatorClientError};
use crate::paygate::Paygate;
use crate::pricing::{CalculatorRegistry, PaymentTag};

/// Errors raised while building the middleware from config.
#[derive(Debug, thiserror::Error)]
pub enum X402SetupError {
    #[error("facilitatorBaseUrl is required when x402 is enabled")]
    MissingFacilitatorUrl,
    #[error(transparent)]
    Facilitator(#[from] FacilitatorClientError),
}

/// The payment middleware for the gateway.
///
/// Create one instance per process and derive per-route layers from it with
/// [`X402Middleware::with_payment`].
pub struct X402Middleware<F> {
    facilitator: F,
    config: Arc<X402Config>,
    registry: Arc<CalculatorRegistry>,
}

impl<F: Clone> Clone for X402Middleware<F> {
    fn clone(&self) -> Self {
        Self {
            facilitator: self.facilitator.clone(),
            config: Arc::clone(&self.config),
            registry: Arc::clone(&self.registry),
        }
    }
}

impl<F: std::fmt::Debug> std::fmt::Debug for X402Middleware<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("X402Middleware")
            .field("facilitator", &self.facilitator)
            .field("config", &self.config)
            .finish()
    }
}

impl X402Middleware<Arc<FacilitatorClient>> {
    /// Builds the middleware from startup configuration, constructing the
    /// facilitator HTTP client from `facilitatorBaseUrl`.
    ///
    /// # Errors
    ///
    /// Returns [`X402SetupError::MissingFacilitatorUrl`] when no facilitator
    /// URL is configured, or a client construction error.
    pub fn from_config(
        config: X402Config,
        registry: CalculatorRegistry,
    ) -> Result<Self, X402SetupError> {
        let url = config
            .facilitator_base_url
            .as_deref()
            .ok_or(X402SetupError::MissingFacilitatorUrl)?;
        let facilitator = FacilitatorClient::try_from(url)?;
        Ok(Self::new(Arc::new(facilitator), config, registry))
    }
}

impl<F> X402Middleware<F> {
    /// Builds the middleware around an arbitrary facilitator implementation.
    pub fn new(facilitator: F, config: X402Config, registry: CalculatorRegistry) -> Self {
        Self {
            facilitator,
            config: Arc::new(config),
            registry: Arc::new(registry),
        }
    }

    /// Returns a reference to the underlying facilitator.
    pub const fn facilitator(&self) -> &F {
        &self.facilitator
    }
}

impl<F> X402Middleware<F>
where
    F: Clone,
{
    /// Derives the layer for one protected route from its payment metadata.
    #[must_use]
    pub fn with_payment(&self, tag: PaymentTag) -> X402Layer<F> {
        X402Layer {
            facilitator: self.facilitator.clone(),
            config: Arc::clone(&self.config),
            registry: Arc::clone(&self.registry),
            tag: Arc::new(tag),
        }
    }
}

/// Tower layer for one protected route.
#[derive(Clone)]
pub struct X402Layer<F> {
    facilitator: F,
    config: Arc<X402Config>,
    registry: Arc<CalculatorRegistry>,
    tag: Arc<PaymentTag>,
}

impl<S, F> Layer<S> for X402Layer<F>
where
    S: Service<Request, Response = Response, Error = Infallible> + Clone + Send + Sync + 'static,
    S::Future: Send + 'static,
    F: Facilitator + Clone,
{
    type Service = X402PaymentService<F>;

    fn layer(&self, inner: S) -> Self::Service {
        X402PaymentService {
            facilitator: self.facilitator.clone(),
            config: Arc::clone(&self.config),
            registry: Arc::clone(&self.registry),
            tag: Arc::clone(&self.tag),
            inner: BoxCloneSyncService::new(inner),
        }
    }
}

/// Service enforcing x402 payment on one route.
#[derive(Clone)]
pub struct X402PaymentService<F> {
    facilitator: F,
    config: Arc<X402Config>,
    registry: Arc<CalculatorRegistry>,
    tag: Arc<PaymentTag>,
    inner: BoxCloneSyncService<Request, Response, Infallible>,
}

impl<F> Service<Request> for X402PaymentService<F>
where
    F: Facilitator + Clone + Send + Sync + 'static,
{
    type Response = Response;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Response, Infallible>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let facilitator = self.facilitator.clone();
        let config = Arc::clone(&self.config);
        let registry = Arc::clone(&self.registry);
        let tag = Arc::clone(&self.tag);
        let mut inner = self.inner.clone();

        Box::pin(async move {
            if !config.enabled {
                return inner.call(req).await;
            }
            let gate = Paygate {
                facilitator,
                config,
                registry,
                tag,
            };
            gate.handle_request(inner, req).await
        })
    }
}

//! HTTP endpoints of the xfunc gateway.
//!
//! Handlers are thin: deserialize, delegate to the [`ServiceFacade`], wrap
//! the result in the `{ "data": ... }` envelope. Error mapping lives on
//! [`crate::error::ApiError`].

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tracing::instrument;

use xfunc_x402::PaymentContext;

use crate::error::ApiError;
use crate::service::{CreateServiceCommand, ServiceFacade};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub services: Arc<ServiceFacade>,
}

/// Success envelope wrapping every response body.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

/// Routes that are not payment-protected. The deployment route is added by
/// the caller so the payment layer can be attached conditionally.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/apis/x402/v1/services/{id}", get(get_service))
        .route("/apis/x402/v1/services/name/{name}", get(get_service_by_name))
}

/// The payment-protected deployment handler, mounted by the caller.
pub fn create_service_route() -> axum::routing::MethodRouter<AppState> {
    post(create_service)
}

/// `GET /healthz`: liveness probe.
#[instrument(skip_all)]
async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, format!("{} ok", env!("CARGO_PKG_NAME")))
}

/// `POST /apis/x402/v1/services`: deploy a service.
#[instrument(skip_all)]
async fn create_service(
    State(state): State<AppState>,
    payment: Option<Extension<PaymentContext>>,
    Json(cmd): Json<CreateServiceCommand>,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(Extension(context)) = &payment {
        tracing::info!(service = %cmd.name, payer = %context.payer, "deployment paid");
    }
    let created = state.services.create(cmd).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse { data: created })))
}

/// `GET /apis/x402/v1/services/{id}`: deployment status by vendor id.
#[instrument(skip_all)]
async fn get_service(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let status = state.services.status(&id).await?;
    Ok(Json(ApiResponse { data: status }))
}

/// `GET /apis/x402/v1/services/name/{name}`: deployment status by name.
#[instrument(skip_all)]
async fn get_service_by_name(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let status = state.services.status_by_name(&name).await?;
    Ok(Json(ApiResponse { data: status }))
}

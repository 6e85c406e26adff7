//! The payment gate wrapping each protected route.
//!
//! For one request the gate walks a fixed sequence: build the payment
//! requirements, gate on the `X-PAYMENT` header, have the facilitator
//! verify the proof, run the inner handler, and settle. Settlement only
//! happens when the handler produced a success status, and is attempted at
//! most once; a failed settlement replaces the handler's response with a
//! 402. Responses are plain values until this middleware returns, so the
//! replacement always succeeds: there is no "already committed" window in
//! this stack.

use axum_core::body::Body;
use axum_core::extract::Request;
use axum_core::response::Response;
use http::{HeaderValue, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::json;
use std::convert::Infallible;
use std::sync::Arc;
use tower::Service;
use tower::util::BoxCloneSyncService;
use url::Url;

use xfunc_types::facilitator::Facilitator;
use xfunc_types::proto::v1::{
    FacilitatorRequest, PaymentPayload, PaymentRequired, PaymentRequirements, SettleResponse,
    SettlementResponseHeader, VerifyResponse, X402Version1,
};

use crate::config::X402Config;
use crate::pricing::{self, CalculatorRegistry, PaymentTag, PriceRequest};

/// Request header carrying the client's payment proof.
pub const X_PAYMENT_HEADER: &str = "X-PAYMENT";
/// Response header carrying the settlement receipt.
pub const X_PAYMENT_RESPONSE_HEADER: &str = "X-PAYMENT-RESPONSE";

/// Per-request payment state, inserted into request extensions after
/// verification passes so handlers can see who is paying.
#[derive(Debug, Clone)]
pub struct PaymentContext {
    /// The requirements the payment was verified against.
    pub requirements: PaymentRequirements,
    /// The raw `X-PAYMENT` header value.
    pub header: String,
    /// The decoded payment proof.
    pub payload: PaymentPayload,
    /// The payer address reported by the facilitator.
    pub payer: String,
}

/// One request's trip through the payment state machine.
pub struct Paygate<F> {
    pub facilitator: F,
    pub config: Arc<X402Config>,
    pub registry: Arc<CalculatorRegistry>,
    pub tag: Arc<PaymentTag>,
}

impl<F> Paygate<F>
where
    F: Facilitator,
{
    /// Runs the payment state machine around the inner service.
    pub async fn handle_request(
        self,
        mut inner: BoxCloneSyncService<Request, Response, Infallible>,
        req: Request,
    ) -> Result<Response, Infallible> {
        // A body-reading calculator would exhaust the stream before the
        // handler runs, so calculator routes buffer the body up front and
        // hand the handler a replayed copy. Static-price routes skip this.
        let (mut req, buffered) = if self.tag.price.is_none() && self.tag.price_calculator.is_some()
        {
            let (parts, body) = req.into_parts();
            let bytes = match body.collect().await {
                Ok(collected) => collected.to_bytes(),
                Err(err) => {
                    return Ok(internal_error(format!("failed to read request body: {err}")));
                }
            };
            let req = Request::from_parts(parts, Body::from(bytes.clone()));
            (req, Some(bytes))
        } else {
            (req, None)
        };

        let amount = {
            let price_request = PriceRequest {
                method: req.method(),
                uri: req.uri(),
                headers: req.headers(),
                body: buffered.as_deref().unwrap_or(&[]),
            };
            match pricing::resolve_amount(
                &self.tag,
                &self.registry,
                self.config.asset_decimals,
                &price_request,
            ) {
                Ok(amount) => amount,
                Err(err) => {
                    tracing::error!(error = %err, "price resolution failed");
                    return Ok(internal_error(err.to_string()));
                }
            }
        };

        let requirements = self.build_requirements(&req, amount);

        let header = match req
            .headers()
            .get(X_PAYMENT_HEADER)
            .map(|value| value.to_str())
        {
            None => {
                tracing::debug!(resource = %requirements.resource, "payment header missing");
                return Ok(payment_required(
                    &requirements,
                    "X-PAYMENT header is required",
                ));
            }
            Some(Ok(value)) if value.trim().is_empty() => {
                return Ok(payment_required(
                    &requirements,
                    "X-PAYMENT header is required",
                ));
            }
            Some(Ok(value)) => value.to_string(),
            Some(Err(_)) => {
                return Ok(payment_required(&requirements, "malformed X-PAYMENT header"));
            }
        };

        let payload = match PaymentPayload::from_header(&header) {
            Ok(payload) => payload,
            Err(err) => {
                tracing::debug!(error = %err, "payment header failed to decode");
                return Ok(payment_required(&requirements, "malformed X-PAYMENT header"));
            }
        };

        if payload.scheme != requirements.scheme || payload.network != requirements.network {
            return Ok(payment_required(
                &requirements,
                "unable to match payment to requirements",
            ));
        }

        let facilitator_request = FacilitatorRequest {
            x402_version: X402Version1,
            payment_payload: payload.clone(),
            payment_requirements: requirements.clone(),
        };

        let payer = match self.facilitator.verify(&facilitator_request).await {
            Ok(VerifyResponse::Valid { payer }) => payer,
            Ok(VerifyResponse::Invalid { reason, payer }) => {
                tracing::info!(reason = %reason, payer = ?payer, "payment verification rejected");
                return Ok(payment_required(&requirements, reason));
            }
            Err(err) => {
                tracing::error!(error = %err, "payment verification unavailable");
                return Ok(internal_error(format!(
                    "payment verification unavailable: {err}"
                )));
            }
        };

        req.extensions_mut().insert(PaymentContext {
            requirements: requirements.clone(),
            header,
            payload,
            payer,
        });

        let response = inner.call(req).await?;

        // Client and server errors from the handler are returned as-is;
        // the payment is never settled for them.
        if response.status().is_client_error() || response.status().is_server_error() {
            return Ok(response);
        }

        match self.facilitator.settle(&facilitator_request).await {
            Ok(SettleResponse::Success {
                transaction,
                network,
                payer,
            }) => {
                tracing::info!(transaction = %transaction, network = %network, "payment settled");
                let receipt = SettlementResponseHeader::new(
                    Some(transaction),
                    Some(network),
                    payer,
                );
                Ok(attach_receipt(response, &receipt))
            }
            Ok(SettleResponse::Error { reason, network }) => {
                tracing::warn!(reason = %reason, network = %network, "payment settlement rejected");
                Ok(payment_required(&requirements, reason))
            }
            Err(err) => {
                tracing::error!(error = %err, "payment settlement failed");
                Ok(payment_required(
                    &requirements,
                    format!("settlement error: {err}"),
                ))
            }
        }
    }

    /// Builds the payment requirements for this request from the route tag
    /// and the startup config. The `resource` is the fully-qualified URL of
    /// the request as observed right now.
    fn build_requirements(&self, req: &Request, amount: String) -> PaymentRequirements {
        PaymentRequirements {
            scheme: self.config.scheme.clone(),
            network: self.config.network.clone(),
            max_amount_required: amount,
            resource: resource_url(&self.config, req),
            description: self.tag.description.clone().unwrap_or_default(),
            mime_type: self.config.mime_type.clone(),
            output_schema: self.config.output_schema.clone(),
            pay_to: self
                .tag
                .pay_to
                .clone()
                .or_else(|| self.config.default_pay_to.clone())
                .unwrap_or_default(),
            max_timeout_seconds: self.config.max_timeout_seconds,
            asset: self.config.asset.clone(),
            extra: self.config.extra.clone(),
        }
    }
}

/// Computes the fully-qualified URL of the current request.
///
/// Uses the configured external base URL when set, otherwise reconstructs
/// an origin from the request's `Host` header.
fn resource_url(config: &X402Config, req: &Request) -> String {
    let base = config
        .base_url
        .as_deref()
        .and_then(|base| Url::parse(base).ok())
        .unwrap_or_else(|| {
            let host = req
                .headers()
                .get(header::HOST)
                .and_then(|value| value.to_str().ok())
                .unwrap_or("localhost");
            Url::parse(&format!("http://{host}"))
                .unwrap_or_else(|_| Url::parse("http://localhost").expect("valid url"))
        });
    let mut url = base;
    url.set_path(req.uri().path());
    url.set_query(req.uri().query());
    url.to_string()
}

/// Builds the 402 response advertising the payment requirements.
fn payment_required(requirements: &PaymentRequirements, error: impl Into<String>) -> Response {
    let body = PaymentRequired {
        x402_version: X402Version1,
        accepts: vec![requirements.clone()],
        error: Some(error.into()),
    };
    let bytes = serde_json::to_vec(&body).expect("PaymentRequired serialization failed");
    Response::builder()
        .status(StatusCode::PAYMENT_REQUIRED)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(bytes))
        .expect("failed to construct 402 response")
}

/// Builds a 500 response for gateway-side failures.
fn internal_error(message: impl Into<String>) -> Response {
    let body = json!({ "error": message.into() }).to_string();
    Response::builder()
        .status(StatusCode::INTERNAL_SERVER_ERROR)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .expect("failed to construct 500 response")
}

/// Attaches the settlement receipt headers to a successful response.
fn attach_receipt(mut response: Response, receipt: &SettlementResponseHeader) -> Response {
    match HeaderValue::from_str(&receipt.to_header()) {
        Ok(value) => {
            response
                .headers_mut()
                .insert(X_PAYMENT_RESPONSE_HEADER, value);
            response.headers_mut().append(
                header::ACCESS_CONTROL_EXPOSE_HEADERS,
                HeaderValue::from_static(X_PAYMENT_RESPONSE_HEADER),
            );
        }
        Err(err) => {
            // Unreachable for standard Base64 output.
            tracing::warn!(error = %err, "failed to attach settlement receipt header");
        }
    }
    response
}

//! Price calculators shipped with the gateway.

use serde_json::Value;

use xfunc_x402::{PriceCalcError, PriceCalculator, PriceRequest};

/// Registry name of [`DeploySizeCalculator`].
pub const DEPLOY_SIZE: &str = "deploy-size";

/// Prices a deployment by its requested maximum scale.
///
/// Reads the buffered create-service body and charges `base_cents` per
/// replica of `maxScale` (at least one). A body that is not a service
/// command is a calculator failure, surfaced as 500.
pub struct DeploySizeCalculator {
    base_cents: u64,
}

impl DeploySizeCalculator {
    pub fn new(base_cents: u64) -> Self {
        Self { base_cents }
    }
}

impl Default for DeploySizeCalculator {
    fn default() -> Self {
        // One cent per replica.
        Self::new(1)
    }
}

impl PriceCalculator for DeploySizeCalculator {
    fn calculate_price(&self, request: &PriceRequest<'_>) -> Result<String, PriceCalcError> {
        let body: Value = serde_json::from_slice(request.body)
            .map_err(|err| PriceCalcError(format!("unreadable service command: {err}")))?;
        let replicas = body
            .get("maxScale")
            .and_then(Value::as_u64)
            .unwrap_or(1)
            .max(1);
        let cents = self.base_cents.saturating_mul(replicas);
        Ok(format!("{}.{:02}", cents / 100, cents % 100))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, Method, Uri};

    fn price_for(body: &str) -> String {
        let method = Method::POST;
        let uri = Uri::from_static("/apis/x402/v1/services");
        let headers = HeaderMap::new();
        DeploySizeCalculator::default()
            .calculate_price(&PriceRequest {
                method: &method,
                uri: &uri,
                headers: &headers,
                body: body.as_bytes(),
            })
            .unwrap()
    }

    #[test]
    fn scales_price_with_max_scale() {
        assert_eq!(price_for(r#"{"name":"echo","maxScale":3}"#), "0.03");
        assert_eq!(price_for(r#"{"name":"echo"}"#), "0.01");
        assert_eq!(price_for(r#"{"name":"echo","maxScale":150}"#), "1.50");
    }

    #[test]
    fn rejects_unreadable_body() {
        let method = Method::POST;
        let uri = Uri::from_static("/apis/x402/v1/services");
        let headers = HeaderMap::new();
        let err = DeploySizeCalculator::default()
            .calculate_price(&PriceRequest {
                method: &method,
                uri: &uri,
                headers: &headers,
                body: b"not json",
            })
            .unwrap_err();
        assert!(err.to_string().contains("unreadable service command"));
    }
}

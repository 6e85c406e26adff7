//! Price resolution for protected routes.
//!
//! A route's payment metadata ([`PaymentTag`]) carries either a static
//! human-readable price or the name of a [`PriceCalculator`] registered at
//! wiring time. [`resolve_amount`] turns either into the atomic-unit amount
//! string that goes on the wire in `maxAmountRequired`.

use std::collections::HashMap;
use std::sync::Arc;

use http::{HeaderMap, Method, Uri};
use xfunc_types::util::{MoneyAmount, MoneyAmountParseError};

/// Per-route payment metadata, attached where the route is registered.
///
/// `price` and `price_calculator` are mutually exclusive inputs to price
/// resolution; a static `price` wins when both are set.
#[derive(Debug, Clone, Default)]
pub struct PaymentTag {
    /// Static human-readable price (e.g., `"0.01"`).
    pub price: Option<String>,
    /// Recipient address override for this route.
    pub pay_to: Option<String>,
    /// What the payment buys, shown to the payer in 402 responses.
    pub description: Option<String>,
    /// Name of a registered [`PriceCalculator`] for dynamic pricing.
    pub price_calculator: Option<String>,
}

impl PaymentTag {
    /// Tag with a static human-readable price.
    pub fn price(price: impl Into<String>) -> Self {
        Self {
            price: Some(price.into()),
            ..Self::default()
        }
    }

    /// Tag priced by a calculator registered under `name`.
    pub fn calculator(name: impl Into<String>) -> Self {
        Self {
            price_calculator: Some(name.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_pay_to(mut self, pay_to: impl Into<String>) -> Self {
        self.pay_to = Some(pay_to.into());
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// The request view handed to a [`PriceCalculator`].
///
/// The body is the buffered request body; it is only populated for routes
/// whose tag names a calculator (static-price routes are never buffered).
#[derive(Debug)]
pub struct PriceRequest<'a> {
    pub method: &'a Method,
    pub uri: &'a Uri,
    pub headers: &'a HeaderMap,
    pub body: &'a [u8],
}

/// A calculator failure, surfaced to the client as a 500.
#[derive(Debug, thiserror::Error)]
#[error("price calculator failed: {0}")]
pub struct PriceCalcError(pub String);

/// Computes a human-readable price for a request.
///
/// Implementations are pure functions of the request: no state, safe for
/// concurrent use. They may read any part of the request including the
/// buffered body.
pub trait PriceCalculator: Send + Sync {
    /// Returns a human-readable amount string (e.g., `"0.03"`).
    ///
    /// # Errors
    ///
    /// Returns [`PriceCalcError`] when a price cannot be computed from this
    /// request.
    fn calculate_price(&self, request: &PriceRequest<'_>) -> Result<String, PriceCalcError>;
}

/// Name-to-calculator registry, populated at wiring time and immutable
/// afterwards.
#[derive(Clone, Default)]
pub struct CalculatorRegistry {
    inner: HashMap<String, Arc<dyn PriceCalculator>>,
}

impl CalculatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a calculator under `name`, replacing any previous entry.
    #[must_use]
    pub fn and_register(
        mut self,
        name: impl Into<String>,
        calculator: Arc<dyn PriceCalculator>,
    ) -> Self {
        self.inner.insert(name.into(), calculator);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn PriceCalculator>> {
        self.inner.get(name)
    }
}

impl std::fmt::Debug for CalculatorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CalculatorRegistry")
            .field("names", &self.inner.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Errors raised while resolving the price of a request.
///
/// All of these indicate gateway-side misconfiguration or calculator
/// failure, not client mistakes, and surface as 500.
#[derive(Debug, thiserror::Error)]
pub enum PriceError {
    #[error("no price configured for paid route")]
    Missing,
    #[error("unknown price calculator: {0:?}")]
    UnknownCalculator(String),
    #[error(transparent)]
    Calculator(#[from] PriceCalcError),
    #[error("invalid price amount: {0}")]
    Amount(#[from] MoneyAmountParseError),
}

/// Resolves the atomic-unit amount for a request against its payment tag.
///
/// A non-empty static `price` takes precedence; otherwise the named
/// calculator runs. The human-readable result is converted with
/// `floor(amount × 10^decimals)` and emitted as a plain decimal string.
///
/// # Errors
///
/// [`PriceError::Missing`] when neither path yields a non-empty amount,
/// [`PriceError::UnknownCalculator`] for an unregistered reference, and
/// calculator or conversion failures otherwise.
pub fn resolve_amount(
    tag: &PaymentTag,
    registry: &CalculatorRegistry,
    decimals: u32,
    request: &PriceRequest<'_>,
) -> Result<String, PriceError> {
    let human = match tag.price.as_deref().map(str::trim) {
        Some(price) if !price.is_empty() => price.to_string(),
        _ => match tag.price_calculator.as_deref() {
            Some(reference) => {
                let calculator = registry
                    .get(reference)
                    .ok_or_else(|| PriceError::UnknownCalculator(reference.to_string()))?;
                calculator.calculate_price(request)?
            }
            None => String::new(),
        },
    };
    if human.trim().is_empty() {
        return Err(PriceError::Missing);
    }
    let amount = MoneyAmount::parse(&human)?;
    Ok(amount.atomic(decimals)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_parts() -> (Method, Uri, HeaderMap) {
        (Method::GET, Uri::from_static("/pay"), HeaderMap::new())
    }

    struct FixedPrice(&'static str);

    impl PriceCalculator for FixedPrice {
        fn calculate_price(&self, _request: &PriceRequest<'_>) -> Result<String, PriceCalcError> {
            Ok(self.0.to_string())
        }
    }

    struct Failing;

    impl PriceCalculator for Failing {
        fn calculate_price(&self, _request: &PriceRequest<'_>) -> Result<String, PriceCalcError> {
            Err(PriceCalcError("boom".to_string()))
        }
    }

    #[test]
    fn static_price_converts_to_atomic_units() {
        let (method, uri, headers) = request_parts();
        let request = PriceRequest {
            method: &method,
            uri: &uri,
            headers: &headers,
            body: &[],
        };
        let amount = resolve_amount(
            &PaymentTag::price("0.01"),
            &CalculatorRegistry::new(),
            6,
            &request,
        )
        .unwrap();
        assert_eq!(amount, "10000");
    }

    #[test]
    fn static_price_wins_over_calculator() {
        let (method, uri, headers) = request_parts();
        let request = PriceRequest {
            method: &method,
            uri: &uri,
            headers: &headers,
            body: &[],
        };
        let registry =
            CalculatorRegistry::new().and_register("fixed", Arc::new(FixedPrice("9.99")));
        let mut tag = PaymentTag::price("0.5");
        tag.price_calculator = Some("fixed".to_string());
        assert_eq!(resolve_amount(&tag, &registry, 6, &request).unwrap(), "500000");
    }

    #[test]
    fn calculator_path_resolves() {
        let (method, uri, headers) = request_parts();
        let request = PriceRequest {
            method: &method,
            uri: &uri,
            headers: &headers,
            body: &[],
        };
        let registry =
            CalculatorRegistry::new().and_register("fixed", Arc::new(FixedPrice("0.03")));
        assert_eq!(
            resolve_amount(&PaymentTag::calculator("fixed"), &registry, 6, &request).unwrap(),
            "30000"
        );
    }

    #[test]
    fn missing_and_unknown_configurations_fail() {
        let (method, uri, headers) = request_parts();
        let request = PriceRequest {
            method: &method,
            uri: &uri,
            headers: &headers,
            body: &[],
        };
        assert!(matches!(
            resolve_amount(&PaymentTag::default(), &CalculatorRegistry::new(), 6, &request),
            Err(PriceError::Missing)
        ));
        assert!(matches!(
            resolve_amount(
                &PaymentTag::calculator("nope"),
                &CalculatorRegistry::new(),
                6,
                &request
            ),
            Err(PriceError::UnknownCalculator(_))
        ));
        let registry = CalculatorRegistry::new().and_register("boom", Arc::new(Failing));
        assert!(matches!(
            resolve_amount(&PaymentTag::calculator("boom"), &registry, 6, &request),
            Err(PriceError::Calculator(_))
        ));
    }
}

//! Wire format types for x402 protocol version 1.
//!
//! Version 1 identifies chains by network name (e.g., "base-sepolia") and
//! carries payment proofs Base64-encoded in the `X-PAYMENT` request header.
//!
//! # Key Types
//!
//! - [`X402Version1`] - Version marker that serializes as the integer `1`
//! - [`PaymentRequirements`] - Payment terms offered by the gateway
//! - [`PaymentPayload`] - The client's proof-of-payment envelope
//! - [`PaymentRequired`] - HTTP 402 response body
//! - [`FacilitatorRequest`] - Envelope for `/verify` and `/settle`
//! - [`VerifyResponse`] / [`SettleResponse`] - Facilitator replies
//! - [`SettlementResponseHeader`] - Receipt emitted in `X-PAYMENT-RESPONSE`

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fmt::Display;

/// Version marker for x402 protocol version 1.
///
/// Serializes as the integer `1`. Deserialization of any other value fails,
/// so a payload claiming an unsupported protocol version is rejected while
/// still inside the decode step.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct X402Version1;

impl X402Version1 {
    pub const VALUE: u8 = 1;
}

impl Serialize for X402Version1 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(Self::VALUE)
    }
}

impl<'de> Deserialize<'de> for X402Version1 {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let num = u8::deserialize(deserializer)?;
        if num == Self::VALUE {
            Ok(X402Version1)
        } else {
            Err(serde::de::Error::custom(format!(
                "expected version {}, got {}",
                Self::VALUE,
                num
            )))
        }
    }
}

impl Display for X402Version1 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Self::VALUE)
    }
}

/// Payment terms offered by the gateway for one protected resource.
///
/// Built per request and returned inside [`PaymentRequired`]. The
/// `max_amount_required` is a decimal string in atomic token units; the
/// `resource` is the fully-qualified URL of the request being paid for.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequirements {
    /// The payment scheme (e.g., "exact").
    pub scheme: String,
    /// The network name (e.g., "base-sepolia").
    pub network: String,
    /// The required amount, in atomic token units, as a decimal string.
    pub max_amount_required: String,
    /// The resource URL being paid for.
    pub resource: String,
    /// Human-readable description of the resource.
    pub description: String,
    /// MIME type of the resource response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// Optional JSON schema describing the resource output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<serde_json::Value>,
    /// The recipient address for payment.
    pub pay_to: String,
    /// Maximum time in seconds for the facilitator to finalize payment.
    pub max_timeout_seconds: u64,
    /// The token asset address.
    pub asset: String,
    /// Scheme-specific extra data (e.g., an EIP-712 domain).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<serde_json::Value>,
}

/// Errors raised while decoding the `X-PAYMENT` request header.
#[derive(Debug, thiserror::Error)]
pub enum PaymentHeaderError {
    /// The header value is not valid standard Base64.
    #[error("invalid base64 in payment header: {0}")]
    MalformedHeader(#[from] base64::DecodeError),
    /// The decoded bytes are not the expected JSON shape.
    #[error("invalid payment payload: {0}")]
    DecodeError(#[from] serde_json::Error),
}

/// The client's proof-of-payment envelope.
///
/// The `payload` member is scheme-specific and opaque to the gateway; only
/// the facilitator inspects it. On the wire the whole structure is UTF-8
/// JSON, Base64-encoded, carried in the `X-PAYMENT` request header.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPayload {
    /// Protocol version (always 1).
    pub x402_version: X402Version1,
    /// The payment scheme (e.g., "exact").
    pub scheme: String,
    /// The network name (e.g., "base-sepolia").
    pub network: String,
    /// The scheme-specific signed payload, never inspected by the gateway.
    pub payload: serde_json::Value,
}

impl PaymentPayload {
    /// Decodes a payload from an `X-PAYMENT` header value.
    ///
    /// # Errors
    ///
    /// [`PaymentHeaderError::MalformedHeader`] if the value is not valid
    /// Base64, [`PaymentHeaderError::DecodeError`] if the decoded bytes are
    /// not valid JSON for this shape (including a wrong `x402Version`).
    pub fn from_header(header: &str) -> Result<Self, PaymentHeaderError> {
        let bytes = BASE64.decode(header.trim())?;
        let payload = serde_json::from_slice(&bytes)?;
        Ok(payload)
    }

    /// Encodes this payload as an `X-PAYMENT` header value.
    ///
    /// The standard Base64 alphabet is used, so the result never contains
    /// line breaks.
    pub fn to_header(&self) -> String {
        let json = serde_json::to_vec(self).expect("PaymentPayload serialization failed");
        BASE64.encode(json)
    }
}

/// Envelope sent to the facilitator's `POST /verify` and `POST /settle`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacilitatorRequest {
    /// Protocol version (always 1).
    pub x402_version: X402Version1,
    /// The client's payment proof.
    pub payment_payload: PaymentPayload,
    /// The requirements the proof is checked against.
    pub payment_requirements: PaymentRequirements,
}

/// The settle envelope is identical to the verify envelope.
pub type SettleRequest = FacilitatorRequest;

/// Result returned by a facilitator after verifying a [`PaymentPayload`]
/// against the provided [`PaymentRequirements`].
#[derive(Debug, Clone, PartialEq)]
pub enum VerifyResponse {
    /// The payload matches the requirements and passes all checks.
    Valid {
        /// The address that will pay.
        payer: String,
    },
    /// The payload was well-formed but failed verification.
    Invalid {
        /// Why verification failed (e.g., "insufficient_funds").
        reason: String,
        /// The payer, when the facilitator could still identify one.
        payer: Option<String>,
    },
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VerifyResponseWire {
    is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    payer: Option<String>,
    #[serde(default)]
    invalid_reason: Option<String>,
}

impl Serialize for VerifyResponse {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let wire = match self {
            VerifyResponse::Valid { payer } => VerifyResponseWire {
                is_valid: true,
                payer: Some(payer.clone()),
                invalid_reason: None,
            },
            VerifyResponse::Invalid { reason, payer } => VerifyResponseWire {
                is_valid: false,
                payer: payer.clone(),
                invalid_reason: Some(reason.clone()),
            },
        };
        wire.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for VerifyResponse {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let wire = VerifyResponseWire::deserialize(deserializer)?;
        match wire.is_valid {
            true => {
                let payer = wire
                    .payer
                    .ok_or_else(|| serde::de::Error::missing_field("payer"))?;
                Ok(VerifyResponse::Valid { payer })
            }
            false => {
                let reason = wire
                    .invalid_reason
                    .ok_or_else(|| serde::de::Error::missing_field("invalidReason"))?;
                Ok(VerifyResponse::Invalid {
                    reason,
                    payer: wire.payer,
                })
            }
        }
    }
}

/// Result returned by a facilitator after attempting on-chain settlement.
#[derive(Debug, Clone, PartialEq)]
pub enum SettleResponse {
    /// Settlement succeeded.
    Success {
        /// The on-chain transaction hash.
        transaction: String,
        /// The network where settlement occurred.
        network: String,
        /// The address that paid.
        payer: String,
    },
    /// Settlement failed.
    Error {
        /// The reason for failure (e.g., "tx_reverted").
        reason: String,
        /// The network where settlement was attempted.
        network: String,
    },
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettleResponseWire {
    success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    payer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    transaction: Option<String>,
    #[serde(default)]
    network: String,
}

impl Serialize for SettleResponse {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let wire = match self {
            SettleResponse::Success {
                transaction,
                network,
                payer,
            } => SettleResponseWire {
                success: true,
                error_reason: None,
                payer: Some(payer.clone()),
                transaction: Some(transaction.clone()),
                network: network.clone(),
            },
            SettleResponse::Error { reason, network } => SettleResponseWire {
                success: false,
                error_reason: Some(reason.clone()),
                payer: None,
                // The transaction slot is an empty string on failure.
                transaction: Some(String::new()),
                network: network.clone(),
            },
        };
        wire.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SettleResponse {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let wire = SettleResponseWire::deserialize(deserializer)?;
        match wire.success {
            true => {
                let payer = wire
                    .payer
                    .ok_or_else(|| serde::de::Error::missing_field("payer"))?;
                let transaction = wire
                    .transaction
                    .ok_or_else(|| serde::de::Error::missing_field("transaction"))?;
                Ok(SettleResponse::Success {
                    transaction,
                    network: wire.network,
                    payer,
                })
            }
            false => {
                let reason = wire
                    .error_reason
                    .ok_or_else(|| serde::de::Error::missing_field("errorReason"))?;
                Ok(SettleResponse::Error {
                    reason,
                    network: wire.network,
                })
            }
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Settlement receipt emitted to the client in the `X-PAYMENT-RESPONSE`
/// response header, Base64-encoded.
///
/// Only emitted for successful settlements, so `success` is always `true`
/// when the gateway produces one. `transaction` and `network` are never
/// null: absent values normalize to the empty string.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementResponseHeader {
    /// Whether settlement succeeded.
    pub success: bool,
    /// The on-chain transaction hash, or `""` when absent.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub transaction: String,
    /// The settlement network, or `""` when absent.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub network: String,
    /// The address that paid.
    #[serde(default)]
    pub payer: String,
}

impl SettlementResponseHeader {
    /// Builds a receipt, normalizing absent transaction/network to `""`.
    pub fn new(transaction: Option<String>, network: Option<String>, payer: String) -> Self {
        Self {
            success: true,
            transaction: transaction.unwrap_or_default(),
            network: network.unwrap_or_default(),
            payer,
        }
    }

    /// Encodes this receipt as an `X-PAYMENT-RESPONSE` header value.
    pub fn to_header(&self) -> String {
        let json = serde_json::to_vec(self).expect("SettlementResponseHeader serialization failed");
        BASE64.encode(json)
    }

    /// Decodes a receipt from an `X-PAYMENT-RESPONSE` header value.
    pub fn from_header(header: &str) -> Result<Self, PaymentHeaderError> {
        let bytes = BASE64.decode(header.trim())?;
        let receipt = serde_json::from_slice(&bytes)?;
        Ok(receipt)
    }
}

/// HTTP 402 Payment Required response body.
///
/// The `accepts` array carries the acceptable payment methods. This gateway
/// always emits exactly one entry, but the array form is kept on the wire
/// so clients supporting multiple methods keep working.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequired {
    /// Protocol version (always 1).
    pub x402_version: X402Version1,
    /// List of acceptable payment methods.
    #[serde(default)]
    pub accepts: Vec<PaymentRequirements>,
    /// Human-readable explanation of why payment is (still) required.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_payload() -> PaymentPayload {
        PaymentPayload {
            x402_version: X402Version1,
            scheme: "exact".to_string(),
            network: "base-sepolia".to_string(),
            payload: json!({
                "signature": "0xdeadbeef",
                "authorization": { "from": "0xPayer", "value": "10000" }
            }),
        }
    }

    #[test]
    fn payment_payload_header_round_trip() {
        let payload = sample_payload();
        let header = payload.to_header();
        assert!(!header.contains('\n'));
        let decoded = PaymentPayload::from_header(&header).unwrap();
        assert_eq!(decoded, payload);
    }

    #[test]
    fn payment_payload_header_round_trip_non_ascii() {
        let mut payload = sample_payload();
        payload.payload = json!({ "memo": "déjà vu ☕" });
        let decoded = PaymentPayload::from_header(&payload.to_header()).unwrap();
        assert_eq!(decoded, payload);
    }

    #[test]
    fn payment_payload_rejects_bad_base64() {
        let err = PaymentPayload::from_header("not-base64!!!").unwrap_err();
        assert!(matches!(err, PaymentHeaderError::MalformedHeader(_)));
    }

    #[test]
    fn payment_payload_rejects_bad_json() {
        let header = BASE64.encode(b"{\"x402Version\":1,");
        let err = PaymentPayload::from_header(&header).unwrap_err();
        assert!(matches!(err, PaymentHeaderError::DecodeError(_)));
    }

    #[test]
    fn payment_payload_rejects_unsupported_version() {
        let header = BASE64.encode(
            json!({
                "x402Version": 2,
                "scheme": "exact",
                "network": "base-sepolia",
                "payload": {}
            })
            .to_string(),
        );
        let err = PaymentPayload::from_header(&header).unwrap_err();
        assert!(matches!(err, PaymentHeaderError::DecodeError(_)));
    }

    #[test]
    fn verify_response_wire_shape() {
        let valid: VerifyResponse =
            serde_json::from_value(json!({ "isValid": true, "payer": "0xPayer" })).unwrap();
        assert_eq!(
            valid,
            VerifyResponse::Valid {
                payer: "0xPayer".to_string()
            }
        );

        let invalid: VerifyResponse = serde_json::from_value(json!({
            "isValid": false,
            "invalidReason": "insufficient_funds"
        }))
        .unwrap();
        assert_eq!(
            invalid,
            VerifyResponse::Invalid {
                reason: "insufficient_funds".to_string(),
                payer: None
            }
        );
    }

    #[test]
    fn settle_response_wire_shape() {
        let success: SettleResponse = serde_json::from_value(json!({
            "success": true,
            "transaction": "0xTX",
            "network": "base-sepolia",
            "payer": "0xPayer"
        }))
        .unwrap();
        assert_eq!(
            success,
            SettleResponse::Success {
                transaction: "0xTX".to_string(),
                network: "base-sepolia".to_string(),
                payer: "0xPayer".to_string()
            }
        );

        let failure: SettleResponse = serde_json::from_value(json!({
            "success": false,
            "errorReason": "tx_reverted",
            "transaction": "",
            "network": "base-sepolia"
        }))
        .unwrap();
        assert_eq!(
            failure,
            SettleResponse::Error {
                reason: "tx_reverted".to_string(),
                network: "base-sepolia".to_string()
            }
        );
    }

    #[test]
    fn settlement_header_round_trip() {
        let receipt = SettlementResponseHeader::new(
            Some("0xTX".to_string()),
            Some("base-sepolia".to_string()),
            "0xPayer".to_string(),
        );
        let decoded = SettlementResponseHeader::from_header(&receipt.to_header()).unwrap();
        assert_eq!(decoded, receipt);
    }

    #[test]
    fn settlement_header_normalizes_nulls() {
        let receipt = SettlementResponseHeader::new(None, None, "0xPayer".to_string());
        assert_eq!(receipt.transaction, "");
        assert_eq!(receipt.network, "");

        let json = json!({
            "success": true,
            "transaction": null,
            "network": null,
            "payer": "0xPayer"
        });
        let header = BASE64.encode(json.to_string());
        let decoded = SettlementResponseHeader::from_header(&header).unwrap();
        assert_eq!(decoded.transaction, "");
        assert_eq!(decoded.network, "");
        assert_eq!(decoded.payer, "0xPayer");
    }

    #[test]
    fn payment_required_serializes_camel_case() {
        let body = PaymentRequired {
            x402_version: X402Version1,
            accepts: vec![PaymentRequirements {
                scheme: "exact".to_string(),
                network: "base-sepolia".to_string(),
                max_amount_required: "10000".to_string(),
                resource: "http://localhost/pay".to_string(),
                description: "test".to_string(),
                mime_type: None,
                output_schema: None,
                pay_to: "0xPayee".to_string(),
                max_timeout_seconds: 30,
                asset: "0xAsset".to_string(),
                extra: None,
            }],
            error: Some("X-PAYMENT header is required".to_string()),
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["x402Version"], 1);
        assert_eq!(value["accepts"][0]["maxAmountRequired"], "10000");
        assert_eq!(value["accepts"][0]["payTo"], "0xPayee");
        assert_eq!(value["accepts"][0]["maxTimeoutSeconds"], 30);
        assert!(value["accepts"][0].get("mimeType").is_none());
        assert_eq!(value["error"], "X-PAYMENT header is required");
    }
}

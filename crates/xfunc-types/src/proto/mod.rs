//! Protocol types for x402 payment messages.
//!
//! This module defines the wire format used between the gateway and a
//! payment facilitator. All types serialize to JSON with camelCase field
//! names. Only protocol version 1 is spoken; the version marker
//! [`v1::X402Version1`] rejects anything else at decode time.
//!
//! # Key Types
//!
//! - [`Kind`] - A `(scheme, network)` capability tuple
//! - [`SupportedResponse`] - Response from a facilitator's `/supported` endpoint
//! - [`v1::FacilitatorRequest`] - Envelope for `/verify` and `/settle`
//! - [`v1::PaymentRequirements`] / [`v1::PaymentPayload`] - The offer and the proof
//! - [`v1::VerifyResponse`] / [`v1::SettleResponse`] - Facilitator replies

use serde::{Deserialize, Serialize};
use serde_with::{VecSkipError, serde_as};
use std::collections::HashSet;

pub mod v1;

/// A payment capability advertised by a facilitator: a scheme paired with
/// the network it can process it on.
///
/// Returned in the [`SupportedResponse`] from `GET /supported`.
///
/// # Example
///
/// ```json
/// { "scheme": "exact", "network": "base-sepolia" }
/// ```
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct Kind {
    /// The payment scheme identifier (e.g., "exact").
    pub scheme: String,
    /// The network identifier (e.g., "base-sepolia").
    pub network: String,
}

/// Response from a facilitator's `GET /supported` endpoint.
///
/// Enumerates the `(scheme, network)` pairs the facilitator can verify and
/// settle. Entries that fail to parse are skipped rather than failing the
/// whole response.
#[serde_as]
#[derive(Clone, Default, Debug, Serialize, Deserialize)]
pub struct SupportedResponse {
    /// List of supported payment kinds.
    #[serde_as(as = "VecSkipError<_>")]
    #[serde(default)]
    pub kinds: Vec<Kind>,
}

impl SupportedResponse {
    /// Collapses the advertised kinds into a set, dropping duplicates.
    pub fn into_set(self) -> HashSet<Kind> {
        self.kinds.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supported_response_skips_unparseable_kinds() {
        let json = r#"{"kinds":[
            {"scheme":"exact","network":"base-sepolia"},
            {"scheme":"exact"},
            {"scheme":"upto","network":"base"}
        ]}"#;
        let supported: SupportedResponse = serde_json::from_str(json).unwrap();
        assert_eq!(supported.kinds.len(), 2);
        let set = supported.into_set();
        assert!(set.contains(&Kind {
            scheme: "exact".to_string(),
            network: "base-sepolia".to_string()
        }));
        assert!(set.contains(&Kind {
            scheme: "upto".to_string(),
            network: "base".to_string()
        }));
    }

    #[test]
    fn supported_response_deduplicates() {
        let json = r#"{"kinds":[
            {"scheme":"exact","network":"base"},
            {"scheme":"exact","network":"base"}
        ]}"#;
        let supported: SupportedResponse = serde_json::from_str(json).unwrap();
        assert_eq!(supported.into_set().len(), 1);
    }
}

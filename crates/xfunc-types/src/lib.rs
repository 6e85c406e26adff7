//! Core types for x402 payment mediation in the xfunc gateway.
//!
//! This crate defines the wire format spoken between a paying client, the
//! gateway, and a remote payment facilitator, plus the small value types the
//! rest of the workspace builds on. It is transport-agnostic: the HTTP
//! middleware and clients live in `xfunc-x402`.
//!
//! # Overview
//!
//! A paid route advertises [`proto::v1::PaymentRequirements`] in an HTTP 402
//! response. The client retries with a [`proto::v1::PaymentPayload`] carried
//! Base64-encoded in the `X-PAYMENT` request header. The gateway forwards
//! both to a facilitator for verification and, after the protected handler
//! succeeds, for on-chain settlement. The settlement receipt travels back in
//! the `X-PAYMENT-RESPONSE` header as a
//! [`proto::v1::SettlementResponseHeader`].
//!
//! # Modules
//!
//! - [`facilitator`] - Core trait for payment verification and settlement
//! - [`proto`] - Wire format types for protocol messages
//! - [`util`] - Helper types (human-readable money amounts)

pub mod facilitator;
pub mod proto;
pub mod util;

//! Core trait defining the verification and settlement interface against an
//! x402 facilitator.
//!
//! Implementors take a [`FacilitatorRequest`] envelope, check the contained
//! payment proof against the contained requirements
//! ([`Facilitator::verify`]), and execute the on-chain transfer
//! ([`Facilitator::settle`]). The gateway only ever talks to a remote
//! facilitator over HTTP, but the trait keeps the payment middleware
//! testable against in-process fakes.

use std::fmt::{Debug, Display};
use std::sync::Arc;

use crate::proto::SupportedResponse;
use crate::proto::v1::{FacilitatorRequest, SettleRequest, SettleResponse, VerifyResponse};

/// Asynchronous interface to an x402 payment facilitator.
pub trait Facilitator {
    /// The error type returned by this facilitator.
    type Error: Debug + Display;

    /// Verifies a payment proof against the payment requirements.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] on transport or protocol failure. A payment
    /// the facilitator examined and rejected is not an error: it comes back
    /// as [`VerifyResponse::Invalid`].
    fn verify(
        &self,
        request: &FacilitatorRequest,
    ) -> impl Future<Output = Result<VerifyResponse, Self::Error>> + Send;

    /// Settles a previously verified payment on-chain.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] on transport or protocol failure. A
    /// settlement the facilitator attempted and could not complete comes
    /// back as [`SettleResponse::Error`].
    fn settle(
        &self,
        request: &SettleRequest,
    ) -> impl Future<Output = Result<SettleResponse, Self::Error>> + Send;

    /// Enumerates the `(scheme, network)` kinds this facilitator processes.
    fn supported(&self) -> impl Future<Output = Result<SupportedResponse, Self::Error>> + Send;
}

impl<T: Facilitator> Facilitator for Arc<T> {
    type Error = T::Error;

    fn verify(
        &self,
        request: &FacilitatorRequest,
    ) -> impl Future<Output = Result<VerifyResponse, Self::Error>> + Send {
        self.as_ref().verify(request)
    }

    fn settle(
        &self,
        request: &SettleRequest,
    ) -> impl Future<Output = Result<SettleResponse, Self::Error>> + Send {
        self.as_ref().settle(request)
    }

    fn supported(&self) -> impl Future<Output = Result<SupportedResponse, Self::Error>> + Send {
        self.as_ref().supported()
    }
}

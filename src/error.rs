//! Error types for the transition engine
//!
//! Each variant carries a stable `code()` string so the host's
//! retry/alerting policy can match on codes instead of display text.

use thiserror::Error;

use crate::core_types::OfferId;

/// Errors raised by a [`TransitionStore`](crate::store::TransitionStore).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The offer moved (or vanished) between snapshot and commit.
    /// Recoverable: retry the whole operation from the re-read.
    #[error("write conflict: offer changed since snapshot")]
    Conflict,

    /// Backend failure (connection lost, quota, ...). Not recoverable
    /// inside this process; surfaces to the host.
    #[error("store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::Conflict => "WRITE_CONFLICT",
            StoreError::Backend(_) => "STORE_BACKEND",
        }
    }
}

/// Transition engine errors.
///
/// Guard rejection is NOT an error - irrelevant events resolve to
/// [`TransitionOutcome::NotApplicable`](crate::engine::TransitionOutcome).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EscrowError {
    /// The offer was absent on re-read inside the transaction (deleted
    /// between event delivery and processing). No writes occurred.
    #[error("offer not found: {0}")]
    OfferNotFound(OfferId),

    /// A field the materializer needs is missing or malformed. Precondition
    /// failure: no writes occurred.
    #[error("offer field missing or malformed: {0}")]
    InvalidOffer(&'static str),

    /// Commit kept conflicting past the retry budget. The host's
    /// redelivery policy takes over from here.
    #[error("commit conflict persisted after {0} attempts")]
    ConflictExhausted(u32),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl EscrowError {
    /// Stable error code for host-side policy.
    pub fn code(&self) -> &'static str {
        match self {
            EscrowError::OfferNotFound(_) => "OFFER_NOT_FOUND",
            EscrowError::InvalidOffer(_) => "INVALID_OFFER",
            EscrowError::ConflictExhausted(_) => "CONFLICT_EXHAUSTED",
            EscrowError::Store(_) => "STORE_ERROR",
        }
    }

    /// Whether redelivering the same event can possibly succeed.
    ///
    /// `InvalidOffer` stays false until the offer is repaired upstream;
    /// everything else is worth a redelivery.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, EscrowError::InvalidOffer(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            EscrowError::OfferNotFound(OfferId::new("o1")).code(),
            "OFFER_NOT_FOUND"
        );
        assert_eq!(EscrowError::InvalidOffer("asset").code(), "INVALID_OFFER");
        assert_eq!(EscrowError::ConflictExhausted(5).code(), "CONFLICT_EXHAUSTED");
        assert_eq!(StoreError::Conflict.code(), "WRITE_CONFLICT");
    }

    #[test]
    fn test_store_error_converts() {
        let err: EscrowError = StoreError::Backend("connection reset".into()).into();
        assert_eq!(err.code(), "STORE_ERROR");
        assert!(err.is_retryable());
    }

    #[test]
    fn test_invalid_offer_not_retryable() {
        assert!(!EscrowError::InvalidOffer("amountUSDT").is_retryable());
        assert!(EscrowError::OfferNotFound(OfferId::new("o1")).is_retryable());
    }

    #[test]
    fn test_display() {
        let err = EscrowError::InvalidOffer("amountUSDT");
        assert_eq!(err.to_string(), "offer field missing or malformed: amountUSDT");
    }
}

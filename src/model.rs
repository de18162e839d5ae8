//! Record shapes for the three logical collections
//!
//! The offer collection is owned upstream and schemaless, so [`OfferDoc`]
//! keeps every upstream field optional and validation happens at the
//! transaction boundary ([`Offer::validate`]). Escrows and notifications are
//! only ever written by this crate and are fully typed.
//!
//! Serde names follow the wire layout of the record store (`traderId`,
//! `amountUSDT`, ...), so documents round-trip byte-compatible with what the
//! other services read.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core_types::{EscrowId, OfferId, UserId};
use crate::error::EscrowError;

/// Offer lifecycle states.
///
/// This crate only ever writes `InEscrow`; the other states are set by the
/// listing and acceptance services upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferStatus {
    Pending,
    Accepted,
    InEscrow,
    Cancelled,
}

impl OfferStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OfferStatus::Pending => "pending",
            OfferStatus::Accepted => "accepted",
            OfferStatus::InEscrow => "in_escrow",
            OfferStatus::Cancelled => "cancelled",
        }
    }
}

/// Escrow lifecycle states: `in_escrow -> released -> refunded`.
///
/// Escrows are created in `InEscrow`; release/refund belong to settlement,
/// which runs downstream of this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscrowStatus {
    InEscrow,
    Released,
    Refunded,
}

/// An offer document as stored - and as delivered in change events.
///
/// All upstream-owned fields are optional: the record store enforces no
/// schema, and a half-written offer must not panic the handler.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferDoc {
    #[serde(default)]
    pub trader_id: Option<UserId>,
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default, rename = "amountUSDT")]
    pub amount_usdt: Option<Decimal>,
    #[serde(default)]
    pub asset: Option<String>,
    #[serde(default, rename = "priceETBPerUSDT")]
    pub price_etb_per_usdt: Option<Decimal>,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub status: Option<OfferStatus>,
    #[serde(default)]
    pub escrow_id: Option<EscrowId>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A validated offer - every field the materializer needs, guaranteed present.
#[derive(Debug, Clone, PartialEq)]
pub struct Offer {
    pub trader_id: UserId,
    pub user_id: UserId,
    pub amount_usdt: Decimal,
    pub asset: String,
    pub price_etb_per_usdt: Decimal,
    pub payment_method: String,
    pub status: OfferStatus,
}

impl Offer {
    /// Validate a raw document at the transaction boundary.
    ///
    /// Policy for malformed offers: reject with the first missing or
    /// non-positive field rather than guess. The host's redelivery will not
    /// help until the offer is repaired upstream, but no partial state is
    /// ever written.
    pub fn validate(doc: &OfferDoc) -> Result<Self, EscrowError> {
        let trader_id = doc
            .trader_id
            .clone()
            .ok_or(EscrowError::InvalidOffer("traderId"))?;
        let user_id = doc
            .user_id
            .clone()
            .ok_or(EscrowError::InvalidOffer("userId"))?;
        let amount_usdt = doc
            .amount_usdt
            .ok_or(EscrowError::InvalidOffer("amountUSDT"))?;
        if amount_usdt <= Decimal::ZERO {
            return Err(EscrowError::InvalidOffer("amountUSDT"));
        }
        let asset = doc.asset.clone().ok_or(EscrowError::InvalidOffer("asset"))?;
        let price_etb_per_usdt = doc
            .price_etb_per_usdt
            .ok_or(EscrowError::InvalidOffer("priceETBPerUSDT"))?;
        if price_etb_per_usdt <= Decimal::ZERO {
            return Err(EscrowError::InvalidOffer("priceETBPerUSDT"));
        }
        let payment_method = doc
            .payment_method
            .clone()
            .ok_or(EscrowError::InvalidOffer("paymentMethod"))?;
        let status = doc.status.ok_or(EscrowError::InvalidOffer("status"))?;

        Ok(Self {
            trader_id,
            user_id,
            amount_usdt,
            asset,
            price_etb_per_usdt,
            payment_method,
            status,
        })
    }
}

/// An escrow document. Append-only from this crate's perspective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EscrowDoc {
    pub offer_id: OfferId,
    pub trader_id: UserId,
    pub buyer_id: UserId,
    #[serde(rename = "amountUSDT")]
    pub amount_usdt: Decimal,
    pub asset: String,
    #[serde(rename = "priceETBPerUSDT")]
    pub price_etb_per_usdt: Decimal,
    pub payment_method: String,
    pub status: EscrowStatus,
    pub created_at: DateTime<Utc>,
}

/// Notification kinds. One fixed kind for the acceptance transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    OfferAccepted,
}

/// A notification document. Append-only, never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationDoc {
    pub user_id: UserId,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub offer_id: OfferId,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

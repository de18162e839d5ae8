//! Escrow Materializer
//!
//! Computes the escrow document from a validated offer. Pure: the caller
//! supplies the commit timestamp from the transaction, and the function
//! constructs the record without touching the store.

use chrono::{DateTime, Utc};

use crate::core_types::OfferId;
use crate::model::{EscrowDoc, EscrowStatus, Offer};

/// Build the escrow record for an accepted offer.
///
/// Party and money fields are copied verbatim from the offer as re-read
/// inside the transaction, never from the (possibly stale) event snapshot.
pub fn escrow_for(offer_id: &OfferId, offer: &Offer, commit_time: DateTime<Utc>) -> EscrowDoc {
    EscrowDoc {
        offer_id: offer_id.clone(),
        trader_id: offer.trader_id.clone(),
        buyer_id: offer.user_id.clone(),
        amount_usdt: offer.amount_usdt,
        asset: offer.asset.clone(),
        price_etb_per_usdt: offer.price_etb_per_usdt,
        payment_method: offer.payment_method.clone(),
        status: EscrowStatus::InEscrow,
        created_at: commit_time,
    }
}

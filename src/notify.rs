//! Notification Composer
//!
//! Builds the two acceptance notifications: one confirming to the trader,
//! one instructing the buyer to pay. Pure record construction; delivery
//! belongs to the notification fan-out service downstream.

use chrono::{DateTime, Utc};

use crate::core_types::OfferId;
use crate::model::{NotificationDoc, NotificationKind, Offer};

/// Compose the trader-facing and buyer-facing notifications, in that order.
pub fn compose(
    offer_id: &OfferId,
    offer: &Offer,
    commit_time: DateTime<Utc>,
) -> [NotificationDoc; 2] {
    let to_trader = NotificationDoc {
        user_id: offer.trader_id.clone(),
        kind: NotificationKind::OfferAccepted,
        offer_id: offer_id.clone(),
        message: format!("You accepted offer {offer_id}. Escrow created."),
        created_at: commit_time,
    };
    let to_buyer = NotificationDoc {
        user_id: offer.user_id.clone(),
        kind: NotificationKind::OfferAccepted,
        offer_id: offer_id.clone(),
        message: format!(
            "Your offer {offer_id} was accepted. Pay the trader via {}.",
            offer.payment_method
        ),
        created_at: commit_time,
    };
    [to_trader, to_buyer]
}

//! Escrow Engine
//!
//! Orchestrates the acceptance transition: guard, snapshot, idempotency
//! check, materialization, atomic commit. One fixed transition
//! (`accepted -> in_escrow`), safe under duplicate and concurrent delivery.
//!
//! # Safety invariants
//!
//! 1. **Guard-before-store**: irrelevant events never open the write path.
//! 2. **Re-read inside the transaction**: the materializer only ever sees
//!    the offer as stored at snapshot time, never the event payload.
//! 3. **One commit per outcome**: a full materialization and a
//!    normalization-only confirm are each a single conditional commit.
//! 4. **Conflict means restart**: a lost commit re-runs from the snapshot,
//!    where the idempotency fact decides the path again.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::core_types::{EscrowId, NotificationId, OfferId};
use crate::error::{EscrowError, StoreError};
use crate::model::{Offer, OfferDoc};
use crate::store::{TransitionStore, WriteSet};
use crate::{guard, materialize, notify};

/// Default bound on commit-conflict retries before handing back to the
/// host's redelivery policy.
pub const DEFAULT_MAX_COMMIT_RETRIES: u32 = 5;

/// What a delivery resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// Guard rejected the event. Zero store calls, zero writes.
    NotApplicable,
    /// This delivery materialized the escrow and both notifications.
    Created { escrow_id: EscrowId },
    /// A prior delivery already materialized; this one only confirmed the
    /// offer's status.
    AlreadyApplied { escrow_id: EscrowId },
}

/// Host-facing change handler, wired to the event-delivery mechanism.
///
/// The host calls `handle` for every offer modification and applies its own
/// redelivery policy on error; the engine holds no retry state across calls.
#[async_trait]
pub trait OfferChangeHandler: Send + Sync {
    async fn handle(
        &self,
        before: &OfferDoc,
        after: &OfferDoc,
        offer_id: &OfferId,
    ) -> Result<TransitionOutcome, EscrowError>;
}

/// The transition engine. Cheap to clone via `Arc`; stateless between calls.
pub struct EscrowEngine {
    store: Arc<dyn TransitionStore>,
    max_commit_retries: u32,
}

impl EscrowEngine {
    pub fn new(store: Arc<dyn TransitionStore>) -> Self {
        Self::with_retries(store, DEFAULT_MAX_COMMIT_RETRIES)
    }

    pub fn with_retries(store: Arc<dyn TransitionStore>, max_commit_retries: u32) -> Self {
        Self {
            store,
            max_commit_retries: max_commit_retries.max(1),
        }
    }

    /// One transition attempt: snapshot, branch on the idempotency fact,
    /// conditional commit.
    async fn try_transition(&self, offer_id: &OfferId) -> Result<TransitionOutcome, EscrowError> {
        let txn = self.store.begin(offer_id).await?;

        let offer_doc = txn
            .offer
            .as_ref()
            .ok_or_else(|| EscrowError::OfferNotFound(offer_id.clone()))?;

        // Already materialized by a prior delivery: confirm the offer's
        // status and stop. No new escrow, no new notifications, and the
        // existing back-reference stays untouched.
        if let Some(existing) = txn.escrow_id.clone() {
            self.store
                .commit(&txn, WriteSet::normalize(txn.commit_time))
                .await?;
            debug!(offer_id = %offer_id, escrow_id = %existing, "Escrow already exists, normalized offer status");
            return Ok(TransitionOutcome::AlreadyApplied {
                escrow_id: existing,
            });
        }

        let offer = Offer::validate(offer_doc)?;

        let escrow_id = EscrowId::generate();
        let escrow = materialize::escrow_for(offer_id, &offer, txn.commit_time);
        let notifications = notify::compose(offer_id, &offer, txn.commit_time)
            .into_iter()
            .map(|n| (NotificationId::generate(), n))
            .collect();

        let writes = WriteSet::materialize(escrow_id.clone(), escrow, notifications, txn.commit_time);
        self.store.commit(&txn, writes).await?;

        info!(
            offer_id = %offer_id,
            escrow_id = %escrow_id,
            trader_id = %offer.trader_id,
            buyer_id = %offer.user_id,
            "Escrow created: offer moved to in_escrow"
        );
        Ok(TransitionOutcome::Created { escrow_id })
    }
}

#[async_trait]
impl OfferChangeHandler for EscrowEngine {
    async fn handle(
        &self,
        before: &OfferDoc,
        after: &OfferDoc,
        offer_id: &OfferId,
    ) -> Result<TransitionOutcome, EscrowError> {
        if !guard::accepts(before, after) {
            debug!(offer_id = %offer_id, "Change event not applicable, skipping");
            return Ok(TransitionOutcome::NotApplicable);
        }

        for attempt in 1..=self.max_commit_retries {
            match self.try_transition(offer_id).await {
                Err(EscrowError::Store(StoreError::Conflict)) => {
                    // Another writer moved the offer between snapshot and
                    // commit. Restart from the re-read; the idempotency
                    // fact may have changed underneath us.
                    warn!(
                        offer_id = %offer_id,
                        attempt,
                        "Commit conflict, retrying transition"
                    );
                }
                done => return done,
            }
        }

        Err(EscrowError::ConflictExhausted(self.max_commit_retries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::UserId;
    use crate::model::{OfferStatus, EscrowStatus};
    use crate::store::MemoryStore;
    use rust_decimal_macros::dec;

    fn accepted_offer() -> OfferDoc {
        OfferDoc {
            trader_id: Some(UserId::new("T1")),
            user_id: Some(UserId::new("B1")),
            amount_usdt: Some(dec!(100)),
            asset: Some("USDT".to_string()),
            price_etb_per_usdt: Some(dec!(150)),
            payment_method: Some("CBE".to_string()),
            status: Some(OfferStatus::Accepted),
            escrow_id: None,
            updated_at: None,
        }
    }

    fn pending(doc: &OfferDoc) -> OfferDoc {
        OfferDoc {
            status: Some(OfferStatus::Pending),
            ..doc.clone()
        }
    }

    fn harness() -> (Arc<MemoryStore>, EscrowEngine, OfferId) {
        let store = Arc::new(MemoryStore::new());
        let engine = EscrowEngine::new(store.clone());
        let offer_id = OfferId::new("offer-1");
        store.put_offer(&offer_id, accepted_offer());
        (store, engine, offer_id)
    }

    #[tokio::test]
    async fn test_happy_path_creates_escrow_and_notifications() {
        let (store, engine, offer_id) = harness();
        let after = accepted_offer();

        let outcome = engine
            .handle(&pending(&after), &after, &offer_id)
            .await
            .unwrap();
        let TransitionOutcome::Created { escrow_id } = outcome else {
            panic!("expected Created, got {outcome:?}");
        };

        let escrow = store.escrow(&escrow_id).unwrap();
        assert_eq!(escrow.offer_id, offer_id);
        assert_eq!(escrow.trader_id, UserId::new("T1"));
        assert_eq!(escrow.buyer_id, UserId::new("B1"));
        assert_eq!(escrow.amount_usdt, dec!(100));
        assert_eq!(escrow.status, EscrowStatus::InEscrow);

        let offer = store.offer(&offer_id).unwrap();
        assert_eq!(offer.status, Some(OfferStatus::InEscrow));
        assert_eq!(offer.escrow_id, Some(escrow_id));
        assert!(offer.updated_at.is_some());

        assert_eq!(store.notification_count(), 2);
        assert_eq!(store.notifications_for(&UserId::new("T1")).len(), 1);
        assert_eq!(store.notifications_for(&UserId::new("B1")).len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_delivery_is_idempotent() {
        let (store, engine, offer_id) = harness();
        let after = accepted_offer();
        let before = pending(&after);

        let first = engine.handle(&before, &after, &offer_id).await.unwrap();
        let TransitionOutcome::Created { escrow_id } = first else {
            panic!("expected Created");
        };

        // Same logical event delivered again.
        let second = engine.handle(&before, &after, &offer_id).await.unwrap();
        assert_eq!(
            second,
            TransitionOutcome::AlreadyApplied {
                escrow_id: escrow_id.clone()
            }
        );

        assert_eq!(store.escrow_count(), 1);
        assert_eq!(store.notification_count(), 2);
        assert_eq!(store.offer(&offer_id).unwrap().escrow_id, Some(escrow_id));
    }

    #[tokio::test]
    async fn test_guard_rejection_touches_nothing() {
        let (store, engine, offer_id) = harness();
        let doc = accepted_offer();

        // Same status on both sides.
        let outcome = engine.handle(&doc, &doc, &offer_id).await.unwrap();
        assert_eq!(outcome, TransitionOutcome::NotApplicable);

        // Status change, but not to accepted.
        let cancelled = OfferDoc {
            status: Some(OfferStatus::Cancelled),
            ..doc.clone()
        };
        let outcome = engine
            .handle(&pending(&doc), &cancelled, &offer_id)
            .await
            .unwrap();
        assert_eq!(outcome, TransitionOutcome::NotApplicable);

        assert_eq!(store.escrow_count(), 0);
        assert_eq!(store.notification_count(), 0);
        assert_eq!(store.offer(&offer_id).unwrap().status, Some(OfferStatus::Accepted));
    }

    #[tokio::test]
    async fn test_missing_offer_surfaces_stale_read() {
        let (store, engine, offer_id) = harness();
        store.remove_offer(&offer_id);
        let after = accepted_offer();

        let err = engine
            .handle(&pending(&after), &after, &offer_id)
            .await
            .unwrap_err();
        assert_eq!(err, EscrowError::OfferNotFound(offer_id));
        assert_eq!(store.escrow_count(), 0);
        assert_eq!(store.notification_count(), 0);
    }

    #[tokio::test]
    async fn test_invalid_offer_rejected_without_writes() {
        let store = Arc::new(MemoryStore::new());
        let engine = EscrowEngine::new(store.clone());
        let offer_id = OfferId::new("offer-1");

        let mut stored = accepted_offer();
        stored.amount_usdt = None;
        store.put_offer(&offer_id, stored);

        let after = accepted_offer();
        let err = engine
            .handle(&pending(&after), &after, &offer_id)
            .await
            .unwrap_err();
        assert_eq!(err, EscrowError::InvalidOffer("amountUSDT"));
        assert_eq!(store.escrow_count(), 0);
        assert_eq!(store.notification_count(), 0);
        // The offer itself is left exactly as it was.
        assert_eq!(
            store.offer(&offer_id).unwrap().status,
            Some(OfferStatus::Accepted)
        );
    }

    #[tokio::test]
    async fn test_materializes_from_reread_not_event_snapshot() {
        let (store, engine, offer_id) = harness();

        // The event carries a stale amount; the store has since been edited.
        let mut stale_after = accepted_offer();
        stale_after.amount_usdt = Some(dec!(999));
        let mut current = accepted_offer();
        current.amount_usdt = Some(dec!(42));
        store.put_offer(&offer_id, current);

        let outcome = engine
            .handle(&pending(&stale_after), &stale_after, &offer_id)
            .await
            .unwrap();
        let TransitionOutcome::Created { escrow_id } = outcome else {
            panic!("expected Created");
        };
        assert_eq!(store.escrow(&escrow_id).unwrap().amount_usdt, dec!(42));
    }
}

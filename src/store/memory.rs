//! In-memory transition store
//!
//! Versioned, mutex-guarded collections mirroring the production document
//! store's layout (`offers`, `escrows`, `notifications`, plus the
//! offerId-keyed escrow index the idempotency check needs). `begin` and
//! `commit` each hold the lock for one short critical section and never
//! await inside it, which gives snapshot-or-better isolation.
//!
//! Used directly by tests and the demo binary; production hosts wire a real
//! document-store client behind the same [`TransitionStore`] trait.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::core_types::{EscrowId, NotificationId, OfferId, UserId};
use crate::error::StoreError;
use crate::model::{EscrowDoc, NotificationDoc, OfferDoc};

use super::{OfferTxn, TransitionStore, WriteSet};

#[derive(Debug, Clone)]
struct VersionedOffer {
    doc: OfferDoc,
    version: u64,
}

#[derive(Default)]
struct Collections {
    offers: HashMap<OfferId, VersionedOffer>,
    escrows: HashMap<EscrowId, EscrowDoc>,
    /// Unique index: at most one escrow per offer, ever.
    escrows_by_offer: HashMap<OfferId, EscrowId>,
    notifications: HashMap<NotificationId, NotificationDoc>,
}

/// In-memory [`TransitionStore`] with optimistic per-offer versioning.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed or overwrite an offer, bumping its version like any other write.
    pub fn put_offer(&self, offer_id: &OfferId, doc: OfferDoc) {
        let mut inner = self.inner.lock().unwrap();
        let version = inner.offers.get(offer_id).map(|v| v.version + 1).unwrap_or(1);
        inner
            .offers
            .insert(offer_id.clone(), VersionedOffer { doc, version });
    }

    /// Delete an offer. Only upstream ever does this; exposed for the
    /// stale-read tests.
    pub fn remove_offer(&self, offer_id: &OfferId) {
        self.inner.lock().unwrap().offers.remove(offer_id);
    }

    pub fn offer(&self, offer_id: &OfferId) -> Option<OfferDoc> {
        self.inner
            .lock()
            .unwrap()
            .offers
            .get(offer_id)
            .map(|v| v.doc.clone())
    }

    pub fn escrow(&self, escrow_id: &EscrowId) -> Option<EscrowDoc> {
        self.inner.lock().unwrap().escrows.get(escrow_id).cloned()
    }

    /// The idempotency query, exposed read-only: escrow for an offer, if any.
    pub fn escrow_for_offer(&self, offer_id: &OfferId) -> Option<(EscrowId, EscrowDoc)> {
        let inner = self.inner.lock().unwrap();
        let escrow_id = inner.escrows_by_offer.get(offer_id)?.clone();
        let doc = inner.escrows.get(&escrow_id)?.clone();
        Some((escrow_id, doc))
    }

    pub fn notifications_for(&self, user_id: &UserId) -> Vec<NotificationDoc> {
        self.inner
            .lock()
            .unwrap()
            .notifications
            .values()
            .filter(|n| &n.user_id == user_id)
            .cloned()
            .collect()
    }

    pub fn escrow_count(&self) -> usize {
        self.inner.lock().unwrap().escrows.len()
    }

    pub fn notification_count(&self) -> usize {
        self.inner.lock().unwrap().notifications.len()
    }
}

#[async_trait]
impl TransitionStore for MemoryStore {
    async fn begin(&self, offer_id: &OfferId) -> Result<OfferTxn, StoreError> {
        let inner = self.inner.lock().unwrap();
        let (offer, version) = match inner.offers.get(offer_id) {
            Some(v) => (Some(v.doc.clone()), v.version),
            None => (None, 0),
        };
        let escrow_id = inner.escrows_by_offer.get(offer_id).cloned();
        Ok(OfferTxn {
            offer_id: offer_id.clone(),
            offer,
            escrow_id,
            commit_time: Utc::now(),
            version,
        })
    }

    async fn commit(&self, txn: &OfferTxn, writes: WriteSet) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();

        // Conditional on the snapshot version: the offer must still exist
        // and must not have moved since begin(). The check and every write
        // below happen under one lock hold, so the apply is indivisible.
        {
            let entry = inner
                .offers
                .get_mut(&txn.offer_id)
                .ok_or(StoreError::Conflict)?;
            if entry.version != txn.version {
                return Err(StoreError::Conflict);
            }
            entry.doc.status = Some(writes.offer.status);
            if let Some(escrow_id) = writes.offer.escrow_id {
                entry.doc.escrow_id = Some(escrow_id);
            }
            entry.doc.updated_at = Some(writes.offer.updated_at);
            entry.version += 1;
        }

        if let Some((escrow_id, escrow)) = writes.escrow {
            debug_assert!(
                !inner.escrows_by_offer.contains_key(&txn.offer_id),
                "escrow uniqueness violated for {}",
                txn.offer_id
            );
            inner
                .escrows_by_offer
                .insert(txn.offer_id.clone(), escrow_id.clone());
            inner.escrows.insert(escrow_id, escrow);
        }

        for (id, doc) in writes.notifications {
            inner.notifications.insert(id, doc);
        }

        Ok(())
    }
}

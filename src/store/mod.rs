//! Store abstraction for the atomic transition
//!
//! [`TransitionStore`] is the single seam between the engine and the record
//! store: `begin` takes a consistent snapshot of everything the transition
//! reads (current offer, idempotency fact, commit timestamp), and `commit`
//! applies a [`WriteSet`] all-or-nothing, conditional on the offer not having
//! moved since the snapshot. That re-read-then-conditionally-write shape is
//! what turns at-least-once event delivery into exactly-once materialization.
//!
//! # Invariants for implementors
//!
//! 1. `begin` reads the offer and the escrow index in one isolation domain.
//! 2. `commit` applies every write or none, and fails with
//!    [`StoreError::Conflict`] if the offer's version moved since `begin`.
//! 3. Every successful commit advances the offer's version, so two commits
//!    against the same snapshot can never both succeed.

pub mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::core_types::{EscrowId, NotificationId, OfferId};
use crate::error::StoreError;
use crate::model::{EscrowDoc, NotificationDoc, OfferDoc, OfferStatus};

/// Snapshot taken at the start of an atomic transition attempt.
#[derive(Debug, Clone)]
pub struct OfferTxn {
    pub offer_id: OfferId,
    /// The offer as currently stored; `None` if it was deleted.
    pub offer: Option<OfferDoc>,
    /// Existing escrow for this offer, if one was ever committed.
    pub escrow_id: Option<EscrowId>,
    /// Commit timestamp supplied by the store - all records written by this
    /// attempt carry the same instant.
    pub commit_time: DateTime<Utc>,
    /// Offer version observed at snapshot time; `commit` is conditional on it.
    pub version: u64,
}

/// The offer mutation inside a [`WriteSet`].
#[derive(Debug, Clone, PartialEq)]
pub struct OfferUpdate {
    pub status: OfferStatus,
    /// `Some` assigns the back-reference; `None` leaves the stored value
    /// untouched (normalization must not clear an existing escrowId).
    pub escrow_id: Option<EscrowId>,
    pub updated_at: DateTime<Utc>,
}

/// Everything one transition attempt writes, committed as a unit.
#[derive(Debug, Clone)]
pub struct WriteSet {
    pub offer: OfferUpdate,
    pub escrow: Option<(EscrowId, EscrowDoc)>,
    pub notifications: Vec<(NotificationId, NotificationDoc)>,
}

impl WriteSet {
    /// Full materialization: escrow insert, offer back-reference, both
    /// notifications.
    pub fn materialize(
        escrow_id: EscrowId,
        escrow: EscrowDoc,
        notifications: Vec<(NotificationId, NotificationDoc)>,
        commit_time: DateTime<Utc>,
    ) -> Self {
        Self {
            offer: OfferUpdate {
                status: OfferStatus::InEscrow,
                escrow_id: Some(escrow_id.clone()),
                updated_at: commit_time,
            },
            escrow: Some((escrow_id, escrow)),
            notifications,
        }
    }

    /// Normalization only: the escrow already exists, so just confirm the
    /// offer's status. No inserts, no escrowId reassignment.
    pub fn normalize(commit_time: DateTime<Utc>) -> Self {
        Self {
            offer: OfferUpdate {
                status: OfferStatus::InEscrow,
                escrow_id: None,
                updated_at: commit_time,
            },
            escrow: None,
            notifications: Vec::new(),
        }
    }
}

/// Atomic transition storage.
///
/// Held behind `Arc<dyn TransitionStore>` so hosts and tests can swap in
/// doubles (fault injection, real document-store clients).
#[async_trait]
pub trait TransitionStore: Send + Sync {
    /// Take a consistent snapshot of the offer and its escrow index entry.
    async fn begin(&self, offer_id: &OfferId) -> Result<OfferTxn, StoreError>;

    /// Apply the write set all-or-nothing, conditional on `txn.version`.
    async fn commit(&self, txn: &OfferTxn, writes: WriteSet) -> Result<(), StoreError>;
}

//! p2p_escrow - Idempotent offer-to-escrow transition engine
//!
//! Reacts to a trade-offer record's status change and, exactly once,
//! materializes an escrow record plus two notifications, updating the offer
//! with a back-reference. Safe under at-least-once event delivery: duplicate
//! and concurrent invocations for the same offer never duplicate state.
//!
//! # Modules
//!
//! - [`core_types`] - Document id types (OfferId, EscrowId, ...)
//! - [`model`] - Offer / Escrow / Notification record shapes
//! - [`error`] - Error taxonomy with stable codes
//! - [`guard`] - Transition guard (is this event the acceptance transition?)
//! - [`materialize`] - Escrow materializer
//! - [`notify`] - Notification composer
//! - [`store`] - TransitionStore seam + in-memory implementation
//! - [`engine`] - The orchestrator: snapshot, idempotency check, atomic commit
//! - [`config`] / [`logging`] - Host configuration and tracing setup
//!
//! # Flow
//!
//! ```text
//! Change Event ──▶ Guard ──▶ [atomic] re-read ──▶ escrow exists?
//!      (skip if not              │                 ├─ yes ─▶ normalize status
//!       pending→accepted)        │                 └─ no ──▶ escrow + offer
//!                                │                           + 2 notifications
//!                                └── conflict? retry from re-read
//! ```

pub mod config;
pub mod core_types;
pub mod engine;
pub mod error;
pub mod guard;
pub mod logging;
pub mod materialize;
pub mod model;
pub mod notify;
pub mod store;

// Convenient re-exports at crate root
pub use config::{AppConfig, EngineSettings};
pub use core_types::{EscrowId, NotificationId, OfferId, UserId};
pub use engine::{EscrowEngine, OfferChangeHandler, TransitionOutcome};
pub use error::{EscrowError, StoreError};
pub use model::{EscrowDoc, EscrowStatus, NotificationDoc, NotificationKind, Offer, OfferDoc, OfferStatus};
pub use store::{MemoryStore, OfferTxn, OfferUpdate, TransitionStore, WriteSet};

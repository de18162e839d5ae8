//! Core identifier types used throughout the system
//!
//! Document ids are opaque strings assigned by the record store. Ids minted
//! by this crate (escrows, notifications) are ULID strings, so they sort by
//! creation time.

use std::fmt;

use serde::{Deserialize, Serialize};
use ulid::Ulid;

macro_rules! doc_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }
    };
}

doc_id! {
    /// Offer document id - assigned upstream when the offer is listed.
    OfferId
}

doc_id! {
    /// Escrow document id - minted by this crate, exactly one per offer.
    EscrowId
}

doc_id! {
    /// Notification document id - minted by this crate.
    NotificationId
}

doc_id! {
    /// User document id - identifies both traders and buyers.
    UserId
}

impl EscrowId {
    /// Mint a fresh escrow id.
    ///
    /// Safe to call once per commit attempt: an id from an attempt that
    /// loses its commit conflict is discarded, never persisted.
    pub fn generate() -> Self {
        Self(Ulid::new().to_string())
    }
}

impl NotificationId {
    pub fn generate() -> Self {
        Self(Ulid::new().to_string())
    }
}

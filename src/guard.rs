//! Transition Guard
//!
//! Decides whether a change event represents the acceptance transition.
//! Pure - no I/O, no side effects - so irrelevant events are discarded
//! before any write path is opened.

use crate::model::{OfferDoc, OfferStatus};

/// Returns true only for a real status change landing on `accepted`.
///
/// An `after` snapshot with no status field at all is treated as not
/// applicable: a half-written offer is never acted on.
pub fn accepts(before: &OfferDoc, after: &OfferDoc) -> bool {
    let Some(after_status) = after.status else {
        return false;
    };
    if before.status == after.status {
        return false;
    }
    after_status == OfferStatus::Accepted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_status(status: Option<OfferStatus>) -> OfferDoc {
        OfferDoc {
            status,
            ..OfferDoc::default()
        }
    }

    #[test]
    fn test_accepts_pending_to_accepted() {
        let before = with_status(Some(OfferStatus::Pending));
        let after = with_status(Some(OfferStatus::Accepted));
        assert!(accepts(&before, &after));
    }

    #[test]
    fn test_rejects_unchanged_status() {
        let before = with_status(Some(OfferStatus::Accepted));
        let after = with_status(Some(OfferStatus::Accepted));
        assert!(!accepts(&before, &after));
    }

    #[test]
    fn test_rejects_non_accepted_target() {
        let before = with_status(Some(OfferStatus::Accepted));
        let after = with_status(Some(OfferStatus::InEscrow));
        assert!(!accepts(&before, &after));

        let before = with_status(Some(OfferStatus::Pending));
        let after = with_status(Some(OfferStatus::Cancelled));
        assert!(!accepts(&before, &after));
    }

    #[test]
    fn test_rejects_missing_after_status() {
        let before = with_status(Some(OfferStatus::Pending));
        let after = with_status(None);
        assert!(!accepts(&before, &after));
    }

    #[test]
    fn test_accepts_missing_before_status() {
        // Offer written without a status, then accepted: still a real change.
        let before = with_status(None);
        let after = with_status(Some(OfferStatus::Accepted));
        assert!(accepts(&before, &after));
    }
}

//! p2p_escrow demo host
//!
//! Wires the engine to an in-memory store, seeds one offer, and delivers the
//! acceptance event twice to show the exactly-once behavior. A production
//! host replaces `MemoryStore` with a real document-store client behind the
//! same `TransitionStore` trait and calls `handle` from its change-feed
//! subscription.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::info;

use p2p_escrow::config::AppConfig;
use p2p_escrow::core_types::{OfferId, UserId};
use p2p_escrow::engine::{EscrowEngine, OfferChangeHandler};
use p2p_escrow::logging::init_logging;
use p2p_escrow::model::{OfferDoc, OfferStatus};
use p2p_escrow::store::MemoryStore;

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load(&get_env());
    let _guard = init_logging(&config);

    let store = Arc::new(MemoryStore::new());
    let engine = EscrowEngine::with_retries(store.clone(), config.engine.max_commit_retries);

    // Seed the offer the acceptance service just flipped to accepted.
    let offer_id = OfferId::new("offer-demo-1");
    let accepted = OfferDoc {
        trader_id: Some(UserId::new("T1")),
        user_id: Some(UserId::new("B1")),
        amount_usdt: Some(Decimal::from(100)),
        asset: Some("USDT".to_string()),
        price_etb_per_usdt: Some(Decimal::from(150)),
        payment_method: Some("CBE".to_string()),
        status: Some(OfferStatus::Accepted),
        escrow_id: None,
        updated_at: None,
    };
    store.put_offer(&offer_id, accepted.clone());

    let before = OfferDoc {
        status: Some(OfferStatus::Pending),
        ..accepted.clone()
    };

    // First delivery materializes.
    let outcome = engine.handle(&before, &accepted, &offer_id).await?;
    info!(?outcome, "first delivery");

    // Redelivery of the same logical event only confirms.
    let outcome = engine.handle(&before, &accepted, &offer_id).await?;
    info!(?outcome, "duplicate delivery");

    let offer = store.offer(&offer_id).expect("offer still present");
    info!(
        status = ?offer.status,
        escrow_id = ?offer.escrow_id,
        escrows = store.escrow_count(),
        notifications = store.notification_count(),
        "final state"
    );

    Ok(())
}

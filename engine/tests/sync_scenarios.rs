//! End-to-end amount synchronization scenarios against mocked collaborators

use async_trait::async_trait;
use common::{
    AssetId, AssetInfo, AssetRegistry, BtcDisplayUnit, CollaboratorError, PriceTick, TradingPair,
};
use engine::{AmountSyncEngine, BoundsPolicy, EditSide, EngineConfig, EngineEvent};
use feed::TickStore;
use parking_lot::RwLock;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

struct FixedLiquidity {
    outbound: u64,
    inbound: u64,
    htlc: u64,
}

#[async_trait]
impl engine::LiquiditySource for FixedLiquidity {
    async fn outbound_capacity(&self, _asset: &AssetId) -> Result<u64, CollaboratorError> {
        Ok(self.outbound)
    }

    async fn inbound_capacity(&self, _asset: &AssetId) -> Result<u64, CollaboratorError> {
        Ok(self.inbound)
    }

    async fn max_outbound_htlc(&self) -> Result<u64, CollaboratorError> {
        Ok(self.htlc)
    }
}

struct StaticCatalog {
    pairs: Vec<TradingPair>,
}

#[async_trait]
impl engine::PairCatalog for StaticCatalog {
    async fn pairs(&self) -> Result<Vec<TradingPair>, CollaboratorError> {
        Ok(self.pairs.clone())
    }
}

fn tick(pair: &str, buy: f64, sell: f64, size: f64) -> PriceTick {
    PriceTick {
        pair: pair.to_string(),
        buy_price: buy,
        sell_price: sell,
        mark_price: buy,
        size,
        rfq_id: Some("rfq-1".to_string()),
        timestamp: None,
    }
}

fn drain(rx: &mut UnboundedReceiver<EngineEvent>) -> Vec<EngineEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn last_amounts(events: &[EngineEvent]) -> Option<(String, String)> {
    events.iter().rev().find_map(|event| match event {
        EngineEvent::AmountsUpdated { from_text, to_text } => {
            Some((from_text.clone(), to_text.clone()))
        }
        _ => None,
    })
}

/// BTC (settlement, displayed in BTC) against a precision-8 quote asset
fn btc_usd_setup(
    liquidity: FixedLiquidity,
    bounds_policy: BoundsPolicy,
) -> (
    Arc<AmountSyncEngine>,
    UnboundedReceiver<EngineEvent>,
    TickStore,
) {
    let mut registry = AssetRegistry::new();
    registry.insert(AssetInfo::new("btc-id", "BTC", "Bitcoin", 8));
    registry.insert(AssetInfo::new("usd-id", "USD", "Synthetic USD", 8));
    registry.set_display_unit(BtcDisplayUnit::Btc);

    let pair = TradingPair {
        base_asset: "BTC".to_string(),
        quote_asset: "USD".to_string(),
        base_asset_id: AssetId::from("btc-id"),
        quote_asset_id: AssetId::from("usd-id"),
        min_order_size: 1,
        max_order_size: 0,
        price_precision: 2,
        quantity_precision: 8,
    };

    let ticks = TickStore::new();
    ticks.update(tick("BTC/USD", 50_000.0, 50_100.0, 1.0));

    let (engine, events) = AmountSyncEngine::new(
        EngineConfig {
            debounce_ms: 300,
            bounds_policy,
        },
        Arc::new(RwLock::new(registry)),
        Arc::new(liquidity),
        Arc::new(StaticCatalog { pairs: vec![pair] }),
        ticks.clone(),
        AssetId::from("btc-id"),
        AssetId::from("usd-id"),
    );
    (engine, events, ticks)
}

/// Two plain precision-0 assets with a rate of 2.0
fn abc_xyz_setup(
    liquidity: FixedLiquidity,
    bounds_policy: BoundsPolicy,
) -> (Arc<AmountSyncEngine>, UnboundedReceiver<EngineEvent>) {
    let mut registry = AssetRegistry::new();
    registry.insert(AssetInfo::new("abc-id", "ABC", "Asset ABC", 0));
    registry.insert(AssetInfo::new("xyz-id", "XYZ", "Asset XYZ", 0));

    let pair = TradingPair {
        base_asset: "ABC".to_string(),
        quote_asset: "XYZ".to_string(),
        base_asset_id: AssetId::from("abc-id"),
        quote_asset_id: AssetId::from("xyz-id"),
        min_order_size: 0,
        max_order_size: 0,
        price_precision: 2,
        quantity_precision: 0,
    };

    let ticks = TickStore::new();
    ticks.update(tick("ABC/XYZ", 2.0, 2.1, 1.0));

    let (engine, events) = AmountSyncEngine::new(
        EngineConfig {
            debounce_ms: 300,
            bounds_policy,
        },
        Arc::new(RwLock::new(registry)),
        Arc::new(liquidity),
        Arc::new(StaticCatalog { pairs: vec![pair] }),
        ticks,
        AssetId::from("abc-id"),
        AssetId::from("xyz-id"),
    );
    (engine, events)
}

#[tokio::test(start_paused = true)]
async fn from_edit_recomputes_to_after_debounce() {
    let liquidity = FixedLiquidity {
        outbound: 1_000_000_000_000,
        inbound: 10_000_000_000_000,
        htlc: 1_000_000_000_000,
    };
    let (engine, mut events, _ticks) = btc_usd_setup(liquidity, BoundsPolicy::Clamp);
    engine.initialize().await;

    engine.on_from_amount_edited("0.001");
    tokio::time::sleep(Duration::from_millis(400)).await;

    let events = drain(&mut events);
    // 0.001 BTC is 100000 base units; at rate 50000 the quote side is
    // 5,000,000,000 base units
    assert_eq!(
        last_amounts(&events),
        Some(("0.00100000".to_string(), "50.00000000".to_string()))
    );
}

#[tokio::test(start_paused = true)]
async fn rapid_edits_collapse_into_one_recompute() {
    let liquidity = FixedLiquidity {
        outbound: 1_000_000,
        inbound: 10_000_000,
        htlc: 0,
    };
    let (engine, mut events) = abc_xyz_setup(liquidity, BoundsPolicy::Clamp);
    engine.initialize().await;

    engine.on_from_amount_edited("100");
    tokio::time::sleep(Duration::from_millis(100)).await;
    engine.on_from_amount_edited("150");
    tokio::time::sleep(Duration::from_millis(400)).await;

    let events = drain(&mut events);
    assert_eq!(
        last_amounts(&events),
        Some(("150".to_string(), "300".to_string()))
    );
    // The first edit's recompute was cancelled by the second edit
    assert!(!events.contains(&EngineEvent::AmountsUpdated {
        from_text: "100".to_string(),
        to_text: "200".to_string(),
    }));
}

#[tokio::test]
async fn zero_edit_clears_dependent_field_immediately() {
    let liquidity = FixedLiquidity {
        outbound: 1_000_000,
        inbound: 10_000_000,
        htlc: 0,
    };
    let (engine, mut events) = abc_xyz_setup(liquidity, BoundsPolicy::Clamp);
    engine.initialize().await;

    engine.on_from_amount_edited("0");

    let events = drain(&mut events);
    assert_eq!(
        last_amounts(&events),
        Some(("0".to_string(), String::new()))
    );
}

#[tokio::test]
async fn percentage_selection_recomputes_immediately() {
    let liquidity = FixedLiquidity {
        outbound: 1000,
        inbound: 10_000,
        htlc: 0,
    };
    let (engine, mut events) = abc_xyz_setup(liquidity, BoundsPolicy::Clamp);
    engine.initialize().await;

    engine.on_size_percentage_selected(50);

    let events = drain(&mut events);
    assert_eq!(
        last_amounts(&events),
        Some(("500".to_string(), "1,000".to_string()))
    );
}

#[tokio::test(start_paused = true)]
async fn swapping_assets_moves_texts_without_recompute() {
    let liquidity = FixedLiquidity {
        outbound: 1_000_000,
        inbound: 10_000_000,
        htlc: 0,
    };
    let (engine, mut events) = abc_xyz_setup(liquidity, BoundsPolicy::Clamp);
    engine.initialize().await;

    engine.on_from_amount_edited("100");
    tokio::time::sleep(Duration::from_millis(400)).await;
    drain(&mut events);

    engine.on_assets_swapped();

    let events = drain(&mut events);
    assert_eq!(events.len(), 1);
    assert_eq!(
        last_amounts(&events),
        Some(("200".to_string(), "100".to_string()))
    );
    assert_eq!(
        engine.selection(),
        (AssetId::from("xyz-id"), AssetId::from("abc-id"))
    );
}

#[tokio::test(start_paused = true)]
async fn clamp_policy_pulls_amount_into_range() {
    let liquidity = FixedLiquidity {
        outbound: 100,
        inbound: 10_000,
        htlc: 0,
    };
    let (engine, mut events) = abc_xyz_setup(liquidity, BoundsPolicy::Clamp);
    engine.initialize().await;

    engine.on_from_amount_edited("500");
    tokio::time::sleep(Duration::from_millis(400)).await;

    let events = drain(&mut events);
    assert_eq!(
        last_amounts(&events),
        Some(("100".to_string(), "200".to_string()))
    );
    assert!(
        !events
            .iter()
            .any(|e| matches!(e, EngineEvent::Advisory { .. }))
    );
}

#[tokio::test(start_paused = true)]
async fn advise_policy_keeps_amount_and_names_bound() {
    let liquidity = FixedLiquidity {
        outbound: 100,
        inbound: 10_000,
        htlc: 0,
    };
    let (engine, mut events) = abc_xyz_setup(liquidity, BoundsPolicy::Advise);
    engine.initialize().await;

    engine.on_from_amount_edited("500");
    tokio::time::sleep(Duration::from_millis(400)).await;

    let events = drain(&mut events);
    assert_eq!(
        last_amounts(&events),
        Some(("500".to_string(), "1,000".to_string()))
    );
    assert!(events.contains(&EngineEvent::Advisory {
        message: "Amount exceeds outbound channel liquidity".to_string(),
    }));
}

#[tokio::test]
async fn htlc_ceiling_caps_settlement_outbound() {
    let liquidity = FixedLiquidity {
        outbound: 1_000_000_000_000,
        inbound: 10_000_000_000_000,
        htlc: 500_000,
    };
    let (engine, _events, _ticks) = btc_usd_setup(liquidity, BoundsPolicy::Clamp);
    engine.initialize().await;

    let (_, max_from, _) = engine.bounds();
    assert_eq!(max_from, 500_000);
}

#[tokio::test]
async fn unknown_asset_selection_is_rejected() {
    let liquidity = FixedLiquidity {
        outbound: 1_000_000,
        inbound: 10_000_000,
        htlc: 0,
    };
    let (engine, mut events) = abc_xyz_setup(liquidity, BoundsPolicy::Clamp);
    engine.initialize().await;

    engine
        .on_asset_changed(EditSide::From, AssetId::from("qqq-id"))
        .await;

    let events = drain(&mut events);
    assert!(
        events
            .iter()
            .any(|e| matches!(e, EngineEvent::SelectionRejected { .. }))
    );
    assert_eq!(
        engine.selection(),
        (AssetId::from("abc-id"), AssetId::from("xyz-id"))
    );
}

#[tokio::test]
async fn asset_collision_resolves_to_complementary_pair() {
    let liquidity = FixedLiquidity {
        outbound: 1000,
        inbound: 10_000,
        htlc: 0,
    };
    let (engine, mut events) = abc_xyz_setup(liquidity, BoundsPolicy::Clamp);
    engine.initialize().await;

    // Selecting XYZ on the from side collides with the current to side;
    // the engine flips to the complementary asset and resets to 100%
    engine
        .on_asset_changed(EditSide::From, AssetId::from("xyz-id"))
        .await;

    assert_eq!(
        engine.selection(),
        (AssetId::from("xyz-id"), AssetId::from("abc-id"))
    );
    let events = drain(&mut events);
    assert!(last_amounts(&events).is_some());
}

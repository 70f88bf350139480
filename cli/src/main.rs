//! Channelswap demo wallet - Main Entry Point
//!
//! Wires the price feed, the amount synchronization engine and the swap
//! orchestrator together and streams their events to the log until ctrl-c.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use clap::Parser;
use common::{AssetId, AssetInfo, AssetRegistry, BtcDisplayUnit, CollaboratorError, TradingPair};
use engine::{AmountSyncEngine, EngineConfig, EngineEvent, LiquiditySource, PairCatalog};
use feed::{FeedConfig, FeedState, PriceFeedClient};
use parking_lot::RwLock;
use swap::{MakerClient, SwapConfig, SwapOrchestrator};
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "channelswap")]
#[command(about = "Lightning-channel swap wallet demo", long_about = None)]
struct Cli {
    /// Maker REST base URL
    #[arg(long, default_value = "http://localhost:8080/")]
    maker_url: String,

    /// Price feed websocket base URL
    #[arg(long, default_value = "http://localhost:8080/")]
    feed_url: String,

    /// Feed client identity (random when omitted)
    #[arg(long)]
    client_id: Option<String>,

    /// Node pubkey used in swap execution
    #[arg(long, default_value = "demo-taker-pubkey")]
    taker_pubkey: String,

    /// Pair to subscribe and trade
    #[arg(long, default_value = "BTC/USD")]
    pair: String,
}

/// Fixed channel capacities for the demo wiring
struct DemoLiquidity;

#[async_trait]
impl LiquiditySource for DemoLiquidity {
    async fn outbound_capacity(&self, _asset: &AssetId) -> Result<u64, CollaboratorError> {
        Ok(1_000_000_000)
    }

    async fn inbound_capacity(&self, _asset: &AssetId) -> Result<u64, CollaboratorError> {
        Ok(10_000_000_000_000)
    }

    async fn max_outbound_htlc(&self) -> Result<u64, CollaboratorError> {
        Ok(500_000_000)
    }
}

/// Single hard-coded pair standing in for the maker's pair catalog
struct DemoCatalog;

#[async_trait]
impl PairCatalog for DemoCatalog {
    async fn pairs(&self) -> Result<Vec<TradingPair>, CollaboratorError> {
        Ok(vec![TradingPair {
            base_asset: "BTC".to_string(),
            quote_asset: "USD".to_string(),
            base_asset_id: AssetId::from("btc-id"),
            quote_asset_id: AssetId::from("usd-id"),
            min_order_size: 1_000,
            max_order_size: 0,
            price_precision: 2,
            quantity_precision: 8,
        }])
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "channelswap=info,feed=info,engine=info,swap=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let client_id = cli
        .client_id
        .clone()
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    info!("Starting channelswap v{}", env!("CARGO_PKG_VERSION"));
    info!("Maker: {}", cli.maker_url);
    info!("Feed: {}", cli.feed_url);
    info!("Client id: {}", client_id);

    let mut registry = AssetRegistry::new();
    registry.insert(AssetInfo::new("btc-id", "BTC", "Bitcoin", 8));
    registry.insert(AssetInfo::new("usd-id", "USD", "Synthetic USD", 8));
    registry.set_display_unit(BtcDisplayUnit::Btc);
    let registry = Arc::new(RwLock::new(registry));

    // Feed client is an explicit object with a create/dispose lifecycle,
    // never a global singleton.
    let feed = PriceFeedClient::new(FeedConfig::default());
    feed.init(&cli.feed_url, &client_id);

    // Observed service URL; pushing a new value here re-initializes the feed
    let (_service_url_tx, service_url_rx) = watch::channel(cli.feed_url.clone());
    feed.watch_service_url(service_url_rx);

    let (engine, mut engine_events) = AmountSyncEngine::new(
        EngineConfig::default(),
        registry.clone(),
        Arc::new(DemoLiquidity),
        Arc::new(DemoCatalog),
        feed.tick_store(),
        AssetId::from("btc-id"),
        AssetId::from("usd-id"),
    );
    engine.initialize().await;
    engine.attach_ticks(feed.subscribe_ticks());

    let orchestrator = Arc::new(SwapOrchestrator::new(
        MakerClient::new(&cli.maker_url),
        registry,
        cli.taker_pubkey.clone(),
        SwapConfig::default(),
    ));

    tokio::spawn(async move {
        while let Some(event) = engine_events.recv().await {
            match event {
                EngineEvent::AmountsUpdated { from_text, to_text } => {
                    info!(from = %from_text, to = %to_text, "amounts");
                }
                EngineEvent::Advisory { message } => warn!(%message, "advisory"),
                EngineEvent::SelectionRejected { message } => warn!(%message, "selection"),
            }
        }
    });

    // Subscriptions are not queued and do not survive a reconnect, so
    // they are re-issued every time the socket opens.
    let feed_handle = feed.clone();
    let pair = cli.pair.clone();
    let mut feed_status = feed.status();
    tokio::spawn(async move {
        while feed_status.changed().await.is_ok() {
            let state = *feed_status.borrow_and_update();
            info!(?state, "feed state");
            if state == FeedState::Open {
                feed_handle.subscribe_pair(&pair);
            }
        }
    });

    let mut swap_status = orchestrator.status();
    tokio::spawn(async move {
        while swap_status.changed().await.is_ok() {
            info!(status = ?*swap_status.borrow_and_update(), "swap status");
        }
    });

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    feed.close();

    Ok(())
}

//! The amount synchronization engine

use crate::config::{BoundsPolicy, EngineConfig};
use crate::events::EngineEvent;
use crate::traits::{LiquiditySource, PairCatalog};
use common::{
    AssetId, AssetRegistry, Rate, TradingPair, effective_rate, format_units, parse_units,
};
use feed::TickStore;
use parking_lot::{Mutex, RwLock};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Which amount field the user edited last
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditSide {
    From,
    To,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BoundViolation {
    BelowMinimum,
    AboveOutbound,
    AboveInbound,
}

impl BoundViolation {
    const fn message(self) -> &'static str {
        match self {
            Self::BelowMinimum => "Amount is below the minimum order size",
            Self::AboveOutbound => "Amount exceeds outbound channel liquidity",
            Self::AboveInbound => "Amount exceeds inbound channel liquidity",
        }
    }
}

#[derive(Debug, Clone)]
struct FormState {
    from_asset: AssetId,
    to_asset: AssetId,
    from_units: u64,
    to_units: u64,
    pair: Option<TradingPair>,
    selected_pct: Option<u8>,
    min_from: u64,
    max_from: u64,
    max_to: u64,
}

/// Keeps the two amount fields consistent under the live rate
///
/// Edits recompute the dependent field after a debounce delay; percentage
/// selection and tick refreshes recompute immediately. Every recompute
/// reads the current state, so the last writer wins.
pub struct AmountSyncEngine {
    config: EngineConfig,
    registry: Arc<RwLock<AssetRegistry>>,
    liquidity: Arc<dyn LiquiditySource>,
    catalog: Arc<dyn PairCatalog>,
    ticks: TickStore,
    state: RwLock<FormState>,
    debounce: Mutex<Option<JoinHandle<()>>>,
    events: mpsc::UnboundedSender<EngineEvent>,
    // Handle to self for the spawned debounce and tick tasks
    weak: Weak<Self>,
}

impl AmountSyncEngine {
    /// Build the engine and hand back the event stream for the UI layer
    pub fn new(
        config: EngineConfig,
        registry: Arc<RwLock<AssetRegistry>>,
        liquidity: Arc<dyn LiquiditySource>,
        catalog: Arc<dyn PairCatalog>,
        ticks: TickStore,
        from_asset: AssetId,
        to_asset: AssetId,
    ) -> (Arc<Self>, mpsc::UnboundedReceiver<EngineEvent>) {
        let (events, events_rx) = mpsc::unbounded_channel();
        let engine = Arc::new_cyclic(|weak| Self {
            config,
            registry,
            liquidity,
            catalog,
            ticks,
            state: RwLock::new(FormState {
                from_asset,
                to_asset,
                from_units: 0,
                to_units: 0,
                pair: None,
                selected_pct: None,
                min_from: 0,
                max_from: 0,
                max_to: 0,
            }),
            debounce: Mutex::new(None),
            events,
            weak: weak.clone(),
        });
        (engine, events_rx)
    }

    /// Resolve the pair for the initial asset selection and compute bounds
    pub async fn initialize(&self) {
        let (from, to) = {
            let state = self.state.read();
            (state.from_asset.clone(), state.to_asset.clone())
        };
        match self.catalog.pairs().await {
            Ok(pairs) => {
                let pair = pairs
                    .iter()
                    .find(|p| p.orientation(&from, &to).is_some())
                    .cloned();
                if pair.is_none() {
                    warn!(%from, %to, "no tradable pair for initial assets");
                }
                self.state.write().pair = pair;
            }
            Err(e) => warn!(error = %e, "pair catalog unavailable during init"),
        }
        self.update_bounds().await;
    }

    /// Handle an edit of the from field
    ///
    /// Zero clears the to field immediately; any other value schedules a
    /// debounced recompute of `to = from x rate`.
    pub fn on_from_amount_edited(&self, text: &str) {
        self.on_amount_edited(EditSide::From, text);
    }

    /// Handle an edit of the to field; recomputes `from = to / rate`
    pub fn on_to_amount_edited(&self, text: &str) {
        self.on_amount_edited(EditSide::To, text);
    }

    fn on_amount_edited(&self, side: EditSide, text: &str) {
        let precision = {
            let registry = self.registry.read();
            let state = self.state.read();
            match side {
                EditSide::From => registry.precision_of(&state.from_asset),
                EditSide::To => registry.precision_of(&state.to_asset),
            }
        };
        let units = parse_units(text, precision);

        {
            let mut state = self.state.write();
            state.selected_pct = None;
            match side {
                EditSide::From => {
                    state.from_units = units;
                    if units == 0 {
                        state.to_units = 0;
                    }
                }
                EditSide::To => {
                    state.to_units = units;
                    if units == 0 {
                        state.from_units = 0;
                    }
                }
            }
        }

        if units == 0 {
            self.cancel_debounce();
            let cleared = match side {
                EditSide::From => EngineEvent::AmountsUpdated {
                    from_text: format_units(0, precision),
                    to_text: String::new(),
                },
                EditSide::To => EngineEvent::AmountsUpdated {
                    from_text: String::new(),
                    to_text: format_units(0, precision),
                },
            };
            self.emit(cleared);
            return;
        }

        // Reformat the edited field right away; the dependent field
        // follows after the debounce delay
        self.emit_amounts();
        self.schedule_recompute(side);
    }

    /// Set the from amount to a percentage of the maximum and recompute
    /// immediately, skipping the debounce
    pub fn on_size_percentage_selected(&self, pct: u8) {
        let pct = pct.min(100);
        {
            let mut state = self.state.write();
            state.selected_pct = Some(pct);
            state.from_units = percent_of(state.max_from, pct);
        }
        self.cancel_debounce();
        self.recompute(EditSide::From);
    }

    /// Swap the two sides in one update
    ///
    /// The displayed texts move with the assets; the dependent field is
    /// intentionally left stale until the next edit or refresh.
    pub fn on_assets_swapped(&self) {
        self.cancel_debounce();
        {
            let registry = self.registry.read();
            let mut state = self.state.write();
            let state = &mut *state;
            let old_from_text =
                format_units(state.from_units, registry.precision_of(&state.from_asset));
            let old_to_text = format_units(state.to_units, registry.precision_of(&state.to_asset));
            std::mem::swap(&mut state.from_asset, &mut state.to_asset);
            state.from_units = parse_units(&old_to_text, registry.precision_of(&state.from_asset));
            state.to_units = parse_units(&old_from_text, registry.precision_of(&state.to_asset));
            state.selected_pct = None;
        }
        self.emit_amounts();
    }

    /// Change the asset on one side
    ///
    /// A collision with the other side is resolved by picking a
    /// complementary asset from the tradable pairs. When no pair covers
    /// the selection the change is rejected and the prior selection kept.
    pub async fn on_asset_changed(&self, side: EditSide, asset: AssetId) {
        let pairs = match self.catalog.pairs().await {
            Ok(pairs) => pairs,
            Err(e) => {
                warn!(error = %e, "pair catalog unavailable");
                self.emit(EngineEvent::SelectionRejected {
                    message: "Trading pairs are currently unavailable".to_string(),
                });
                return;
            }
        };

        let (cur_from, cur_to) = {
            let state = self.state.read();
            (state.from_asset.clone(), state.to_asset.clone())
        };
        let (mut from, mut to) = match side {
            EditSide::From => (asset.clone(), cur_to),
            EditSide::To => (cur_from, asset.clone()),
        };

        if from == to {
            let complement = pairs.iter().find_map(|p| p.counterpart(&asset).cloned());
            match complement {
                Some(other) => match side {
                    EditSide::From => to = other,
                    EditSide::To => from = other,
                },
                None => {
                    self.emit(EngineEvent::SelectionRejected {
                        message: format!("No tradable pair involves {asset}"),
                    });
                    return;
                }
            }
        }

        let Some(pair) = pairs
            .iter()
            .find(|p| p.orientation(&from, &to).is_some())
            .cloned()
        else {
            self.emit(EngineEvent::SelectionRejected {
                message: format!("No tradable pair for {from}/{to}"),
            });
            return;
        };

        debug!(%from, %to, pair = %pair.pair_key(), "asset selection changed");
        {
            let mut state = self.state.write();
            state.from_asset = from;
            state.to_asset = to;
            state.pair = Some(pair);
        }
        self.update_bounds().await;
        self.on_size_percentage_selected(100);
    }

    /// Refresh min/max bounds from the pair and the node's liquidity
    ///
    /// A failing collaborator leaves the previous bound in place.
    pub async fn update_bounds(&self) {
        let (from_asset, to_asset, pair) = {
            let state = self.state.read();
            (
                state.from_asset.clone(),
                state.to_asset.clone(),
                state.pair.clone(),
            )
        };

        let min_from = pair.as_ref().map(|p| {
            let inverted = p.orientation(&from_asset, &to_asset).unwrap_or(false);
            let rate = self.current_rate(Some(p), inverted).value;
            let min = p.min_order_size as f64;
            units_from_f64(if inverted { min / rate } else { min * rate })
        });

        let settlement = self.registry.read().is_settlement(&from_asset);
        let mut max_from = None;
        match self.liquidity.outbound_capacity(&from_asset).await {
            Ok(capacity) => max_from = Some(capacity),
            Err(e) => warn!(error = %e, asset = %from_asset, "outbound capacity unavailable"),
        }
        if settlement {
            match self.liquidity.max_outbound_htlc().await {
                Ok(ceiling) => max_from = max_from.map(|m| m.min(ceiling)),
                Err(e) => {
                    warn!(error = %e, "HTLC ceiling unavailable");
                    max_from = None;
                }
            }
        }
        let max_to = match self.liquidity.inbound_capacity(&to_asset).await {
            Ok(capacity) => Some(capacity),
            Err(e) => {
                warn!(error = %e, asset = %to_asset, "inbound capacity unavailable");
                None
            }
        };

        let mut state = self.state.write();
        if let Some(min_from) = min_from {
            state.min_from = min_from;
        }
        if let Some(max_from) = max_from {
            state.max_from = max_from;
        }
        if let Some(max_to) = max_to {
            state.max_to = max_to;
        }
    }

    /// Recompute with the stored percentage selection, or from the from
    /// field when none is active; used after tick and bounds refreshes
    pub fn refresh_amounts(&self) {
        let pct = self.state.read().selected_pct;
        match pct {
            Some(pct) => self.on_size_percentage_selected(pct),
            None => self.recompute(EditSide::From),
        }
    }

    /// Recompute whenever a tick for the selected pair arrives
    pub fn attach_ticks(&self, mut ticks_rx: broadcast::Receiver<common::PriceTick>) {
        let Some(engine) = self.weak.upgrade() else {
            return;
        };
        tokio::spawn(async move {
            loop {
                match ticks_rx.recv().await {
                    Ok(tick) => {
                        let relevant = engine
                            .state
                            .read()
                            .pair
                            .as_ref()
                            .is_some_and(|p| p.pair_key() == tick.pair);
                        if relevant {
                            engine.refresh_amounts();
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!(skipped, "tick stream lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
    }

    /// Current bounds as seen by the form (min_from, max_from, max_to)
    #[must_use]
    pub fn bounds(&self) -> (u64, u64, u64) {
        let state = self.state.read();
        (state.min_from, state.max_from, state.max_to)
    }

    /// Currently selected (from, to) assets
    #[must_use]
    pub fn selection(&self) -> (AssetId, AssetId) {
        let state = self.state.read();
        (state.from_asset.clone(), state.to_asset.clone())
    }

    fn schedule_recompute(&self, side: EditSide) {
        let mut pending = self.debounce.lock();
        if let Some(handle) = pending.take() {
            handle.abort();
        }
        let Some(engine) = self.weak.upgrade() else {
            return;
        };
        let delay = Duration::from_millis(self.config.debounce_ms);
        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            engine.recompute(side);
        }));
    }

    fn cancel_debounce(&self) {
        if let Some(handle) = self.debounce.lock().take() {
            handle.abort();
        }
    }

    fn current_rate(&self, pair: Option<&TradingPair>, inverted: bool) -> Rate {
        let tick = pair.and_then(|p| self.ticks.latest(&p.pair_key()));
        effective_rate(tick.as_ref(), inverted)
    }

    /// One synchronization pass over the current state
    fn recompute(&self, side: EditSide) {
        let mut violation = None;
        {
            let mut state = self.state.write();
            let inverted = state
                .pair
                .as_ref()
                .and_then(|p| p.orientation(&state.from_asset, &state.to_asset))
                .unwrap_or(false);
            let rate = self.current_rate(state.pair.as_ref(), inverted).value;

            match side {
                EditSide::From => {
                    state.to_units = units_from_f64(state.from_units as f64 * rate);
                }
                EditSide::To => {
                    state.from_units = units_from_f64(state.to_units as f64 / rate);
                }
            }

            // A zero bound means it has not been resolved yet and does
            // not constrain anything. Inbound liquidity caps the from
            // side through the rate.
            let cap_outbound = (state.max_from > 0).then_some(state.max_from);
            let cap_inbound =
                (state.max_to > 0).then(|| units_from_f64(state.max_to as f64 / rate));

            if state.min_from > 0 && state.from_units < state.min_from {
                violation = Some(BoundViolation::BelowMinimum);
            } else if cap_outbound.is_some_and(|cap| state.from_units > cap) {
                violation = Some(BoundViolation::AboveOutbound);
            } else if cap_inbound.is_some_and(|cap| state.from_units > cap) {
                violation = Some(BoundViolation::AboveInbound);
            }

            if violation.is_some() && self.config.bounds_policy == BoundsPolicy::Clamp {
                let upper = cap_outbound
                    .unwrap_or(u64::MAX)
                    .min(cap_inbound.unwrap_or(u64::MAX))
                    .max(state.min_from);
                state.from_units = state.from_units.clamp(state.min_from, upper);
                state.to_units = units_from_f64(state.from_units as f64 * rate);
            }
        }

        self.emit_amounts();
        if let Some(violation) = violation {
            match self.config.bounds_policy {
                BoundsPolicy::Clamp => {}
                BoundsPolicy::Advise => self.emit(EngineEvent::Advisory {
                    message: violation.message().to_string(),
                }),
            }
        }
    }

    fn emit_amounts(&self) {
        let (from_text, to_text) = {
            let registry = self.registry.read();
            let state = self.state.read();
            (
                format_units(state.from_units, registry.precision_of(&state.from_asset)),
                format_units(state.to_units, registry.precision_of(&state.to_asset)),
            )
        };
        self.emit(EngineEvent::AmountsUpdated { from_text, to_text });
    }

    fn emit(&self, event: EngineEvent) {
        let _ = self.events.send(event);
    }
}

fn percent_of(units: u64, pct: u8) -> u64 {
    let scaled = u128::from(units) * u128::from(pct) / 100;
    u64::try_from(scaled).unwrap_or(u64::MAX)
}

/// Bounds-guarded f64 to base-unit cast; saturates above `u64::MAX`
fn units_from_f64(value: f64) -> u64 {
    if value.is_nan() || value <= 0.0 {
        return 0;
    }
    if value >= u64::MAX as f64 {
        return u64::MAX;
    }
    value.round() as u64
}

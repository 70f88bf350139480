//! Persistent price feed client with supervised reconnects
//!
//! The client owns one WebSocket connection at a time. A supervisor task
//! opens the socket, pumps frames, and retries with a fixed delay after
//! unexpected disconnects until the reconnect budget is spent. `init`
//! replaces any existing connection; `close` suppresses reconnection.

use crate::config::FeedConfig;
use crate::messages::{InboundFrame, OutboundFrame, PRICE_UPDATE_ACTION, SUBSCRIBE_PAIR_CHANNEL};
use crate::registry::{FeedListener, ListenerRegistry};
use crate::store::TickStore;
use chrono::{DateTime, TimeZone, Utc};
use common::{PriceTick, ServiceEndpoints};
use futures_util::{SinkExt, StreamExt};
use parking_lot::RwLock;
use rustc_hash::FxHashSet;
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU32, AtomicU64, Ordering};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{broadcast, mpsc, watch};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};
use url::Url;

/// Connection state of the feed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedState {
    Disconnected,
    Connecting,
    Open,
    Retrying,
    /// Reconnect budget spent; manual `reconnect` required
    Exhausted,
}

#[derive(Debug, Clone)]
struct Endpoint {
    base_url: String,
    client_id: String,
}

impl Endpoint {
    /// Websocket URL for this endpoint; http(s) service URLs map to ws(s)
    fn ws_url(&self) -> String {
        let url = format!("{}api/v1/market/ws/{}", self.base_url, self.client_id);
        if let Some(rest) = url.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = url.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            url
        }
    }
}

struct OutboundHandle {
    generation: u64,
    tx: mpsc::UnboundedSender<Message>,
}

/// Snapshot of client internals for display and troubleshooting
#[derive(Debug, Clone)]
pub struct FeedDiagnostics {
    pub state: FeedState,
    pub retry_count: u32,
    pub subscribed_pairs: Vec<String>,
    pub last_message_at: Option<DateTime<Utc>>,
    pub url: Option<String>,
}

/// Price feed client handle; cheap to clone
#[derive(Clone)]
pub struct PriceFeedClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    config: FeedConfig,
    endpoint: RwLock<Option<Endpoint>>,
    listeners: ListenerRegistry,
    ticks: TickStore,
    tick_tx: broadcast::Sender<PriceTick>,
    status_tx: watch::Sender<FeedState>,
    status_rx: watch::Receiver<FeedState>,
    outbound: RwLock<Option<OutboundHandle>>,
    subscribed: RwLock<FxHashSet<String>>,
    retry_count: AtomicU32,
    manual_close: AtomicBool,
    generation: AtomicU64,
    last_message_ms: AtomicI64,
}

impl PriceFeedClient {
    #[must_use]
    pub fn new(config: FeedConfig) -> Self {
        let (tick_tx, _) = broadcast::channel(config.tick_channel_capacity);
        let (status_tx, status_rx) = watch::channel(FeedState::Disconnected);
        Self {
            inner: Arc::new(ClientInner {
                config,
                endpoint: RwLock::new(None),
                listeners: ListenerRegistry::new(),
                ticks: TickStore::new(),
                tick_tx,
                status_tx,
                status_rx,
                outbound: RwLock::new(None),
                subscribed: RwLock::new(FxHashSet::default()),
                retry_count: AtomicU32::new(0),
                manual_close: AtomicBool::new(false),
                generation: AtomicU64::new(0),
                last_message_ms: AtomicI64::new(0),
            }),
        }
    }

    /// Shared latest-tick table fed by this client
    #[must_use]
    pub fn tick_store(&self) -> TickStore {
        self.inner.ticks.clone()
    }

    /// Subscribe to the broadcast stream of parsed price ticks
    #[must_use]
    pub fn subscribe_ticks(&self) -> broadcast::Receiver<PriceTick> {
        self.inner.tick_tx.subscribe()
    }

    /// Watch the connection state
    #[must_use]
    pub fn status(&self) -> watch::Receiver<FeedState> {
        self.inner.status_rx.clone()
    }

    /// Open (or replace) the connection to `{base_url}api/v1/market/ws/{client_id}`
    ///
    /// An empty URL is a logged no-op. Replacing a live connection asks the
    /// old socket to close; its subscriptions are not carried over.
    pub fn init(&self, base_url: &str, client_id: &str) {
        if base_url.is_empty() {
            error!("price feed init called with empty service URL");
            return;
        }
        let base = ServiceEndpoints::normalize(base_url);
        if let Err(e) = Url::parse(&base) {
            error!(url = %base, error = %e, "invalid price feed URL");
            return;
        }

        *self.inner.endpoint.write() = Some(Endpoint {
            base_url: base,
            client_id: client_id.to_string(),
        });
        self.inner.manual_close.store(false, Ordering::Relaxed);
        self.inner.retry_count.store(0, Ordering::Relaxed);
        let generation = self.inner.generation.fetch_add(1, Ordering::Relaxed) + 1;

        // Ask the previous connection, if any, to shut down
        self.inner.try_send(Message::Close(None));

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            inner.supervise(generation).await;
        });
    }

    /// Re-open the connection with the last known URL and client id
    pub fn reconnect(&self) {
        let endpoint = self.inner.endpoint.read().clone();
        match endpoint {
            Some(ep) => self.init(&ep.base_url, &ep.client_id),
            None => warn!("price feed reconnect requested before init"),
        }
    }

    /// Close the connection and suppress reconnection
    ///
    /// Cooperative: an in-flight connect attempt is not aborted, it winds
    /// down on its next supervision check.
    pub fn close(&self) {
        self.inner.manual_close.store(true, Ordering::Relaxed);
        if !self.inner.try_send(Message::Close(None)) {
            self.inner.set_state(FeedState::Disconnected);
        }
        info!("price feed close requested");
    }

    /// Subscribe to price updates for a pair
    ///
    /// The request is only sent (and the pair only recorded) while the
    /// socket is open; it is never queued.
    pub fn subscribe_pair(&self, pair: &str) {
        let data = json!({"action": "subscribe", "pair": pair});
        if self.inner.send_frame(SUBSCRIBE_PAIR_CHANNEL, data) {
            self.inner.subscribed.write().insert(pair.to_string());
            debug!(pair, "subscribed to pair prices");
        }
    }

    /// Stop price updates for a pair
    pub fn unsubscribe_pair(&self, pair: &str) {
        let data = json!({"action": "unsubscribe", "pair": pair});
        if self.inner.send_frame(SUBSCRIBE_PAIR_CHANNEL, data) {
            self.inner.subscribed.write().remove(pair);
            debug!(pair, "unsubscribed from pair prices");
        }
    }

    /// Send an arbitrary `{channel, data}` frame; dropped with a warning
    /// when the socket is not open
    pub fn send_message(&self, channel: &str, data: Value) {
        self.inner.send_frame(channel, data);
    }

    pub fn add_listener(&self, action: &str, listener: Arc<dyn FeedListener>) {
        self.inner.listeners.add(action, listener);
    }

    /// Remove one registration of `listener`; returns whether one was found
    pub fn remove_listener(&self, action: &str, listener: &Arc<dyn FeedListener>) -> bool {
        self.inner.listeners.remove(action, listener)
    }

    /// Re-init whenever the observed service URL changes to a new
    /// non-empty value
    pub fn watch_service_url(&self, mut url_rx: watch::Receiver<String>) {
        let client = self.clone();
        tokio::spawn(async move {
            while url_rx.changed().await.is_ok() {
                let url = url_rx.borrow_and_update().clone();
                if url.is_empty() {
                    continue;
                }
                let endpoint = client.inner.endpoint.read().clone();
                match endpoint {
                    Some(ep) if ep.base_url == ServiceEndpoints::normalize(&url) => {}
                    Some(ep) => {
                        info!(url = %url, "service URL changed, re-initializing price feed");
                        client.init(&url, &ep.client_id);
                    }
                    None => debug!(url = %url, "service URL changed before init, ignoring"),
                }
            }
        });
    }

    #[must_use]
    pub fn diagnostics(&self) -> FeedDiagnostics {
        let inner = &self.inner;
        let last_ms = inner.last_message_ms.load(Ordering::Relaxed);
        let mut subscribed_pairs: Vec<String> = inner.subscribed.read().iter().cloned().collect();
        subscribed_pairs.sort();
        FeedDiagnostics {
            state: *inner.status_rx.borrow(),
            retry_count: inner.retry_count.load(Ordering::Relaxed),
            subscribed_pairs,
            last_message_at: (last_ms > 0)
                .then(|| Utc.timestamp_millis_opt(last_ms).single())
                .flatten(),
            url: inner.endpoint.read().as_ref().map(Endpoint::ws_url),
        }
    }
}

impl ClientInner {
    fn set_state(&self, state: FeedState) {
        self.status_tx.send_replace(state);
    }

    fn replaced(&self, generation: u64) -> bool {
        self.generation.load(Ordering::Relaxed) != generation
    }

    fn touch(&self) {
        self.last_message_ms
            .store(Utc::now().timestamp_millis(), Ordering::Relaxed);
    }

    fn try_send(&self, message: Message) -> bool {
        match self.outbound.read().as_ref() {
            Some(handle) => handle.tx.send(message).is_ok(),
            None => false,
        }
    }

    fn send_frame(&self, channel: &str, data: Value) -> bool {
        match serde_json::to_string(&OutboundFrame { channel, data }) {
            Ok(text) => {
                let sent = self.try_send(Message::Text(text));
                if !sent {
                    warn!(channel, "price feed not connected, dropping message");
                }
                sent
            }
            Err(e) => {
                error!(channel, error = %e, "failed to serialize outbound frame");
                false
            }
        }
    }

    /// Connection supervisor: connect, pump, retry up to the budget
    async fn supervise(self: Arc<Self>, generation: u64) {
        loop {
            if self.replaced(generation) {
                return;
            }
            if self.manual_close.load(Ordering::Relaxed) {
                self.set_state(FeedState::Disconnected);
                return;
            }
            let Some(endpoint) = self.endpoint.read().clone() else {
                return;
            };
            let url = endpoint.ws_url();
            self.set_state(FeedState::Connecting);

            match connect_async(url.as_str()).await {
                Ok((stream, _)) => {
                    if self.replaced(generation) {
                        return;
                    }
                    info!(url = %url, "price feed connected");
                    self.retry_count.store(0, Ordering::Relaxed);
                    self.run_connection(stream, generation).await;
                    self.teardown(generation);
                }
                Err(e) => {
                    warn!(url = %url, error = %e, "price feed connect failed");
                }
            }

            if self.replaced(generation) {
                return;
            }
            if self.manual_close.load(Ordering::Relaxed) {
                self.set_state(FeedState::Disconnected);
                return;
            }

            let attempts = self.retry_count.load(Ordering::Relaxed);
            if attempts >= self.config.max_reconnects {
                error!(
                    attempts,
                    "price feed reconnect budget exhausted, giving up"
                );
                self.set_state(FeedState::Exhausted);
                return;
            }
            self.retry_count.store(attempts + 1, Ordering::Relaxed);
            self.set_state(FeedState::Retrying);
            tokio::time::sleep(Duration::from_millis(self.config.reconnect_delay_ms)).await;
        }
    }

    /// Pump one open socket until it drops
    async fn run_connection(
        &self,
        stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
        generation: u64,
    ) {
        let (mut write, mut read) = stream.split();
        let (out_tx, mut out_rx) = mpsc::unbounded_channel();
        *self.outbound.write() = Some(OutboundHandle {
            generation,
            tx: out_tx,
        });
        // Outbound handle must exist before Open is observable, otherwise a
        // subscriber reacting to the state change loses its first frame
        self.set_state(FeedState::Open);

        loop {
            tokio::select! {
                outbound = out_rx.recv() => {
                    match outbound {
                        Some(message) => {
                            if let Err(e) = write.send(message).await {
                                warn!(error = %e, "price feed send failed");
                                break;
                            }
                        }
                        None => break,
                    }
                }
                frame = read.next() => {
                    match frame {
                        Some(Ok(Message::Text(text))) => {
                            self.touch();
                            self.handle_text(&text);
                        }
                        Some(Ok(Message::Ping(payload))) => {
                            self.touch();
                            if let Err(e) = write.send(Message::Pong(payload)).await {
                                warn!(error = %e, "price feed pong failed");
                                break;
                            }
                        }
                        Some(Ok(Message::Close(_))) => {
                            info!("price feed closed by server");
                            break;
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            error!(error = %e, "price feed read error");
                            break;
                        }
                        None => break,
                    }
                }
            }
        }
    }

    /// Drop the connection's sender and its server-side subscriptions,
    /// unless a newer connection already took over
    fn teardown(&self, generation: u64) {
        let mut outbound = self.outbound.write();
        if outbound
            .as_ref()
            .is_some_and(|handle| handle.generation == generation)
        {
            *outbound = None;
            self.subscribed.write().clear();
        }
    }

    fn handle_text(&self, text: &str) {
        let frame: InboundFrame = match serde_json::from_str(text) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, "unparseable feed frame, ignoring");
                return;
            }
        };
        if frame.action == PRICE_UPDATE_ACTION {
            match serde_json::from_value::<PriceTick>(frame.data.clone()) {
                Ok(tick) => {
                    self.ticks.update(tick.clone());
                    let _ = self.tick_tx.send(tick);
                }
                Err(e) => warn!(error = %e, "malformed price update, ignoring"),
            }
        }
        self.listeners.dispatch(&frame.action, &frame.data);
    }
}

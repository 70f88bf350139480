//! Three-phase swap state machine
//!
//! Drives init, whitelist and execute strictly in sequence, publishes phase
//! progress on a watch channel and enforces a single in-flight session via a
//! try-lock. One coarse timeout wraps the full sequence.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use common::{AssetId, AssetRegistry, MSATS_PER_SAT};
use parking_lot::RwLock;
use thiserror::Error;
use tokio::sync::{watch, Mutex};
use tracing::{error, info, warn};

use crate::api::{
    ApiError, ExecuteSwapRequest, InitSwapRequest, MakerClient, WhitelistRequest,
};
use crate::config::SwapConfig;
use crate::descriptor::{DescriptorError, SwapString};

/// Phase of an in-flight swap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapPhase {
    Initializing,
    AwaitingWhitelist,
    Executing,
}

impl SwapPhase {
    /// User-facing progress label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Initializing => "(1/3) Requesting swap terms",
            Self::AwaitingWhitelist => "(2/3) Whitelisting swap",
            Self::Executing => "(3/3) Executing swap",
        }
    }
}

/// Record of a completed swap
#[derive(Debug, Clone, PartialEq)]
pub struct SwapReceipt {
    pub from_amount: u64,
    pub from_asset: AssetId,
    pub to_amount: u64,
    pub to_asset: AssetId,
    pub price: f64,
    pub payment_hash: String,
    pub timestamp: DateTime<Utc>,
}

/// Observable session status published on the watch channel
#[derive(Debug, Clone, PartialEq)]
pub enum SwapStatus {
    Idle,
    InProgress { phase: SwapPhase, label: String },
    Completed(SwapReceipt),
    Failed { message: String },
}

/// Terms the caller wants to swap, in original base units
#[derive(Debug, Clone)]
pub struct SwapTerms {
    pub from_amount: u64,
    pub from_asset: AssetId,
    pub to_amount: u64,
    pub to_asset: AssetId,
}

/// Swap session failures
#[derive(Debug, Error)]
pub enum SwapError {
    /// Another swap is already in flight
    #[error("a swap session is already active")]
    SessionActive,
    /// The coarse session timeout expired
    #[error("swap timed out")]
    Timeout,
    /// Descriptor failed integrity validation
    #[error(transparent)]
    Validation(#[from] DescriptorError),
    /// A maker call failed
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Sequential swap driver against one maker
pub struct SwapOrchestrator {
    api: MakerClient,
    registry: Arc<RwLock<AssetRegistry>>,
    taker_pubkey: String,
    config: SwapConfig,
    session: Mutex<()>,
    status_tx: watch::Sender<SwapStatus>,
    status_rx: watch::Receiver<SwapStatus>,
}

impl SwapOrchestrator {
    #[must_use]
    pub fn new(
        api: MakerClient,
        registry: Arc<RwLock<AssetRegistry>>,
        taker_pubkey: impl Into<String>,
        config: SwapConfig,
    ) -> Self {
        let (status_tx, status_rx) = watch::channel(SwapStatus::Idle);
        Self {
            api,
            registry,
            taker_pubkey: taker_pubkey.into(),
            config,
            session: Mutex::new(()),
            status_tx,
            status_rx,
        }
    }

    /// Subscribe to session status updates
    #[must_use]
    pub fn status(&self) -> watch::Receiver<SwapStatus> {
        self.status_rx.clone()
    }

    /// Run the full three-phase sequence for the given terms
    ///
    /// Rejects immediately if another session holds the lock. The lock is
    /// held until the session reaches a terminal state, including timeout.
    pub async fn execute(
        &self,
        terms: SwapTerms,
        rfq_id: Option<String>,
        price: f64,
    ) -> Result<SwapReceipt, SwapError> {
        let Ok(_session) = self.session.try_lock() else {
            warn!("swap rejected, session already active");
            return Err(SwapError::SessionActive);
        };

        info!(
            from_asset = %terms.from_asset,
            to_asset = %terms.to_asset,
            from_amount = terms.from_amount,
            to_amount = terms.to_amount,
            "swap session started"
        );

        let timeout = Duration::from_millis(self.config.timeout_ms);
        let result = match tokio::time::timeout(timeout, self.run_phases(&terms, rfq_id, price))
            .await
        {
            Ok(result) => result,
            Err(_) => {
                error!(timeout_ms = self.config.timeout_ms, "swap timed out");
                Err(SwapError::Timeout)
            }
        };

        match &result {
            Ok(receipt) => {
                info!(payment_hash = %receipt.payment_hash, "swap completed");
                self.status_tx.send_replace(SwapStatus::Completed(receipt.clone()));
            }
            Err(err) => {
                error!(error = %err, "swap failed");
                self.status_tx.send_replace(SwapStatus::Failed {
                    message: err.to_string(),
                });
            }
        }
        result
    }

    async fn run_phases(
        &self,
        terms: &SwapTerms,
        rfq_id: Option<String>,
        price: f64,
    ) -> Result<SwapReceipt, SwapError> {
        let request = self.wire_request(terms, rfq_id);

        self.set_phase(SwapPhase::Initializing);
        let init = self.api.init_swap(&request).await?;

        // The descriptor is maker-provided; verify it encodes exactly the
        // terms we asked for before letting it anywhere near phase two.
        let descriptor = SwapString::parse(&init.swapstring)?;
        descriptor.validate_against(&request, &init.payment_hash)?;

        self.set_phase(SwapPhase::AwaitingWhitelist);
        self.api
            .whitelist(&WhitelistRequest {
                swapstring: descriptor.raw.clone(),
            })
            .await?;

        self.set_phase(SwapPhase::Executing);
        self.api
            .execute_swap(&ExecuteSwapRequest {
                payment_hash: init.payment_hash.clone(),
                swapstring: descriptor.raw,
                taker_pubkey: self.taker_pubkey.clone(),
            })
            .await?;

        Ok(SwapReceipt {
            from_amount: terms.from_amount,
            from_asset: terms.from_asset.clone(),
            to_amount: terms.to_amount,
            to_asset: terms.to_asset.clone(),
            price,
            payment_hash: init.payment_hash,
            timestamp: Utc::now(),
        })
    }

    /// Build the init payload, converting settlement amounts to millisats
    fn wire_request(&self, terms: &SwapTerms, rfq_id: Option<String>) -> InitSwapRequest {
        let registry = self.registry.read();
        let wire_amount = |asset: &AssetId, amount: u64| {
            if registry.is_settlement(asset) {
                amount.saturating_mul(MSATS_PER_SAT)
            } else {
                amount
            }
        };
        InitSwapRequest {
            from_amount: wire_amount(&terms.from_asset, terms.from_amount),
            from_asset: terms.from_asset.to_string(),
            to_amount: wire_amount(&terms.to_asset, terms.to_amount),
            to_asset: terms.to_asset.to_string(),
            rfq_id,
        }
    }

    fn set_phase(&self, phase: SwapPhase) {
        info!(label = phase.label(), "swap phase");
        self.status_tx.send_replace(SwapStatus::InProgress {
            phase,
            label: phase.label().to_string(),
        });
    }
}

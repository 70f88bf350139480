//! Node-side collaborator seams

use async_trait::async_trait;
use common::{AssetId, CollaboratorError, TradingPair};

/// Channel liquidity as seen by the local node
#[async_trait]
pub trait LiquiditySource: Send + Sync {
    /// Spendable capacity for the asset, in its base units
    async fn outbound_capacity(&self, asset: &AssetId) -> Result<u64, CollaboratorError>;

    /// Receivable capacity for the asset, in its base units
    async fn inbound_capacity(&self, asset: &AssetId) -> Result<u64, CollaboratorError>;

    /// Largest single outgoing HTLC the node accepts, in settlement base units
    async fn max_outbound_htlc(&self) -> Result<u64, CollaboratorError>;
}

/// Pairs the maker currently quotes
#[async_trait]
pub trait PairCatalog: Send + Sync {
    async fn pairs(&self) -> Result<Vec<TradingPair>, CollaboratorError>;
}

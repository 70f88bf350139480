//! Trading pair metadata

use crate::assets::AssetId;
use serde::{Deserialize, Serialize};

/// A pair the maker quotes, with its order-size bounds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradingPair {
    /// Base asset ticker
    pub base_asset: String,
    /// Quote asset ticker
    pub quote_asset: String,
    pub base_asset_id: AssetId,
    pub quote_asset_id: AssetId,
    /// Smallest accepted order, in base-asset base units
    pub min_order_size: u64,
    /// Largest accepted order, in base-asset base units
    #[serde(default)]
    pub max_order_size: u64,
    #[serde(default)]
    pub price_precision: u8,
    #[serde(default)]
    pub quantity_precision: u8,
}

impl TradingPair {
    /// Feed topic key for this pair, `"BASE/QUOTE"`
    #[must_use]
    pub fn pair_key(&self) -> String {
        format!("{}/{}", self.base_asset, self.quote_asset)
    }

    /// Orientation of a conversion on this pair
    ///
    /// Returns `Some(false)` when `from` is the base asset (natural),
    /// `Some(true)` when `from` is the quote asset (inverted), and `None`
    /// when the assets do not match this pair.
    #[must_use]
    pub fn orientation(&self, from: &AssetId, to: &AssetId) -> Option<bool> {
        if *from == self.base_asset_id && *to == self.quote_asset_id {
            Some(false)
        } else if *from == self.quote_asset_id && *to == self.base_asset_id {
            Some(true)
        } else {
            None
        }
    }

    /// Whether this pair trades the given asset on either side
    #[must_use]
    pub fn involves(&self, asset: &AssetId) -> bool {
        *asset == self.base_asset_id || *asset == self.quote_asset_id
    }

    /// The asset on the opposite side of `asset`, if it is part of the pair
    #[must_use]
    pub fn counterpart(&self, asset: &AssetId) -> Option<&AssetId> {
        if *asset == self.base_asset_id {
            Some(&self.quote_asset_id)
        } else if *asset == self.quote_asset_id {
            Some(&self.base_asset_id)
        } else {
            None
        }
    }
}

//! Asset registry with per-asset display precision

use crate::constants::{DEFAULT_ASSET_PRECISION, SETTLEMENT_TICKER};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Opaque asset identifier as issued by the maker
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetId(pub String);

impl AssetId {
    /// Create a new asset id
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AssetId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Display unit for the settlement asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BtcDisplayUnit {
    /// Whole satoshis, no fractional digits
    Sat,
    /// Bitcoin with eight fractional digits
    Btc,
}

impl BtcDisplayUnit {
    /// Decimal precision implied by this unit
    #[must_use]
    pub const fn precision(self) -> u8 {
        match self {
            Self::Sat => 0,
            Self::Btc => 8,
        }
    }
}

/// Static description of a tradable asset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetInfo {
    pub id: AssetId,
    pub ticker: String,
    pub name: String,
    pub precision: u8,
}

impl AssetInfo {
    /// Create an asset description with explicit precision
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        ticker: impl Into<String>,
        name: impl Into<String>,
        precision: u8,
    ) -> Self {
        Self {
            id: AssetId::new(id),
            ticker: ticker.into(),
            name: name.into(),
            precision,
        }
    }
}

/// Lookup table from asset id to its display metadata
///
/// The settlement asset is special-cased: its effective precision follows
/// the currently selected display unit rather than the registered value.
#[derive(Debug, Clone)]
pub struct AssetRegistry {
    assets: HashMap<AssetId, AssetInfo>,
    display_unit: BtcDisplayUnit,
}

impl AssetRegistry {
    /// Create an empty registry displaying the settlement asset in sats
    #[must_use]
    pub fn new() -> Self {
        Self {
            assets: HashMap::new(),
            display_unit: BtcDisplayUnit::Sat,
        }
    }

    /// Register or replace an asset
    pub fn insert(&mut self, info: AssetInfo) {
        self.assets.insert(info.id.clone(), info);
    }

    /// Look up an asset by id
    #[must_use]
    pub fn get(&self, id: &AssetId) -> Option<&AssetInfo> {
        self.assets.get(id)
    }

    /// Whether the asset is the channel settlement asset
    #[must_use]
    pub fn is_settlement(&self, id: &AssetId) -> bool {
        self.assets
            .get(id)
            .is_some_and(|info| info.ticker.eq_ignore_ascii_case(SETTLEMENT_TICKER))
    }

    /// Change the display unit used for the settlement asset
    pub fn set_display_unit(&mut self, unit: BtcDisplayUnit) {
        self.display_unit = unit;
    }

    /// Current settlement-asset display unit
    #[must_use]
    pub const fn display_unit(&self) -> BtcDisplayUnit {
        self.display_unit
    }

    /// Effective decimal precision for an asset
    ///
    /// Unknown assets fall back to the default precision. The settlement
    /// asset reports the precision of the selected display unit.
    #[must_use]
    pub fn precision_of(&self, id: &AssetId) -> u8 {
        if self.is_settlement(id) {
            return self.display_unit.precision();
        }
        self.assets
            .get(id)
            .map_or(DEFAULT_ASSET_PRECISION, |info| info.precision)
    }
}

impl Default for AssetRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn registry() -> AssetRegistry {
        let mut reg = AssetRegistry::new();
        reg.insert(AssetInfo::new("btc-id", "BTC", "Bitcoin", 8));
        reg.insert(AssetInfo::new("usd-id", "USD", "US Dollar", 2));
        reg
    }

    #[test]
    fn settlement_precision_follows_display_unit() {
        let mut reg = registry();
        let btc = AssetId::from("btc-id");
        assert_eq!(reg.precision_of(&btc), 0);
        reg.set_display_unit(BtcDisplayUnit::Btc);
        assert_eq!(reg.precision_of(&btc), 8);
    }

    #[test]
    fn non_settlement_precision_is_registered_value() {
        let reg = registry();
        assert_eq!(reg.precision_of(&AssetId::from("usd-id")), 2);
    }

    #[test]
    fn unknown_asset_gets_default_precision() {
        let reg = registry();
        assert_eq!(
            reg.precision_of(&AssetId::from("mystery")),
            DEFAULT_ASSET_PRECISION
        );
    }

    #[test]
    fn settlement_detection_is_case_insensitive() {
        let mut reg = AssetRegistry::new();
        reg.insert(AssetInfo::new("x", "btc", "Bitcoin", 8));
        assert!(reg.is_settlement(&AssetId::from("x")));
    }
}

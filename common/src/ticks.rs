//! Price tick wire types published by the maker feed

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One price update for a trading pair, as received over the feed
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceTick {
    /// Pair key, `"BASE/QUOTE"`
    pub pair: String,
    /// Price at which the maker buys the base asset
    pub buy_price: f64,
    /// Price at which the maker sells the base asset
    pub sell_price: f64,
    /// Indicative mid price, display only
    #[serde(default)]
    pub mark_price: f64,
    /// Quote size the prices are valid for
    pub size: f64,
    /// Quote identifier, echoed back when initiating a swap
    #[serde(default)]
    pub rfq_id: Option<String>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn deserializes_camel_case_frame() {
        let json = r#"{
            "pair": "BTC/USD",
            "buyPrice": 50000.0,
            "sellPrice": 50100.0,
            "markPrice": 50050.0,
            "size": 1.0,
            "rfqId": "rfq-1"
        }"#;
        let tick: PriceTick = serde_json::from_str(json).unwrap();
        assert_eq!(tick.pair, "BTC/USD");
        assert_eq!(tick.buy_price, 50000.0);
        assert_eq!(tick.rfq_id.as_deref(), Some("rfq-1"));
        assert!(tick.timestamp.is_none());
    }

    #[test]
    fn missing_optional_fields_default() {
        let json = r#"{"pair":"X/Y","buyPrice":1.0,"sellPrice":2.0,"size":3.0}"#;
        let tick: PriceTick = serde_json::from_str(json).unwrap();
        assert_eq!(tick.mark_price, 0.0);
        assert!(tick.rfq_id.is_none());
    }
}

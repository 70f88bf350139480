//! Wire frames exchanged with the maker feed

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Channel used for pair price subscriptions
pub const SUBSCRIBE_PAIR_CHANNEL: &str = "SubscribePairPriceChannel";

/// Inbound action carrying a price tick
pub const PRICE_UPDATE_ACTION: &str = "priceUpdate";

/// Envelope for everything the client sends
#[derive(Debug, Serialize)]
pub struct OutboundFrame<'a> {
    pub channel: &'a str,
    pub data: Value,
}

/// Envelope for everything the server sends, keyed by action
#[derive(Debug, Deserialize)]
pub struct InboundFrame {
    pub action: String,
    #[serde(default)]
    pub data: Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn outbound_frame_shape() {
        let frame = OutboundFrame {
            channel: SUBSCRIBE_PAIR_CHANNEL,
            data: serde_json::json!({"action": "subscribe", "pair": "BTC/USD"}),
        };
        let text = serde_json::to_string(&frame).unwrap();
        assert_eq!(
            text,
            r#"{"channel":"SubscribePairPriceChannel","data":{"action":"subscribe","pair":"BTC/USD"}}"#
        );
    }

    #[test]
    fn inbound_frame_tolerates_missing_data() {
        let frame: InboundFrame = serde_json::from_str(r#"{"action":"pong"}"#).unwrap();
        assert_eq!(frame.action, "pong");
        assert!(frame.data.is_null());
    }
}

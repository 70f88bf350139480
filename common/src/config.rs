//! Service configuration

use serde::{Deserialize, Serialize};

/// External endpoints the wallet talks to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceEndpoints {
    /// Maker REST base URL, trailing slash included
    pub maker_base_url: String,
    /// Maker price feed websocket base URL, trailing slash included
    pub feed_ws_url: String,
}

impl Default for ServiceEndpoints {
    fn default() -> Self {
        Self {
            maker_base_url: "http://localhost:8080/".to_string(),
            feed_ws_url: "ws://localhost:8080/".to_string(),
        }
    }
}

impl ServiceEndpoints {
    /// Normalize a base URL so joining relative paths is safe
    #[must_use]
    pub fn normalize(url: &str) -> String {
        if url.is_empty() || url.ends_with('/') {
            url.to_string()
        } else {
            format!("{url}/")
        }
    }
}

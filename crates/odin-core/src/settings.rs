//! Discovery settings.
//!
//! Deserialized from the `[bridge]` table of the bridge's config file; every
//! field has a default so an empty table is valid.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::builder::AdapterKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeSettings {
    /// Prefix of every API path on the control server
    pub api_prefix: String,

    /// Poll period of synthesized and summary attributes
    pub update_period_ms: u64,

    /// Builder overrides by adapter name, e.g. `fp2 = "frame_processor"`
    pub adapter_kinds: HashMap<String, AdapterKind>,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            api_prefix: default_api_prefix(),
            update_period_ms: 200,
            adapter_kinds: HashMap::new(),
        }
    }
}

fn default_api_prefix() -> String {
    "api/0.1".to_string()
}

impl BridgeSettings {
    /// Poll period, at least one millisecond
    pub fn update_period(&self) -> Duration {
        Duration::from_millis(self.update_period_ms.max(1))
    }

    /// Builder kind for an adapter: configured override, else by convention
    pub fn adapter_kind(&self, adapter: &str) -> AdapterKind {
        self.adapter_kinds
            .get(adapter)
            .copied()
            .unwrap_or_else(|| AdapterKind::for_adapter(adapter))
    }
}

//! Root discovery: enumerate the server's adapters and build one subtree per
//! adapter.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::builder::{BuildContext, NodeBuilder, expect_string_list};
use crate::error::Result;
use crate::node::ControlNode;
use crate::settings::BridgeSettings;
use crate::transport::{Connection, REQUEST_METADATA_HEADER};
use crate::walker::walk;

/// Builders by adapter name.
///
/// Explicit registrations win; other adapters get the builder of their
/// configured or conventional [`AdapterKind`](crate::builder::AdapterKind).
pub struct AdapterRegistry {
    settings: BridgeSettings,
    builders: HashMap<String, Arc<dyn NodeBuilder>>,
}

impl AdapterRegistry {
    pub fn new(settings: BridgeSettings) -> Self {
        Self {
            settings,
            builders: HashMap::new(),
        }
    }

    /// Use `builder` for the adapter served as `adapter`
    pub fn register(&mut self, adapter: impl Into<String>, builder: Arc<dyn NodeBuilder>) {
        self.builders.insert(adapter.into(), builder);
    }

    pub fn builder_for(&self, adapter: &str) -> Arc<dyn NodeBuilder> {
        match self.builders.get(adapter) {
            Some(builder) => builder.clone(),
            None => self.settings.adapter_kind(adapter).builder(),
        }
    }
}

/// Builds the root of the control tree from a live server
pub struct Discovery {
    connection: Arc<dyn Connection>,
    settings: BridgeSettings,
    registry: AdapterRegistry,
}

impl Discovery {
    pub fn new(connection: Arc<dyn Connection>, settings: BridgeSettings) -> Self {
        let registry = AdapterRegistry::new(settings.clone());
        Self {
            connection,
            settings,
            registry,
        }
    }

    pub fn with_registry(mut self, registry: AdapterRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Discover every adapter and return the root node.
    ///
    /// A malformed adapter list aborts discovery. An adapter whose tree
    /// cannot be fetched or built is logged and left out.
    pub async fn discover(&self) -> Result<ControlNode> {
        self.connection.open().await;
        let result = self.discover_adapters().await;
        self.connection.close().await;
        result
    }

    async fn discover_adapters(&self) -> Result<ControlNode> {
        let api_prefix = &self.settings.api_prefix;
        let ctx = BuildContext::new(self.connection.clone())
            .with_update_period(self.settings.update_period());

        let response = self
            .connection
            .get(&format!("{}/adapters", api_prefix), &[])
            .await?;
        let adapters = expect_string_list(&response, "adapters", "adapters")?;
        info!(adapters = ?adapters, "Discovered adapters");

        let mut root = ControlNode::new(api_prefix.clone(), Vec::new());
        for adapter in adapters {
            let added = self
                .build_adapter(&adapter, &ctx)
                .await
                .and_then(|node| root.add_child(adapter.to_uppercase(), node));
            if let Err(e) = added {
                error!(adapter = %adapter, error = %e, "Failed to create adapter node, skipping");
            }
        }
        Ok(root)
    }

    async fn build_adapter(&self, adapter: &str, ctx: &BuildContext) -> Result<ControlNode> {
        let adapter_prefix = format!("{}/{}", self.settings.api_prefix, adapter);
        let tree = self
            .connection
            .get(&adapter_prefix, &[REQUEST_METADATA_HEADER])
            .await?;

        let parameters = walk(&tree);
        debug!(adapter = %adapter, parameters = parameters.len(), "Walked parameter tree");

        let mut node = ControlNode::new(adapter_prefix, parameters);
        self.registry.builder_for(adapter).build(&mut node, ctx).await?;
        Ok(node)
    }
}

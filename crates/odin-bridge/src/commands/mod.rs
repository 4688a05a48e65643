//! Command implementations for the odin-bridge CLI.

pub mod put;
pub mod run;
pub mod tree;

use anyhow::{Context, Result};
use odin_core::{ControlNode, Discovery, HttpConnection};
use std::sync::Arc;
use tracing::info;

use crate::config::Config;

/// Connect to the configured server and build the control tree
pub async fn discover(config: &Config) -> Result<ControlNode> {
    let connection = Arc::new(HttpConnection::new(&config.server.host, config.server.port));
    info!(server = %connection.base_url(), "Discovering control server");

    Discovery::new(connection, config.bridge.clone())
        .discover()
        .await
        .with_context(|| {
            format!(
                "Discovery failed for {}:{}",
                config.server.host, config.server.port
            )
        })
}

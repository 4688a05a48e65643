//! Adapter-specific hierarchy builders.
//!
//! A builder receives a [`ControlNode`] holding every parameter it owns and
//! follows the same two phases at each level:
//!
//! 1. **Partition** - move groups of parameters out of the node's residual
//!    list, one group per child (instance index, plugin name, sub-resource)
//! 2. **Recurse** - build each child with its own builder, then synthesize
//!    attributes for whatever is left on the node
//!
//! Builders for unrecognised adapters do no partitioning at all.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::attribute::{AccessMode, Attribute, DEFAULT_UPDATE_PERIOD, ParamTreeHandler};
use crate::datatype::DataType;
use crate::error::{Error, Result};
use crate::node::ControlNode;
use crate::transport::Connection;

mod eiger_fan;
mod meta_writer;
mod odin_data;

pub use eiger_fan::EigerFanAdapter;
pub use meta_writer::MetaWriterAdapter;
pub use odin_data::{
    FrameProcessorAdapter, FrameProcessorDataset, FrameProcessorInstance, FrameProcessorPlugin,
    FrameReceiverDecoder, FrameReceiverInstance, OdinDataAdapter,
};

/// Shared state for building a hierarchy
#[derive(Clone)]
pub struct BuildContext {
    pub connection: Arc<dyn Connection>,
    /// Poll period given to every synthesized attribute
    pub update_period: Duration,
}

impl BuildContext {
    pub fn new(connection: Arc<dyn Connection>) -> Self {
        Self {
            connection,
            update_period: DEFAULT_UPDATE_PERIOD,
        }
    }

    pub fn with_update_period(mut self, update_period: Duration) -> Self {
        self.update_period = update_period;
        self
    }
}

/// Populates a node: partitions its parameters into children, builds them,
/// and creates the node's own attributes.
#[async_trait]
pub trait NodeBuilder: Send + Sync {
    async fn build(&self, node: &mut ControlNode, ctx: &BuildContext) -> Result<()>;
}

/// Builder for adapters with no special structure
#[derive(Debug, Default, Clone, Copy)]
pub struct GenericAdapter;

#[async_trait]
impl NodeBuilder for GenericAdapter {
    async fn build(&self, node: &mut ControlNode, ctx: &BuildContext) -> Result<()> {
        node.synthesize_attributes(ctx)
    }
}

/// Known adapter builders, selectable by name in settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterKind {
    FrameProcessor,
    FrameReceiver,
    MetaWriter,
    EigerFan,
    Generic,
}

impl AdapterKind {
    /// Kind conventionally served under an adapter name
    pub fn for_adapter(adapter: &str) -> Self {
        match adapter {
            "fp" => Self::FrameProcessor,
            "fr" => Self::FrameReceiver,
            "mw" => Self::MetaWriter,
            "ef" => Self::EigerFan,
            _ => Self::Generic,
        }
    }

    pub fn builder(&self) -> Arc<dyn NodeBuilder> {
        match self {
            Self::FrameProcessor => Arc::new(FrameProcessorAdapter::new()),
            Self::FrameReceiver => Arc::new(OdinDataAdapter::frame_receiver()),
            Self::MetaWriter => Arc::new(MetaWriterAdapter),
            Self::EigerFan => Arc::new(EigerFanAdapter),
            Self::Generic => Arc::new(GenericAdapter),
        }
    }
}

/// Read a list of strings under `key`, e.g. `{"names": ["hdf", "offset"]}`.
///
/// Any other shape is a discovery error naming the response.
pub(crate) fn expect_string_list(response: &Value, key: &str, what: &str) -> Result<Vec<String>> {
    let Some(Value::Array(items)) = response.get(key) else {
        return Err(Error::discovery_shape(what, response));
    };

    items
        .iter()
        .map(|item| item.as_str().map(String::from))
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| Error::DiscoveryShape {
            what: format!("{} list", what),
            response: Value::Array(items.clone()).to_string(),
        })
}

/// Attribute bound to `subpath` below the node's API prefix
pub(crate) fn remote_attribute(
    node: &ControlNode,
    ctx: &BuildContext,
    name: &str,
    datatype: DataType,
    access: AccessMode,
    subpath: &str,
) -> Attribute {
    let address = format!("{}/{}", node.api_prefix(), subpath);
    let handler = ParamTreeHandler::new(address, ctx.connection.clone())
        .with_update_period(ctx.update_period);
    Attribute::remote(name, datatype, access, handler)
}

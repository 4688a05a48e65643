//! Builders for odin-data adapters.
//!
//! An odin-data adapter serves one subtree per application instance under
//! its numeric index:
//!
//! ```text
//! fp
//! ├── FP0
//! │   ├── HDF
//! │   │   └── DS
//! │   └── OFFSET
//! └── FP1
//!     └── ...
//! ```
//!
//! Frame receiver instances get a single `DECODER` child instead of plugins.

use async_trait::async_trait;
use indexmap::IndexMap;
use std::sync::Arc;
use tracing::{error, warn};

use super::{BuildContext, NodeBuilder, expect_string_list};
use crate::aggregate::{PathStep, Reducer, StatusSummaryUpdater, fan_out_attributes};
use crate::attribute::{AccessMode, Attribute};
use crate::datatype::DataType;
use crate::error::Result;
use crate::node::ControlNode;
use crate::parameter::Parameter;

/// Parameter keys that collide with node metadata in the host runtime
const INVALID_NAMES: [&str; 2] = ["name", "description"];

/// Config items that differ per frame processor instance
const FP_UNIQUE_CONFIG: &[&str] = &[
    "rank",
    "number",
    "ctrl_endpoint",
    "meta_endpoint",
    "fr_ready_cnxn",
    "fr_release_cnxn",
];

/// Config items that differ per frame receiver instance
const FR_UNIQUE_CONFIG: &[&str] = &[
    "ctrl_endpoint",
    "rx_ports",
    "rx_address",
    "frame_ready_endpoint",
    "frame_release_endpoint",
];

const DATASET: &str = "dataset";
const DECODER: &str = "decoder";

fn is_index(segment: &str) -> bool {
    !segment.is_empty() && segment.chars().all(|c| c.is_ascii_digit())
}

/// Group parameters by instance index, in order of first appearance
fn group_by_index(parameters: Vec<Parameter>) -> IndexMap<String, Vec<Parameter>> {
    let mut groups: IndexMap<String, Vec<Parameter>> = IndexMap::new();
    for parameter in parameters {
        let index = parameter.uri_segment(0).unwrap_or_default().to_string();
        groups.entry(index).or_default().push(parameter);
    }
    groups
}

/// Drop parameters with reserved names, then rebase the rest onto the
/// instance so that uris start at the mode segment and paths drop it.
fn scope_to_instance(node: &mut ControlNode) {
    let invalid = node.take_parameters(|p| {
        p.uri()
            .last()
            .is_some_and(|key| INVALID_NAMES.contains(&key.as_str()))
    });
    if !invalid.is_empty() {
        let paths: Vec<String> = invalid.iter().map(|p| p.uri().join("/")).collect();
        warn!(
            node = %node.api_prefix(),
            paths = ?paths,
            "Removing parameters with invalid names"
        );
    }

    node.map_parameters(|parameter| {
        let parameter = parameter.rebase(1);
        let path = parameter.uri_tail(1);
        parameter.with_path(path)
    });
}

// ─────────────────────────────────────────────────────────────────────────────
// Adapters
// ─────────────────────────────────────────────────────────────────────────────

/// Splits an odin-data adapter into one child per instance and fans config
/// out across them.
pub struct OdinDataAdapter {
    label: &'static str,
    instance: Arc<dyn NodeBuilder>,
    unique_config: &'static [&'static str],
}

impl OdinDataAdapter {
    pub fn new(
        label: &'static str,
        instance: Arc<dyn NodeBuilder>,
        unique_config: &'static [&'static str],
    ) -> Self {
        Self {
            label,
            instance,
            unique_config,
        }
    }

    pub fn frame_processor() -> Self {
        Self::new("FP", Arc::new(FrameProcessorInstance), FP_UNIQUE_CONFIG)
    }

    pub fn frame_receiver() -> Self {
        Self::new("FR", Arc::new(FrameReceiverInstance), FR_UNIQUE_CONFIG)
    }
}

#[async_trait]
impl NodeBuilder for OdinDataAdapter {
    async fn build(&self, node: &mut ControlNode, ctx: &BuildContext) -> Result<()> {
        let indexed = node.take_parameters(|p| p.uri_segment(0).is_some_and(is_index));

        for (index, parameters) in group_by_index(indexed) {
            let name = format!("{}{}", self.label, index);
            let mut instance =
                ControlNode::new(format!("{}/{}", node.api_prefix(), index), parameters);

            if let Err(e) = self.instance.build(&mut instance, ctx).await {
                error!(instance = %name, error = %e, "Failed to build instance, skipping");
                continue;
            }
            node.add_child(name, instance)?;
        }

        node.synthesize_attributes(ctx)?;

        for attribute in fan_out_attributes(node, self.unique_config)? {
            node.add_attribute(attribute)?;
        }
        Ok(())
    }
}

/// Frame processor adapter: an odin-data adapter with status summaries over
/// the HDF plugin of every instance.
pub struct FrameProcessorAdapter {
    inner: OdinDataAdapter,
}

impl FrameProcessorAdapter {
    pub fn new() -> Self {
        Self {
            inner: OdinDataAdapter::frame_processor(),
        }
    }

    fn summary(
        name: &str,
        datatype: DataType,
        reducer: Reducer,
        ctx: &BuildContext,
    ) -> Result<Attribute> {
        let path_filter = vec![PathStep::pattern(r"^FP\d+$")?, PathStep::exact("HDF")];
        let updater = StatusSummaryUpdater::new(path_filter, name, reducer)
            .with_update_period(ctx.update_period);
        Ok(Attribute::new(name, datatype, AccessMode::Read).with_updater(Arc::new(updater)))
    }
}

impl Default for FrameProcessorAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NodeBuilder for FrameProcessorAdapter {
    async fn build(&self, node: &mut ControlNode, ctx: &BuildContext) -> Result<()> {
        node.add_attribute(Self::summary("frames_written", DataType::Int, Reducer::Sum, ctx)?)?;
        node.add_attribute(Self::summary("writing", DataType::Bool, Reducer::Any, ctx)?)?;
        self.inner.build(node, ctx).await
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Frame processor
// ─────────────────────────────────────────────────────────────────────────────

/// One frame processor application; its plugins become children
#[derive(Debug, Default, Clone, Copy)]
pub struct FrameProcessorInstance;

#[async_trait]
impl NodeBuilder for FrameProcessorInstance {
    async fn build(&self, node: &mut ControlNode, ctx: &BuildContext) -> Result<()> {
        let plugins_path = format!("{}/status/plugins/names", node.api_prefix());
        let response = ctx.connection.get(&plugins_path, &[]).await?;
        let plugins = expect_string_list(&response, "names", "plugins")?;

        scope_to_instance(node);

        for plugin in plugins {
            let parameters =
                node.take_parameters(|p| p.path().first().is_some_and(|first| *first == plugin));
            let mut child = ControlNode::new(node.api_prefix(), parameters);
            FrameProcessorPlugin.build(&mut child, ctx).await?;
            node.add_child(plugin.to_uppercase(), child)?;
        }

        node.synthesize_attributes(ctx)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct FrameProcessorPlugin;

#[async_trait]
impl NodeBuilder for FrameProcessorPlugin {
    async fn build(&self, node: &mut ControlNode, ctx: &BuildContext) -> Result<()> {
        let dataset = node.take_parameters(|p| p.path_contains(DATASET));
        if !dataset.is_empty() {
            let mut child = ControlNode::new(node.api_prefix(), dataset);
            FrameProcessorDataset.build(&mut child, ctx).await?;
            node.add_child("DS", child)?;
        }

        node.map_parameters(|parameter| {
            let path = parameter.path().iter().skip(1).cloned().collect();
            parameter.with_path(path)
        });
        node.synthesize_attributes(ctx)
    }
}

/// Dataset definitions of a plugin, named from below `<mode>/<plugin>/dataset`
#[derive(Debug, Default, Clone, Copy)]
pub struct FrameProcessorDataset;

#[async_trait]
impl NodeBuilder for FrameProcessorDataset {
    async fn build(&self, node: &mut ControlNode, ctx: &BuildContext) -> Result<()> {
        node.map_parameters(|parameter| {
            let path = parameter.uri_tail(3);
            parameter.with_path(path)
        });
        node.synthesize_attributes(ctx)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Frame receiver
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Clone, Copy)]
pub struct FrameReceiverInstance;

#[async_trait]
impl NodeBuilder for FrameReceiverInstance {
    async fn build(&self, node: &mut ControlNode, ctx: &BuildContext) -> Result<()> {
        scope_to_instance(node);

        let decoder = node.take_parameters(|p| {
            let path = p.path();
            path.len() > 1 && path[..path.len() - 1].iter().any(|s| s == DECODER)
        });
        let mut child = ControlNode::new(node.api_prefix(), decoder);
        FrameReceiverDecoder.build(&mut child, ctx).await?;
        node.add_child("DECODER", child)?;

        node.synthesize_attributes(ctx)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct FrameReceiverDecoder;

#[async_trait]
impl NodeBuilder for FrameReceiverDecoder {
    async fn build(&self, node: &mut ControlNode, ctx: &BuildContext) -> Result<()> {
        node.map_parameters(|parameter| {
            let path = parameter.uri_tail(2);
            parameter.with_path(path)
        });
        node.synthesize_attributes(ctx)
    }
}

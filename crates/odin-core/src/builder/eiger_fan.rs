use async_trait::async_trait;

use super::{BuildContext, NodeBuilder, remote_attribute};
use crate::attribute::AccessMode;
use crate::datatype::DataType;
use crate::error::Result;
use crate::node::ControlNode;

/// Eiger fan adapter. The acquisition id lives on the first fan instance.
#[derive(Debug, Default, Clone, Copy)]
pub struct EigerFanAdapter;

#[async_trait]
impl NodeBuilder for EigerFanAdapter {
    async fn build(&self, node: &mut ControlNode, ctx: &BuildContext) -> Result<()> {
        let acquisition_id = remote_attribute(
            node,
            ctx,
            "acquisition_id",
            DataType::String,
            AccessMode::ReadWrite,
            "0/config/acqid",
        );
        node.add_attribute(acquisition_id)?;
        node.synthesize_attributes(ctx)
    }
}

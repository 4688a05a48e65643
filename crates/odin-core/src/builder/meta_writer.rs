use async_trait::async_trait;

use super::{BuildContext, NodeBuilder, remote_attribute};
use crate::attribute::AccessMode;
use crate::datatype::DataType;
use crate::error::Result;
use crate::node::ControlNode;

/// Acquisition controls of the meta writer, relative to the adapter
const STATIC_ATTRIBUTES: [(&str, DataType, AccessMode, &str); 5] = [
    ("acquisition_id", DataType::String, AccessMode::ReadWrite, "config/acquisition_id"),
    ("directory", DataType::String, AccessMode::ReadWrite, "config/directory"),
    ("file_prefix", DataType::String, AccessMode::ReadWrite, "config/file_prefix"),
    ("stop", DataType::Bool, AccessMode::Write, "config/stop"),
    ("writing", DataType::Bool, AccessMode::Read, "status/writing"),
];

/// Meta writer adapter: fixed acquisition controls plus its parameter tree
#[derive(Debug, Default, Clone, Copy)]
pub struct MetaWriterAdapter;

#[async_trait]
impl NodeBuilder for MetaWriterAdapter {
    async fn build(&self, node: &mut ControlNode, ctx: &BuildContext) -> Result<()> {
        for (name, datatype, access, subpath) in STATIC_ATTRIBUTES {
            let attribute = remote_attribute(node, ctx, name, datatype, access, subpath);
            node.add_attribute(attribute)?;
        }
        node.synthesize_attributes(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::MockConnection;
    use crate::walker::walk;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_meta_writer_adapter() {
        let connection = Arc::new(
            MockConnection::new()
                .with_response("api/0.1/mw/status/writing", json!({"writing": true})),
        );
        let ctx = BuildContext::new(connection.clone());
        let tree = json!({
            "status": {"writing": false, "written": 0},
            "config": {"directory": "/tmp"}
        });
        let mut node = ControlNode::new("api/0.1/mw", walk(&tree));

        MetaWriterAdapter.build(&mut node, &ctx).await.unwrap();

        let names: Vec<&str> = node.attributes().map(|(name, _)| name).collect();
        assert_eq!(
            names,
            vec![
                "acquisition_id",
                "directory",
                "file_prefix",
                "stop",
                "writing",
                "status_writing",
                "status_written",
                "config_directory"
            ]
        );

        let stop = node.attribute("stop").unwrap();
        assert_eq!(stop.access(), AccessMode::Write);
        assert_eq!(stop.update_period(), None);
        stop.put(&json!(true)).await.unwrap();
        assert_eq!(connection.puts(), vec![("api/0.1/mw/config/stop".to_string(), json!(true))]);

        let writing = node.attribute("writing").unwrap();
        writing.update(&node).await.unwrap();
        assert_eq!(writing.get().await, json!(true));
        assert!(writing.put(&json!(false)).await.is_err());
    }
}

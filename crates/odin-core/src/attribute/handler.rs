//! Handler binding an attribute to one path of the remote parameter tree.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use super::{Attribute, DEFAULT_UPDATE_PERIOD, Sender, Updater};
use crate::error::{Error, Result};
use crate::node::ControlNode;
use crate::transport::Connection;

/// Polls and puts a single parameter tree path
#[derive(Clone)]
pub struct ParamTreeHandler {
    path: String,
    connection: Arc<dyn Connection>,
    update_period: Duration,
}

impl ParamTreeHandler {
    pub fn new(path: impl Into<String>, connection: Arc<dyn Connection>) -> Self {
        Self {
            path: path.into(),
            connection,
            update_period: DEFAULT_UPDATE_PERIOD,
        }
    }

    pub fn with_update_period(mut self, update_period: Duration) -> Self {
        self.update_period = update_period;
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Final segment of the path, the key the server answers with
    fn key(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

#[async_trait]
impl Updater for ParamTreeHandler {
    fn update_period(&self) -> Duration {
        self.update_period
    }

    async fn update(&self, _node: &ControlNode, attr: &Attribute) -> Result<()> {
        let response = self.connection.get(&self.path, &[]).await?;

        let key = self.key();
        let value = response.get(key).ok_or_else(|| Error::MissingKey {
            key: key.to_string(),
            response: response.to_string(),
        })?;
        attr.set(value).await
    }
}

#[async_trait]
impl Sender for ParamTreeHandler {
    async fn put(&self, _attr: &Attribute, value: &Value) -> Result<()> {
        let response = self.connection.put(&self.path, value).await?;

        match response.get("error") {
            Some(error) => Err(Error::Rejected {
                path: self.path.clone(),
                value: value.to_string(),
                message: match error {
                    Value::String(message) => message.clone(),
                    other => other.to_string(),
                },
            }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::AccessMode;
    use crate::datatype::DataType;
    use crate::transport::mock::MockConnection;
    use serde_json::json;

    const PATH: &str = "api/0.1/fp/0/status/hdf/frames_written";

    fn frames_attribute(connection: Arc<MockConnection>) -> Attribute {
        Attribute::remote(
            "frames_written",
            DataType::Int,
            AccessMode::ReadWrite,
            ParamTreeHandler::new(PATH, connection),
        )
    }

    #[tokio::test]
    async fn test_update_reads_final_key() {
        let connection = Arc::new(
            MockConnection::new().with_response(PATH, json!({"frames_written": 42})),
        );
        let attr = frames_attribute(connection);
        let node = ControlNode::new("api/0.1/fp/0", Vec::new());

        attr.update(&node).await.unwrap();
        assert_eq!(attr.get().await, json!(42));
    }

    #[tokio::test]
    async fn test_update_missing_key_leaves_value_stale() {
        let connection = Arc::new(MockConnection::new().with_response(PATH, json!({"other": 1})));
        let attr = frames_attribute(connection.clone());
        let node = ControlNode::new("api/0.1/fp/0", Vec::new());
        attr.set(&json!(3)).await.unwrap();

        let result = attr.update(&node).await;
        assert!(matches!(result, Err(Error::MissingKey { .. })));
        assert_eq!(attr.get().await, json!(3));

        // Transport failure behaves the same way
        let attr = Attribute::remote(
            "missing",
            DataType::Int,
            AccessMode::Read,
            ParamTreeHandler::new("api/0.1/nowhere", connection),
        );
        assert!(attr.update(&node).await.is_err());
        assert_eq!(attr.get().await, json!(0));
    }

    #[tokio::test]
    async fn test_put_rejected_by_server() {
        let connection = Arc::new(
            MockConnection::new().with_put_response(PATH, json!({"error": "Invalid value"})),
        );
        let attr = frames_attribute(connection.clone());

        let result = attr.put(&json!(7)).await;
        match result {
            Err(Error::Rejected { path, message, .. }) => {
                assert_eq!(path, PATH);
                assert_eq!(message, "Invalid value");
            }
            other => panic!("expected rejection, got {:?}", other),
        }
        assert_eq!(connection.puts().len(), 1);
        assert_eq!(attr.get().await, json!(0));
    }

    #[test]
    fn test_key() {
        let handler = ParamTreeHandler::new(PATH, Arc::new(MockConnection::new()));
        assert_eq!(handler.key(), "frames_written");
    }
}

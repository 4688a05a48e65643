//! Periodic refresh of every polled attribute in a built tree.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::AbortHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info};

use crate::node::ControlNode;

/// Shortest poll period; `interval` rejects zero
const MIN_POLL_PERIOD: Duration = Duration::from_millis(1);

/// Handle for one attribute's poll task
struct PollHandle {
    attribute: String,
    abort_handle: AbortHandle,
}

/// Runs one task per readable attribute with an updater, each ticking at the
/// attribute's own update period. Dropping the poller stops every task.
pub struct Poller {
    handles: Vec<PollHandle>,
}

impl Poller {
    /// Spawn poll tasks for the whole tree. Must be called within a tokio
    /// runtime.
    pub fn start(root: Arc<ControlNode>) -> Self {
        let mut handles = Vec::new();

        for (path, attribute) in root.subtree_attributes() {
            if !attribute.access().readable() {
                continue;
            }
            let Some(period) = attribute.update_period() else {
                continue;
            };
            let period = period.max(MIN_POLL_PERIOD);

            let name = path
                .iter()
                .map(String::as_str)
                .chain([attribute.name()])
                .collect::<Vec<_>>()
                .join(".");
            let root = Arc::clone(&root);

            let handle = tokio::spawn(async move {
                let mut ticker = interval(period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

                loop {
                    ticker.tick().await;
                    let Some(node) = root.descend(&path) else {
                        break;
                    };
                    // Failures are logged by the attribute; keep polling
                    let _ = attribute.update(node).await;
                }
            });

            debug!(attribute = %name, period_ms = period.as_millis() as u64, "Started polling");
            handles.push(PollHandle {
                attribute: name,
                abort_handle: handle.abort_handle(),
            });
        }

        info!(tasks = handles.len(), "Poller started");
        Self { handles }
    }

    pub fn task_count(&self) -> usize {
        self.handles.len()
    }

    /// Dotted paths of the polled attributes
    pub fn attributes(&self) -> impl Iterator<Item = &str> {
        self.handles.iter().map(|handle| handle.attribute.as_str())
    }

    pub fn stop(&mut self) {
        for handle in self.handles.drain(..) {
            handle.abort_handle.abort();
        }
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::{AccessMode, Attribute, ParamTreeHandler};
    use crate::datatype::DataType;
    use crate::transport::mock::MockConnection;
    use serde_json::json;

    fn remote(
        connection: &Arc<MockConnection>,
        name: &str,
        access: AccessMode,
        path: &str,
    ) -> Attribute {
        let handler = ParamTreeHandler::new(path, connection.clone())
            .with_update_period(Duration::from_millis(10));
        Attribute::remote(name, DataType::Int, access, handler)
    }

    #[tokio::test]
    async fn test_poller_refreshes_attributes() {
        let connection = Arc::new(
            MockConnection::new().with_response("api/0.1/fp/0/status/frames", json!({"frames": 7})),
        );

        let mut fp0 = ControlNode::new("api/0.1/fp/0", Vec::new());
        let frames = remote(&connection, "frames", AccessMode::Read, "api/0.1/fp/0/status/frames");
        let reset = remote(&connection, "reset", AccessMode::Write, "api/0.1/fp/0/config/reset");
        fp0.add_attribute(frames).unwrap();
        fp0.add_attribute(reset).unwrap();
        let mut root = ControlNode::new("api/0.1/fp", Vec::new());
        root.add_child("FP0", fp0).unwrap();
        let root = Arc::new(root);

        let mut poller = Poller::start(root.clone());
        assert_eq!(poller.task_count(), 1);
        assert_eq!(poller.attributes().collect::<Vec<_>>(), vec!["FP0.frames"]);

        tokio::time::sleep(Duration::from_millis(50)).await;
        let frames = root.find_attribute("FP0.frames").unwrap();
        assert_eq!(frames.get().await, json!(7));
        assert!(frames.updated_at().await.is_some());

        poller.stop();
        assert_eq!(poller.task_count(), 0);
    }

    #[tokio::test]
    async fn test_poller_survives_failures() {
        let connection = Arc::new(MockConnection::new());
        let mut root = ControlNode::new("api/0.1/fp", Vec::new());
        root.add_attribute(remote(&connection, "frames", AccessMode::Read, "api/0.1/fp/frames"))
            .unwrap();
        let root = Arc::new(root);

        let _poller = Poller::start(root.clone());
        tokio::time::sleep(Duration::from_millis(30)).await;
        connection.set_response("api/0.1/fp/frames", json!({"frames": 3}));
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(connection.gets().len() > 1);
        assert_eq!(root.attribute("frames").unwrap().get().await, json!(3));
    }

    #[tokio::test]
    async fn test_zero_period_still_polls() {
        let connection = Arc::new(
            MockConnection::new().with_response("api/0.1/fp/frames", json!({"frames": 4})),
        );
        let handler = ParamTreeHandler::new("api/0.1/fp/frames", connection.clone())
            .with_update_period(Duration::ZERO);
        let mut root = ControlNode::new("api/0.1/fp", Vec::new());
        root.add_attribute(Attribute::remote("frames", DataType::Int, AccessMode::Read, handler))
            .unwrap();
        let root = Arc::new(root);

        let _poller = Poller::start(root.clone());
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert!(!connection.gets().is_empty());
        assert_eq!(root.attribute("frames").unwrap().get().await, json!(4));
    }
}

//! Poll the control tree until interrupted.

use anyhow::Result;
use odin_core::{Attribute, Poller};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{MissedTickBehavior, interval};
use tracing::info;

use crate::cli::RunArgs;
use crate::config::Config;
use crate::error::BridgeError;

pub async fn execute(args: RunArgs, config: &Config) -> Result<()> {
    let root = Arc::new(super::discover(config).await?);

    let watched = args
        .watch
        .iter()
        .map(|path| Ok((path.clone(), root.find_attribute(path)?.clone())))
        .collect::<Result<Vec<(String, Arc<Attribute>)>>>()?;

    let mut poller = Poller::start(root.clone());
    if poller.task_count() == 0 {
        return Err(BridgeError::NothingToPoll.into());
    }

    let mut report = interval(Duration::from_secs(args.report_secs.max(1)));
    report.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            _ = report.tick() => {
                for (path, attribute) in &watched {
                    info!(
                        attribute = %path,
                        value = %attribute.get().await,
                        updated_at = ?attribute.updated_at().await,
                        "Watched attribute"
                    );
                }
            }
        }
    }

    poller.stop();
    info!("Stopped polling");
    Ok(())
}

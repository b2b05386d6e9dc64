//! Page agent message loop

use std::sync::Arc;

use tokio::sync::{
    broadcast::{self, error::RecvError},
    mpsc,
};
use tracing::{debug, warn};

use crate::{
    agent::{AgentRequest, PageAgent},
    storage::{SettingsStore, StorageChange},
};

/// Serve controller requests and follow storage changes until every link to
/// the agent is dropped
pub async fn page_agent_task(
    mut agent: PageAgent,
    mut requests: mpsc::Receiver<AgentRequest>,
    mut changes: broadcast::Receiver<StorageChange>,
    store: Arc<dyn SettingsStore>,
) {
    let mut watching = true;

    loop {
        tokio::select! {
            // Settle the enabled flag before answering a request
            biased;

            change = changes.recv(), if watching => match change {
                Ok(change) => agent.apply_change(&change),
                Err(RecvError::Lagged(missed)) => {
                    warn!("Page agent missed {} storage changes, re-reading", missed);
                    agent.resync(store.as_ref());
                }
                Err(RecvError::Closed) => {
                    debug!("Storage change feed closed");
                    watching = false;
                }
            },

            request = requests.recv() => match request {
                Some(request) => agent.handle_request(request),
                None => break,
            },
        }
    }

    debug!("Page agent unloaded");
}

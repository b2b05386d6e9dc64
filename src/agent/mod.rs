//! Page agent
//!
//! The agent runs alongside a target page. It mirrors the `isEnabled` setting
//! through the store's change subscription and, when asked, activates the
//! page's save control.

pub mod pages;
pub mod save_control;

pub use pages::{Page, PageDirectory};
pub use save_control::{LoggingSaveControl, SaveControl};

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{
    mpsc::{self, error::TrySendError},
    oneshot,
};
use tracing::{debug, info, warn};

use crate::{
    protocol::AutoSaveResponse,
    storage::{SettingsStore, StorageChange},
    tasks::page_agent_task,
};

/// Path segment a page address must contain for an agent to load
pub const DEFAULT_PAGE_PATTERN: &str = "/workflow/";

const AGENT_QUEUE_CAPACITY: usize = 8;

/// Requests the controller can send to a page agent
#[derive(Debug)]
pub enum AgentRequest {
    AutoSave {
        reply: oneshot::Sender<AutoSaveResponse>,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("receiving end does not exist")]
    NoReceiver,
    #[error("page agent queue is full")]
    Busy,
}

/// Sending half of a loaded agent's message channel
#[derive(Debug, Clone)]
pub struct AgentLink {
    requests: mpsc::Sender<AgentRequest>,
}

impl AgentLink {
    pub fn new(requests: mpsc::Sender<AgentRequest>) -> Self {
        Self { requests }
    }

    /// Send `autoSave` without waiting. The returned receiver resolves to the
    /// agent's answer, or to an error when the agent answers nothing.
    pub fn request_auto_save(&self) -> Result<oneshot::Receiver<AutoSaveResponse>, DeliveryError> {
        let (reply, response) = oneshot::channel();
        self.requests
            .try_send(AgentRequest::AutoSave { reply })
            .map_err(|e| match e {
                TrySendError::Full(_) => DeliveryError::Busy,
                TrySendError::Closed(_) => DeliveryError::NoReceiver,
            })?;
        Ok(response)
    }
}

/// In-page state of a loaded agent
pub struct PageAgent {
    enabled: bool,
    control: Arc<dyn SaveControl>,
}

impl PageAgent {
    pub fn new(enabled: bool, control: Arc<dyn SaveControl>) -> Self {
        Self { enabled, control }
    }

    /// Activation guard, evaluated once when the page loads
    pub fn matches(url: &str, pattern: &str) -> bool {
        url.contains(pattern)
    }

    /// Load an agent into the page at `url`. Pages that fail the activation
    /// guard get no agent and never answer anything.
    pub fn install(
        url: &str,
        pattern: &str,
        store: Arc<dyn SettingsStore>,
        control: Arc<dyn SaveControl>,
    ) -> Page {
        if !Self::matches(url, pattern) {
            debug!("{} does not contain {}, no page agent installed", url, pattern);
            return Page::without_agent(url);
        }

        // Subscribe before reading so no change slips between the two
        let changes = store.subscribe();
        let enabled = match store.load() {
            Ok(values) => values.is_enabled.unwrap_or(false),
            Err(e) => {
                warn!("Page agent could not read settings, assuming disabled: {}", e);
                false
            }
        };

        let (requests_tx, requests_rx) = mpsc::channel(AGENT_QUEUE_CAPACITY);
        let agent = PageAgent::new(enabled, control);
        tokio::spawn(page_agent_task(agent, requests_rx, changes, store));

        info!("Auto-save page agent loaded for {}", url);
        Page::with_agent(url, AgentLink::new(requests_tx))
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn handle_request(&self, request: AgentRequest) {
        match request {
            AgentRequest::AutoSave { reply } => self.handle_trigger_request(reply),
        }
    }

    /// Activate the save control when enabled. When disabled the reply is
    /// dropped unanswered.
    fn handle_trigger_request(&self, reply: oneshot::Sender<AutoSaveResponse>) {
        if !self.enabled {
            debug!("Auto-save is disabled, ignoring trigger request");
            return;
        }

        if !self.control.activate() {
            debug!("Save control not found on page");
        }

        // Success only means the activation was attempted
        if reply.send(AutoSaveResponse { success: true }).is_err() {
            debug!("Controller stopped waiting for the auto-save answer");
        }
    }

    /// Follow a storage change notification
    pub fn apply_change(&mut self, change: &StorageChange) {
        if let Some(enabled) = change.is_enabled {
            info!("Page agent enabled flag changed to {}", enabled.new_value);
            self.enabled = enabled.new_value;
        }
    }

    /// Re-read the flag after missing notifications
    pub fn resync(&mut self, store: &dyn SettingsStore) {
        match store.load() {
            Ok(values) => self.enabled = values.is_enabled.unwrap_or(false),
            Err(e) => warn!("Page agent could not re-read settings: {}", e),
        }
    }
}

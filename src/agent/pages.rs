//! Active page tracking

use std::sync::{Arc, Mutex};

use tracing::info;

use super::AgentLink;

/// A page the controller can address
#[derive(Debug, Clone)]
pub struct Page {
    url: String,
    agent: Option<AgentLink>,
}

impl Page {
    pub fn with_agent(url: &str, agent: AgentLink) -> Self {
        Self {
            url: url.to_string(),
            agent: Some(agent),
        }
    }

    /// A page where no agent was loaded
    pub fn without_agent(url: &str) -> Self {
        Self {
            url: url.to_string(),
            agent: None,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn agent(&self) -> Option<&AgentLink> {
        self.agent.as_ref()
    }
}

/// Holds the single active page, the one auto-save targets
#[derive(Debug, Clone, Default)]
pub struct PageDirectory {
    active: Arc<Mutex<Option<Page>>>,
}

impl PageDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_active(&self, page: Page) {
        info!("Active page is now {}", page.url());
        if let Ok(mut active) = self.active.lock() {
            *active = Some(page);
        }
    }

    pub fn active(&self) -> Option<Page> {
        self.active.lock().ok().and_then(|active| active.clone())
    }
}

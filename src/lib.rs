//! agent-relay: forwards chat input to a managed AI agent service and
//! returns the aggregated streamed response.

use std::sync::Arc;

pub mod agent;
pub mod config;
pub mod decoder;
pub mod error;
pub mod handlers;
pub mod routes;

use agent::AgentInvoker;
use config::Config;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Configuration.
    pub config: Arc<Config>,
    /// Client for the managed agent runtime.
    pub agent: Arc<dyn AgentInvoker>,
}

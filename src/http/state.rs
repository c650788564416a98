use std::sync::Arc;

use crate::config::ServerConfig;
use crate::engine::ExecutionEngine;
use crate::store::{AccountStore, WorkflowStore};

/// Shared application state for axum handlers.
pub struct AppState {
    pub config: ServerConfig,
    pub engine: Arc<ExecutionEngine>,
    pub workflows: Arc<dyn WorkflowStore>,
    pub accounts: Arc<dyn AccountStore>,
}

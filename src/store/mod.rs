//! Persistence for accounts, sessions and workflows.
//!
//! The execution engine never touches storage: handlers load a workflow here,
//! hand its graph to the engine, and return the result.

use crate::error::StoreError;
use chrono::Duration;

pub mod model;
mod sqlite;

pub use model::*;
pub use sqlite::SqliteStore;

pub type Result<T> = std::result::Result<T, StoreError>;

pub trait WorkflowStore: Send + Sync {
    /// Returns `NotFound` when the workflow does not exist or belongs to someone else.
    fn load_workflow(&self, id: &str, owner_id: &str) -> Result<Workflow>;

    /// Creates the workflow when `draft.id` is `None`, otherwise replaces it.
    fn save_workflow(&self, draft: WorkflowDraft) -> Result<Workflow>;

    /// Summaries of the owner's workflows, most recently updated first.
    fn list_workflows(&self, owner_id: &str) -> Result<Vec<WorkflowSummary>>;

    /// Returns whether something was deleted.
    fn delete_workflow(&self, id: &str, owner_id: &str) -> Result<bool>;

    /// Every workflow of every owner. Debug surface only.
    fn list_all_workflows(&self) -> Result<Vec<WorkflowSummary>>;
}

pub trait AccountStore: Send + Sync {
    /// Fails with `Conflict` when the username is taken.
    fn create_account(&self, username: &str, password: &str, email: Option<&str>)
    -> Result<Account>;

    /// `None` when the username is unknown or the password does not match.
    fn verify_credentials(&self, username: &str, password: &str) -> Result<Option<Account>>;

    fn find_account(&self, id: &str) -> Result<Option<Account>>;

    fn list_accounts(&self) -> Result<Vec<Account>>;

    /// Issues a bearer token for the account, valid for `ttl`.
    fn create_session(&self, account_id: &str, ttl: Duration) -> Result<String>;

    /// Account id behind a live token. Expired tokens are removed and yield `None`.
    fn resolve_session(&self, token: &str) -> Result<Option<String>>;
}

use crate::graph::{Connection, GraphDefinition, Node};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named, owned, persisted graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub nodes: Vec<Node>,
    pub connections: Vec<Connection>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Workflow {
    pub fn graph(&self) -> GraphDefinition {
        GraphDefinition::new(self.nodes.clone(), self.connections.clone())
    }
}

/// What a caller hands to `save_workflow`. `id: None` creates a new workflow;
/// `Some` replaces name, nodes and connections of an existing one wholesale.
#[derive(Debug, Clone)]
pub struct WorkflowDraft {
    pub id: Option<String>,
    pub owner_id: String,
    pub name: String,
    pub graph: GraphDefinition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowSummary {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub node_count: usize,
    pub connection_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Workflow> for WorkflowSummary {
    fn from(w: &Workflow) -> Self {
        Self {
            id: w.id.clone(),
            owner_id: w.owner_id.clone(),
            name: w.name.clone(),
            node_count: w.nodes.len(),
            connection_count: w.connections.len(),
            created_at: w.created_at,
            updated_at: w.updated_at,
        }
    }
}

/// A user account, without credentials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub username: String,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

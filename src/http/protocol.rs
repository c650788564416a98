//! Wire-format types for the HTTP API.
//!
//! Request bodies are deserialized into loose `Raw*` structs first and then
//! converted into the strict graph model through `IntoGraph`, so malformed
//! input is rejected with a readable message instead of a serde error.

use crate::error::GraphConversionError;
use crate::graph::{Connection, GraphDefinition, IntoGraph, Node};
use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct RawGraph {
    #[serde(default)]
    pub nodes: Vec<RawNode>,
    #[serde(default)]
    pub connections: Vec<RawConnection>,
}

#[derive(Debug, Deserialize)]
pub struct RawNode {
    #[serde(default)]
    id: Value,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    value: Value,
    #[serde(default)]
    config: Value,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct RawConnection {
    #[serde(default, alias = "source")]
    from: Value,
    #[serde(default, alias = "target")]
    to: Value,
    #[serde(default, alias = "fromPort", alias = "sourceHandle")]
    from_port: Value,
    #[serde(default, alias = "toPort", alias = "targetHandle")]
    to_port: Value,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

fn invalid(message: String) -> GraphConversionError {
    GraphConversionError::ValidationError(message)
}

/// Ids may arrive as strings or integers; both become strings.
fn identifier(value: &Value, what: &str) -> Result<String, GraphConversionError> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Ok(s.clone()),
        Value::Number(n) if n.is_i64() || n.is_u64() => Ok(n.to_string()),
        Value::Null => Err(invalid(format!("{} is missing", what))),
        other => Err(invalid(format!("{} must be a non-empty string, got {}", what, other))),
    }
}

fn optional_port(value: &Value, what: &str) -> Result<Option<String>, GraphConversionError> {
    match value {
        Value::Null => Ok(None),
        other => identifier(other, what).map(Some),
    }
}

impl RawNode {
    fn into_node(self, position: usize) -> Result<Node, GraphConversionError> {
        let id = identifier(&self.id, &format!("nodes[{}].id", position))?;

        let kind = match self.kind {
            Some(kind) if !kind.trim().is_empty() => kind,
            _ => return Err(invalid(format!("node '{}' has no type", id))),
        };

        let value = match self.value {
            Value::Null => None,
            Value::Number(n) => Some(n),
            other => {
                return Err(invalid(format!(
                    "node '{}' value must be a number, got {}",
                    id, other
                )));
            }
        };

        let config = match self.config {
            Value::Null => Map::new(),
            Value::Object(map) => map,
            other => {
                return Err(invalid(format!(
                    "node '{}' config must be an object, got {}",
                    id, other
                )));
            }
        };

        Ok(Node {
            id,
            kind,
            value,
            config,
            extra: self.extra,
        })
    }
}

impl RawConnection {
    fn into_connection(self, position: usize) -> Result<Connection, GraphConversionError> {
        Ok(Connection {
            from: identifier(&self.from, &format!("connections[{}].from", position))?,
            to: identifier(&self.to, &format!("connections[{}].to", position))?,
            from_port: optional_port(&self.from_port, &format!("connections[{}].fromPort", position))?,
            to_port: optional_port(&self.to_port, &format!("connections[{}].toPort", position))?,
            extra: self.extra,
        })
    }
}

impl IntoGraph for RawGraph {
    fn into_graph(self) -> Result<GraphDefinition, GraphConversionError> {
        let nodes = self
            .nodes
            .into_iter()
            .enumerate()
            .map(|(i, n)| n.into_node(i))
            .collect::<Result<Vec<_>, _>>()?;
        let connections = self
            .connections
            .into_iter()
            .enumerate()
            .map(|(i, c)| c.into_connection(i))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(GraphDefinition { nodes, connections })
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginBody {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveWorkflowBody {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub workflow_id: Option<String>,
    #[serde(flatten)]
    pub graph: RawGraph,
}

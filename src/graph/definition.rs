use serde::{Deserialize, Serialize};
use serde_json::{Map, Number};

/// The canonical definition of a workflow graph, ready for validation.
/// This is the target structure for any custom data model conversion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDefinition {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub connections: Vec<Connection>,
}

impl GraphDefinition {
    pub fn new(nodes: Vec<Node>, connections: Vec<Connection>) -> Self {
        Self { nodes, connections }
    }

    pub fn find_node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

/// A single typed unit of computation in the graph.
///
/// `value` keeps the exact JSON number it was declared with and `config` keeps
/// its key order, so both survive save/load cycles unchanged. Fields the
/// engine does not know about (editor position, labels, ...) land in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Number>,
    #[serde(default)]
    pub config: Map<String, serde_json::Value>,
    #[serde(flatten)]
    pub extra: Map<String, serde_json::Value>,
}

impl Node {
    pub fn new(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            value: None,
            config: Map::new(),
            extra: Map::new(),
        }
    }

    /// Sets the declared value. Non-finite numbers cannot be represented in JSON and are dropped.
    pub fn with_value(mut self, value: f64) -> Self {
        self.value = Number::from_f64(value);
        self
    }

    pub fn with_config(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.config.insert(key.into(), value);
        self
    }

    pub fn declared_value(&self) -> Option<f64> {
        self.value.as_ref().and_then(Number::as_f64)
    }
}

/// A directed edge: `from` must be evaluated before `to`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    #[serde(alias = "source")]
    pub from: String,
    #[serde(alias = "target")]
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_port: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_port: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, serde_json::Value>,
}

impl Connection {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            from_port: None,
            to_port: None,
            extra: Map::new(),
        }
    }

    pub fn with_ports(mut self, from_port: impl Into<String>, to_port: impl Into<String>) -> Self {
        self.from_port = Some(from_port.into());
        self.to_port = Some(to_port.into());
        self
    }
}

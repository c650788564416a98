use super::definition::GraphDefinition;
use crate::error::GraphConversionError;

/// A trait for custom data models that can be converted into a `GraphDefinition`.
///
/// This is the boundary between loosely-typed input (request bodies, files from
/// other editors) and the strict graph model. The engine only ever sees the
/// result of a successful conversion.
///
/// # Example
///
/// ```rust
/// use webreal::prelude::*;
///
/// struct Pipeline {
///     steps: Vec<(String, f64)>,
/// }
///
/// impl IntoGraph for Pipeline {
///     fn into_graph(self) -> Result<GraphDefinition, GraphConversionError> {
///         let mut nodes = Vec::new();
///         for (name, value) in self.steps {
///             if name.is_empty() {
///                 return Err(GraphConversionError::ValidationError(
///                     "step without a name".to_string(),
///                 ));
///             }
///             nodes.push(Node::new(name, "input").with_value(value));
///         }
///         Ok(GraphDefinition::new(nodes, vec![]))
///     }
/// }
///
/// let graph = Pipeline { steps: vec![("a".to_string(), 1.0)] }.into_graph().unwrap();
/// assert_eq!(graph.nodes.len(), 1);
/// ```
pub trait IntoGraph {
    /// Consumes the object and converts it into a graph definition.
    fn into_graph(self) -> Result<GraphDefinition, GraphConversionError>;
}

impl IntoGraph for GraphDefinition {
    fn into_graph(self) -> Result<GraphDefinition, GraphConversionError> {
        Ok(self)
    }
}

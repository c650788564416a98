pub mod conversion;
pub mod definition;
pub mod validate;
pub mod value;

pub use conversion::*;
pub use definition::*;
pub use validate::{ValidatedGraph, topological_order, validate};
pub use value::Value;

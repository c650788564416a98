//! HTTP API over the engine and the stores.

mod error;
mod middleware;
mod protocol;
mod routes;
mod server;
mod state;

pub use error::ApiError;
pub use middleware::Authenticated;
pub use protocol::{LoginBody, RawConnection, RawGraph, RawNode, RegisterBody, SaveWorkflowBody};
pub use server::{WebrealServer, router};
pub use state::AppState;

use std::future::Future;
use std::sync::Arc;

use axum::Router;
use axum::http::{HeaderValue, Method, header};
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::engine::ExecutionEngine;
use crate::http::routes;
use crate::http::state::AppState;
use crate::store::{AccountStore, WorkflowStore};

/// Builds the application router over shared state.
///
/// Debug routes are only mounted when `state.config.debug_routes` is set.
pub fn router(state: Arc<AppState>) -> Router {
    let mut api = Router::new()
        .route("/api/health", get(routes::health))
        .route("/api/test", get(routes::test))
        // Accounts
        .route("/api/auth/register", post(routes::register))
        .route("/api/auth/login", post(routes::login))
        .route("/api/auth/me", get(routes::me))
        // Workflows
        .route("/api/workflow/save", post(routes::save_workflow))
        .route("/api/workflow/list", get(routes::list_workflows))
        .route("/api/workflow/execute", post(routes::execute_workflow))
        .route(
            "/api/workflow/{id}",
            get(routes::get_workflow).delete(routes::delete_workflow),
        );

    if state.config.debug_routes {
        api = api
            .route("/api/debug/users", get(routes::debug_users))
            .route("/api/debug/workflows", get(routes::debug_workflows));
    }

    api.fallback(routes::not_found)
        .layer(cors_layer(&state.config.frontend_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

/// HTTP server for the workflow API, built on axum.
pub struct WebrealServer {
    config: ServerConfig,
    engine: Arc<ExecutionEngine>,
    workflows: Arc<dyn WorkflowStore>,
    accounts: Arc<dyn AccountStore>,
}

impl WebrealServer {
    pub fn new(
        config: ServerConfig,
        engine: Arc<ExecutionEngine>,
        workflows: Arc<dyn WorkflowStore>,
        accounts: Arc<dyn AccountStore>,
    ) -> Self {
        Self {
            config,
            engine,
            workflows,
            accounts,
        }
    }

    pub fn state(&self) -> Arc<AppState> {
        Arc::new(AppState {
            config: self.config.clone(),
            engine: self.engine.clone(),
            workflows: self.workflows.clone(),
            accounts: self.accounts.clone(),
        })
    }

    /// Run the server until `shutdown` resolves.
    pub async fn run<F>(&self, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = router(self.state());

        let listener = TcpListener::bind(&self.config.bind).await?;
        info!(
            bind = %self.config.bind,
            debug_routes = self.config.debug_routes,
            "Server listening"
        );

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Server shut down");
        Ok(())
    }
}

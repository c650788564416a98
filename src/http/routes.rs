use std::sync::Arc;
use std::time::Duration;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde_json::{Value, json};
use tracing::{error, info, warn};

use crate::engine::ExecutionResult;
use crate::error::StoreError;
use crate::graph::IntoGraph;
use crate::http::error::ApiError;
use crate::http::middleware::Authenticated;
use crate::http::protocol::{LoginBody, RawGraph, RegisterBody, SaveWorkflowBody};
use crate::http::state::AppState;
use crate::store::{Account, WorkflowDraft};

type ApiResult<T> = Result<T, ApiError>;

fn workflow_error(e: StoreError, failure: &str) -> ApiError {
    match e {
        StoreError::NotFound => ApiError::not_found("Workflow not found"),
        other => ApiError::store(other, failure),
    }
}

fn session_response(state: &AppState, account: Account) -> ApiResult<Json<Value>> {
    let ttl = chrono::Duration::hours(state.config.token_ttl_hours);
    let token = state
        .accounts
        .create_session(&account.id, ttl)
        .map_err(|e| ApiError::store(e, "Failed to create session"))?;
    Ok(Json(json!({
        "success": true,
        "token": token,
        "user": account,
    })))
}

// GET /api/health
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "message": "Backend is running!",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

// GET /api/test
pub async fn test() -> Json<Value> {
    Json(json!({ "message": "Backend is running!" }))
}

// POST /api/auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    body: Result<Json<RegisterBody>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(body) = body?;
    let (username, password) = match (body.username, body.password) {
        (Some(u), Some(p)) if !u.trim().is_empty() && !p.is_empty() => (u, p),
        _ => return Err(ApiError::bad_request("Username and password required")),
    };
    let email = body.email.filter(|e| !e.trim().is_empty());

    let account = state
        .accounts
        .create_account(username.trim(), &password, email.as_deref())
        .map_err(|e| ApiError::store(e, "Registration failed"))?;
    info!(account_id = %account.id, username = %account.username, "account registered");

    session_response(&state, account)
}

// POST /api/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    body: Result<Json<LoginBody>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(body) = body?;
    let username = body.username.unwrap_or_default();
    let password = body.password.unwrap_or_default();

    let account = state
        .accounts
        .verify_credentials(username.trim(), &password)
        .map_err(|e| ApiError::store(e, "Login failed"))?
        .ok_or_else(|| ApiError::unauthorized("Invalid username or password"))?;
    info!(account_id = %account.id, "login");

    session_response(&state, account)
}

// GET /api/auth/me
pub async fn me(
    Authenticated(account_id): Authenticated,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Account>> {
    state
        .accounts
        .find_account(&account_id)
        .map_err(|e| ApiError::store(e, "Failed to get user"))?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("User not found"))
}

// POST /api/workflow/save
pub async fn save_workflow(
    Authenticated(account_id): Authenticated,
    State(state): State<Arc<AppState>>,
    body: Result<Json<SaveWorkflowBody>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(body) = body?;
    let name = body
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ApiError::bad_request("Workflow name required"))?;
    let graph = body.graph.into_graph()?;

    let draft = WorkflowDraft {
        id: body.workflow_id.filter(|id| !id.is_empty()),
        owner_id: account_id,
        name,
        graph,
    };
    let workflow = state
        .workflows
        .save_workflow(draft)
        .map_err(|e| workflow_error(e, "Failed to save workflow"))?;
    info!(
        workflow_id = %workflow.id,
        owner_id = %workflow.owner_id,
        nodes = workflow.nodes.len(),
        "workflow saved"
    );

    Ok(Json(json!({ "success": true, "workflow": workflow })))
}

// GET /api/workflow/list
pub async fn list_workflows(
    Authenticated(account_id): Authenticated,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Value>> {
    let workflows = state
        .workflows
        .list_workflows(&account_id)
        .map_err(|e| ApiError::store(e, "Failed to list workflows"))?;
    Ok(Json(json!({ "success": true, "workflows": workflows })))
}

// GET /api/workflow/{id}
pub async fn get_workflow(
    Authenticated(account_id): Authenticated,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let workflow = state
        .workflows
        .load_workflow(&id, &account_id)
        .map_err(|e| workflow_error(e, "Failed to get workflow"))?;
    Ok(Json(json!({ "success": true, "workflow": workflow })))
}

// DELETE /api/workflow/{id}
pub async fn delete_workflow(
    Authenticated(account_id): Authenticated,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let deleted = state
        .workflows
        .delete_workflow(&id, &account_id)
        .map_err(|e| workflow_error(e, "Failed to delete workflow"))?;
    if !deleted {
        return Err(ApiError::not_found("Workflow not found"));
    }
    info!(workflow_id = %id, owner_id = %account_id, "workflow deleted");
    Ok(Json(json!({ "success": true, "message": "Workflow deleted" })))
}

// POST /api/workflow/execute
//
// 200 on success, 400 when the graph is rejected before any node runs,
// 500 when a node fails or the run exceeds `execution_timeout_ms`.
pub async fn execute_workflow(
    Authenticated(account_id): Authenticated,
    State(state): State<Arc<AppState>>,
    body: Result<Json<RawGraph>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ExecutionResult>)> {
    let Json(raw) = body?;
    let graph = raw.into_graph()?;
    info!(
        account_id = %account_id,
        nodes = graph.nodes.len(),
        connections = graph.connections.len(),
        "executing workflow"
    );

    let engine = state.engine.clone();
    let limit = state.config.execution_timeout_ms;
    let task = tokio::task::spawn_blocking(move || engine.execute(graph));

    let result = match tokio::time::timeout(Duration::from_millis(limit), task).await {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => {
            error!(error = %e, "execution task failed");
            return Err(ApiError::internal("Failed to execute workflow"));
        }
        Err(_) => {
            warn!(account_id = %account_id, limit_ms = limit, "execution timed out");
            return Err(ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "execution_timeout",
                format!("Execution exceeded {} ms", limit),
            ));
        }
    };

    let status = match &result.error {
        None => StatusCode::OK,
        Some(info) if info.kind.is_graph_error() => StatusCode::BAD_REQUEST,
        Some(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    Ok((status, Json(result)))
}

// GET /api/debug/users
pub async fn debug_users(State(state): State<Arc<AppState>>) -> ApiResult<Json<Value>> {
    let users = state
        .accounts
        .list_accounts()
        .map_err(|e| ApiError::store(e, "Failed to fetch users"))?;
    Ok(Json(json!({ "users": users })))
}

// GET /api/debug/workflows
pub async fn debug_workflows(State(state): State<Arc<AppState>>) -> ApiResult<Json<Value>> {
    let workflows = state
        .workflows
        .list_all_workflows()
        .map_err(|e| ApiError::store(e, "Failed to fetch workflows"))?;
    Ok(Json(json!({ "workflows": workflows })))
}

pub async fn not_found() -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "Route not found" })),
    )
}

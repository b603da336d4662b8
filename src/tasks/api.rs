//! Task API Endpoints
//! Mission: Owner-scoped task CRUD for the authenticated account

use crate::api::{require_non_blank, ApiError};
use crate::auth::middleware::CurrentAccount;
use crate::tasks::{
    models::{CreateTaskRequest, DeleteTaskRequest, Task, UpdateTaskRequest},
    task_store::TaskStore,
};
use axum::{
    extract::{rejection::JsonRejection, rejection::PathRejection, Path, State},
    http::StatusCode,
    Extension, Json,
};
use std::sync::Arc;
use tracing::warn;

/// Shared task state
#[derive(Clone)]
pub struct TaskState {
    pub tasks: Arc<TaskStore>,
}

impl TaskState {
    pub fn new(tasks: Arc<TaskStore>) -> Self {
        Self { tasks }
    }
}

/// List own tasks - GET /api/tasks
pub async fn list_tasks(
    State(state): State<TaskState>,
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
) -> Result<Json<Vec<Task>>, ApiError> {
    Ok(Json(state.tasks.list_by_owner(&account.id).await?))
}

/// Get own task - GET /api/tasks/:id
pub async fn get_task(
    State(state): State<TaskState>,
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
    id: Result<Path<String>, PathRejection>,
) -> Result<Json<Task>, ApiError> {
    let Path(id) = id?;
    Ok(Json(state.tasks.get_by_id(&id, &account.id).await?))
}

/// Create task - POST /api/tasks
pub async fn create_task(
    State(state): State<TaskState>,
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
    payload: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let Json(payload) = payload?;
    require_non_blank("title", &payload.title)?;

    let task = state.tasks.create(&payload.title, &account.id).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

/// Update own task - PUT /api/tasks
///
/// The owner always comes from the session; a body naming someone else is refused.
pub async fn update_task(
    State(state): State<TaskState>,
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
    payload: Result<Json<UpdateTaskRequest>, JsonRejection>,
) -> Result<Json<Task>, ApiError> {
    let Json(payload) = payload?;

    if let Some(owner_id) = payload.owner_id.as_deref() {
        if owner_id != account.id {
            warn!(account_id = %account.id, task_id = %payload.id, "Refused task reassignment");
            return Err(ApiError::Forbidden);
        }
    }
    require_non_blank("title", &payload.title)?;

    let task = Task {
        id: payload.id,
        title: payload.title,
        owner_id: account.id,
    };
    state.tasks.update(&task).await?;

    Ok(Json(task))
}

/// Delete own task - DELETE /api/tasks
pub async fn delete_task(
    State(state): State<TaskState>,
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
    payload: Result<Json<DeleteTaskRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(payload) = payload?;
    state.tasks.delete(&payload.task_id, &account.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

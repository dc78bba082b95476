//! HTTP handlers for the todo API.
//!
//! The store is synchronous, so each call runs on the blocking pool and the
//! result is mapped back into an [`ApiErrorResponse`] on failure.

use std::sync::Arc;

use axum::{
    extract::{FromRequest, Path, State},
    Json,
};
use todos_core::{
    CreateTaskRequest, DeleteAck, NewTask, SharedRepository, Task, TaskError, TaskId, TaskPatch,
    TaskService, UpdateTaskRequest,
};

use super::error::ApiErrorResponse;

/// Shared application dependencies.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<TaskService<SharedRepository>>,
}

impl AppState {
    pub fn new(repository: SharedRepository) -> Self {
        Self {
            service: Arc::new(TaskService::new(repository)),
        }
    }
}

/// `Json` extractor whose rejection uses the API error shape.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiErrorResponse))]
pub struct ApiJson<T>(pub T);

async fn run_blocking<T, F>(
    state: &AppState,
    context: &'static str,
    op: F,
) -> Result<T, ApiErrorResponse>
where
    T: Send + 'static,
    F: FnOnce(&TaskService<SharedRepository>) -> Result<T, TaskError> + Send + 'static,
{
    let service = Arc::clone(&state.service);
    let joined = tokio::task::spawn_blocking(move || op(&service)).await;
    match joined {
        Ok(result) => result.map_err(ApiErrorResponse::from),
        Err(error) => {
            tracing::error!(%error, "store task panicked or was cancelled");
            Err(ApiErrorResponse::internal_error(context))
        }
    }
}

fn parse_id(raw: &str) -> Result<TaskId, ApiErrorResponse> {
    raw.parse::<TaskId>().map_err(ApiErrorResponse::from)
}

/// `GET /todos`: every task, newest first.
pub async fn list_todos(
    State(state): State<AppState>,
) -> Result<Json<Vec<Task>>, ApiErrorResponse> {
    let tasks =
        run_blocking(&state, "Failed to fetch todos", |service| service.list_tasks()).await?;
    Ok(Json(tasks))
}

/// `POST /todos`: creates a task from `{text}`.
pub async fn create_todo(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateTaskRequest>,
) -> Result<Json<Task>, ApiErrorResponse> {
    let input = NewTask::try_from(request)?;
    let task = run_blocking(&state, "Failed to create todo", move |service| {
        service.create_task(input)
    })
    .await?;
    Ok(Json(task))
}

/// `PATCH /todos/{id}`: applies `{text?, completed?}`.
pub async fn update_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<UpdateTaskRequest>,
) -> Result<Json<Task>, ApiErrorResponse> {
    let id = parse_id(&id)?;
    let patch = TaskPatch::try_from(request)?;
    let task = run_blocking(&state, "Failed to update todo", move |service| {
        service.update_task(&id, &patch)
    })
    .await?;
    Ok(Json(task))
}

/// `DELETE /todos/{id}`.
pub async fn delete_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteAck>, ApiErrorResponse> {
    let id = parse_id(&id)?;
    run_blocking(&state, "Failed to delete todo", move |service| service.delete_task(&id)).await?;
    Ok(Json(DeleteAck::deleted()))
}

pub async fn health_check() -> &'static str {
    "OK"
}

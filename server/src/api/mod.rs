//! HTTP surface: routes, handlers and error mapping.

pub mod error;
pub mod handlers;

use axum::routing::{get, patch};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use error::{ApiErrorResponse, ErrorBody};
pub use handlers::{
    create_todo, delete_todo, health_check, list_todos, update_todo, ApiJson, AppState,
};

/// Builds the router with tracing and permissive CORS for browser clients.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/todos", get(list_todos).post(create_todo))
        .route("/todos/{id}", patch(update_todo).delete(delete_todo))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

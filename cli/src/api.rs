//! Typed client for the todo HTTP API.
//!
//! Each call issues one request. Non-2xx responses become
//! [`ApiError::Status`] carrying the server's `{error}` message, or a generic
//! one when the body is missing or unparsable.

use futures::future::join_all;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;
use todos_core::{
    CreateTaskRequest, DeleteAck, Task, TaskId, TaskPatch, TaskText, UpdateTaskRequest,
};

const FALLBACK_MESSAGE: &str = "Failed to perform operation";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message}")]
    Status { status: u16, message: String },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

#[derive(Clone)]
pub struct TodoApi {
    client: Client,
    base_url: String,
}

impl TodoApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn list(&self) -> Result<Vec<Task>, ApiError> {
        let response = self.client.get(self.url("/todos")).send().await?;
        handle_response(response).await
    }

    pub async fn create(&self, text: &TaskText) -> Result<Task, ApiError> {
        let body = CreateTaskRequest { text: Some(text.to_string()) };
        let response = self.client.post(self.url("/todos")).json(&body).send().await?;
        handle_response(response).await
    }

    pub async fn update(&self, id: &TaskId, patch: &TaskPatch) -> Result<Task, ApiError> {
        let body = UpdateTaskRequest::from(patch);
        let response = self
            .client
            .patch(self.url(&format!("/todos/{}", id)))
            .json(&body)
            .send()
            .await?;
        handle_response(response).await
    }

    pub async fn delete(&self, id: &TaskId) -> Result<(), ApiError> {
        let response = self
            .client
            .delete(self.url(&format!("/todos/{}", id)))
            .send()
            .await?;
        let _: DeleteAck = handle_response(response).await?;
        Ok(())
    }

    /// One delete per id, issued concurrently. Results come back in input
    /// order; there is no atomicity across ids.
    pub async fn delete_many(&self, ids: &[TaskId]) -> Vec<(TaskId, Result<(), ApiError>)> {
        let results = join_all(ids.iter().map(|id| self.delete(id))).await;
        ids.iter().copied().zip(results).collect()
    }
}

async fn handle_response<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.bytes().await.unwrap_or_default();
        return Err(ApiError::Status {
            status: status.as_u16(),
            message: error_message(&body),
        });
    }
    Ok(response.json::<T>().await?)
}

/// Extracts `error` from an error body, falling back to a generic message.
pub fn error_message(body: &[u8]) -> String {
    serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| FALLBACK_MESSAGE.to_string())
}

use serde::{Deserialize, Serialize};

use crate::error::TaskError;
use crate::model::task::{TaskPatch, TaskText};

/// Raw `POST /todos` body. `text` stays optional so a missing field reports
/// the same validation error as a blank one.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct CreateTaskRequest {
    #[serde(default)]
    pub text: Option<String>,
}

/// Raw `PATCH /todos/{id}` body.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct UpdateTaskRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DeleteAck {
    pub message: String,
}

impl DeleteAck {
    pub fn deleted() -> Self {
        Self { message: "Todo deleted successfully".to_string() }
    }
}

/// Validated creation input.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub text: TaskText,
}

impl TryFrom<CreateTaskRequest> for NewTask {
    type Error = TaskError;

    fn try_from(req: CreateTaskRequest) -> Result<Self, Self::Error> {
        let raw = req.text.ok_or(TaskError::EmptyText)?;
        Ok(NewTask { text: TaskText::parse(&raw)? })
    }
}

impl TryFrom<UpdateTaskRequest> for TaskPatch {
    type Error = TaskError;

    fn try_from(req: UpdateTaskRequest) -> Result<Self, Self::Error> {
        // Blank text counts as absent; it can never be persisted
        let text = req.text.as_deref().and_then(|raw| TaskText::parse(raw).ok());
        TaskPatch::new(text, req.completed)
    }
}

impl From<&TaskPatch> for UpdateTaskRequest {
    fn from(patch: &TaskPatch) -> Self {
        Self {
            text: patch.text.as_ref().map(|t| t.as_str().to_string()),
            completed: patch.completed,
        }
    }
}

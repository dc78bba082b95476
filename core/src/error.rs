use thiserror::Error;

use crate::model::task::TaskId;

/// Coarse classification used by transports to pick a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Store,
}

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("Todo text is required")]
    EmptyText,

    #[error("Invalid todo ID")]
    InvalidId(String),

    #[error("Completed status or text is required")]
    EmptyPatch,

    #[error("Todo not found")]
    NotFound(TaskId),

    #[error("{context}")]
    Store {
        context: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl TaskError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TaskError::EmptyText | TaskError::InvalidId(_) | TaskError::EmptyPatch => {
                ErrorKind::Validation
            }
            TaskError::NotFound(_) => ErrorKind::NotFound,
            TaskError::Store { .. } => ErrorKind::Store,
        }
    }

    /// Wraps a store failure under an operation-level message.
    pub fn store(context: &'static str) -> impl FnOnce(anyhow::Error) -> TaskError {
        move |source| TaskError::Store { context, source }
    }
}

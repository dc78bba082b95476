use std::sync::Arc;

use anyhow::Result;

use crate::model::task::{Task, TaskId, TaskPatch};

/// Document store holding task records. Every call is atomic per record.
pub trait TaskRepository: Send + Sync {
    fn list(&self) -> Result<Vec<Task>>;
    fn insert(&self, task: Task) -> Result<Task>;
    /// Returns the updated record, or `None` when nothing matched.
    fn update(&self, id: &TaskId, patch: &TaskPatch) -> Result<Option<Task>>;
    /// Returns the removed record, or `None` when nothing matched.
    fn delete(&self, id: &TaskId) -> Result<Option<Task>>;
}

impl<R: TaskRepository + ?Sized> TaskRepository for Arc<R> {
    fn list(&self) -> Result<Vec<Task>> {
        (**self).list()
    }

    fn insert(&self, task: Task) -> Result<Task> {
        (**self).insert(task)
    }

    fn update(&self, id: &TaskId, patch: &TaskPatch) -> Result<Option<Task>> {
        (**self).update(id, patch)
    }

    fn delete(&self, id: &TaskId) -> Result<Option<Task>> {
        (**self).delete(id)
    }
}

pub type SharedRepository = Arc<dyn TaskRepository>;

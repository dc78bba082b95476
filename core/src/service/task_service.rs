use crate::error::TaskError;
use crate::model::task::{Task, TaskId, TaskPatch};
use crate::repository::TaskRepository;
use crate::service::dto::NewTask;

/// CRUD operations over a store, with validated inputs.
pub struct TaskService<R: TaskRepository> {
    repo: R,
}

impl<R: TaskRepository> TaskService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn list_tasks(&self) -> Result<Vec<Task>, TaskError> {
        let mut tasks = self.repo.list().map_err(TaskError::store("Failed to fetch todos"))?;
        sort_newest_first(&mut tasks);
        Ok(tasks)
    }

    pub fn create_task(&self, input: NewTask) -> Result<Task, TaskError> {
        let created = self
            .repo
            .insert(Task::new(input.text))
            .map_err(TaskError::store("Failed to create todo"))?;
        tracing::info!(id = %created.id, "created todo");
        Ok(created)
    }

    pub fn update_task(&self, id: &TaskId, patch: &TaskPatch) -> Result<Task, TaskError> {
        let updated = self
            .repo
            .update(id, patch)
            .map_err(TaskError::store("Failed to update todo"))?
            .ok_or(TaskError::NotFound(*id))?;
        tracing::debug!(id = %id, completed = updated.completed, "updated todo");
        Ok(updated)
    }

    pub fn delete_task(&self, id: &TaskId) -> Result<Task, TaskError> {
        let removed = self
            .repo
            .delete(id)
            .map_err(TaskError::store("Failed to delete todo"))?
            .ok_or(TaskError::NotFound(*id))?;
        tracing::info!(id = %id, "deleted todo");
        Ok(removed)
    }
}

/// Orders by creation time, newest first. Equal timestamps keep the later
/// insertion in front.
pub fn sort_newest_first(tasks: &mut Vec<Task>) {
    tasks.reverse();
    tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

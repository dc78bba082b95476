use std::sync::{Arc, RwLock};

use anyhow::{anyhow, Result};

use crate::model::task::{Task, TaskId, TaskPatch};
use crate::repository::traits::TaskRepository;

/// Process-local store, used by tests and `--memory` servers.
#[derive(Clone, Default)]
pub struct MemoryTaskRepository {
    tasks: Arc<RwLock<Vec<Task>>>,
}

impl MemoryTaskRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TaskRepository for MemoryTaskRepository {
    fn list(&self) -> Result<Vec<Task>> {
        let tasks = self.tasks.read().map_err(|_| anyhow!("task list lock poisoned"))?;
        Ok(tasks.clone())
    }

    fn insert(&self, task: Task) -> Result<Task> {
        let mut tasks = self.tasks.write().map_err(|_| anyhow!("task list lock poisoned"))?;
        if tasks.iter().any(|t| t.id == task.id) {
            return Err(anyhow!("Task with ID {} already exists", task.id));
        }
        tasks.push(task.clone());
        Ok(task)
    }

    fn update(&self, id: &TaskId, patch: &TaskPatch) -> Result<Option<Task>> {
        let mut tasks = self.tasks.write().map_err(|_| anyhow!("task list lock poisoned"))?;
        Ok(tasks.iter_mut().find(|t| t.id == *id).map(|task| {
            task.apply(patch);
            task.clone()
        }))
    }

    fn delete(&self, id: &TaskId) -> Result<Option<Task>> {
        let mut tasks = self.tasks.write().map_err(|_| anyhow!("task list lock poisoned"))?;
        Ok(tasks
            .iter()
            .position(|t| t.id == *id)
            .map(|pos| tasks.remove(pos)))
    }
}

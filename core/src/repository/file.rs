use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{anyhow, Context, Result};
use serde_json;

use crate::model::task::{Task, TaskId, TaskPatch};
use crate::repository::traits::TaskRepository;

const DEFAULT_FILE_NAME: &str = "todos.json";

/// JSON-file store. A single lock covers each read-modify-write cycle.
#[derive(Clone)]
pub struct FileTaskRepository {
    file_path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl FileTaskRepository {
    pub fn new(base_dir: &Path) -> Result<Self> {
        fs::create_dir_all(base_dir)
            .with_context(|| format!("Could not create data directory {}", base_dir.display()))?;
        let path = base_dir.join(DEFAULT_FILE_NAME);

        // Seed an empty array so reads never see a missing file
        if !path.exists() {
            let mut writer = BufWriter::new(File::create(&path)?);
            serde_json::to_writer_pretty(&mut writer, &Vec::<Task>::new())?;
            writer.flush()?;
        }

        tracing::debug!(path = %path.display(), "opened task file");
        Ok(FileTaskRepository {
            file_path: path,
            lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    fn guard(&self) -> Result<MutexGuard<'_, ()>> {
        self.lock.lock().map_err(|_| anyhow!("task file lock poisoned"))
    }

    fn read_tasks(&self) -> Result<Vec<Task>> {
        let file = File::open(&self.file_path)
            .with_context(|| format!("Could not open {}", self.file_path.display()))?;
        let reader = BufReader::new(file);
        let tasks = serde_json::from_reader(reader)
            .with_context(|| format!("Corrupt task file {}", self.file_path.display()))?;
        Ok(tasks)
    }

    fn write_tasks(&self, tasks: &[Task]) -> Result<()> {
        // Write beside the target and rename so a crash never truncates the file
        let tmp = self.file_path.with_extension("json.tmp");
        let file = File::create(&tmp)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, tasks)?;
        writer.flush()?;
        fs::rename(&tmp, &self.file_path)?;
        Ok(())
    }
}

impl TaskRepository for FileTaskRepository {
    fn list(&self) -> Result<Vec<Task>> {
        let _guard = self.guard()?;
        self.read_tasks()
    }

    fn insert(&self, task: Task) -> Result<Task> {
        let _guard = self.guard()?;
        let mut tasks = self.read_tasks()?;
        if tasks.iter().any(|t| t.id == task.id) {
            return Err(anyhow!("Task with ID {} already exists", task.id));
        }
        tasks.push(task.clone());
        self.write_tasks(&tasks)?;
        Ok(task)
    }

    fn update(&self, id: &TaskId, patch: &TaskPatch) -> Result<Option<Task>> {
        let _guard = self.guard()?;
        let mut tasks = self.read_tasks()?;
        let Some(task) = tasks.iter_mut().find(|t| t.id == *id) else {
            return Ok(None);
        };
        task.apply(patch);
        let updated = task.clone();
        self.write_tasks(&tasks)?;
        Ok(Some(updated))
    }

    fn delete(&self, id: &TaskId) -> Result<Option<Task>> {
        let _guard = self.guard()?;
        let mut tasks = self.read_tasks()?;
        let Some(pos) = tasks.iter().position(|t| t.id == *id) else {
            return Ok(None);
        };
        let removed = tasks.remove(pos);
        self.write_tasks(&tasks)?;
        Ok(Some(removed))
    }
}

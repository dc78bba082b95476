pub mod config;
pub mod error;
pub mod input;
pub mod model;
pub mod repository;
pub mod service;

pub use config::Config;
pub use error::{ErrorKind, TaskError};
pub use input::{expand_key, join_words, resolve_id};
pub use model::filter::{Filter, Stats};
pub use model::task::{Task, TaskId, TaskPatch, TaskText};
pub use repository::{FileTaskRepository, MemoryTaskRepository, SharedRepository, TaskRepository};
pub use service::dto::{CreateTaskRequest, DeleteAck, NewTask, UpdateTaskRequest};
pub use service::task_service::{sort_newest_first, TaskService};

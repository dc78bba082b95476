pub mod file;
pub mod memory;
pub mod traits;

pub use file::FileTaskRepository;
pub use memory::MemoryTaskRepository;
pub use traits::{SharedRepository, TaskRepository};

pub mod api;

pub use api::{router, AppState};

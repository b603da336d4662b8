//! Task Module
//! Mission: Task lists where every row is visible only to its owner

pub mod api;
pub mod models;
pub mod task_store;

pub use api::TaskState;
pub use task_store::TaskStore;

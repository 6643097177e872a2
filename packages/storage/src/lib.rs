pub mod storage;

pub use storage::{FileStore, InMemoryStore};

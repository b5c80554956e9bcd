pub mod db;
pub mod store;

pub use db::SqliteStore;
pub use store::{ConceptStore, MemoryStore};

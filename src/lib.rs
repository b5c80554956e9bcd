pub mod clock;
pub mod config;
pub mod database;
pub mod error;
pub mod export;
pub mod models;
pub mod review;

pub use clock::{Clock, ClockMode, FixedClock, SystemClock};
pub use config::Config;
pub use database::{ConceptStore, MemoryStore, SqliteStore};
pub use error::{Error, InvalidInput, Result, StorageError};
pub use models::{Concept, ConceptId, IntervalPolicy, NewConcept, ReviewState, Scheduler, Session};
pub use review::ReviewService;

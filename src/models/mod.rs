pub mod concept;
pub mod due;
pub mod review_state;
pub mod session;
pub mod sm2;

pub use concept::{Concept, ConceptId, NewConcept, OwnerId};
pub use review_state::ReviewState;
pub use session::Session;
pub use sm2::{IntervalPolicy, Scheduler};

//! Concept is a single unit of knowledge the learner reviews over time.
use super::ReviewState;
use crate::error::InvalidInput;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Store-assigned identifier. Never reused, never changed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConceptId(pub i64);

impl fmt::Display for ConceptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The learner a concept belongs to.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(pub String);

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Concept {
    pub id: ConceptId,
    pub owner: OwnerId,
    pub name: String,
    pub learned_at: DateTime<Utc>,
    pub state: ReviewState,
    /// Bumped by the store on every successful save.
    pub version: i64,
}

/// A concept that has not been stored yet.
#[derive(Clone, Debug, PartialEq)]
pub struct NewConcept {
    pub name: String,
    pub learned_at: DateTime<Utc>,
    pub state: ReviewState,
}

impl NewConcept {
    /// Builds a freshly learned concept with default scheduling state, due at `learned_at`.
    pub fn new(name: &str, learned_at: DateTime<Utc>) -> Result<Self, InvalidInput> {
        Self::restore(name, learned_at, ReviewState::new(learned_at))
    }

    /// Builds a concept carrying existing scheduling state (used by import).
    pub fn restore(
        name: &str,
        learned_at: DateTime<Utc>,
        state: ReviewState,
    ) -> Result<Self, InvalidInput> {
        let name = name.trim();
        if name.is_empty() {
            return Err(InvalidInput::EmptyName);
        }
        state.validate()?;

        Ok(Self {
            name: name.to_string(),
            learned_at,
            state,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::sm2::{DEFAULT_EASINESS, DEFAULT_INTERVAL};
    use chrono::TimeZone;

    #[test]
    fn test_new_concept_defaults() {
        let learned = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let concept = NewConcept::new("  borrow checker ", learned).unwrap();

        assert_eq!(concept.name, "borrow checker");
        assert_eq!(concept.state.easiness_factor, DEFAULT_EASINESS);
        assert_eq!(concept.state.revision_interval, DEFAULT_INTERVAL);
        assert_eq!(concept.state.repetitions, 0);
        assert_eq!(concept.state.next_revision_at, learned);
        assert_eq!(concept.state.last_reviewed_at, None);
    }

    #[test]
    fn test_blank_name_rejected() {
        let learned = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(
            NewConcept::new("   ", learned).unwrap_err(),
            InvalidInput::EmptyName
        );
    }

    #[test]
    fn test_restore_rejects_corrupt_state() {
        let learned = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut state = ReviewState::new(learned);
        state.revision_interval = 0;

        assert_eq!(
            NewConcept::restore("lifetimes", learned, state).unwrap_err(),
            InvalidInput::IntervalTooSmall(0)
        );
    }
}

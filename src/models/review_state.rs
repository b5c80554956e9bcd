use super::sm2::{DEFAULT_EASINESS, DEFAULT_INTERVAL, MIN_EASINESS};
use crate::error::InvalidInput;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Persisted scheduling state of a concept.
///
/// Field names are the storage contract: `easinessFactor`, `revisionInterval`,
/// `nextRevisionAt` and friends in JSON, snake_case columns in SQLite.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewState {
    pub easiness_factor: f64,
    /// Days between the last review and the next one.
    pub revision_interval: i32,
    /// Consecutive reviews graded 3 or better.
    #[serde(default)]
    pub repetitions: i32,
    pub next_revision_at: DateTime<Utc>,
    #[serde(default)]
    pub last_reviewed_at: Option<DateTime<Utc>>,
}

impl ReviewState {
    /// Default state of a concept learned at `learned_at`; due immediately.
    pub fn new(learned_at: DateTime<Utc>) -> Self {
        Self {
            easiness_factor: DEFAULT_EASINESS,
            revision_interval: DEFAULT_INTERVAL,
            repetitions: 0,
            next_revision_at: learned_at,
            last_reviewed_at: None,
        }
    }

    /// Rejects state that the scheduler must not build on.
    pub fn validate(&self) -> Result<(), InvalidInput> {
        if !self.easiness_factor.is_finite() || self.easiness_factor < MIN_EASINESS {
            return Err(InvalidInput::CorruptEasiness(self.easiness_factor));
        }
        if self.revision_interval < 1 {
            return Err(InvalidInput::IntervalTooSmall(self.revision_interval));
        }
        if self.repetitions < 0 {
            return Err(InvalidInput::NegativeRepetitions(self.repetitions));
        }
        Ok(())
    }
}

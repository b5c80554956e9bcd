//! SM-2 (SuperMemo 2) spaced repetition scheduler.
//!
//! Given a concept's scheduling state and a recall quality, computes the next state:
//! - Quality grades run from 0 (complete blackout) to 5 (perfect recall)
//! - The easiness factor (EF) moves after every review and never drops below 1.3
//! - The next interval is derived from the previous one, scaled by the updated EF
//! - The next revision date is `now + interval` calendar days
//!
//! Two interval policies are available. `Legacy` branches on the literal previous
//! interval (`1 -> 1`, `2 -> 6`, otherwise `round(interval * EF)`), which keeps a
//! concept at a 1-day spacing forever once it sits at 1. `Repetition` follows the
//! textbook algorithm and branches on the count of consecutive successful reviews.
//!
//! The scheduler never reads the system clock; `now` is always supplied.

use super::ReviewState;
use crate::error::InvalidInput;
use chrono::{DateTime, Days, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_EASINESS: f64 = 2.5;
pub const MIN_EASINESS: f64 = 1.3;
pub const DEFAULT_INTERVAL: i32 = 1;

pub const MAX_QUALITY: u8 = 5;
/// Grade assumed when the caller does not capture one.
pub const PERFECT_RECALL: u8 = 5;
/// Lowest grade that counts as a successful recall.
pub const PASSING_QUALITY: u8 = 3;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum IntervalPolicy {
    /// Branch on the previous interval value.
    #[default]
    Legacy,
    /// Branch on the repetition count.
    Repetition,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Scheduler {
    policy: IntervalPolicy,
}

impl Scheduler {
    pub fn new(policy: IntervalPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> IntervalPolicy {
        self.policy
    }

    /// Calculates the scheduling state that follows a review graded `quality` at `now`.
    ///
    /// Fails without producing anything if `quality` is above 5 or `state` is corrupt.
    pub fn review(
        &self,
        state: &ReviewState,
        quality: u8,
        now: DateTime<Utc>,
    ) -> Result<ReviewState, InvalidInput> {
        if quality > MAX_QUALITY {
            return Err(InvalidInput::QualityOutOfRange(quality));
        }
        state.validate()?;

        let new_ef = next_easiness(state.easiness_factor, quality);
        let passed = quality >= PASSING_QUALITY;

        let new_interval = match self.policy {
            IntervalPolicy::Legacy => match state.revision_interval {
                1 => 1,
                2 => 6,
                previous => scale_interval(previous, new_ef)?,
            },
            IntervalPolicy::Repetition if !passed => DEFAULT_INTERVAL,
            IntervalPolicy::Repetition => match state.repetitions {
                0 => 1,
                1 => 6,
                _ => scale_interval(state.revision_interval, new_ef)?,
            },
        };
        let new_repetitions = if passed {
            state.repetitions.saturating_add(1)
        } else {
            0
        };

        let days = Days::new(u64::from(new_interval.unsigned_abs()));
        let next_revision_at = now
            .checked_add_days(days)
            .ok_or(InvalidInput::IntervalOverflow)?;

        log::debug!(
            "scheduled review: q={} ef {:.3} -> {:.3}, interval {} -> {} ({:?})",
            quality,
            state.easiness_factor,
            new_ef,
            state.revision_interval,
            new_interval,
            self.policy
        );

        Ok(ReviewState {
            easiness_factor: new_ef,
            revision_interval: new_interval,
            repetitions: new_repetitions,
            next_revision_at,
            last_reviewed_at: Some(now),
        })
    }
}

/// SM-2 easiness update for one review, floored at [`MIN_EASINESS`].
/// `quality` must already be checked against [`MAX_QUALITY`].
fn next_easiness(easiness_factor: f64, quality: u8) -> f64 {
    let miss = f64::from(MAX_QUALITY - quality);
    let ef = easiness_factor + (0.1 - miss * (0.08 + miss * 0.02));
    ef.max(MIN_EASINESS)
}

fn scale_interval(previous: i32, easiness_factor: f64) -> Result<i32, InvalidInput> {
    let scaled = (f64::from(previous) * easiness_factor).round();
    if scaled > f64::from(i32::MAX) {
        return Err(InvalidInput::IntervalOverflow);
    }
    Ok(scaled as i32)
}

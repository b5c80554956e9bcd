//! Review operations exposed to callers.
//! Composes a concept store, a clock, and the SM-2 scheduler.

use crate::clock::Clock;
use crate::config::{Config, DEFAULT_MAX_REVIEW_ATTEMPTS};
use crate::database::ConceptStore;
use crate::error::{Error, Result};
use crate::export::json::ConceptExport;
use crate::models::{Concept, ConceptId, NewConcept, Scheduler, Session};
use chrono::{DateTime, SubsecRound, Utc};

pub struct ReviewService<S, C> {
    store: S,
    clock: C,
    scheduler: Scheduler,
    max_attempts: u32,
}

impl<S: ConceptStore, C: Clock> ReviewService<S, C> {
    pub fn new(store: S, clock: C, scheduler: Scheduler) -> Self {
        Self {
            store,
            clock,
            scheduler,
            max_attempts: DEFAULT_MAX_REVIEW_ATTEMPTS,
        }
    }

    pub fn from_config(store: S, clock: C, config: &Config) -> Self {
        Self::new(store, clock, Scheduler::new(config.interval_policy))
            .with_max_attempts(config.max_review_attempts)
    }

    /// Sets how many load/compute/save rounds a review gets before a conflict is returned.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Current time at the precision stores keep (whole seconds).
    fn now(&self) -> DateTime<Utc> {
        self.clock.now().trunc_subsecs(0)
    }

    /// Registers a new concept. Without a learn date it is learned (and due) now.
    pub fn add_concept(
        &self,
        session: &Session,
        name: &str,
        learned_at: Option<DateTime<Utc>>,
    ) -> Result<Concept> {
        let learned_at = learned_at.unwrap_or_else(|| self.now()).trunc_subsecs(0);
        let concept = NewConcept::new(name, learned_at)?;
        self.store.insert(session, concept)
    }

    /// Reviews a concept and returns its next due date.
    ///
    /// Each attempt reloads the concept so the schedule is computed from the latest
    /// stored state. A save that lost a race is retried until the attempts run out,
    /// then reported as [`Error::StaleState`]. Nothing is written on any other error.
    pub fn review(&self, session: &Session, id: ConceptId, quality: u8) -> Result<DateTime<Utc>> {
        let mut attempt = 1;
        loop {
            let concept = self.store.load(session, id)?;
            let next = self.scheduler.review(&concept.state, quality, self.now())?;

            match self.store.save(session, id, concept.version, &next) {
                Ok(()) => {
                    log::info!(
                        "concept {} reviewed (q={}): interval {} day(s), next revision {}",
                        id,
                        quality,
                        next.revision_interval,
                        next.next_revision_at.format("%Y-%m-%d")
                    );
                    return Ok(next.next_revision_at);
                }
                Err(Error::StaleState(_)) if attempt < self.max_attempts => {
                    log::warn!(
                        "concept {} changed during review, retrying ({}/{})",
                        id,
                        attempt,
                        self.max_attempts
                    );
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Concepts due now, earliest first.
    pub fn due(&self, session: &Session) -> Result<Vec<Concept>> {
        self.store.list_due(session, self.now())
    }

    pub fn concepts(&self, session: &Session) -> Result<Vec<Concept>> {
        self.store.list_all(session)
    }

    pub fn export(&self, session: &Session) -> Result<ConceptExport> {
        let concepts = self.store.list_all(session)?;
        Ok(ConceptExport::from_concepts(&session.owner, &concepts))
    }

    /// Stores every record of `export` as a new concept of this session.
    /// All records are validated first; a storage failure leaves none of them behind.
    pub fn import(&self, session: &Session, export: ConceptExport) -> Result<Vec<Concept>> {
        let concepts = export.into_new_concepts()?;
        let stored = self.store.insert_all(session, concepts)?;
        log::info!("imported {} concept(s) for {}", stored.len(), session.owner);
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::database::MemoryStore;
    use crate::error::{InvalidInput, StorageError};
    use crate::models::{IntervalPolicy, ReviewState};
    use chrono::TimeZone;
    use std::cell::Cell;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap()
    }

    fn service(now: DateTime<Utc>) -> ReviewService<MemoryStore, FixedClock> {
        ReviewService::new(MemoryStore::new(), FixedClock::new(now), Scheduler::default())
    }

    /// Store whose first `races` saves lose to a concurrent writer.
    struct RacingStore {
        inner: MemoryStore,
        races: Cell<u32>,
        saves: Cell<u32>,
    }

    impl RacingStore {
        fn new(races: u32) -> Self {
            Self {
                inner: MemoryStore::new(),
                races: Cell::new(races),
                saves: Cell::new(0),
            }
        }
    }

    impl ConceptStore for RacingStore {
        fn insert(&self, session: &Session, concept: NewConcept) -> Result<Concept> {
            self.inner.insert(session, concept)
        }

        fn load(&self, session: &Session, id: ConceptId) -> Result<Concept> {
            self.inner.load(session, id)
        }

        fn save(
            &self,
            session: &Session,
            id: ConceptId,
            expected_version: i64,
            state: &ReviewState,
        ) -> Result<()> {
            self.saves.set(self.saves.get() + 1);
            if self.races.get() > 0 {
                self.races.set(self.races.get() - 1);
                // Another writer gets there first with its own state.
                let current = self.inner.load(session, id)?;
                self.inner.save(session, id, current.version, &current.state)?;
            }
            self.inner.save(session, id, expected_version, state)
        }

        fn list_due(&self, session: &Session, now: DateTime<Utc>) -> Result<Vec<Concept>> {
            self.inner.list_due(session, now)
        }

        fn list_all(&self, session: &Session) -> Result<Vec<Concept>> {
            self.inner.list_all(session)
        }
    }

    #[test]
    fn test_add_concept_defaults_to_clock_date() {
        let service = service(day(3));
        let session = Session::new("ada");

        let concept = service.add_concept(&session, "closures", None).unwrap();
        assert_eq!(concept.learned_at, day(3));
        assert_eq!(concept.state.next_revision_at, day(3));
    }

    #[test]
    fn test_future_learn_date_is_not_due_yet() {
        let service = service(day(3));
        let session = Session::new("ada");

        service.add_concept(&session, "closures", Some(day(10))).unwrap();
        assert!(service.due(&session).unwrap().is_empty());
    }

    #[test]
    fn test_review_persists_new_state() {
        let service = service(day(1));
        let session = Session::new("ada");
        let concept = service.add_concept(&session, "closures", Some(day(1))).unwrap();

        let due = service.review(&session, concept.id, 5).unwrap();
        assert_eq!(due, day(2));

        let stored = service.store().load(&session, concept.id).unwrap();
        assert_eq!(stored.state.next_revision_at, day(2));
        assert_eq!(stored.state.last_reviewed_at, Some(day(1)));
        assert_eq!(stored.version, 1);
        assert!(service.due(&session).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_quality_writes_nothing() {
        let service = service(day(1));
        let session = Session::new("ada");
        let concept = service.add_concept(&session, "closures", None).unwrap();

        let result = service.review(&session, concept.id, 9);
        assert!(matches!(
            result,
            Err(Error::InvalidInput(InvalidInput::QualityOutOfRange(9)))
        ));
        assert_eq!(service.store().load(&session, concept.id).unwrap(), concept);
    }

    #[test]
    fn test_review_of_unknown_concept() {
        let service = service(day(1));
        let result = service.review(&Session::new("ada"), ConceptId(7), 5);
        assert!(matches!(
            result,
            Err(Error::Storage(StorageError::NotFound(ConceptId(7))))
        ));
    }

    #[test]
    fn test_stale_save_is_retried() {
        let service = ReviewService::new(RacingStore::new(2), FixedClock::new(day(1)), Scheduler::default());
        let session = Session::new("ada");
        let concept = service.add_concept(&session, "closures", None).unwrap();

        let due = service.review(&session, concept.id, 5).unwrap();
        assert_eq!(due, day(2));
        assert_eq!(service.store().saves.get(), 3);
    }

    #[test]
    fn test_stale_save_gives_up_after_max_attempts() {
        let service = ReviewService::new(RacingStore::new(5), FixedClock::new(day(1)), Scheduler::default())
            .with_max_attempts(3);
        let session = Session::new("ada");
        let concept = service.add_concept(&session, "closures", None).unwrap();

        let result = service.review(&session, concept.id, 5);
        assert!(matches!(result, Err(Error::StaleState(id)) if id == concept.id));
        assert_eq!(service.store().saves.get(), 3);
    }

    #[test]
    fn test_config_selects_policy_and_attempts() {
        let config = Config {
            interval_policy: IntervalPolicy::Repetition,
            max_review_attempts: 1,
            ..Config::default()
        };
        let service = ReviewService::from_config(MemoryStore::new(), FixedClock::new(day(1)), &config);
        let session = Session::new("ada");
        let concept = service.add_concept(&session, "closures", None).unwrap();

        service.review(&session, concept.id, 5).unwrap();
        service.clock().set(day(2));
        let due = service.review(&session, concept.id, 5).unwrap();
        assert_eq!(due, day(8));
    }

    #[test]
    fn test_export_then_import_for_another_learner() {
        let service = service(day(1));
        let ada = Session::new("ada");
        let bob = Session::new("bob");
        let concept = service.add_concept(&ada, "closures", None).unwrap();
        service.review(&ada, concept.id, 4).unwrap();

        let export = service.export(&ada).unwrap();
        let imported = service.import(&bob, export).unwrap();

        assert_eq!(imported.len(), 1);
        let original = service.store().load(&ada, concept.id).unwrap();
        assert_ne!(imported[0].id, original.id);
        assert_eq!(imported[0].owner, bob.owner);
        assert_eq!(imported[0].state, original.state);
    }
}

//! Storage contract consumed by the review service, plus an in-process implementation.

use crate::error::{Error, Result, StorageError};
use crate::models::due::select_due;
use crate::models::{Concept, ConceptId, NewConcept, ReviewState, Session};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

/// Reads and writes concept scheduling state on behalf of one learner session.
///
/// Concepts owned by another learner behave as if they did not exist.
pub trait ConceptStore {
    /// Stores a new concept and returns it with its assigned id.
    fn insert(&self, session: &Session, concept: NewConcept) -> Result<Concept>;

    /// Stores several new concepts, all or none.
    ///
    /// The default inserts one by one; stores that can roll back should override it.
    fn insert_all(&self, session: &Session, concepts: Vec<NewConcept>) -> Result<Vec<Concept>> {
        concepts
            .into_iter()
            .map(|concept| self.insert(session, concept))
            .collect()
    }

    fn load(&self, session: &Session, id: ConceptId) -> Result<Concept>;

    /// Replaces the scheduling state only if the stored version still equals
    /// `expected_version`; otherwise fails with [`Error::StaleState`].
    fn save(
        &self,
        session: &Session,
        id: ConceptId,
        expected_version: i64,
        state: &ReviewState,
    ) -> Result<()>;

    /// Concepts with `next_revision_at <= now`, earliest first, ties by id.
    fn list_due(&self, session: &Session, now: DateTime<Utc>) -> Result<Vec<Concept>>;

    /// Every concept of the session's learner, ordered by id.
    fn list_all(&self, session: &Session) -> Result<Vec<Concept>>;
}

impl<S: ConceptStore + ?Sized> ConceptStore for &S {
    fn insert(&self, session: &Session, concept: NewConcept) -> Result<Concept> {
        (**self).insert(session, concept)
    }

    fn insert_all(&self, session: &Session, concepts: Vec<NewConcept>) -> Result<Vec<Concept>> {
        (**self).insert_all(session, concepts)
    }

    fn load(&self, session: &Session, id: ConceptId) -> Result<Concept> {
        (**self).load(session, id)
    }

    fn save(
        &self,
        session: &Session,
        id: ConceptId,
        expected_version: i64,
        state: &ReviewState,
    ) -> Result<()> {
        (**self).save(session, id, expected_version, state)
    }

    fn list_due(&self, session: &Session, now: DateTime<Utc>) -> Result<Vec<Concept>> {
        (**self).list_due(session, now)
    }

    fn list_all(&self, session: &Session) -> Result<Vec<Concept>> {
        (**self).list_all(session)
    }
}

#[derive(Default)]
struct MemoryInner {
    last_id: i64,
    concepts: BTreeMap<ConceptId, Concept>,
}

/// Concept store kept in process memory.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MemoryInner {
    fn insert(&mut self, session: &Session, concept: NewConcept) -> Concept {
        self.last_id += 1;
        let stored = Concept {
            id: ConceptId(self.last_id),
            owner: session.owner.clone(),
            name: concept.name,
            learned_at: concept.learned_at,
            state: concept.state,
            version: 0,
        };
        self.concepts.insert(stored.id, stored.clone());
        stored
    }
}

impl ConceptStore for MemoryStore {
    fn insert(&self, session: &Session, concept: NewConcept) -> Result<Concept> {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(inner.insert(session, concept))
    }

    fn insert_all(&self, session: &Session, concepts: Vec<NewConcept>) -> Result<Vec<Concept>> {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(concepts
            .into_iter()
            .map(|concept| inner.insert(session, concept))
            .collect())
    }

    fn load(&self, session: &Session, id: ConceptId) -> Result<Concept> {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner
            .concepts
            .get(&id)
            .filter(|c| c.owner == session.owner)
            .cloned()
            .ok_or(Error::Storage(StorageError::NotFound(id)))
    }

    fn save(
        &self,
        session: &Session,
        id: ConceptId,
        expected_version: i64,
        state: &ReviewState,
    ) -> Result<()> {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let concept = inner
            .concepts
            .get_mut(&id)
            .filter(|c| c.owner == session.owner)
            .ok_or(Error::Storage(StorageError::NotFound(id)))?;

        if concept.version != expected_version {
            return Err(Error::StaleState(id));
        }
        concept.state = state.clone();
        concept.version += 1;
        Ok(())
    }

    fn list_due(&self, session: &Session, now: DateTime<Utc>) -> Result<Vec<Concept>> {
        Ok(select_due(self.list_all(session)?, now))
    }

    fn list_all(&self, session: &Session) -> Result<Vec<Concept>> {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let mut concepts: Vec<Concept> = inner
            .concepts
            .values()
            .filter(|c| c.owner == session.owner)
            .cloned()
            .collect();
        concepts.sort_by_key(|c| c.id);
        Ok(concepts)
    }
}

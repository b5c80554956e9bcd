//! Due-set selection: which concepts need review now, earliest first.
use super::Concept;
use chrono::{DateTime, Utc};
use std::cmp::Ordering;

pub fn is_due(concept: &Concept, now: DateTime<Utc>) -> bool {
    concept.state.next_revision_at <= now
}

/// Orders by next revision date, then by id so equal dates sort the same way every time.
pub fn due_order(a: &Concept, b: &Concept) -> Ordering {
    a.state
        .next_revision_at
        .cmp(&b.state.next_revision_at)
        .then_with(|| a.id.cmp(&b.id))
}

/// Keeps the concepts due at `now` and sorts them with [`due_order`].
pub fn select_due<I>(concepts: I, now: DateTime<Utc>) -> Vec<Concept>
where
    I: IntoIterator<Item = Concept>,
{
    let mut due: Vec<Concept> = concepts
        .into_iter()
        .filter(|concept| is_due(concept, now))
        .collect();
    due.sort_by(due_order);
    due
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ConceptId, OwnerId, ReviewState};
    use chrono::TimeZone;

    fn concept(id: i64, next: DateTime<Utc>) -> Concept {
        Concept {
            id: ConceptId(id),
            owner: OwnerId("ada".to_string()),
            name: format!("concept {id}"),
            learned_at: next,
            state: ReviewState::new(next),
            version: 0,
        }
    }

    #[test]
    fn test_due_boundary_is_inclusive() {
        let now = Utc.with_ymd_and_hms(2024, 1, 5, 12, 0, 0).unwrap();
        assert!(is_due(&concept(1, now), now));
        assert!(!is_due(&concept(1, now + chrono::Duration::seconds(1)), now));
    }

    #[test]
    fn test_select_due_orders_by_date_then_id() {
        let now = Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap();
        let early = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2024, 1, 8, 0, 0, 0).unwrap();
        let future = Utc.with_ymd_and_hms(2024, 1, 11, 0, 0, 0).unwrap();

        let due = select_due(
            vec![
                concept(4, late),
                concept(9, future),
                concept(3, late),
                concept(7, early),
            ],
            now,
        );

        let ids: Vec<i64> = due.iter().map(|c| c.id.0).collect();
        assert_eq!(ids, vec![7, 3, 4]);
    }
}

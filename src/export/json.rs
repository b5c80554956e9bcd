//! JSON import/export of a learner's concepts.
//! Scheduling state travels with each concept so an import resumes where the export left off.

use crate::error::{InvalidInput, StorageError};
use crate::models::{Concept, NewConcept, OwnerId, ReviewState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConceptRecord {
    pub name: String,
    pub learned_at: DateTime<Utc>,
    #[serde(flatten)]
    pub state: ReviewState,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConceptExport {
    pub owner: OwnerId,
    pub concepts: Vec<ConceptRecord>,
}

impl ConceptExport {
    pub fn from_concepts(owner: &OwnerId, concepts: &[Concept]) -> Self {
        Self {
            owner: owner.clone(),
            concepts: concepts
                .iter()
                .map(|c| ConceptRecord {
                    name: c.name.clone(),
                    learned_at: c.learned_at,
                    state: c.state.clone(),
                })
                .collect(),
        }
    }

    /// Validates every record; fails on the first bad one.
    pub fn into_new_concepts(self) -> Result<Vec<NewConcept>, InvalidInput> {
        self.concepts
            .into_iter()
            .map(|record| NewConcept::restore(&record.name, record.learned_at, record.state))
            .collect()
    }
}

/// Exports concepts to a JSON file at the specified path.
pub fn export_json_to_path(
    export: &ConceptExport,
    path: impl AsRef<Path>,
) -> Result<(), StorageError> {
    let json_string = serde_json::to_string_pretty(export)?;
    let mut file = File::create(path.as_ref())?;
    file.write_all(json_string.as_bytes())?;
    log::info!(
        "exported {} concept(s) to '{}'",
        export.concepts.len(),
        path.as_ref().display()
    );
    Ok(())
}

/// Imports concepts from a JSON file.
/// Returns an error if the file doesn't exist or contains invalid JSON.
pub fn import_json(path: impl AsRef<Path>) -> Result<ConceptExport, StorageError> {
    let mut file = File::open(path.as_ref())?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;

    let export: ConceptExport = serde_json::from_str(&contents)?;
    log::debug!(
        "read {} concept(s) of '{}' from '{}'",
        export.concepts.len(),
        export.owner,
        path.as_ref().display()
    );
    Ok(export)
}

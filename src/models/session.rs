//! Explicit learner session handed to every store call.
use super::OwnerId;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub owner: OwnerId,
}

impl Session {
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: OwnerId(owner.into()),
        }
    }
}

//! Entity-scoped failures raised while randomizing a map.
//!
//! None of these abort a map pass: the pass records them in its report and
//! leaves the affected entity exactly as authored.

use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RandomizeError {
    #[error("enemy type `{enemy_type}` not found in the randomizer database")]
    LookupMiss { enemy_type: String },
    #[error("enemy type `{enemy_type}` has no entry in the game enemy table")]
    MissingGameEntry { enemy_type: String },
    #[error("no compatible replacement for enemy type `{enemy_type}`")]
    EmptyCandidateSet { enemy_type: String },
    #[error("level reference {reference} does not resolve against the map's level table")]
    MalformedLevelReference { reference: String },
    #[error("{entity_type} settings could not be read: {reason}")]
    MalformedSettings { entity_type: String, reason: String },
}

impl RandomizeError {
    pub fn enemy_type(&self) -> Option<&str> {
        match self {
            Self::LookupMiss { enemy_type }
            | Self::MissingGameEntry { enemy_type }
            | Self::EmptyCandidateSet { enemy_type } => Some(enemy_type),
            Self::MalformedLevelReference { .. } | Self::MalformedSettings { .. } => None,
        }
    }
}

/// One failed substitution, reported alongside the successful ones.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntityFailure {
    /// Position of the entity in the map's entity list.
    pub entity_index: usize,
    pub entity_name: Option<String>,
    /// For spawners: which entry and repetition failed.
    pub spawner_slot: Option<(usize, u32)>,
    pub error: RandomizeError,
}

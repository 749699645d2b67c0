//! Static enemy data: the randomizer's own database and the game's enemy table.
//!
//! Both are loaded once and then only read. The randomizer database keeps the
//! declaration order of its source file, which is the order candidates are
//! offered to the selector.

use std::collections::HashMap;
use std::fs;
use std::hash::Hasher;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value};
use thiserror::Error;
use xxhash_rust::xxh3::Xxh3;

use crate::elements::ElementRequirement;

pub const BUILTIN_ENEMY_DATA: &str = include_str!("data/enemy_data.json");
pub const BUILTIN_GAME_ENEMIES: &str = include_str!("data/game_enemies.json");

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnemyRecord {
    pub elements: ElementRequirement,
    /// Name of the prop recipe spawned next to this enemy; empty for none.
    #[serde(default)]
    pub map_elements: String,
    pub endurance: f64,
}

impl EnemyRecord {
    pub fn new(endurance: f64) -> Self {
        Self { elements: ElementRequirement::NONE, map_elements: String::new(), endurance }
    }

    pub fn with_elements(mut self, elements: ElementRequirement) -> Self {
        self.elements = elements;
        self
    }

    pub fn with_map_elements(mut self, recipe: &str) -> Self {
        self.map_elements = recipe.to_string();
        self
    }
}

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("failed to parse enemy data: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read enemy data from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid record for enemy type `{enemy_type}`: {source}")]
    Record {
        enemy_type: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("enemy type `{enemy_type}` has invalid endurance {endurance}")]
    Endurance { enemy_type: String, endurance: f64 },
}

#[derive(Deserialize)]
struct RawEnemyData {
    #[serde(rename = "regularEnemies")]
    regular_enemies: JsonMap<String, Value>,
}

/// Randomizer database keyed by enemy type, in declaration order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EnemyDatabase {
    records: Vec<(String, EnemyRecord)>,
    index: HashMap<String, usize>,
}

impl EnemyDatabase {
    pub fn builtin() -> Result<Self, DatabaseError> {
        Self::from_json_str(BUILTIN_ENEMY_DATA)
    }

    pub fn from_json_str(json: &str) -> Result<Self, DatabaseError> {
        let raw: RawEnemyData = serde_json::from_str(json)?;
        let mut database = Self::default();
        for (enemy_type, value) in raw.regular_enemies {
            let record: EnemyRecord = serde_json::from_value(value).map_err(|source| {
                DatabaseError::Record { enemy_type: enemy_type.clone(), source }
            })?;
            if !record.endurance.is_finite() || record.endurance < 0.0 {
                return Err(DatabaseError::Endurance { enemy_type, endurance: record.endurance });
            }
            database.insert(enemy_type, record);
        }
        Ok(database)
    }

    pub fn from_file(path: &Path) -> Result<Self, DatabaseError> {
        let contents = fs::read_to_string(path)
            .map_err(|source| DatabaseError::Read { path: path.to_path_buf(), source })?;
        Self::from_json_str(&contents)
    }

    /// Re-inserting a type replaces its record but keeps its original position.
    pub fn insert(&mut self, enemy_type: String, record: EnemyRecord) {
        match self.index.get(&enemy_type) {
            Some(&slot) => self.records[slot].1 = record,
            None => {
                self.index.insert(enemy_type.clone(), self.records.len());
                self.records.push((enemy_type, record));
            }
        }
    }

    pub fn get(&self, enemy_type: &str) -> Option<&EnemyRecord> {
        self.index.get(enemy_type).map(|&slot| &self.records[slot].1)
    }

    pub fn contains(&self, enemy_type: &str) -> bool {
        self.index.contains_key(enemy_type)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &EnemyRecord)> {
        self.records.iter().map(|(enemy_type, record)| (enemy_type.as_str(), record))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Stable fingerprint of the records, used to tag tool output.
    pub fn content_hash(&self) -> u64 {
        let mut hasher = Xxh3::new();
        for (enemy_type, record) in &self.records {
            hasher.write(enemy_type.as_bytes());
            hasher.write_u8(0xff);
            for slot in <[i8; 4]>::from(record.elements) {
                hasher.write_i8(slot);
            }
            hasher.write(record.map_elements.as_bytes());
            hasher.write_u8(0xff);
            hasher.write_u64(record.endurance.to_bits());
        }
        hasher.finish()
    }
}

impl<S: Into<String>> FromIterator<(S, EnemyRecord)> for EnemyDatabase {
    fn from_iter<I: IntoIterator<Item = (S, EnemyRecord)>>(iter: I) -> Self {
        let mut database = Self::default();
        for (enemy_type, record) in iter {
            database.insert(enemy_type.into(), record);
        }
        database
    }
}

/// The game's own per-type enemy entry; only the level matters here.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameEnemyEntry {
    pub level: i32,
}

/// Baseline levels the substitution is anchored to.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameEnemyTable {
    entries: HashMap<String, GameEnemyEntry>,
}

impl GameEnemyTable {
    pub fn builtin() -> Result<Self, DatabaseError> {
        Self::from_json_str(BUILTIN_GAME_ENEMIES)
    }

    pub fn from_json_str(json: &str) -> Result<Self, DatabaseError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, DatabaseError> {
        let contents = fs::read_to_string(path)
            .map_err(|source| DatabaseError::Read { path: path.to_path_buf(), source })?;
        Self::from_json_str(&contents)
    }

    pub fn level_of(&self, enemy_type: &str) -> Option<i32> {
        self.entries.get(enemy_type).map(|entry| entry.level)
    }

    pub fn insert(&mut self, enemy_type: impl Into<String>, level: i32) {
        self.entries.insert(enemy_type.into(), GameEnemyEntry { level });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, i32)> for GameEnemyTable {
    fn from_iter<I: IntoIterator<Item = (S, i32)>>(iter: I) -> Self {
        let mut table = Self::default();
        for (enemy_type, level) in iter {
            table.insert(enemy_type, level);
        }
        table
    }
}

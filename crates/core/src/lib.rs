pub mod change_map;
pub mod config;
pub mod database;
pub mod elements;
pub mod error;
pub mod events;
pub mod filter;
pub mod map;
pub mod map_objects;
pub mod map_pass;
pub mod pipeline;
pub mod rng;
pub mod selector;
pub mod triggers;

pub use change_map::ChangeMap;
pub use config::{ConfigError, RandomizerConfig, generate_seed, load_config_from_env};
pub use database::{DatabaseError, EnemyDatabase, EnemyRecord, GameEnemyEntry, GameEnemyTable};
pub use elements::{Element, ElementFlags, ElementRequirement};
pub use error::{EntityFailure, RandomizeError};
pub use events::ScriptEvent;
pub use filter::{EnduranceBand, compatible_types};
pub use map::{EntityKind, LevelRef, MapDescription, MapEntity};
pub use map_objects::{MapObject, MapObjectIds, Recipe};
pub use map_pass::{MapPassOutcome, Substitution, run_map_pass};
pub use pipeline::{EntityHost, LoadReport, Randomizer};
pub use selector::{SelectionContext, select_replacement};
pub use triggers::{TriggerPatchStats, patch_triggers};

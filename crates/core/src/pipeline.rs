//! Map-load lifecycle: randomize before the host builds the level, spawn the
//! queued props once it has finished.

use std::mem;

use crate::change_map::ChangeMap;
use crate::config::RandomizerConfig;
use crate::database::{DatabaseError, EnemyDatabase, GameEnemyTable};
use crate::elements::ElementFlags;
use crate::error::EntityFailure;
use crate::map::MapDescription;
use crate::map_objects::{MapObject, MapObjectIds};
use crate::map_pass::{MapPassOutcome, Substitution, run_map_pass};
use crate::selector::SelectionContext;
use crate::triggers::{TriggerPatchStats, patch_triggers};

/// Whatever instantiates entities in the running game.
pub trait EntityHost {
    fn spawn_entity(&mut self, object: &MapObject);
}

impl EntityHost for Vec<MapObject> {
    fn spawn_entity(&mut self, object: &MapObject) {
        self.push(object.clone());
    }
}

/// What one `before_load` did to a map.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LoadReport {
    pub change_map: ChangeMap,
    pub substitutions: Vec<Substitution>,
    pub failures: Vec<EntityFailure>,
    pub queued_objects: usize,
    pub triggers: TriggerPatchStats,
    /// See [`MapPassOutcome::digest`]; zero when nothing ran.
    pub digest: u64,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct Randomizer {
    database: EnemyDatabase,
    game_enemies: GameEnemyTable,
    config: RandomizerConfig,
    ids: MapObjectIds,
    spawn_queue: Vec<MapObject>,
}

impl Randomizer {
    pub fn new(database: EnemyDatabase, game_enemies: GameEnemyTable, config: RandomizerConfig) -> Self {
        Self { database, game_enemies, config, ids: MapObjectIds::new(), spawn_queue: Vec::new() }
    }

    /// Randomizer over the bundled sample data.
    pub fn builtin(config: RandomizerConfig) -> Result<Self, DatabaseError> {
        Ok(Self::new(EnemyDatabase::builtin()?, GameEnemyTable::builtin()?, config))
    }

    pub fn database(&self) -> &EnemyDatabase {
        &self.database
    }

    pub fn game_enemies(&self) -> &GameEnemyTable {
        &self.game_enemies
    }

    pub fn config(&self) -> &RandomizerConfig {
        &self.config
    }

    /// Applies from the next `before_load`; an already loaded map is not
    /// touched again.
    pub fn set_config(&mut self, config: RandomizerConfig) {
        self.config = config;
    }

    /// Props waiting for `after_load`.
    pub fn pending_objects(&self) -> &[MapObject] {
        &self.spawn_queue
    }

    pub fn next_map_id(&self) -> u32 {
        self.ids.peek()
    }

    pub fn reset_map_ids(&mut self) {
        self.ids.reset();
    }

    /// Randomizes `map` in place and patches its triggers.
    ///
    /// Props from a previous load that never reached `after_load` are
    /// dropped. Returns an empty report when the randomizer is disabled.
    pub fn before_load(&mut self, map: &mut MapDescription, elements: ElementFlags) -> LoadReport {
        if !self.spawn_queue.is_empty() {
            tracing::debug!(
                target: "enemy_rando::pipeline",
                dropped = self.spawn_queue.len(),
                "spawn_queue.discarded"
            );
            self.spawn_queue.clear();
        }
        if !self.config.enabled {
            return LoadReport::default();
        }

        let context = SelectionContext {
            database: &self.database,
            game_enemies: &self.game_enemies,
            config: &self.config,
            elements,
        };
        let outcome = run_map_pass(map, &context, &mut self.ids);
        let triggers = patch_triggers(map, &outcome.change_map, &outcome.randomized_enemies);
        let digest = outcome.digest();

        let MapPassOutcome { spawn_queue, change_map, substitutions, failures, .. } = outcome;
        self.spawn_queue = spawn_queue;

        LoadReport {
            change_map,
            substitutions,
            failures,
            queued_objects: self.spawn_queue.len(),
            triggers,
            digest,
        }
    }

    /// Hands every queued prop to `host`, once. Returns how many were spawned.
    pub fn after_load<H: EntityHost + ?Sized>(&mut self, host: &mut H) -> usize {
        let queued = mem::take(&mut self.spawn_queue);
        for object in &queued {
            host.spawn_entity(object);
        }
        if !queued.is_empty() {
            tracing::info!(target: "enemy_rando::pipeline", spawned = queued.len(), "map_objects.spawned");
        }
        queued.len()
    }
}

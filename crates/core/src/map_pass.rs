//! One pass over a map's entities, randomizing enemies and spawner entries.

use std::collections::{HashMap, HashSet};
use std::hash::Hasher;
use std::mem;

use xxhash_rust::xxh3::Xxh3;

use crate::change_map::ChangeMap;
use crate::error::{EntityFailure, RandomizeError};
use crate::map::{
    ENEMY, ENEMY_SPAWNER, EnemySettings, EntityKind, LevelRef, MapDescription, MapLevel,
    SpawnerEntry, SpawnerSettings,
};
use crate::map_objects::{Footprint, MapObject, MapObjectIds};
use crate::rng::{entity_seed, spawner_slot_seed};
use crate::selector::{Selection, SelectionContext, randomize_enemy_info};

/// Side length of the square an enemy occupies when laying out props.
pub const ENEMY_FOOTPRINT: f64 = 16.0;
/// Spawner area used when the map omits `size`.
pub const DEFAULT_SPAWNER_SIZE: f64 = 16.0;

/// A substitution that went through.
#[derive(Clone, Debug, PartialEq)]
pub struct Substitution {
    pub entity_index: usize,
    /// `(entry, repetition)` for spawner slots, counted before expansion.
    pub spawner_slot: Option<(usize, u32)>,
    pub original_type: String,
    pub replacement_type: String,
    pub level: i32,
    pub seed: f64,
}

impl Substitution {
    fn new(entity_index: usize, spawner_slot: Option<(usize, u32)>, selection: Selection) -> Self {
        Self {
            entity_index,
            spawner_slot,
            original_type: selection.original_type,
            replacement_type: selection.replacement_type,
            level: selection.level,
            seed: selection.seed,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MapPassOutcome {
    /// Props to instantiate once the host has finished loading the map.
    pub spawn_queue: Vec<MapObject>,
    pub change_map: ChangeMap,
    /// Name of every randomized `Enemy` entity -> its authored type.
    pub randomized_enemies: HashMap<String, String>,
    pub substitutions: Vec<Substitution>,
    pub failures: Vec<EntityFailure>,
}

impl MapPassOutcome {
    /// Stable hash of what the pass decided. Object ids are left out so the
    /// same map loaded twice in one session hashes the same.
    pub fn digest(&self) -> u64 {
        let mut hasher = Xxh3::new();
        for substitution in &self.substitutions {
            hasher.write_usize(substitution.entity_index);
            match substitution.spawner_slot {
                Some((entry, repetition)) => {
                    hasher.write_u8(1);
                    hasher.write_usize(entry);
                    hasher.write_u32(repetition);
                }
                None => hasher.write_u8(0),
            }
            write_str(&mut hasher, &substitution.original_type);
            write_str(&mut hasher, &substitution.replacement_type);
            hasher.write_i32(substitution.level);
            hasher.write_u64(substitution.seed.to_bits());
        }
        for object in &self.spawn_queue {
            write_str(&mut hasher, object.type_name());
            hasher.write_u64(object.x.to_bits());
            hasher.write_u64(object.y.to_bits());
            hasher.write_u64(object.z.to_bits());
        }
        hasher.write_usize(self.failures.len());
        hasher.finish()
    }
}

fn write_str(hasher: &mut Xxh3, value: &str) {
    hasher.write(value.as_bytes());
    hasher.write_u8(0xff);
}

/// Randomizes every enemy and spawner in `map` that the config enables.
///
/// Each entity is handled on its own: a failure is recorded and the entity
/// stays as authored, then the pass moves on.
pub fn run_map_pass(
    map: &mut MapDescription,
    context: &SelectionContext<'_>,
    ids: &mut MapObjectIds,
) -> MapPassOutcome {
    let mut pass =
        MapPass { context, ids, base_seed: context.config.base_seed(), outcome: MapPassOutcome::default() };
    let MapDescription { levels, entities, .. } = map;
    let levels = levels.as_slice();

    for (entity_index, entity) in entities.iter_mut().enumerate() {
        let entity_name = entity.name().map(str::to_owned);
        let (x, y) = (entity.x, entity.y);
        match &mut entity.kind {
            EntityKind::Enemy(settings) if context.config.randomize_enemies => {
                let z = resolve_height(entity.level.as_ref(), levels);
                pass.enemy(entity_index, entity_name, x, y, z, settings);
            }
            EntityKind::EnemySpawner(settings) if context.config.randomize_spawners => {
                let z = resolve_height(entity.level.as_ref(), levels);
                pass.spawner(entity_index, entity_name, x, y, z, settings);
            }
            EntityKind::Malformed { type_name, reason, .. } if pass.would_visit(type_name) => {
                let error = RandomizeError::MalformedSettings {
                    entity_type: type_name.clone(),
                    reason: reason.clone(),
                };
                pass.fail(EntityFailure { entity_index, entity_name, spawner_slot: None, error });
            }
            _ => {}
        }
    }

    let outcome = pass.outcome;
    tracing::info!(
        target: "enemy_rando::map_pass",
        substitutions = outcome.substitutions.len(),
        failures = outcome.failures.len(),
        queued_objects = outcome.spawn_queue.len(),
        original_types = outcome.change_map.len(),
        "map_pass.complete"
    );
    outcome
}

/// Vertical coordinate of an entity from its level reference.
pub fn resolve_height(level: Option<&LevelRef>, levels: &[MapLevel]) -> Result<f64, RandomizeError> {
    match level {
        Some(reference) => reference.resolve(levels).ok_or_else(|| {
            RandomizeError::MalformedLevelReference { reference: reference.describe() }
        }),
        None => Err(RandomizeError::MalformedLevelReference { reference: "null".to_string() }),
    }
}

struct MapPass<'a, 'ctx> {
    context: &'a SelectionContext<'ctx>,
    ids: &'a mut MapObjectIds,
    base_seed: f64,
    outcome: MapPassOutcome,
}

impl MapPass<'_, '_> {
    fn would_visit(&self, type_name: &str) -> bool {
        match type_name {
            ENEMY => self.context.config.randomize_enemies,
            ENEMY_SPAWNER => self.context.config.randomize_spawners,
            _ => false,
        }
    }

    fn enemy(
        &mut self,
        entity_index: usize,
        entity_name: Option<String>,
        x: f64,
        y: f64,
        z: Result<f64, RandomizeError>,
        settings: &mut EnemySettings,
    ) {
        let z = match z {
            Ok(z) => z,
            Err(error) => {
                self.fail(EntityFailure { entity_index, entity_name, spawner_slot: None, error });
                return;
            }
        };
        let footprint = Footprint { x, y, z, width: ENEMY_FOOTPRINT, height: ENEMY_FOOTPRINT };
        let seed = entity_seed(x, y, self.base_seed);

        match randomize_enemy_info(
            self.context,
            &mut settings.enemy_info,
            &footprint,
            seed,
            &mut self.outcome.change_map,
            self.ids,
        ) {
            Ok((selection, objects)) => {
                if let Some(name) = entity_name {
                    self.outcome.randomized_enemies.insert(name, selection.original_type.clone());
                }
                self.outcome.spawn_queue.extend(objects);
                self.outcome.substitutions.push(Substitution::new(entity_index, None, selection));
            }
            Err(error) => {
                self.fail(EntityFailure { entity_index, entity_name, spawner_slot: None, error });
            }
        }
    }

    /// Every repetition of every entry becomes its own `count = 1` entry so
    /// each one can carry a different type. Props are kept once per object
    /// type across the whole spawner.
    fn spawner(
        &mut self,
        entity_index: usize,
        entity_name: Option<String>,
        x: f64,
        y: f64,
        z: Result<f64, RandomizeError>,
        settings: &mut SpawnerSettings,
    ) {
        let z = match z {
            Ok(z) => z,
            Err(error) => {
                self.fail(EntityFailure { entity_index, entity_name, spawner_slot: None, error });
                return;
            }
        };
        let (width, height) = settings
            .size
            .map_or((DEFAULT_SPAWNER_SIZE, DEFAULT_SPAWNER_SIZE), |size| (size.x, size.y));
        let footprint = Footprint { x, y, z, width, height };
        let spawner_seed = entity_seed(x, y, self.base_seed);

        let entries = mem::take(&mut settings.enemy_types);
        let mut expanded = Vec::with_capacity(entries.iter().map(|entry| entry.count as usize).sum());
        let mut seen_objects = HashSet::new();

        for (entry_index, entry) in entries.iter().enumerate() {
            for repetition in 0..entry.count {
                let mut slot = SpawnerEntry { count: 1, ..entry.clone() };
                let seed = spawner_slot_seed(spawner_seed, entry_index, repetition);
                match randomize_enemy_info(
                    self.context,
                    &mut slot.info,
                    &footprint,
                    seed,
                    &mut self.outcome.change_map,
                    self.ids,
                ) {
                    Ok((selection, objects)) => {
                        self.outcome.spawn_queue.extend(
                            objects.into_iter().filter(|object| seen_objects.insert(object.type_name())),
                        );
                        self.outcome.substitutions.push(Substitution::new(
                            entity_index,
                            Some((entry_index, repetition)),
                            selection,
                        ));
                    }
                    Err(error) => self.fail(EntityFailure {
                        entity_index,
                        entity_name: entity_name.clone(),
                        spawner_slot: Some((entry_index, repetition)),
                        error,
                    }),
                }
                expanded.push(slot);
            }
        }

        settings.enemy_types = expanded;
    }

    fn fail(&mut self, failure: EntityFailure) {
        tracing::warn!(
            target: "enemy_rando::map_pass",
            entity_index = failure.entity_index,
            entity_name = failure.entity_name.as_deref().unwrap_or(""),
            spawner_slot = ?failure.spawner_slot,
            error = %failure.error,
            "entity.skipped"
        );
        self.outcome.failures.push(failure);
    }
}

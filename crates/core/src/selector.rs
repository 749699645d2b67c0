//! Picks a replacement type and level for one enemy.

use crate::change_map::ChangeMap;
use crate::config::RandomizerConfig;
use crate::database::{EnemyDatabase, GameEnemyTable};
use crate::elements::ElementFlags;
use crate::error::RandomizeError;
use crate::filter::compatible_types;
use crate::map::EnemyInfo;
use crate::map_objects::{Footprint, MapObject, MapObjectIds, synthesize_named};
use crate::rng::{LEVEL_SEED_SCALE, int_from_seed};

/// Everything a substitution reads but never changes.
#[derive(Clone, Copy, Debug)]
pub struct SelectionContext<'a> {
    pub database: &'a EnemyDatabase,
    pub game_enemies: &'a GameEnemyTable,
    pub config: &'a RandomizerConfig,
    /// Elements the player can currently use.
    pub elements: ElementFlags,
}

impl SelectionContext<'_> {
    fn element_check(&self) -> Option<ElementFlags> {
        self.config.element_compatibility.then_some(self.elements)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Selection {
    pub original_type: String,
    pub replacement_type: String,
    pub level: i32,
    pub seed: f64,
}

/// Chooses a replacement for `enemy_type` from `seed` without touching any
/// map state.
pub fn select_replacement(
    context: &SelectionContext<'_>,
    enemy_type: &str,
    seed: f64,
) -> Result<Selection, RandomizeError> {
    let candidates = compatible_types(
        context.database,
        enemy_type,
        context.config.endurance_band(),
        context.element_check(),
    )?;
    let base_level = context
        .game_enemies
        .level_of(enemy_type)
        .ok_or_else(|| RandomizeError::MissingGameEntry { enemy_type: enemy_type.to_string() })?;
    if candidates.is_empty() {
        return Err(RandomizeError::EmptyCandidateSet { enemy_type: enemy_type.to_string() });
    }

    let len = candidates.len();
    let index = usize::try_from(int_from_seed(seed, 0, len as i64)).map_or(0, |index| index.min(len - 1));
    let replacement_type = candidates[index].to_string();

    let level_seed = seed * LEVEL_SEED_SCALE;
    let level = roll_level(level_seed, base_level, context.config);

    Ok(Selection { original_type: enemy_type.to_string(), replacement_type, level, seed })
}

/// Level in `[base - levelMinus, base + levelPlus)`, never below 1.
pub fn roll_level(seed: f64, base_level: i32, config: &RandomizerConfig) -> i32 {
    let low = i64::from(base_level) - i64::from(config.level_minus);
    let high = i64::from(base_level) + i64::from(config.level_plus);
    let rolled = int_from_seed(seed, low, high);
    if rolled <= 0 { 1 } else { i32::try_from(rolled).unwrap_or(i32::MAX) }
}

/// Randomizes one enemy-info record in place.
///
/// On success the info carries the new type and level and is marked as
/// generated, the change is recorded, and any props the new type needs are
/// returned. On failure nothing is modified.
pub fn randomize_enemy_info(
    context: &SelectionContext<'_>,
    info: &mut EnemyInfo,
    footprint: &Footprint,
    seed: f64,
    changes: &mut ChangeMap,
    ids: &mut MapObjectIds,
) -> Result<(Selection, Vec<MapObject>), RandomizeError> {
    let selection = select_replacement(context, &info.enemy_type, seed)?;
    tracing::debug!(
        target: "enemy_rando::selector",
        from = %selection.original_type,
        to = %selection.replacement_type,
        level = selection.level,
        seed = selection.seed,
        "enemy.randomized"
    );

    changes.record(&selection.original_type, &selection.replacement_type);
    info.enemy_type.clone_from(&selection.replacement_type);
    info.level = Some(selection.level);
    info.custom_generated = true;

    let objects = match context.database.get(&selection.replacement_type) {
        Some(record) if context.config.spawn_map_objects => {
            synthesize_named(&record.map_elements, footprint, context.elements, ids)
        }
        _ => Vec::new(),
    };

    Ok((selection, objects))
}

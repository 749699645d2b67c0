use anyhow::{Result, ensure};
use clap::Parser;
use enemy_rando::map::{
    EnemyInfo, EnemySettings, MapLevel, SpawnerEntry, SpawnerSettings, SpawnerSize,
};
use enemy_rando::{
    ElementFlags, EntityKind, LevelRef, MapDescription, MapEntity, MapObject, Randomizer,
    RandomizerConfig,
};
use rand_chacha::{
    ChaCha8Rng,
    rand_core::{Rng, SeedableRng},
};
use serde_json::Map as JsonMap;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value_t = 42)]
    seed: u64,
    #[arg(short, long, default_value_t = 200)]
    maps: u32,
}

fn choose<T: Clone>(rng: &mut ChaCha8Rng, slice: &[T]) -> T {
    let p = rng.next_u64() as usize % slice.len();
    slice[p].clone()
}

fn random_info(rng: &mut ChaCha8Rng, types: &[String]) -> EnemyInfo {
    EnemyInfo::of_type(choose(rng, types))
}

fn random_map(rng: &mut ChaCha8Rng, types: &[String]) -> MapDescription {
    let level_count = 1 + rng.next_u64() as usize % 4;
    let levels = (0..level_count).map(|index| MapLevel::at_height(index as f64 * 32.0)).collect();

    let entities = (0..rng.next_u64() % 40)
        .map(|index| {
            let x = (rng.next_u64() % 256) as f64 * 4.0;
            let y = (rng.next_u64() % 256) as f64 * 4.0;
            let level = LevelRef::Index(rng.next_u64() as usize % level_count);
            let kind = if rng.next_u64() % 3 == 0 {
                let entries = (0..1 + rng.next_u64() % 3)
                    .map(|_| {
                        let info = random_info(rng, types);
                        SpawnerEntry::new(info, 1 + (rng.next_u64() % 3) as u32)
                    })
                    .collect();
                EntityKind::EnemySpawner(SpawnerSettings {
                    name: Some(format!("spawner{index}")),
                    size: Some(SpawnerSize { x: 128.0, y: 96.0 }),
                    enemy_types: entries,
                    extra: JsonMap::new(),
                })
            } else {
                EntityKind::Enemy(EnemySettings {
                    name: Some(format!("enemy{index}")),
                    enemy_info: random_info(rng, types),
                    extra: JsonMap::new(),
                })
            };
            MapEntity::new(x, y, level, kind)
        })
        .collect();

    MapDescription { levels, entities, extra: JsonMap::new() }
}

fn check_info(randomizer: &Randomizer, info: &EnemyInfo) -> Result<()> {
    ensure!(info.custom_generated, "Invariant failed: {} was not randomized", info.enemy_type);
    ensure!(
        randomizer.database().contains(&info.enemy_type),
        "Invariant failed: {} is not in the database",
        info.enemy_type
    );
    ensure!(
        info.level.is_some_and(|level| level >= 1),
        "Invariant failed: level {:?} below 1",
        info.level
    );
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    println!("Starting fuzz harness on seed {} for {} maps...", args.seed, args.maps);
    let config = RandomizerConfig { element_compatibility: false, ..RandomizerConfig::default() };
    let mut randomizer = Randomizer::builtin(config)?;
    let types: Vec<String> =
        randomizer.database().iter().map(|(enemy_type, _)| enemy_type.to_string()).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(args.seed);
    let mut last_map_id = None;

    for map_index in 0..args.maps {
        let mut map = random_map(&mut rng, &types);
        randomizer.set_config(RandomizerConfig {
            seed: rng.next_u64() % 1_000_000,
            ..randomizer.config().clone()
        });
        let report = randomizer.before_load(&mut map, ElementFlags::ALL);
        let mut spawned: Vec<MapObject> = Vec::new();
        randomizer.after_load(&mut spawned);

        // Every enemy in the database is known and every level resolves, so
        // nothing may fail.
        ensure!(report.is_clean(), "Invariant failed: map {map_index} reported {:?}", report.failures);
        let recorded: usize = report.change_map.iter().map(|(_, replacements)| replacements.len()).sum();
        ensure!(recorded == report.substitutions.len(), "Invariant failed: change map out of sync");

        let config = randomizer.config();
        for substitution in &report.substitutions {
            let base = randomizer.game_enemies().level_of(&substitution.original_type);
            ensure!(base.is_some(), "Invariant failed: {} has no anchor level", substitution.original_type);
            let band = base.map_or(0..0, |base| base - config.level_minus..base + config.level_plus);
            ensure!(
                substitution.level == 1 || band.contains(&substitution.level),
                "Invariant failed: level {} outside {band:?}",
                substitution.level
            );
        }

        for entity in &map.entities {
            match &entity.kind {
                EntityKind::Enemy(settings) => check_info(&randomizer, &settings.enemy_info)?,
                EntityKind::EnemySpawner(settings) => {
                    for entry in &settings.enemy_types {
                        ensure!(entry.count == 1, "Invariant failed: spawner entry not expanded");
                        check_info(&randomizer, &entry.info)?;
                    }
                }
                _ => {}
            }
        }

        for object in &spawned {
            if let Some(previous) = last_map_id {
                ensure!(object.map_id > previous, "Invariant failed: map ids not increasing");
            }
            last_map_id = Some(object.map_id);
        }
    }

    println!("Fuzzing completed successfully.");
    Ok(())
}

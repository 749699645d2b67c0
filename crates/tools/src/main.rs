use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use enemy_rando::{
    ChangeMap, ElementFlags, EnemyDatabase, EntityFailure, GameEnemyTable, MapDescription,
    MapObject, Randomizer, RandomizerConfig, compatible_types, generate_seed, load_config_from_env,
};
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Randomize the enemies of one map file
    Randomize {
        /// Map JSON to randomize
        #[arg(long)]
        map: PathBuf,
        #[command(flatten)]
        options: RandomizerArgs,
        /// Where to write the result; stdout when omitted
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// List the types that may replace one enemy type
    Candidates {
        #[arg(long)]
        enemy: String,
        #[command(flatten)]
        options: RandomizerArgs,
    },
    /// Print a freshly generated seed
    NewSeed {
        /// Config file whose seed is replaced with the new one
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Args)]
struct RandomizerArgs {
    /// TOML or JSON randomizer config; falls back to ENEMY_RANDO_CONFIG
    #[arg(long)]
    config: Option<PathBuf>,
    /// Overrides the config seed
    #[arg(long)]
    seed: Option<u64>,
    /// Elements the player has: `none`, `all` or a list like `heat,cold`
    #[arg(long, default_value = "none")]
    elements: ElementFlags,
    /// Enemy database JSON; the bundled sample when omitted
    #[arg(long)]
    database: Option<PathBuf>,
    /// Game enemy table JSON; the bundled sample when omitted
    #[arg(long)]
    game_enemies: Option<PathBuf>,
}

impl RandomizerArgs {
    fn load_config(&self) -> Result<RandomizerConfig> {
        let mut config = match &self.config {
            Some(path) => RandomizerConfig::from_file(path)
                .with_context(|| format!("Failed to load config: {}", path.display()))?,
            None => load_config_from_env().0,
        };
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        Ok(config.clamped())
    }

    fn build(&self) -> Result<Randomizer> {
        let database = match &self.database {
            Some(path) => EnemyDatabase::from_file(path)
                .with_context(|| format!("Failed to load enemy database: {}", path.display()))?,
            None => EnemyDatabase::builtin().context("Bundled enemy database is invalid")?,
        };
        let game_enemies = match &self.game_enemies {
            Some(path) => GameEnemyTable::from_file(path)
                .with_context(|| format!("Failed to load game enemy table: {}", path.display()))?,
            None => GameEnemyTable::builtin().context("Bundled game enemy table is invalid")?,
        };
        Ok(Randomizer::new(database, game_enemies, self.load_config()?))
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FailureLine<'a> {
    entity_index: usize,
    entity_name: Option<&'a str>,
    spawner_slot: Option<(usize, u32)>,
    enemy_type: Option<&'a str>,
    error: String,
}

impl<'a> From<&'a EntityFailure> for FailureLine<'a> {
    fn from(failure: &'a EntityFailure) -> Self {
        Self {
            entity_index: failure.entity_index,
            entity_name: failure.entity_name.as_deref(),
            spawner_slot: failure.spawner_slot,
            enemy_type: failure.error.enemy_type(),
            error: failure.error.to_string(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RandomizeOutput<'a> {
    map: &'a MapDescription,
    spawn_queue: &'a [MapObject],
    change_map: &'a ChangeMap,
    failures: Vec<FailureLine<'a>>,
}

fn randomize(map_path: &Path, options: &RandomizerArgs, out: Option<&Path>) -> Result<()> {
    let map_data = fs::read_to_string(map_path)
        .with_context(|| format!("Failed to read map file: {}", map_path.display()))?;
    let mut map: MapDescription =
        serde_json::from_str(&map_data).with_context(|| "Failed to deserialize map JSON")?;

    let mut randomizer = options.build()?;
    let report = randomizer.before_load(&mut map, options.elements);
    let mut spawn_queue: Vec<MapObject> = Vec::new();
    randomizer.after_load(&mut spawn_queue);

    let output = RandomizeOutput {
        map: &map,
        spawn_queue: &spawn_queue,
        change_map: &report.change_map,
        failures: report.failures.iter().map(FailureLine::from).collect(),
    };
    let json = serde_json::to_string_pretty(&output).context("Failed to serialize output")?;

    match out {
        Some(path) => {
            fs::write(path, json)
                .with_context(|| format!("Failed to write output: {}", path.display()))?;
            println!("Randomized {} enemies.", report.substitutions.len());
            println!("Failures: {}", report.failures.len());
            println!("Queued map objects: {}", spawn_queue.len());
            println!("Digest: {:016x}", report.digest);
            println!("Database: {:016x}", randomizer.database().content_hash());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn candidates(enemy: &str, options: &RandomizerArgs) -> Result<()> {
    let randomizer = options.build()?;
    let config = randomizer.config();
    let element_check = config.element_compatibility.then_some(options.elements);
    let candidates =
        compatible_types(randomizer.database(), enemy, config.endurance_band(), element_check)
            .with_context(|| format!("Cannot list candidates for {enemy}"))?;

    if candidates.is_empty() {
        println!("No compatible replacement for {enemy}.");
    }
    for candidate in candidates {
        println!("{candidate}");
    }
    Ok(())
}

fn new_seed(config_path: Option<&Path>) -> Result<()> {
    let Some(path) = config_path else {
        println!("{}", generate_seed());
        return Ok(());
    };
    let mut config = RandomizerConfig::from_file(path)
        .with_context(|| format!("Failed to load config: {}", path.display()))?;
    let seed = config.regenerate_seed();
    config
        .save_to_file(path)
        .with_context(|| format!("Failed to save config: {}", path.display()))?;
    println!("{seed}");
    Ok(())
}

fn main() -> Result<()> {
    // Logs go to stderr so `randomize` output on stdout stays valid JSON.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Randomize { map, options, out } => randomize(&map, &options, out.as_deref()),
        Commands::Candidates { enemy, options } => candidates(&enemy, &options),
        Commands::NewSeed { config } => new_seed(config.as_deref()),
    }
}

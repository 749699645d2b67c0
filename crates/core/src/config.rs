//! User-facing randomizer settings.
//!
//! Loaded from TOML or JSON, with an environment-variable override for the
//! file location. A map load copies the config it starts with, so edits only
//! take effect on the next load.

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::filter::EnduranceBand;

pub const CONFIG_PATH_ENV: &str = "ENEMY_RANDO_CONFIG";

pub const LEVEL_MINUS_RANGE: (i32, i32) = (0, 20);
pub const LEVEL_PLUS_RANGE: (i32, i32) = (0, 50);
pub const ENDURANCE_MIN_RANGE: (f64, f64) = (0.0, 2.0);
pub const ENDURANCE_MAX_RANGE: (f64, f64) = (1.0, 3.0);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RandomizerConfig {
    pub enabled: bool,
    pub randomize_spawners: bool,
    pub randomize_enemies: bool,
    /// Skip candidates whose element requirements the player cannot meet.
    pub element_compatibility: bool,
    pub spawn_map_objects: bool,
    pub seed: u64,
    pub level_minus: i32,
    pub level_plus: i32,
    /// How far below the source endurance a candidate may be.
    pub endurance_min: f64,
    /// How far above the source endurance a candidate may be.
    pub endurance_max: f64,
}

impl Default for RandomizerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            randomize_spawners: true,
            randomize_enemies: true,
            element_compatibility: true,
            spawn_map_objects: true,
            seed: 123,
            level_minus: 5,
            level_plus: 3,
            endurance_min: 1.0,
            endurance_max: 1.5,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse randomizer config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("failed to parse randomizer config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to encode randomizer config: {0}")]
    Encode(#[from] toml::ser::Error),
    #[error("failed to read randomizer config from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write randomizer config to {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid randomizer config: {0}")]
    Invalid(String),
}

impl RandomizerConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads `.json` files as JSON and everything else as TOML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::from_json_str(&contents),
            _ => Self::from_toml_str(&contents),
        }
    }

    /// Writes the config back in the format [`Self::from_file`] reads from `path`.
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => serde_json::to_string_pretty(self)?,
            _ => toml::to_string_pretty(self)?,
        };
        fs::write(path, contents).map_err(|source| ConfigError::Write { path: path.to_path_buf(), source })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [("enduranceMin", self.endurance_min), ("enduranceMax", self.endurance_max)] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        for (name, value) in [("levelMinus", self.level_minus), ("levelPlus", self.level_plus)] {
            if value < 0 {
                return Err(ConfigError::Invalid(format!("{name} must not be negative, got {value}")));
            }
        }
        Ok(())
    }

    /// Snaps every numeric setting into the range the options menu offers.
    pub fn clamped(mut self) -> Self {
        self.level_minus = self.level_minus.clamp(LEVEL_MINUS_RANGE.0, LEVEL_MINUS_RANGE.1);
        self.level_plus = self.level_plus.clamp(LEVEL_PLUS_RANGE.0, LEVEL_PLUS_RANGE.1);
        self.endurance_min = clamp_or_low(self.endurance_min, ENDURANCE_MIN_RANGE);
        self.endurance_max = clamp_or_low(self.endurance_max, ENDURANCE_MAX_RANGE);
        self
    }

    pub fn endurance_band(&self) -> EnduranceBand {
        EnduranceBand { below: self.endurance_min, above: self.endurance_max }
    }

    /// Seed as used in the per-entity seed arithmetic.
    pub fn base_seed(&self) -> f64 {
        self.seed as f64
    }

    /// Replaces the seed with a fresh one and returns it.
    pub fn regenerate_seed(&mut self) -> u64 {
        self.seed = generate_seed();
        self.seed
    }
}

fn clamp_or_low(value: f64, (low, high): (f64, f64)) -> f64 {
    if value.is_nan() { low } else { value.clamp(low, high) }
}

/// Config from `ENEMY_RANDO_CONFIG` when set and loadable, defaults otherwise.
pub fn load_config_from_env() -> (RandomizerConfig, Option<PathBuf>) {
    let Some(path) = env::var_os(CONFIG_PATH_ENV).map(PathBuf::from) else {
        tracing::info!(target: "enemy_rando::config", "randomizer_config.loaded=defaults");
        return (RandomizerConfig::default(), None);
    };

    match RandomizerConfig::from_file(&path) {
        Ok(config) => {
            tracing::info!(
                target: "enemy_rando::config",
                path = %path.display(),
                "randomizer_config.loaded=file"
            );
            (config, Some(path))
        }
        Err(err) => {
            tracing::warn!(
                target: "enemy_rando::config",
                path = %path.display(),
                error = %err,
                "randomizer_config.load_failed"
            );
            (RandomizerConfig::default(), None)
        }
    }
}

static GENERATED_SEED_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Fresh non-reproducible seed, used when the player asks for a new one.
pub fn generate_seed() -> u64 {
    let now_nanos =
        SystemTime::now().duration_since(UNIX_EPOCH).map_or(0_u128, |duration| duration.as_nanos());
    let pid = u64::from(std::process::id());
    let counter = GENERATED_SEED_COUNTER.fetch_add(1, Ordering::Relaxed);

    let entropy = (now_nanos as u64)
        ^ ((now_nanos >> 64) as u64)
        ^ pid.rotate_left(17)
        ^ counter.rotate_left(7);

    // Keep seeds exactly representable in the f64 seed arithmetic.
    mix_seed(entropy) >> 11
}

fn mix_seed(mut value: u64) -> u64 {
    value ^= value >> 30;
    value = value.wrapping_mul(0xBF58_476D_1CE4_E5B9);
    value ^= value >> 27;
    value = value.wrapping_mul(0x94D0_49BB_1331_11EB);
    value ^ (value >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn defaults_match_option_menu() {
        let config = RandomizerConfig::default();
        assert!(config.enabled && config.randomize_spawners && config.randomize_enemies);
        assert!(config.element_compatibility && config.spawn_map_objects);
        assert_eq!(config.seed, 123);
        assert_eq!((config.level_minus, config.level_plus), (5, 3));
        assert_eq!((config.endurance_min, config.endurance_max), (1.0, 1.5));
    }

    #[test]
    fn toml_fills_missing_fields_with_defaults() {
        let config = RandomizerConfig::from_toml_str("seed = 42\nspawnMapObjects = false\n")
            .expect("partial toml should parse");
        assert_eq!(config.seed, 42);
        assert!(!config.spawn_map_objects);
        assert_eq!(config.level_plus, 3);
    }

    #[test]
    fn json_is_accepted() {
        let config = RandomizerConfig::from_json_str(r#"{ "enduranceMax": 2.5, "levelMinus": 0 }"#)
            .expect("json should parse");
        assert_eq!(config.endurance_max, 2.5);
        assert_eq!(config.level_minus, 0);
    }

    #[test]
    fn negative_values_are_rejected() {
        let err = RandomizerConfig::from_toml_str("enduranceMin = -0.5").expect_err("negative band");
        assert!(matches!(err, ConfigError::Invalid(ref message) if message.contains("enduranceMin")));
        let err = RandomizerConfig::from_toml_str("levelPlus = -1").expect_err("negative spread");
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn clamped_snaps_into_menu_ranges() {
        let config = RandomizerConfig {
            level_minus: 99,
            level_plus: 70,
            endurance_min: 5.0,
            endurance_max: 0.2,
            ..RandomizerConfig::default()
        }
        .clamped();
        assert_eq!((config.level_minus, config.level_plus), (20, 50));
        assert_eq!((config.endurance_min, config.endurance_max), (2.0, 1.0));
    }

    #[test]
    fn file_loader_picks_format_by_extension() {
        let mut toml_file = Builder::new().suffix(".toml").tempfile().expect("temp file");
        writeln!(toml_file, "seed = 7").expect("write");
        assert_eq!(RandomizerConfig::from_file(toml_file.path()).expect("toml file").seed, 7);

        let mut json_file = Builder::new().suffix(".json").tempfile().expect("temp file");
        write!(json_file, r#"{{ "seed": 8 }}"#).expect("write");
        assert_eq!(RandomizerConfig::from_file(json_file.path()).expect("json file").seed, 8);
    }

    #[test]
    fn regenerated_seed_survives_a_save() {
        for suffix in [".toml", ".json"] {
            let file = Builder::new().suffix(suffix).tempfile().expect("temp file");
            let mut config = RandomizerConfig { level_plus: 9, ..RandomizerConfig::default() };
            let seed = config.regenerate_seed();
            assert_eq!(config.seed, seed);
            assert_ne!(seed, RandomizerConfig::default().seed);

            config.save_to_file(file.path()).expect("save");
            let reloaded = RandomizerConfig::from_file(file.path()).expect("reload");
            assert_eq!(reloaded, config, "{suffix} round trip");
        }
    }

    #[test]
    fn generated_seed_changes_between_calls() {
        let first = generate_seed();
        let second = generate_seed();
        assert_ne!(first, second, "seed generation should vary per call");
        assert!(first < (1_u64 << 53));
    }
}

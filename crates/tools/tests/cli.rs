use std::fs;
use std::process::Command;

use enemy_rando::RandomizerConfig;
use serde_json::{Value, json};
use tempfile::tempdir;

fn sample_map() -> Value {
    json!({
        "levels": [{ "height": 0.0 }],
        "entities": [
            { "type": "Enemy", "x": 120.0, "y": 88.0, "level": 0,
              "settings": { "name": "hog1", "enemyInfo": { "type": "autumn.hedgehog" } } },
            { "type": "Enemy", "x": 24.0, "y": 40.0, "level": 0,
              "settings": { "name": "ghost", "enemyInfo": { "type": "autumn.ghost" } } },
            { "type": "EventTrigger", "x": 0.0, "y": 0.0, "level": 0,
              "settings": { "event": [{ "type": "SET_TYPED_ENEMY_TARGET", "enemyType": "autumn.hedgehog" }] } }
        ]
    })
}

#[test]
fn randomize_writes_map_queue_changes_and_failures() {
    let dir = tempdir().expect("temp dir");
    let map_path = dir.path().join("map.json");
    let config_path = dir.path().join("rando.toml");
    let out_path = dir.path().join("out.json");
    fs::write(&map_path, sample_map().to_string()).expect("write map");
    fs::write(&config_path, "seed = 77\nelementCompatibility = false\n").expect("write config");

    let status = Command::new(env!("CARGO_BIN_EXE_rando"))
        .arg("randomize")
        .arg("--map")
        .arg(&map_path)
        .arg("--config")
        .arg(&config_path)
        .arg("--out")
        .arg(&out_path)
        .status()
        .expect("run rando");
    assert!(status.success());

    let output: Value =
        serde_json::from_str(&fs::read_to_string(&out_path).expect("read output")).expect("json");
    assert_eq!(output["map"]["entities"][0]["settings"]["enemyInfo"]["customGenerated"], json!(true));
    assert!(output["spawnQueue"].is_array());
    assert_eq!(output["changeMap"]["autumn.hedgehog"].as_array().map(Vec::len), Some(1));
    assert_eq!(output["failures"][0]["entityName"], json!("ghost"));
    assert_eq!(output["failures"][0]["enemyType"], json!("autumn.ghost"));
}

#[test]
fn randomize_is_reproducible_for_a_seed() {
    let dir = tempdir().expect("temp dir");
    let map_path = dir.path().join("map.json");
    fs::write(&map_path, sample_map().to_string()).expect("write map");

    let run = || {
        let output = Command::new(env!("CARGO_BIN_EXE_rando"))
            .args(["randomize", "--seed", "4242", "--elements", "heat,cold", "--map"])
            .arg(&map_path)
            .env_remove("ENEMY_RANDO_CONFIG")
            .output()
            .expect("run rando");
        assert!(output.status.success());
        output.stdout
    };
    assert_eq!(run(), run());
}

#[test]
fn randomize_stdout_stays_json_with_logging_enabled() {
    let dir = tempdir().expect("temp dir");
    let map_path = dir.path().join("map.json");
    let mut map = sample_map();
    if let Some(entities) = map["entities"].as_array_mut() {
        entities.push(json!({ "type": "EnemySpawner", "x": 64.0, "y": 64.0, "level": 0,
                              "settings": { "name": "broken", "enemyTypes": [{ "count": 2 }] } }));
    }
    fs::write(&map_path, map.to_string()).expect("write map");

    let output = Command::new(env!("CARGO_BIN_EXE_rando"))
        .args(["randomize", "--map"])
        .arg(&map_path)
        .env("RUST_LOG", "info")
        .env_remove("ENEMY_RANDO_CONFIG")
        .output()
        .expect("run rando");
    assert!(output.status.success());

    let parsed: Value = serde_json::from_slice(&output.stdout).expect("stdout should be pure json");
    assert_eq!(parsed["map"]["entities"][0]["settings"]["enemyInfo"]["customGenerated"], json!(true));
    assert_eq!(parsed["map"]["entities"][3], map["entities"][3]);
    let failed: Vec<&str> = parsed["failures"]
        .as_array()
        .map(|failures| failures.iter().filter_map(|failure| failure["entityName"].as_str()).collect())
        .unwrap_or_default();
    assert_eq!(failed, ["ghost", "broken"]);
    let stderr = String::from_utf8(output.stderr).expect("utf8");
    assert!(stderr.contains("map_pass.complete"), "logs should land on stderr: {stderr}");
}

#[test]
fn new_seed_rewrites_the_config_seed() {
    let dir = tempdir().expect("temp dir");
    let config_path = dir.path().join("rando.toml");
    fs::write(&config_path, "seed = 5
levelPlus = 7
").expect("write config");

    let output = Command::new(env!("CARGO_BIN_EXE_rando"))
        .args(["new-seed", "--config"])
        .arg(&config_path)
        .output()
        .expect("run rando");
    assert!(output.status.success());

    let printed: u64 = String::from_utf8(output.stdout)
        .expect("utf8")
        .trim()
        .parse()
        .expect("seed should be printed");
    let saved = RandomizerConfig::from_file(&config_path).expect("config should reload");
    assert_eq!(saved.seed, printed);
    assert_eq!(saved.level_plus, 7);
}

#[test]
fn candidates_lists_compatible_types() {
    let output = Command::new(env!("CARGO_BIN_EXE_rando"))
        .args(["candidates", "--enemy", "autumn.hedgehog", "--elements", "none"])
        .env_remove("ENEMY_RANDO_CONFIG")
        .output()
        .expect("run rando");
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("utf8");
    let listed: Vec<&str> = stdout.lines().collect();
    assert!(listed.contains(&"autumn.hedgehog"));
    assert!(!listed.contains(&"jungle.gorilla"), "gorilla is too tough: {listed:?}");
    assert!(!listed.contains(&"shock-dng.spider-shock"), "needs shock: {listed:?}");
}

#[test]
fn unknown_enemy_is_an_error() {
    let output = Command::new(env!("CARGO_BIN_EXE_rando"))
        .args(["candidates", "--enemy", "autumn.ghost"])
        .env_remove("ENEMY_RANDO_CONFIG")
        .output()
        .expect("run rando");
    assert!(!output.status.success());
}

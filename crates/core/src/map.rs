//! Host map description: levels, entities and their per-type settings.
//!
//! Fields this crate does not interpret are kept in `extra` maps so a map
//! survives a parse/serialize round-trip unchanged apart from the edits the
//! randomizer makes.

use serde::de::DeserializeOwned;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map as JsonMap, Value};

use crate::events::ScriptEvent;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MapDescription {
    #[serde(default)]
    pub levels: Vec<MapLevel>,
    #[serde(default)]
    pub entities: Vec<MapEntity>,
    #[serde(flatten)]
    pub extra: JsonMap<String, Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MapLevel {
    pub height: f64,
    #[serde(flatten)]
    pub extra: JsonMap<String, Value>,
}

impl MapLevel {
    pub fn at_height(height: f64) -> Self {
        Self { height, extra: JsonMap::new() }
    }
}

/// Which level an entity stands on.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LevelRef {
    Index(usize),
    Offset {
        level: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        offset: Option<f64>,
    },
    Malformed(Value),
}

impl LevelRef {
    /// Vertical coordinate of the reference, or `None` when it does not
    /// point into `levels`.
    pub fn resolve(&self, levels: &[MapLevel]) -> Option<f64> {
        match self {
            Self::Index(index) => levels.get(*index).map(|level| level.height),
            Self::Offset { level, offset } => {
                levels.get(*level).map(|entry| entry.height + offset.unwrap_or(0.0))
            }
            Self::Malformed(_) => None,
        }
    }

    pub fn describe(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{self:?}"))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnemyInfo {
    #[serde(rename = "type")]
    pub enemy_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<i32>,
    /// Set on enemies the randomizer produced.
    #[serde(default, skip_serializing_if = "is_false")]
    pub custom_generated: bool,
    #[serde(flatten)]
    pub extra: JsonMap<String, Value>,
}

impl EnemyInfo {
    pub fn of_type(enemy_type: impl Into<String>) -> Self {
        Self { enemy_type: enemy_type.into(), ..Self::default() }
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnemySettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub enemy_info: EnemyInfo,
    #[serde(flatten)]
    pub extra: JsonMap<String, Value>,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpawnerSize {
    pub x: f64,
    pub y: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpawnerEntry {
    pub info: EnemyInfo,
    #[serde(default = "default_count")]
    pub count: u32,
    #[serde(flatten)]
    pub extra: JsonMap<String, Value>,
}

impl SpawnerEntry {
    pub fn new(info: EnemyInfo, count: u32) -> Self {
        Self { info, count, extra: JsonMap::new() }
    }
}

fn default_count() -> u32 {
    1
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpawnerSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<SpawnerSize>,
    #[serde(default)]
    pub enemy_types: Vec<SpawnerEntry>,
    #[serde(flatten)]
    pub extra: JsonMap<String, Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EventTriggerSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub event: Vec<ScriptEvent>,
    #[serde(flatten)]
    pub extra: JsonMap<String, Value>,
}

pub const ENEMY: &str = "Enemy";
pub const ENEMY_SPAWNER: &str = "EnemySpawner";
pub const EVENT_TRIGGER: &str = "EventTrigger";

#[derive(Clone, Debug, PartialEq)]
pub enum EntityKind {
    Enemy(EnemySettings),
    EnemySpawner(SpawnerSettings),
    EventTrigger(EventTriggerSettings),
    /// Any entity type the randomizer leaves alone.
    Other { type_name: String, settings: Value },
    /// An enemy, spawner or trigger whose settings did not parse. Kept raw so
    /// it serializes back as authored.
    Malformed { type_name: String, settings: Value, reason: String },
}

impl EntityKind {
    pub fn type_name(&self) -> &str {
        match self {
            Self::Enemy(_) => ENEMY,
            Self::EnemySpawner(_) => ENEMY_SPAWNER,
            Self::EventTrigger(_) => EVENT_TRIGGER,
            Self::Other { type_name, .. } | Self::Malformed { type_name, .. } => type_name,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(from = "RawMapEntity")]
pub struct MapEntity {
    pub x: f64,
    pub y: f64,
    pub level: Option<LevelRef>,
    pub kind: EntityKind,
}

impl MapEntity {
    pub fn new(x: f64, y: f64, level: LevelRef, kind: EntityKind) -> Self {
        Self { x, y, level: Some(level), kind }
    }

    pub fn name(&self) -> Option<&str> {
        match &self.kind {
            EntityKind::Enemy(settings) => settings.name.as_deref(),
            EntityKind::EnemySpawner(settings) => settings.name.as_deref(),
            EntityKind::EventTrigger(settings) => settings.name.as_deref(),
            EntityKind::Other { settings, .. } | EntityKind::Malformed { settings, .. } => {
                settings.get("name").and_then(Value::as_str)
            }
        }
    }
}

#[derive(Deserialize)]
struct RawMapEntity {
    #[serde(rename = "type")]
    type_name: String,
    #[serde(default)]
    x: f64,
    #[serde(default)]
    y: f64,
    #[serde(default)]
    level: Option<LevelRef>,
    #[serde(default)]
    settings: Value,
}

impl From<RawMapEntity> for MapEntity {
    fn from(raw: RawMapEntity) -> Self {
        let RawMapEntity { type_name, x, y, level, settings } = raw;
        let parsed = match type_name.as_str() {
            ENEMY => parse_settings(&settings).map(EntityKind::Enemy),
            ENEMY_SPAWNER => parse_settings(&settings).map(EntityKind::EnemySpawner),
            EVENT_TRIGGER => parse_settings(&settings).map(EntityKind::EventTrigger),
            _ => Ok(EntityKind::Other { type_name: type_name.clone(), settings: settings.clone() }),
        };
        let kind = parsed.unwrap_or_else(|err| EntityKind::Malformed {
            type_name,
            settings,
            reason: err.to_string(),
        });
        Self { x, y, level, kind }
    }
}

fn parse_settings<T: DeserializeOwned>(settings: &Value) -> Result<T, serde_json::Error> {
    T::deserialize(settings)
}

impl Serialize for MapEntity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("MapEntity", 5)?;
        state.serialize_field("type", self.kind.type_name())?;
        state.serialize_field("x", &self.x)?;
        state.serialize_field("y", &self.y)?;
        match &self.level {
            Some(level) => state.serialize_field("level", level)?,
            None => state.skip_field("level")?,
        }
        match &self.kind {
            EntityKind::Enemy(settings) => state.serialize_field("settings", settings)?,
            EntityKind::EnemySpawner(settings) => state.serialize_field("settings", settings)?,
            EntityKind::EventTrigger(settings) => state.serialize_field("settings", settings)?,
            EntityKind::Other { settings, .. } | EntityKind::Malformed { settings, .. } => {
                state.serialize_field("settings", settings)?
            }
        }
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_map() -> Value {
        json!({
            "name": "autumn/path-1",
            "levels": [{ "height": 0.0 }, { "height": 32.0, "collision": [] }],
            "entities": [
                { "type": "Enemy", "x": 64.0, "y": 96.0, "level": 1,
                  "settings": { "name": "hog1", "enemyInfo": { "type": "autumn.hedgehog", "group": "g1" }, "mapId": 7 } },
                { "type": "EnemySpawner", "x": 128.0, "y": 128.0, "level": { "level": 0, "offset": 8.0 },
                  "settings": { "size": { "x": 64.0, "y": 48.0 },
                                "enemyTypes": [{ "info": { "type": "autumn.frobbit" }, "count": 2 }] } },
                { "type": "EventTrigger", "x": 0.0, "y": 0.0, "level": 0,
                  "settings": { "event": [{ "type": "SET_TYPED_ENEMY_TARGET", "enemyType": "autumn.frobbit" }] } },
                { "type": "Chest", "x": 10.0, "y": 20.0, "level": 0, "settings": { "chestType": "Bronze" } }
            ]
        })
    }

    #[test]
    fn parses_each_entity_kind() {
        let map: MapDescription = serde_json::from_value(sample_map()).expect("map should parse");
        assert_eq!(map.levels.len(), 2);
        assert_eq!(map.extra.get("name").and_then(Value::as_str), Some("autumn/path-1"));

        let kinds: Vec<&str> = map.entities.iter().map(|entity| entity.kind.type_name()).collect();
        assert_eq!(kinds, ["Enemy", "EnemySpawner", "EventTrigger", "Chest"]);

        match &map.entities[0].kind {
            EntityKind::Enemy(settings) => {
                assert_eq!(settings.name.as_deref(), Some("hog1"));
                assert_eq!(settings.enemy_info.enemy_type, "autumn.hedgehog");
                assert!(!settings.enemy_info.custom_generated);
            }
            other => panic!("unexpected kind {other:?}"),
        }
        match &map.entities[1].kind {
            EntityKind::EnemySpawner(settings) => {
                assert_eq!(settings.size, Some(SpawnerSize { x: 64.0, y: 48.0 }));
                assert_eq!(settings.enemy_types[0].count, 2);
            }
            other => panic!("unexpected kind {other:?}"),
        }
    }

    // Coordinates are written as floats so the round-trip compares equal.
    #[test]
    fn round_trip_preserves_unknown_fields() {
        let raw = sample_map();
        let map: MapDescription = serde_json::from_value(raw.clone()).expect("map should parse");
        assert_eq!(serde_json::to_value(&map).expect("serialize"), raw);
    }

    #[test]
    fn unparseable_settings_are_kept_raw() {
        let raw = json!({
            "levels": [{ "height": 0.0 }],
            "entities": [
                { "type": "Enemy", "x": 8.0, "y": 8.0, "level": 0,
                  "settings": { "name": "hog1", "enemyInfo": { "type": "autumn.hedgehog" } } },
                { "type": "Enemy", "x": 16.0, "y": 8.0, "level": 0, "settings": { "name": "blank" } },
                { "type": "EnemySpawner", "x": 32.0, "y": 8.0, "level": 0,
                  "settings": { "name": "spawner1", "enemyTypes": [{ "count": 2 }] } }
            ]
        });
        let map: MapDescription = serde_json::from_value(raw.clone()).expect("map should parse");
        assert!(matches!(map.entities[0].kind, EntityKind::Enemy(_)));
        match &map.entities[2].kind {
            EntityKind::Malformed { type_name, reason, .. } => {
                assert_eq!(type_name, ENEMY_SPAWNER);
                assert!(reason.contains("info"), "reason should name the missing field: {reason}");
            }
            other => panic!("unexpected kind {other:?}"),
        }
        assert_eq!(map.entities[1].kind.type_name(), ENEMY);
        assert_eq!(map.entities[1].name(), Some("blank"));
        assert_eq!(serde_json::to_value(&map).expect("serialize"), raw);
    }

    #[test]
    fn level_references_resolve_against_level_table() {
        let levels = [MapLevel::at_height(0.0), MapLevel::at_height(32.0)];
        assert_eq!(LevelRef::Index(1).resolve(&levels), Some(32.0));
        assert_eq!(LevelRef::Offset { level: 1, offset: Some(8.0) }.resolve(&levels), Some(40.0));
        assert_eq!(LevelRef::Offset { level: 0, offset: None }.resolve(&levels), Some(0.0));
        assert_eq!(LevelRef::Index(2).resolve(&levels), None);
        assert_eq!(LevelRef::Malformed(json!("top")).resolve(&levels), None);
    }

    #[test]
    fn odd_level_shapes_parse_as_malformed() {
        for raw in [json!("top"), json!(-1), json!(1.5), json!({ "offset": 3 })] {
            let level: LevelRef = serde_json::from_value(raw.clone()).expect("any value parses");
            assert_eq!(level, LevelRef::Malformed(raw));
        }
    }

    #[test]
    fn enemy_info_marks_custom_generated_only_when_set() {
        let mut info = EnemyInfo::of_type("autumn.buffalo");
        assert_eq!(serde_json::to_value(&info).expect("serialize"), json!({ "type": "autumn.buffalo" }));
        info.custom_generated = true;
        info.level = Some(4);
        assert_eq!(
            serde_json::to_value(&info).expect("serialize"),
            json!({ "type": "autumn.buffalo", "level": 4, "customGenerated": true })
        );
    }
}

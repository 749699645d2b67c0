//! Scripted events carried by event-trigger entities.
//!
//! Only the event kinds the trigger patcher rewrites are modelled; every
//! other event passes through as raw JSON.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map as JsonMap, Value};

pub const SET_TYPED_ENEMY_TARGET: &str = "SET_TYPED_ENEMY_TARGET";
pub const WAIT_UNTIL_ACTION_DONE: &str = "WAIT_UNTIL_ACTION_DONE";
pub const SET_ENEMY_TARGET: &str = "SET_ENEMY_TARGET";

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(from = "Value")]
pub enum ScriptEvent {
    /// Targets every enemy of one type. `fields` is the authored object in
    /// its original key order; `enemy_type` overrides its `enemyType` key.
    SetTypedEnemyTarget { enemy_type: String, fields: JsonMap<String, Value> },
    /// Blocks until the named entity finishes its action. `fields` is the
    /// authored object, including the `entity` reference.
    WaitUntilActionDone { entity_name: Option<String>, fields: JsonMap<String, Value> },
    /// Points the named global enemy at the player.
    SetEnemyTarget { enemy_name: String },
    Other(Value),
}

impl ScriptEvent {
    pub fn typed_enemy_target(enemy_type: impl Into<String>) -> Self {
        Self::SetTypedEnemyTarget { enemy_type: enemy_type.into(), fields: JsonMap::new() }
    }

    pub fn wait_until_action_done(entity_name: impl Into<String>) -> Self {
        let entity_name = entity_name.into();
        let mut entity = JsonMap::new();
        entity.insert("name".to_string(), Value::String(entity_name.clone()));
        let mut fields = JsonMap::new();
        fields.insert("entity".to_string(), Value::Object(entity));
        Self::WaitUntilActionDone { entity_name: Some(entity_name), fields }
    }

    pub fn kind(&self) -> Option<&str> {
        match self {
            Self::SetTypedEnemyTarget { .. } => Some(SET_TYPED_ENEMY_TARGET),
            Self::WaitUntilActionDone { .. } => Some(WAIT_UNTIL_ACTION_DONE),
            Self::SetEnemyTarget { .. } => Some(SET_ENEMY_TARGET),
            Self::Other(value) => value.get("type").and_then(Value::as_str),
        }
    }
}

impl From<Value> for ScriptEvent {
    fn from(value: Value) -> Self {
        let Value::Object(fields) = value else {
            return Self::Other(value);
        };
        let kind = fields.get("type").and_then(Value::as_str).map(str::to_owned);
        match kind.as_deref() {
            Some(SET_TYPED_ENEMY_TARGET) => {
                let Some(enemy_type) =
                    fields.get("enemyType").and_then(Value::as_str).map(str::to_owned)
                else {
                    return Self::Other(Value::Object(fields));
                };
                Self::SetTypedEnemyTarget { enemy_type, fields }
            }
            Some(WAIT_UNTIL_ACTION_DONE) => {
                let entity_name = fields
                    .get("entity")
                    .and_then(|entity| entity.get("name"))
                    .and_then(Value::as_str)
                    .map(str::to_owned);
                Self::WaitUntilActionDone { entity_name, fields }
            }
            _ => Self::Other(Value::Object(fields)),
        }
    }
}

#[derive(Serialize)]
struct GlobalEnemyRef<'a> {
    global: bool,
    name: &'a str,
}

#[derive(Serialize)]
struct PlayerTarget {
    player: bool,
}

impl Serialize for ScriptEvent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::SetTypedEnemyTarget { enemy_type, fields } => serialize_fields(
                serializer,
                SET_TYPED_ENEMY_TARGET,
                Some(("enemyType", enemy_type.as_str())),
                fields,
            ),
            Self::WaitUntilActionDone { fields, .. } => {
                serialize_fields(serializer, WAIT_UNTIL_ACTION_DONE, None, fields)
            }
            Self::SetEnemyTarget { enemy_name } => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("type", SET_ENEMY_TARGET)?;
                map.serialize_entry("enemy", &GlobalEnemyRef { global: true, name: enemy_name })?;
                map.serialize_entry("target", &PlayerTarget { player: true })?;
                map.end()
            }
            Self::Other(value) => value.serialize(serializer),
        }
    }
}

/// Writes `fields` in their own order with `type` (and `pinned`) forced to
/// the given values. Keys missing from `fields` are written first.
fn serialize_fields<S: Serializer>(
    serializer: S,
    kind: &str,
    pinned: Option<(&str, &str)>,
    fields: &JsonMap<String, Value>,
) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(None)?;
    if !fields.contains_key("type") {
        map.serialize_entry("type", kind)?;
    }
    if let Some((key, value)) = pinned.filter(|(key, _)| !fields.contains_key(*key)) {
        map.serialize_entry(key, value)?;
    }
    for (key, value) in fields {
        match pinned {
            _ if key == "type" => map.serialize_entry(key, kind)?,
            Some((pinned_key, pinned_value)) if key == pinned_key => {
                map.serialize_entry(key, pinned_value)?
            }
            _ => map.serialize_entry(key, value)?,
        }
    }
    map.end()
}

//! Rewrites event-trigger scripts so they still refer to the enemies that
//! actually exist after a map pass.

use std::collections::HashMap;
use std::mem;

use crate::change_map::ChangeMap;
use crate::events::ScriptEvent;
use crate::map::{EntityKind, MapDescription};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TriggerPatchStats {
    /// Typed-target events that were replaced by one event per new type.
    pub typed_targets_expanded: usize,
    /// Events written in place of the expanded ones.
    pub typed_targets_written: usize,
    /// Waits on randomized enemies turned into set-target events.
    pub waits_replaced: usize,
}

/// Patches every `EventTrigger` in `map`.
///
/// `randomized_enemies` maps entity names to their authored types, as
/// collected by the map pass. Events that need no change keep their
/// relative order.
pub fn patch_triggers(
    map: &mut MapDescription,
    change_map: &ChangeMap,
    randomized_enemies: &HashMap<String, String>,
) -> TriggerPatchStats {
    let mut stats = TriggerPatchStats::default();
    if change_map.is_empty() {
        return stats;
    }

    for entity in &mut map.entities {
        if let EntityKind::EventTrigger(settings) = &mut entity.kind {
            patch_events(&mut settings.event, change_map, randomized_enemies, &mut stats);
        }
    }

    tracing::debug!(
        target: "enemy_rando::triggers",
        expanded = stats.typed_targets_expanded,
        written = stats.typed_targets_written,
        waits_replaced = stats.waits_replaced,
        "triggers.patched"
    );
    stats
}

fn patch_events(
    events: &mut Vec<ScriptEvent>,
    change_map: &ChangeMap,
    randomized_enemies: &HashMap<String, String>,
    stats: &mut TriggerPatchStats,
) {
    let authored = mem::take(events);
    events.reserve(authored.len());

    for event in authored {
        match event {
            ScriptEvent::SetTypedEnemyTarget { enemy_type, fields } => {
                match change_map.distinct_replacements(&enemy_type) {
                    Some(replacements) => {
                        stats.typed_targets_expanded += 1;
                        stats.typed_targets_written += replacements.len();
                        events.extend(replacements.into_iter().map(|replacement| {
                            ScriptEvent::SetTypedEnemyTarget {
                                enemy_type: replacement.to_string(),
                                fields: fields.clone(),
                            }
                        }));
                    }
                    None => events.push(ScriptEvent::SetTypedEnemyTarget { enemy_type, fields }),
                }
            }
            ScriptEvent::WaitUntilActionDone { entity_name: Some(name), .. }
                if randomized_enemies
                    .get(&name)
                    .is_some_and(|original_type| change_map.contains(original_type)) =>
            {
                stats.waits_replaced += 1;
                events.push(ScriptEvent::SetEnemyTarget { enemy_name: name });
            }
            other => events.push(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::{EventTriggerSettings, LevelRef, MapEntity};
    use serde_json::{Map as JsonMap, Value, json};

    fn trigger_map(events: Value) -> MapDescription {
        let event: Vec<ScriptEvent> = serde_json::from_value(events).expect("events should parse");
        MapDescription {
            levels: Vec::new(),
            entities: vec![MapEntity::new(
                0.0,
                0.0,
                LevelRef::Index(0),
                EntityKind::EventTrigger(EventTriggerSettings {
                    name: Some("trigger".to_string()),
                    event,
                    extra: JsonMap::new(),
                }),
            )],
            extra: JsonMap::new(),
        }
    }

    fn events_json(map: &MapDescription) -> Value {
        match &map.entities[0].kind {
            EntityKind::EventTrigger(settings) => {
                serde_json::to_value(&settings.event).expect("serialize")
            }
            other => panic!("expected a trigger, got {other:?}"),
        }
    }

    #[test]
    fn typed_target_expands_to_distinct_replacements_in_place() {
        let mut changes = ChangeMap::new();
        changes.record("A", "B");
        changes.record("A", "C");
        changes.record("A", "B");

        let mut map = trigger_map(json!([
            { "type": "WAIT", "time": 1.0 },
            { "type": "SET_TYPED_ENEMY_TARGET", "enemyType": "A", "target": { "player": true } },
            { "type": "WAIT", "time": 2.0 }
        ]));
        let stats = patch_triggers(&mut map, &changes, &HashMap::new());

        assert_eq!(
            events_json(&map),
            json!([
                { "type": "WAIT", "time": 1.0 },
                { "type": "SET_TYPED_ENEMY_TARGET", "enemyType": "B", "target": { "player": true } },
                { "type": "SET_TYPED_ENEMY_TARGET", "enemyType": "C", "target": { "player": true } },
                { "type": "WAIT", "time": 2.0 }
            ])
        );
        assert_eq!(
            stats,
            TriggerPatchStats { typed_targets_expanded: 1, typed_targets_written: 2, waits_replaced: 0 }
        );
    }

    #[test]
    fn adjacent_typed_targets_are_each_expanded() {
        let mut changes = ChangeMap::new();
        changes.record("A", "B");
        changes.record("X", "Y");

        let mut map = trigger_map(json!([
            { "type": "SET_TYPED_ENEMY_TARGET", "enemyType": "A" },
            { "type": "SET_TYPED_ENEMY_TARGET", "enemyType": "X" },
            { "type": "SET_TYPED_ENEMY_TARGET", "enemyType": "untouched" }
        ]));
        patch_triggers(&mut map, &changes, &HashMap::new());

        let types: Vec<Value> = events_json(&map)
            .as_array()
            .expect("array")
            .iter()
            .map(|event| event["enemyType"].clone())
            .collect();
        assert_eq!(types, [json!("B"), json!("Y"), json!("untouched")]);
    }

    #[test]
    fn wait_on_randomized_enemy_becomes_set_target() {
        let mut changes = ChangeMap::new();
        changes.record("autumn.hedgehog", "autumn.frobbit");
        let randomized = HashMap::from([("hog1".to_string(), "autumn.hedgehog".to_string())]);

        let mut map = trigger_map(json!([
            { "type": "WAIT_UNTIL_ACTION_DONE", "entity": { "name": "hog1" } },
            { "type": "WAIT_UNTIL_ACTION_DONE", "entity": { "name": "npc" } }
        ]));
        let stats = patch_triggers(&mut map, &changes, &randomized);

        assert_eq!(
            events_json(&map),
            json!([
                { "type": "SET_ENEMY_TARGET", "enemy": { "global": true, "name": "hog1" }, "target": { "player": true } },
                { "type": "WAIT_UNTIL_ACTION_DONE", "entity": { "name": "npc" } }
            ])
        );
        assert_eq!(stats.waits_replaced, 1);
    }

    #[test]
    fn empty_change_map_changes_nothing() {
        let raw = json!([
            { "type": "SET_TYPED_ENEMY_TARGET", "enemyType": "A" },
            { "type": "WAIT_UNTIL_ACTION_DONE", "entity": { "name": "hog1" } }
        ]);
        let mut map = trigger_map(raw.clone());
        let randomized = HashMap::from([("hog1".to_string(), "A".to_string())]);
        let stats = patch_triggers(&mut map, &ChangeMap::new(), &randomized);
        assert_eq!(events_json(&map), raw);
        assert_eq!(stats, TriggerPatchStats::default());
    }
}

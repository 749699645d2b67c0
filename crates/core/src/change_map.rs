//! Per-load record of which types each original enemy type became.

use std::collections::BTreeMap;
use std::collections::HashSet;

use serde::Serialize;

/// Original type -> every replacement chosen for it, in the order chosen.
///
/// Repeats are kept; [`ChangeMap::distinct_replacements`] collapses them for
/// consumers that need each replacement once.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ChangeMap {
    entries: BTreeMap<String, Vec<String>>,
}

impl ChangeMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, original_type: &str, replacement_type: &str) {
        self.entries
            .entry(original_type.to_string())
            .or_default()
            .push(replacement_type.to_string());
    }

    pub fn replacements(&self, original_type: &str) -> Option<&[String]> {
        self.entries.get(original_type).map(Vec::as_slice)
    }

    /// Replacements for `original_type` in first-seen order, without repeats.
    pub fn distinct_replacements(&self, original_type: &str) -> Option<Vec<&str>> {
        let replacements = self.entries.get(original_type)?;
        let mut seen = HashSet::new();
        Some(
            replacements
                .iter()
                .map(String::as_str)
                .filter(|replacement| seen.insert(*replacement))
                .collect(),
        )
    }

    pub fn contains(&self, original_type: &str) -> bool {
        self.entries.contains_key(original_type)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|(original, replacements)| (original.as_str(), replacements.as_slice()))
    }

    /// Number of distinct original types.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

//! Candidate selection: which database types may stand in for a source type.

use crate::database::EnemyDatabase;
use crate::elements::ElementFlags;
use crate::error::RandomizeError;

/// Tolerance around a source endurance, in absolute units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnduranceBand {
    pub below: f64,
    pub above: f64,
}

impl EnduranceBand {
    /// Inclusive on both edges.
    pub fn contains(&self, source: f64, candidate: f64) -> bool {
        candidate >= source - self.below && candidate <= source + self.above
    }
}

/// Returns every database type compatible with `source_type`, in declaration
/// order. The source type itself is a valid candidate.
///
/// `element_check` is `None` when element compatibility is turned off;
/// otherwise it holds the elements currently available to the player.
pub fn compatible_types<'db>(
    database: &'db EnemyDatabase,
    source_type: &str,
    band: EnduranceBand,
    element_check: Option<ElementFlags>,
) -> Result<Vec<&'db str>, RandomizeError> {
    let source = database
        .get(source_type)
        .ok_or_else(|| RandomizeError::LookupMiss { enemy_type: source_type.to_string() })?;

    Ok(database
        .iter()
        .filter(|(_, candidate)| band.contains(source.endurance, candidate.endurance))
        .filter(|(_, candidate)| {
            element_check.is_none_or(|available| candidate.elements.is_satisfied_by(available))
        })
        .map(|(enemy_type, _)| enemy_type)
        .collect())
}

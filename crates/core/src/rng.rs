//! Deterministic seed-to-value helpers used by every randomization decision.
//!
//! Seeds are plain `f64` values: per-entity seeds are derived from map
//! coordinates and scaled by non-integer factors, so they are not integers in
//! general. Each call builds a fresh generator from the seed, which keeps the
//! functions pure.

use rand_chacha::{
    ChaCha8Rng,
    rand_core::{Rng, SeedableRng},
};
use xxhash_rust::xxh3::xxh3_64;

/// Entity seeds wrap at this modulus.
pub const ENTITY_SEED_MODULUS: f64 = 1_000_000.0;

/// Factor applied to the selection seed before rolling the level.
pub const LEVEL_SEED_SCALE: f64 = 1.5;

/// Returns a value in `[0, 1)` that depends only on `seed`.
pub fn number_from_seed(seed: f64) -> f64 {
    // -0.0 and 0.0 compare equal and must map to the same stream.
    let canonical = if seed == 0.0 { 0.0_f64 } else { seed };
    let mut rng = ChaCha8Rng::seed_from_u64(xxh3_64(&canonical.to_bits().to_le_bytes()));
    (rng.next_u64() >> 11) as f64 / (1_u64 << 53) as f64
}

/// Scales [`number_from_seed`] into `[min, max)`, truncating toward zero.
///
/// Results below zero are clamped to zero. Callers must ensure `max > min`;
/// for an empty range the result is `min` (or zero).
pub fn int_from_seed(seed: f64, min: i64, max: i64) -> i64 {
    let scaled = number_from_seed(seed) * (max - min) as f64 + min as f64;
    (scaled.trunc() as i64).max(0)
}

/// Seed for a single entity at `(x, y)`.
pub fn entity_seed(x: f64, y: f64, base_seed: f64) -> f64 {
    (x * y * base_seed) % ENTITY_SEED_MODULUS
}

/// Seed for one repetition of one spawner entry; both indices are zero-based.
pub fn spawner_slot_seed(spawner_seed: f64, entry_index: usize, repetition: u32) -> f64 {
    spawner_seed * (entry_index as f64 + 1.0) * (f64::from(repetition) + 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn number_from_seed_is_pure() {
        for seed in [0.0, 1.0, 123.0, 4_567.5, 999_999.0] {
            assert_eq!(number_from_seed(seed).to_bits(), number_from_seed(seed).to_bits());
        }
    }

    #[test]
    fn negative_zero_matches_zero() {
        assert_eq!(number_from_seed(-0.0).to_bits(), number_from_seed(0.0).to_bits());
    }

    #[test]
    fn nearby_seeds_produce_different_values() {
        let values: Vec<u64> =
            (0..32).map(|seed| number_from_seed(f64::from(seed)).to_bits()).collect();
        let mut deduped = values.clone();
        deduped.sort_unstable();
        deduped.dedup();
        assert_eq!(deduped.len(), values.len(), "expected distinct values for distinct seeds");
    }

    #[test]
    fn negative_scaled_values_clamp_to_zero() {
        assert_eq!(int_from_seed(42.0, -10, -5), 0);
    }

    #[test]
    fn entity_seed_wraps_at_modulus() {
        assert_eq!(entity_seed(100.0, 100.0, 123.0), 230_000.0);
        assert_eq!(entity_seed(1_000.0, 1_000.0, 1.0), 0.0);
    }

    #[test]
    fn spawner_slots_scale_by_entry_and_repetition() {
        assert_eq!(spawner_slot_seed(10.0, 0, 0), 10.0);
        assert_eq!(spawner_slot_seed(10.0, 1, 2), 60.0);
    }

    proptest! {
        #[test]
        fn number_from_seed_stays_in_unit_interval(seed in any::<f64>()) {
            let value = number_from_seed(seed);
            prop_assert!((0.0..1.0).contains(&value));
        }

        #[test]
        fn int_from_seed_is_repeatable(seed in -1.0e9..1.0e9_f64, min in 0_i64..100, span in 1_i64..100) {
            prop_assert_eq!(int_from_seed(seed, min, min + span), int_from_seed(seed, min, min + span));
        }

        #[test]
        fn int_from_seed_stays_in_half_open_range(seed in -1.0e9..1.0e9_f64, min in 0_i64..1_000, span in 1_i64..1_000) {
            let value = int_from_seed(seed, min, min + span);
            prop_assert!(value >= min && value < min + span, "{value} outside [{min}, {})", min + span);
        }
    }
}

//! Seeded stand-in for combat that defeats walking units at random.

use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use wave_defence_core::UnitId;

/// Picks units to defeat with a fixed probability per second of exposure.
#[derive(Debug)]
pub(crate) struct Attrition {
    rng: ChaCha8Rng,
    chance_per_second: f64,
}

impl Attrition {
    pub(crate) fn new(seed: u64, chance_per_second: f64) -> Self {
        let chance_per_second = if chance_per_second.is_nan() {
            0.0
        } else {
            chance_per_second.clamp(0.0, 1.0)
        };
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            chance_per_second,
        }
    }

    /// Rolls once per unit for a tick of length `dt`.
    pub(crate) fn select(
        &mut self,
        units: impl IntoIterator<Item = UnitId>,
        dt: Duration,
    ) -> Vec<UnitId> {
        if self.chance_per_second == 0.0 {
            return Vec::new();
        }

        let survival = (1.0 - self.chance_per_second).powf(dt.as_secs_f64());
        let chance = (1.0 - survival).clamp(0.0, 1.0);
        units
            .into_iter()
            .filter(|_| self.rng.gen_bool(chance))
            .collect()
    }
}

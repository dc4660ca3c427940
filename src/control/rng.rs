//! Seedable randomness for control handlers.

use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Random number source shared by every handler.
///
/// Seeded runs replay the same talk rolls, which the headless harness and
/// the tests rely on.
#[derive(Resource)]
pub struct GameRng {
    rng: StdRng,
    /// The seed used to initialize this RNG (if deterministic)
    pub seed: Option<u64>,
}

impl GameRng {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            seed: Some(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            seed: None,
        }
    }

    /// Generate a random f32 in the range [0.0, 1.0)
    pub fn random_f32(&mut self) -> f32 {
        self.rng.gen()
    }

    /// Roll against `chance` (0.0..=1.0)
    pub fn roll_chance(&mut self, chance: f32) -> bool {
        chance > 0.0 && self.random_f32() < chance
    }
}

impl Default for GameRng {
    fn default() -> Self {
        Self::from_entropy()
    }
}

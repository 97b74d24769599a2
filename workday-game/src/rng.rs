//! Seeded randomness for variant selection.
use hmac::{Hmac, Mac};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use sha2::Sha256;

use crate::catalog::{MinigameVariant, StageDefinition};

const VARIANT_STREAM_TAG: &[u8] = b"variant";

/// Uniform picker over a stage's minigame variants.
///
/// Identical seeds give identical pick sequences.
#[derive(Debug, Clone)]
pub struct VariantPicker {
    seed: u64,
    rng: SmallRng,
    draws: u64,
}

impl VariantPicker {
    #[must_use]
    pub fn from_seed(seed: u64) -> Self {
        Self {
            seed,
            rng: SmallRng::seed_from_u64(derive_stream_seed(seed, VARIANT_STREAM_TAG)),
            draws: 0,
        }
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Number of random draws consumed so far.
    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.draws
    }

    /// Pick one of the stage's variants with equal probability.
    ///
    /// Single-variant stages return their only variant without drawing.
    pub fn pick_random_variant<'a>(&mut self, stage: &'a StageDefinition) -> &'a MinigameVariant {
        let count = stage.minigames.len();
        if count <= 1 {
            return stage.first_variant();
        }
        self.draws += 1;
        let index = self.rng.gen_range(0..count);
        stage
            .minigames
            .get(index)
            .unwrap_or_else(|| stage.first_variant())
    }
}

pub(crate) fn derive_stream_seed(user_seed: u64, domain_tag: &[u8]) -> u64 {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(&user_seed.to_le_bytes()).expect("64-bit seed is valid key");
    mac.update(domain_tag);
    let digest = mac.finalize().into_bytes();
    let mut seed_bytes = [0_u8; 8];
    seed_bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(seed_bytes)
}

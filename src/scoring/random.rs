use rand::{rngs::StdRng, SeedableRng};
use sha2::{Digest, Sha256};

use crate::CampaignInput;

/// Source of the random draws used by the heuristic scorer.
///
/// `Seeded` derives a fresh generator per campaign from the seed and a stable
/// hash of the campaign, so identical requests score identically and no
/// generator state is shared between requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RandomSource {
    Seeded(u64),
    Entropy,
}

impl RandomSource {
    pub fn from_seed(seed: Option<u64>) -> Self {
        seed.map(RandomSource::Seeded).unwrap_or(RandomSource::Entropy)
    }

    pub fn label(self) -> &'static str {
        match self {
            RandomSource::Seeded(_) => "seeded",
            RandomSource::Entropy => "entropy",
        }
    }

    pub fn rng_for(self, input: &CampaignInput) -> StdRng {
        match self {
            RandomSource::Seeded(seed) => StdRng::seed_from_u64(seed ^ campaign_fingerprint(input)),
            RandomSource::Entropy => StdRng::from_entropy(),
        }
    }
}

fn campaign_fingerprint(input: &CampaignInput) -> u64 {
    let payload = format!(
        "{}|{}|{}|{}|{}|{}",
        input.product_name,
        input.budget,
        input.location,
        input.target_audience.age_group,
        input.target_audience.interests.join(";"),
        input.objectives.join(";")
    );
    stable_hash64(&payload)
}

fn stable_hash64(value: &str) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    let digest = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(bytes)
}

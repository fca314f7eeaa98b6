use serde::{Deserialize, Serialize};

use crate::types::Seed;

// Smoothing curve used between lattice corners
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Fade {
    Linear,
    // 3t^2 - 2t^3
    Cubic,
    // 6t^5 - 15t^4 + 10t^3, first and second derivative vanish at 0 and 1
    #[default]
    Quintic,
}

impl Fade {
    #[inline]
    pub fn apply(self, t: f64) -> f64 {
        match self {
            Fade::Linear => t,
            Fade::Cubic => t * t * (3.0 - 2.0 * t),
            Fade::Quintic => t * t * t * (t * (t * 6.0 - 15.0) + 10.0),
        }
    }
}

#[inline]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + t * (b - a)
}

// Standard splitmix64 step; used to expand seeds and to mix lattice hashes
#[inline]
pub fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

// Combine a seed with a 64-bit key into a new, well-mixed seed
#[inline]
pub fn mix_seed(seed: Seed, key: u64) -> Seed {
    splitmix64(seed ^ splitmix64(key))
}

// Map the top 53 bits of a hash to [0, 1)
#[inline]
pub fn unit_f64(h: u64) -> f64 {
    (h >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
}

// Map a hash to [-1, 1]
#[inline]
pub fn signed_unit_f64(h: u64) -> f64 {
    ((h >> 11) as f64 / ((1u64 << 53) - 1) as f64) * 2.0 - 1.0
}

/// Per-instance hashing state derived once from a seed.
///
/// Holds a 256-entry permutation table (duplicated to 512 so lookups never
/// wrap) for gradient selection and a 64-bit salt for full-width lattice
/// hashes. Every generator derives its randomness through this type, so all
/// of them share one seeding scheme.
#[derive(Clone)]
pub struct LatticeHasher {
    perm: [u8; 512],
    salt: u64,
}

impl LatticeHasher {
    pub fn new(seed: Seed) -> Self {
        let mut p: Vec<u8> = (0..256).map(|i| i as u8).collect();
        // xorshift over a splitmix-expanded seed; zero state would stick at zero
        let mut x = splitmix64(seed) | 1;
        let mut rng = || {
            x ^= x << 13;
            x ^= x >> 7;
            x ^= x << 17;
            x
        };
        // Fisher–Yates shuffle p[0..256]
        for i in (1..256).rev() {
            let j = (rng() % (i as u64 + 1)) as usize;
            p.swap(i, j);
        }
        let mut perm = [0u8; 512];
        for (i, slot) in perm.iter_mut().enumerate() {
            *slot = p[i & 255];
        }

        Self {
            perm,
            salt: splitmix64(seed ^ 0xA076_1D64_78BD_642F),
        }
    }

    // 8-bit hash of a lattice point, folded through the permutation table
    #[inline]
    pub fn perm_hash(&self, cell: &[i64]) -> u8 {
        let mut h = 0usize;
        for &c in cell {
            h = self.perm[h + (c & 255) as usize] as usize;
        }
        h as u8
    }

    // Full 64-bit hash of a lattice point plus a stream index
    #[inline]
    pub fn hash(&self, cell: &[i64], stream: u64) -> u64 {
        let mut h = self.salt ^ stream.wrapping_mul(0xD6E8_FEB8_6659_FD93);
        for &c in cell {
            h = splitmix64(h ^ c as u64);
        }
        h
    }
}

impl std::fmt::Debug for LatticeHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LatticeHasher")
            .field("salt", &self.salt)
            .finish_non_exhaustive()
    }
}

// Frequencies scale the input domain, so they must be usable as multipliers
pub(crate) fn check_frequency(frequency: f64) -> crate::error::Result<()> {
    if frequency.is_finite() && frequency != 0.0 {
        Ok(())
    } else {
        Err(crate::error::invalid(format!(
            "frequency must be finite and non-zero, got {frequency}"
        )))
    }
}

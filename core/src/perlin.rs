use crate::error::Result;
use crate::utils::{Fade, LatticeHasher, check_frequency};
use crate::{Coord, Dim, EvalContext, NoiseNode, OutputRange, Seed};

const FRAC_1_SQRT_3: f64 = 0.577_350_269_189_625_8;

// 2D: cardinal + diagonal directions on the unit circle
const GRAD2: [[f64; 2]; 8] = [
    [1.0, 0.0],
    [-1.0, 0.0],
    [0.0, 1.0],
    [0.0, -1.0],
    [std::f64::consts::FRAC_1_SQRT_2, std::f64::consts::FRAC_1_SQRT_2],
    [-std::f64::consts::FRAC_1_SQRT_2, std::f64::consts::FRAC_1_SQRT_2],
    [std::f64::consts::FRAC_1_SQRT_2, -std::f64::consts::FRAC_1_SQRT_2],
    [-std::f64::consts::FRAC_1_SQRT_2, -std::f64::consts::FRAC_1_SQRT_2],
];

// 3D: the 12 cube edge midpoints (scaled to unit length on use)
pub(crate) const GRAD3: [[f64; 3]; 12] = [
    [1.0, 1.0, 0.0],
    [-1.0, 1.0, 0.0],
    [1.0, -1.0, 0.0],
    [-1.0, -1.0, 0.0],
    [1.0, 0.0, 1.0],
    [-1.0, 0.0, 1.0],
    [1.0, 0.0, -1.0],
    [-1.0, 0.0, -1.0],
    [0.0, 1.0, 1.0],
    [0.0, -1.0, 1.0],
    [0.0, 1.0, -1.0],
    [0.0, -1.0, -1.0],
];

// 4D: one zero component, the other three ±1 (32 directions)
pub(crate) const GRAD4: [[f64; 4]; 32] = [
    [0.0, 1.0, 1.0, 1.0],
    [0.0, 1.0, 1.0, -1.0],
    [0.0, 1.0, -1.0, 1.0],
    [0.0, 1.0, -1.0, -1.0],
    [0.0, -1.0, 1.0, 1.0],
    [0.0, -1.0, 1.0, -1.0],
    [0.0, -1.0, -1.0, 1.0],
    [0.0, -1.0, -1.0, -1.0],
    [1.0, 0.0, 1.0, 1.0],
    [1.0, 0.0, 1.0, -1.0],
    [1.0, 0.0, -1.0, 1.0],
    [1.0, 0.0, -1.0, -1.0],
    [-1.0, 0.0, 1.0, 1.0],
    [-1.0, 0.0, 1.0, -1.0],
    [-1.0, 0.0, -1.0, 1.0],
    [-1.0, 0.0, -1.0, -1.0],
    [1.0, 1.0, 0.0, 1.0],
    [1.0, 1.0, 0.0, -1.0],
    [1.0, -1.0, 0.0, 1.0],
    [1.0, -1.0, 0.0, -1.0],
    [-1.0, 1.0, 0.0, 1.0],
    [-1.0, 1.0, 0.0, -1.0],
    [-1.0, -1.0, 0.0, 1.0],
    [-1.0, -1.0, 0.0, -1.0],
    [1.0, 1.0, 1.0, 0.0],
    [1.0, 1.0, -1.0, 0.0],
    [1.0, -1.0, 1.0, 0.0],
    [1.0, -1.0, -1.0, 0.0],
    [-1.0, 1.0, 1.0, 0.0],
    [-1.0, 1.0, -1.0, 0.0],
    [-1.0, -1.0, 1.0, 0.0],
    [-1.0, -1.0, -1.0, 0.0],
];

/// Gradient (Perlin) noise in 2, 3 or 4 dimensions.
///
/// Every hypercube corner gets a pseudo-random unit gradient; the result is
/// the fade-weighted sum of `gradient · offset` over all corners. With unit
/// gradients that sum is bounded by `sqrt(N) / 2` (reached at a cell centre),
/// so the output is scaled by `2 / sqrt(N)` into `[-1, 1]`.
///
/// A coordinate exactly on a lattice boundary belongs to the cell whose lower
/// corner is `floor(coordinate)`.
pub struct Perlin {
    seed: Seed,
    dim: Dim,
    frequency: f64, // Controls the "zoom level" of the noise pattern
    fade: Fade,
    hasher: LatticeHasher, // permutation table, built once from the seed
    norm: f64,
}

impl Perlin {
    pub fn new(seed: Seed, dim: Dim, frequency: f64, fade: Fade) -> Result<Self> {
        check_frequency(frequency)?;
        Ok(Self {
            seed,
            dim,
            frequency,
            fade,
            hasher: LatticeHasher::new(seed),
            norm: 2.0 / (dim.count() as f64).sqrt(),
        })
    }

    pub fn seed(&self) -> Seed {
        self.seed
    }

    // Dot product of the hashed corner gradient with the corner-to-point offset
    #[inline]
    fn grad(dim: Dim, hash: u8, d: &[f64]) -> f64 {
        match dim {
            Dim::D2 => {
                let g = GRAD2[(hash & 7) as usize];
                g[0] * d[0] + g[1] * d[1]
            }
            Dim::D3 => {
                let g = GRAD3[hash as usize % 12];
                (g[0] * d[0] + g[1] * d[1] + g[2] * d[2]) * std::f64::consts::FRAC_1_SQRT_2
            }
            Dim::D4 => {
                let g = GRAD4[(hash & 31) as usize];
                (g[0] * d[0] + g[1] * d[1] + g[2] * d[2] + g[3] * d[3]) * FRAC_1_SQRT_3
            }
        }
    }

    // Raw single-octave noise at an already frequency-scaled point
    fn noise(&self, p: &[f64]) -> f64 {
        let n = p.len();
        let mut cell = [0i64; 4];
        let mut frac = [0.0; 4];
        let mut fade = [0.0; 4];
        for i in 0..n {
            let f = p[i].floor();
            cell[i] = f as i64;
            frac[i] = p[i] - f;
            fade[i] = self.fade.apply(frac[i]);
        }

        // Visit the 2^N corners; bit i of `corner` selects the upper corner on axis i
        let mut total = 0.0;
        for corner in 0..(1usize << n) {
            let mut weight = 1.0;
            let mut lattice = [0i64; 4];
            let mut offset = [0.0; 4];
            for i in 0..n {
                if (corner >> i) & 1 == 1 {
                    lattice[i] = cell[i].wrapping_add(1);
                    offset[i] = frac[i] - 1.0;
                    weight *= fade[i];
                } else {
                    lattice[i] = cell[i];
                    offset[i] = frac[i];
                    weight *= 1.0 - fade[i];
                }
            }
            if weight == 0.0 {
                continue;
            }
            let h = self.hasher.perm_hash(&lattice[..n]);
            total += weight * Self::grad(self.dim, h, &offset[..n]);
        }
        total
    }
}

impl NoiseNode for Perlin {
    fn sample(&self, p: &Coord, _ctx: &mut EvalContext) -> f64 {
        let scaled = p.map_components(|_, v| v * self.frequency);
        (self.noise(scaled.as_slice()) * self.norm).clamp(-1.0, 1.0)
    }

    fn dim(&self) -> Dim {
        self.dim
    }

    fn range(&self) -> OutputRange {
        OutputRange::UNIT
    }
}

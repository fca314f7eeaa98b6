use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::utils::{Fade, LatticeHasher, check_frequency, signed_unit_f64};
use crate::{Coord, Dim, EvalContext, NoiseNode, OutputRange, Seed};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Interpolation {
    // value of the containing cell's lower corner, no blending
    Nearest,
    Linear,
    // quintic-faded blend, C2 at cell edges
    #[default]
    Smooth,
}

/// Value noise: a random value in `[-1, 1]` per lattice point, blended
/// across the containing cell. Every output is a convex combination of
/// lattice values, so the declared range is exact.
pub struct ValueNoise {
    seed: Seed,
    dim: Dim,
    frequency: f64,
    interpolation: Interpolation,
    hasher: LatticeHasher,
}

impl ValueNoise {
    pub fn new(seed: Seed, dim: Dim, frequency: f64, interpolation: Interpolation) -> Result<Self> {
        check_frequency(frequency)?;
        Ok(Self {
            seed,
            dim,
            frequency,
            interpolation,
            hasher: LatticeHasher::new(seed),
        })
    }

    pub fn seed(&self) -> Seed {
        self.seed
    }

    #[inline]
    fn lattice_value(&self, cell: &[i64]) -> f64 {
        signed_unit_f64(self.hasher.hash(cell, 0))
    }

    fn noise(&self, p: &[f64]) -> f64 {
        let n = p.len();
        let mut cell = [0i64; 4];
        let mut t = [0.0; 4];
        for i in 0..n {
            let f = p[i].floor();
            cell[i] = f as i64;
            t[i] = match self.interpolation {
                Interpolation::Nearest => 0.0,
                Interpolation::Linear => Fade::Linear.apply(p[i] - f),
                Interpolation::Smooth => Fade::Quintic.apply(p[i] - f),
            };
        }
        if self.interpolation == Interpolation::Nearest {
            return self.lattice_value(&cell[..n]);
        }

        let mut total = 0.0;
        for corner in 0..(1usize << n) {
            let mut weight = 1.0;
            let mut lattice = [0i64; 4];
            for i in 0..n {
                if (corner >> i) & 1 == 1 {
                    lattice[i] = cell[i].wrapping_add(1);
                    weight *= t[i];
                } else {
                    lattice[i] = cell[i];
                    weight *= 1.0 - t[i];
                }
            }
            if weight != 0.0 {
                total += weight * self.lattice_value(&lattice[..n]);
            }
        }
        total
    }
}

impl NoiseNode for ValueNoise {
    fn sample(&self, p: &Coord, _ctx: &mut EvalContext) -> f64 {
        let scaled = p.map_components(|_, v| v * self.frequency);
        self.noise(scaled.as_slice()).clamp(-1.0, 1.0)
    }

    fn dim(&self) -> Dim {
        self.dim
    }

    fn range(&self) -> OutputRange {
        OutputRange::UNIT
    }
}

use crate::error::Result;
use crate::utils::{LatticeHasher, check_frequency, signed_unit_f64, unit_f64};
use crate::{Coord, Dim, EvalContext, NoiseNode, OutputRange, Seed};

// Box–Muller radius for the smallest non-zero 53-bit draw: sqrt(-2 ln 2^-53)
const GAUSSIAN_BOUND: f64 = 8.58;

// Containing lattice cell of an already frequency-scaled point
#[inline]
fn cell_of(p: &[f64]) -> ([i64; 4], usize) {
    let mut cell = [0i64; 4];
    for (c, v) in cell.iter_mut().zip(p) {
        *c = v.floor() as i64;
    }
    (cell, p.len())
}

/// Uniform white noise: one independent value in `[-1, 1]` per lattice cell.
pub struct White {
    seed: Seed,
    dim: Dim,
    frequency: f64,
    hasher: LatticeHasher,
}

impl White {
    pub fn new(seed: Seed, dim: Dim, frequency: f64) -> Result<Self> {
        check_frequency(frequency)?;
        Ok(Self {
            seed,
            dim,
            frequency,
            hasher: LatticeHasher::new(seed),
        })
    }

    pub fn seed(&self) -> Seed {
        self.seed
    }
}

impl NoiseNode for White {
    fn sample(&self, p: &Coord, _ctx: &mut EvalContext) -> f64 {
        let scaled = p.map_components(|_, v| v * self.frequency);
        let (cell, n) = cell_of(scaled.as_slice());
        signed_unit_f64(self.hasher.hash(&cell[..n], 0))
    }

    fn dim(&self) -> Dim {
        self.dim
    }

    fn range(&self) -> OutputRange {
        OutputRange::UNIT
    }
}

/// Standard-normal white noise per lattice cell (Box–Muller over two
/// independent hash draws). Unbounded in theory; with 53-bit draws the
/// magnitude cannot exceed about 8.57, which is the declared range.
pub struct GaussianWhite {
    seed: Seed,
    dim: Dim,
    frequency: f64,
    hasher: LatticeHasher,
}

impl GaussianWhite {
    pub fn new(seed: Seed, dim: Dim, frequency: f64) -> Result<Self> {
        check_frequency(frequency)?;
        Ok(Self {
            seed,
            dim,
            frequency,
            hasher: LatticeHasher::new(seed),
        })
    }

    pub fn seed(&self) -> Seed {
        self.seed
    }
}

impl NoiseNode for GaussianWhite {
    fn sample(&self, p: &Coord, _ctx: &mut EvalContext) -> f64 {
        let scaled = p.map_components(|_, v| v * self.frequency);
        let (cell, n) = cell_of(scaled.as_slice());
        // u1 in (0, 1] keeps ln finite
        let u1 = 1.0 - unit_f64(self.hasher.hash(&cell[..n], 1));
        let u2 = unit_f64(self.hasher.hash(&cell[..n], 2));
        (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
    }

    fn dim(&self) -> Dim {
        self.dim
    }

    fn range(&self) -> OutputRange {
        OutputRange {
            min: -GAUSSIAN_BOUND,
            max: GAUSSIAN_BOUND,
        }
    }
}

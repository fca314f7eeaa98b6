use crate::error::Result;
use crate::perlin::{GRAD3, GRAD4};
use crate::utils::{LatticeHasher, check_frequency};
use crate::{Coord, Dim, EvalContext, NoiseNode, OutputRange, Seed};

// Squared kernel radius. 0.5 keeps every corner's influence inside the
// simplices that share it, so the field has no seams.
const RADIUS_SQ: f64 = 0.5;

/// Simplex noise in 2, 3 or 4 dimensions.
///
/// Space is skewed so the unit hypercube splits into N! simplices; only the
/// N + 1 corners of the containing simplex contribute, each through a radial
/// falloff kernel. Seeding goes through the same [`LatticeHasher`] as
/// [`crate::Perlin`], so a graph can mix both under one seed scheme.
///
/// Tie-break: the simplex is chosen by ranking the in-cell offsets per axis;
/// equal offsets rank the later axis higher. Output is scaled to roughly unit
/// amplitude and clamped to `[-1, 1]`.
pub struct Simplex {
    seed: Seed,
    dim: Dim,
    frequency: f64,
    hasher: LatticeHasher,
    skew: f64,   // F = (sqrt(N+1) - 1) / N, squeezes the hypercube lattice
    unskew: f64, // G = (1 - 1/sqrt(N+1)) / N, reverses the skewing
    scale: f64,
}

impl Simplex {
    pub fn new(seed: Seed, dim: Dim, frequency: f64) -> Result<Self> {
        check_frequency(frequency)?;
        let n = dim.count() as f64;
        let root = (n + 1.0).sqrt();
        let scale = match dim {
            Dim::D2 => 70.0,
            Dim::D3 => 76.0,
            Dim::D4 => 62.0,
        };
        Ok(Self {
            seed,
            dim,
            frequency,
            hasher: LatticeHasher::new(seed),
            skew: (root - 1.0) / n,
            unskew: (1.0 - 1.0 / root) / n,
            scale,
        })
    }

    pub fn seed(&self) -> Seed {
        self.seed
    }

    #[inline]
    fn grad(dim: Dim, hash: u8, d: &[f64]) -> f64 {
        match dim {
            Dim::D2 => {
                let g = GRAD3[hash as usize % 12];
                g[0] * d[0] + g[1] * d[1]
            }
            Dim::D3 => {
                let g = GRAD3[hash as usize % 12];
                g[0] * d[0] + g[1] * d[1] + g[2] * d[2]
            }
            Dim::D4 => {
                let g = GRAD4[(hash & 31) as usize];
                g[0] * d[0] + g[1] * d[1] + g[2] * d[2] + g[3] * d[3]
            }
        }
    }

    // Raw simplex noise at an already frequency-scaled point
    fn noise(&self, p: &[f64]) -> f64 {
        let n = p.len();

        // Skew input space to find the hypercube cell
        let s = p.iter().sum::<f64>() * self.skew;
        let mut cell = [0i64; 4];
        for i in 0..n {
            cell[i] = (p[i] + s).floor() as i64;
        }

        // Unskew back to get the offset from the cell origin
        let t = cell[..n].iter().fold(0i64, |acc, &c| acc.wrapping_add(c)) as f64 * self.unskew;
        let mut d0 = [0.0; 4];
        for i in 0..n {
            d0[i] = p[i] - (cell[i] as f64 - t);
        }

        // Rank the axes by offset; the k-th corner steps along the k largest
        let mut rank = [0usize; 4];
        for i in 0..n {
            for j in (i + 1)..n {
                if d0[i] > d0[j] {
                    rank[i] += 1;
                } else {
                    rank[j] += 1;
                }
            }
        }

        let mut total = 0.0;
        for k in 0..=n {
            let mut lattice = [0i64; 4];
            let mut d = [0.0; 4];
            for i in 0..n {
                let step = (rank[i] + k >= n) as i64;
                lattice[i] = cell[i].wrapping_add(step);
                d[i] = d0[i] - step as f64 + k as f64 * self.unskew;
            }
            let falloff = RADIUS_SQ - d[..n].iter().map(|v| v * v).sum::<f64>();
            if falloff > 0.0 {
                let f2 = falloff * falloff;
                let h = self.hasher.perm_hash(&lattice[..n]);
                total += f2 * f2 * Self::grad(self.dim, h, &d[..n]);
            }
        }
        total
    }
}

impl NoiseNode for Simplex {
    fn sample(&self, p: &Coord, _ctx: &mut EvalContext) -> f64 {
        let scaled = p.map_components(|_, v| v * self.frequency);
        (self.noise(scaled.as_slice()) * self.scale).clamp(-1.0, 1.0)
    }

    fn dim(&self) -> Dim {
        self.dim
    }

    fn range(&self) -> OutputRange {
        OutputRange::UNIT
    }
}

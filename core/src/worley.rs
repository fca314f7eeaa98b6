use serde::{Deserialize, Serialize};

use crate::error::{Result, invalid};
use crate::utils::{LatticeHasher, check_frequency, unit_f64};
use crate::{Coord, Dim, EvalContext, NoiseNode, OutputRange, Seed};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DistanceMetric {
    #[default]
    Euclidean,
    EuclideanSquared,
    Manhattan,
    Chebyshev,
}

impl DistanceMetric {
    #[inline]
    pub fn distance(self, d: &[f64]) -> f64 {
        match self {
            DistanceMetric::Euclidean => d.iter().map(|v| v * v).sum::<f64>().sqrt(),
            DistanceMetric::EuclideanSquared => d.iter().map(|v| v * v).sum(),
            DistanceMetric::Manhattan => d.iter().map(|v| v.abs()).sum(),
            DistanceMetric::Chebyshev => d.iter().fold(0.0, |m, v| m.max(v.abs())),
        }
    }
}

// Which combination of the nearest feature distances is returned
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorleyOutput {
    #[default]
    F1,
    F2,
    F2MinusF1,
    F1PlusF2,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorleyParams {
    pub frequency: f64,
    pub metric: DistanceMetric,
    pub output: WorleyOutput,
    pub points_per_cell: u32, // 1..=4
    pub jitter: f64,          // 0 = points at cell centres, 1 = anywhere in the cell
}

impl Default for WorleyParams {
    fn default() -> Self {
        Self {
            frequency: 1.0,
            metric: DistanceMetric::Euclidean,
            output: WorleyOutput::F1,
            points_per_cell: 1,
            jitter: 1.0,
        }
    }
}

/// Cellular (Worley) noise.
///
/// Each lattice cell holds `points_per_cell` feature points jittered by the
/// seed; a query scans its own cell and all 3^N neighbours and reports the
/// selected combination of nearest distances. Output is a raw distance in
/// frequency-scaled space; the declared range is the worst case the 3^N
/// scan can produce for the metric and dimensionality.
///
/// Tie-break: among equally distant features the first one found (in cell
/// scan order, then point order) ranks first.
pub struct Worley {
    seed: Seed,
    dim: Dim,
    params: WorleyParams,
    hasher: LatticeHasher,
    range: OutputRange,
}

impl Worley {
    pub fn new(seed: Seed, dim: Dim, params: WorleyParams) -> Result<Self> {
        check_frequency(params.frequency)?;
        if !(1..=4).contains(&params.points_per_cell) {
            return Err(invalid(format!(
                "worley points_per_cell must be in 1..=4, got {}",
                params.points_per_cell
            )));
        }
        if !(0.0..=1.0).contains(&params.jitter) {
            return Err(invalid(format!(
                "worley jitter must be in [0, 1], got {}",
                params.jitter
            )));
        }

        // Own cell's point is less than 1 away per axis; a second point
        // exists in the adjacent cell less than 2 away on one axis.
        let n = dim.count();
        let f1_max = params.metric.distance(&[1.0; 4][..n]);
        let mut gaps = [1.0; 4];
        gaps[0] = 2.0;
        let f2_max = params.metric.distance(&gaps[..n]);
        let max = match params.output {
            WorleyOutput::F1 => f1_max,
            WorleyOutput::F2 | WorleyOutput::F2MinusF1 => f2_max,
            WorleyOutput::F1PlusF2 => f1_max + f2_max,
        };

        Ok(Self {
            seed,
            dim,
            params,
            hasher: LatticeHasher::new(seed),
            range: OutputRange { min: 0.0, max },
        })
    }

    pub fn seed(&self) -> Seed {
        self.seed
    }

    // Two smallest feature distances around an already frequency-scaled point
    fn nearest_two(&self, p: &[f64]) -> (f64, f64) {
        let n = p.len();
        let mut base = [0i64; 4];
        let mut frac = [0.0; 4];
        for i in 0..n {
            let f = p[i].floor();
            base[i] = f as i64;
            frac[i] = p[i] - f;
        }

        let mut f1 = f64::INFINITY;
        let mut f2 = f64::INFINITY;
        let neighbours = 3usize.pow(n as u32);
        for idx in 0..neighbours {
            // decode idx as base-3 digits -> offsets in {-1, 0, 1}
            let mut cell = [0i64; 4];
            let mut step = [0i64; 4];
            let mut rest = idx;
            for i in 0..n {
                step[i] = (rest % 3) as i64 - 1;
                cell[i] = base[i].wrapping_add(step[i]);
                rest /= 3;
            }

            for k in 0..self.params.points_per_cell as u64 {
                let mut delta = [0.0; 4];
                for i in 0..n {
                    let u = unit_f64(self.hasher.hash(&cell[..n], k * 4 + i as u64));
                    // feature position relative to the base cell origin
                    let feature = step[i] as f64 + 0.5 + self.params.jitter * (u - 0.5);
                    delta[i] = feature - frac[i];
                }
                let d = self.params.metric.distance(&delta[..n]);
                if d < f1 {
                    f2 = f1;
                    f1 = d;
                } else if d < f2 {
                    f2 = d;
                }
            }
        }
        (f1, f2)
    }
}

impl NoiseNode for Worley {
    fn sample(&self, p: &Coord, _ctx: &mut EvalContext) -> f64 {
        let scaled = p.map_components(|_, v| v * self.params.frequency);
        let (f1, f2) = self.nearest_two(scaled.as_slice());
        let v = match self.params.output {
            WorleyOutput::F1 => f1,
            WorleyOutput::F2 => f2,
            WorleyOutput::F2MinusF1 => f2 - f1,
            WorleyOutput::F1PlusF2 => f1 + f2,
        };
        v.min(self.range.max)
    }

    fn dim(&self) -> Dim {
        self.dim
    }

    fn range(&self) -> OutputRange {
        self.range
    }
}

// Unary nodes that rewrite the coordinate before delegating to one child.
// A transformer's dimensionality comes from its parameters and must match
// its child's; mismatches are rejected when the node is built.
use serde::{Deserialize, Serialize};

use crate::error::{Result, check_dim, invalid};
use crate::{Coord, Dim, EvalContext, NodeRef, NoiseNode, OutputRange};

// Offsets at which the warp field is re-sampled for each axis, so the
// displacements along different axes are decorrelated. Axis 0 samples the
// warp field at the original coordinate.
const WARP_OFFSETS: [f64; 4] = [0.0, 5.2, 11.7, 17.3];

fn finite_vector(name: &str, v: &[f64]) -> Result<Dim> {
    let dim = Dim::from_count(v.len())?;
    if let Some(bad) = v.iter().find(|c| !c.is_finite()) {
        return Err(invalid(format!("{name} components must be finite, got {bad}")));
    }
    Ok(dim)
}

pub struct Translate {
    source: NodeRef,
    offset: [f64; 4],
}

impl Translate {
    pub fn new(source: NodeRef, offset: &[f64]) -> Result<Self> {
        let dim = finite_vector("translate offset", offset)?;
        check_dim(dim, source.dim())?;
        let mut o = [0.0; 4];
        o[..offset.len()].copy_from_slice(offset);
        Ok(Self { source, offset: o })
    }
}

impl NoiseNode for Translate {
    fn sample(&self, p: &Coord, ctx: &mut EvalContext) -> f64 {
        let moved = p.map_components(|i, v| v + self.offset[i]);
        self.source.sample(&moved, ctx)
    }

    fn dim(&self) -> Dim {
        self.source.dim()
    }

    fn range(&self) -> OutputRange {
        self.source.range()
    }
}

// Non-uniform per-axis scaling of the input domain
pub struct Scale {
    source: NodeRef,
    factors: [f64; 4],
}

impl Scale {
    pub fn new(source: NodeRef, factors: &[f64]) -> Result<Self> {
        let dim = finite_vector("scale factors", factors)?;
        check_dim(dim, source.dim())?;
        let mut f = [1.0; 4];
        f[..factors.len()].copy_from_slice(factors);
        Ok(Self { source, factors: f })
    }

    pub fn uniform(source: NodeRef, factor: f64) -> Result<Self> {
        let n = source.dim().count();
        Self::new(source, &[factor; 4][..n])
    }
}

impl NoiseNode for Scale {
    fn sample(&self, p: &Coord, ctx: &mut EvalContext) -> f64 {
        let scaled = p.map_components(|i, v| v * self.factors[i]);
        self.source.sample(&scaled, ctx)
    }

    fn dim(&self) -> Dim {
        self.source.dim()
    }

    fn range(&self) -> OutputRange {
        self.source.range()
    }
}

/// Fixed rotation of the input domain. Angles are in radians.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Rotation {
    // 2D, counter-clockwise in the xy plane
    Planar { angle: f64 },
    // 3D, right-handed about `axis` (normalised on construction)
    Axis { axis: [f64; 3], angle: f64 },
    // 4D, within the plane spanned by axes `a` and `b`
    Plane4 { a: usize, b: usize, angle: f64 },
}

impl Rotation {
    pub fn dim(&self) -> Dim {
        match self {
            Rotation::Planar { .. } => Dim::D2,
            Rotation::Axis { .. } => Dim::D3,
            Rotation::Plane4 { .. } => Dim::D4,
        }
    }

    // Row-major matrix; unused rows/columns stay identity
    fn matrix(&self) -> Result<[[f64; 4]; 4]> {
        let mut m = [[0.0; 4]; 4];
        for (i, row) in m.iter_mut().enumerate() {
            row[i] = 1.0;
        }
        match *self {
            Rotation::Planar { angle } => {
                let (s, c) = finite_angle(angle)?.sin_cos();
                m[0][0] = c;
                m[0][1] = -s;
                m[1][0] = s;
                m[1][1] = c;
            }
            Rotation::Axis { axis, angle } => {
                let (s, c) = finite_angle(angle)?.sin_cos();
                let len = (axis[0] * axis[0] + axis[1] * axis[1] + axis[2] * axis[2]).sqrt();
                if !(len.is_finite() && len > 0.0) {
                    return Err(invalid("rotation axis must be a non-zero finite vector"));
                }
                let k = [axis[0] / len, axis[1] / len, axis[2] / len];
                // Rodrigues: c*I + s*[k]x + (1 - c)*k*k^T
                let cross = [[0.0, -k[2], k[1]], [k[2], 0.0, -k[0]], [-k[1], k[0], 0.0]];
                for i in 0..3 {
                    for j in 0..3 {
                        let identity = if i == j { c } else { 0.0 };
                        m[i][j] = identity + s * cross[i][j] + (1.0 - c) * k[i] * k[j];
                    }
                }
            }
            Rotation::Plane4 { a, b, angle } => {
                if a >= 4 || b >= 4 || a == b {
                    return Err(invalid(format!(
                        "4D rotation plane needs two distinct axes in 0..4, got ({a}, {b})"
                    )));
                }
                let (s, c) = finite_angle(angle)?.sin_cos();
                m[a][a] = c;
                m[a][b] = -s;
                m[b][a] = s;
                m[b][b] = c;
            }
        }
        Ok(m)
    }
}

fn finite_angle(angle: f64) -> Result<f64> {
    if angle.is_finite() {
        Ok(angle)
    } else {
        Err(invalid(format!("rotation angle must be finite, got {angle}")))
    }
}

pub struct Rotate {
    source: NodeRef,
    matrix: [[f64; 4]; 4],
}

impl Rotate {
    pub fn new(source: NodeRef, rotation: Rotation) -> Result<Self> {
        check_dim(rotation.dim(), source.dim())?;
        let matrix = rotation.matrix()?;
        Ok(Self { source, matrix })
    }
}

impl NoiseNode for Rotate {
    fn sample(&self, p: &Coord, ctx: &mut EvalContext) -> f64 {
        let n = p.dim().count();
        let src = p.as_slice();
        let rotated = p.map_components(|i, _| {
            let row = &self.matrix[i];
            (0..n).map(|j| row[j] * src[j]).sum()
        });
        self.source.sample(&rotated, ctx)
    }

    fn dim(&self) -> Dim {
        self.source.dim()
    }

    fn range(&self) -> OutputRange {
        self.source.range()
    }
}

/// Domain warp: displaces the coordinate by a second noise field before
/// sampling the primary one.
///
/// Axis `i` moves by `strength * warp(p + o_i)` where `o_i` is a fixed
/// per-axis offset (`o_0` is zero, so axis 0 uses the warp field at the
/// original coordinate).
pub struct DomainWarp {
    source: NodeRef,
    warp: NodeRef,
    strength: f64,
}

impl DomainWarp {
    pub fn new(source: NodeRef, warp: NodeRef, strength: f64) -> Result<Self> {
        check_dim(source.dim(), warp.dim())?;
        if !strength.is_finite() {
            return Err(invalid(format!("warp strength must be finite, got {strength}")));
        }
        Ok(Self {
            source,
            warp,
            strength,
        })
    }
}

impl NoiseNode for DomainWarp {
    fn sample(&self, p: &Coord, ctx: &mut EvalContext) -> f64 {
        let mut displacement = [0.0; 4];
        for (axis, d) in displacement.iter_mut().enumerate().take(p.dim().count()) {
            let probe = p.map_components(|_, v| v + WARP_OFFSETS[axis]);
            *d = self.warp.sample(&probe, ctx) * self.strength;
        }
        let warped = p.map_components(|i, v| v + displacement[i]);
        self.source.sample(&warped, ctx)
    }

    fn dim(&self) -> Dim {
        self.source.dim()
    }

    fn range(&self) -> OutputRange {
        self.source.range()
    }
}

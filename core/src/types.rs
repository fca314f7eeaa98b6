use serde::{Deserialize, Serialize};

use crate::error::{NoiseError, Result};

// Root seed and every derived per-leaf seed
pub type Seed = u64;

// Number of coordinate components a node works with
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dim {
    D2,
    D3,
    D4,
}

impl Dim {
    pub fn count(self) -> usize {
        match self {
            Dim::D2 => 2,
            Dim::D3 => 3,
            Dim::D4 => 4,
        }
    }

    pub fn from_count(n: usize) -> Result<Self> {
        match n {
            2 => Ok(Dim::D2),
            3 => Ok(Dim::D3),
            4 => Ok(Dim::D4),
            _ => Err(NoiseError::InvalidParameter(format!(
                "dimensionality must be 2, 3 or 4, got {n}"
            ))),
        }
    }
}

impl std::fmt::Display for Dim {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}D", self.count())
    }
}

/// A point in 2, 3 or 4 dimensional noise space.
///
/// Components past `dim` are always zero, so two coordinates of the same
/// dimensionality compare (and hash) equal exactly when their used
/// components do.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Coord {
    c: [f64; 4],
    dim: Dim,
}

impl Coord {
    pub fn xy(x: f64, y: f64) -> Self {
        Self {
            c: [x, y, 0.0, 0.0],
            dim: Dim::D2,
        }
    }

    pub fn xyz(x: f64, y: f64, z: f64) -> Self {
        Self {
            c: [x, y, z, 0.0],
            dim: Dim::D3,
        }
    }

    pub fn xyzw(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self {
            c: [x, y, z, w],
            dim: Dim::D4,
        }
    }

    pub fn from_slice(v: &[f64]) -> Result<Self> {
        let dim = Dim::from_count(v.len())?;
        let mut c = [0.0; 4];
        c[..v.len()].copy_from_slice(v);
        Ok(Self { c, dim })
    }

    #[inline]
    pub fn dim(&self) -> Dim {
        self.dim
    }

    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.c[..self.dim.count()]
    }

    #[inline]
    pub fn get(&self, axis: usize) -> f64 {
        self.c[axis]
    }

    // New coordinate of the same dimensionality, `f(axis, value)` per used component
    #[inline]
    pub fn map_components(&self, mut f: impl FnMut(usize, f64) -> f64) -> Self {
        let mut out = *self;
        for i in 0..self.dim.count() {
            out.c[i] = f(i, self.c[i]);
        }
        out
    }

    // Bit pattern of the used components, for exact-match memo keys
    pub fn key_bits(&self) -> [u64; 4] {
        let mut bits = [0u64; 4];
        for (b, v) in bits.iter_mut().zip(self.as_slice()) {
            *b = v.to_bits();
        }
        bits
    }
}

/// Closed interval a node promises its output stays within.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct OutputRange {
    pub min: f64,
    pub max: f64,
}

impl OutputRange {
    pub const UNIT: OutputRange = OutputRange {
        min: -1.0,
        max: 1.0,
    };

    pub fn new(min: f64, max: f64) -> Result<Self> {
        if min.is_nan() || max.is_nan() || min > max {
            return Err(NoiseError::InvalidRange { min, max });
        }
        Ok(Self { min, max })
    }

    // Constructor for ranges produced by interval arithmetic on valid inputs
    pub(crate) fn ordered(a: f64, b: f64) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    #[inline]
    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    #[inline]
    pub fn midpoint(&self) -> f64 {
        0.5 * (self.min + self.max)
    }

    // Fails for zero-width (or non-finite) ranges that cannot be divided by
    pub fn require_span(&self) -> Result<()> {
        let span = self.span();
        if span > 0.0 && span.is_finite() {
            Ok(())
        } else {
            Err(NoiseError::InvalidRange {
                min: self.min,
                max: self.max,
            })
        }
    }

    pub fn contains(&self, v: f64, eps: f64) -> bool {
        v >= self.min - eps && v <= self.max + eps
    }

    pub fn add(&self, other: &OutputRange) -> OutputRange {
        OutputRange {
            min: self.min + other.min,
            max: self.max + other.max,
        }
    }

    pub fn mul(&self, other: &OutputRange) -> OutputRange {
        let products = [
            self.min * other.min,
            self.min * other.max,
            self.max * other.min,
            self.max * other.max,
        ];
        let mut out = OutputRange {
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        };
        for p in products {
            // 0 * inf is NaN; the true bound for that corner is 0
            let p = if p.is_nan() { 0.0 } else { p };
            out.min = out.min.min(p);
            out.max = out.max.max(p);
        }
        out
    }

    pub fn union(&self, other: &OutputRange) -> OutputRange {
        OutputRange {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    // Range of the pointwise minimum of two sources
    pub fn lower_of(&self, other: &OutputRange) -> OutputRange {
        OutputRange {
            min: self.min.min(other.min),
            max: self.max.min(other.max),
        }
    }

    // Range of the pointwise maximum of two sources
    pub fn upper_of(&self, other: &OutputRange) -> OutputRange {
        OutputRange {
            min: self.min.max(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn scale_bias(&self, scale: f64, bias: f64) -> OutputRange {
        OutputRange::ordered(self.min * scale + bias, self.max * scale + bias)
    }
}

impl std::fmt::Display for OutputRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coord_from_slice_rejects_bad_lengths() {
        assert!(Coord::from_slice(&[1.0]).is_err());
        assert!(Coord::from_slice(&[1.0; 5]).is_err());
        let c = Coord::from_slice(&[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(c, Coord::xyz(1.0, 2.0, 3.0));
        assert_eq!(c.as_slice(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn range_rejects_inverted() {
        assert!(matches!(
            OutputRange::new(1.0, -1.0),
            Err(NoiseError::InvalidRange { .. })
        ));
        let zero = OutputRange::new(2.0, 2.0).unwrap();
        assert!(zero.require_span().is_err());
        assert!(OutputRange::UNIT.require_span().is_ok());
    }

    #[test]
    fn range_interval_arithmetic() {
        let a = OutputRange::new(-1.0, 2.0).unwrap();
        let b = OutputRange::new(3.0, 4.0).unwrap();
        assert_eq!(a.add(&b), OutputRange::new(2.0, 6.0).unwrap());
        assert_eq!(a.mul(&b), OutputRange::new(-4.0, 8.0).unwrap());
        assert_eq!(a.lower_of(&b), OutputRange::new(-1.0, 2.0).unwrap());
        assert_eq!(a.upper_of(&b), OutputRange::new(3.0, 4.0).unwrap());
        assert_eq!(a.union(&b), OutputRange::new(-1.0, 4.0).unwrap());
        assert_eq!(a.scale_bias(-2.0, 1.0), OutputRange::new(-3.0, 3.0).unwrap());
    }
}

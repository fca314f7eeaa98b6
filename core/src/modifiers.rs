// Unary nodes that post-process one child's output.
// Every modifier derives the range it declares from its child's.
use serde::{Deserialize, Serialize};

use crate::error::{Result, invalid};
use crate::{Coord, Dim, EvalContext, NodeRef, NoiseNode, OutputRange};

fn require_finite(name: &str, v: f64) -> Result<()> {
    if v.is_finite() {
        Ok(())
    } else {
        Err(invalid(format!("{name} must be finite, got {v}")))
    }
}

pub struct Clamp {
    source: NodeRef,
    lo: f64,
    hi: f64,
}

impl Clamp {
    pub fn new(source: NodeRef, lo: f64, hi: f64) -> Result<Self> {
        OutputRange::new(lo, hi)?;
        Ok(Self { source, lo, hi })
    }
}

impl NoiseNode for Clamp {
    fn sample(&self, p: &Coord, ctx: &mut EvalContext) -> f64 {
        self.source.sample(p, ctx).clamp(self.lo, self.hi)
    }

    fn dim(&self) -> Dim {
        self.source.dim()
    }

    fn range(&self) -> OutputRange {
        let r = self.source.range();
        OutputRange {
            min: r.min.clamp(self.lo, self.hi),
            max: r.max.clamp(self.lo, self.hi),
        }
    }
}

pub struct Abs {
    source: NodeRef,
}

impl Abs {
    pub fn new(source: NodeRef) -> Self {
        Self { source }
    }
}

impl NoiseNode for Abs {
    fn sample(&self, p: &Coord, ctx: &mut EvalContext) -> f64 {
        self.source.sample(p, ctx).abs()
    }

    fn dim(&self) -> Dim {
        self.source.dim()
    }

    fn range(&self) -> OutputRange {
        let r = self.source.range();
        if r.min >= 0.0 {
            r
        } else if r.max <= 0.0 {
            OutputRange {
                min: -r.max,
                max: -r.min,
            }
        } else {
            OutputRange {
                min: 0.0,
                max: r.max.max(-r.min),
            }
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum InvertMode {
    // v -> -v
    #[default]
    Negate,
    // reflect about the child's declared range midpoint, keeping the range
    AboutMidpoint,
    // reflect about a fixed pivot
    About(f64),
}

pub struct Invert {
    source: NodeRef,
    pivot: f64,
}

impl Invert {
    pub fn new(source: NodeRef, mode: InvertMode) -> Result<Self> {
        let pivot = match mode {
            InvertMode::Negate => 0.0,
            InvertMode::AboutMidpoint => source.range().midpoint(),
            InvertMode::About(p) => {
                require_finite("invert pivot", p)?;
                p
            }
        };
        Ok(Self { source, pivot })
    }
}

impl NoiseNode for Invert {
    fn sample(&self, p: &Coord, ctx: &mut EvalContext) -> f64 {
        2.0 * self.pivot - self.source.sample(p, ctx)
    }

    fn dim(&self) -> Dim {
        self.source.dim()
    }

    fn range(&self) -> OutputRange {
        let r = self.source.range();
        OutputRange::ordered(2.0 * self.pivot - r.max, 2.0 * self.pivot - r.min)
    }
}

// Sign-preserving power curve: sign(v) * |v|^exponent
pub struct Power {
    source: NodeRef,
    exponent: f64,
}

impl Power {
    pub fn new(source: NodeRef, exponent: f64) -> Result<Self> {
        if !(exponent.is_finite() && exponent > 0.0) {
            return Err(invalid(format!(
                "power exponent must be finite and positive, got {exponent}"
            )));
        }
        Ok(Self { source, exponent })
    }

    #[inline]
    fn curve(&self, v: f64) -> f64 {
        v.signum() * v.abs().powf(self.exponent)
    }
}

impl NoiseNode for Power {
    fn sample(&self, p: &Coord, ctx: &mut EvalContext) -> f64 {
        let v = self.source.sample(p, ctx);
        if v == 0.0 { 0.0 } else { self.curve(v) }
    }

    fn dim(&self) -> Dim {
        self.source.dim()
    }

    fn range(&self) -> OutputRange {
        // the curve is monotonically increasing, so endpoints map to endpoints
        let r = self.source.range();
        let end = |v: f64| if v == 0.0 { 0.0 } else { self.curve(v) };
        OutputRange {
            min: end(r.min),
            max: end(r.max),
        }
    }
}

/// Linearly maps the child's declared range onto `target`.
///
/// Both spans must be non-zero: a degenerate range would divide by zero, which
/// is a configuration error rather than a NaN at query time.
pub struct Remap {
    source: NodeRef,
    from: OutputRange,
    to: OutputRange,
    factor: f64,
}

impl Remap {
    pub fn new(source: NodeRef, target: OutputRange) -> Result<Self> {
        let from = source.range();
        from.require_span()?;
        target.require_span()?;
        Ok(Self {
            source,
            from,
            to: target,
            factor: target.span() / from.span(),
        })
    }
}

impl NoiseNode for Remap {
    fn sample(&self, p: &Coord, ctx: &mut EvalContext) -> f64 {
        let v = self.source.sample(p, ctx);
        (self.to.min + (v - self.from.min) * self.factor).clamp(self.to.min, self.to.max)
    }

    fn dim(&self) -> Dim {
        self.source.dim()
    }

    fn range(&self) -> OutputRange {
        self.to
    }
}

// Snaps the output to the nearest of `steps` evenly spaced levels spanning
// the child's declared range (both ends included).
pub struct Terrace {
    source: NodeRef,
    from: OutputRange,
    steps: u32,
}

impl Terrace {
    pub fn new(source: NodeRef, steps: u32) -> Result<Self> {
        if steps < 2 {
            return Err(invalid(format!("terrace needs at least 2 steps, got {steps}")));
        }
        let from = source.range();
        from.require_span()?;
        Ok(Self {
            source,
            from,
            steps,
        })
    }
}

impl NoiseNode for Terrace {
    fn sample(&self, p: &Coord, ctx: &mut EvalContext) -> f64 {
        let v = self.source.sample(p, ctx);
        let last = (self.steps - 1) as f64;
        let level = ((v - self.from.min) / self.from.span() * last)
            .round()
            .clamp(0.0, last);
        self.from.min + level * self.from.span() / last
    }

    fn dim(&self) -> Dim {
        self.source.dim()
    }

    fn range(&self) -> OutputRange {
        self.from
    }
}

// v * scale + bias; amplitude and offset control
pub struct ScaleBias {
    source: NodeRef,
    scale: f64,
    bias: f64,
}

impl ScaleBias {
    pub fn new(source: NodeRef, scale: f64, bias: f64) -> Result<Self> {
        require_finite("scale", scale)?;
        require_finite("bias", bias)?;
        Ok(Self {
            source,
            scale,
            bias,
        })
    }
}

impl NoiseNode for ScaleBias {
    fn sample(&self, p: &Coord, ctx: &mut EvalContext) -> f64 {
        self.source.sample(p, ctx) * self.scale + self.bias
    }

    fn dim(&self) -> Dim {
        self.source.dim()
    }

    fn range(&self) -> OutputRange {
        self.source.range().scale_bias(self.scale, self.bias)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{Constant, Fade, NoiseError, Perlin};

    fn perlin() -> NodeRef {
        Arc::new(Perlin::new(42, Dim::D2, 0.13, Fade::Quintic).unwrap())
    }

    fn samples(node: &dyn NoiseNode) -> Vec<f64> {
        let mut ctx = EvalContext::new();
        (0..500)
            .map(|i| node.sample(&Coord::xy(i as f64 * 0.77, i as f64 * -0.41), &mut ctx))
            .collect()
    }

    fn assert_contained(node: &dyn NoiseNode) {
        let r = node.range();
        for v in samples(node) {
            assert!(r.contains(v, 1e-12), "{v} outside {r}");
        }
    }

    #[test]
    fn clamp_limits_output_and_range() {
        let c = Clamp::new(perlin(), -0.2, 0.3).unwrap();
        assert_eq!(c.range(), OutputRange::new(-0.2, 0.3).unwrap());
        assert_contained(&c);
        assert!(matches!(
            Clamp::new(perlin(), 1.0, 0.0),
            Err(NoiseError::InvalidRange { .. })
        ));
    }

    #[test]
    fn abs_range() {
        let a = Abs::new(perlin());
        assert_eq!(a.range(), OutputRange::new(0.0, 1.0).unwrap());
        assert_contained(&a);
    }

    #[test]
    fn invert_modes() {
        let src = perlin();
        let neg = Invert::new(src.clone(), InvertMode::Negate).unwrap();
        let shifted: NodeRef = Arc::new(ScaleBias::new(src.clone(), 1.0, 2.0).unwrap());
        let mid = Invert::new(shifted.clone(), InvertMode::AboutMidpoint).unwrap();
        assert_eq!(mid.range(), shifted.range());
        let base = samples(src.as_ref());
        for (b, n) in base.iter().zip(samples(&neg)) {
            assert_eq!(n, -b);
        }
        for (b, m) in base.iter().zip(samples(&mid)) {
            // 2 * 2.0 - (b + 2.0)
            assert!((m - (2.0 - b)).abs() < 1e-12);
        }
        assert_contained(&mid);
    }

    #[test]
    fn power_preserves_sign() {
        let p = Power::new(perlin(), 2.0).unwrap();
        let base = samples(perlin().as_ref());
        for (b, v) in base.iter().zip(samples(&p)) {
            assert!(*b == 0.0 || b.signum() == v.signum());
            assert!((v.abs() - b * b).abs() < 1e-12);
        }
        assert_contained(&p);
        assert!(Power::new(perlin(), 0.0).is_err());
    }

    #[test]
    fn remap_identity() {
        let src = perlin();
        let r = Remap::new(src.clone(), src.range()).unwrap();
        for (a, b) in samples(src.as_ref()).iter().zip(samples(&r)) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn remap_to_unit_interval() {
        let r = Remap::new(perlin(), OutputRange::new(0.0, 1.0).unwrap()).unwrap();
        assert_eq!(r.range(), OutputRange::new(0.0, 1.0).unwrap());
        assert_contained(&r);
    }

    #[test]
    fn remap_rejects_degenerate_ranges() {
        let flat: NodeRef = Arc::new(Constant::new(Dim::D2, 0.5).unwrap());
        assert!(matches!(
            Remap::new(flat, OutputRange::UNIT),
            Err(NoiseError::InvalidRange { .. })
        ));
        let zero = OutputRange { min: 3.0, max: 3.0 };
        assert!(matches!(
            Remap::new(perlin(), zero),
            Err(NoiseError::InvalidRange { .. })
        ));
        let inverted = OutputRange { min: 1.0, max: 0.0 };
        assert!(Remap::new(perlin(), inverted).is_err());
    }

    #[test]
    fn terrace_produces_discrete_levels() {
        let t = Terrace::new(perlin(), 5).unwrap();
        let levels = [-1.0, -0.5, 0.0, 0.5, 1.0];
        for v in samples(&t) {
            assert!(levels.iter().any(|l| (l - v).abs() < 1e-12), "{v}");
        }
        assert!(Terrace::new(perlin(), 1).is_err());
    }

    #[test]
    fn scale_bias_range_with_negative_scale() {
        let s = ScaleBias::new(perlin(), -0.5, 1.0).unwrap();
        assert_eq!(s.range(), OutputRange::new(0.5, 1.5).unwrap());
        assert_contained(&s);
    }

    #[test]
    fn chained_modifiers_compose_ranges() {
        let abs: NodeRef = Arc::new(Abs::new(perlin()));
        let pow: NodeRef = Arc::new(Power::new(abs, 3.0).unwrap());
        let remap = Remap::new(pow, OutputRange::new(10.0, 20.0).unwrap()).unwrap();
        assert_eq!(remap.range(), OutputRange::new(10.0, 20.0).unwrap());
        assert_contained(&remap);
    }
}

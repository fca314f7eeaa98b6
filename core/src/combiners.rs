// N-ary nodes. All children of one combiner share its dimensionality.
use serde::{Deserialize, Serialize};

use crate::error::{Result, check_dim, invalid};
use crate::utils::lerp;
use crate::{Coord, Dim, EvalContext, NodeRef, NoiseNode, OutputRange};

const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

// Common dimensionality of a child list, or the first mismatch
fn shared_dim(children: &[NodeRef]) -> Result<Dim> {
    let first = children
        .first()
        .ok_or_else(|| invalid("combiner needs at least one child"))?
        .dim();
    for child in &children[1..] {
        check_dim(first, child.dim())?;
    }
    Ok(first)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombineOp {
    Add,
    Multiply,
    Min,
    Max,
}

impl CombineOp {
    #[inline]
    fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            CombineOp::Add => a + b,
            CombineOp::Multiply => a * b,
            CombineOp::Min => a.min(b),
            CombineOp::Max => a.max(b),
        }
    }

    fn range(self, a: &OutputRange, b: &OutputRange) -> OutputRange {
        match self {
            CombineOp::Add => a.add(b),
            CombineOp::Multiply => a.mul(b),
            CombineOp::Min => a.lower_of(b),
            CombineOp::Max => a.upper_of(b),
        }
    }
}

/// Folds two or more children left to right with one arithmetic operation.
pub struct Combine {
    op: CombineOp,
    children: Vec<NodeRef>,
    dim: Dim,
    range: OutputRange,
}

impl Combine {
    pub fn new(op: CombineOp, children: Vec<NodeRef>) -> Result<Self> {
        if children.len() < 2 {
            return Err(invalid(format!(
                "{op:?} needs at least 2 children, got {}",
                children.len()
            )));
        }
        let dim = shared_dim(&children)?;
        let range = children[1..]
            .iter()
            .fold(children[0].range(), |acc, c| op.range(&acc, &c.range()));
        Ok(Self {
            op,
            children,
            dim,
            range,
        })
    }
}

impl NoiseNode for Combine {
    fn sample(&self, p: &Coord, ctx: &mut EvalContext) -> f64 {
        let mut acc = self.children[0].sample(p, ctx);
        for child in &self.children[1..] {
            acc = self.op.apply(acc, child.sample(p, ctx));
        }
        acc
    }

    fn dim(&self) -> Dim {
        self.dim
    }

    fn range(&self) -> OutputRange {
        self.range
    }
}

/// Weighted sum of children. Weights are non-negative and sum to one, so the
/// output is a convex combination and the declared range is the union of the
/// children's.
pub struct Blend {
    children: Vec<NodeRef>,
    weights: Vec<f64>,
    dim: Dim,
    range: OutputRange,
}

impl Blend {
    pub fn new(children: Vec<NodeRef>, weights: Vec<f64>) -> Result<Self> {
        if children.len() != weights.len() {
            return Err(invalid(format!(
                "blend has {} children but {} weights",
                children.len(),
                weights.len()
            )));
        }
        let dim = shared_dim(&children)?;
        if let Some(w) = weights.iter().find(|w| !(w.is_finite() && **w >= 0.0)) {
            return Err(invalid(format!(
                "blend weights must be finite and non-negative, got {w}"
            )));
        }
        let sum: f64 = weights.iter().sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(invalid(format!("blend weights must sum to 1, got {sum}")));
        }
        let range = children[1..]
            .iter()
            .fold(children[0].range(), |acc, c| acc.union(&c.range()));
        Ok(Self {
            children,
            weights,
            dim,
            range,
        })
    }
}

impl NoiseNode for Blend {
    fn sample(&self, p: &Coord, ctx: &mut EvalContext) -> f64 {
        let mut total = 0.0;
        for (child, w) in self.children.iter().zip(&self.weights) {
            if *w != 0.0 {
                total += w * child.sample(p, ctx);
            }
        }
        total
    }

    fn dim(&self) -> Dim {
        self.dim
    }

    fn range(&self) -> OutputRange {
        self.range
    }
}

/// Picks `low` where `control < threshold` and `high` elsewhere.
///
/// With a positive `smoothing` the two are blended across a window of that
/// width centred on the threshold, linearly in the control value.
pub struct Select {
    control: NodeRef,
    low: NodeRef,
    high: NodeRef,
    threshold: f64,
    smoothing: f64,
}

impl Select {
    pub fn new(
        control: NodeRef,
        low: NodeRef,
        high: NodeRef,
        threshold: f64,
        smoothing: f64,
    ) -> Result<Self> {
        check_dim(control.dim(), low.dim())?;
        check_dim(control.dim(), high.dim())?;
        if !threshold.is_finite() {
            return Err(invalid(format!("select threshold must be finite, got {threshold}")));
        }
        if !(smoothing.is_finite() && smoothing >= 0.0) {
            return Err(invalid(format!(
                "select smoothing must be finite and non-negative, got {smoothing}"
            )));
        }
        Ok(Self {
            control,
            low,
            high,
            threshold,
            smoothing,
        })
    }
}

impl NoiseNode for Select {
    fn sample(&self, p: &Coord, ctx: &mut EvalContext) -> f64 {
        let c = self.control.sample(p, ctx);
        if self.smoothing > 0.0 {
            let half = 0.5 * self.smoothing;
            if c <= self.threshold - half {
                return self.low.sample(p, ctx);
            }
            if c >= self.threshold + half {
                return self.high.sample(p, ctx);
            }
            let t = (c - (self.threshold - half)) / self.smoothing;
            let lo = self.low.sample(p, ctx);
            let hi = self.high.sample(p, ctx);
            return lerp(lo, hi, t);
        }
        if c < self.threshold {
            self.low.sample(p, ctx)
        } else {
            self.high.sample(p, ctx)
        }
    }

    fn dim(&self) -> Dim {
        self.control.dim()
    }

    fn range(&self) -> OutputRange {
        self.low.range().union(&self.high.range())
    }
}

use crate::error::{Result, invalid};
use crate::{Coord, Dim, EvalContext, NoiseNode, OutputRange};

// Same value everywhere; handy as a bias or a blend/select input
pub struct Constant {
    dim: Dim,
    value: f64,
}

impl Constant {
    pub fn new(dim: Dim, value: f64) -> Result<Self> {
        if !value.is_finite() {
            return Err(invalid(format!("constant must be finite, got {value}")));
        }
        Ok(Self { dim, value })
    }
}

impl NoiseNode for Constant {
    fn sample(&self, _p: &Coord, _ctx: &mut EvalContext) -> f64 {
        self.value
    }

    fn dim(&self) -> Dim {
        self.dim
    }

    fn range(&self) -> OutputRange {
        OutputRange {
            min: self.value,
            max: self.value,
        }
    }
}

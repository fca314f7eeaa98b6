// core holds the node contract and every generator, modifier, transformer and combiner
use std::sync::Arc;

pub mod cache;
pub mod combiners;
pub mod constant;
pub mod error;
pub mod modifiers;
pub mod perlin;
pub mod simplex;
pub mod transformers;
pub mod types;
pub mod utils;
pub mod value;
pub mod white;
pub mod worley;

pub use cache::{Cached, EvalContext};
pub use combiners::{Blend, Combine, CombineOp, Select};
pub use constant::Constant;
pub use error::{NoiseError, Result, Violation};
pub use modifiers::{Abs, Clamp, Invert, InvertMode, Power, Remap, ScaleBias, Terrace};
pub use perlin::Perlin;
pub use simplex::Simplex;
pub use transformers::{DomainWarp, Rotate, Rotation, Scale, Translate};
pub use types::{Coord, Dim, OutputRange, Seed};
pub use utils::Fade;
pub use value::{Interpolation, ValueNoise};
pub use white::{GaussianWhite, White};
pub use worley::{DistanceMetric, Worley, WorleyOutput, WorleyParams};

/// A node of a noise graph: maps a coordinate to a scalar.
///
/// Implementations are immutable after construction. `sample` trusts that
/// `p` already has the node's dimensionality; the check happens once at the
/// root (see [`evaluate`]), not on every node.
pub trait NoiseNode: Send + Sync {
    /// Value at `p`. Shared subgraphs may memoise through `ctx`.
    fn sample(&self, p: &Coord, ctx: &mut EvalContext) -> f64;

    /// Dimensionality fixed at construction.
    fn dim(&self) -> Dim;

    /// Declared interval that every output of `sample` stays within, known
    /// without evaluating the node.
    fn range(&self) -> OutputRange;
}

// Shared handle; one node may be the child of several parents
pub type NodeRef = Arc<dyn NoiseNode>;

/// Evaluate `node` at `p` with a fresh per-query context.
pub fn evaluate(node: &dyn NoiseNode, p: &Coord) -> Result<f64> {
    error::check_dim(node.dim(), p.dim())?;
    let mut ctx = EvalContext::new();
    Ok(node.sample(p, &mut ctx))
}

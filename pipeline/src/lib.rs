// noisegraph: assemble noise node graphs into seeded, immutable pipelines
use log::info;
use serde::{Deserialize, Serialize};

mod assemble;
pub mod builder;
pub mod spec;

pub use assemble::leaf_seed;
pub use builder::PipelineBuilder;
pub use spec::{FractalKind, FractalSpec, GraphSpec, NodeId, NodeSpec};

pub use noisegraph_core::{
    CombineOp, Coord, Dim, DistanceMetric, EvalContext, Fade, Interpolation, InvertMode,
    NodeRef, NoiseError, NoiseNode, OutputRange, Result, Rotation, Seed, Violation,
    WorleyOutput, WorleyParams,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineOptions {
    // memoise nodes with several parents for the duration of one query
    pub cache_shared: bool,
}

/// Introspection record for one assembled node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeInfo {
    pub kind: &'static str,
    pub dim: Dim,
    pub range: OutputRange,
    // derived seed, for seeded generators
    pub seed: Option<Seed>,
    pub cached: bool,
}

/// An assembled graph bound to its root seed.
///
/// Read-only once built; evaluation allocates its own per-query state, so one
/// pipeline can be shared across threads and queried concurrently.
pub struct Pipeline {
    seed: Seed,
    dim: Dim,
    root: NodeRef,
    root_id: NodeId,
    nodes: Vec<Option<NodeInfo>>,
    options: PipelineOptions,
}

impl Pipeline {
    pub fn from_spec(spec: &GraphSpec, options: PipelineOptions) -> Result<Self> {
        let assembled = assemble::assemble(spec, options.cache_shared)?;
        let nodes: Vec<Option<NodeInfo>> = assembled
            .nodes
            .iter()
            .map(|slot| {
                slot.as_ref().map(|a| NodeInfo {
                    kind: a.kind,
                    dim: a.node.dim(),
                    range: a.node.range(),
                    seed: a.seed,
                    cached: a.shared,
                })
            })
            .collect();
        info!(
            "assembled {} pipeline: {} of {} node(s) in use, root {} range {}, cache_shared={}",
            spec.dim,
            nodes.iter().filter(|n| n.is_some()).count(),
            spec.nodes.len(),
            spec.root,
            assembled.root.range(),
            options.cache_shared
        );
        Ok(Self {
            seed: spec.seed,
            dim: spec.dim,
            root: assembled.root,
            root_id: spec.root,
            nodes,
            options,
        })
    }

    /// Sample the root at `p`. `p` must have the pipeline's dimensionality.
    pub fn evaluate(&self, p: &Coord) -> Result<f64> {
        noisegraph_core::evaluate(self.root.as_ref(), p)
    }

    /// Sample many points, reusing one context. The memo is cleared between
    /// points, so results match calling [`Pipeline::evaluate`] per point.
    pub fn evaluate_many(&self, points: &[Coord]) -> Result<Vec<f64>> {
        let mut ctx = EvalContext::new();
        let mut out = Vec::with_capacity(points.len());
        for p in points {
            if p.dim() != self.dim {
                return Err(NoiseError::DimensionMismatch {
                    expected: self.dim,
                    found: p.dim(),
                });
            }
            ctx.clear_memo();
            out.push(self.root.sample(p, &mut ctx));
        }
        Ok(out)
    }

    pub fn seed(&self) -> Seed {
        self.seed
    }

    pub fn dim(&self) -> Dim {
        self.dim
    }

    pub fn range(&self) -> OutputRange {
        self.root.range()
    }

    pub fn root(&self) -> NodeId {
        self.root_id
    }

    pub fn options(&self) -> PipelineOptions {
        self.options
    }

    // None for ids outside the graph or nodes unreachable from the root
    pub fn node_info(&self, id: NodeId) -> Option<NodeInfo> {
        self.nodes.get(id.0).copied().flatten()
    }

    // The assembled root, for embedding this pipeline in another graph
    pub fn root_node(&self) -> NodeRef {
        self.root.clone()
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("seed", &self.seed)
            .field("dim", &self.dim)
            .field("root", &self.root_id)
            .field("range", &self.root.range())
            .field("options", &self.options)
            .finish()
    }
}

use noisegraph_core::{CombineOp, Dim, Fade, NoiseError, Result, Seed, WorleyParams};

use crate::spec::{FractalKind, FractalSpec, GraphSpec, NodeId, NodeSpec};
use crate::{Pipeline, PipelineOptions};

/// Incrementally wires a graph description. Every call appends one node and
/// returns its id; children have to exist before the nodes using them.
///
/// Nothing is validated until [`PipelineBuilder::build`], which reports every
/// problem in the graph at once.
#[derive(Clone, Debug)]
pub struct PipelineBuilder {
    seed: Seed,
    dim: Dim,
    options: PipelineOptions,
    nodes: Vec<NodeSpec>,
}

impl PipelineBuilder {
    pub fn new(seed: Seed, dim: Dim) -> Self {
        Self {
            seed,
            dim,
            options: PipelineOptions::default(),
            nodes: Vec::new(),
        }
    }

    pub fn with_options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn node(&mut self, spec: NodeSpec) -> NodeId {
        self.nodes.push(spec);
        NodeId(self.nodes.len() - 1)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn perlin(&mut self, frequency: f64) -> NodeId {
        self.node(NodeSpec::Perlin {
            frequency,
            fade: Fade::Quintic,
            salt: None,
        })
    }

    pub fn simplex(&mut self, frequency: f64) -> NodeId {
        self.node(NodeSpec::Simplex {
            frequency,
            salt: None,
        })
    }

    pub fn worley(&mut self, params: WorleyParams) -> NodeId {
        self.node(NodeSpec::Worley { params, salt: None })
    }

    pub fn constant(&mut self, value: f64) -> NodeId {
        self.node(NodeSpec::Constant { value })
    }

    pub fn scale_bias(&mut self, source: NodeId, scale: f64, bias: f64) -> NodeId {
        self.node(NodeSpec::ScaleBias {
            source,
            scale,
            bias,
        })
    }

    pub fn combine(&mut self, op: CombineOp, sources: &[NodeId]) -> NodeId {
        self.node(NodeSpec::Combine {
            op,
            sources: sources.to_vec(),
        })
    }

    pub fn domain_warp(&mut self, source: NodeId, warp: NodeId, strength: f64) -> NodeId {
        self.node(NodeSpec::DomainWarp {
            source,
            warp,
            strength,
        })
    }

    /// Octave layering of a seeded generator template.
    ///
    /// Octave `i` runs at `lacunarity^i` times the template frequency with
    /// amplitude `gain^i / sum(gain^j)`, so the layered output keeps the
    /// template's unit range. With a base salt (from `spec` or, failing that,
    /// the template) octave `i` is salted `base + i`.
    pub fn fractal(&mut self, spec: FractalSpec, template: NodeSpec) -> Result<NodeId> {
        if spec.octaves == 0 || spec.octaves > 32 {
            return Err(NoiseError::InvalidParameter(format!(
                "fractal octaves must be in 1..=32, got {}",
                spec.octaves
            )));
        }
        for (name, v) in [("lacunarity", spec.lacunarity), ("gain", spec.gain)] {
            if !(v.is_finite() && v > 0.0) {
                return Err(NoiseError::InvalidParameter(format!(
                    "fractal {name} must be finite and positive, got {v}"
                )));
            }
        }
        let Some(template_salt) = template.salt() else {
            return Err(NoiseError::InvalidParameter(format!(
                "fractal template must be a seeded generator, got {}",
                template.kind()
            )));
        };
        let base_salt = spec.base_salt.or(template_salt);

        let total: f64 = (0..spec.octaves).map(|j| spec.gain.powi(j as i32)).sum();
        let mut layers = Vec::with_capacity(spec.octaves as usize);
        let mut frequency_factor = 1.0;
        for i in 0..spec.octaves {
            let salt = base_salt.map(|b| b.wrapping_add(u64::from(i)));
            let octave = template
                .octave(frequency_factor, salt)
                .ok_or_else(|| NoiseError::InvalidParameter("fractal template".into()))?;
            let mut layer = self.node(octave);
            match spec.kind {
                FractalKind::Fbm => {}
                FractalKind::Turbulence => {
                    layer = self.node(NodeSpec::Abs { source: layer });
                }
                FractalKind::Ridged => {
                    let abs = self.node(NodeSpec::Abs { source: layer });
                    layer = self.scale_bias(abs, -1.0, 1.0);
                }
            }
            let amplitude = spec.gain.powi(i as i32) / total;
            layers.push(self.scale_bias(layer, amplitude, 0.0));
            frequency_factor *= spec.lacunarity;
        }

        if layers.len() == 1 {
            return Ok(layers[0]);
        }
        Ok(self.combine(CombineOp::Add, &layers))
    }

    pub fn spec(&self, root: NodeId) -> GraphSpec {
        GraphSpec {
            seed: self.seed,
            dim: self.dim,
            nodes: self.nodes.clone(),
            root,
        }
    }

    pub fn build(&self, root: NodeId) -> Result<Pipeline> {
        Pipeline::from_spec(&self.spec(root), self.options)
    }
}

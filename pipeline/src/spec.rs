// Serializable description of a noise graph: a flat node list wired by index.
use serde::{Deserialize, Serialize};

use noisegraph_core::{
    CombineOp, Dim, Fade, Interpolation, InvertMode, Rotation, Seed, WorleyParams,
};

/// Index of a node inside a [`GraphSpec`]. Children always have a smaller
/// index than every parent referencing them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

fn one() -> f64 {
    1.0
}

/// One node of a graph description. Generators take the graph's declared
/// dimensionality; an explicit `salt` pins their seed to
/// `mix(root_seed, salt)` instead of the structural path.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeSpec {
    // generators
    Perlin {
        #[serde(default = "one")]
        frequency: f64,
        #[serde(default)]
        fade: Fade,
        #[serde(default)]
        salt: Option<u64>,
    },
    Simplex {
        #[serde(default = "one")]
        frequency: f64,
        #[serde(default)]
        salt: Option<u64>,
    },
    Worley {
        #[serde(default)]
        params: WorleyParams,
        #[serde(default)]
        salt: Option<u64>,
    },
    Value {
        #[serde(default = "one")]
        frequency: f64,
        #[serde(default)]
        interpolation: Interpolation,
        #[serde(default)]
        salt: Option<u64>,
    },
    White {
        #[serde(default = "one")]
        frequency: f64,
        #[serde(default)]
        salt: Option<u64>,
    },
    GaussianWhite {
        #[serde(default = "one")]
        frequency: f64,
        #[serde(default)]
        salt: Option<u64>,
    },
    Constant {
        value: f64,
    },

    // modifiers
    Clamp {
        source: NodeId,
        lo: f64,
        hi: f64,
    },
    Abs {
        source: NodeId,
    },
    Invert {
        source: NodeId,
        #[serde(default)]
        mode: InvertMode,
    },
    Power {
        source: NodeId,
        exponent: f64,
    },
    Remap {
        source: NodeId,
        min: f64,
        max: f64,
    },
    Terrace {
        source: NodeId,
        steps: u32,
    },
    ScaleBias {
        source: NodeId,
        #[serde(default = "one")]
        scale: f64,
        #[serde(default)]
        bias: f64,
    },

    // transformers
    Translate {
        source: NodeId,
        offset: Vec<f64>,
    },
    Scale {
        source: NodeId,
        factors: Vec<f64>,
    },
    Rotate {
        source: NodeId,
        rotation: Rotation,
    },
    DomainWarp {
        source: NodeId,
        warp: NodeId,
        strength: f64,
    },

    // combiners
    Combine {
        op: CombineOp,
        sources: Vec<NodeId>,
    },
    Blend {
        sources: Vec<NodeId>,
        weights: Vec<f64>,
    },
    Select {
        control: NodeId,
        low: NodeId,
        high: NodeId,
        threshold: f64,
        #[serde(default)]
        smoothing: f64,
    },
}

impl NodeSpec {
    // Stable name used in logs and introspection
    pub fn kind(&self) -> &'static str {
        match self {
            NodeSpec::Perlin { .. } => "perlin",
            NodeSpec::Simplex { .. } => "simplex",
            NodeSpec::Worley { .. } => "worley",
            NodeSpec::Value { .. } => "value",
            NodeSpec::White { .. } => "white",
            NodeSpec::GaussianWhite { .. } => "gaussian_white",
            NodeSpec::Constant { .. } => "constant",
            NodeSpec::Clamp { .. } => "clamp",
            NodeSpec::Abs { .. } => "abs",
            NodeSpec::Invert { .. } => "invert",
            NodeSpec::Power { .. } => "power",
            NodeSpec::Remap { .. } => "remap",
            NodeSpec::Terrace { .. } => "terrace",
            NodeSpec::ScaleBias { .. } => "scale_bias",
            NodeSpec::Translate { .. } => "translate",
            NodeSpec::Scale { .. } => "scale",
            NodeSpec::Rotate { .. } => "rotate",
            NodeSpec::DomainWarp { .. } => "domain_warp",
            NodeSpec::Combine { .. } => "combine",
            NodeSpec::Blend { .. } => "blend",
            NodeSpec::Select { .. } => "select",
        }
    }

    /// Child references in slot order. The slot position is what structural
    /// seed paths are built from.
    pub fn children(&self) -> Vec<NodeId> {
        match self {
            NodeSpec::Perlin { .. }
            | NodeSpec::Simplex { .. }
            | NodeSpec::Worley { .. }
            | NodeSpec::Value { .. }
            | NodeSpec::White { .. }
            | NodeSpec::GaussianWhite { .. }
            | NodeSpec::Constant { .. } => Vec::new(),
            NodeSpec::Clamp { source, .. }
            | NodeSpec::Abs { source }
            | NodeSpec::Invert { source, .. }
            | NodeSpec::Power { source, .. }
            | NodeSpec::Remap { source, .. }
            | NodeSpec::Terrace { source, .. }
            | NodeSpec::ScaleBias { source, .. }
            | NodeSpec::Translate { source, .. }
            | NodeSpec::Scale { source, .. }
            | NodeSpec::Rotate { source, .. } => vec![*source],
            NodeSpec::DomainWarp { source, warp, .. } => vec![*source, *warp],
            NodeSpec::Combine { sources, .. } | NodeSpec::Blend { sources, .. } => sources.clone(),
            NodeSpec::Select {
                control, low, high, ..
            } => vec![*control, *low, *high],
        }
    }

    // Seeded generators; `Constant` has no randomness and takes no seed
    pub fn is_seeded(&self) -> bool {
        self.salt().is_some()
    }

    // `Some(salt)` for seeded generators, `None` for everything else
    pub(crate) fn salt(&self) -> Option<Option<u64>> {
        match self {
            NodeSpec::Perlin { salt, .. }
            | NodeSpec::Simplex { salt, .. }
            | NodeSpec::Worley { salt, .. }
            | NodeSpec::Value { salt, .. }
            | NodeSpec::White { salt, .. }
            | NodeSpec::GaussianWhite { salt, .. } => Some(*salt),
            _ => None,
        }
    }

    // Copy of a seeded generator with its frequency multiplied and salt replaced
    pub(crate) fn octave(&self, frequency_factor: f64, new_salt: Option<u64>) -> Option<NodeSpec> {
        let mut out = self.clone();
        match &mut out {
            NodeSpec::Perlin {
                frequency, salt, ..
            }
            | NodeSpec::Simplex { frequency, salt }
            | NodeSpec::Value {
                frequency, salt, ..
            }
            | NodeSpec::White { frequency, salt }
            | NodeSpec::GaussianWhite { frequency, salt } => {
                *frequency *= frequency_factor;
                *salt = new_salt;
            }
            NodeSpec::Worley { params, salt } => {
                params.frequency *= frequency_factor;
                *salt = new_salt;
            }
            _ => return None,
        }
        Some(out)
    }
}

/// Complete graph description: what an external loader produces and what
/// [`crate::Pipeline::from_spec`] assembles.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphSpec {
    pub seed: Seed,
    pub dim: Dim,
    pub nodes: Vec<NodeSpec>,
    pub root: NodeId,
}

/// Octave shaping applied before layering.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FractalKind {
    // plain sum of octaves
    #[default]
    Fbm,
    // |n| per octave
    Turbulence,
    // 1 - |n| per octave
    Ridged,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FractalSpec {
    pub octaves: u32,
    pub lacunarity: f64,
    pub gain: f64,
    pub kind: FractalKind,
    // octave i gets salt `base_salt + i`; without it octaves are seeded by path
    pub base_salt: Option<u64>,
}

impl Default for FractalSpec {
    fn default() -> Self {
        Self {
            octaves: 4,
            lacunarity: 2.0,
            gain: 0.5,
            kind: FractalKind::Fbm,
            base_salt: None,
        }
    }
}

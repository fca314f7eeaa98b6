// GraphSpec -> live nodes. Every problem found along the way is collected
// so one failed assembly reports all of them.
use std::sync::Arc;

use log::{debug, warn};
use noisegraph_core::utils::{mix_seed, splitmix64};
use noisegraph_core::{
    Abs, Blend, Cached, Clamp, Combine, Constant, Dim, DomainWarp, GaussianWhite, Invert,
    NodeRef, NoiseError, OutputRange, Perlin, Power, Remap, Result, Rotate, Scale, ScaleBias,
    Seed, Select, Simplex, Terrace, Translate, ValueNoise, Violation, White, Worley,
};

use crate::spec::{GraphSpec, NodeSpec};

// Starting state for structural path hashes
const PATH_BASIS: u64 = 0x243F_6A88_85A3_08D3;

pub(crate) struct AssembledNode {
    pub kind: &'static str,
    pub node: NodeRef,
    pub seed: Option<Seed>,
    pub shared: bool,
}

pub(crate) struct Assembled {
    pub root: NodeRef,
    pub nodes: Vec<Option<AssembledNode>>,
}

/// Seed of a generator: pinned by its salt when it has one, otherwise taken
/// from the first structural path (child slot indices) leading to it from
/// the root.
pub fn leaf_seed(root_seed: Seed, salt: Option<u64>, path: &[u32]) -> Seed {
    match salt {
        Some(salt) => mix_seed(root_seed, salt),
        None => {
            let key = path
                .iter()
                .fold(PATH_BASIS, |h, &slot| splitmix64(h ^ u64::from(slot)));
            mix_seed(root_seed, key)
        }
    }
}

fn violation(node: usize, error: NoiseError) -> Violation {
    Violation {
        node: Some(node),
        error,
    }
}

// Preorder walk from the root; records the first path reaching each node
fn first_paths(spec: &GraphSpec, bad_refs: &[bool]) -> Vec<Option<Vec<u32>>> {
    let mut paths: Vec<Option<Vec<u32>>> = vec![None; spec.nodes.len()];
    let mut stack = vec![(spec.root, Vec::new())];
    while let Some((id, path)) = stack.pop() {
        if paths[id.0].is_some() {
            continue;
        }
        if !bad_refs[id.0] {
            let children = spec.nodes[id.0].children();
            for (slot, child) in children.iter().enumerate().rev() {
                let mut child_path = path.clone();
                child_path.push(slot as u32);
                stack.push((*child, child_path));
            }
        }
        paths[id.0] = Some(path);
    }
    paths
}

pub(crate) fn assemble(spec: &GraphSpec, cache_shared: bool) -> Result<Assembled> {
    let n = spec.nodes.len();
    let mut violations = Vec::new();

    // children must precede their parents, which also rules out cycles
    let mut bad_refs = vec![false; n];
    for (i, node) in spec.nodes.iter().enumerate() {
        for child in node.children() {
            if child.0 >= i {
                violations.push(violation(
                    i,
                    NoiseError::InvalidParameter(format!(
                        "{} input {child} must refer to an earlier node",
                        node.kind()
                    )),
                ));
                bad_refs[i] = true;
            }
        }
    }
    if spec.root.0 >= n {
        violations.push(Violation {
            node: None,
            error: NoiseError::InvalidParameter(format!(
                "root {} does not exist in a graph of {n} nodes",
                spec.root
            )),
        });
        warn!("graph validation failed with {} violation(s)", violations.len());
        return Err(NoiseError::GraphValidation(violations));
    }

    let paths = first_paths(spec, &bad_refs);
    let mut parents = vec![0usize; n];
    for (i, node) in spec.nodes.iter().enumerate() {
        if paths[i].is_some() && !bad_refs[i] {
            for child in node.children() {
                parents[child.0] += 1;
            }
        }
    }
    let skipped = paths.iter().filter(|p| p.is_none()).count();
    if skipped > 0 {
        debug!("{skipped} node(s) unreachable from root {}, not assembled", spec.root);
    }

    let mut built: Vec<Option<AssembledNode>> = (0..n).map(|_| None).collect();
    for (i, node_spec) in spec.nodes.iter().enumerate() {
        let Some(path) = &paths[i] else { continue };
        if bad_refs[i] {
            continue;
        }
        // an input that already failed was reported on its own
        let inputs: Option<Vec<NodeRef>> = node_spec
            .children()
            .iter()
            .map(|c| built[c.0].as_ref().map(|a| a.node.clone()))
            .collect();
        let Some(inputs) = inputs else {
            debug!("node #{i} ({}) skipped: an input failed", node_spec.kind());
            continue;
        };

        let seed = node_spec
            .salt()
            .map(|salt| leaf_seed(spec.seed, salt, path));
        match construct(node_spec, spec.dim, seed.unwrap_or(spec.seed), inputs) {
            Ok(node) => {
                let shared = cache_shared && parents[i] > 1;
                let node: NodeRef = if shared {
                    Arc::new(Cached::new(i as u32, node))
                } else {
                    node
                };
                debug!(
                    "node #{i} ({}) {} range {}{}{}",
                    node_spec.kind(),
                    node.dim(),
                    node.range(),
                    seed.map(|s| format!(" seed {s:#018x}")).unwrap_or_default(),
                    if shared { " cached" } else { "" }
                );
                built[i] = Some(AssembledNode {
                    kind: node_spec.kind(),
                    node,
                    seed,
                    shared,
                });
            }
            Err(error) => violations.push(violation(i, error)),
        }
    }

    let root = built[spec.root.0].as_ref().map(|a| a.node.clone());
    if let Some(root) = &root {
        if root.dim() != spec.dim {
            violations.push(Violation {
                node: None,
                error: NoiseError::DimensionMismatch {
                    expected: spec.dim,
                    found: root.dim(),
                },
            });
        }
    }

    match root {
        Some(root) if violations.is_empty() => Ok(Assembled { root, nodes: built }),
        _ => {
            warn!("graph validation failed with {} violation(s)", violations.len());
            Err(NoiseError::GraphValidation(violations))
        }
    }
}

fn construct(spec: &NodeSpec, dim: Dim, seed: Seed, inputs: Vec<NodeRef>) -> Result<NodeRef> {
    let input = |k: usize| inputs[k].clone();
    let node: NodeRef = match spec {
        NodeSpec::Perlin {
            frequency, fade, ..
        } => Arc::new(Perlin::new(seed, dim, *frequency, *fade)?),
        NodeSpec::Simplex { frequency, .. } => Arc::new(Simplex::new(seed, dim, *frequency)?),
        NodeSpec::Worley { params, .. } => Arc::new(Worley::new(seed, dim, *params)?),
        NodeSpec::Value {
            frequency,
            interpolation,
            ..
        } => Arc::new(ValueNoise::new(seed, dim, *frequency, *interpolation)?),
        NodeSpec::White { frequency, .. } => Arc::new(White::new(seed, dim, *frequency)?),
        NodeSpec::GaussianWhite { frequency, .. } => {
            Arc::new(GaussianWhite::new(seed, dim, *frequency)?)
        }
        NodeSpec::Constant { value } => Arc::new(Constant::new(dim, *value)?),
        NodeSpec::Clamp { lo, hi, .. } => Arc::new(Clamp::new(input(0), *lo, *hi)?),
        NodeSpec::Abs { .. } => Arc::new(Abs::new(input(0))),
        NodeSpec::Invert { mode, .. } => Arc::new(Invert::new(input(0), *mode)?),
        NodeSpec::Power { exponent, .. } => Arc::new(Power::new(input(0), *exponent)?),
        NodeSpec::Remap { min, max, .. } => {
            Arc::new(Remap::new(input(0), OutputRange::new(*min, *max)?)?)
        }
        NodeSpec::Terrace { steps, .. } => Arc::new(Terrace::new(input(0), *steps)?),
        NodeSpec::ScaleBias { scale, bias, .. } => {
            Arc::new(ScaleBias::new(input(0), *scale, *bias)?)
        }
        NodeSpec::Translate { offset, .. } => Arc::new(Translate::new(input(0), offset)?),
        NodeSpec::Scale { factors, .. } => Arc::new(Scale::new(input(0), factors)?),
        NodeSpec::Rotate { rotation, .. } => Arc::new(Rotate::new(input(0), *rotation)?),
        NodeSpec::DomainWarp { strength, .. } => {
            Arc::new(DomainWarp::new(input(0), input(1), *strength)?)
        }
        NodeSpec::Combine { op, .. } => Arc::new(Combine::new(*op, inputs)?),
        NodeSpec::Blend { weights, .. } => Arc::new(Blend::new(inputs, weights.clone())?),
        NodeSpec::Select {
            threshold,
            smoothing,
            ..
        } => Arc::new(Select::new(
            input(0),
            input(1),
            input(2),
            *threshold,
            *smoothing,
        )?),
    };
    Ok(node)
}

use noisegraph::{
    CombineOp, Coord, Dim, FractalSpec, NodeSpec, NoiseError, OutputRange, Pipeline,
    PipelineBuilder, PipelineOptions, WorleyParams,
};

fn coords_2d() -> Vec<Coord> {
    (0..2_000)
        .map(|i| {
            let t = i as f64;
            Coord::xy(t * 0.731 - 300.0, (t * 1.37).sin() * 250.0)
        })
        .collect()
}

// Leaves evaluated both inside a graph and as their own root need a salt,
// otherwise their structural seed paths differ.
fn salted_perlin(b: &mut PipelineBuilder, frequency: f64, salt: u64) -> noisegraph::NodeId {
    b.node(NodeSpec::Perlin {
        frequency,
        fade: Default::default(),
        salt: Some(salt),
    })
}

// add(perlin(freq 0.05), scale(0.5, worley(freq 0.1))), both leaves salted 1
fn scenario(seed: u64, options: PipelineOptions) -> Pipeline {
    let mut b = PipelineBuilder::new(seed, Dim::D2).with_options(options);
    let perlin = b.node(NodeSpec::Perlin {
        frequency: 0.05,
        fade: Default::default(),
        salt: Some(1),
    });
    let worley = b.node(NodeSpec::Worley {
        params: WorleyParams {
            frequency: 0.1,
            ..WorleyParams::default()
        },
        salt: Some(1),
    });
    let half = b.scale_bias(worley, 0.5, 0.0);
    let root = b.combine(CombineOp::Add, &[perlin, half]);
    b.build(root).expect("scenario graph is valid")
}

#[test]
fn test_end_to_end_scenario() {
    let pipeline = scenario(1, PipelineOptions::default());
    let p = Coord::xy(10.0, 20.0);
    let v = pipeline.evaluate(&p).unwrap();
    // perlin [-1, 1] + 0.5 * worley F1 [0, sqrt 2]
    let expected = OutputRange::new(-1.0, 1.0 + 0.5 * 2f64.sqrt()).unwrap();
    assert_eq!(pipeline.range(), expected);
    assert!(expected.contains(v, 0.0), "{v} outside {expected}");
    assert_eq!(pipeline.evaluate(&p).unwrap().to_bits(), v.to_bits());
}

#[test]
fn test_determinism_across_rebuilds() {
    let a = scenario(77, PipelineOptions::default());
    let b = scenario(77, PipelineOptions::default());
    for p in coords_2d() {
        assert_eq!(
            a.evaluate(&p).unwrap().to_bits(),
            b.evaluate(&p).unwrap().to_bits()
        );
    }
}

#[test]
fn test_seed_sensitivity() {
    let a = scenario(1, PipelineOptions::default());
    let b = scenario(2, PipelineOptions::default());
    let differing = coords_2d()
        .iter()
        .filter(|p| a.evaluate(p).unwrap() != b.evaluate(p).unwrap())
        .count();
    assert!(differing > 1_000, "only {differing} points differ");
}

#[test]
fn test_leaf_seeds_reproducible() {
    let build = || {
        let mut b = PipelineBuilder::new(1234, Dim::D3);
        let leaves: Vec<_> = (0..4).map(|i| b.perlin(0.1 * (i + 1) as f64)).collect();
        let root = b.combine(CombineOp::Max, &leaves);
        (b.build(root).unwrap(), leaves)
    };
    let (first, leaves) = build();
    let (second, _) = build();
    let seeds: Vec<_> = leaves
        .iter()
        .map(|l| first.node_info(*l).unwrap().seed.unwrap())
        .collect();
    for (l, s) in leaves.iter().zip(&seeds) {
        assert_eq!(second.node_info(*l).unwrap().seed, Some(*s));
    }
    let mut unique = seeds.clone();
    unique.sort_unstable();
    unique.dedup();
    assert_eq!(unique.len(), seeds.len());
}

#[test]
fn test_adding_unrelated_branch_keeps_existing_seeds() {
    let mut small = PipelineBuilder::new(9, Dim::D2);
    let a = small.perlin(0.1);
    let b = small.simplex(0.1);
    let root = small.combine(CombineOp::Add, &[a, b]);
    let small = small.build(root).unwrap();

    let mut large = PipelineBuilder::new(9, Dim::D2);
    let extra = large.worley(WorleyParams::default());
    let a2 = large.perlin(0.1);
    let b2 = large.simplex(0.1);
    let root2 = large.combine(CombineOp::Add, &[a2, b2, extra]);
    let large = large.build(root2).unwrap();

    assert_eq!(
        small.node_info(a).unwrap().seed,
        large.node_info(a2).unwrap().seed
    );
    assert_eq!(
        small.node_info(b).unwrap().seed,
        large.node_info(b2).unwrap().seed
    );
}

#[test]
fn test_range_containment_through_pipeline() {
    let mut b = PipelineBuilder::new(5, Dim::D2);
    let base = b.fractal(
        FractalSpec::default(),
        NodeSpec::Simplex {
            frequency: 0.02,
            salt: None,
        },
    );
    let base = base.unwrap();
    let warp = b.perlin(0.03);
    let warped = b.domain_warp(base, warp, 8.0);
    let terraced = b.node(NodeSpec::Terrace {
        source: warped,
        steps: 6,
    });
    let root = b.node(NodeSpec::Remap {
        source: terraced,
        min: 0.0,
        max: 255.0,
    });
    let pipeline = b.build(root).unwrap();
    assert_eq!(pipeline.range(), OutputRange::new(0.0, 255.0).unwrap());
    for p in coords_2d() {
        let v = pipeline.evaluate(&p).unwrap();
        assert!(pipeline.range().contains(v, 1e-9), "{v}");
    }
}

#[test]
fn test_generators_behind_scale_accept_huge_coordinates() {
    let leaves = [
        NodeSpec::Perlin {
            frequency: 1.0,
            fade: Default::default(),
            salt: None,
        },
        NodeSpec::Simplex {
            frequency: 1.0,
            salt: None,
        },
        NodeSpec::Worley {
            params: WorleyParams::default(),
            salt: None,
        },
        NodeSpec::Value {
            frequency: 1.0,
            interpolation: Default::default(),
            salt: None,
        },
    ];
    for leaf in leaves {
        let kind = leaf.kind();
        let mut b = PipelineBuilder::new(9, Dim::D2);
        let source = b.node(leaf);
        let root = b.node(NodeSpec::Scale {
            source,
            factors: vec![1e15, 1e15],
        });
        let pipeline = b.build(root).unwrap();
        // lands at about +-1e19, beyond the i64 lattice range
        for p in [Coord::xy(1e4, 0.5), Coord::xy(-1e4, 0.5), Coord::xy(-1e4, 1e4)] {
            let v = pipeline.evaluate(&p).unwrap();
            assert!(pipeline.range().contains(v, 1e-9), "{kind} at {p:?}: {v}");
        }
    }
}

#[test]
fn test_combinator_algebra() {
    let mut b = PipelineBuilder::new(3, Dim::D2);
    let x = salted_perlin(&mut b, 0.07, 1);
    let y = b.node(NodeSpec::Worley {
        params: WorleyParams {
            frequency: 0.05,
            ..WorleyParams::default()
        },
        salt: Some(2),
    });
    let ops = [
        CombineOp::Add,
        CombineOp::Multiply,
        CombineOp::Min,
        CombineOp::Max,
    ];
    let roots: Vec<_> = ops.iter().map(|op| b.combine(*op, &[x, y])).collect();
    let a = b.build(x).unwrap();
    let c = b.build(y).unwrap();
    for (op, root) in ops.iter().zip(roots) {
        let combined = b.build(root).unwrap();
        for p in coords_2d().iter().take(300) {
            let (va, vc) = (a.evaluate(p).unwrap(), c.evaluate(p).unwrap());
            let expected = match op {
                CombineOp::Add => va + vc,
                CombineOp::Multiply => va * vc,
                CombineOp::Min => va.min(vc),
                CombineOp::Max => va.max(vc),
            };
            assert_eq!(combined.evaluate(p).unwrap(), expected, "{op:?}");
        }
    }
}

#[test]
fn test_blend_unit_weight_equals_first_child() {
    let mut b = PipelineBuilder::new(3, Dim::D3);
    let x = salted_perlin(&mut b, 0.07, 1);
    let y = b.simplex(0.09);
    let root = b.node(NodeSpec::Blend {
        sources: vec![x, y],
        weights: vec![1.0, 0.0],
    });
    let blend = b.build(root).unwrap();
    let first = b.build(x).unwrap();
    for i in 0..500 {
        let p = Coord::xyz(i as f64 * 0.61, i as f64 * -0.23, 4.0);
        assert_eq!(blend.evaluate(&p).unwrap(), first.evaluate(&p).unwrap());
    }
}

#[test]
fn test_remap_to_own_range_is_identity() {
    let mut b = PipelineBuilder::new(8, Dim::D2);
    let x = b.node(NodeSpec::Simplex {
        frequency: 0.05,
        salt: Some(4),
    });
    let shifted = b.scale_bias(x, 3.0, 10.0);
    let root = b.node(NodeSpec::Remap {
        source: shifted,
        min: 7.0,
        max: 13.0,
    });
    let remapped = b.build(root).unwrap();
    let plain = b.build(shifted).unwrap();
    for p in coords_2d() {
        let (r, s) = (remapped.evaluate(&p).unwrap(), plain.evaluate(&p).unwrap());
        assert!((r - s).abs() < 1e-9);
    }
}

#[test]
fn test_blend_weights_summing_above_one_fail_validation() {
    let mut b = PipelineBuilder::new(3, Dim::D2);
    let x = b.perlin(0.07);
    let y = b.perlin(0.11);
    let root = b.node(NodeSpec::Blend {
        sources: vec![x, y],
        weights: vec![0.8, 0.5],
    });
    match b.build(root) {
        Err(NoiseError::GraphValidation(violations)) => {
            assert_eq!(violations.len(), 1);
            assert_eq!(violations[0].node, Some(root.index()));
            assert!(matches!(
                violations[0].error,
                NoiseError::InvalidParameter(_)
            ));
        }
        other => panic!("expected GraphValidation, got {other:?}"),
    }
}

#[test]
fn test_2d_child_under_3d_transformer_fails_at_build() {
    let mut b = PipelineBuilder::new(3, Dim::D2);
    let x = b.perlin(0.07);
    let root = b.node(NodeSpec::Translate {
        source: x,
        offset: vec![1.0, 2.0, 3.0],
    });
    let err = b.build(root).unwrap_err();
    let NoiseError::GraphValidation(violations) = err else {
        panic!("expected GraphValidation, got {err}");
    };
    assert_eq!(
        violations[0].error,
        NoiseError::DimensionMismatch {
            expected: Dim::D3,
            found: Dim::D2
        }
    );
}

#[test]
fn test_validation_aggregates_all_violations() {
    let mut b = PipelineBuilder::new(3, Dim::D2);
    let x = b.perlin(0.07);
    let flat = b.constant(2.0);
    let bad_remap = b.node(NodeSpec::Remap {
        source: flat,
        min: 0.0,
        max: 1.0,
    });
    let bad_rotate = b.node(NodeSpec::Rotate {
        source: x,
        rotation: noisegraph::Rotation::Axis {
            axis: [0.0, 1.0, 0.0],
            angle: 0.3,
        },
    });
    let bad_power = b.node(NodeSpec::Power {
        source: x,
        exponent: -2.0,
    });
    let root = b.combine(CombineOp::Add, &[bad_remap, bad_rotate, bad_power]);
    let Err(NoiseError::GraphValidation(violations)) = b.build(root) else {
        panic!("graph should be rejected");
    };
    let nodes: Vec<_> = violations.iter().map(|v| v.node).collect();
    assert_eq!(
        nodes,
        vec![
            Some(bad_remap.index()),
            Some(bad_rotate.index()),
            Some(bad_power.index())
        ]
    );
    assert!(matches!(
        violations[0].error,
        NoiseError::InvalidRange { .. }
    ));
    let message = NoiseError::GraphValidation(violations).to_string();
    assert!(message.contains("3 violation(s)"), "{message}");
}

#[test]
fn test_query_dimension_is_checked_at_root() {
    let pipeline = scenario(1, PipelineOptions::default());
    assert_eq!(
        pipeline.evaluate(&Coord::xyz(1.0, 2.0, 3.0)),
        Err(NoiseError::DimensionMismatch {
            expected: Dim::D2,
            found: Dim::D3
        })
    );
}

#[test]
fn test_shared_subgraph_caching_is_transparent() {
    let build = |cache_shared| {
        let mut b =
            PipelineBuilder::new(21, Dim::D2).with_options(PipelineOptions { cache_shared });
        let shared = b.fractal(
            FractalSpec::default(),
            NodeSpec::Perlin {
                frequency: 0.04,
                fade: Default::default(),
                salt: None,
            },
        );
        let shared = shared.unwrap();
        let ridge = b.node(NodeSpec::Abs { source: shared });
        let bumps = b.node(NodeSpec::Power {
            source: shared,
            exponent: 3.0,
        });
        let root = b.combine(CombineOp::Add, &[shared, ridge, bumps]);
        (b.build(root).unwrap(), shared)
    };
    let (plain, _) = build(false);
    let (cached, shared) = build(true);
    assert!(cached.node_info(shared).unwrap().cached);
    assert!(!plain.node_info(shared).unwrap().cached);
    for p in coords_2d() {
        assert_eq!(plain.evaluate(&p).unwrap(), cached.evaluate(&p).unwrap());
    }
}

#[test]
fn test_concurrent_evaluation_matches_sequential() {
    let pipeline = scenario(
        42,
        PipelineOptions {
            cache_shared: true,
        },
    );
    let points = coords_2d();
    let expected: Vec<f64> = points
        .iter()
        .map(|p| pipeline.evaluate(p).unwrap())
        .collect();
    std::thread::scope(|s| {
        for chunk in 0..4 {
            let (pipeline, points, expected) = (&pipeline, &points, &expected);
            s.spawn(move || {
                for i in (chunk..points.len()).step_by(4) {
                    assert_eq!(pipeline.evaluate(&points[i]).unwrap(), expected[i]);
                }
            });
        }
    });
}

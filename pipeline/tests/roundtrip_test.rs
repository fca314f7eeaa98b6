#[test]
fn test_graph_spec_json_roundtrip() {
    use noisegraph::{
        CombineOp, Coord, Dim, FractalKind, FractalSpec, InvertMode, NodeSpec, Pipeline,
        PipelineBuilder, PipelineOptions, Rotation, WorleyOutput, WorleyParams,
    };

    // Build a graph touching every parameter shape
    let mut b = PipelineBuilder::new(42, Dim::D3);
    let hills = b
        .fractal(
            FractalSpec {
                octaves: 3,
                kind: FractalKind::Ridged,
                ..FractalSpec::default()
            },
            NodeSpec::Simplex {
                frequency: 0.03,
                salt: Some(7),
            },
        )
        .unwrap();
    let cells = b.worley(WorleyParams {
        frequency: 0.08,
        output: WorleyOutput::F2MinusF1,
        ..WorleyParams::default()
    });
    let turned = b.node(NodeSpec::Rotate {
        source: cells,
        rotation: Rotation::Axis {
            axis: [1.0, 1.0, 0.0],
            angle: 0.7,
        },
    });
    let flipped = b.node(NodeSpec::Invert {
        source: turned,
        mode: InvertMode::AboutMidpoint,
    });
    let root = b.combine(CombineOp::Min, &[hills, flipped]);
    let spec = b.spec(root);

    // Serialize, parse back, compare
    let json = serde_json::to_string_pretty(&spec).unwrap();
    assert!(json.contains("\"kind\": \"rotate\""));
    let parsed: noisegraph::GraphSpec = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, spec);

    let original = Pipeline::from_spec(&spec, PipelineOptions::default()).unwrap();
    let reloaded = Pipeline::from_spec(&parsed, PipelineOptions::default()).unwrap();
    for i in 0..200 {
        let p = Coord::xyz(i as f64 * 0.9, 3.0, i as f64 * -0.4);
        assert_eq!(
            original.evaluate(&p).unwrap().to_bits(),
            reloaded.evaluate(&p).unwrap().to_bits()
        );
    }
}

#[test]
fn test_graph_spec_json_defaults() {
    use noisegraph::{Dim, NodeSpec, Pipeline, PipelineOptions};

    // Hand-written description relying on parameter defaults
    let json = r#"{
        "seed": 5,
        "dim": "D2",
        "nodes": [
            { "kind": "perlin", "frequency": 0.1 },
            { "kind": "worley" },
            { "kind": "blend", "sources": [0, 1], "weights": [0.25, 0.75] }
        ],
        "root": 2
    }"#;
    let spec: noisegraph::GraphSpec = serde_json::from_str(json).unwrap();
    assert_eq!(spec.dim, Dim::D2);
    assert!(matches!(
        spec.nodes[1],
        NodeSpec::Worley { salt: None, .. }
    ));

    let pipeline = Pipeline::from_spec(&spec, PipelineOptions::default()).unwrap();
    let range = pipeline.range();
    assert_eq!(range.min, -1.0);
    assert_eq!(range.max, 2f64.sqrt());
}

use std::path::PathBuf;
use std::time::Instant;

use log::info;
use noisegraph::{
    CombineOp, Coord, Dim, FractalKind, FractalSpec, GraphSpec, NodeSpec, NoiseError, Pipeline,
    PipelineBuilder, PipelineOptions, WorleyOutput, WorleyParams,
};
use thiserror::Error;

mod render;

use render::{HeightGrid, terrain_image};

const USAGE: &str = "usage: app [graph.json] [--size N] [--out file.png] [--z Z]";

#[derive(Debug, Error)]
enum AppError {
    #[error("{0}\n{}", USAGE)]
    Args(String),
    #[error("reading graph: {0}")]
    Io(#[from] std::io::Error),
    #[error("parsing graph: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Noise(#[from] NoiseError),
    #[error("writing image: {0}")]
    Image(#[from] image::ImageError),
}

#[derive(Debug)]
struct Args {
    graph: Option<PathBuf>,
    size: usize,
    out: PathBuf,
    // slice through the third (and fourth) axis for 3D/4D graphs
    z: f64,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            graph: None,
            size: 257, // 2^8 + 1
            out: PathBuf::from("noisegraph.png"),
            z: 0.0,
        }
    }
}

fn parse_args(mut argv: impl Iterator<Item = String>) -> Result<Args, AppError> {
    let mut args = Args::default();
    while let Some(arg) = argv.next() {
        let mut value = |flag: &str| {
            argv.next()
                .ok_or_else(|| AppError::Args(format!("{flag} needs a value")))
        };
        match arg.as_str() {
            "--size" => {
                let v = value("--size")?;
                args.size = v
                    .parse()
                    .ok()
                    .filter(|s| (2..=8193).contains(s))
                    .ok_or_else(|| AppError::Args(format!("bad --size {v}")))?;
            }
            "--out" => args.out = PathBuf::from(value("--out")?),
            "--z" => {
                let v = value("--z")?;
                args.z = v
                    .parse()
                    .map_err(|_| AppError::Args(format!("bad --z {v}")))?;
            }
            flag if flag.starts_with("--") => {
                return Err(AppError::Args(format!("unknown option {flag}")));
            }
            path if args.graph.is_none() => args.graph = Some(PathBuf::from(path)),
            extra => return Err(AppError::Args(format!("unexpected argument {extra}"))),
        }
    }
    Ok(args)
}

// Warped fbm continents, with ridged mountains where a low-frequency mask is high
fn demo_graph() -> Result<GraphSpec, NoiseError> {
    let mut b = PipelineBuilder::new(2025, Dim::D2);
    let continents = b.fractal(
        FractalSpec {
            octaves: 6,
            ..FractalSpec::default()
        },
        NodeSpec::Simplex {
            frequency: 0.006,
            salt: None,
        },
    )?;
    let warp = b.perlin(0.01);
    let land = b.domain_warp(continents, warp, 25.0);

    let ridges = b.fractal(
        FractalSpec {
            octaves: 5,
            kind: FractalKind::Ridged,
            ..FractalSpec::default()
        },
        NodeSpec::Perlin {
            frequency: 0.012,
            fade: Default::default(),
            salt: None,
        },
    )?;
    let cracks = b.worley(WorleyParams {
        frequency: 0.03,
        output: WorleyOutput::F2MinusF1,
        ..WorleyParams::default()
    });
    let cracked = b.combine(CombineOp::Multiply, &[ridges, cracks]);
    let mountains = b.node(NodeSpec::Remap {
        source: cracked,
        min: 0.2,
        max: 1.0,
    });

    let mask = b.perlin(0.004);
    let root = b.node(NodeSpec::Select {
        control: mask,
        low: land,
        high: mountains,
        threshold: 0.25,
        smoothing: 0.3,
    });
    Ok(b.spec(root))
}

fn load_graph(args: &Args) -> Result<GraphSpec, AppError> {
    match &args.graph {
        Some(path) => {
            let text = std::fs::read_to_string(path)?;
            info!("loading graph from {}", path.display());
            Ok(serde_json::from_str(&text)?)
        }
        None => {
            info!("no graph given, using the built-in demo graph");
            Ok(demo_graph()?)
        }
    }
}

fn sample_grid(pipeline: &Pipeline, size: usize, z: f64) -> Result<HeightGrid, AppError> {
    let mut heights = Vec::with_capacity(size * size);
    let mut row = Vec::with_capacity(size);
    for y in 0..size {
        row.clear();
        row.extend((0..size).map(|x| {
            let (x, y) = (x as f64, y as f64);
            match pipeline.dim() {
                Dim::D2 => Coord::xy(x, y),
                Dim::D3 => Coord::xyz(x, y, z),
                Dim::D4 => Coord::xyzw(x, y, z, z),
            }
        }));
        heights.extend(pipeline.evaluate_many(&row)?);
    }
    Ok(HeightGrid { size, heights })
}

fn run() -> Result<(), AppError> {
    let args = parse_args(std::env::args().skip(1))?;
    let spec = load_graph(&args)?;
    let pipeline = Pipeline::from_spec(&spec, PipelineOptions { cache_shared: true })?;

    let start = Instant::now();
    let grid = sample_grid(&pipeline, args.size, args.z)?;
    info!(
        "sampled {0}x{0} points in {1:.2?}",
        args.size,
        start.elapsed()
    );

    let img = terrain_image(&grid, &pipeline.range());
    img.save(&args.out)?;
    info!("saved {}", args.out.display());
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(e) = run() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

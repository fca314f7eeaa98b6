use image::{GrayImage, Luma};
use noisegraph_core::{
    Coord, Dim, Fade, GaussianWhite, Interpolation, NoiseNode, Perlin, Simplex, ValueNoise,
    WorleyOutput, WorleyParams, Worley, evaluate,
};
use std::path::Path;

// Grayscale slice of any node, normalised by its declared output range
fn save_slice(node: &dyn NoiseNode, size: usize, z: f64, filename: &str) {
    let range = node.range();
    let mut img = GrayImage::new(size as u32, size as u32);
    for y in 0..size {
        for x in 0..size {
            let (fx, fy) = (x as f64, y as f64);
            let p = match node.dim() {
                Dim::D2 => Coord::xy(fx, fy),
                Dim::D3 => Coord::xyz(fx, fy, z),
                Dim::D4 => Coord::xyzw(fx, fy, z, z),
            };
            let v = evaluate(node, &p).unwrap();
            let norm = if range.span() < f64::EPSILON {
                0.5
            } else {
                ((v - range.min) / range.span()).clamp(0.0, 1.0)
            };
            let gray = (norm * 255.0).round() as u8;
            img.put_pixel(x as u32, y as u32, Luma([gray]));
        }
    }
    img.save(Path::new(filename)).unwrap();
    println!("Saved {} (declared range {})", filename, range);
}

fn main() {
    let size = 256;
    let frequency = 4.0 / size as f64;

    let perlin2 = Perlin::new(42, Dim::D2, frequency, Fade::Quintic).unwrap();
    save_slice(&perlin2, size, 0.0, "perlin2d.png");

    let simplex = Simplex::new(42, Dim::D2, frequency).unwrap();
    save_slice(&simplex, size, 0.0, "simplex2d.png");

    // 3D Perlin slice at z = 128
    let perlin3 = Perlin::new(42, Dim::D3, frequency, Fade::Quintic).unwrap();
    save_slice(&perlin3, size, (size / 2) as f64, "perlin3d_slice.png");

    let cells = WorleyParams {
        frequency: 2.0 * frequency,
        output: WorleyOutput::F2MinusF1,
        ..WorleyParams::default()
    };
    let worley = Worley::new(42, Dim::D2, cells).unwrap();
    save_slice(&worley, size, 0.0, "worley2d.png");

    let value = ValueNoise::new(42, Dim::D4, frequency, Interpolation::Smooth).unwrap();
    save_slice(&value, size, 3.0, "value4d_slice.png");

    let grain = GaussianWhite::new(42, Dim::D2, 0.25).unwrap();
    save_slice(&grain, size, 0.0, "gaussian_white2d.png");
}

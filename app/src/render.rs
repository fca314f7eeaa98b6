use image::{Rgb, RgbImage};
use noisegraph::OutputRange;
use palette::{Gradient, LinSrgb};

// Row-major grid of samples: `heights[y * size + x]`
pub struct HeightGrid {
    pub size: usize,
    pub heights: Vec<f64>,
}

impl HeightGrid {
    fn at(&self, x: usize, y: usize) -> f64 {
        self.heights[y * self.size + x]
    }
}

// Map a sample into [0, 1] using the pipeline's declared range
pub fn normalize(v: f64, range: &OutputRange) -> f32 {
    if range.span() <= f64::EPSILON {
        0.5
    } else {
        ((v - range.min) / range.span()).clamp(0.0, 1.0) as f32
    }
}

// Lambertian shading from finite differences; `z_scale` exaggerates relief
fn hillshade(grid: &HeightGrid, range: &OutputRange, z_scale: f32) -> Vec<f32> {
    let n = grid.size;
    let mut shade = vec![1.0; n * n];
    let azimuth = std::f32::consts::PI / 4.0; // 45°
    let altitude = std::f32::consts::PI / 4.0; // 45°
    let (sin_alt, cos_alt) = altitude.sin_cos();
    let light = [azimuth.cos() * cos_alt, azimuth.sin() * cos_alt, sin_alt];
    let h = |x, y| normalize(grid.at(x, y), range) * n as f32;

    for y in 1..n.saturating_sub(1) {
        for x in 1..n - 1 {
            let dzdx = (h(x + 1, y) - h(x - 1, y)) / 2.0 * z_scale;
            let dzdy = (h(x, y + 1) - h(x, y - 1)) / 2.0 * z_scale;
            let len = (dzdx * dzdx + dzdy * dzdy + 1.0).sqrt();
            let normal = [-dzdx / len, -dzdy / len, 1.0 / len];
            let dot = normal[0] * light[0] + normal[1] * light[1] + normal[2] * light[2];
            shade[y * n + x] = dot.max(0.0);
        }
    }
    shade
}

/// Colour the grid with a terrain gradient (water, sand, grass, rock, snow)
/// and darken it by a hillshade.
pub fn terrain_image(grid: &HeightGrid, range: &OutputRange) -> RgbImage {
    let gradient = Gradient::with_domain(vec![
        (0.00, LinSrgb::new(0.0, 0.0, 0.5)), // deep blue
        (0.30, LinSrgb::new(0.8, 0.8, 0.5)), // sand
        (0.50, LinSrgb::new(0.1, 0.6, 0.2)), // green
        (0.75, LinSrgb::new(0.5, 0.4, 0.3)), // rock
        (1.00, LinSrgb::new(1.0, 1.0, 1.0)), // snow
    ]);
    let shade = hillshade(grid, range, 0.35);

    let n = grid.size;
    let mut img = RgbImage::new(n as u32, n as u32);
    for y in 0..n {
        for x in 0..n {
            let col: LinSrgb = gradient.get(normalize(grid.at(x, y), range));
            let rgb = col.into_format::<u8>();
            let light = (shade[y * n + x] * 0.5 + 0.5).clamp(0.0, 1.0);
            let pixel = Rgb([
                (rgb.red as f32 * light) as u8,
                (rgb.green as f32 * light) as u8,
                (rgb.blue as f32 * light) as u8,
            ]);
            img.put_pixel(x as u32, y as u32, pixel);
        }
    }
    img
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_uses_declared_range() {
        let r = OutputRange::new(-2.0, 2.0).unwrap();
        assert_eq!(normalize(-2.0, &r), 0.0);
        assert_eq!(normalize(0.0, &r), 0.5);
        assert_eq!(normalize(5.0, &r), 1.0);
        let flat = OutputRange::new(1.0, 1.0).unwrap();
        assert_eq!(normalize(1.0, &flat), 0.5);
    }

    #[test]
    fn flat_grid_is_evenly_lit() {
        let grid = HeightGrid {
            size: 8,
            heights: vec![0.25; 64],
        };
        let r = OutputRange::UNIT;
        let img = terrain_image(&grid, &r);
        assert_eq!(img.dimensions(), (8, 8));
        assert_eq!(img.get_pixel(3, 3), img.get_pixel(4, 5));
    }
}

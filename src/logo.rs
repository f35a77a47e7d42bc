/*
 * Logo Module
 *
 * Turns a logo bitmap into a point cloud of exactly N particles. Every
 * opaque, non-white pixel becomes one candidate point carrying its color and
 * a size derived from its brightness. The candidates are then resampled to
 * the particle count: repeated when there are too few, stride-selected when
 * there are too many, so the output length is always N and index order is
 * stable for a given image.
 */

use nannou::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{MorphError, Result};
use crate::params::LogoSource;

/// Pixels at or below this alpha are skipped.
const MIN_ALPHA: u8 = 20;
/// Pixels with every channel above this are treated as background.
const WHITE_THRESHOLD: u8 = 240;
/// Sub-pixel jitter applied before scaling.
const PIXEL_JITTER: f32 = 0.01;

/// One generated point of a logo.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogoPoint {
    pub position: Vec3,
    pub color: Vec4,
    pub size: f32,
}

/// A logo resampled to the particle count.
#[derive(Debug, Clone)]
pub struct LogoPointCloud {
    pub name: String,
    positions: Vec<Vec3>,
    colors: Vec<Vec4>,
    sizes: Vec<f32>,
}

impl LogoPointCloud {
    /// Resample raw points to exactly `count` entries.
    pub fn from_points(name: impl Into<String>, raw: &[LogoPoint], count: usize) -> Result<Self> {
        let name = name.into();
        if raw.is_empty() {
            return Err(MorphError::EmptyLogo { name });
        }

        let mut positions = Vec::with_capacity(count);
        let mut colors = Vec::with_capacity(count);
        let mut sizes = Vec::with_capacity(count);

        for i in 0..count {
            let point = &raw[resample_index(i, raw.len(), count)];
            positions.push(point.position);
            colors.push(point.color);
            sizes.push(point.size);
        }

        Ok(Self { name, positions, colors, sizes })
    }

    /// Build a cloud from tightly packed RGBA8 pixels.
    pub fn from_rgba(
        source: &LogoSource,
        width: u32,
        height: u32,
        rgba: &[u8],
        count: usize,
    ) -> Result<Self> {
        let raw = extract_points(source, width, height, rgba);
        tracing::debug!(
            logo = %source.name,
            candidates = raw.len(),
            particles = count,
            "extracted logo points"
        );
        Self::from_points(source.name.clone(), &raw, count)
    }

    /// Decode the source's image file and build its cloud.
    pub fn load(source: &LogoSource, count: usize) -> Result<Self> {
        let image = image::open(&source.path).map_err(|err| MorphError::Image {
            path: source.path.clone(),
            source: err,
        })?;
        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();
        tracing::info!(
            logo = %source.name,
            path = %source.path.display(),
            width,
            height,
            "decoded logo image"
        );
        Self::from_rgba(source, width, height, rgba.as_raw(), count)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn colors(&self) -> &[Vec4] {
        &self.colors
    }

    pub fn sizes(&self) -> &[f32] {
        &self.sizes
    }
}

/// Which raw point feeds output slot `i`.
#[inline]
fn resample_index(i: usize, available: usize, count: usize) -> usize {
    if available >= count {
        // Even stride across the scan order keeps the whole shape covered.
        ((i as u64 * available as u64) / count as u64) as usize
    } else {
        i % available
    }
}

/// Byte offset of an RGBA8 pixel, computed in `usize` so large images cannot overflow.
#[inline]
fn pixel_offset(x: u32, y: u32, width: u32) -> usize {
    (y as usize * width as usize + x as usize) * 4
}

fn extract_points(source: &LogoSource, width: u32, height: u32, rgba: &[u8]) -> Vec<LogoPoint> {
    let mut rng = StdRng::seed_from_u64(source.seed);
    let mut points = Vec::new();
    let half_width = width as f32 / 2.0;
    let half_height = height as f32 / 2.0;

    for y in 0..height {
        for x in 0..width {
            let index = pixel_offset(x, y, width);
            let Some(pixel) = rgba.get(index..index + 4) else {
                continue;
            };
            let (r, g, b, a) = (pixel[0], pixel[1], pixel[2], pixel[3]);

            if a <= MIN_ALPHA || (r > WHITE_THRESHOLD && g > WHITE_THRESHOLD && b > WHITE_THRESHOLD) {
                continue;
            }

            let red = r as f32 / 255.0;
            let green = g as f32 / 255.0;
            let blue = b as f32 / 255.0;
            let brightness = (red + green + blue) / 3.0;

            let jitter_x = (rng.gen::<f32>() - 0.5) * PIXEL_JITTER;
            let jitter_y = (rng.gen::<f32>() - 0.5) * PIXEL_JITTER;
            let px = (x as f32 - half_width + jitter_x) * source.scale;
            let py = (half_height - y as f32 + jitter_y) * source.scale + source.y_offset;
            let pz = (rng.gen::<f32>() - 0.5) * source.z_spread;

            points.push(LogoPoint {
                position: vec3(px, py, pz),
                color: vec4(red, green, blue, 1.0),
                size: source.base_size + (1.0 - brightness) * source.darkness_size_boost,
            });
        }
    }

    points
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(x: f32) -> LogoPoint {
        LogoPoint {
            position: vec3(x, 0.0, 0.0),
            color: vec4(1.0, 0.0, 0.0, 1.0),
            size: 1.0,
        }
    }

    fn source() -> LogoSource {
        LogoSource {
            name: "test".to_string(),
            scale: 1.0,
            z_spread: 0.0,
            ..LogoSource::default()
        }
    }

    #[test]
    fn pads_by_repeating() {
        let raw = [point(0.0), point(1.0), point(2.0)];
        let cloud = LogoPointCloud::from_points("pad", &raw, 8).unwrap();
        assert_eq!(cloud.len(), 8);
        let xs: Vec<f32> = cloud.positions().iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![0.0, 1.0, 2.0, 0.0, 1.0, 2.0, 0.0, 1.0]);
    }

    #[test]
    fn down_selects_evenly() {
        let raw: Vec<LogoPoint> = (0..100).map(|i| point(i as f32)).collect();
        let cloud = LogoPointCloud::from_points("stride", &raw, 4).unwrap();
        let xs: Vec<f32> = cloud.positions().iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![0.0, 25.0, 50.0, 75.0]);
    }

    #[test]
    fn empty_logo_is_an_error() {
        let err = LogoPointCloud::from_points("nothing", &[], 4).unwrap_err();
        assert!(matches!(err, MorphError::EmptyLogo { .. }));
    }

    #[test]
    fn skips_transparent_and_white_pixels() {
        // 2x2: opaque black, transparent, white, opaque mid-grey.
        let rgba = [
            0, 0, 0, 255, //
            10, 10, 10, 0, //
            255, 255, 255, 255, //
            128, 128, 128, 255,
        ];
        let points = extract_points(&source(), 2, 2, &rgba);
        assert_eq!(points.len(), 2);
        assert!(points[0].size > points[1].size, "darker pixels are larger");
        assert!((points[0].position.x - -1.0).abs() < 0.01);
        assert!((points[0].position.y - 1.0).abs() < 0.01);
    }

    #[test]
    fn pixel_offset_handles_huge_images() {
        assert_eq!(pixel_offset(1, 2, 10), 84);
        assert_eq!(pixel_offset(32_767, 32_767, 32_768), (32_768usize * 32_768 - 1) * 4);
    }

    #[test]
    fn generation_is_deterministic() {
        let rgba: Vec<u8> = (0..16).flat_map(|i| [i * 10, 0, 0, 255]).collect();
        let a = LogoPointCloud::from_rgba(&source(), 4, 4, &rgba, 32).unwrap();
        let b = LogoPointCloud::from_rgba(&source(), 4, 4, &rgba, 32).unwrap();
        assert_eq!(a.positions(), b.positions());
        assert_eq!(a.sizes(), b.sizes());
    }

    #[test]
    fn missing_file_reports_image_error() {
        let mut src = source();
        src.path = "definitely/not/here.png".into();
        let err = LogoPointCloud::load(&src, 4).unwrap_err();
        assert!(matches!(err, MorphError::Image { .. }));
    }
}

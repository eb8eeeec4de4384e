use image::RgbaImage;

use crate::registry::{RegionRegistry, format_hex_color};

/// Background white, returned for any out-of-range sample.
pub const BACKGROUND: [u8; 3] = [0xff, 0xff, 0xff];

/// Immutable copy of the loaded map's pixel data — the single source of
/// truth for "what color was originally at (x, y)". The displayed raster is
/// rebuilt from this on every recolor, so it must never be mutated after
/// capture.
pub struct RasterCache {
    pixels: RgbaImage,
}

impl RasterCache {
    /// Take a byte-for-byte independent copy of the decoded image. The
    /// caller is free to mutate or drop its buffer afterwards.
    pub fn capture(decoded: &RgbaImage) -> Self {
        Self {
            pixels: decoded.clone(),
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// RGB at (x, y). Out-of-range coordinates return background white
    /// rather than failing — pointer rounding at the canvas edges makes
    /// them a normal occurrence, not an error.
    pub fn sample(&self, x: u32, y: u32) -> [u8; 3] {
        if x >= self.pixels.width() || y >= self.pixels.height() {
            return BACKGROUND;
        }
        let p = self.pixels.get_pixel(x, y);
        [p[0], p[1], p[2]]
    }

    /// Raw RGBA bytes, row-major, 4 bytes per pixel.
    pub fn raw(&self) -> &[u8] {
        self.pixels.as_raw()
    }

    /// Check that every configured canonical color actually occurs in the
    /// raster. A missing color usually means the image went through lossy
    /// recompression and exact-match region detection will misbehave.
    /// Returns the missing colors; the caller decides how loudly to warn.
    pub fn missing_palette_colors(&self, registry: &RegionRegistry) -> Vec<[u8; 3]> {
        let mut missing: Vec<[u8; 3]> = registry.iter().map(|r| r.color).collect();
        for p in self.pixels.pixels() {
            if missing.is_empty() {
                break;
            }
            let rgb = [p[0], p[1], p[2]];
            missing.retain(|&c| c != rgb);
        }
        missing
    }
}

/// Log-friendly rendering of a missing-palette report.
pub fn describe_missing(missing: &[[u8; 3]]) -> String {
    missing
        .iter()
        .map(|&c| format_hex_color(c))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn checker() -> RgbaImage {
        let mut img = RgbaImage::new(2, 2);
        img.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        img.put_pixel(1, 0, Rgba([0, 255, 0, 255]));
        img.put_pixel(0, 1, Rgba([0, 0, 255, 255]));
        img.put_pixel(1, 1, Rgba([10, 20, 30, 255]));
        img
    }

    #[test]
    fn capture_is_an_independent_copy() {
        let mut src = checker();
        let cache = RasterCache::capture(&src);
        src.put_pixel(0, 0, Rgba([0, 0, 0, 255]));
        assert_eq!(cache.sample(0, 0), [255, 0, 0]);
    }

    #[test]
    fn sample_in_bounds() {
        let cache = RasterCache::capture(&checker());
        assert_eq!(cache.sample(1, 0), [0, 255, 0]);
        assert_eq!(cache.sample(1, 1), [10, 20, 30]);
    }

    #[test]
    fn sample_out_of_bounds_is_white() {
        let cache = RasterCache::capture(&checker());
        assert_eq!(cache.sample(2, 0), BACKGROUND);
        assert_eq!(cache.sample(0, 2), BACKGROUND);
        assert_eq!(cache.sample(u32::MAX, u32::MAX), BACKGROUND);
    }

    #[test]
    fn missing_palette_detection() {
        let cache = RasterCache::capture(&checker());
        let reg = RegionRegistry::parse(
            r##"{"groups": {
                "#ff0000": { "label": "present", "paths": [] },
                "#123456": { "label": "absent", "paths": [] }
            }}"##,
        )
        .unwrap();
        let missing = cache.missing_palette_colors(&reg);
        assert_eq!(missing, vec![[0x12, 0x34, 0x56]]);
        assert_eq!(describe_missing(&missing), "#123456");
    }
}

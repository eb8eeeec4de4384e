use std::collections::HashSet;

use crate::raster::RasterCache;

/// Pixel coordinates that get painted as border ink.
pub type BoundaryMask = HashSet<(u32, u32)>;

/// One-pass discontinuity scan over the original raster.
///
/// Every pixel off the bottom/right edge is compared (RGB only, alpha
/// ignored) against its right and down neighbors:
///
/// * right mismatch marks `(x+1, y)` and `(x+1, y+1)`
/// * down mismatch marks `(x, y+1)` and `(x+1, y+1)`
///
/// The result is a thickened, slightly offset border rather than an exact
/// trace. That offset is deliberate and load-bearing: the compositor and
/// the golden expectations in the tests assume exactly these coordinates.
///
/// O(w×h); run once per map load and cached, never on a mere recolor.
pub fn extract(raster: &RasterCache) -> BoundaryMask {
    let w = raster.width();
    let h = raster.height();
    let mut mask = BoundaryMask::new();
    if w == 0 || h == 0 {
        return mask;
    }

    let data = raster.raw();
    let rgb_at = |x: u32, y: u32| -> [u8; 3] {
        let i = ((y * w + x) * 4) as usize;
        [data[i], data[i + 1], data[i + 2]]
    };

    for y in 0..h.saturating_sub(1) {
        for x in 0..w.saturating_sub(1) {
            let here = rgb_at(x, y);
            if here != rgb_at(x + 1, y) {
                mask.insert((x + 1, y));
                mask.insert((x + 1, y + 1));
            }
            if here != rgb_at(x, y + 1) {
                mask.insert((x, y + 1));
                mask.insert((x + 1, y + 1));
            }
        }
    }
    mask
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn flat(w: u32, h: u32, rgb: [u8; 3]) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba([rgb[0], rgb[1], rgb[2], 255]))
    }

    /// Two flat halves split by a vertical line at x=k: the mask must be
    /// exactly {(k, y), (k, y+1)} for each compared row and nothing else.
    #[test]
    fn vertical_split_mask_is_exact() {
        let k = 2u32;
        let (w, h) = (4u32, 3u32);
        let mut img = flat(w, h, [255, 0, 0]);
        for y in 0..h {
            for x in k..w {
                img.put_pixel(x, y, Rgba([0, 255, 0, 255]));
            }
        }

        let mask = extract(&RasterCache::capture(&img));

        let mut expected = BoundaryMask::new();
        for y in 0..h - 1 {
            expected.insert((k, y));
            expected.insert((k, y + 1));
        }
        assert_eq!(mask, expected);
    }

    #[test]
    fn flat_image_has_no_borders() {
        let mask = extract(&RasterCache::capture(&flat(8, 8, [7, 7, 7])));
        assert!(mask.is_empty());
    }

    #[test]
    fn alpha_differences_are_ignored() {
        let mut img = flat(3, 1, [50, 60, 70]);
        img.put_pixel(1, 0, Rgba([50, 60, 70, 128]));
        let mask = extract(&RasterCache::capture(&img));
        assert!(mask.is_empty());
    }

    #[test]
    fn extract_is_idempotent() {
        let mut img = flat(6, 6, [255, 0, 0]);
        for y in 0..6 {
            for x in 3..6 {
                img.put_pixel(x, y, Rgba([0, 0, 255, 255]));
            }
        }
        let cache = RasterCache::capture(&img);
        assert_eq!(extract(&cache), extract(&cache));
    }

    #[test]
    fn down_mismatch_offsets() {
        // Horizontal split at y=1 on a 2x2: row 0 red, row 1 green.
        let mut img = flat(2, 2, [255, 0, 0]);
        img.put_pixel(0, 1, Rgba([0, 255, 0, 255]));
        img.put_pixel(1, 1, Rgba([0, 255, 0, 255]));
        let mask = extract(&RasterCache::capture(&img));
        // Only (x=0, y=0) is compared; its down neighbor differs.
        let expected: BoundaryMask = [(0, 1), (1, 1)].into_iter().collect();
        assert_eq!(mask, expected);
    }

    #[test]
    fn degenerate_sizes() {
        assert!(extract(&RasterCache::capture(&flat(1, 5, [1, 2, 3]))).is_empty());
        assert!(extract(&RasterCache::capture(&flat(5, 1, [1, 2, 3]))).is_empty());
        assert!(extract(&RasterCache::capture(&RgbaImage::new(0, 0))).is_empty());
    }
}

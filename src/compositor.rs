use image::RgbaImage;
use rayon::prelude::*;

use crate::borders::BoundaryMask;
use crate::raster::RasterCache;
use crate::registry::RegionRegistry;
use crate::selection::SelectionStore;

/// Border ink: solid opaque black, painted last so it is never occluded.
const BORDER_INK: [u8; 4] = [0, 0, 0, 255];

/// Build the displayed raster from the cached parts.
///
/// 1. Fill the output with white.
/// 2. For each selected region, scan the *original* buffer for pixels that
///    exactly match its canonical color and write the override color
///    (alpha forced to 255). Unselected regions stay white.
/// 3. Paint every boundary coordinate black.
///
/// Step 2 is a full-buffer scan per selected region — O(selected × w × h).
/// Selections are tens at most, so this beats maintaining a per-pixel
/// region index that would have to be rebuilt on every map load. The scan
/// is row-parallel; rows are disjoint, so output is still deterministic.
pub fn render(
    raster: &RasterCache,
    borders: &BoundaryMask,
    selection: &SelectionStore,
    registry: &RegionRegistry,
) -> RgbaImage {
    let w = raster.width();
    let h = raster.height();
    let mut out = RgbaImage::from_pixel(w, h, image::Rgba([255, 255, 255, 255]));
    if w == 0 || h == 0 {
        return out;
    }

    // (canonical, override) pairs for the regions being recolored.
    let recolors: Vec<([u8; 3], [u8; 3])> = selection
        .assignments()
        .filter_map(|(id, fill)| registry.region(id).map(|r| (r.color, fill)))
        .collect();

    if !recolors.is_empty() {
        let src = raster.raw();
        let row_bytes = w as usize * 4;
        let dst: &mut [u8] = &mut out;
        dst.par_chunks_exact_mut(row_bytes)
            .enumerate()
            .for_each(|(y, dst_row)| {
                let src_row = &src[y * row_bytes..(y + 1) * row_bytes];
                for &(canonical, fill) in &recolors {
                    for x in 0..w as usize {
                        let i = x * 4;
                        if src_row[i] == canonical[0]
                            && src_row[i + 1] == canonical[1]
                            && src_row[i + 2] == canonical[2]
                        {
                            dst_row[i] = fill[0];
                            dst_row[i + 1] = fill[1];
                            dst_row[i + 2] = fill[2];
                            dst_row[i + 3] = 255;
                        }
                    }
                }
            });
    }

    for &(x, y) in borders {
        if x < w && y < h {
            out.put_pixel(x, y, image::Rgba(BORDER_INK));
        }
    }

    out
}

use crate::raster::RasterCache;
use crate::registry::{Region, RegionRegistry};

/// Resolve a buffer coordinate to the region under it, if any.
///
/// Samples the *original* raster (the displayed one may be recolored),
/// then looks the exact RGB up in the registry's color index. Background
/// and anti-aliasing artifacts resolve to None — a normal empty case for
/// click and hover handling, not an error.
pub fn region_at<'a>(
    raster: &RasterCache,
    registry: &'a RegionRegistry,
    x: u32,
    y: u32,
) -> Option<&'a Region> {
    registry.region_by_color(raster.sample(x, y))
}

/// Translate a pointer position on the scaled display rect into buffer
/// pixel coordinates: `floor((pointer − min) × bufferSize / displaySize)`.
/// Floor, not round — buffer pixels are discrete cells, and rounding would
/// shift hits half a pixel at every scale.
///
/// Returns None when the pointer is outside the display rect or the rect
/// is degenerate.
pub fn buffer_coords(
    pointer: (f32, f32),
    display_min: (f32, f32),
    display_size: (f32, f32),
    buffer_w: u32,
    buffer_h: u32,
) -> Option<(u32, u32)> {
    if display_size.0 <= 0.0 || display_size.1 <= 0.0 {
        return None;
    }
    let rel_x = pointer.0 - display_min.0;
    let rel_y = pointer.1 - display_min.1;
    if rel_x < 0.0 || rel_y < 0.0 || rel_x >= display_size.0 || rel_y >= display_size.1 {
        return None;
    }
    let x = (rel_x * buffer_w as f32 / display_size.0).floor() as u32;
    let y = (rel_y * buffer_h as f32 / display_size.1).floor() as u32;
    // Float rounding at the far edge can land exactly on the buffer size.
    Some((x.min(buffer_w.saturating_sub(1)), y.min(buffer_h.saturating_sub(1))))
}

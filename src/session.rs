use image::RgbaImage;

use crate::borders::BoundaryMask;
use crate::compositor;
use crate::hittest;
use crate::raster::RasterCache;
use crate::registry::{Region, RegionRegistry};
use crate::selection::SelectionStore;

/// Everything tied to one loaded map: the parsed registry, the pristine
/// raster, the cached boundary mask, and the mutable selection state.
///
/// The whole bundle is built once per map load and discarded wholesale on
/// map change — nothing in it is ever incrementally rebuilt. Keeping the
/// caches here (instead of ambient app fields) means every component
/// operates on explicit arguments and stays independently testable.
pub struct MapSession {
    pub name: String,
    registry: RegionRegistry,
    raster: RasterCache,
    borders: BoundaryMask,
    selection: SelectionStore,
}

impl MapSession {
    pub fn new(
        name: String,
        registry: RegionRegistry,
        raster: RasterCache,
        borders: BoundaryMask,
    ) -> Self {
        Self {
            name,
            registry,
            raster,
            borders,
            selection: SelectionStore::new(),
        }
    }

    pub fn width(&self) -> u32 {
        self.raster.width()
    }

    pub fn height(&self) -> u32 {
        self.raster.height()
    }

    pub fn region_count(&self) -> usize {
        self.registry.len()
    }

    pub fn registry(&self) -> &RegionRegistry {
        &self.registry
    }

    pub fn selection(&self) -> &SelectionStore {
        &self.selection
    }

    /// Region under a buffer coordinate (click and hover resolution).
    pub fn region_at(&self, x: u32, y: u32) -> Option<&Region> {
        hittest::region_at(&self.raster, &self.registry, x, y)
    }

    /// Toggle the region under a buffer coordinate with the current paint
    /// color. Returns the region if one was hit (so the caller knows a
    /// redraw is due); background clicks are a no-op.
    pub fn toggle_at(&mut self, x: u32, y: u32, paint_color: [u8; 3]) -> Option<u32> {
        let id = self.region_at(x, y)?.id;
        self.selection.toggle(id, paint_color);
        Some(id)
    }

    pub fn toggle_region(&mut self, region_id: u32, paint_color: [u8; 3]) {
        if self.registry.region(region_id).is_some() {
            self.selection.toggle(region_id, paint_color);
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear_selection();
    }

    pub fn reset_all(&mut self) {
        self.selection.reset_all();
    }

    /// Produce the full display raster from the cached parts. Runs no
    /// boundary re-extraction and no raster re-scan beyond the per-selected
    /// region recolor pass.
    pub fn compose(&self) -> RgbaImage {
        compositor::render(&self.raster, &self.borders, &self.selection, &self.registry)
    }
}

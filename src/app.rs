use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::mpsc;

use eframe::egui;
use egui::{Color32, ColorImage, TextureOptions};

use crate::components::sidebar::SidebarPanel;
use crate::hittest;
use crate::maps::{self, MapEntry, MapError};
use crate::session::MapSession;
use crate::{log_err, log_info, log_warn};

/// How long a load-error banner stays on screen before auto-dismissing.
const ERROR_BANNER_SECS: f64 = 10.0;

// ============================================================================
// ASYNC LOAD PIPELINE — background map loading with generation guard
// ============================================================================

/// Result delivered from a background map-load thread.
///
/// `generation` is stamped when the load is requested; the app discards any
/// result whose generation no longer matches, so a map-change issued while
/// an earlier load is still in flight can never install stale state.
pub struct LoadResult {
    pub generation: u64,
    pub name: String,
    pub result: Result<MapSession, MapError>,
}

/// Generation bookkeeping for in-flight loads. `begin` stamps a new
/// request; `accept` is true only for the most recent stamp, so a load
/// overtaken by a newer request is dropped on arrival instead of racing it.
#[derive(Default)]
pub struct LoadTracker {
    current: u64,
}

impl LoadTracker {
    /// Register a new load request and return its generation stamp.
    pub fn begin(&mut self) -> u64 {
        self.current += 1;
        self.current
    }

    /// Whether a completing load with this stamp is still the wanted one.
    pub fn accept(&self, generation: u64) -> bool {
        generation == self.current
    }

    pub fn current(&self) -> u64 {
        self.current
    }
}

/// Transient load-error banner.
///
/// `raised_at` stays None until the banner is first drawn: startup errors
/// are raised before any frame clock exists, and stamping them 0.0 would
/// charge wall time since launch against their dismiss window.
struct ErrorBanner {
    message: String,
    raised_at: Option<f64>,
}

impl ErrorBanner {
    fn new(message: String, now: Option<f64>) -> Self {
        Self {
            message,
            raised_at: now,
        }
    }

    /// Clock time the banner became visible; stamped on first query.
    fn visible_since(&mut self, now: f64) -> f64 {
        *self.raised_at.get_or_insert(now)
    }

    fn expired(&mut self, now: f64) -> bool {
        now - self.visible_since(now) > ERROR_BANNER_SECS
    }
}

pub struct MapFEApp {
    /// Directory being scanned for map config/image pairs.
    maps_dir: Option<PathBuf>,
    available_maps: BTreeMap<String, MapEntry>,

    /// The live session for the currently displayed map, if any.
    session: Option<MapSession>,

    /// Composited frame uploaded for display. Rebuilt only when the
    /// selection or the loaded map changes, never per frame.
    map_texture: Option<egui::TextureHandle>,
    needs_recompose: bool,

    /// Paint color applied to the *next* selection (existing selections
    /// keep the color they were assigned with).
    paint_color: [u8; 3],

    sidebar: SidebarPanel,

    // Async load pipeline
    load_sender: mpsc::Sender<LoadResult>,
    load_receiver: mpsc::Receiver<LoadResult>,
    load_tracker: LoadTracker,
    /// Name of the map whose load is in flight, for the spinner label.
    pending_load: Option<String>,

    error_banner: Option<ErrorBanner>,
}

impl MapFEApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        let (load_sender, load_receiver) = mpsc::channel();

        let mut app = Self {
            maps_dir: None,
            available_maps: BTreeMap::new(),
            session: None,
            map_texture: None,
            needs_recompose: false,
            paint_color: [0x33, 0x66, 0xcc],
            sidebar: SidebarPanel::default(),
            load_sender,
            load_receiver,
            load_tracker: LoadTracker::default(),
            pending_load: None,
            error_banner: None,
        };

        // Convenience: a ./maps directory next to the binary is picked up
        // without going through the folder dialog.
        let default_dir = PathBuf::from("maps");
        if default_dir.is_dir() {
            app.set_maps_dir(default_dir, None);
        }
        app
    }

    /// Point the app at a maps directory, rediscover, and kick off a load
    /// of the first available map.
    fn set_maps_dir(&mut self, dir: PathBuf, ctx: Option<&egui::Context>) {
        match maps::discover_maps(&dir) {
            Ok(found) => {
                if found.is_empty() {
                    self.raise_error(format!("No maps found in {}", dir.display()), ctx);
                }
                self.available_maps = found;
                self.maps_dir = Some(dir);
                if let Some(first) = self.available_maps.keys().next().cloned() {
                    self.request_load(&first, ctx);
                }
            }
            Err(e) => {
                self.raise_error(format!("Failed to scan {}: {}", dir.display(), e), ctx);
            }
        }
    }

    /// Start a background load of the named map. Bumps the generation so
    /// any still-running older load is discarded on arrival.
    fn request_load(&mut self, name: &str, ctx: Option<&egui::Context>) {
        let entry = match maps::find_map(&self.available_maps, name) {
            Ok(entry) => entry.clone(),
            Err(e) => {
                self.raise_error(e.to_string(), ctx);
                return;
            }
        };

        let generation = self.load_tracker.begin();
        self.pending_load = Some(entry.name.clone());
        log_info!(
            "Requesting load of map '{}' (generation {})",
            entry.name,
            generation
        );

        let sender = self.load_sender.clone();
        let repaint_ctx = ctx.cloned();
        std::thread::spawn(move || {
            let name = entry.name.clone();
            let result = maps::load_map(&entry);
            let _ = sender.send(LoadResult {
                generation,
                name,
                result,
            });
            if let Some(ctx) = repaint_ctx {
                ctx.request_repaint();
            }
        });
    }

    /// Drain finished background loads. Stale generations are dropped; a
    /// matching success replaces the whole session, a matching failure
    /// raises the banner and leaves the previous session untouched.
    fn poll_loads(&mut self, ctx: &egui::Context) {
        while let Ok(done) = self.load_receiver.try_recv() {
            if !self.load_tracker.accept(done.generation) {
                log_warn!(
                    "Discarding stale load of '{}' (generation {} != {})",
                    done.name,
                    done.generation,
                    self.load_tracker.current()
                );
                continue;
            }
            self.pending_load = None;
            match done.result {
                Ok(session) => {
                    log_info!("Map '{}' is now active", done.name);
                    self.session = Some(session);
                    self.map_texture = None;
                    self.needs_recompose = true;
                }
                Err(e) => {
                    self.raise_error(e.to_string(), Some(ctx));
                }
            }
        }
    }

    fn raise_error(&mut self, message: String, ctx: Option<&egui::Context>) {
        log_err!("{}", message);
        // No ctx means no frame clock yet (startup path); the banner stamps
        // itself on its first visible frame instead.
        let now = ctx.map(|c| c.input(|i| i.time));
        self.error_banner = Some(ErrorBanner::new(message, now));
    }

    /// Rebuild and re-upload the composited frame if anything changed.
    fn recompose_if_needed(&mut self, ctx: &egui::Context) {
        if !self.needs_recompose {
            return;
        }
        self.needs_recompose = false;
        let Some(session) = &self.session else {
            self.map_texture = None;
            return;
        };

        let composed = session.compose();
        let size = [composed.width() as usize, composed.height() as usize];
        let color_image = ColorImage::from_rgba_unmultiplied(size, composed.as_raw());

        // Nearest filtering: borders are 1px ink, linear would smear them.
        let options = TextureOptions::NEAREST;
        if let Some(tex) = &mut self.map_texture {
            tex.set(color_image, options);
        } else {
            self.map_texture = Some(ctx.load_texture("map_composite", color_image, options));
        }
    }

    // -- panels ------------------------------------------------------------

    fn show_top_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("map_controls").show(ctx, |ui| {
            ui.horizontal(|ui| {
                let mut open_btn = ui.button("Open Maps Folder…");
                if let Some(dir) = &self.maps_dir {
                    open_btn = open_btn.on_hover_text(dir.display().to_string());
                }
                if open_btn.clicked()
                    && let Some(dir) = rfd::FileDialog::new().pick_folder()
                {
                    self.set_maps_dir(dir, Some(ctx));
                }

                ui.separator();

                let selected_label = self
                    .session
                    .as_ref()
                    .and_then(|s| self.available_maps.get(&s.name))
                    .map(|e| e.label.clone())
                    .unwrap_or_else(|| "No map loaded".to_string());
                let mut requested: Option<String> = None;
                egui::ComboBox::from_id_source("map_selector")
                    .selected_text(selected_label)
                    .show_ui(ui, |ui| {
                        let current = self.session.as_ref().map(|s| s.name.clone());
                        for entry in self.available_maps.values() {
                            let is_current = current.as_deref() == Some(entry.name.as_str());
                            if ui.selectable_label(is_current, &entry.label).clicked()
                                && !is_current
                            {
                                requested = Some(entry.name.clone());
                            }
                        }
                    });
                if let Some(name) = requested {
                    self.request_load(&name, Some(ctx));
                }

                ui.separator();

                ui.label("Paint color:");
                ui.color_edit_button_srgb(&mut self.paint_color);

                ui.separator();

                let has_selection = self
                    .session
                    .as_ref()
                    .is_some_and(|s| !s.selection().is_empty());
                if ui
                    .add_enabled(has_selection, egui::Button::new("Clear Selection"))
                    .clicked()
                    && let Some(session) = &mut self.session
                {
                    session.clear_selection();
                    self.needs_recompose = true;
                }
                if ui
                    .add_enabled(has_selection, egui::Button::new("Reset All"))
                    .clicked()
                    && let Some(session) = &mut self.session
                {
                    session.reset_all();
                    self.needs_recompose = true;
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if let Some(name) = &self.pending_load {
                        ui.spinner();
                        ui.label(format!("Loading {}…", name));
                    } else if let Some(session) = &self.session {
                        ui.label(format!(
                            "{} regions, {} selected",
                            session.region_count(),
                            session.selection().len()
                        ));
                    }
                });
            });
        });
    }

    fn show_error_banner(&mut self, ctx: &egui::Context) {
        let now = ctx.input(|i| i.time);
        let message = match self.error_banner.as_mut() {
            None => return,
            Some(banner) => {
                if banner.expired(now) {
                    None
                } else {
                    Some(banner.message.clone())
                }
            }
        };
        let Some(message) = message else {
            self.error_banner = None;
            return;
        };
        egui::TopBottomPanel::bottom("error_banner").show(ctx, |ui| {
            ui.horizontal(|ui| {
                let label =
                    ui.colored_label(Color32::from_rgb(220, 60, 60), format!("⚠ {}", message));
                if let Some(path) = crate::logger::log_path() {
                    label.on_hover_text(format!("Details in {}", path.display()));
                }
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.small_button("Dismiss").clicked() {
                        self.error_banner = None;
                    }
                });
            });
        });
        // Keep repainting so the banner dismisses even without input.
        ctx.request_repaint_after(std::time::Duration::from_millis(500));
    }

    /// The map canvas: blit the composited texture scaled-to-fit, resolve
    /// hovers to a tooltip and clicks to a selection toggle.
    fn show_canvas(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let Some(session) = &mut self.session else {
                ui.centered_and_justified(|ui| {
                    ui.label("Open a maps folder to get started.");
                });
                return;
            };
            let Some(texture) = &self.map_texture else {
                return;
            };

            let avail = ui.available_rect_before_wrap();
            let (buf_w, buf_h) = (session.width(), session.height());
            if buf_w == 0 || buf_h == 0 || avail.width() <= 0.0 || avail.height() <= 0.0 {
                return;
            }

            // Scale to fit while preserving aspect ratio.
            let scale = (avail.width() / buf_w as f32).min(avail.height() / buf_h as f32);
            let display_size = egui::vec2(buf_w as f32 * scale, buf_h as f32 * scale);
            let rect = egui::Rect::from_center_size(avail.center(), display_size);

            let response = ui.allocate_rect(rect, egui::Sense::click());
            ui.painter().image(
                texture.id(),
                rect,
                egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                Color32::WHITE,
            );

            // Hover → tooltip with the region under the pointer. Pointing
            // at background simply shows nothing.
            if let Some(pointer) = response.hover_pos()
                && let Some((bx, by)) = hittest::buffer_coords(
                    (pointer.x, pointer.y),
                    (rect.min.x, rect.min.y),
                    (rect.width(), rect.height()),
                    buf_w,
                    buf_h,
                )
                && let Some(region) = session.region_at(bx, by)
            {
                let text = format!("Region {}: {}", region.id, region.label);
                egui::show_tooltip_at_pointer(ctx, egui::Id::new("region_tooltip"), |ui| {
                    ui.label(text);
                });
            }

            // Click → toggle selection with the current paint color.
            // Background clicks resolve to no region and change nothing.
            if response.clicked()
                && let Some(pointer) = response.interact_pointer_pos()
                && let Some((bx, by)) = hittest::buffer_coords(
                    (pointer.x, pointer.y),
                    (rect.min.x, rect.min.y),
                    (rect.width(), rect.height()),
                    buf_w,
                    buf_h,
                )
                && session.toggle_at(bx, by, self.paint_color).is_some()
            {
                self.needs_recompose = true;
            }
        });
    }
}

impl eframe::App for MapFEApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_loads(ctx);
        self.recompose_if_needed(ctx);

        self.show_top_bar(ctx);
        self.show_error_banner(ctx);

        // Right sidebar: selection list + legend. Clicks there toggle too.
        if let Some(session) = &mut self.session {
            if let Some(id) = self.sidebar.show(ctx, session) {
                session.toggle_region(id, self.paint_color);
                self.needs_recompose = true;
            }
        }

        self.show_canvas(ctx);

        // Interactions this frame may have dirtied the composite; rebuild
        // now so the very next paint shows it.
        self.recompose_if_needed(ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overtaken_load_is_rejected_and_latest_accepted() {
        let mut tracker = LoadTracker::default();
        // A load of "countries" starts, then the user switches to "regions"
        // while it is still in flight.
        let stale = LoadResult {
            generation: tracker.begin(),
            name: "countries".into(),
            result: Err(MapError::MapNotFound("countries".into())),
        };
        let fresh = LoadResult {
            generation: tracker.begin(),
            name: "regions".into(),
            result: Err(MapError::MapNotFound("regions".into())),
        };
        assert!(!tracker.accept(stale.generation));
        assert!(tracker.accept(fresh.generation));
    }

    #[test]
    fn only_the_newest_generation_is_ever_accepted() {
        let mut tracker = LoadTracker::default();
        let generations: Vec<u64> = (0..4).map(|_| tracker.begin()).collect();
        assert_eq!(generations, vec![1, 2, 3, 4]);
        for &g in &generations[..3] {
            assert!(!tracker.accept(g));
        }
        assert!(tracker.accept(4));
        assert_eq!(tracker.current(), 4);
    }

    #[test]
    fn fresh_tracker_accepts_nothing() {
        let tracker = LoadTracker::default();
        assert!(!tracker.accept(0));
        assert!(!tracker.accept(1));
    }

    #[test]
    fn startup_banner_clock_starts_at_first_visible_frame() {
        // Raised before any frame clock exists (the startup path).
        let mut banner = ErrorBanner::new("no maps found".into(), None);
        // First drawn 12s into the session: still fresh, and the dismiss
        // window runs from that frame rather than from launch.
        assert!(!banner.expired(12.0));
        assert!(!banner.expired(12.0 + ERROR_BANNER_SECS));
        assert!(banner.expired(12.1 + ERROR_BANNER_SECS));
    }

    #[test]
    fn banner_raised_with_clock_expires_from_raise_time() {
        let mut banner = ErrorBanner::new("load failed".into(), Some(5.0));
        assert!(!banner.expired(5.0));
        assert!(!banner.expired(5.0 + ERROR_BANNER_SECS));
        assert!(banner.expired(5.1 + ERROR_BANNER_SECS));
    }
}

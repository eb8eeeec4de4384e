use eframe::egui;
use egui::{Color32, RichText};

use crate::registry::format_hex_color;
use crate::session::MapSession;

/// Right-hand sidebar: the selected-regions list and the legend.
///
/// The legend only lists regions that currently carry a color, matching
/// the map itself (unselected regions render white, so listing them would
/// describe nothing visible). Clicking an entry in either list toggles the
/// region; the panel reports that back instead of mutating the session, so
/// the app can recompose once per frame.
#[derive(Default)]
pub struct SidebarPanel {
    pub collapsed: bool,
}

impl SidebarPanel {
    /// Returns the id of a region the user clicked to toggle, if any.
    pub fn show(&mut self, ctx: &egui::Context, session: &MapSession) -> Option<u32> {
        let mut toggle_request = None;

        egui::SidePanel::right("region_sidebar")
            .resizable(true)
            .default_width(230.0)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("Regions");
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        let icon = if self.collapsed { "▸" } else { "▾" };
                        if ui.small_button(icon).clicked() {
                            self.collapsed = !self.collapsed;
                        }
                    });
                });
                if self.collapsed {
                    return;
                }

                ui.separator();
                let count = session.selection().len();
                ui.label(if count == 1 {
                    "1 region selected".to_string()
                } else {
                    format!("{} regions selected", count)
                });

                egui::ScrollArea::vertical().show(ui, |ui| {
                    for id in session.selection().selected_ids() {
                        let Some(region) = session.registry().region(id) else {
                            continue;
                        };
                        let fill = session
                            .selection()
                            .override_color_of(id)
                            .unwrap_or([255, 255, 255]);
                        ui.horizontal(|ui| {
                            swatch(ui, fill);
                            if ui
                                .selectable_label(true, format!("Region {}: {}", id, region.label))
                                .on_hover_text("Click to deselect")
                                .clicked()
                            {
                                toggle_request = Some(id);
                            }
                        });
                    }

                    ui.add_space(8.0);
                    ui.separator();
                    ui.heading("Legend");

                    let mut any_colored = false;
                    for (id, fill) in session.selection().assignments() {
                        let Some(region) = session.registry().region(id) else {
                            continue;
                        };
                        any_colored = true;
                        ui.horizontal(|ui| {
                            swatch(ui, fill);
                            let label = format!(
                                "Region {}: {} ({})",
                                id,
                                region.label,
                                format_hex_color(fill)
                            );
                            if ui.selectable_label(false, label).clicked() {
                                toggle_request = Some(id);
                            }
                        });
                    }
                    if !any_colored {
                        ui.label(
                            RichText::new(
                                "No regions colored yet. Click the map to select and color regions.",
                            )
                            .italics()
                            .weak(),
                        );
                    }
                });
            });

        toggle_request
    }
}

/// Small filled color square with a thin outline.
fn swatch(ui: &mut egui::Ui, rgb: [u8; 3]) {
    let (rect, _) = ui.allocate_exact_size(egui::vec2(14.0, 14.0), egui::Sense::hover());
    let painter = ui.painter();
    painter.rect_filled(rect, 2.0, Color32::from_rgb(rgb[0], rgb[1], rgb[2]));
    painter.rect_stroke(
        rect,
        2.0,
        egui::Stroke::new(1.0, ui.visuals().widgets.noninteractive.bg_stroke.color),
    );
}

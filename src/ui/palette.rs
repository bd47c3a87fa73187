//! Node creation surfaces: the palette side panel and the canvas context
//! menu.

use super::state::FunnelApp;
use crate::types::{NodeId, NodeKind};
use eframe::egui;

impl FunnelApp {
    /// Renders the page palette: one entry per node kind, with a colored
    /// swatch and a description tooltip. Clicking adds a page near the
    /// current viewport center.
    pub fn draw_palette(&mut self, ui: &mut egui::Ui) {
        ui.heading("Pages");
        ui.separator();

        for kind in NodeKind::ALL {
            let config = kind.config();
            let color = egui::Color32::from_rgb(config.rgb.0, config.rgb.1, config.rgb.2);

            let response = ui.horizontal(|ui| {
                let (swatch, _) =
                    ui.allocate_exact_size(egui::vec2(12.0, 12.0), egui::Sense::hover());
                ui.painter().rect_filled(swatch, 3.0, color);
                ui.button(format!("{} {}", config.icon, config.label))
            });
            let clicked = response
                .inner
                .on_hover_text(config.description)
                .clicked();
            if clicked {
                self.add_node_at_view_center(kind);
            }
        }

        ui.separator();
        ui.small("Drag from a page's round handle to connect it to another page.");
        ui.small("Right-click the canvas to add a page at the cursor.");
    }

    /// Adds a page of the given kind near the viewport center, staggered so
    /// consecutive additions don't stack exactly, and selects it.
    pub fn add_node_at_view_center(&mut self, kind: NodeKind) -> NodeId {
        let screen_center = self
            .canvas
            .last_rect
            .map(|r| r.center())
            .unwrap_or(egui::pos2(400.0, 300.0));
        let center = self.screen_to_world(screen_center);

        let n = self.store.funnel().nodes.len() as f32;
        let position = (center.x + (n % 5.0) * 30.0, center.y + (n % 4.0) * 30.0);

        let id = self.store.add_node(kind, position);
        self.select_node(Some(id.clone()));
        id
    }

    /// Renders the right-click context menu offering one entry per page kind
    /// at the clicked canvas position.
    pub fn draw_context_menu(&mut self, ui: &mut egui::Ui) {
        let area_response = egui::Area::new(egui::Id::new("canvas_context_menu"))
            .fixed_pos(self.context_menu.screen_pos)
            .show(ui.ctx(), |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.vertical(|ui| {
                        ui.label("Add page:");
                        ui.separator();

                        for kind in NodeKind::ALL {
                            let config = kind.config();
                            if ui.button(format!("{} {}", config.icon, config.label)).clicked() {
                                let position = self.context_menu.world_pos;
                                let id = self.store.add_node(kind, position);
                                self.select_node(Some(id));
                                self.context_menu.show = false;
                            }
                        }

                        ui.separator();
                        if ui.button("Cancel").clicked() {
                            self.context_menu.show = false;
                        }
                    });
                })
            });

        // Close when clicking outside, but not on the click that opened it
        if !self.context_menu.just_opened && ui.input(|i| i.pointer.primary_clicked()) {
            if let Some(click_pos) = ui.input(|i| i.pointer.interact_pos()) {
                if !area_response.response.rect.contains(click_pos) {
                    self.context_menu.show = false;
                }
            }
        }
        self.context_menu.just_opened = false;
    }
}

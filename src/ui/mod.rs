//! User interface components and rendering logic for the funnel builder.
//!
//! # Module Organization
//!
//! - `state` - Application state structures and the main FunnelApp
//! - `canvas` - Canvas navigation, dragging, connection drawing, hit testing
//! - `rendering` - Drawing the grid, edges, and node cards
//! - `palette` - Node creation via the palette panel and context menu
//! - `file_ops` - Export/import file dialogs for native and WASM
//! - `highlighters` - JSON highlighting for the import/export dialogs

mod canvas;
mod file_ops;
mod highlighters;
mod palette;
mod rendering;
mod state;


pub use state::FunnelApp;

use crate::persist;
use crate::templates::all_templates;
use eframe::egui;
use state::PREFS_STORAGE_KEY;
use std::time::Duration;

impl eframe::App for FunnelApp {
    /// Persist the funnel document and UI preferences.
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        persist::save_state(storage, self.store.storage_key(), self.store.funnel());
        match serde_json::to_string(&self.prefs()) {
            Ok(json) => storage.set_string(PREFS_STORAGE_KEY, json),
            Err(err) => log::error!("failed to serialize UI preferences: {err}"),
        }
    }

    /// Main update function called by egui each frame.
    fn update(&mut self, ctx: &egui::Context, frame: &mut eframe::Frame) {
        let visuals = if self.dark_mode {
            egui::Visuals::dark()
        } else {
            egui::Visuals::light()
        };
        ctx.set_visuals(visuals);

        // Apply completed async file operations
        self.process_file_results();

        // Keyboard shortcuts
        self.handle_undo_redo_keys(ctx);
        self.handle_delete_keys(ctx);

        // Advance the drag-settle clock; keep repainting while a gesture is
        // waiting to settle so the snapshot fires without further input
        let now = ctx.input(|i| i.time);
        self.store.settle_drag(now);
        if self.store.is_dragging() {
            ctx.request_repaint_after(Duration::from_millis(50));
        }

        egui::TopBottomPanel::top("top_toolbar").show(ctx, |ui| {
            self.draw_toolbar(ui);
        });

        egui::SidePanel::left("palette_panel")
            .resizable(false)
            .default_width(170.0)
            .show(ctx, |ui| {
                self.draw_palette(ui);
            });

        egui::SidePanel::right("inspector_panel")
            .resizable(true)
            .default_width(260.0)
            .show(ctx, |ui| {
                self.draw_inspector(ui);
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.draw_canvas(ui);
        });

        self.draw_import_dialog(ctx);
        self.draw_export_dialog(ctx);
        self.draw_clear_confirm_dialog(ctx);

        // Animated edges march continuously
        if self.store.funnel().edges.iter().any(|e| e.animated) {
            ctx.request_repaint_after(Duration::from_millis(50));
        }

        // Flush the document to storage in the same frame that dirtied it
        if self.store.take_dirty() {
            if let Some(storage) = frame.storage_mut() {
                persist::save_state(storage, self.store.storage_key(), self.store.funnel());
            }
        }
    }
}

impl FunnelApp {
    /// Handles Ctrl/Cmd+Z (undo) and Ctrl/Cmd+Shift+Z or Ctrl/Cmd+Y (redo).
    pub fn handle_undo_redo_keys(&mut self, ctx: &egui::Context) {
        // Leave the shortcuts to any focused text edit
        if ctx.wants_keyboard_input() {
            return;
        }

        if ctx.input(|i| i.key_pressed(egui::Key::Z) && i.modifiers.command && !i.modifiers.shift) {
            self.perform_undo();
        } else if ctx.input(|i| {
            (i.key_pressed(egui::Key::Z) && i.modifiers.command && i.modifiers.shift)
                || (i.key_pressed(egui::Key::Y) && i.modifiers.command)
        }) {
            self.perform_redo();
        }
    }

    /// Handles Delete/Backspace to remove the selected node or edge.
    pub fn handle_delete_keys(&mut self, ctx: &egui::Context) {
        if ctx.wants_keyboard_input() {
            return;
        }
        let pressed = ctx.input(|i| {
            i.key_pressed(egui::Key::Delete) || i.key_pressed(egui::Key::Backspace)
        });
        if !pressed {
            return;
        }

        if let Some(node_id) = self.interaction.selected_node.take() {
            self.store.delete_node(&node_id);
            self.interaction.clear_selection();
        } else if let Some(edge_id) = self.interaction.selected_edge.take() {
            self.store.delete_edge(&edge_id);
        }
    }

    /// Performs an undo, dropping any selection that may no longer exist.
    pub fn perform_undo(&mut self) {
        if self.store.undo() {
            self.interaction.clear_selection();
        }
    }

    /// Performs a redo, dropping any selection that may no longer exist.
    pub fn perform_redo(&mut self) {
        if self.store.redo() {
            self.interaction.clear_selection();
        }
    }

    /// Renders the toolbar: document operations, undo/redo, templates, the
    /// funnel-health indicator, and view options.
    fn draw_toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui.button("New").clicked() {
                if self.store.funnel().nodes.is_empty() {
                    self.store.clear();
                } else {
                    self.dialogs.show_clear_confirm = true;
                }
            }

            ui.menu_button("Templates", |ui| {
                for info in all_templates() {
                    if ui.button(info.name).clicked() {
                        self.store.load_template(info.template);
                        self.interaction.clear_selection();
                    }
                }
            });

            ui.separator();

            if ui.button("Import…").clicked() {
                self.dialogs.show_import = true;
                self.dialogs.import_error = None;
            }
            if ui.button("Export…").clicked() {
                self.open_export_dialog();
            }

            ui.separator();

            ui.add_enabled_ui(self.store.can_undo(), |ui| {
                if ui.button("⟲ Undo").clicked() {
                    self.perform_undo();
                }
            });
            ui.add_enabled_ui(self.store.can_redo(), |ui| {
                if ui.button("⟳ Redo").clicked() {
                    self.perform_redo();
                }
            });

            ui.separator();

            // Funnel health indicator with the full report on hover
            let errors = self.store.funnel_errors();
            if errors.is_empty() {
                ui.label(
                    egui::RichText::new("✓ Funnel looks good")
                        .color(egui::Color32::from_rgb(80, 180, 100)),
                );
            } else {
                let label = if errors.len() == 1 {
                    "⚠ 1 issue".to_string()
                } else {
                    format!("⚠ {} issues", errors.len())
                };
                ui.label(
                    egui::RichText::new(label).color(egui::Color32::from_rgb(245, 158, 11)),
                )
                .on_hover_text(errors.join("\n"));
            }

            ui.separator();

            ui.checkbox(&mut self.canvas.show_grid, "Show Grid");
            ui.checkbox(&mut self.dark_mode, "Dark Mode");

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(format!("Zoom: {:.0}%", self.canvas.zoom_factor * 100.0));
            });
        });
    }

    /// Renders the inspector: selected node/edge details plus the aggregate
    /// funnel-health list.
    fn draw_inspector(&mut self, ui: &mut egui::Ui) {
        egui::ScrollArea::vertical()
            .auto_shrink([false; 2])
            .show(ui, |ui| {
                ui.heading("Inspector");
                ui.separator();

                if let Some(node_id) = self.interaction.selected_node.clone() {
                    self.draw_node_inspector(ui, &node_id);
                } else if let Some(edge_id) = self.interaction.selected_edge.clone() {
                    self.draw_edge_inspector(ui, &edge_id);
                } else {
                    ui.label("Click a page or connection to inspect it.");
                }

                ui.add_space(12.0);
                ui.separator();
                ui.heading("Funnel health");

                let errors = self.store.funnel_errors();
                if errors.is_empty() {
                    ui.label(
                        egui::RichText::new("✓ No issues found")
                            .color(egui::Color32::from_rgb(80, 180, 100)),
                    );
                } else {
                    for error in errors {
                        ui.label(
                            egui::RichText::new(format!("• {error}"))
                                .color(egui::Color32::from_rgb(245, 158, 11)),
                        );
                    }
                }

                ui.add_space(8.0);
                let funnel = self.store.funnel();
                ui.small(format!(
                    "{} pages, {} connections",
                    funnel.nodes.len(),
                    funnel.edges.len()
                ));
            });
    }

    fn draw_node_inspector(&mut self, ui: &mut egui::Ui, node_id: &str) {
        let Some(node) = self.store.funnel().node(node_id) else {
            return;
        };
        let config = node.kind.config();
        let kind_line = format!("{} {}", config.icon, config.label);
        let description = config.description;
        let warning = node.has_warning.then(|| node.warning_message.clone());

        ui.label(egui::RichText::new(kind_line).strong());
        ui.small(description);
        ui.add_space(8.0);

        // Label and button text edits commit on Enter or focus loss
        ui.label("Page name:");
        let label_response = ui.text_edit_singleline(&mut self.interaction.temp_label);
        if label_response.lost_focus() {
            let new_label = self.interaction.temp_label.clone();
            self.store.rename_node(node_id, &new_label);
        }

        ui.label("Button text:");
        let button_response = ui.text_edit_singleline(&mut self.interaction.temp_button_label);
        if button_response.lost_focus() {
            let new_text = self.interaction.temp_button_label.clone();
            self.store.set_button_label(node_id, &new_text);
        }

        if let Some(message) = warning {
            ui.add_space(6.0);
            ui.label(
                egui::RichText::new(format!("⚠ {message}"))
                    .color(egui::Color32::from_rgb(245, 158, 11)),
            );
        }

        ui.add_space(8.0);
        if ui.button("🗑 Delete page").clicked() {
            self.store.delete_node(node_id);
            self.interaction.clear_selection();
        }
    }

    fn draw_edge_inspector(&mut self, ui: &mut egui::Ui, edge_id: &str) {
        let funnel = self.store.funnel();
        let Some(edge) = funnel.edges.iter().find(|e| e.id == edge_id) else {
            return;
        };
        let source_label = funnel
            .node(&edge.source)
            .map(|n| n.label.clone())
            .unwrap_or_else(|| "?".to_string());
        let target_label = funnel
            .node(&edge.target)
            .map(|n| n.label.clone())
            .unwrap_or_else(|| "?".to_string());

        ui.label(egui::RichText::new("Connection").strong());
        ui.label(format!("{source_label} → {target_label}"));

        ui.add_space(8.0);
        if ui.button("🗑 Delete connection").clicked() {
            self.store.delete_edge(edge_id);
            self.interaction.clear_selection();
        }
    }

    /// Renders the main canvas area and routes its interactions.
    fn draw_canvas(&mut self, ui: &mut egui::Ui) {
        let (response, painter) =
            ui.allocate_painter(ui.available_size(), egui::Sense::click_and_drag());

        // Center the seed document on the first frame
        if self.canvas.last_rect.is_none() && self.canvas.offset == egui::Vec2::ZERO {
            self.canvas.offset =
                response.rect.center().to_vec2() - egui::vec2(260.0, 0.0) * self.canvas.zoom_factor;
        }
        self.canvas.last_rect = Some(response.rect);

        self.handle_canvas_panning(ui, &response);
        self.handle_canvas_zoom(ui, &response);
        self.handle_canvas_interactions(&response);
        self.handle_node_dragging(ui, &response);

        // Escape cancels an in-progress connection
        if self.interaction.drawing_connection_from.is_some()
            && ui.input(|i| i.key_pressed(egui::Key::Escape))
        {
            self.interaction.drawing_connection_from = None;
            self.interaction.connection_draw_pos = None;
        }

        let time = ui.input(|i| i.time);
        self.render_funnel_elements(&painter, response.rect, time);

        if self.context_menu.show {
            self.draw_context_menu(ui);
        }
    }

    /// Fills the export dialog with the current document and opens it.
    fn open_export_dialog(&mut self) {
        match self.store.export_text() {
            Ok(json) => {
                self.dialogs.export_text = json;
                self.dialogs.show_export = true;
            }
            Err(err) => log::error!("export failed: {err}"),
        }
    }

    fn draw_import_dialog(&mut self, ctx: &egui::Context) {
        if !self.dialogs.show_import {
            return;
        }

        egui::Window::new("Import funnel")
            .collapsible(false)
            .resizable(true)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                ui.label("Paste funnel JSON below, or load a .json file.");
                ui.add_space(4.0);

                let mut layouter = highlighters::json_layouter(self.dark_mode);
                egui::ScrollArea::vertical().max_height(260.0).show(ui, |ui| {
                    ui.add(
                        egui::TextEdit::multiline(&mut self.dialogs.import_text)
                            .code_editor()
                            .desired_rows(12)
                            .desired_width(f32::INFINITY)
                            .layouter(&mut layouter),
                    );
                });

                if let Some(error) = &self.dialogs.import_error {
                    ui.add_space(4.0);
                    ui.label(
                        egui::RichText::new(format!("✗ {error}"))
                            .color(egui::Color32::from_rgb(240, 80, 80)),
                    );
                }

                ui.add_space(6.0);
                ui.horizontal(|ui| {
                    if ui.button("Import").clicked() {
                        let text = self.dialogs.import_text.clone();
                        self.finish_import(&text);
                    }
                    if ui.button("Load file…").clicked() {
                        self.begin_import_from_file(ui.ctx());
                    }
                    if ui.button("Cancel").clicked() {
                        self.dialogs.show_import = false;
                        self.dialogs.import_error = None;
                    }
                });
            });
    }

    fn draw_export_dialog(&mut self, ctx: &egui::Context) {
        if !self.dialogs.show_export {
            return;
        }

        egui::Window::new("Export funnel")
            .collapsible(false)
            .resizable(true)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                let mut layouter = highlighters::json_layouter(self.dark_mode);
                egui::ScrollArea::vertical().max_height(300.0).show(ui, |ui| {
                    ui.add(
                        egui::TextEdit::multiline(&mut self.dialogs.export_text)
                            .code_editor()
                            .desired_rows(14)
                            .desired_width(f32::INFINITY)
                            .interactive(false)
                            .layouter(&mut layouter),
                    );
                });

                ui.add_space(6.0);
                ui.horizontal(|ui| {
                    if ui.button("Copy to clipboard").clicked() {
                        ui.ctx().copy_text(self.dialogs.export_text.clone());
                    }
                    if ui.button("Save file…").clicked() {
                        self.begin_export_to_file(ui.ctx());
                    }
                    if ui.button("Close").clicked() {
                        self.dialogs.show_export = false;
                    }
                });
            });
    }

    fn draw_clear_confirm_dialog(&mut self, ctx: &egui::Context) {
        if !self.dialogs.show_clear_confirm {
            return;
        }

        egui::Window::new("Start a new funnel?")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                ui.label("This removes every page and connection. The action cannot be undone.");
                ui.horizontal(|ui| {
                    if ui.button("Clear funnel").clicked() {
                        self.store.clear();
                        self.interaction.clear_selection();
                        self.dialogs.show_clear_confirm = false;
                    }
                    if ui.button("Cancel").clicked() {
                        self.dialogs.show_clear_confirm = false;
                    }
                });
            });
    }
}

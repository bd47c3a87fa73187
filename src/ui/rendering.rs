//! Canvas rendering: grid, edges, and node cards.
//!
//! Drawing is layered grid → edges → connection preview → nodes so cards
//! always sit on top of their connections.

use super::state::FunnelApp;
use crate::constants::{GRID_SIZE, HANDLE_RADIUS, NODE_HEIGHT, NODE_WIDTH};
use crate::types::{FunnelEdge, FunnelNode};
use eframe::egui;
use eframe::epaint::StrokeKind;

/// Edge line color.
const EDGE_COLOR: egui::Color32 = egui::Color32::from_rgb(148, 163, 184);
/// Selected object highlight.
const SELECTION_COLOR: egui::Color32 = egui::Color32::from_rgb(250, 204, 21);
/// Warning badge fill.
const WARNING_COLOR: egui::Color32 = egui::Color32::from_rgb(245, 158, 11);

impl FunnelApp {
    /// Renders all funnel elements on the canvas.
    pub fn render_funnel_elements(
        &self,
        painter: &egui::Painter,
        canvas_rect: egui::Rect,
        time: f64,
    ) {
        if self.canvas.show_grid {
            self.draw_grid(painter, canvas_rect);
        }

        for edge in &self.store.funnel().edges {
            let is_selected = self.interaction.selected_edge.as_deref() == Some(edge.id.as_str());
            self.draw_edge(painter, edge, is_selected, time);
        }

        if let (Some(from_id), Some(draw_pos)) = (
            self.interaction.drawing_connection_from.as_ref(),
            self.interaction.connection_draw_pos,
        ) {
            self.draw_connection_preview(painter, from_id, draw_pos);
        }

        for node in &self.store.funnel().nodes {
            self.draw_node(painter, node);
        }
    }

    /// Draws a zoom-aware grid, skipped entirely when cells would be too
    /// small to see.
    pub fn draw_grid(&self, painter: &egui::Painter, canvas_rect: egui::Rect) {
        let screen_grid = GRID_SIZE * self.canvas.zoom_factor;
        if screen_grid < 2.0 {
            return;
        }
        let stroke = egui::Stroke::new(
            1.0,
            egui::Color32::from_rgba_unmultiplied(128, 128, 128, 28),
        );

        let top_left = self.screen_to_world(canvas_rect.min);
        let bottom_right = self.screen_to_world(canvas_rect.max);

        let mut x = (top_left.x / GRID_SIZE).floor() * GRID_SIZE;
        while x <= bottom_right.x {
            let screen_x = self.world_to_screen(egui::pos2(x, 0.0)).x;
            painter.line_segment(
                [
                    egui::pos2(screen_x, canvas_rect.min.y),
                    egui::pos2(screen_x, canvas_rect.max.y),
                ],
                stroke,
            );
            x += GRID_SIZE;
        }

        let mut y = (top_left.y / GRID_SIZE).floor() * GRID_SIZE;
        while y <= bottom_right.y {
            let screen_y = self.world_to_screen(egui::pos2(0.0, y)).y;
            painter.line_segment(
                [
                    egui::pos2(canvas_rect.min.x, screen_y),
                    egui::pos2(canvas_rect.max.x, screen_y),
                ],
                stroke,
            );
            y += GRID_SIZE;
        }
    }

    /// Draws one edge: source handle to target's left edge, mid-arrow, and
    /// marching dashes when the edge is animated.
    pub fn draw_edge(
        &self,
        painter: &egui::Painter,
        edge: &FunnelEdge,
        is_selected: bool,
        time: f64,
    ) {
        let funnel = self.store.funnel();
        let Some(source) = funnel.node(&edge.source) else { return };
        let Some(target) = funnel.node(&edge.target) else { return };

        let start = self.world_to_screen(egui::pos2(
            source.position.0 + NODE_WIDTH / 2.0,
            source.position.1,
        ));
        let end = self.world_to_screen(egui::pos2(
            target.position.0 - NODE_WIDTH / 2.0,
            target.position.1,
        ));

        let color = if is_selected { SELECTION_COLOR } else { EDGE_COLOR };
        let stroke = egui::Stroke::new(if is_selected { 3.0 } else { 2.0 }, color);

        if edge.animated {
            let dash = 8.0 * self.canvas.zoom_factor;
            let gap = 6.0 * self.canvas.zoom_factor;
            // March the dashes along the edge over time
            let offset = (time * 30.0) as f32 % (dash + gap);
            painter.extend(egui::Shape::dashed_line_with_offset(
                &[start, end],
                stroke,
                &[dash],
                &[gap],
                offset,
            ));
        } else {
            painter.line_segment([start, end], stroke);
        }

        self.draw_arrow_at_center(painter, start, end, color);
    }

    /// Draws a small direction arrow at the midpoint of an edge.
    fn draw_arrow_at_center(
        &self,
        painter: &egui::Painter,
        start: egui::Pos2,
        end: egui::Pos2,
        color: egui::Color32,
    ) {
        let direction = end - start;
        if direction.length() < 1.0 {
            return;
        }
        let dir = direction.normalized();
        let normal = egui::vec2(-dir.y, dir.x);
        let tip = start + direction * 0.5 + dir * 6.0 * self.canvas.zoom_factor;
        let size = 7.0 * self.canvas.zoom_factor;

        let left = tip - dir * size + normal * size * 0.6;
        let right = tip - dir * size - normal * size * 0.6;
        painter.line_segment([tip, left], egui::Stroke::new(2.0, color));
        painter.line_segment([tip, right], egui::Stroke::new(2.0, color));
    }

    /// Draws the in-progress connection line from a node's output handle to
    /// the cursor. Blue over a valid target, red over an invalid one.
    pub fn draw_connection_preview(
        &self,
        painter: &egui::Painter,
        from_id: &str,
        to_screen_pos: egui::Pos2,
    ) {
        let Some(from_node) = self.store.funnel().node(from_id) else {
            return;
        };
        let from_screen = self.world_to_screen(egui::pos2(
            from_node.position.0 + NODE_WIDTH / 2.0,
            from_node.position.1,
        ));

        let world_pos = self.screen_to_world(to_screen_pos);
        let is_valid = match self.find_node_at_position(world_pos) {
            // Connecting a node to itself is invalid
            Some(target_id) => target_id != from_id,
            // Empty space: show as potentially valid
            None => true,
        };

        let color = if is_valid {
            egui::Color32::from_rgb(100, 150, 255)
        } else {
            egui::Color32::from_rgb(255, 80, 80)
        };

        painter.line_segment([from_screen, to_screen_pos], egui::Stroke::new(2.0, color));
        painter.circle_filled(to_screen_pos, 4.0, color);
    }

    /// Renders a single page card: kind-colored header with icon and label,
    /// button pill, warning badge, and the output handle for kinds that may
    /// have outgoing connections.
    pub fn draw_node(&self, painter: &egui::Painter, node: &FunnelNode) {
        let zoom = self.canvas.zoom_factor;
        let center = self.world_to_screen(egui::pos2(node.position.0, node.position.1));
        let size = egui::vec2(NODE_WIDTH, NODE_HEIGHT) * zoom;
        let rect = egui::Rect::from_center_size(center, size);

        let config = node.kind.config();
        let kind_color = egui::Color32::from_rgb(config.rgb.0, config.rgb.1, config.rgb.2);
        let card_fill = if self.dark_mode {
            egui::Color32::from_gray(40)
        } else {
            egui::Color32::WHITE
        };
        let text_color = if self.dark_mode {
            egui::Color32::from_gray(230)
        } else {
            egui::Color32::from_gray(30)
        };

        painter.rect_filled(rect, 6.0, card_fill);

        // Kind-colored header strip with icon and label
        let header_height = (size.y * 0.36).max(14.0);
        let header_rect =
            egui::Rect::from_min_size(rect.min, egui::vec2(size.x, header_height));
        painter.rect_filled(header_rect, 6.0, kind_color);

        let label_font = egui::FontId::proportional((13.0 * zoom).clamp(8.0, 40.0));
        let label = fit_text(
            painter,
            &format!("{} {}", config.icon, node.label),
            size.x - 8.0 * zoom,
            &label_font,
        );
        painter.text(
            header_rect.center(),
            egui::Align2::CENTER_CENTER,
            label,
            label_font,
            egui::Color32::WHITE,
        );

        // Button pill in the card body
        let pill_font = egui::FontId::proportional((11.0 * zoom).clamp(7.0, 32.0));
        let pill_rect = egui::Rect::from_center_size(
            egui::pos2(center.x, rect.max.y - size.y * 0.28),
            egui::vec2(size.x * 0.8, size.y * 0.3),
        );
        painter.rect_stroke(pill_rect, 10.0, egui::Stroke::new(1.0, kind_color), StrokeKind::Inside);
        let pill_text = fit_text(painter, &node.button_label, pill_rect.width() - 6.0, &pill_font);
        painter.text(
            pill_rect.center(),
            egui::Align2::CENTER_CENTER,
            pill_text,
            pill_font,
            text_color,
        );

        // Border with state highlighting
        let (stroke_color, stroke_width) =
            if self.interaction.dragging_node.as_deref() == Some(node.id.as_str()) {
                (egui::Color32::from_rgb(255, 165, 0), 3.0)
            } else if self.interaction.selected_node.as_deref() == Some(node.id.as_str()) {
                (SELECTION_COLOR, 3.0)
            } else {
                (egui::Color32::from_gray(90), 1.5)
            };
        painter.rect_stroke(
            rect,
            6.0,
            egui::Stroke::new(stroke_width, stroke_color),
            StrokeKind::Outside,
        );

        // Warning badge in the top-right corner
        if node.has_warning {
            let badge_center = egui::pos2(rect.max.x - 2.0, rect.min.y + 2.0);
            let radius = (8.0 * zoom).clamp(5.0, 16.0);
            painter.circle_filled(badge_center, radius, WARNING_COLOR);
            painter.text(
                badge_center,
                egui::Align2::CENTER_CENTER,
                "!",
                egui::FontId::proportional(radius * 1.4),
                egui::Color32::BLACK,
            );
        }

        // Output handle on the right edge
        if config.can_have_outgoing {
            let handle = egui::pos2(rect.max.x, center.y);
            painter.circle_filled(handle, HANDLE_RADIUS * zoom, kind_color);
            painter.circle_stroke(
                handle,
                HANDLE_RADIUS * zoom,
                egui::Stroke::new(1.5, card_fill),
            );
        }
    }
}

/// Truncates `text` with an ellipsis so it fits within `max_width` at the
/// given font.
fn fit_text(
    painter: &egui::Painter,
    text: &str,
    max_width: f32,
    font_id: &egui::FontId,
) -> String {
    let width = |s: &str| {
        painter.fonts_mut(|f| {
            f.layout_no_wrap(s.to_string(), font_id.clone(), egui::Color32::BLACK)
                .size()
                .x
        })
    };

    if width(text) <= max_width {
        return text.to_string();
    }

    let mut truncated: String = text.to_string();
    while !truncated.is_empty() {
        truncated.pop();
        let candidate = format!("{}…", truncated.trim_end());
        if width(&candidate) <= max_width {
            return candidate;
        }
    }
    "…".to_string()
}

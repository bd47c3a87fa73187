//! Canvas interaction and navigation.
//!
//! Panning, zooming, node dragging (routed through the store's patch-op
//! contract), connection drawing from output handles, and the coordinate
//! transforms between screen and world space.

use super::state::FunnelApp;
use crate::constants::{
    CLICK_THRESHOLD, HANDLE_RADIUS, MAX_ZOOM, MIN_ZOOM, NODE_HEIGHT, NODE_WIDTH,
};
use crate::store::NodeChange;
use crate::types::{EdgeId, NodeId};
use eframe::egui;

impl FunnelApp {
    /// Converts screen coordinates to world coordinates accounting for zoom
    /// and pan.
    pub fn screen_to_world(&self, screen_pos: egui::Pos2) -> egui::Pos2 {
        (screen_pos - self.canvas.offset) / self.canvas.zoom_factor
    }

    /// Converts world coordinates to screen coordinates accounting for zoom
    /// and pan.
    pub fn world_to_screen(&self, world_pos: egui::Pos2) -> egui::Pos2 {
        world_pos * self.canvas.zoom_factor + self.canvas.offset
    }

    /// Handles middle-click or Cmd/Ctrl+left-click canvas panning.
    pub fn handle_canvas_panning(&mut self, ui: &mut egui::Ui, response: &egui::Response) {
        let should_pan = ui.input(|i| {
            i.pointer.middle_down() || (i.pointer.primary_down() && i.modifiers.command)
        });

        if should_pan {
            if let Some(current_pos) = response.interact_pointer_pos() {
                if !self.interaction.is_panning {
                    self.interaction.is_panning = true;
                    self.interaction.last_pan_pos = Some(current_pos);
                } else if let Some(last_pos) = self.interaction.last_pan_pos {
                    self.canvas.offset += current_pos - last_pos;
                    self.interaction.last_pan_pos = Some(current_pos);
                }
            }
        } else {
            self.interaction.is_panning = false;
            self.interaction.last_pan_pos = None;
        }
    }

    /// Handles scroll wheel zooming, keeping the world point under the cursor
    /// fixed. Zoom is clamped to [MIN_ZOOM, MAX_ZOOM].
    pub fn handle_canvas_zoom(&mut self, ui: &mut egui::Ui, response: &egui::Response) {
        let scroll_delta = ui.input(|i| i.smooth_scroll_delta.y);
        if scroll_delta == 0.0 {
            return;
        }

        let mouse_pos = ui
            .input(|i| i.pointer.hover_pos())
            .or_else(|| response.interact_pointer_pos());
        let Some(mouse_pos) = mouse_pos else { return };
        if !response.rect.contains(mouse_pos) {
            return;
        }

        let world_before = self.screen_to_world(mouse_pos);
        let zoom_delta = if scroll_delta > 0.0 { 0.025 } else { -0.025 };
        let old_zoom = self.canvas.zoom_factor;
        self.canvas.zoom_factor = (self.canvas.zoom_factor + zoom_delta).clamp(MIN_ZOOM, MAX_ZOOM);

        if (self.canvas.zoom_factor - old_zoom).abs() > f32::EPSILON {
            // Re-anchor so the point under the cursor stays put
            let world_after = self.world_to_screen(world_before);
            self.canvas.offset += mouse_pos - world_after;
        }
    }

    /// Handles left-button interactions on the canvas: starting connection
    /// drawing from an output handle, dragging nodes (dispatched through the
    /// store's patch operations), and finalizing connections on release.
    pub fn handle_node_dragging(&mut self, ui: &mut egui::Ui, response: &egui::Response) {
        let now = ui.input(|i| i.time);

        if ui.input(|i| i.pointer.primary_down()) && !self.interaction.is_panning {
            let Some(current_pos) = response.interact_pointer_pos() else {
                return;
            };
            let world_pos = self.screen_to_world(current_pos);

            if self.interaction.dragging_node.is_none()
                && self.interaction.drawing_connection_from.is_none()
            {
                // Output handles win over the node body so connections can
                // start from the card edge
                if let Some(node_id) = self.find_handle_at_position(world_pos) {
                    self.interaction.drawing_connection_from = Some(node_id);
                    self.interaction.connection_draw_pos = Some(current_pos);
                } else if let Some(node_id) = self.find_node_at_position(world_pos) {
                    self.start_node_drag(node_id, world_pos);
                }
            } else if let Some(dragging_id) = self.interaction.dragging_node.clone() {
                let center = world_pos + self.interaction.drag_offset;
                self.store.apply_node_changes(
                    &[NodeChange::Position {
                        id: dragging_id,
                        position: (center.x, center.y),
                    }],
                    now,
                );
            } else if self.interaction.drawing_connection_from.is_some() {
                self.interaction.connection_draw_pos = Some(current_pos);
            }
        } else {
            // Mouse released: finalize a pending connection
            if let Some(from_id) = self.interaction.drawing_connection_from.take() {
                if let Some(release_pos) = response
                    .interact_pointer_pos()
                    .or(self.interaction.connection_draw_pos)
                {
                    let world_pos = self.screen_to_world(release_pos);
                    if let Some(target_id) = self.find_node_at_position(world_pos) {
                        // Forbidden combinations are the store's call; it
                        // no-ops silently on them
                        self.store.connect(&from_id, &target_id);
                    }
                }
            }
            self.interaction.connection_draw_pos = None;
            self.interaction.dragging_node = None;
        }
    }

    /// Starts dragging a node, selecting it and recording the grab offset so
    /// the card doesn't jump under the cursor.
    fn start_node_drag(&mut self, node_id: NodeId, world_pos: egui::Pos2) {
        if let Some(node) = self.store.funnel().node(&node_id) {
            let center = egui::pos2(node.position.0, node.position.1);
            self.interaction.drag_offset = center - world_pos;
        }
        self.select_node(Some(node_id.clone()));
        self.interaction.dragging_node = Some(node_id);
    }

    /// Handles click selection and the right-click context menu.
    pub fn handle_canvas_interactions(&mut self, response: &egui::Response) {
        if response.clicked()
            && !self.interaction.is_panning
            && self.interaction.dragging_node.is_none()
        {
            if let Some(pos) = response.interact_pointer_pos() {
                let world_pos = self.screen_to_world(pos);
                if let Some(node_id) = self.find_node_at_position(world_pos) {
                    self.select_node(Some(node_id));
                } else if let Some(edge_id) = self.find_edge_at_position(world_pos) {
                    self.interaction.clear_selection();
                    self.interaction.selected_edge = Some(edge_id);
                } else {
                    self.select_node(None);
                }
            }
        }

        if response.secondary_clicked()
            && !self.interaction.is_panning
            && self.interaction.dragging_node.is_none()
        {
            if let Some(screen_pos) = response.interact_pointer_pos() {
                let world_pos = self.screen_to_world(screen_pos);
                self.context_menu.screen_pos = screen_pos;
                self.context_menu.world_pos = (world_pos.x, world_pos.y);
                self.context_menu.show = true;
                self.context_menu.just_opened = true;
            }
        }
    }

    /// Selects a node (or clears selection), refreshing the inspector edit
    /// buffers for the new selection.
    pub fn select_node(&mut self, node_id: Option<NodeId>) {
        self.interaction.clear_selection();
        if let Some(id) = node_id {
            if let Some(node) = self.store.funnel().node(&id) {
                self.interaction.temp_label = node.label.clone();
                self.interaction.temp_button_label = node.button_label.clone();
                self.interaction.inspected_node = Some(id.clone());
            }
            self.interaction.selected_node = Some(id);
        }
    }

    /// Finds the topmost node whose card contains the given world position.
    pub fn find_node_at_position(&self, pos: egui::Pos2) -> Option<NodeId> {
        let node_size = egui::vec2(NODE_WIDTH, NODE_HEIGHT);
        // Later nodes render on top, so hit-test back to front
        self.store
            .funnel()
            .nodes
            .iter()
            .rev()
            .find(|node| {
                let center = egui::pos2(node.position.0, node.position.1);
                egui::Rect::from_center_size(center, node_size).contains(pos)
            })
            .map(|node| node.id.clone())
    }

    /// Finds a node whose output handle contains the given world position.
    /// Nodes whose kind has no outgoing edges have no handle.
    pub fn find_handle_at_position(&self, pos: egui::Pos2) -> Option<NodeId> {
        self.store
            .funnel()
            .nodes
            .iter()
            .rev()
            .filter(|node| node.kind.config().can_have_outgoing)
            .find(|node| {
                let handle = egui::pos2(node.position.0 + NODE_WIDTH / 2.0, node.position.1);
                (pos - handle).length() <= HANDLE_RADIUS * 1.6
            })
            .map(|node| node.id.clone())
    }

    /// Finds the edge nearest to the given world position within the click
    /// threshold, if any.
    pub fn find_edge_at_position(&self, pos: egui::Pos2) -> Option<EdgeId> {
        let funnel = self.store.funnel();
        funnel
            .edges
            .iter()
            .find(|edge| {
                let endpoints = funnel.node(&edge.source).zip(funnel.node(&edge.target));
                let Some((source, target)) = endpoints else {
                    return false;
                };
                let start = egui::pos2(source.position.0 + NODE_WIDTH / 2.0, source.position.1);
                let end = egui::pos2(target.position.0 - NODE_WIDTH / 2.0, target.position.1);
                point_to_segment_distance(pos, start, end) < CLICK_THRESHOLD
            })
            .map(|edge| edge.id.clone())
    }
}

/// Distance from a point to a line segment via clamped projection.
pub fn point_to_segment_distance(
    point: egui::Pos2,
    seg_start: egui::Pos2,
    seg_end: egui::Pos2,
) -> f32 {
    let seg_vec = seg_end - seg_start;
    let point_vec = point - seg_start;
    let len_sq = seg_vec.length_sq();

    if len_sq < 0.0001 {
        // Segment is essentially a point
        return point_vec.length();
    }

    let t = (point_vec.dot(seg_vec) / len_sq).clamp(0.0, 1.0);
    let projection = seg_start + seg_vec * t;
    (point - projection).length()
}

//! The funnel store: the single owner of the document and the seams around
//! it.
//!
//! Every mutation flows through here in the same order: apply the change,
//! recompute derived warnings when the edge set moved, mark the document
//! dirty for the frame-loop persistence flush, then offer the *validated*
//! state to the history manager together with an explicit [`WriteIntent`].
//! The store never touches egui; the UI consumes it by reference.

use crate::history::{History, WriteIntent};
use crate::labels::LabelCounters;
use crate::persist;
use crate::templates::Template;
use crate::types::{EdgeId, Funnel, FunnelEdge, FunnelNode, NodeId, NodeKind};
use crate::validation;
use crate::error::FunnelError;

/// Patch operation on the node collection, in the shape the canvas dispatches.
///
/// The presence of a position field is the drag-start signal: `Position`
/// changes take the debounced history path, everything else snapshots
/// immediately. A single click-nudge is indistinguishable from a drag and
/// coalesces the same way.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeChange {
    /// The node moved (dragging in progress or a one-off nudge)
    Position { id: NodeId, position: (f32, f32) },
    /// Selection toggled; ephemeral presentation state, not a document edit
    Select { id: NodeId },
    /// The node was removed
    Remove { id: NodeId },
}

/// Patch operation on the edge collection.
#[derive(Debug, Clone, PartialEq)]
pub enum EdgeChange {
    /// Selection toggled; ephemeral presentation state, not a document edit
    Select { id: EdgeId },
    /// The edge was removed
    Remove { id: EdgeId },
}

/// Owns the funnel document, its label counters, and its history.
pub struct FunnelStore {
    funnel: Funnel,
    counters: LabelCounters,
    history: History,
    storage_key: String,
    dirty: bool,
}

impl FunnelStore {
    /// Creates a store around `initial` (or the default seed document) that
    /// persists under `storage_key`.
    pub fn new(storage_key: impl Into<String>, initial: Option<Funnel>) -> Self {
        let mut funnel = initial.unwrap_or_else(Funnel::default_seed);
        validation::refresh_warnings(&mut funnel);
        let counters = LabelCounters::for_nodes(&funnel.nodes);
        let history = History::new(funnel.clone());
        Self {
            funnel,
            counters,
            history,
            storage_key: storage_key.into(),
            dirty: false,
        }
    }

    /// The current document.
    pub fn funnel(&self) -> &Funnel {
        &self.funnel
    }

    /// The key this store persists under.
    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    /// Takes and clears the dirty flag. The UI calls this once per frame and
    /// flushes the document to storage when it returns true.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Adds a page of the given kind at `position` with an auto-generated
    /// label, returning its id.
    pub fn add_node(&mut self, kind: NodeKind, position: (f32, f32)) -> NodeId {
        let label = self.counters.allocate(kind);
        let id = self.funnel.add_node(FunnelNode::new(kind, position, label));
        self.commit(false, WriteIntent::UserEdit);
        id
    }

    /// Deletes a page and every edge touching it. Unknown ids are a no-op.
    pub fn delete_node(&mut self, id: &str) {
        if self.funnel.remove_node(id) {
            self.commit(true, WriteIntent::UserEdit);
        }
    }

    /// Deletes an edge. Unknown ids are a no-op.
    pub fn delete_edge(&mut self, id: &str) {
        if self.funnel.remove_edge(id) {
            self.commit(true, WriteIntent::UserEdit);
        }
    }

    /// Connects two pages.
    ///
    /// Silently ignored (no state change, no error) when the source kind
    /// forbids outgoing edges, either endpoint is missing, the connection
    /// would be a self-loop, or an identical edge already exists.
    pub fn connect(&mut self, source: &str, target: &str) {
        let Some(source_node) = self.funnel.node(source) else {
            return;
        };
        if !source_node.kind.config().can_have_outgoing {
            log::debug!(
                "ignoring connection from \"{}\": {:?} pages have no outgoing edges",
                source_node.label,
                source_node.kind
            );
            return;
        }
        if source == target || self.funnel.node(target).is_none() {
            return;
        }
        if self
            .funnel
            .edges
            .iter()
            .any(|e| e.source == source && e.target == target)
        {
            return;
        }

        self.funnel
            .edges
            .push(FunnelEdge::new(source.to_string(), target.to_string()));
        self.commit(true, WriteIntent::UserEdit);
    }

    /// Renames a page. Unknown ids and unchanged labels are no-ops.
    pub fn rename_node(&mut self, id: &str, label: &str) {
        match self.funnel.node_mut(id) {
            Some(node) if node.label != label => {
                node.label = label.to_string();
                // Keep the allocator ahead of manually chosen suffixes
                self.counters = LabelCounters::for_nodes(&self.funnel.nodes);
                self.commit(false, WriteIntent::UserEdit);
            }
            _ => {}
        }
    }

    /// Changes a page's call-to-action text. Unknown ids and unchanged text
    /// are no-ops.
    pub fn set_button_label(&mut self, id: &str, text: &str) {
        match self.funnel.node_mut(id) {
            Some(node) if node.button_label != text => {
                node.button_label = text.to_string();
                self.commit(false, WriteIntent::UserEdit);
            }
            _ => {}
        }
    }

    /// Applies a batch of node patch operations from the presentation layer.
    ///
    /// `now` is the caller's monotonic clock in seconds, used to arm the drag
    /// settle window for position changes.
    pub fn apply_node_changes(&mut self, changes: &[NodeChange], now: f64) {
        for change in changes {
            match change {
                NodeChange::Position { id, position } => {
                    if let Some(node) = self.funnel.node_mut(id) {
                        if node.position != *position {
                            node.position = *position;
                            self.history.note_position_change(now);
                            self.dirty = true;
                        }
                    }
                }
                NodeChange::Select { .. } => {}
                NodeChange::Remove { id } => self.delete_node(id),
            }
        }
    }

    /// Applies a batch of edge patch operations from the presentation layer.
    pub fn apply_edge_changes(&mut self, changes: &[EdgeChange]) {
        for change in changes {
            match change {
                EdgeChange::Select { .. } => {}
                EdgeChange::Remove { id } => self.delete_edge(id),
            }
        }
    }

    /// Advances the drag debounce clock; call once per frame. Returns whether
    /// a drag just settled (and took its snapshot).
    pub fn settle_drag(&mut self, now: f64) -> bool {
        self.history.tick(&self.funnel, now)
    }

    /// Whether a drag gesture is waiting to settle (the UI keeps repainting
    /// while this is true so the settle fires without further input).
    pub fn is_dragging(&self) -> bool {
        self.history.is_dragging()
    }

    /// Restores the previous history entry. No-op at the oldest entry.
    pub fn undo(&mut self) -> bool {
        if let Some(entry) = self.history.undo() {
            // Snapshots store validated state; replaying one is not a user
            // edit and must not re-enter history.
            self.funnel = entry.clone();
            self.history.record(&self.funnel, WriteIntent::Replay);
            self.counters = LabelCounters::for_nodes(&self.funnel.nodes);
            self.dirty = true;
            true
        } else {
            false
        }
    }

    /// Restores the next history entry. No-op at the newest entry.
    pub fn redo(&mut self) -> bool {
        if let Some(entry) = self.history.redo() {
            self.funnel = entry.clone();
            self.history.record(&self.funnel, WriteIntent::Replay);
            self.counters = LabelCounters::for_nodes(&self.funnel.nodes);
            self.dirty = true;
            true
        } else {
            false
        }
    }

    /// Whether undo is currently possible.
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    /// Whether redo is currently possible.
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Empties the document, resets label counters, and collapses history to
    /// a single empty entry.
    pub fn clear(&mut self) {
        self.funnel = Funnel::new();
        self.counters = LabelCounters::new();
        self.history.reset(self.funnel.clone());
        self.dirty = true;
    }

    /// Pretty-printed JSON of the current document.
    pub fn export_text(&self) -> Result<String, FunnelError> {
        persist::export_text(&self.funnel)
    }

    /// Replaces the document with a parsed import payload.
    ///
    /// On failure the current document is untouched and the error is
    /// returned for the UI to surface.
    pub fn import_text(&mut self, text: &str) -> Result<(), FunnelError> {
        let mut imported = persist::import_text(text)?;
        validation::refresh_warnings(&mut imported);
        self.counters = LabelCounters::for_nodes(&imported.nodes);
        self.history.reset(imported.clone());
        self.funnel = imported;
        self.dirty = true;
        Ok(())
    }

    /// Replaces the document with a built-in template, with import semantics
    /// (history reset, counters reconstructed).
    pub fn load_template(&mut self, template: Template) {
        let mut funnel = template.build();
        validation::refresh_warnings(&mut funnel);
        self.counters = LabelCounters::for_nodes(&funnel.nodes);
        self.history.reset(funnel.clone());
        self.funnel = funnel;
        self.dirty = true;
    }

    /// Aggregate funnel-health report for the toolbar.
    pub fn funnel_errors(&self) -> Vec<String> {
        validation::funnel_errors(&self.funnel)
    }

    /// Recomputes derived per-node warnings.
    ///
    /// The rewrite is tagged [`WriteIntent::DerivedValidation`], so it marks
    /// the document dirty for persistence but never creates a history entry.
    pub fn revalidate(&mut self) {
        if validation::refresh_warnings(&mut self.funnel) {
            self.dirty = true;
            self.history
                .record(&self.funnel, WriteIntent::DerivedValidation);
        }
    }

    /// Shared tail of every mutation: derived recompute (when the edge set
    /// changed), persistence mark, then the history offer — in that order so
    /// snapshots capture validated state.
    fn commit(&mut self, edges_changed: bool, intent: WriteIntent) {
        if edges_changed {
            self.revalidate();
        }
        self.dirty = true;
        self.history.record(&self.funnel, intent);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> FunnelStore {
        FunnelStore::new("test_key", None)
    }

    fn node_id(store: &FunnelStore, index: usize) -> NodeId {
        store.funnel().nodes[index].id.clone()
    }

    #[test]
    fn test_add_node_allocates_labels() {
        let mut store = store();
        store.add_node(NodeKind::Upsell, (100.0, 100.0));
        store.add_node(NodeKind::Upsell, (100.0, 200.0));
        store.add_node(NodeKind::SalesPage, (0.0, 200.0));

        let labels: Vec<&str> = store.funnel().nodes.iter().map(|n| n.label.as_str()).collect();
        assert_eq!(
            labels,
            vec!["Sales Page", "Order Page", "Thank You", "Upsell 1", "Upsell 2", "Sales Page 2"]
        );
    }

    #[test]
    fn test_delete_node_cascades_and_revalidates() {
        let mut store = store();
        let order = node_id(&store, 1);

        store.delete_node(&order);

        let funnel = store.funnel();
        assert_eq!(funnel.nodes.len(), 2);
        assert!(funnel.edges.is_empty());
        // Sales page lost its outgoing edge, Thank You its incoming
        assert!(funnel.nodes[0].has_warning);
        assert!(funnel.nodes[1].has_warning);
    }

    #[test]
    fn test_connect_forbidden_source_is_silent_noop() {
        let mut store = store();
        let thanks = node_id(&store, 2);
        let sales = node_id(&store, 0);
        let edges_before = store.funnel().edges.clone();
        let could_undo = store.can_undo();

        store.connect(&thanks, &sales);

        assert_eq!(store.funnel().edges, edges_before);
        assert_eq!(store.can_undo(), could_undo, "no history entry either");
    }

    #[test]
    fn test_connect_ignores_self_duplicates_and_unknown() {
        let mut store = store();
        let sales = node_id(&store, 0);
        let order = node_id(&store, 1);
        let edges_before = store.funnel().edges.len();

        store.connect(&sales, &sales);
        store.connect(&sales, &order); // already exists
        store.connect(&sales, "missing");
        store.connect("missing", &order);

        assert_eq!(store.funnel().edges.len(), edges_before);
    }

    #[test]
    fn test_connect_clears_orphan_warning() {
        let mut store = store();
        let order = node_id(&store, 1);
        let upsell = store.add_node(NodeKind::Upsell, (260.0, 150.0));

        // Fresh node is unconnected; the aggregate report names it
        assert_eq!(
            store.funnel_errors(),
            vec!["\"Upsell 1\" is not connected to the funnel"]
        );

        store.connect(&order, &upsell);

        assert!(store.funnel_errors().is_empty());
        assert!(!store.funnel().node(&upsell).unwrap().has_warning);
    }

    #[test]
    fn test_undo_redo_inverse_over_mutations() {
        let mut store = store();
        let initial_state = store.funnel().clone();
        let order = node_id(&store, 1);

        let upsell = store.add_node(NodeKind::Upsell, (300.0, 150.0));
        store.connect(&order, &upsell);
        let downsell = store.add_node(NodeKind::Downsell, (300.0, 300.0));
        store.connect(&upsell, &downsell);
        store.rename_node(&downsell, "Last Chance");
        let final_state = store.funnel().clone();

        for _ in 0..5 {
            assert!(store.undo());
        }
        assert_eq!(store.funnel(), &initial_state);
        assert!(!store.undo(), "undo past the oldest entry is a no-op");

        for _ in 0..5 {
            assert!(store.redo());
        }
        assert_eq!(store.funnel(), &final_state);
        assert!(!store.redo(), "redo past the newest entry is a no-op");
    }

    #[test]
    fn test_history_bound_under_many_mutations() {
        let mut store = store();
        for i in 0..80 {
            store.add_node(NodeKind::Upsell, (0.0, i as f32 * 10.0));
        }

        let mut undo_steps = 0;
        while store.undo() {
            undo_steps += 1;
        }
        assert_eq!(undo_steps, crate::constants::MAX_HISTORY_ENTRIES - 1);
    }

    #[test]
    fn test_drag_coalesces_into_one_entry() {
        let mut store = store();
        let sales = node_id(&store, 0);

        for i in 0..20 {
            store.apply_node_changes(
                &[NodeChange::Position {
                    id: sales.clone(),
                    position: (i as f32 * 5.0, 0.0),
                }],
                i as f64 * 0.01,
            );
        }
        assert!(store.is_dragging());
        assert!(!store.can_undo(), "no snapshot while the drag is live");

        // Still within the settle window of the last change
        assert!(!store.settle_drag(0.3));
        // Well past it: the gesture settles into a single snapshot
        assert!(store.settle_drag(1.0));
        assert!(store.can_undo());

        // Exactly one entry: a single undo restores the pre-drag position
        assert!(store.undo());
        assert_eq!(store.funnel().node(&sales).unwrap().position, (0.0, 0.0));
        assert!(!store.undo(), "the whole gesture was one undoable step");
    }

    #[test]
    fn test_select_changes_touch_nothing() {
        let mut store = store();
        let sales = node_id(&store, 0);
        let before = store.funnel().clone();

        store.apply_node_changes(&[NodeChange::Select { id: sales }], 0.0);
        store.apply_edge_changes(&[EdgeChange::Select {
            id: store.funnel().edges[0].id.clone(),
        }]);

        assert_eq!(store.funnel(), &before);
        assert!(!store.can_undo());
    }

    #[test]
    fn test_remove_changes_behave_as_deletes() {
        let mut store = store();
        let edge = store.funnel().edges[0].id.clone();
        store.apply_edge_changes(&[EdgeChange::Remove { id: edge.clone() }]);

        assert_eq!(store.funnel().edges.len(), 1);
        assert!(store.funnel().edges.iter().all(|e| e.id != edge));
        assert!(store.can_undo(), "structural removes snapshot immediately");
    }

    #[test]
    fn test_revalidate_is_history_exempt() {
        let mut store = store();
        store.revalidate();
        store.revalidate();

        assert!(!store.can_undo());
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut store = store();
        store.add_node(NodeKind::Upsell, (0.0, 0.0));

        store.clear();

        assert!(store.funnel().nodes.is_empty());
        assert!(store.funnel().edges.is_empty());
        assert!(!store.can_undo());
        assert!(!store.can_redo());
        // Counters reset: the next Sales page gets the bare label again
        let id = store.add_node(NodeKind::SalesPage, (0.0, 0.0));
        assert_eq!(store.funnel().node(&id).unwrap().label, "Sales Page");
    }

    #[test]
    fn test_import_failure_leaves_state_untouched() {
        let mut store = store();
        let before = store.funnel().clone();

        let result = store.import_text("{\"nodes\": \"wat\"}");

        assert!(result.is_err());
        assert_eq!(store.funnel(), &before);
    }

    #[test]
    fn test_import_export_round_trip() {
        let mut store = store();
        let order = node_id(&store, 1);
        let upsell = store.add_node(NodeKind::Upsell, (300.0, 150.0));
        store.connect(&order, &upsell);

        let exported = store.export_text().unwrap();
        let mut restored = FunnelStore::new("test_key", None);
        restored.import_text(&exported).unwrap();

        assert_eq!(restored.funnel(), store.funnel());
        // Counters reconstructed consistently: next Upsell continues the series
        let next = restored.add_node(NodeKind::Upsell, (0.0, 0.0));
        assert_eq!(restored.funnel().node(&next).unwrap().label, "Upsell 2");
    }

    #[test]
    fn test_dirty_flag_handshake() {
        let mut store = store();
        assert!(!store.take_dirty());

        store.add_node(NodeKind::Upsell, (0.0, 0.0));
        assert!(store.take_dirty());
        assert!(!store.take_dirty(), "flag clears after the flush");
    }
}

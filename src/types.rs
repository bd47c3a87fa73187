//! Core data types and structures for the funnel builder.
//!
//! This module defines the fundamental data structures used throughout the
//! application: node kinds and their static configuration, funnel nodes and
//! edges, and the funnel document itself.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for funnel nodes.
///
/// Ids are plain strings so that documents produced by other tools (with
/// arbitrary id schemes) import cleanly; locally minted ids are UUIDs.
pub type NodeId = String;

/// Unique identifier for funnel edges.
pub type EdgeId = String;

/// Mints a fresh identifier.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// The five page roles a funnel node can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeKind {
    /// Entry page pitching the offer
    SalesPage,
    /// Checkout page collecting the order
    OrderPage,
    /// Post-purchase higher-tier offer
    Upsell,
    /// Fallback offer shown after a declined upsell
    Downsell,
    /// Terminal confirmation page
    ThankYou,
}

/// Static display and connectivity configuration for a node kind.
#[derive(Debug, Clone, Copy)]
pub struct KindConfig {
    /// Human-friendly display name, also the base for generated labels
    pub label: &'static str,
    /// Default call-to-action text shown on the node's button pill
    pub default_button_label: &'static str,
    /// Card tint as an RGB triple (the UI maps this to its color type)
    pub rgb: (u8, u8, u8),
    /// Small glyph shown next to the label
    pub icon: &'static str,
    /// Whether pages of this kind may have outgoing connections
    pub can_have_outgoing: bool,
    /// One-line description used in palette tooltips
    pub description: &'static str,
}

impl NodeKind {
    /// All kinds in palette order.
    pub const ALL: [NodeKind; 5] = [
        NodeKind::SalesPage,
        NodeKind::OrderPage,
        NodeKind::Upsell,
        NodeKind::Downsell,
        NodeKind::ThankYou,
    ];

    /// Returns the static configuration for this kind.
    ///
    /// Total over the enum; there is no error path.
    pub const fn config(self) -> &'static KindConfig {
        match self {
            NodeKind::SalesPage => &KindConfig {
                label: "Sales Page",
                default_button_label: "Buy Now",
                rgb: (59, 130, 246),
                icon: "📄",
                can_have_outgoing: true,
                description: "Entry page that pitches the offer",
            },
            NodeKind::OrderPage => &KindConfig {
                label: "Order Page",
                default_button_label: "Complete Order",
                rgb: (16, 185, 129),
                icon: "🛒",
                can_have_outgoing: true,
                description: "Checkout page that collects the order",
            },
            NodeKind::Upsell => &KindConfig {
                label: "Upsell",
                default_button_label: "Yes, Add This!",
                rgb: (245, 158, 11),
                icon: "⬆",
                can_have_outgoing: true,
                description: "One-time offer shown after purchase",
            },
            NodeKind::Downsell => &KindConfig {
                label: "Downsell",
                default_button_label: "Get The Discount",
                rgb: (139, 92, 246),
                icon: "⬇",
                can_have_outgoing: true,
                description: "Fallback offer after a declined upsell",
            },
            NodeKind::ThankYou => &KindConfig {
                label: "Thank You",
                default_button_label: "Access Your Purchase",
                rgb: (236, 72, 153),
                icon: "✔",
                can_have_outgoing: false,
                description: "Terminal confirmation page",
            },
        }
    }
}

/// A single page node in the funnel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunnelNode {
    /// Unique identifier for this node
    pub id: NodeId,
    /// Page role of this node
    pub kind: NodeKind,
    /// Position on the canvas as (x, y) world coordinates
    pub position: (f32, f32),
    /// User-visible page title
    pub label: String,
    /// Call-to-action text shown on the node
    pub button_label: String,
    /// Whether the validation pass flagged this node
    pub has_warning: bool,
    /// Human-readable warning text; empty when `has_warning` is false
    pub warning_message: String,
}

impl FunnelNode {
    /// Creates a new node of the given kind with a fresh id and the kind's
    /// default button label. Warnings start clear; the validation pass fills
    /// them in once the node participates in the edge set.
    pub fn new(kind: NodeKind, position: (f32, f32), label: String) -> Self {
        Self {
            id: new_id(),
            kind,
            position,
            label,
            button_label: kind.config().default_button_label.to_string(),
            has_warning: false,
            warning_message: String::new(),
        }
    }
}

/// A directed connection between two pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunnelEdge {
    /// Unique identifier for this edge
    pub id: EdgeId,
    /// Id of the source node
    pub source: NodeId,
    /// Id of the target node
    pub target: NodeId,
    /// Whether the edge renders with a marching-dash animation
    pub animated: bool,
}

impl FunnelEdge {
    /// Creates a new animated edge between two nodes.
    pub fn new(source: NodeId, target: NodeId) -> Self {
        Self {
            id: new_id(),
            source,
            target,
            animated: true,
        }
    }
}

/// The funnel document: every node and edge, in insertion order.
///
/// Order is not semantically significant beyond render stacking, but it is
/// preserved through persistence and history. `Clone` is the deep copy used
/// for history snapshots; every snapshot owns its own nodes and edges.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Funnel {
    /// All pages in the funnel
    pub nodes: Vec<FunnelNode>,
    /// All connections between pages
    pub edges: Vec<FunnelEdge>,
}

impl Funnel {
    /// Creates an empty funnel.
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a node by id.
    pub fn node(&self, id: &str) -> Option<&FunnelNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Looks up a node by id, mutably.
    pub fn node_mut(&mut self, id: &str) -> Option<&mut FunnelNode> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    /// Appends a node and returns its id.
    pub fn add_node(&mut self, node: FunnelNode) -> NodeId {
        let id = node.id.clone();
        self.nodes.push(node);
        id
    }

    /// Removes a node and every edge touching it.
    ///
    /// Returns `true` if the node existed. Removing a nonexistent id is a
    /// no-op.
    pub fn remove_node(&mut self, id: &str) -> bool {
        let before = self.nodes.len();
        self.nodes.retain(|n| n.id != id);
        let removed = self.nodes.len() != before;
        if removed {
            self.edges.retain(|e| e.source != id && e.target != id);
        }
        removed
    }

    /// Removes an edge by id. Returns `true` if the edge existed.
    pub fn remove_edge(&mut self, id: &str) -> bool {
        let before = self.edges.len();
        self.edges.retain(|e| e.id != id);
        self.edges.len() != before
    }

    /// Number of edges leaving the given node.
    pub fn outgoing_count(&self, id: &str) -> usize {
        self.edges.iter().filter(|e| e.source == id).count()
    }

    /// Number of edges arriving at the given node.
    pub fn incoming_count(&self, id: &str) -> usize {
        self.edges.iter().filter(|e| e.target == id).count()
    }

    /// The default starting document: Sales Page → Order Page → Thank You,
    /// laid out left to right.
    pub fn default_seed() -> Self {
        let mut funnel = Funnel::new();
        let sales = funnel.add_node(FunnelNode::new(
            NodeKind::SalesPage,
            (0.0, 0.0),
            "Sales Page".to_string(),
        ));
        let order = funnel.add_node(FunnelNode::new(
            NodeKind::OrderPage,
            (260.0, 0.0),
            "Order Page".to_string(),
        ));
        let thanks = funnel.add_node(FunnelNode::new(
            NodeKind::ThankYou,
            (520.0, 0.0),
            "Thank You".to_string(),
        ));
        funnel.edges.push(FunnelEdge::new(sales, order.clone()));
        funnel.edges.push(FunnelEdge::new(order, thanks));
        crate::validation::refresh_warnings(&mut funnel);
        funnel
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_creation() {
        let node = FunnelNode::new(NodeKind::Upsell, (100.0, 200.0), "Upsell 1".to_string());

        assert_eq!(node.kind, NodeKind::Upsell);
        assert_eq!(node.position, (100.0, 200.0));
        assert_eq!(node.label, "Upsell 1");
        assert_eq!(node.button_label, "Yes, Add This!");
        assert!(!node.has_warning);
        assert!(!node.id.is_empty());
    }

    #[test]
    fn test_kind_config_is_total() {
        for kind in NodeKind::ALL {
            let config = kind.config();
            assert!(!config.label.is_empty());
            assert!(!config.default_button_label.is_empty());
            assert!(!config.description.is_empty());
        }
        assert!(!NodeKind::ThankYou.config().can_have_outgoing);
        assert!(NodeKind::SalesPage.config().can_have_outgoing);
    }

    #[test]
    fn test_kind_serializes_camel_case() {
        let json = serde_json::to_string(&NodeKind::SalesPage).unwrap();
        assert_eq!(json, "\"salesPage\"");
        let back: NodeKind = serde_json::from_str("\"thankYou\"").unwrap();
        assert_eq!(back, NodeKind::ThankYou);
    }

    #[test]
    fn test_remove_node_removes_touching_edges() {
        let mut funnel = Funnel::new();
        let a = funnel.add_node(FunnelNode::new(NodeKind::SalesPage, (0.0, 0.0), "A".into()));
        let b = funnel.add_node(FunnelNode::new(NodeKind::OrderPage, (0.0, 0.0), "B".into()));
        let c = funnel.add_node(FunnelNode::new(NodeKind::ThankYou, (0.0, 0.0), "C".into()));
        funnel.edges.push(FunnelEdge::new(a.clone(), b.clone()));
        funnel.edges.push(FunnelEdge::new(b.clone(), c.clone()));

        assert!(funnel.remove_node(&b));

        assert_eq!(funnel.nodes.len(), 2);
        assert!(funnel.edges.is_empty());
    }

    #[test]
    fn test_remove_nonexistent_node_is_noop() {
        let mut funnel = Funnel::default_seed();
        let nodes = funnel.nodes.clone();

        assert!(!funnel.remove_node("no-such-id"));
        assert_eq!(funnel.nodes, nodes);
    }

    #[test]
    fn test_degree_counting() {
        let funnel = Funnel::default_seed();
        let sales = &funnel.nodes[0];
        let order = &funnel.nodes[1];
        let thanks = &funnel.nodes[2];

        assert_eq!(funnel.outgoing_count(&sales.id), 1);
        assert_eq!(funnel.incoming_count(&sales.id), 0);
        assert_eq!(funnel.incoming_count(&order.id), 1);
        assert_eq!(funnel.outgoing_count(&thanks.id), 0);
        assert_eq!(funnel.incoming_count(&thanks.id), 1);
    }

    #[test]
    fn test_default_seed_shape() {
        let funnel = Funnel::default_seed();

        assert_eq!(funnel.nodes.len(), 3);
        assert_eq!(funnel.edges.len(), 2);
        assert_eq!(funnel.nodes[0].kind, NodeKind::SalesPage);
        assert_eq!(funnel.nodes[1].kind, NodeKind::OrderPage);
        assert_eq!(funnel.nodes[2].kind, NodeKind::ThankYou);
        assert!(funnel.edges.iter().all(|e| e.animated));
        // Fully connected: nothing to warn about
        assert!(funnel.nodes.iter().all(|n| !n.has_warning));
    }
}

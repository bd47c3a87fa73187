//! Auto-incrementing label generation for new pages.
//!
//! Each node kind keeps a running counter so that freshly added pages get
//! human-readable labels ("Order Page 2", "Upsell 1") that never collide with
//! labels already present in the document.

use crate::types::{FunnelNode, NodeKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-kind running counters backing label generation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LabelCounters {
    counts: HashMap<NodeKind, u32>,
}

impl LabelCounters {
    /// Counters with every kind at zero (an empty document).
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconstructs counters from an existing node collection, so that
    /// subsequent allocations never reproduce a label already in use.
    ///
    /// For each node the trailing integer of its label (if any) raises the
    /// counter for that node's kind to at least that value; a label without a
    /// numeric suffix raises it to at least 1. Applied to the default seed
    /// document this yields {SalesPage: 1, OrderPage: 1, ThankYou: 1} with
    /// Upsell/Downsell untouched at 0.
    pub fn for_nodes(nodes: &[FunnelNode]) -> Self {
        let mut counters = Self::new();
        for node in nodes {
            let entry = counters.counts.entry(node.kind).or_insert(0);
            let floor = trailing_number(&node.label).unwrap_or(1);
            *entry = (*entry).max(floor);
        }
        counters
    }

    /// Current counter value for a kind.
    pub fn count(&self, kind: NodeKind) -> u32 {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    /// Bumps the counter for `kind` and returns the next label.
    ///
    /// The first page of a kind is labeled with the bare display name, except
    /// Upsell and Downsell which always carry a numeric suffix ("Upsell 1") —
    /// funnels routinely contain several of those.
    pub fn allocate(&mut self, kind: NodeKind) -> String {
        let count = self.counts.entry(kind).or_insert(0);
        *count += 1;
        let display = kind.config().label;
        let always_numbered = matches!(kind, NodeKind::Upsell | NodeKind::Downsell);
        if *count == 1 && !always_numbered {
            display.to_string()
        } else {
            format!("{} {}", display, count)
        }
    }
}

/// Parses the trailing run of ASCII digits from a label, if any.
fn trailing_number(label: &str) -> Option<u32> {
    let trimmed = label.trim_end();
    let digits: String = trimmed
        .chars()
        .rev()
        .take_while(|c| c.is_ascii_digit())
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    if digits.is_empty() {
        None
    } else {
        // A ridiculous suffix like "page 99999999999999" saturates rather
        // than wedging the allocator.
        Some(digits.parse::<u32>().unwrap_or(u32::MAX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Funnel;

    #[test]
    fn test_first_labels() {
        let mut counters = LabelCounters::new();
        assert_eq!(counters.allocate(NodeKind::SalesPage), "Sales Page");
        assert_eq!(counters.allocate(NodeKind::SalesPage), "Sales Page 2");
        assert_eq!(counters.allocate(NodeKind::Upsell), "Upsell 1");
        assert_eq!(counters.allocate(NodeKind::Upsell), "Upsell 2");
        assert_eq!(counters.allocate(NodeKind::Downsell), "Downsell 1");
    }

    #[test]
    fn test_reconstruction_from_default_document() {
        let funnel = Funnel::default_seed();
        let counters = LabelCounters::for_nodes(&funnel.nodes);

        assert_eq!(counters.count(NodeKind::SalesPage), 1);
        assert_eq!(counters.count(NodeKind::OrderPage), 1);
        assert_eq!(counters.count(NodeKind::ThankYou), 1);
        assert_eq!(counters.count(NodeKind::Upsell), 0);
        assert_eq!(counters.count(NodeKind::Downsell), 0);
    }

    #[test]
    fn test_reconstruction_takes_max_suffix() {
        let mut funnel = Funnel::new();
        for label in ["Upsell 3", "Upsell 7", "Upsell 2"] {
            funnel.add_node(FunnelNode::new(NodeKind::Upsell, (0.0, 0.0), label.into()));
        }
        let mut counters = LabelCounters::for_nodes(&funnel.nodes);

        assert_eq!(counters.count(NodeKind::Upsell), 7);
        // Property: the next allocation never reproduces an existing label
        let next = counters.allocate(NodeKind::Upsell);
        assert_eq!(next, "Upsell 8");
        assert!(funnel.nodes.iter().all(|n| n.label != next));
    }

    #[test]
    fn test_unsuffixed_label_counts_as_one() {
        let mut funnel = Funnel::new();
        funnel.add_node(FunnelNode::new(
            NodeKind::OrderPage,
            (0.0, 0.0),
            "Order Page".into(),
        ));
        let mut counters = LabelCounters::for_nodes(&funnel.nodes);

        assert_eq!(counters.count(NodeKind::OrderPage), 1);
        assert_eq!(counters.allocate(NodeKind::OrderPage), "Order Page 2");
    }

    #[test]
    fn test_trailing_number_parse() {
        assert_eq!(trailing_number("Upsell 12"), Some(12));
        assert_eq!(trailing_number("Upsell 12  "), Some(12));
        assert_eq!(trailing_number("Sales Page"), None);
        assert_eq!(trailing_number("2nd Chance Offer"), None);
        assert_eq!(trailing_number(""), None);
    }
}

//! Connectivity validation for funnel documents.
//!
//! Two layers: per-node warning flags recomputed whenever the edge set
//! changes, and an aggregate human-readable funnel-health report for the
//! toolbar. Both are pure functions of the current nodes and edges; neither
//! consults any other state.

use crate::types::{Funnel, NodeKind};

/// Recomputes `has_warning`/`warning_message` for every node from the current
/// edge set.
///
/// A node is only written when its computed warning state actually differs
/// from what it already carries, so re-running on an unchanged edge set is a
/// no-op and triggers no downstream re-render or persistence churn. Returns
/// whether any node changed.
pub fn refresh_warnings(funnel: &mut Funnel) -> bool {
    let computed: Vec<(bool, &'static str)> = funnel
        .nodes
        .iter()
        .map(|node| warning_for(funnel, &node.id, node.kind))
        .collect();

    let mut changed = false;
    for (node, (has_warning, message)) in funnel.nodes.iter_mut().zip(computed) {
        if node.has_warning != has_warning || node.warning_message != message {
            node.has_warning = has_warning;
            node.warning_message = message.to_string();
            changed = true;
        }
    }
    changed
}

/// Warning rule for a single node, first matching rule wins.
fn warning_for(funnel: &Funnel, id: &str, kind: NodeKind) -> (bool, &'static str) {
    if kind == NodeKind::SalesPage {
        match funnel.outgoing_count(id) {
            0 => (true, "Connect this page to an Order page"),
            1 => (false, ""),
            _ => (true, "A Sales page should have only one outgoing connection"),
        }
    } else if funnel.incoming_count(id) == 0 {
        // Thank You pages legitimately have no outgoing edges, but every
        // non-entry page needs something pointing at it.
        (true, "This page is not connected to the funnel")
    } else {
        (false, "")
    }
}

/// Aggregate funnel-health report: one entry per problem, ordered by node
/// insertion order with the structural check last.
///
/// Distinct from per-node warnings: this is the list the toolbar surfaces as
/// "N issues", naming each orphaned page, each Sales page without an outgoing
/// connection, and a missing Thank You page when the funnel is non-empty.
pub fn funnel_errors(funnel: &Funnel) -> Vec<String> {
    let mut errors = Vec::new();

    for node in &funnel.nodes {
        if node.kind != NodeKind::SalesPage && funnel.incoming_count(&node.id) == 0 {
            errors.push(format!(
                "\"{}\" is not connected to the funnel",
                node.label
            ));
        }
        if node.kind == NodeKind::SalesPage && funnel.outgoing_count(&node.id) == 0 {
            errors.push(format!(
                "\"{}\" has no outgoing connection",
                node.label
            ));
        }
    }

    if !funnel.nodes.is_empty() && !funnel.nodes.iter().any(|n| n.kind == NodeKind::ThankYou) {
        errors.push("The funnel has no Thank You page".to_string());
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FunnelEdge, FunnelNode};

    fn node(kind: NodeKind, label: &str) -> FunnelNode {
        FunnelNode::new(kind, (0.0, 0.0), label.to_string())
    }

    #[test]
    fn test_sales_page_rules() {
        let mut funnel = Funnel::new();
        let sales = funnel.add_node(node(NodeKind::SalesPage, "Sales Page"));
        let order = funnel.add_node(node(NodeKind::OrderPage, "Order Page"));
        let upsell = funnel.add_node(node(NodeKind::Upsell, "Upsell 1"));

        // Zero outgoing: flagged
        refresh_warnings(&mut funnel);
        assert!(funnel.node(&sales).unwrap().has_warning);
        assert_eq!(
            funnel.node(&sales).unwrap().warning_message,
            "Connect this page to an Order page"
        );

        // Exactly one outgoing: clear
        funnel.edges.push(FunnelEdge::new(sales.clone(), order.clone()));
        refresh_warnings(&mut funnel);
        assert!(!funnel.node(&sales).unwrap().has_warning);
        assert!(funnel.node(&sales).unwrap().warning_message.is_empty());

        // More than one outgoing: flagged again
        funnel.edges.push(FunnelEdge::new(sales.clone(), upsell));
        refresh_warnings(&mut funnel);
        assert_eq!(
            funnel.node(&sales).unwrap().warning_message,
            "A Sales page should have only one outgoing connection"
        );
    }

    #[test]
    fn test_orphan_rule_skips_sales_pages() {
        let mut funnel = Funnel::new();
        let sales = funnel.add_node(node(NodeKind::SalesPage, "Sales Page"));
        let thanks = funnel.add_node(node(NodeKind::ThankYou, "Thank You"));

        refresh_warnings(&mut funnel);

        // The Sales page warning is about outgoing edges, not incoming
        assert_eq!(
            funnel.node(&sales).unwrap().warning_message,
            "Connect this page to an Order page"
        );
        assert_eq!(
            funnel.node(&thanks).unwrap().warning_message,
            "This page is not connected to the funnel"
        );
    }

    #[test]
    fn test_thank_you_with_incoming_is_clean() {
        let funnel = Funnel::default_seed();
        let thanks = &funnel.nodes[2];
        assert!(!thanks.has_warning);
        // Zero outgoing edges on a Thank You page is by design, not a warning
        assert_eq!(funnel.outgoing_count(&thanks.id), 0);
    }

    #[test]
    fn test_refresh_is_idempotent() {
        let mut funnel = Funnel::new();
        funnel.add_node(node(NodeKind::SalesPage, "Sales Page"));
        funnel.add_node(node(NodeKind::Upsell, "Upsell 1"));

        assert!(refresh_warnings(&mut funnel));
        let after_first = funnel.clone();

        // Second pass over the same edge set: nothing changes
        assert!(!refresh_warnings(&mut funnel));
        assert_eq!(funnel, after_first);
    }

    #[test]
    fn test_funnel_errors_scenario() {
        // Default three-node funnel plus one unconnected Upsell
        let mut funnel = Funnel::default_seed();
        let upsell = funnel.add_node(node(NodeKind::Upsell, "Upsell 1"));
        refresh_warnings(&mut funnel);

        let errors = funnel_errors(&funnel);
        assert_eq!(errors, vec!["\"Upsell 1\" is not connected to the funnel"]);

        // Connecting the Upsell clears the report
        let order_id = funnel.nodes[1].id.clone();
        funnel.edges.push(FunnelEdge::new(order_id, upsell));
        refresh_warnings(&mut funnel);
        assert!(funnel_errors(&funnel).is_empty());
    }

    #[test]
    fn test_missing_thank_you_flagged_only_when_nonempty() {
        let mut funnel = Funnel::new();
        assert!(funnel_errors(&funnel).is_empty());

        let sales = funnel.add_node(node(NodeKind::SalesPage, "Sales Page"));
        let order = funnel.add_node(node(NodeKind::OrderPage, "Order Page"));
        funnel.edges.push(FunnelEdge::new(sales, order));

        let errors = funnel_errors(&funnel);
        assert!(errors.contains(&"The funnel has no Thank You page".to_string()));
    }
}

//! Built-in funnel templates that can be quickly loaded from the UI.
//!
//! A few curated layouts from a bare sales flow up to a full customer
//! journey, to save new users the first ten minutes of canvas work.

use crate::types::{Funnel, FunnelEdge, FunnelNode, NodeKind};

/// Kinds of built-in templates available from the toolbar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Template {
    /// Sales Page → Order Page → Thank You
    BasicSales,
    /// Adds a post-purchase upsell before the confirmation
    UpsellPath,
    /// Upsell plus downsell branch, both converging on the confirmation
    FullJourney,
}

/// Metadata for a single template.
pub struct TemplateInfo {
    /// Stable identifier for the template
    pub template: Template,
    /// Human-friendly display name
    pub name: &'static str,
}

/// Returns all templates with their display names.
pub const fn all_templates() -> &'static [TemplateInfo] {
    const TEMPLATES: &[TemplateInfo] = &[
        TemplateInfo {
            template: Template::BasicSales,
            name: "Basic Sales Funnel",
        },
        TemplateInfo {
            template: Template::UpsellPath,
            name: "Upsell Path",
        },
        TemplateInfo {
            template: Template::FullJourney,
            name: "Full Journey (Upsell + Downsell)",
        },
    ];
    TEMPLATES
}

impl Template {
    /// Builds the funnel document for this template.
    pub fn build(self) -> Funnel {
        match self {
            Template::BasicSales => Funnel::default_seed(),
            Template::UpsellPath => build_upsell_path(),
            Template::FullJourney => build_full_journey(),
        }
    }
}

fn page(funnel: &mut Funnel, kind: NodeKind, position: (f32, f32), label: &str) -> String {
    funnel.add_node(FunnelNode::new(kind, position, label.to_string()))
}

fn link(funnel: &mut Funnel, source: &str, target: &str) {
    funnel
        .edges
        .push(FunnelEdge::new(source.to_string(), target.to_string()));
}

fn build_upsell_path() -> Funnel {
    let mut funnel = Funnel::new();

    let sales = page(&mut funnel, NodeKind::SalesPage, (0.0, 0.0), "Sales Page");
    let order = page(&mut funnel, NodeKind::OrderPage, (260.0, 0.0), "Order Page");
    let upsell = page(&mut funnel, NodeKind::Upsell, (520.0, 0.0), "Upsell 1");
    let thanks = page(&mut funnel, NodeKind::ThankYou, (780.0, 0.0), "Thank You");

    link(&mut funnel, &sales, &order);
    link(&mut funnel, &order, &upsell);
    link(&mut funnel, &upsell, &thanks);

    crate::validation::refresh_warnings(&mut funnel);
    funnel
}

fn build_full_journey() -> Funnel {
    let mut funnel = Funnel::new();

    let sales = page(&mut funnel, NodeKind::SalesPage, (0.0, 60.0), "Sales Page");
    let order = page(&mut funnel, NodeKind::OrderPage, (260.0, 60.0), "Order Page");
    let upsell = page(&mut funnel, NodeKind::Upsell, (520.0, 0.0), "Upsell 1");
    let downsell = page(&mut funnel, NodeKind::Downsell, (520.0, 160.0), "Downsell 1");
    let thanks = page(&mut funnel, NodeKind::ThankYou, (780.0, 60.0), "Thank You");

    link(&mut funnel, &sales, &order);
    link(&mut funnel, &order, &upsell);
    // Declined upsell falls through to the downsell
    link(&mut funnel, &upsell, &downsell);
    link(&mut funnel, &upsell, &thanks);
    link(&mut funnel, &downsell, &thanks);

    crate::validation::refresh_warnings(&mut funnel);
    funnel
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::funnel_errors;

    #[test]
    fn test_all_templates_are_healthy() {
        for info in all_templates() {
            let funnel = info.template.build();
            assert!(
                funnel_errors(&funnel).is_empty(),
                "template {:?} ships with validation errors",
                info.template
            );
            assert!(funnel.nodes.iter().all(|n| !n.has_warning));
        }
    }

    #[test]
    fn test_full_journey_shape() {
        let funnel = Template::FullJourney.build();
        assert_eq!(funnel.nodes.len(), 5);
        assert_eq!(funnel.edges.len(), 5);
        assert!(funnel
            .nodes
            .iter()
            .any(|n| n.kind == NodeKind::Downsell));
    }
}

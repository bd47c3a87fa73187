//! # Funnel Builder
//!
//! A visual editor for marketing funnel diagrams: drag page nodes onto a
//! canvas, connect them into a customer journey, and the editor keeps the
//! document validated, persisted, and undoable.
//!
//! ## Features
//! - Five page kinds (Sales, Order, Upsell, Downsell, Thank You) with
//!   per-kind connection rules and auto-numbered labels
//! - Connection drawing from node output handles with live validity preview
//! - Snapshot-based undo/redo that coalesces a whole drag into one step
//! - Local persistence plus pretty-printed JSON import/export
//! - Built-in funnel templates and a funnel-health report

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod constants;
mod error;
mod history;
mod labels;
mod persist;
mod store;
mod templates;
mod types;
mod ui;
mod validation;

// Re-export the public surface
pub use error::FunnelError;
pub use history::{History, WriteIntent};
pub use labels::LabelCounters;
pub use store::{EdgeChange, FunnelStore, NodeChange};
pub use templates::{all_templates, Template, TemplateInfo};
pub use types::{EdgeId, Funnel, FunnelEdge, FunnelNode, KindConfig, NodeId, NodeKind};
pub use validation::{funnel_errors, refresh_warnings};

use ui::FunnelApp;

/// Runs the funnel builder application with default settings.
///
/// Initializes the egui window and starts the main event loop. The persisted
/// document (if any) is loaded from eframe's storage backend.
///
/// # Example
///
/// ```no_run
/// fn main() -> Result<(), eframe::Error> {
///     funnel_builder::run_app()
/// }
/// ```
pub fn run_app() -> Result<(), eframe::Error> {
    let options = eframe::NativeOptions::default();
    eframe::run_native(
        "Funnel Builder",
        options,
        Box::new(|cc| Ok(Box::new(FunnelApp::new(cc)))),
    )
}

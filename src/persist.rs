//! Persistence adapter: the on-disk/wire representation of a funnel and the
//! routines that move documents in and out of it.
//!
//! The wire shape matches what the rendering layer of the original web
//! editor expects — nodes carry a `"type"` widget tag and nest their display
//! fields under `data` — so exports from this tool load elsewhere and vice
//! versa. The in-memory [`Funnel`] stays flat; conversion happens only here.

use crate::error::FunnelError;
use crate::types::{Funnel, FunnelEdge, FunnelNode, NodeKind};
use serde::{Deserialize, Serialize};

/// Widget tag written on every exported node.
const NODE_WIDGET_TYPE: &str = "funnelPage";

fn default_widget_type() -> String {
    NODE_WIDGET_TYPE.to_string()
}

/// Top-level persisted document. Both fields are required: an import payload
/// missing either `nodes` or `edges` is not a funnel document.
#[derive(Debug, Serialize, Deserialize)]
struct StoredFunnel {
    nodes: Vec<StoredNode>,
    edges: Vec<StoredEdge>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredNode {
    id: String,
    #[serde(rename = "type", default = "default_widget_type")]
    widget: String,
    position: StoredPosition,
    data: StoredNodeData,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredPosition {
    x: f32,
    y: f32,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredNodeData {
    label: String,
    node_type: NodeKind,
    /// Hand-written imports may omit this; it defaults from the kind config.
    #[serde(default)]
    button_label: Option<String>,
    #[serde(default)]
    has_warning: bool,
    #[serde(default)]
    warning_message: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredEdge {
    id: String,
    source: String,
    target: String,
    #[serde(default)]
    animated: bool,
}

impl From<&Funnel> for StoredFunnel {
    fn from(funnel: &Funnel) -> Self {
        StoredFunnel {
            nodes: funnel
                .nodes
                .iter()
                .map(|n| StoredNode {
                    id: n.id.clone(),
                    widget: NODE_WIDGET_TYPE.to_string(),
                    position: StoredPosition {
                        x: n.position.0,
                        y: n.position.1,
                    },
                    data: StoredNodeData {
                        label: n.label.clone(),
                        node_type: n.kind,
                        button_label: Some(n.button_label.clone()),
                        has_warning: n.has_warning,
                        warning_message: n.warning_message.clone(),
                    },
                })
                .collect(),
            edges: funnel
                .edges
                .iter()
                .map(|e| StoredEdge {
                    id: e.id.clone(),
                    source: e.source.clone(),
                    target: e.target.clone(),
                    animated: e.animated,
                })
                .collect(),
        }
    }
}

impl StoredFunnel {
    fn into_funnel(self) -> Funnel {
        Funnel {
            nodes: self
                .nodes
                .into_iter()
                .map(|n| FunnelNode {
                    id: n.id,
                    kind: n.data.node_type,
                    position: (n.position.x, n.position.y),
                    label: n.data.label,
                    button_label: n
                        .data
                        .button_label
                        .unwrap_or_else(|| n.data.node_type.config().default_button_label.to_string()),
                    has_warning: n.data.has_warning,
                    warning_message: n.data.warning_message,
                })
                .collect(),
            edges: self
                .edges
                .into_iter()
                .map(|e| FunnelEdge {
                    id: e.id,
                    source: e.source,
                    target: e.target,
                    animated: e.animated,
                })
                .collect(),
        }
    }
}

/// Serializes a funnel as pretty-printed JSON for export.
pub fn export_text(funnel: &Funnel) -> Result<String, FunnelError> {
    serde_json::to_string_pretty(&StoredFunnel::from(funnel)).map_err(FunnelError::Serialize)
}

/// Parses an import payload.
///
/// Fails with [`FunnelError::ImportFormat`] on malformed JSON or when the
/// `nodes`/`edges` fields are absent; nothing is mutated on failure, so the
/// caller can keep its current document.
pub fn import_text(text: &str) -> Result<Funnel, FunnelError> {
    let stored: StoredFunnel = serde_json::from_str(text).map_err(FunnelError::ImportFormat)?;
    Ok(stored.into_funnel())
}

/// Writes the funnel under `key`. Serialization failure is logged and the
/// previous blob is left in place.
pub fn save_state(storage: &mut dyn eframe::Storage, key: &str, funnel: &Funnel) {
    match serde_json::to_string(&StoredFunnel::from(funnel)) {
        Ok(json) => storage.set_string(key, json),
        Err(err) => log::error!("failed to serialize funnel for storage: {err}"),
    }
}

/// Reads the funnel stored under `key`.
///
/// Absence or a corrupt blob yields `None` (the caller seeds the default
/// document); the failure is logged, never surfaced to the user.
pub fn load_state(storage: &dyn eframe::Storage, key: &str) -> Option<Funnel> {
    let json = storage.get_string(key)?;
    match import_text(&json) {
        Ok(funnel) => Some(funnel),
        Err(err) => {
            log::warn!("discarding unreadable persisted funnel: {err}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eframe::Storage;
    use std::collections::HashMap;

    /// In-memory stand-in for the eframe storage backend.
    #[derive(Default)]
    struct MemStorage(HashMap<String, String>);

    impl eframe::Storage for MemStorage {
        fn get_string(&self, key: &str) -> Option<String> {
            self.0.get(key).cloned()
        }
        fn set_string(&mut self, key: &str, value: String) {
            self.0.insert(key.to_string(), value);
        }
        fn flush(&mut self) {}
    }

    #[test]
    fn test_export_shape() {
        let funnel = Funnel::default_seed();
        let json = export_text(&funnel).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        let node = &value["nodes"][0];
        assert_eq!(node["type"], "funnelPage");
        assert_eq!(node["data"]["nodeType"], "salesPage");
        assert_eq!(node["data"]["label"], "Sales Page");
        assert_eq!(node["data"]["buttonLabel"], "Buy Now");
        assert!(node["position"]["x"].is_number());

        let edge = &value["edges"][0];
        assert_eq!(edge["animated"], true);
        assert!(edge["source"].is_string());
    }

    #[test]
    fn test_round_trip() {
        let funnel = Funnel::default_seed();
        let restored = import_text(&export_text(&funnel).unwrap()).unwrap();
        assert_eq!(restored, funnel);
    }

    #[test]
    fn test_import_rejects_missing_fields() {
        assert!(import_text("{\"nodes\": []}").is_err());
        assert!(import_text("{\"edges\": []}").is_err());
        assert!(import_text("{}").is_err());
        assert!(import_text("not json at all").is_err());
        assert!(import_text("[1, 2, 3]").is_err());
    }

    #[test]
    fn test_import_defaults_button_label() {
        let json = r#"{
            "nodes": [
                {
                    "id": "n1",
                    "position": {"x": 10.0, "y": 20.0},
                    "data": {"label": "Checkout", "nodeType": "orderPage"}
                }
            ],
            "edges": []
        }"#;
        let funnel = import_text(json).unwrap();

        let node = &funnel.nodes[0];
        assert_eq!(node.kind, NodeKind::OrderPage);
        assert_eq!(node.button_label, "Complete Order");
        assert!(!node.has_warning);
        assert_eq!(node.position, (10.0, 20.0));
    }

    #[test]
    fn test_storage_round_trip() {
        let mut storage = MemStorage::default();
        let funnel = Funnel::default_seed();

        save_state(&mut storage, "funnel_document", &funnel);
        let loaded = load_state(&storage, "funnel_document").unwrap();
        assert_eq!(loaded, funnel);
    }

    #[test]
    fn test_storage_miss_and_corruption_yield_none() {
        let mut storage = MemStorage::default();
        assert!(load_state(&storage, "funnel_document").is_none());

        storage.set_string("funnel_document", "{broken".to_string());
        assert!(load_state(&storage, "funnel_document").is_none());
    }
}

//! Application state structures.
//!
//! Everything the UI tracks on top of the funnel store: canvas navigation,
//! in-flight interactions, dialog visibility, and the channel pair used by
//! async file operations.

use crate::constants::DEFAULT_STORAGE_KEY;
use crate::persist;
use crate::store::FunnelStore;
use crate::types::{EdgeId, NodeId};
use eframe::egui;
use serde::{Deserialize, Serialize};
use std::sync::mpsc::{channel, Receiver, Sender};

/// Storage key for UI preferences (theme, zoom, grid), kept separate from the
/// funnel document itself.
pub const PREFS_STORAGE_KEY: &str = "ui_prefs";

/// Canvas navigation and display state. Persisted preferences go through
/// [`UiPrefs`]; this struct itself is session-only.
pub struct CanvasState {
    /// Current canvas pan offset in screen space
    pub offset: egui::Vec2,
    /// Current zoom level (1.0 = normal)
    pub zoom_factor: f32,
    /// Whether the background grid is drawn
    pub show_grid: bool,
    /// Screen rect the canvas occupied last frame; used by the palette to
    /// place new nodes near the viewport center
    pub last_rect: Option<egui::Rect>,
}

impl Default for CanvasState {
    fn default() -> Self {
        Self {
            offset: egui::Vec2::ZERO,
            zoom_factor: 1.0,
            show_grid: true,
            last_rect: None,
        }
    }
}

/// In-flight user interaction state: selection, dragging, connection drawing,
/// and the inspector's temporary edit buffers.
#[derive(Default)]
pub struct InteractionState {
    /// Currently selected node, if any
    pub selected_node: Option<NodeId>,
    /// Currently selected edge, if any
    pub selected_edge: Option<EdgeId>,
    /// Node currently being dragged
    pub dragging_node: Option<NodeId>,
    /// Offset from mouse to node center during dragging (world space)
    pub drag_offset: egui::Vec2,
    /// Whether the user is panning the canvas
    pub is_panning: bool,
    /// Last mouse position during panning
    pub last_pan_pos: Option<egui::Pos2>,
    /// Node an outgoing connection is being drawn from
    pub drawing_connection_from: Option<NodeId>,
    /// Current mouse position while drawing a connection (screen space)
    pub connection_draw_pos: Option<egui::Pos2>,
    /// Which node the inspector edit buffers were loaded from
    pub inspected_node: Option<NodeId>,
    /// Inspector buffer for the page label
    pub temp_label: String,
    /// Inspector buffer for the button text
    pub temp_button_label: String,
}

impl InteractionState {
    /// Clears selection and the inspector buffers (after undo/redo/import,
    /// when the selected objects may no longer exist).
    pub fn clear_selection(&mut self) {
        self.selected_node = None;
        self.selected_edge = None;
        self.inspected_node = None;
        self.temp_label.clear();
        self.temp_button_label.clear();
    }
}

/// Right-click context menu state for creating nodes on the canvas.
#[derive(Default)]
pub struct ContextMenuState {
    /// Whether the context menu is visible
    pub show: bool,
    /// Screen position where the menu should appear
    pub screen_pos: egui::Pos2,
    /// World position where a created node should land
    pub world_pos: (f32, f32),
    /// Prevents the menu from closing on the click that opened it
    pub just_opened: bool,
}

/// Visibility and buffers for the import/export/clear dialogs.
#[derive(Default)]
pub struct DialogState {
    /// Whether the import window is open
    pub show_import: bool,
    /// Paste buffer in the import window
    pub import_text: String,
    /// Inline error shown after a rejected import
    pub import_error: Option<String>,
    /// Whether the export window is open
    pub show_export: bool,
    /// Pretty JSON shown in the export window
    pub export_text: String,
    /// Whether the clear-funnel confirmation is open
    pub show_clear_confirm: bool,
}

/// Messages sent from async file operations back to the main app.
#[derive(Debug)]
pub enum FileOperationResult {
    /// Export was written to the given path (or downloaded, on web)
    ExportCompleted(String),
    /// An import file was read: (file name, content)
    ImportLoaded(String, String),
    /// Operation failed with an error message
    OperationFailed(String),
}

/// Channel plumbing for async file dialogs.
pub struct FileState {
    /// Sender cloned into async file tasks
    pub sender: Option<Sender<FileOperationResult>>,
    /// Receiver drained once per frame
    pub receiver: Option<Receiver<FileOperationResult>>,
}

impl Default for FileState {
    fn default() -> Self {
        let (sender, receiver) = channel();
        Self {
            sender: Some(sender),
            receiver: Some(receiver),
        }
    }
}

/// Persisted UI preferences.
#[derive(Serialize, Deserialize)]
#[serde(default)]
pub struct UiPrefs {
    /// Whether dark mode visuals are enabled
    pub dark_mode: bool,
    /// Last canvas zoom factor
    pub zoom_factor: f32,
    /// Whether the background grid is drawn
    pub show_grid: bool,
}

impl Default for UiPrefs {
    fn default() -> Self {
        Self {
            dark_mode: true,
            zoom_factor: 1.0,
            show_grid: true,
        }
    }
}

/// The main application: the funnel store plus all UI state.
pub struct FunnelApp {
    /// The funnel document store
    pub store: FunnelStore,
    /// Canvas navigation and display state
    pub canvas: CanvasState,
    /// User interaction state
    pub interaction: InteractionState,
    /// Context menu state
    pub context_menu: ContextMenuState,
    /// Dialog state
    pub dialogs: DialogState,
    /// Async file operation plumbing
    pub file: FileState,
    /// Whether dark mode visuals are enabled
    pub dark_mode: bool,
}

impl Default for FunnelApp {
    fn default() -> Self {
        Self {
            store: FunnelStore::new(DEFAULT_STORAGE_KEY, None),
            canvas: CanvasState::default(),
            interaction: InteractionState::default(),
            context_menu: ContextMenuState::default(),
            dialogs: DialogState::default(),
            file: FileState::default(),
            dark_mode: true,
        }
    }
}

impl FunnelApp {
    /// Creates the app, restoring the persisted document and UI preferences
    /// when the storage backend has them.
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let mut app = Self::default();
        if let Some(storage) = cc.storage {
            if let Some(funnel) = persist::load_state(storage, DEFAULT_STORAGE_KEY) {
                app.store = FunnelStore::new(DEFAULT_STORAGE_KEY, Some(funnel));
            }
            if let Some(prefs) = storage
                .get_string(PREFS_STORAGE_KEY)
                .and_then(|json| serde_json::from_str::<UiPrefs>(&json).ok())
            {
                app.dark_mode = prefs.dark_mode;
                app.canvas.zoom_factor = prefs.zoom_factor;
                app.canvas.show_grid = prefs.show_grid;
            }
        }
        app
    }

    /// Current preferences snapshot for persistence.
    pub fn prefs(&self) -> UiPrefs {
        UiPrefs {
            dark_mode: self.dark_mode,
            zoom_factor: self.canvas.zoom_factor,
            show_grid: self.canvas.show_grid,
        }
    }
}

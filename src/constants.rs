//! Shared application-wide constants.
//! Centralizes tweakable values used across the store and UI.

// History
/// Maximum number of history snapshots to retain. Oldest entries are evicted first.
pub const MAX_HISTORY_ENTRIES: usize = 50;
/// Seconds of position-change inactivity after which a drag counts as settled
/// and a single history snapshot is taken.
pub const DRAG_SETTLE_SECS: f64 = 0.3;

// Persistence
/// Storage key the application passes to the store. The store itself takes the
/// key as a constructor argument.
pub const DEFAULT_STORAGE_KEY: &str = "funnel_document";
/// File name suggested for exported funnels.
pub const EXPORT_FILE_NAME: &str = "funnel.json";

// Node dimensions
/// Node card width in world units.
pub const NODE_WIDTH: f32 = 150.0;
/// Node card height in world units.
pub const NODE_HEIGHT: f32 = 88.0;
/// Radius of the output connection handle on a node's right edge (world units).
pub const HANDLE_RADIUS: f32 = 7.0;

// Grid/drawing
/// Grid cell size in world units.
pub const GRID_SIZE: f32 = 20.0;

// Canvas interactions
/// Hit threshold in world units for edge selection and click-vs-drag checks.
pub const CLICK_THRESHOLD: f32 = 10.0;
/// Lower zoom clamp.
pub const MIN_ZOOM: f32 = 0.25;
/// Upper zoom clamp.
pub const MAX_ZOOM: f32 = 5.0;

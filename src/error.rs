//! Error taxonomy for funnel document handling.

use thiserror::Error;

/// Errors surfaced by import/export operations.
///
/// Storage-read failures are deliberately not represented here: a missing or
/// corrupt persisted blob falls back to the default document and is only
/// logged (see [`crate::persist::load_state`]).
#[derive(Debug, Error)]
pub enum FunnelError {
    /// The import payload is not a funnel document (malformed JSON, or the
    /// `nodes`/`edges` fields are missing). The existing document is left
    /// untouched when this is returned.
    #[error("invalid funnel format: {0}")]
    ImportFormat(#[source] serde_json::Error),

    /// Serialization failed while exporting.
    #[error("failed to serialize funnel: {0}")]
    Serialize(#[source] serde_json::Error),
}

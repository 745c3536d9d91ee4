//! Error types for earshot-guide
//!
//! Module-specific error types using thiserror for clear error propagation.
//! All coordinator-level failures are local recoveries; nothing here is
//! fatal to the engine. Worst case is a missed playback trigger that the
//! next proximity evaluation re-attempts.

use thiserror::Error;

/// Main error type for the guide engine
#[derive(Error, Debug)]
pub enum Error {
    /// Shared errors from earshot-common (config, invalid location, IO)
    #[error(transparent)]
    Common(#[from] earshot_common::Error),

    /// Playback engine failed to start or stop a clip
    #[error("Playback error for POI {poi_id}: {cause}")]
    Playback {
        poi_id: uuid::Uuid,
        cause: String,
    },

    /// POI set file could not be parsed
    #[error("POI file error: {0}")]
    PoiFile(String),

    /// The coordinator task is gone and its mailbox is closed
    #[error("Coordinator unavailable: {0}")]
    CoordinatorGone(String),
}

/// Convenience Result type using the guide engine Error
pub type Result<T> = std::result::Result<T, Error>;

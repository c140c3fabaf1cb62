//! Unified error handling for the maptrail library.
//!
//! Provider-level failures are translated into one of these kinds at the point
//! where they occur. Nothing here is fatal: every kind leaves the owning state
//! machine in a rest state (`Idle` or `Failed`).

use thiserror::Error;

/// Shown when location settings cannot be fixed from inside the app.
pub const SETTINGS_UNSATISFIABLE_MESSAGE: &str =
    "Location settings are inadequate, and cannot be fixed here. Fix in Settings.";

/// Shown when the user rejects the location permission.
pub const PERMISSION_DENIED_MESSAGE: &str = "Permissions denied";

/// Shown when a download is confirmed without a region name.
pub const EMPTY_REGION_NAME_MESSAGE: &str = "Region name cannot be empty.";

/// Unified error type for maptrail operations.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// The user rejected the location permission
    #[error("location permission denied")]
    PermissionDenied,

    /// Device location settings cannot satisfy the requirements and cannot be
    /// changed from inside the app
    #[error("location settings cannot be satisfied")]
    SettingsUnsatisfiable,

    /// The user dismissed the settings resolution dialog
    #[error("location settings resolution cancelled")]
    ResolutionCancelled,

    /// The platform refused to launch the resolution dialog
    #[error("settings resolution could not be launched: {reason}")]
    ResolutionUnavailable { reason: String },

    /// The offline region store could not create the region
    #[error("offline region creation failed: {message}")]
    RegionCreationFailed { message: String },

    /// Region metadata could not be encoded; the download proceeds unnamed
    #[error("failed to encode region metadata: {message}")]
    MetadataEncodingFailed { message: String },

    /// A download was confirmed with an empty region name
    #[error("region name is empty")]
    EmptyRegionName,

    /// Key-value store failure
    #[error("persistence error: {message}")]
    Persistence { message: String },

    /// Track JSON could not be read or written
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl TrackerError {
    /// Short text for the hosting screen, if this kind is user-facing.
    pub fn user_message(&self) -> Option<&'static str> {
        match self {
            TrackerError::PermissionDenied => Some(PERMISSION_DENIED_MESSAGE),
            TrackerError::SettingsUnsatisfiable => Some(SETTINGS_UNSATISFIABLE_MESSAGE),
            TrackerError::EmptyRegionName => Some(EMPTY_REGION_NAME_MESSAGE),
            _ => None,
        }
    }

    /// Whether the user should be told about this failure.
    pub fn is_user_facing(&self) -> bool {
        self.user_message().is_some()
    }
}

#[cfg(feature = "persistence")]
impl From<rusqlite::Error> for TrackerError {
    fn from(e: rusqlite::Error) -> Self {
        TrackerError::Persistence {
            message: e.to_string(),
        }
    }
}

/// Result type alias for maptrail operations.
pub type Result<T> = std::result::Result<T, TrackerError>;

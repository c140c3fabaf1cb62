//! Configuration for location requests, track filtering and drawing.

use serde::{Deserialize, Serialize};

/// Request code used for the OS permission dialog.
pub const LOCATION_PERMISSION_REQUEST_CODE: i32 = 1;

/// Request code used for the location-settings resolution dialog.
pub const REQUEST_CHECK_SETTINGS: i32 = 3;

/// Desired power/accuracy trade-off of the location provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "ffi", derive(uniffi::Enum))]
pub enum LocationPriority {
    #[default]
    HighAccuracy,
    BalancedPowerAccuracy,
    LowPower,
    NoPower,
}

/// What the application asks of the location provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct LocationRequirements {
    pub priority: LocationPriority,
    /// Desired update interval. Inexact, updates may be more or less frequent.
    pub interval_ms: u64,
    /// Hard floor: updates never arrive more often than this.
    pub fastest_interval_ms: u64,
}

impl LocationRequirements {
    /// High-accuracy requirements with the floor at half the interval.
    pub fn with_interval(interval_ms: u64) -> Self {
        Self {
            priority: LocationPriority::HighAccuracy,
            interval_ms,
            fastest_interval_ms: interval_ms / 2,
        }
    }
}

impl Default for LocationRequirements {
    fn default() -> Self {
        Self::with_interval(5_000)
    }
}

/// Colors and sizes used when redrawing the track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct TrackStyle {
    pub line_color: String,
    pub line_width: f32,
    pub marker_color: String,
    pub marker_stroke_color: String,
    pub marker_radius: f32,
}

impl Default for TrackStyle {
    fn default() -> Self {
        Self {
            line_color: "#736357".to_string(),
            line_width: 4.0,
            marker_color: "#00a79d".to_string(),
            marker_stroke_color: "#027a73".to_string(),
            marker_radius: 8.0,
        }
    }
}

/// Configuration for the tracking core.
///
/// Missing JSON fields fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
#[serde(default)]
pub struct TrackerConfig {
    /// A fix must be farther than this from the last accepted point.
    /// Default: 1.0 meter
    pub min_distance_m: f64,

    /// Zoom used for the first point, or when the map reports no zoom.
    /// Default: 16.0
    pub default_zoom: f64,

    /// Location request handed to the provider.
    pub requirements: LocationRequirements,

    /// Track drawing style.
    pub style: TrackStyle,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            min_distance_m: 1.0,
            default_zoom: 16.0,
            requirements: LocationRequirements::default(),
            style: TrackStyle::default(),
        }
    }
}

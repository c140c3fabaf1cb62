//! # Maptrail
//!
//! Location acquisition, GPS track building and offline region downloads for
//! map-centric mobile screens.
//!
//! This library provides:
//! - A resumable permission / location-settings negotiation flow
//! - Distance-filtered track construction with camera continuity
//! - Track persistence as an ordered JSON list in a key-value store
//! - An offline region download state machine with progress reporting
//!
//! The map renderer, the OS location service and the offline tile store are
//! host collaborators reached through traits. Every provider result comes back
//! into the state machines as a tagged event.
//!
//! ## Features
//!
//! - **`persistence`** - SQLite-backed key-value store for saved tracks
//! - **`ffi`** - Enable FFI bindings for mobile platforms (iOS/Android)
//! - **`full`** - Enable all features
//!
//! ## Quick Start
//!
//! ```rust
//! use maptrail::{GeoFix, PathBuilder, TrackerConfig};
//!
//! let mut path = PathBuilder::new(TrackerConfig::default());
//!
//! let first = path.accept(&GeoFix::new(51.5074, -0.1278, 5.0, 0), None);
//! assert!(first.is_some());
//!
//! // Same spot again: filtered out by the minimum distance
//! let again = path.accept(&GeoFix::new(51.5074, -0.1278, 5.0, 1_000), Some(16.0));
//! assert!(again.is_none());
//! assert_eq!(path.len(), 1);
//! ```

use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{Result, TrackerError};

// Tunables: distance filter, zoom, location request, track style
pub mod config;
pub use config::{
    LocationPriority, LocationRequirements, TrackStyle, TrackerConfig,
    LOCATION_PERMISSION_REQUEST_CODE, REQUEST_CHECK_SETTINGS,
};

// Geographic utilities (distance, bounds)
pub mod geo_utils;

// Runtime permission handling
pub mod permission;
pub use permission::{AuthorizationResult, PermissionGate, PermissionPlatform};

// Location settings negotiation
pub mod settings;
pub use settings::{
    LocationSettingsOutcome, NegotiationStep, ResolutionHandle, ResolutionResult, SettingsClient,
    SettingsNegotiator,
};

// Per-screen location acquisition state machine
pub mod session;
pub use session::{
    FixDisposition, LocationAcquisitionSession, LocationConsumer, LocationPlatform,
    LocationProvider, Notifier, SessionEvent, SessionState, SubscriptionHandle,
};

// Track construction and redraw
pub mod path;
pub use path::{MapSurface, MarkerIcon, PathBuilder, TrackUpdate};

// Track persistence
pub mod store;
pub use store::{KeyValueStore, MemoryStore, TrackStore, PREF_SHAPE};
#[cfg(feature = "persistence")]
pub use store::SqliteStore;

// Screen composition: path + surface + store
pub mod screen;
pub use screen::{CameraCentering, TrackingScreen};

// Offline region downloads
pub mod offline;
pub use offline::{
    DownloadEvent, DownloadProgress, DownloadRegion, DownloadState, OfflineRegionDownloadSession,
    OfflineRegionStore, RegionCatalog, RegionId, RegionStatus, StoredRegion,
};

// Message-passing event loop for provider continuations
pub mod driver;
pub use driver::{EventLoop, EventSender, StateMachine};

// Global tracking engine (singleton used by the FFI layer)
pub mod engine;
pub use engine::{with_engine, TrackEngine, ENGINE};

// FFI bindings for mobile platforms (iOS/Android)
#[cfg(feature = "ffi")]
pub mod ffi;

#[cfg(feature = "ffi")]
uniffi::setup_scaffolding!();

/// Initialize logging for Android.
#[cfg(target_os = "android")]
pub fn init_logging() {
    use android_logger::Config;
    use log::LevelFilter;

    android_logger::init_once(
        Config::default()
            .with_max_level(LevelFilter::Debug)
            .with_tag("maptrail"),
    );
}

/// No-op on non-Android platforms; the host installs its own logger.
#[cfg(not(target_os = "android"))]
pub fn init_logging() {}

// ============================================================================
// Core Types
// ============================================================================

/// A geographic coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct LatLng {
    pub latitude: f64,
    pub longitude: f64,
}

impl LatLng {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Check if the point has valid coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// A single raw reading from the device positioning subsystem.
///
/// Fixes are never retained: each one either becomes a [`TrackPoint`] or is
/// dropped.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct GeoFix {
    pub latitude: f64,
    pub longitude: f64,
    /// Horizontal accuracy radius in meters
    pub accuracy: f32,
    /// Milliseconds since the Unix epoch
    pub timestamp_ms: i64,
}

impl GeoFix {
    pub fn new(latitude: f64, longitude: f64, accuracy: f32, timestamp_ms: i64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy,
            timestamp_ms,
        }
    }

    pub fn position(&self) -> LatLng {
        LatLng::new(self.latitude, self.longitude)
    }
}

/// An accepted point of the track.
///
/// Serialized as `{"latitude": .., "longitude": .., "accuracy": ..}`; the
/// display label is derived and never stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct TrackPoint {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub accuracy: f32,
}

impl TrackPoint {
    pub fn new(latitude: f64, longitude: f64, accuracy: f32) -> Self {
        Self {
            latitude,
            longitude,
            accuracy,
        }
    }

    pub fn position(&self) -> LatLng {
        LatLng::new(self.latitude, self.longitude)
    }

    /// Marker title combining coordinates and accuracy.
    pub fn title(&self) -> String {
        format!(
            "Loc: {}, {}, acc: {}",
            self.latitude, self.longitude, self.accuracy
        )
    }
}

impl From<&GeoFix> for TrackPoint {
    fn from(fix: &GeoFix) -> Self {
        Self::new(fix.latitude, fix.longitude, fix.accuracy)
    }
}

/// Where the map camera should look after a track update.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct CameraTarget {
    pub target: LatLng,
    pub zoom: f64,
}

impl CameraTarget {
    pub fn new(target: LatLng, zoom: f64) -> Self {
        Self { target, zoom }
    }
}

/// A latitude/longitude rectangle, as reported by the map's visible region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct LatLngBounds {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl LatLngBounds {
    pub fn new(north: f64, south: f64, east: f64, west: f64) -> Self {
        Self {
            north,
            south,
            east,
            west,
        }
    }

    /// Get the center point of the bounds.
    pub fn center(&self) -> LatLng {
        geo_utils::bounds_center(self)
    }
}

// ============================================================================
// Tests
// ============================================================================

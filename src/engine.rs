//! # Track Engine
//!
//! Surface-less track state for hosts that draw the map themselves and only
//! want the distance filter, camera decisions and track JSON. A global
//! instance backs the FFI layer so the track never crosses the boundary
//! except as JSON.

use std::sync::Mutex;

use once_cell::sync::Lazy;

use crate::error::Result;
use crate::path::{PathBuilder, TrackUpdate};
use crate::{GeoFix, TrackPoint, TrackerConfig};

/// Track state plus the last camera zoom seen by the host.
#[derive(Debug, Clone)]
pub struct TrackEngine {
    path: PathBuilder,
    camera_zoom: Option<f64>,
}

impl Default for TrackEngine {
    fn default() -> Self {
        Self::new(TrackerConfig::default())
    }
}

impl TrackEngine {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            path: PathBuilder::new(config),
            camera_zoom: None,
        }
    }

    /// Swap the configuration. The track and camera pin are kept.
    pub fn configure(&mut self, config: TrackerConfig) {
        let points = self.path.serialize();
        let pinned = self.path.has_manual_override();
        self.path = PathBuilder::new(config);
        self.path.replace(points);
        if pinned {
            self.path.set_manual_override();
        }
    }

    /// Offer a fix. The returned camera (if any) becomes the zoom reference
    /// for the next fix.
    pub fn accept_fix(&mut self, fix: &GeoFix) -> Option<TrackUpdate> {
        let update = self.path.accept(fix, self.camera_zoom)?;
        if let Some(camera) = update.camera {
            self.camera_zoom = Some(camera.zoom);
        }
        Some(update)
    }

    /// Record a zoom change made by the user.
    pub fn set_camera_zoom(&mut self, zoom: f64) {
        self.camera_zoom = Some(zoom);
    }

    pub fn set_manual_override(&mut self) {
        self.path.set_manual_override();
    }

    pub fn get_track_json(&self) -> String {
        serde_json::to_string(self.path.points()).unwrap_or_else(|_| "[]".to_string())
    }

    /// Replace the track from saved JSON. An empty string leaves the track
    /// untouched.
    pub fn restore_json(&mut self, json: &str) -> Result<usize> {
        if json.is_empty() {
            return Ok(0);
        }
        let points: Vec<TrackPoint> = serde_json::from_str(json)?;
        let count = points.len();
        self.path.replace(points);
        Ok(count)
    }

    /// Forget the track, the zoom reference and the camera pin.
    pub fn clear(&mut self) {
        *self = Self::new(self.path.config().clone());
    }

    pub fn path(&self) -> &PathBuilder {
        &self.path
    }

    pub fn point_count(&self) -> usize {
        self.path.len()
    }
}

// ============================================================================
// Global Singleton
// ============================================================================

/// Global engine instance.
pub static ENGINE: Lazy<Mutex<TrackEngine>> = Lazy::new(|| Mutex::new(TrackEngine::default()));

/// Get a lock on the global engine, recovering it if poisoned.
pub fn with_engine<F, R>(f: F) -> R
where
    F: FnOnce(&mut TrackEngine) -> R,
{
    let mut engine = ENGINE.lock().unwrap_or_else(|e| e.into_inner());
    f(&mut engine)
}

// ============================================================================
// FFI Exports
// ============================================================================

#[cfg(feature = "ffi")]
pub mod engine_ffi {
    use super::*;
    use log::{info, warn};

    /// Initialize the engine (call once at app startup).
    #[uniffi::export]
    pub fn tracker_init(config: TrackerConfig) {
        crate::init_logging();
        with_engine(|e| e.configure(config));
        info!("[TrackEngine] Initialized");
    }

    /// Offer a fix. Returns the accepted point and camera move, if any.
    #[uniffi::export]
    pub fn tracker_accept_fix(fix: GeoFix) -> Option<TrackUpdate> {
        with_engine(|e| e.accept_fix(&fix))
    }

    /// Record a user zoom change.
    #[uniffi::export]
    pub fn tracker_set_camera_zoom(zoom: f64) {
        with_engine(|e| e.set_camera_zoom(zoom));
    }

    /// Get the track as the saved-shape JSON array.
    #[uniffi::export]
    pub fn tracker_get_track_json() -> String {
        with_engine(|e| e.get_track_json())
    }

    /// Replace the track from saved JSON. Returns the number of points, or
    /// 0 when the JSON could not be read.
    #[uniffi::export]
    pub fn tracker_restore_json(json: String) -> u32 {
        match with_engine(|e| e.restore_json(&json)) {
            Ok(count) => {
                info!("[TrackEngine] Restored {} points", count);
                count as u32
            }
            Err(e) => {
                warn!("[TrackEngine] Failed to restore track: {}", e);
                0
            }
        }
    }

    /// Stop moving the camera for new points.
    #[uniffi::export]
    pub fn tracker_set_manual_override() {
        with_engine(|e| e.set_manual_override());
    }

    /// Current track points.
    #[uniffi::export]
    pub fn tracker_get_points() -> Vec<TrackPoint> {
        with_engine(|e| e.path().serialize())
    }

    /// Clear all engine state.
    #[uniffi::export]
    pub fn tracker_clear() {
        with_engine(|e| e.clear());
        info!("[TrackEngine] Cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fix(lon: f64) -> GeoFix {
        GeoFix::new(0.0, lon, 5.0, 0)
    }

    #[test]
    fn test_zoom_reference_follows_camera() {
        let mut engine = TrackEngine::default();
        let first = engine.accept_fix(&fix(0.0)).unwrap();
        assert_eq!(first.camera.unwrap().zoom, 16.0);

        engine.set_camera_zoom(12.0);
        let second = engine.accept_fix(&fix(0.001)).unwrap();
        assert_eq!(second.camera.unwrap().zoom, 12.0);
    }

    #[test]
    fn test_json_roundtrip() {
        let mut engine = TrackEngine::default();
        engine.accept_fix(&fix(0.0));
        engine.accept_fix(&fix(0.001));
        let json = engine.get_track_json();

        let mut other = TrackEngine::default();
        assert_eq!(other.restore_json(&json).unwrap(), 2);
        assert_eq!(other.path().points(), engine.path().points());
        assert_eq!(other.restore_json("").unwrap(), 0);
        assert_eq!(other.point_count(), 2);
        assert!(other.restore_json("[{").is_err());
    }

    #[test]
    fn test_configure_keeps_track_and_pin() {
        let mut engine = TrackEngine::default();
        engine.accept_fix(&fix(0.0));
        engine.set_manual_override();
        engine.configure(TrackerConfig {
            min_distance_m: 500.0,
            ..TrackerConfig::default()
        });
        assert_eq!(engine.point_count(), 1);
        assert!(engine.path().has_manual_override());
        // ~111m, now under the threshold
        assert!(engine.accept_fix(&fix(0.001)).is_none());
    }

    #[test]
    fn test_clear() {
        let mut engine = TrackEngine::default();
        engine.accept_fix(&fix(0.0));
        engine.set_manual_override();
        engine.clear();
        assert_eq!(engine.point_count(), 0);
        assert!(!engine.path().has_manual_override());
        assert_eq!(engine.get_track_json(), "[]");
    }

    #[test]
    fn test_global_engine() {
        with_engine(|e| e.clear());
        let accepted = with_engine(|e| e.accept_fix(&fix(10.0)).is_some());
        assert!(accepted);
        with_engine(|e| e.clear());
    }
}

//! FFI bindings for mobile platforms (iOS/Android).
//!
//! Stateless helpers the host screens call directly. Track state lives in
//! [`crate::engine::engine_ffi`].

use log::{debug, info};

use crate::geo_utils::haversine_distance;
use crate::offline::{decode_region_name, encode_metadata, DownloadProgress, RegionStatus};
use crate::{init_logging, CameraTarget, LatLng, LatLngBounds, TrackerConfig};

/// Default configuration, for hosts that want to tweak one field.
#[uniffi::export]
pub fn default_tracker_config() -> TrackerConfig {
    TrackerConfig::default()
}

/// Great-circle distance in meters.
#[uniffi::export]
pub fn distance_between(a: LatLng, b: LatLng) -> f64 {
    haversine_distance(&a, &b)
}

/// Metadata blob to store with a new region. Empty when encoding fails.
#[uniffi::export]
pub fn region_metadata_for_name(name: String) -> Vec<u8> {
    init_logging();
    encode_metadata(&name).unwrap_or_default()
}

/// Region name from its metadata blob, or `None` when unreadable.
#[uniffi::export]
pub fn region_name_from_metadata(metadata: Vec<u8>) -> Option<String> {
    match decode_region_name(&metadata) {
        Ok(name) => Some(name),
        Err(e) => {
            debug!("[MaptrailFfi] Unreadable region metadata: {}", e);
            None
        }
    }
}

/// Camera target that frames a stored region.
#[uniffi::export]
pub fn region_camera_target(bounds: LatLngBounds, min_zoom: f64) -> CameraTarget {
    CameraTarget::new(bounds.center(), min_zoom)
}

/// Displayed percentage for a status tick, `None` while indeterminate.
#[uniffi::export]
pub fn download_percent(
    completed_resource_count: u64,
    required_resource_count: i64,
    completed_resource_size: u64,
    required_resource_count_is_precise: bool,
) -> Option<u8> {
    let mut progress = DownloadProgress::default();
    let status = RegionStatus {
        completed_resource_count,
        required_resource_count,
        completed_resource_size,
        required_resource_count_is_precise,
        complete: false,
    };
    progress.apply(&status);
    info!("[MaptrailFfi] {}", progress.summary());
    progress.percent
}

//! Region definitions and the metadata blob stored with each region.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TrackerError};
use crate::path::MapSurface;
use crate::LatLngBounds;

/// Identifier assigned by the tile store on creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegionId(pub i64);

/// What to download: style, bounds and zoom range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadRegion {
    pub style_url: String,
    pub bounds: LatLngBounds,
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub pixel_ratio: f32,
}

impl DownloadRegion {
    /// Describe what the map currently shows, from the current zoom up to the
    /// source's maximum.
    pub fn from_surface(surface: &impl MapSurface, fallback_zoom: f64) -> Self {
        let max_zoom = surface.max_zoom();
        let min_zoom = surface.camera_zoom().unwrap_or(fallback_zoom).min(max_zoom);
        Self {
            style_url: surface.style_url(),
            bounds: surface.visible_bounds(),
            min_zoom,
            max_zoom,
            pixel_ratio: surface.pixel_ratio(),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct RegionMetadata {
    #[serde(rename = "FIELD_REGION_NAME")]
    region_name: String,
}

/// Encode a region name as the UTF-8 JSON metadata blob.
pub fn encode_metadata(name: &str) -> Result<Vec<u8>> {
    serde_json::to_vec(&RegionMetadata {
        region_name: name.to_string(),
    })
    .map_err(|e| TrackerError::MetadataEncodingFailed {
        message: e.to_string(),
    })
}

/// Decode the region name from a metadata blob.
pub fn decode_region_name(metadata: &[u8]) -> Result<String> {
    let text = std::str::from_utf8(metadata).map_err(|e| TrackerError::MetadataEncodingFailed {
        message: e.to_string(),
    })?;
    let parsed: RegionMetadata = serde_json::from_str(text)?;
    Ok(parsed.region_name)
}

/// Region as listed back from the tile store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRegion {
    pub id: RegionId,
    pub definition: DownloadRegion,
    pub metadata: Option<Vec<u8>>,
}

impl StoredRegion {
    /// Display name, or `fallback` with `{id}` replaced when the metadata is
    /// missing or unreadable.
    pub fn name(&self, fallback: &str) -> String {
        let decoded = match self.metadata.as_deref() {
            Some(bytes) => decode_region_name(bytes),
            None => Err(TrackerError::MetadataEncodingFailed {
                message: "no metadata".to_string(),
            }),
        };
        match decoded {
            Ok(name) => name,
            Err(e) => {
                warn!(
                    "[OfflineRegion] Failed to decode metadata for region {}: {}",
                    self.id.0, e
                );
                fallback.replace("{id}", &self.id.0.to_string())
            }
        }
    }
}

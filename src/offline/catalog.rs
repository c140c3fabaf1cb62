//! Listing of regions already stored on the device.

use log::{error, info};

use super::region::StoredRegion;

/// Name used for regions whose metadata cannot be read. `{id}` is replaced
/// with the region id.
pub const DEFAULT_REGION_NAME: &str = "Region {id}";

/// Shown when the device has no stored regions.
pub const NO_REGIONS_MESSAGE: &str = "You have no regions yet.";

/// Stored regions in listing order, with their display names.
#[derive(Debug, Clone, Default)]
pub struct RegionCatalog {
    regions: Vec<StoredRegion>,
    names: Vec<String>,
}

impl RegionCatalog {
    pub fn new(regions: Vec<StoredRegion>) -> Self {
        Self::with_fallback_name(regions, DEFAULT_REGION_NAME)
    }

    pub fn with_fallback_name(regions: Vec<StoredRegion>, fallback: &str) -> Self {
        let names = regions.iter().map(|r| r.name(fallback)).collect();
        Self { regions, names }
    }

    /// Build from the store's listing callback. A failed listing is logged
    /// and yields an empty catalog.
    pub fn from_listing(result: Result<Vec<StoredRegion>, String>) -> Self {
        match result {
            Ok(regions) => {
                info!("[RegionCatalog] {} stored regions", regions.len());
                Self::new(regions)
            }
            Err(message) => {
                error!("[RegionCatalog] Error listing regions: {}", message);
                Self::default()
            }
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Region behind the name at `index` in [`Self::names`].
    pub fn select(&self, index: usize) -> Option<&StoredRegion> {
        self.regions.get(index)
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

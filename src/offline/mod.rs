//! Offline map region downloads.
//!
//! - [`region`] - region definitions and the name metadata blob
//! - [`progress`] - status ticks and the displayed progress
//! - [`download`] - the download state machine
//! - [`catalog`] - regions already on the device

pub mod catalog;
pub mod download;
pub mod progress;
pub mod region;

pub use catalog::{RegionCatalog, DEFAULT_REGION_NAME, NO_REGIONS_MESSAGE};
pub use download::{
    DownloadEvent, DownloadState, OfflineRegionDownloadSession, OfflineRegionStore,
    DOWNLOAD_COMPLETE_MESSAGE,
};
pub use progress::{DownloadProgress, RegionStatus};
pub use region::{decode_region_name, encode_metadata, DownloadRegion, RegionId, StoredRegion};

//! # Offline Region Download
//!
//! One download per session, driven by tagged [`DownloadEvent`]s:
//!
//! ```text
//! Idle -> Defining -> Creating -> Downloading -> Complete
//!                        |
//!                        +-> Failed
//! ```
//!
//! Completion is announced exactly once per download even when the tile
//! store keeps reporting a complete status afterwards.

use log::{debug, error, info, warn};

use super::catalog::{RegionCatalog, NO_REGIONS_MESSAGE};
use super::progress::{DownloadProgress, RegionStatus};
use super::region::{encode_metadata, DownloadRegion, RegionId, StoredRegion};
use crate::error::TrackerError;
use crate::session::Notifier;

/// Shown once when a region finishes downloading.
pub const DOWNLOAD_COMPLETE_MESSAGE: &str = "Region downloaded successfully.";

/// Offline tile store, implemented by the host.
///
/// Every call is asynchronous: results come back as [`DownloadEvent`]s.
pub trait OfflineRegionStore {
    fn create_region(&mut self, definition: &DownloadRegion, metadata: Option<Vec<u8>>);
    fn set_observer(&mut self, region: RegionId);
    fn set_download_active(&mut self, region: RegionId, active: bool);
    /// Answered with [`DownloadEvent::RegionsListed`].
    fn list_regions(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Enum))]
pub enum DownloadState {
    Idle,
    Defining,
    Creating,
    Downloading,
    Complete,
    Failed,
}

/// Inputs to the download session.
#[derive(Debug, Clone, PartialEq)]
pub enum DownloadEvent {
    /// The user confirmed a name for the region currently on screen.
    Confirmed {
        name: String,
        definition: DownloadRegion,
    },
    /// The store created the region.
    RegionCreated(StoredRegion),
    /// The store could not create the region.
    CreationFailed(String),
    /// Progress tick from the region observer.
    StatusChanged(RegionStatus),
    /// The observer reported a resource error.
    ObserverError { reason: String, message: String },
    /// The tile store refused more tiles.
    TileLimitExceeded(u64),
    /// Regions already on the device, or why they could not be listed.
    RegionsListed(Result<Vec<StoredRegion>, String>),
}

impl DownloadEvent {
    fn name(&self) -> &'static str {
        match self {
            DownloadEvent::Confirmed { .. } => "Confirmed",
            DownloadEvent::RegionCreated(_) => "RegionCreated",
            DownloadEvent::CreationFailed(_) => "CreationFailed",
            DownloadEvent::StatusChanged(_) => "StatusChanged",
            DownloadEvent::ObserverError { .. } => "ObserverError",
            DownloadEvent::TileLimitExceeded(_) => "TileLimitExceeded",
            DownloadEvent::RegionsListed(_) => "RegionsListed",
        }
    }
}

pub struct OfflineRegionDownloadSession<R, N> {
    store: R,
    notifier: N,
    state: DownloadState,
    region: Option<StoredRegion>,
    catalog: RegionCatalog,
    progress: DownloadProgress,
    /// Set once completion has been announced for the current download.
    end_notified: bool,
    last_error: Option<TrackerError>,
}

impl<R: OfflineRegionStore, N: Notifier> OfflineRegionDownloadSession<R, N> {
    pub fn new(store: R, notifier: N) -> Self {
        Self {
            store,
            notifier,
            state: DownloadState::Idle,
            region: None,
            catalog: RegionCatalog::default(),
            progress: DownloadProgress::default(),
            end_notified: false,
            last_error: None,
        }
    }

    /// Ask the store for the regions already on the device. The answer
    /// arrives as [`DownloadEvent::RegionsListed`] and replaces
    /// [`Self::catalog`]. Listing never changes the download state.
    pub fn request_catalog(&mut self) {
        self.store.list_regions();
    }

    /// Apply one event and return the resulting state.
    pub fn handle(&mut self, event: DownloadEvent) -> DownloadState {
        let before = self.state;
        let name = event.name();

        match event {
            DownloadEvent::Confirmed { name, definition } => self.on_confirmed(name, definition),
            DownloadEvent::RegionCreated(region) => self.on_created(region),
            DownloadEvent::CreationFailed(message) => self.on_creation_failed(message),
            DownloadEvent::StatusChanged(status) => self.on_status(status),
            DownloadEvent::ObserverError { reason, message } => {
                error!("[OfflineDownload] onError reason: {}", reason);
                error!("[OfflineDownload] onError message: {}", message);
            }
            DownloadEvent::TileLimitExceeded(limit) => {
                error!("[OfflineDownload] Mapbox tile count limit exceeded: {}", limit);
            }
            DownloadEvent::RegionsListed(result) => self.on_listed(result),
        }

        if before != self.state {
            info!("[OfflineDownload] {:?} -> {:?} on {}", before, self.state, name);
        }
        self.state
    }

    /// Whether a new download may be confirmed. The download control is
    /// disabled while one is in flight.
    pub fn can_start(&self) -> bool {
        matches!(
            self.state,
            DownloadState::Idle | DownloadState::Complete | DownloadState::Failed
        )
    }

    pub fn state(&self) -> DownloadState {
        self.state
    }

    pub fn progress(&self) -> &DownloadProgress {
        &self.progress
    }

    /// Region being (or last) downloaded.
    pub fn region(&self) -> Option<&StoredRegion> {
        self.region.as_ref()
    }

    /// Regions from the last listing.
    pub fn catalog(&self) -> &RegionCatalog {
        &self.catalog
    }

    pub fn last_error(&self) -> Option<&TrackerError> {
        self.last_error.as_ref()
    }

    pub fn store(&self) -> &R {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut R {
        &mut self.store
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    // ------------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------------

    fn on_confirmed(&mut self, name: String, definition: DownloadRegion) {
        if !self.can_start() {
            debug!("[OfflineDownload] Confirm ignored while {:?}", self.state);
            return;
        }
        if name.is_empty() {
            self.reject(TrackerError::EmptyRegionName);
            return;
        }

        self.state = DownloadState::Defining;
        self.region = None;
        self.progress = DownloadProgress::default();
        self.end_notified = false;
        self.last_error = None;

        let metadata = match encode_metadata(&name) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!("[OfflineDownload] Creating region without a name: {}", e);
                None
            }
        };

        info!(
            "[OfflineDownload] Creating region '{}' zoom {:.1}-{:.1}",
            name, definition.min_zoom, definition.max_zoom
        );
        self.state = DownloadState::Creating;
        self.store.create_region(&definition, metadata);
    }

    fn on_created(&mut self, region: StoredRegion) {
        if self.state != DownloadState::Creating {
            debug!(
                "[OfflineDownload] Region {} created while {:?}, ignoring",
                region.id.0, self.state
            );
            return;
        }
        let id = region.id;
        self.region = Some(region);
        self.state = DownloadState::Downloading;
        self.store.set_observer(id);
        self.store.set_download_active(id, true);
    }

    fn on_creation_failed(&mut self, message: String) {
        if self.state != DownloadState::Creating {
            return;
        }
        let err = TrackerError::RegionCreationFailed { message };
        error!("[OfflineDownload] {}", err);
        self.state = DownloadState::Failed;
        self.last_error = Some(err);
    }

    fn on_listed(&mut self, result: Result<Vec<StoredRegion>, String>) {
        self.catalog = RegionCatalog::from_listing(result);
        if self.catalog.is_empty() {
            self.notifier.notify(NO_REGIONS_MESSAGE);
        }
    }

    /// Refuse a request without leaving the current state.
    fn reject(&mut self, err: TrackerError) {
        match err.user_message() {
            Some(message) => self.notifier.notify(message),
            None => warn!("[OfflineDownload] {}", err),
        }
        self.last_error = Some(err);
    }

    fn on_status(&mut self, status: RegionStatus) {
        if self.state != DownloadState::Downloading {
            debug!("[OfflineDownload] Status tick ignored while {:?}", self.state);
            return;
        }

        self.progress.apply(&status);

        if status.complete {
            if !self.end_notified {
                self.end_notified = true;
                self.state = DownloadState::Complete;
                self.notifier.notify(DOWNLOAD_COMPLETE_MESSAGE);
            }
            return;
        }

        debug!("[OfflineDownload] {}", self.progress.summary());
    }
}

//! Screen-level composition of the tracking core.
//!
//! [`TrackingScreen`] is the consumer plugged into a
//! [`crate::LocationAcquisitionSession`] on the live-tracking screen: it feeds
//! fixes to a [`PathBuilder`], moves the camera, redraws, and serves the
//! save / load / jump-to-region commands. [`CameraCentering`] is the consumer
//! for the region download screen, which only wants to center once.

use log::{debug, info};

use crate::error::Result;
use crate::offline::StoredRegion;
use crate::path::{MapSurface, PathBuilder};
use crate::session::{FixDisposition, LocationConsumer, Notifier};
use crate::store::{KeyValueStore, TrackStore};
use crate::{CameraTarget, GeoFix, TrackerConfig};

pub const SHAPE_SAVED_MESSAGE: &str = "Shape saved";
pub const LOADING_SHAPE_MESSAGE: &str = "Loading shape";

/// Live-tracking screen: path, map surface and saved-track slot.
pub struct TrackingScreen<S, K, N> {
    path: PathBuilder,
    surface: S,
    store: TrackStore<K>,
    notifier: N,
}

impl<S: MapSurface, K: KeyValueStore, N: Notifier> TrackingScreen<S, K, N> {
    pub fn new(config: TrackerConfig, surface: S, store: K, notifier: N) -> Self {
        Self {
            path: PathBuilder::new(config),
            surface,
            store: TrackStore::new(store),
            notifier,
        }
    }

    /// Save the current track. Nothing is written for an empty track.
    pub fn save_track(&mut self) -> Result<bool> {
        if self.path.is_empty() {
            return Ok(false);
        }
        self.store.save(self.path.points())?;
        self.notifier.notify(SHAPE_SAVED_MESSAGE);
        Ok(true)
    }

    /// Replace the track with the saved one and redraw. The camera stays put.
    pub fn load_track(&mut self) -> Result<bool> {
        let Some(points) = self.store.load()? else {
            return Ok(false);
        };
        self.notifier.notify(LOADING_SHAPE_MESSAGE);
        info!("[TrackingScreen] Restoring {} saved points", points.len());
        self.path.restore(points, &mut self.surface);
        Ok(true)
    }

    /// Jump to a downloaded region and stop following new fixes with the camera.
    pub fn select_region(&mut self, region: &StoredRegion) {
        let definition = &region.definition;
        let target = CameraTarget::new(definition.bounds.center(), definition.min_zoom);
        self.surface.move_camera(&target);
        self.path.set_manual_override();
        info!(
            "[TrackingScreen] Region {} selected, camera pinned",
            region.id.0
        );
    }

    pub fn path(&self) -> &PathBuilder {
        &self.path
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn store(&self) -> &TrackStore<K> {
        &self.store
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }
}

impl<S: MapSurface, K: KeyValueStore, N: Notifier> LocationConsumer for TrackingScreen<S, K, N> {
    fn on_fix(&mut self, fix: &GeoFix) -> FixDisposition {
        let zoom = self.surface.camera_zoom();
        if let Some(update) = self.path.accept(fix, zoom) {
            if let Some(camera) = update.camera {
                self.surface.move_camera(&camera);
            }
            self.path.redraw(&mut self.surface);
        }
        FixDisposition::Continue
    }
}

/// Centers the camera on the first fix, then asks to unsubscribe.
pub struct CameraCentering<S> {
    surface: S,
    fallback_zoom: f64,
    centered: bool,
}

impl<S: MapSurface> CameraCentering<S> {
    pub fn new(surface: S, fallback_zoom: f64) -> Self {
        Self {
            surface,
            fallback_zoom,
            centered: false,
        }
    }

    pub fn is_centered(&self) -> bool {
        self.centered
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }
}

impl<S: MapSurface> LocationConsumer for CameraCentering<S> {
    fn on_fix(&mut self, fix: &GeoFix) -> FixDisposition {
        if !fix.position().is_valid() {
            debug!("[CameraCentering] Ignoring invalid fix");
            return FixDisposition::Continue;
        }
        let zoom = self
            .surface
            .camera_zoom()
            .filter(|z| z.is_finite() && *z != 0.0)
            .unwrap_or(self.fallback_zoom);
        self.surface
            .move_camera(&CameraTarget::new(fix.position(), zoom));
        self.centered = true;
        FixDisposition::Unsubscribe
    }
}

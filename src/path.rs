//! # Path Builder
//!
//! Turns raw fixes into an ordered track and decides where the camera goes.
//!
//! A fix becomes a [`TrackPoint`] only when it is farther than
//! `min_distance_m` from the last accepted point. Every accepted point
//! triggers a full redraw: one polyline plus one marker per point, all
//! markers sharing one icon. There is no incremental diffing.

use log::debug;

use crate::config::{TrackStyle, TrackerConfig};
use crate::geo_utils::haversine_distance;
use crate::{CameraTarget, GeoFix, LatLng, LatLngBounds, TrackPoint};

// ============================================================================
// Map Surface
// ============================================================================

/// Marker icon, rendered once by the host and shared by all markers. Markers
/// are anchored at their center.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerIcon {
    pub fill_color: String,
    pub stroke_color: String,
    pub radius: f32,
}

impl From<&TrackStyle> for MarkerIcon {
    fn from(style: &TrackStyle) -> Self {
        Self {
            fill_color: style.marker_color.clone(),
            stroke_color: style.marker_stroke_color.clone(),
            radius: style.marker_radius,
        }
    }
}

/// Host map renderer.
pub trait MapSurface {
    fn clear(&mut self);
    fn draw_polyline(&mut self, points: &[LatLng], color: &str, width: f32);
    fn draw_marker(&mut self, point: LatLng, icon: &MarkerIcon, title: &str);
    fn move_camera(&mut self, target: &CameraTarget);

    /// Current camera zoom, `None` before the camera has a position.
    fn camera_zoom(&self) -> Option<f64>;
    fn visible_bounds(&self) -> LatLngBounds;

    /// Style the map is drawn with.
    fn style_url(&self) -> String;
    /// Highest zoom the tile source offers.
    fn max_zoom(&self) -> f64;
    /// Device pixel density.
    fn pixel_ratio(&self) -> f32;
}

// ============================================================================
// Path Builder
// ============================================================================

/// Result of accepting a fix.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct TrackUpdate {
    pub point: TrackPoint,
    /// `None` while a manually selected region pins the camera.
    pub camera: Option<CameraTarget>,
}

/// Incrementally built track for one screen.
#[derive(Debug, Clone)]
pub struct PathBuilder {
    config: TrackerConfig,
    icon: MarkerIcon,
    points: Vec<TrackPoint>,
    manual_override: bool,
}

impl PathBuilder {
    pub fn new(config: TrackerConfig) -> Self {
        let icon = MarkerIcon::from(&config.style);
        Self {
            config,
            icon,
            points: Vec::new(),
            manual_override: false,
        }
    }

    /// Offer a fix to the track.
    ///
    /// `camera_zoom` is the map's current zoom. It is kept for every point
    /// after the first, unless it is zero or unknown.
    pub fn accept(&mut self, fix: &GeoFix, camera_zoom: Option<f64>) -> Option<TrackUpdate> {
        let position = fix.position();
        if !position.is_valid() {
            debug!("[PathBuilder] Rejecting invalid fix {:?}", position);
            return None;
        }

        let previous = self.points.last().map(TrackPoint::position);
        if let Some(prev) = previous {
            let distance = haversine_distance(&prev, &position);
            if distance <= self.config.min_distance_m {
                debug!(
                    "[PathBuilder] Rejecting fix {:.1}m from last point (min {:.1}m)",
                    distance, self.config.min_distance_m
                );
                return None;
            }
        }

        let point = TrackPoint::from(fix);
        self.points.push(point);
        debug!(
            "[PathBuilder] Accepted point #{} ({:.6}, {:.6}) acc {:.1}m",
            self.points.len(),
            point.latitude,
            point.longitude,
            point.accuracy
        );

        let camera = if self.manual_override {
            None
        } else {
            let zoom = match (previous, camera_zoom) {
                (Some(_), Some(z)) if z.is_finite() && z != 0.0 => z,
                _ => self.config.default_zoom,
            };
            Some(CameraTarget::new(position, zoom))
        };

        Some(TrackUpdate { point, camera })
    }

    /// Rebuild the whole path on the surface.
    pub fn redraw(&self, surface: &mut impl MapSurface) {
        surface.clear();
        let line: Vec<LatLng> = self.points.iter().map(TrackPoint::position).collect();
        surface.draw_polyline(&line, &self.config.style.line_color, self.config.style.line_width);
        for point in &self.points {
            surface.draw_marker(point.position(), &self.icon, &point.title());
        }
    }

    /// Ordered copy of the track for persistence.
    pub fn serialize(&self) -> Vec<TrackPoint> {
        self.points.clone()
    }

    /// Replace the track wholesale and redraw once.
    ///
    /// Camera targets are not replayed for restored points.
    pub fn restore(&mut self, points: Vec<TrackPoint>, surface: &mut impl MapSurface) {
        self.replace(points);
        self.redraw(surface);
    }

    /// Replace the track without drawing.
    pub fn replace(&mut self, points: Vec<TrackPoint>) {
        self.points = points;
    }

    /// Pin the camera: from now on accepted points never move it.
    pub fn set_manual_override(&mut self) {
        self.manual_override = true;
    }

    pub fn has_manual_override(&self) -> bool {
        self.manual_override
    }

    pub fn points(&self) -> &[TrackPoint] {
        &self.points
    }

    pub fn last(&self) -> Option<&TrackPoint> {
        self.points.last()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn icon(&self) -> &MarkerIcon {
        &self.icon
    }
}

// ============================================================================
// Tests
// ============================================================================

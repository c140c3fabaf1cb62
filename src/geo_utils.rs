//! Geographic utilities: great-circle distance and bounds helpers.

use geo::{Coord, Distance, Haversine, Point, Rect};

use crate::{LatLng, LatLngBounds};

/// Great-circle distance between two coordinates in meters.
///
/// # Example
/// ```
/// use maptrail::LatLng;
/// use maptrail::geo_utils::haversine_distance;
///
/// let london = LatLng::new(51.5074, -0.1278);
/// let paris = LatLng::new(48.8566, 2.3522);
/// let km = haversine_distance(&london, &paris) / 1000.0;
/// assert!((km - 343.5).abs() < 2.0);
/// ```
pub fn haversine_distance(a: &LatLng, b: &LatLng) -> f64 {
    Haversine::distance(to_point(a), to_point(b))
}

/// Center of a bounds rectangle.
pub fn bounds_center(bounds: &LatLngBounds) -> LatLng {
    let rect = Rect::new(
        Coord {
            x: bounds.west,
            y: bounds.south,
        },
        Coord {
            x: bounds.east,
            y: bounds.north,
        },
    );
    let c = rect.center();
    LatLng::new(c.y, c.x)
}

#[inline]
fn to_point(p: &LatLng) -> Point<f64> {
    Point::new(p.longitude, p.latitude)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_distance() {
        let p = LatLng::new(10.0, 20.0);
        assert_eq!(haversine_distance(&p, &p), 0.0);
    }

    #[test]
    fn test_small_offsets_at_equator() {
        let origin = LatLng::new(0.0, 0.0);
        // 1e-5 degrees of longitude is ~1.11m at the equator
        let d1 = haversine_distance(&origin, &LatLng::new(0.0, 0.00001));
        assert!(d1 > 1.0 && d1 < 1.2, "got {}", d1);

        let d2 = haversine_distance(&origin, &LatLng::new(0.0, 0.000001));
        assert!(d2 > 0.1 && d2 < 0.12, "got {}", d2);
    }

    #[test]
    fn test_symmetric() {
        let a = LatLng::new(51.5, -0.12);
        let b = LatLng::new(51.6, -0.10);
        let ab = haversine_distance(&a, &b);
        let ba = haversine_distance(&b, &a);
        assert!((ab - ba).abs() < 1e-9);
    }

    #[test]
    fn test_bounds_center() {
        let bounds = LatLngBounds::new(52.0, 50.0, 2.0, -2.0);
        assert_eq!(bounds_center(&bounds), LatLng::new(51.0, 0.0));
    }
}

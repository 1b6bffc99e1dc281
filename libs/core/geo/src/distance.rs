use crate::point::Point;

pub const EARTH_RADIUS_MILES: f64 = 3958.8;

/// Great-circle distance between two points, in miles, via the haversine
/// formula. Altitude is ignored; it only matters for jitter realism.
pub fn great_circle_miles(from: Point, to: Point) -> f64 {
    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();
    let dlat = (to.lat - from.lat).to_radians();
    let dlon = (to.lon - from.lon).to_radians();

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();
    EARTH_RADIUS_MILES * c
}

/// Implied travel speed in miles per hour between two points given the
/// wall-clock seconds elapsed between them.
pub fn mph(from: Point, to: Point, elapsed_seconds: f64) -> f64 {
    if elapsed_seconds <= 0.0 {
        return f64::INFINITY;
    }
    (great_circle_miles(from, to) / elapsed_seconds) * 3600.0
}

/// Applies a small random jitter to a point's lat/lon (and optionally
/// altitude), mirroring the on-device GPS noise a real client would emit.
/// `degrees` is the maximum absolute jitter per axis.
pub fn jitter_degrees(point: Point, degrees: f64, altitude_meters: f64, rng: &mut impl rand::Rng) -> Point {
    Point::new(
        point.lat + rng.gen_range(-degrees..=degrees),
        point.lon + rng.gen_range(-degrees..=degrees),
        point.alt + rng.gen_range(-altitude_meters..=altitude_meters),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_distance_for_identical_points() {
        let p = Point::flat(40.0, -73.0);
        assert!(great_circle_miles(p, p) < 1e-9);
    }

    #[test]
    fn roughly_sixty_nine_miles_per_degree_of_latitude() {
        let a = Point::flat(0.0, 0.0);
        let b = Point::flat(1.0, 0.0);
        let miles = great_circle_miles(a, b);
        assert!((miles - 69.0).abs() < 1.0, "expected ~69mi, got {miles}");
    }

    #[test]
    fn speed_limit_scenario_from_spec() {
        let a = Point::flat(0.0, 0.0);
        let b = Point::flat(0.0, 0.1);
        let fast = mph(a, b, 60.0);
        assert!(fast > 400.0 && fast < 430.0, "got {fast}");
        let slow = mph(a, b, 1800.0);
        assert!(slow > 13.0 && slow < 14.5, "got {slow}");
    }
}

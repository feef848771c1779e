/// Calculate distance between two coordinates using Haversine formula
/// Returns distance in kilometers
pub fn haversine_distance(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    const EARTH_RADIUS_KM: f64 = 6371.0;

    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lng = (lng2 - lng1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_KM * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_la_to_sf() {
        let los_angeles = (34.0522, -118.2437);
        let san_francisco = (37.7749, -122.4194);

        let distance = haversine_distance(
            los_angeles.0,
            los_angeles.1,
            san_francisco.0,
            san_francisco.1,
        );
        // Great-circle distance is roughly 560 km
        assert!(distance > 540.0 && distance < 580.0);
    }

    #[test]
    fn test_haversine_same_point() {
        let distance = haversine_distance(35.6828, 139.7594, 35.6828, 139.7594);
        assert!(distance.abs() < 1e-9);
    }
}

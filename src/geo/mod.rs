use crate::models::rider::GeoPoint;

const EARTH_RADIUS_KM: f64 = 6_371.0;

pub fn haversine_km(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let delta_lat = (b.lat - a.lat).to_radians();
    let delta_lng = (b.lng - a.lng).to_radians();

    let sin_lat = (delta_lat / 2.0).sin();
    let sin_lng = (delta_lng / 2.0).sin();

    let haversine = sin_lat * sin_lat + lat1.cos() * lat2.cos() * sin_lng * sin_lng;
    let central_angle = 2.0 * haversine.sqrt().asin();

    EARTH_RADIUS_KM * central_angle
}

/// "3.2 km away", rounded to one decimal.
pub fn distance_label(from: &GeoPoint, to: &GeoPoint) -> String {
    format!("{:.1} km away", haversine_km(from, to))
}

#[cfg(test)]
mod tests {
    use super::{distance_label, haversine_km};
    use crate::models::rider::GeoPoint;

    #[test]
    fn zero_distance_for_same_point() {
        let p = GeoPoint {
            lat: 5.6037,
            lng: -0.187,
        };
        let distance = haversine_km(&p, &p);
        assert!(distance < 1e-9);
        assert_eq!(distance_label(&p, &p), "0.0 km away");
    }

    #[test]
    fn accra_to_kumasi_is_around_200_km() {
        let accra = GeoPoint {
            lat: 5.6037,
            lng: -0.187,
        };
        let kumasi = GeoPoint {
            lat: 6.6885,
            lng: -1.6244,
        };
        let distance = haversine_km(&accra, &kumasi);
        assert!((distance - 199.0).abs() < 10.0);
    }
}

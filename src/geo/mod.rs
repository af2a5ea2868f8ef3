use crate::error::AppError;
use crate::models::location::GeoPoint;

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

pub fn validate_point(lat: f64, lng: f64) -> Result<GeoPoint, AppError> {
    if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
        return Err(AppError::BadRequest(format!(
            "latitude must be within -90..90, got {lat}"
        )));
    }
    if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
        return Err(AppError::BadRequest(format!(
            "longitude must be within -180..180, got {lng}"
        )));
    }

    Ok(GeoPoint { lat, lng })
}

#[cfg(test)]
mod tests {
    use super::{haversine_km, validate_point};
    use crate::models::location::GeoPoint;

    #[test]
    fn zero_distance_for_same_point() {
        let p = GeoPoint {
            lat: 23.8103,
            lng: 90.4125,
        };
        let distance = haversine_km(&p, &p);
        assert!(distance < 1e-9);
    }

    #[test]
    fn dhaka_to_chittagong_is_around_215_km() {
        let dhaka = GeoPoint {
            lat: 23.8103,
            lng: 90.4125,
        };
        let chittagong = GeoPoint {
            lat: 22.3569,
            lng: 91.7832,
        };
        let distance = haversine_km(&dhaka, &chittagong);
        assert!((distance - 215.0).abs() < 10.0);
    }

    #[test]
    fn out_of_range_coordinates_are_rejected() {
        assert!(validate_point(90.5, 0.0).is_err());
        assert!(validate_point(0.0, -180.1).is_err());
        assert!(validate_point(f64::NAN, 0.0).is_err());
        assert_eq!(
            validate_point(-90.0, 180.0).unwrap(),
            GeoPoint {
                lat: -90.0,
                lng: 180.0
            }
        );
    }
}

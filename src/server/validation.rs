use crate::server::dto::ListCommunitiesParams;
use crate::server::response::ApiError;
use crate::types::GeoPoint;

pub const DEFAULT_RADIUS_KM: f64 = 50.0;
const MAX_RADIUS_KM: f64 = 20_000.0;

/// A nearby search is requested with both `lat` and `lng`; one without the
/// other is an error.
pub fn nearby_origin(params: &ListCommunitiesParams) -> Result<Option<(GeoPoint, f64)>, ApiError> {
    let (lat, lng) = match (params.lat, params.lng) {
        (None, None) if params.radius_km.is_none() => return Ok(None),
        (Some(lat), Some(lng)) => (lat, lng),
        _ => {
            return Err(ApiError::bad_request(
                "lat and lng must be supplied together",
            ));
        }
    };

    let origin = GeoPoint::new(lat, lng);
    if !origin.is_valid() {
        return Err(ApiError::bad_request("Coordinates out of range"));
    }

    let radius = params.radius_km.unwrap_or(DEFAULT_RADIUS_KM);
    if !(radius > 0.0 && radius <= MAX_RADIUS_KM) {
        return Err(ApiError::bad_request(format!(
            "radius_km must be between 0 and {MAX_RADIUS_KM}"
        )));
    }
    Ok(Some((origin, radius)))
}

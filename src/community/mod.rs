mod directory;
mod draft;

pub use directory::CommunityDirectory;
pub use draft::{
    CommunityDraft, DEFAULT_MEETING_DAY, DEFAULT_MEETING_TIME, DEFAULT_NAME, UNKNOWN_LOCATION,
    normalize_weekday,
};

use crate::types::{Community, GeoPoint, NearbyCommunity};

/// Communities within `radius_km` of `origin`, closest first.
pub fn nearby(communities: &[Community], origin: GeoPoint, radius_km: f64) -> Vec<NearbyCommunity> {
    let mut found: Vec<NearbyCommunity> = communities
        .iter()
        .filter_map(|c| {
            let distance_km =
                origin.distance_km(&GeoPoint::new(c.location_lat, c.location_lng));
            (distance_km <= radius_km).then(|| NearbyCommunity {
                community: c.clone(),
                distance_km,
            })
        })
        .collect();

    found.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
    found
}

use serde::{Deserialize, Serialize};

use crate::types::{Community, MemberRole, Token};

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub display_name: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateUserTokenRequest {
    #[serde(default)]
    pub expires_in_seconds: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateTokenResponse {
    pub token: String,
    pub metadata: Token,
}

/// Query string for the community listing. Supplying both coordinates
/// switches to a nearby search.
#[derive(Debug, Default, Deserialize)]
pub struct ListCommunitiesParams {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub radius_km: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JoinResponse {
    pub role: MemberRole,
    pub community: Community,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LeaveResponse {
    /// False when the caller was not a member.
    pub removed: bool,
    pub community: Community,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReconcileResponse {
    pub community_id: String,
    pub previous_count: i64,
    pub member_count: i64,
}

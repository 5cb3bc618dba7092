use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{MemberRole, TrustLevel};
use crate::error::{Error, Result};

pub const MAX_DISPLAY_NAME_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Community {
    pub id: String,
    pub name: String,
    pub description: String,
    pub meeting_day: String,
    pub meeting_time: String,
    pub trust_level: TrustLevel,
    pub member_count: i64,
    pub location_city: String,
    pub location_state: String,
    pub location_lat: f64,
    pub location_lng: f64,
    pub tags: Vec<String>,
    pub leader_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_info: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Community {
    /// "City, State" as shown in popups.
    #[must_use]
    pub fn location_label(&self) -> String {
        format!("{}, {}", self.location_city, self.location_state)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Membership {
    pub community_id: String,
    pub user_id: String,
    pub role: MemberRole,
    pub joined_at: DateTime<Utc>,
}

/// A community as seen by one of its members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserCommunity {
    #[serde(flatten)]
    pub community: Community,
    pub role: MemberRole,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// A fresh user with a trimmed, validated display name.
    pub fn new(display_name: &str) -> Result<Self> {
        Self::validate_display_name(display_name)?;
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            display_name: display_name.trim().to_string(),
            created_at: now,
            updated_at: now,
        })
    }

    pub fn validate_display_name(name: &str) -> Result<()> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(Error::Validation("Display name cannot be empty".into()));
        }
        if trimmed.chars().count() > MAX_DISPLAY_NAME_LEN {
            return Err(Error::Validation(format!(
                "Display name cannot exceed {MAX_DISPLAY_NAME_LEN} characters"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub id: String,
    #[serde(skip)]
    pub token_hash: String,
    #[serde(skip)]
    pub token_lookup: String,
    pub is_admin: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_used_at: Option<DateTime<Utc>>,
}

/// A community paired with its great-circle distance from a search origin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NearbyCommunity {
    #[serde(flatten)]
    pub community: Community,
    pub distance_km: f64,
}

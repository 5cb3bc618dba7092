use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::types::{Community, GeoPoint, TrustLevel};

pub const DEFAULT_NAME: &str = "New Community";
pub const DEFAULT_MEETING_DAY: &str = "Sunday";
pub const DEFAULT_MEETING_TIME: &str = "10:00 AM";
pub const UNKNOWN_LOCATION: &str = "Unknown";

const MAX_NAME_LEN: usize = 100;
const MAX_DESCRIPTION_LEN: usize = 2000;
const MAX_MEETING_TIME_LEN: usize = 20;
const MAX_TAGS: usize = 20;
const MAX_TAG_LEN: usize = 32;

const WEEKDAYS: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// What a caller supplied when creating a community. Anything left out is
/// filled in by [`CommunityDraft::build`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CommunityDraft {
    pub name: Option<String>,
    pub description: Option<String>,
    pub meeting_day: Option<String>,
    pub meeting_time: Option<String>,
    pub trust_level: Option<TrustLevel>,
    pub location_city: Option<String>,
    pub location_state: Option<String>,
    pub location_lat: Option<f64>,
    pub location_lng: Option<f64>,
    pub tags: Option<Vec<String>>,
    pub contact_info: Option<serde_json::Value>,
}

impl CommunityDraft {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_meeting(mut self, day: impl Into<String>, time: impl Into<String>) -> Self {
        self.meeting_day = Some(day.into());
        self.meeting_time = Some(time.into());
        self
    }

    #[must_use]
    pub fn with_location(
        mut self,
        city: impl Into<String>,
        state: impl Into<String>,
        point: GeoPoint,
    ) -> Self {
        self.location_city = Some(city.into());
        self.location_state = Some(state.into());
        self.location_lat = Some(point.latitude);
        self.location_lng = Some(point.longitude);
        self
    }

    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    /// Validates the supplied fields and produces a fully populated record
    /// led by `leader_id`. The record counts its leader as the only member.
    pub fn build(self, leader_id: &str, now: DateTime<Utc>) -> Result<Community> {
        if leader_id.trim().is_empty() {
            return Err(Error::Validation("leader id cannot be empty".into()));
        }

        let name = match self.name {
            Some(name) => validate_name(name.trim())?.to_string(),
            None => DEFAULT_NAME.to_string(),
        };

        let description = self.description.unwrap_or_default();
        if description.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(Error::Validation(format!(
                "description cannot exceed {MAX_DESCRIPTION_LEN} characters"
            )));
        }

        let meeting_day = match self.meeting_day {
            Some(day) => normalize_weekday(&day)?.to_string(),
            None => DEFAULT_MEETING_DAY.to_string(),
        };

        let meeting_time = match self.meeting_time {
            Some(time) => validate_meeting_time(time.trim())?.to_string(),
            None => DEFAULT_MEETING_TIME.to_string(),
        };

        let point = GeoPoint::new(
            self.location_lat.unwrap_or(0.0),
            self.location_lng.unwrap_or(0.0),
        );
        if !point.is_valid() {
            return Err(Error::Validation(format!(
                "coordinates out of range: {}, {}",
                point.latitude, point.longitude
            )));
        }

        let tags = validate_tags(self.tags.unwrap_or_default())?;

        Ok(Community {
            id: Uuid::new_v4().to_string(),
            name,
            description,
            meeting_day,
            meeting_time,
            trust_level: self.trust_level.unwrap_or_default(),
            member_count: 1,
            location_city: non_blank_or_unknown(self.location_city),
            location_state: non_blank_or_unknown(self.location_state),
            location_lat: point.latitude,
            location_lng: point.longitude,
            tags,
            leader_id: leader_id.to_string(),
            contact_info: self.contact_info,
            created_at: now,
            updated_at: now,
        })
    }
}

fn validate_name(name: &str) -> Result<&str> {
    if name.is_empty() {
        return Err(Error::Validation("community name cannot be empty".into()));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(Error::Validation(format!(
            "community name cannot exceed {MAX_NAME_LEN} characters"
        )));
    }
    Ok(name)
}

/// Accepts any capitalization of an English weekday and returns its canonical form.
pub fn normalize_weekday(day: &str) -> Result<&'static str> {
    WEEKDAYS
        .into_iter()
        .find(|d| d.eq_ignore_ascii_case(day.trim()))
        .ok_or_else(|| Error::Validation(format!("unknown meeting day: {day}")))
}

fn validate_meeting_time(time: &str) -> Result<&str> {
    if time.is_empty() || time.len() > MAX_MEETING_TIME_LEN {
        return Err(Error::Validation(format!(
            "meeting time must be 1 to {MAX_MEETING_TIME_LEN} characters"
        )));
    }
    Ok(time)
}

fn validate_tags(tags: Vec<String>) -> Result<Vec<String>> {
    if tags.len() > MAX_TAGS {
        return Err(Error::Validation(format!(
            "a community can have at most {MAX_TAGS} tags"
        )));
    }

    let mut cleaned: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if tag.is_empty() || tag.chars().count() > MAX_TAG_LEN {
            return Err(Error::Validation(format!(
                "tags must be 1 to {MAX_TAG_LEN} characters"
            )));
        }
        if !cleaned.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
            cleaned.push(tag.to_string());
        }
    }
    Ok(cleaned)
}

fn non_blank_or_unknown(value: Option<String>) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| UNKNOWN_LOCATION.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_draft_gets_defaults() {
        let community = CommunityDraft::new().build("user-1", Utc::now()).unwrap();

        assert_eq!(community.name, DEFAULT_NAME);
        assert_eq!(community.meeting_day, "Sunday");
        assert_eq!(community.meeting_time, "10:00 AM");
        assert_eq!(community.trust_level, TrustLevel::New);
        assert_eq!(community.location_city, "Unknown");
        assert_eq!(community.location_state, "Unknown");
        assert_eq!(community.location_lat, 0.0);
        assert_eq!(community.location_lng, 0.0);
        assert!(community.tags.is_empty());
        assert_eq!(community.leader_id, "user-1");
        assert_eq!(community.member_count, 1);
    }

    #[test]
    fn test_empty_json_object_is_an_empty_draft() {
        let draft: CommunityDraft = serde_json::from_str("{}").unwrap();
        let community = draft.build("user-1", Utc::now()).unwrap();
        assert_eq!(community.meeting_day, DEFAULT_MEETING_DAY);
    }

    #[test]
    fn test_supplied_fields_are_kept() {
        let community = CommunityDraft::new()
            .with_name("  Hillside Fellowship ")
            .with_description("Bible study and supper")
            .with_meeting("wednesday", "7:00 PM")
            .with_location("Austin", "TX", GeoPoint::new(30.2672, -97.7431))
            .with_tags(["families", "Families", "young adults"])
            .build("user-1", Utc::now())
            .unwrap();

        assert_eq!(community.name, "Hillside Fellowship");
        assert_eq!(community.meeting_day, "Wednesday");
        assert_eq!(community.meeting_time, "7:00 PM");
        assert_eq!(community.location_city, "Austin");
        assert_eq!(community.location_lat, 30.2672);
        assert_eq!(community.tags, vec!["families", "young adults"]);
    }

    #[test]
    fn test_rejects_bad_input() {
        let now = Utc::now();
        assert!(CommunityDraft::new().with_name("   ").build("u", now).is_err());
        assert!(
            CommunityDraft::new()
                .with_meeting("Someday", "9")
                .build("u", now)
                .is_err()
        );
        assert!(
            CommunityDraft::new()
                .with_location("X", "Y", GeoPoint::new(91.0, 0.0))
                .build("u", now)
                .is_err()
        );
        assert!(CommunityDraft::new().with_tags([""]).build("u", now).is_err());
        assert!(CommunityDraft::new().build(" ", now).is_err());
    }

    #[test]
    fn test_blank_location_strings_become_unknown() {
        let draft = CommunityDraft {
            location_city: Some("  ".to_string()),
            location_state: Some("WA".to_string()),
            ..CommunityDraft::default()
        };
        let community = draft.build("u", Utc::now()).unwrap();
        assert_eq!(community.location_city, "Unknown");
        assert_eq!(community.location_state, "WA");
    }
}

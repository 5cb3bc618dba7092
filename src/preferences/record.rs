use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Preferences;
use crate::error::{Error, Result};

pub const CURRENT_VERSION: u32 = 1;

/// The persisted form of [`Preferences`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreferenceRecord {
    pub version: u32,
    pub preferences: Preferences,
}

impl PreferenceRecord {
    #[must_use]
    pub fn current(preferences: Preferences) -> Self {
        Self {
            version: CURRENT_VERSION,
            preferences,
        }
    }
}

/// Unversioned record: a bare camelCase flag object. Missing flags take
/// their defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct LegacyPreferences {
    email_notifications: Option<bool>,
    message_notifications: Option<bool>,
    weekly_digest: Option<bool>,
    profile_visibility: Option<bool>,
    direct_messages: Option<bool>,
}

impl From<LegacyPreferences> for Preferences {
    fn from(legacy: LegacyPreferences) -> Self {
        let defaults = Preferences::default();
        Preferences {
            email_notifications: legacy
                .email_notifications
                .unwrap_or(defaults.email_notifications),
            message_notifications: legacy
                .message_notifications
                .unwrap_or(defaults.message_notifications),
            weekly_digest: legacy.weekly_digest.unwrap_or(defaults.weekly_digest),
            profile_visibility: legacy
                .profile_visibility
                .unwrap_or(defaults.profile_visibility),
            direct_messages: legacy.direct_messages.unwrap_or(defaults.direct_messages),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    pub preferences: Preferences,
    /// Set when the stored record used an older layout.
    pub migrated_from: Option<u32>,
}

/// Parses a stored record, upgrading older layouts.
pub fn decode(raw: &str) -> Result<Decoded> {
    let value: Value = serde_json::from_str(raw)?;
    let version = match &value {
        Value::Object(fields) => fields.get("version").cloned(),
        _ => {
            return Err(Error::Preferences(
                "stored preferences are not an object".into(),
            ));
        }
    };

    match version {
        None => {
            let legacy: LegacyPreferences = serde_json::from_value(value)?;
            Ok(Decoded {
                preferences: legacy.into(),
                migrated_from: Some(0),
            })
        }
        Some(version) => {
            let version = version
                .as_u64()
                .ok_or_else(|| Error::Preferences(format!("invalid version: {version}")))?;
            if version != u64::from(CURRENT_VERSION) {
                return Err(Error::Preferences(format!(
                    "unsupported preferences version {version}"
                )));
            }
            let record: PreferenceRecord = serde_json::from_value(value)?;
            Ok(Decoded {
                preferences: record.preferences,
                migrated_from: None,
            })
        }
    }
}

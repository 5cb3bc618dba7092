//! Per-device notification and profile preferences.

mod panel;
mod record;
mod storage;

pub use panel::{STORAGE_KEY, SettingsPanel};
pub use record::{CURRENT_VERSION, Decoded, PreferenceRecord, decode};
pub use storage::{DeviceStorage, FileStorage, MemoryStorage};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    pub email_notifications: bool,
    pub message_notifications: bool,
    pub weekly_digest: bool,
    pub profile_visibility: bool,
    pub direct_messages: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            email_notifications: true,
            message_notifications: true,
            weekly_digest: false,
            profile_visibility: true,
            direct_messages: false,
        }
    }
}

impl Preferences {
    #[must_use]
    pub fn get(&self, key: PreferenceKey) -> bool {
        match key {
            PreferenceKey::EmailNotifications => self.email_notifications,
            PreferenceKey::MessageNotifications => self.message_notifications,
            PreferenceKey::WeeklyDigest => self.weekly_digest,
            PreferenceKey::ProfileVisibility => self.profile_visibility,
            PreferenceKey::DirectMessages => self.direct_messages,
        }
    }

    pub fn set(&mut self, key: PreferenceKey, value: bool) {
        let slot = match key {
            PreferenceKey::EmailNotifications => &mut self.email_notifications,
            PreferenceKey::MessageNotifications => &mut self.message_notifications,
            PreferenceKey::WeeklyDigest => &mut self.weekly_digest,
            PreferenceKey::ProfileVisibility => &mut self.profile_visibility,
            PreferenceKey::DirectMessages => &mut self.direct_messages,
        };
        *slot = value;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PreferenceKey {
    EmailNotifications,
    MessageNotifications,
    WeeklyDigest,
    ProfileVisibility,
    DirectMessages,
}

impl PreferenceKey {
    pub const ALL: [PreferenceKey; 5] = [
        PreferenceKey::EmailNotifications,
        PreferenceKey::MessageNotifications,
        PreferenceKey::WeeklyDigest,
        PreferenceKey::ProfileVisibility,
        PreferenceKey::DirectMessages,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            PreferenceKey::EmailNotifications => "email_notifications",
            PreferenceKey::MessageNotifications => "message_notifications",
            PreferenceKey::WeeklyDigest => "weekly_digest",
            PreferenceKey::ProfileVisibility => "profile_visibility",
            PreferenceKey::DirectMessages => "direct_messages",
        }
    }

    /// Human-readable name, e.g. "Email notifications".
    #[must_use]
    pub fn label(self) -> String {
        sentence_case(self.as_str())
    }
}

impl fmt::Display for PreferenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PreferenceKey {
    type Err = Error;

    /// Accepts snake_case, kebab-case and camelCase spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = split_words(s).join("_");
        PreferenceKey::ALL
            .into_iter()
            .find(|key| key.as_str() == wanted)
            .ok_or_else(|| Error::Preferences(format!("unknown preference: {s}")))
    }
}

/// Splits an identifier on `_`, `-` and lower-to-upper case boundaries.
fn split_words(identifier: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;

    for c in identifier.chars() {
        if c == '_' || c == '-' || c.is_whitespace() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if c.is_uppercase() && prev_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        prev_lower = c.is_lowercase() || c.is_ascii_digit();
        current.extend(c.to_lowercase());
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn sentence_case(identifier: &str) -> String {
    let sentence = split_words(identifier).join(" ");
    let mut chars = sentence.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

use std::sync::Arc;

use super::record::{PreferenceRecord, decode};
use super::storage::DeviceStorage;
use super::{PreferenceKey, Preferences};
use crate::error::Result;
use crate::notify::{Notification, Notifier};

/// Key under which the preference record lives in device storage.
pub const STORAGE_KEY: &str = "hearth.preferences";

type ChangeCallback = Box<dyn FnMut(&Preferences) + Send>;

/// The settings screen: current preferences plus where they are kept.
pub struct SettingsPanel<S: DeviceStorage> {
    storage: S,
    notifier: Arc<dyn Notifier>,
    preferences: Preferences,
    on_change: Option<ChangeCallback>,
}

impl<S: DeviceStorage> SettingsPanel<S> {
    /// Reads the stored record. Anything unreadable is logged and the
    /// defaults are kept; the user is not notified.
    pub fn load(storage: S, notifier: Arc<dyn Notifier>) -> Self {
        let preferences = match storage.get(STORAGE_KEY) {
            Ok(Some(raw)) => match decode(&raw) {
                Ok(decoded) => {
                    if let Some(from) = decoded.migrated_from {
                        tracing::info!("Migrating stored preferences from version {from}");
                        persist(&storage, &decoded.preferences).unwrap_or_else(|e| {
                            tracing::warn!("Failed to write migrated preferences: {e}");
                        });
                    }
                    decoded.preferences
                }
                Err(e) => {
                    tracing::warn!("Ignoring stored preferences: {e}");
                    Preferences::default()
                }
            },
            Ok(None) => Preferences::default(),
            Err(e) => {
                tracing::warn!("Failed to read preferences storage: {e}");
                Preferences::default()
            }
        };

        Self {
            storage,
            notifier,
            preferences,
            on_change: None,
        }
    }

    pub fn on_change(&mut self, callback: impl FnMut(&Preferences) + Send + 'static) {
        self.on_change = Some(Box::new(callback));
    }

    #[must_use]
    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    /// Sets one flag and writes the full record back.
    pub fn toggle(&mut self, key: PreferenceKey, value: bool) -> Result<()> {
        self.preferences.set(key, value);

        if let Err(e) = persist(&self.storage, &self.preferences) {
            tracing::error!("Failed to save preferences: {e}");
            self.notifier.notify(Notification::error(
                "Error saving settings",
                format!("{} could not be saved", key.label()),
            ));
            return Err(e);
        }

        if let Some(callback) = self.on_change.as_mut() {
            callback(&self.preferences);
        }

        let state = if value { "enabled" } else { "disabled" };
        self.notifier.notify(Notification::success(
            "Settings updated",
            format!("{} {state}", key.label()),
        ));
        Ok(())
    }
}

fn persist<S: DeviceStorage>(storage: &S, preferences: &Preferences) -> Result<()> {
    let raw = serde_json::to_string(&PreferenceRecord::current(*preferences))?;
    storage.set(STORAGE_KEY, &raw)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::error::Error;
    use crate::notify::MemoryNotifier;
    use crate::preferences::MemoryStorage;

    struct ReadOnlyStorage;

    impl DeviceStorage for ReadOnlyStorage {
        fn get(&self, _key: &str) -> Result<Option<String>> {
            Ok(None)
        }

        fn set(&self, _key: &str, _value: &str) -> Result<()> {
            Err(Error::Io(std::io::Error::other("read-only")))
        }
    }

    #[test]
    fn test_toggle_persists_and_reloads_identically() {
        let storage = MemoryStorage::new();
        let notifier = Arc::new(MemoryNotifier::new());

        let mut panel = SettingsPanel::load(&storage, notifier.clone());
        panel.toggle(PreferenceKey::WeeklyDigest, true).unwrap();
        panel.toggle(PreferenceKey::EmailNotifications, false).unwrap();
        let expected = *panel.preferences();

        let reloaded = SettingsPanel::load(&storage, notifier.clone());
        assert_eq!(*reloaded.preferences(), expected);

        let note = notifier.last().unwrap();
        assert_eq!(note.title, "Settings updated");
        assert_eq!(note.description, "Email notifications disabled");
    }

    #[test]
    fn test_unparsable_value_leaves_defaults() {
        let storage = MemoryStorage::new();
        storage.set(STORAGE_KEY, "{not json").unwrap();
        let notifier = Arc::new(MemoryNotifier::new());

        let panel = SettingsPanel::load(&storage, notifier.clone());
        assert_eq!(*panel.preferences(), Preferences::default());
        assert!(notifier.take().is_empty());
    }

    #[test]
    fn test_legacy_record_is_rewritten_as_current() {
        let storage = MemoryStorage::new();
        storage
            .set(STORAGE_KEY, r#"{"directMessages": true}"#)
            .unwrap();

        let panel = SettingsPanel::load(&storage, Arc::new(MemoryNotifier::new()));
        assert!(panel.preferences().direct_messages);

        let raw = storage.get(STORAGE_KEY).unwrap().unwrap();
        let record: PreferenceRecord = serde_json::from_str(&raw).unwrap();
        assert_eq!(record.version, 1);
        assert!(record.preferences.direct_messages);
    }

    #[test]
    fn test_on_change_receives_full_set() {
        let storage = MemoryStorage::new();
        let mut panel = SettingsPanel::load(&storage, Arc::new(MemoryNotifier::new()));

        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);
        panel.on_change(move |prefs| *sink.lock().unwrap() = Some(*prefs));

        panel.toggle(PreferenceKey::DirectMessages, true).unwrap();

        let seen = seen.lock().unwrap().unwrap();
        assert!(seen.direct_messages);
        assert!(seen.email_notifications);
    }

    #[test]
    fn test_failed_write_is_reported() {
        let notifier = Arc::new(MemoryNotifier::new());
        let mut panel = SettingsPanel::load(ReadOnlyStorage, notifier.clone());

        assert!(panel.toggle(PreferenceKey::WeeklyDigest, true).is_err());
        assert_eq!(notifier.last().unwrap().title, "Error saving settings");
    }
}

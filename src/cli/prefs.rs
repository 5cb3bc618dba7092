use std::sync::Arc;

use super::credentials::config_dir;
use crate::notify::ConsoleNotifier;
use crate::preferences::{FileStorage, PreferenceKey, SettingsPanel};

const DEVICE_STORAGE_FILE: &str = "device.json";

fn open_panel() -> anyhow::Result<SettingsPanel<FileStorage>> {
    let storage = FileStorage::new(config_dir()?.join(DEVICE_STORAGE_FILE));
    tracing::debug!("Using device storage at {}", storage.path().display());
    Ok(SettingsPanel::load(storage, Arc::new(ConsoleNotifier)))
}

pub fn run_prefs_show(json: bool) -> anyhow::Result<()> {
    let panel = open_panel()?;
    let preferences = panel.preferences();

    if json {
        println!("{}", serde_json::to_string_pretty(preferences)?);
        return Ok(());
    }

    println!();
    for key in PreferenceKey::ALL {
        let state = if preferences.get(key) { "on" } else { "off" };
        println!("  {:<24} {state:<4} ({key})", key.label());
    }
    println!();
    Ok(())
}

pub fn run_prefs_set(key: &str, value: bool) -> anyhow::Result<()> {
    let key: PreferenceKey = key.parse()?;
    let mut panel = open_panel()?;
    panel.toggle(key, value)?;
    Ok(())
}

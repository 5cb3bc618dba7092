use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::map::DEFAULT_ZOOM;

/// Environment variable that overrides `[map] token`.
pub const MAP_TOKEN_ENV: &str = "HEARTH_MAP_TOKEN";

/// Optional `hearth.toml` in the data directory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub map: MapSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapSettings {
    /// Access token handed to map clients by the token endpoint.
    pub token: Option<String>,
    pub default_zoom: f64,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            token: None,
            default_zoom: DEFAULT_ZOOM,
        }
    }
}

impl ConfigFile {
    /// Reads the file if present; a missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let config = match fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content)
                .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(e) => return Err(e.into()),
        };
        Ok(config)
    }

    /// Applies environment overrides on top of the file contents.
    #[must_use]
    pub fn with_env(mut self) -> Self {
        self.apply_map_token(std::env::var(MAP_TOKEN_ENV).ok());
        self
    }

    fn apply_map_token(&mut self, token: Option<String>) {
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            self.map.token = Some(token);
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("failed to serialize config: {e}")))?;
        fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_missing_file_is_default() {
        let temp = TempDir::new().unwrap();
        let config = ConfigFile::load(&temp.path().join("hearth.toml")).unwrap();
        assert_eq!(config, ConfigFile::default());
        assert_eq!(config.map.default_zoom, DEFAULT_ZOOM);
    }

    #[test]
    fn test_parses_map_section() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("hearth.toml");
        fs::write(&path, "[map]\ntoken = \"pk.file\"\ndefault_zoom = 6.5\n").unwrap();

        let config = ConfigFile::load(&path).unwrap();
        assert_eq!(config.map.token.as_deref(), Some("pk.file"));
        assert_eq!(config.map.default_zoom, 6.5);
    }

    #[test]
    fn test_override_wins_unless_blank() {
        let mut config = ConfigFile::default();
        config.map.token = Some("pk.file".to_string());

        config.apply_map_token(Some("  ".to_string()));
        assert_eq!(config.map.token.as_deref(), Some("pk.file"));

        config.apply_map_token(Some("pk.env".to_string()));
        assert_eq!(config.map.token.as_deref(), Some("pk.env"));
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("hearth.toml");
        fs::write(&path, "[map\n").unwrap();
        assert!(matches!(ConfigFile::load(&path), Err(Error::Config(_))));
    }
}

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub server_url: String,
    pub token: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CredentialsFile {
    pub default: Option<Credentials>,
}

/// Overrides the per-user configuration directory.
pub const CONFIG_DIR_ENV: &str = "HEARTH_CONFIG_DIR";

/// Per-user configuration directory: `$HEARTH_CONFIG_DIR`, else `<config dir>/hearth`.
pub fn config_dir() -> anyhow::Result<PathBuf> {
    if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV).filter(|d| !d.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    let base = dirs::config_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory. Is $HOME set?"))?;
    Ok(base.join("hearth"))
}

pub fn credentials_path() -> anyhow::Result<PathBuf> {
    Ok(config_dir()?.join("credentials.toml"))
}

pub fn load_credentials() -> anyhow::Result<Credentials> {
    let path = credentials_path()?;
    let content = fs::read_to_string(&path)
        .map_err(|_| anyhow::anyhow!("Not logged in. Run 'hearth auth login' first."))?;
    let file: CredentialsFile = toml::from_str(&content)?;
    file.default.ok_or_else(|| {
        anyhow::anyhow!("Credentials file is corrupted. Run 'hearth auth login' to fix.")
    })
}

pub fn save_credentials(creds: &Credentials) -> anyhow::Result<()> {
    let path = credentials_path()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = CredentialsFile {
        default: Some(creds.clone()),
    };
    fs::write(&path, toml::to_string_pretty(&file)?)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o600))?;
    }

    Ok(())
}

/// Returns false when there was nothing to delete.
pub fn delete_credentials() -> anyhow::Result<bool> {
    let path = credentials_path()?;
    match fs::remove_file(&path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

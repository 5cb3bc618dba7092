use std::fs;
use std::path::{Path, PathBuf};

use anyhow::bail;

use super::init_store;
use super::user::create_user;
use crate::auth::TokenGenerator;
use crate::config::{ConfigFile, ServerConfig};
use crate::store::{SqliteStore, Store};

pub const ADMIN_TOKEN_FILE: &str = ".admin_token";

#[cfg(unix)]
fn set_restrictive_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    if let Err(e) = fs::set_permissions(path, fs::Permissions::from_mode(0o600)) {
        tracing::warn!("Failed to set permissions on {}: {e}", path.display());
    }
}

pub fn run_init(data_dir: String, non_interactive: bool) -> anyhow::Result<()> {
    let config = ServerConfig {
        data_dir: PathBuf::from(data_dir),
        ..ServerConfig::default()
    };
    fs::create_dir_all(&config.data_dir)?;

    let store = SqliteStore::new(config.db_path())?;
    store.initialize()?;

    let token_file = config.data_dir.join(ADMIN_TOKEN_FILE);
    if store.has_admin_token()? {
        bail!(
            "Already initialized. Admin token exists at: {}",
            token_file.display()
        );
    }

    let config_path = config.config_path();
    if !config_path.exists() {
        ConfigFile::default().save(&config_path)?;
    }

    let issued = TokenGenerator::new().issue(None, None)?;
    store.create_token(&issued.token)?;
    fs::write(&token_file, &issued.raw)?;

    #[cfg(unix)]
    set_restrictive_permissions(&token_file);

    println!();
    println!("========================================");
    println!("Admin token (save this, it won't be shown again):");
    println!();
    println!("  {}", issued.raw);
    println!();
    println!("Token also written to: {}", token_file.display());
    println!("Map settings go in: {}", config_path.display());
    println!("========================================");
    println!();

    if !non_interactive {
        create_default_user_prompt(&store)?;
    }

    Ok(())
}

fn create_default_user_prompt(store: &SqliteStore) -> anyhow::Result<()> {
    let wanted = inquire::Confirm::new("Would you like to create a default user?")
        .with_default(false)
        .prompt()?;
    if !wanted {
        return Ok(());
    }

    let name = inquire::Text::new("Display name:")
        .with_validator(|input: &str| {
            if input.trim().is_empty() {
                Ok(inquire::validator::Validation::Invalid(
                    "Display name cannot be empty".into(),
                ))
            } else {
                Ok(inquire::validator::Validation::Valid)
            }
        })
        .prompt()?;

    let user = create_user(store, &name)?;
    let issued = TokenGenerator::new().issue(Some(&user.id), None)?;
    store.create_token(&issued.token)?;

    println!();
    println!("========================================");
    println!("Created user '{}' with token:", user.display_name);
    println!();
    println!("  {}", issued.raw);
    println!();
    println!("========================================");
    println!();

    Ok(())
}

/// Rewrites stored member counts from the membership rows.
pub fn run_reconcile(data_dir: String, community_id: Option<String>) -> anyhow::Result<()> {
    let store = init_store(&data_dir)?;

    let communities = match community_id {
        Some(id) => match store.get_community(&id)? {
            Some(community) => vec![community],
            None => bail!("Community '{id}' not found"),
        },
        None => store.list_communities()?,
    };

    if communities.is_empty() {
        println!("No communities found.");
        return Ok(());
    }

    let mut repaired = 0;
    println!();
    for community in &communities {
        let actual = store.reconcile_member_count(&community.id)?;
        if actual == community.member_count {
            println!("  {}: {actual} members", community.name);
        } else {
            repaired += 1;
            println!(
                "  {}: {} -> {actual} members (repaired)",
                community.name, community.member_count
            );
        }
    }
    println!();
    println!(
        "Reconciled {} communities, {repaired} repaired.",
        communities.len()
    );
    println!();

    Ok(())
}

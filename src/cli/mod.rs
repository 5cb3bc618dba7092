mod admin;
mod auth;
mod commands;
mod community;
pub mod credentials;
pub mod http_client;
mod map;
pub mod pickers;
mod prefs;
mod user;

pub use admin::{ADMIN_TOKEN_FILE, run_init, run_reconcile};
pub use auth::{run_auth_login, run_auth_logout};
pub use commands::{AdminCommands, AuthCommands, CommunityCommands, PrefsCommands, UserCommands};
pub use community::{
    run_community_create, run_community_join, run_community_leave, run_community_list,
    run_community_mine, run_community_show,
};
pub use map::{MapArgs, run_map};
pub use prefs::{run_prefs_set, run_prefs_show};
pub use user::run_user_add;

use std::path::PathBuf;

use crate::config::ServerConfig;
use crate::store::SqliteStore;

/// Opens the store in an initialized data directory.
pub fn init_store(data_dir: &str) -> anyhow::Result<SqliteStore> {
    let config = ServerConfig {
        data_dir: PathBuf::from(data_dir),
        ..ServerConfig::default()
    };
    let db_path = config.db_path();

    if !db_path.exists() {
        anyhow::bail!(
            "Database not found at {}. Run 'hearth admin init' first.",
            db_path.display()
        );
    }

    SqliteStore::new(&db_path).map_err(Into::into)
}

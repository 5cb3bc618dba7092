//! # Hearth
//!
//! Discover, join and start local house-church communities. The crate holds
//! the community directory, the map view model, per-device preferences, an
//! HTTP API and a CLI client.
//!
//! ## Library Usage
//!
//! ```toml
//! [dependencies]
//! hearth = { version = "0.0.1", default-features = false }
//! ```
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use std::path::PathBuf;
//! use hearth::config::MapSettings;
//! use hearth::server::{AppState, create_router};
//! use hearth::store::{SqliteStore, Store};
//!
//! let store = SqliteStore::new("./data/hearth.db").unwrap();
//! store.initialize().unwrap();
//!
//! let state = Arc::new(AppState::new(
//!     Arc::new(store),
//!     PathBuf::from("./data"),
//!     MapSettings::default(),
//! ));
//! let router = create_router(state);
//! // Serve with axum...
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): Includes the CLI module and the HTTP map token source.
//!   Disable with `default-features = false`.

pub mod auth;
#[cfg(feature = "cli")]
pub mod cli;
pub mod community;
pub mod config;
pub mod error;
pub mod map;
pub mod notify;
pub mod preferences;
pub mod server;
pub mod store;
pub mod types;

mod file;
mod server;

pub use file::{ConfigFile, MAP_TOKEN_ENV, MapSettings};
pub use server::ServerConfig;

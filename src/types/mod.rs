mod geo;
mod models;
mod role;

pub use geo::GeoPoint;
pub use models::*;
pub use role::{MemberRole, TrustLevel};

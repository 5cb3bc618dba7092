//! Map presentation: access token handling, community markers and the
//! interactive view state.

mod token;
mod view;

#[cfg(feature = "cli")]
pub use token::HttpTokenSource;
pub use token::{MapTokenSource, StaticTokenSource, TokenResponse};
pub use view::{
    Camera, Control, DEFAULT_CENTER, DEFAULT_ZOOM, DetailCard, GeolocationProvider, MapInstance,
    MapState, MapView, Marker, Popup, USER_ZOOM, markers_for,
};

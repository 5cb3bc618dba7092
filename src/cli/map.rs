use std::sync::{Arc, Mutex};

use super::credentials::{config_dir, load_credentials};
use super::http_client::ApiClient;
use crate::config::ConfigFile;
use crate::map::{
    DetailCard, HttpTokenSource, MapInstance, MapState, MapTokenSource, MapView, StaticTokenSource,
};
use crate::types::{Community, GeoPoint};

pub struct MapArgs {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub zoom: Option<f64>,
    pub select: Option<String>,
    /// Used instead of asking the server for one.
    pub token: Option<String>,
    pub retries: u32,
    pub json: bool,
}

pub fn run_map(args: MapArgs) -> anyhow::Result<()> {
    let client = ApiClient::new(&load_credentials()?)?;
    let communities: Vec<Community> = client.get("/communities")?;

    let settings = ConfigFile::load(&config_dir()?.join("hearth.toml"))?
        .with_env()
        .map;
    let zoom = args.zoom.unwrap_or(settings.default_zoom);

    let position = match (args.lat, args.lng) {
        (Some(lat), Some(lng)) => {
            let point = GeoPoint::new(lat, lng);
            if !point.is_valid() {
                anyhow::bail!("Coordinates out of range: {lat}, {lng}");
            }
            Some(point)
        }
        _ => None,
    };

    // A locally configured token skips the server's token endpoint.
    let tokens: Box<dyn MapTokenSource> = match args.token.or(settings.token) {
        Some(token) => Box::new(StaticTokenSource::new(Some(token))),
        None => Box::new(HttpTokenSource::new(client.base_url())?),
    };
    let mut view = MapView::new(communities).with_default_zoom(zoom);

    let picked = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&picked);
    view.on_select(move |community| {
        *sink.lock().unwrap_or_else(|e| e.into_inner()) = Some(community.name.clone());
    });

    view.mount(tokens.as_ref(), &position);
    let mut attempts = 0;
    while let MapState::Unavailable { reason } = view.state() {
        if attempts >= args.retries {
            anyhow::bail!("Map unavailable: {reason}");
        }
        attempts += 1;
        tracing::info!("Retrying map token ({attempts}/{})", args.retries);
        view.retry(tokens.as_ref());
    }

    if let Some(id) = &args.select {
        if !view.select(id) {
            anyhow::bail!("Community '{id}' is not on the map");
        }
        tracing::debug!(
            "Selected {:?}",
            picked.lock().unwrap_or_else(|e| e.into_inner())
        );
    }

    let Some(instance) = view.instance() else {
        anyhow::bail!("Map did not finish loading");
    };

    if args.json {
        let output = serde_json::json!({
            "map": instance,
            "selected": view.detail_card(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    print_instance(instance);
    if let Some(card) = view.detail_card() {
        print_card(&card);
    }
    Ok(())
}

fn print_instance(instance: &MapInstance) {
    let camera = instance.camera;
    println!();
    println!(
        "Map centred on {:.4}, {:.4} at zoom {}",
        camera.center.latitude, camera.center.longitude, camera.zoom
    );
    if let Some(you) = instance.user_marker {
        println!("  You are here: {:.4}, {:.4}", you.latitude, you.longitude);
    }
    println!();
    if instance.markers.is_empty() {
        println!("  No communities on the map.");
    }
    for marker in &instance.markers {
        println!(
            "  [{:>9.4}, {:>9.4}]  {}  ({})  {} members, {}",
            marker.position.latitude,
            marker.position.longitude,
            marker.popup.name,
            marker.popup.location,
            marker.popup.member_count,
            marker.popup.trust_level.label()
        );
    }
    println!();
}

fn print_card(card: &DetailCard) {
    println!("{}", card.name);
    println!("  {}", card.location);
    println!("  {}", card.schedule);
    println!(
        "  {} members, {}",
        card.member_count,
        card.trust_level.label()
    );
    if !card.description.is_empty() {
        println!("  {}", card.description);
    }
    println!();
}

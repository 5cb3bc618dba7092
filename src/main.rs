use std::path::PathBuf;
use std::sync::Arc;

use anyhow::bail;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use hearth::cli::{
    ADMIN_TOKEN_FILE, AdminCommands, AuthCommands, CommunityCommands, MapArgs, PrefsCommands,
    UserCommands,
};
use hearth::config::{ConfigFile, ServerConfig};
use hearth::server::{AppState, create_router};
use hearth::store::{SqliteStore, Store};

#[derive(Parser)]
#[command(name = "hearth")]
#[command(about = "Find, join and start local house-church communities", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Administrative commands (operate on the data directory directly)
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },

    /// Start the server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(long, short, default_value = "8080")]
        port: u16,

        /// Data directory for the database and configuration
        #[arg(long, default_value = "./data")]
        data_dir: String,
    },

    /// Manage authentication
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },

    /// Browse, join and create communities
    Community {
        #[command(subcommand)]
        command: CommunityCommands,
    },

    /// Notification and profile preferences for this device
    Prefs {
        #[command(subcommand)]
        command: PrefsCommands,
    },

    /// Show the community map
    Map {
        /// Your latitude (requires --lng)
        #[arg(long, requires = "lng", allow_hyphen_values = true)]
        lat: Option<f64>,

        /// Your longitude (requires --lat)
        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lng: Option<f64>,

        /// Initial zoom (default from hearth.toml)
        #[arg(long)]
        zoom: Option<f64>,

        /// Community ID to show details for
        #[arg(long)]
        select: Option<String>,

        /// Map access token to use instead of the server's
        #[arg(long)]
        token: Option<String>,

        /// How many times to retry fetching the map token
        #[arg(long, default_value = "1")]
        retries: u32,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn serve(config: ServerConfig) -> anyhow::Result<()> {
    let token_file = config.data_dir.join(ADMIN_TOKEN_FILE);
    let db_path = config.db_path();
    if !db_path.exists() {
        bail!("Not initialized. Run 'hearth admin init' first to create the database and admin token.");
    }

    let store = SqliteStore::new(&db_path)?;
    store.initialize()?;
    if !store.has_admin_token()? {
        bail!("Not initialized. Run 'hearth admin init' first to create the database and admin token.");
    }
    if token_file.exists() {
        info!("Admin token available at {}", token_file.display());
    }

    let settings = ConfigFile::load(&config.config_path())?.with_env().map;
    if settings.token.is_none() {
        tracing::warn!("No map token configured; /api/v1/map/token will return 503");
    }

    let state = Arc::new(AppState::new(
        Arc::new(store),
        config.data_dir.clone(),
        settings,
    ));
    let app = create_router(state);
    let addr = config.socket_addr()?;

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async move {
        info!("Starting server on {}", addr);
        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;
        Ok::<_, anyhow::Error>(())
    })
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("hearth=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Admin { command } => match command {
            AdminCommands::Init {
                data_dir,
                non_interactive,
            } => hearth::cli::run_init(data_dir, non_interactive)?,
            AdminCommands::User { command } => match command {
                UserCommands::Add {
                    data_dir,
                    name,
                    create_token,
                    non_interactive,
                } => hearth::cli::run_user_add(data_dir, name, create_token, non_interactive)?,
            },
            AdminCommands::Reconcile {
                data_dir,
                community_id,
            } => hearth::cli::run_reconcile(data_dir, community_id)?,
        },
        Commands::Serve {
            host,
            port,
            data_dir,
        } => serve(ServerConfig {
            host,
            port,
            data_dir: PathBuf::from(data_dir),
        })?,
        Commands::Auth { command } => match command {
            AuthCommands::Login {
                server,
                token,
                non_interactive,
            } => hearth::cli::run_auth_login(server, token, non_interactive)?,
            AuthCommands::Logout => hearth::cli::run_auth_logout()?,
        },
        Commands::Community { command } => match command {
            CommunityCommands::List {
                lat,
                lng,
                radius_km,
                json,
            } => hearth::cli::run_community_list(lat, lng, radius_km, json)?,
            CommunityCommands::Show { id, json } => hearth::cli::run_community_show(id, json)?,
            CommunityCommands::Create {
                name,
                description,
                day,
                time,
                city,
                state,
                lat,
                lng,
                tags,
                non_interactive,
            } => hearth::cli::run_community_create(
                name,
                description,
                day,
                time,
                city,
                state,
                lat,
                lng,
                tags,
                non_interactive,
            )?,
            CommunityCommands::Join { id } => hearth::cli::run_community_join(id)?,
            CommunityCommands::Leave { id, yes } => hearth::cli::run_community_leave(id, yes)?,
            CommunityCommands::Mine { json } => hearth::cli::run_community_mine(json)?,
        },
        Commands::Prefs { command } => match command {
            PrefsCommands::Show { json } => hearth::cli::run_prefs_show(json)?,
            PrefsCommands::Set { key, value } => hearth::cli::run_prefs_set(&key, value)?,
        },
        Commands::Map {
            lat,
            lng,
            zoom,
            select,
            token,
            retries,
            json,
        } => hearth::cli::run_map(MapArgs {
            lat,
            lng,
            zoom,
            select,
            token,
            retries,
            json,
        })?,
    }

    Ok(())
}

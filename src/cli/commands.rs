use clap::Subcommand;

#[derive(Subcommand)]
pub enum AdminCommands {
    /// Initialize the data directory (create database and admin token)
    Init {
        /// Data directory for the database and configuration
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Skip interactive prompts
        #[arg(long)]
        non_interactive: bool,
    },

    /// Manage users
    User {
        #[command(subcommand)]
        command: UserCommands,
    },

    /// Recompute member counts from membership rows
    Reconcile {
        /// Data directory for the database and configuration
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Community to reconcile (default: all communities)
        #[arg(long)]
        community_id: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// Add a new user and optionally a token
    Add {
        /// Data directory for the database and configuration
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Display name for the new user
        #[arg(long)]
        name: Option<String>,

        /// Create a token for the new user
        #[arg(long)]
        create_token: bool,

        /// Skip interactive prompts (requires --name)
        #[arg(long)]
        non_interactive: bool,
    },
}

#[derive(Subcommand)]
pub enum AuthCommands {
    /// Configure server URL and authentication token
    Login {
        /// Server URL (e.g., "localhost:8080")
        #[arg(long)]
        server: Option<String>,

        /// User token
        #[arg(long)]
        token: Option<String>,

        /// Skip interactive prompts (requires --server and --token)
        #[arg(long)]
        non_interactive: bool,
    },

    /// Remove stored credentials
    Logout,
}

#[derive(Subcommand)]
pub enum CommunityCommands {
    /// List communities, newest first
    List {
        /// Latitude of a nearby search origin (requires --lng)
        #[arg(long, requires = "lng", allow_hyphen_values = true)]
        lat: Option<f64>,

        /// Longitude of a nearby search origin (requires --lat)
        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lng: Option<f64>,

        /// Search radius in kilometres
        #[arg(long)]
        radius_km: Option<f64>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one community
    Show {
        /// Community ID (prompts when omitted)
        id: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Create a community led by you
    Create {
        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        description: Option<String>,

        /// Meeting weekday (default: Sunday)
        #[arg(long)]
        day: Option<String>,

        /// Meeting time (default: 10:00 AM)
        #[arg(long)]
        time: Option<String>,

        #[arg(long)]
        city: Option<String>,

        #[arg(long)]
        state: Option<String>,

        #[arg(long, allow_hyphen_values = true)]
        lat: Option<f64>,

        #[arg(long, allow_hyphen_values = true)]
        lng: Option<f64>,

        /// Tags (comma-separated)
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,

        /// Skip interactive prompts
        #[arg(long)]
        non_interactive: bool,
    },

    /// Join a community
    Join {
        /// Community ID (prompts when omitted)
        id: Option<String>,
    },

    /// Leave a community
    Leave {
        /// Community ID (prompts when omitted)
        id: Option<String>,

        /// Skip confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// List the communities you belong to
    Mine {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum PrefsCommands {
    /// Show current preferences
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Change one preference
    Set {
        /// Preference name (e.g., weekly_digest)
        key: String,

        /// New value (true/false, on/off, yes/no)
        #[arg(action = clap::ArgAction::Set, value_parser = clap::builder::BoolishValueParser::new())]
        value: bool,
    },
}

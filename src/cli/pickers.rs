use std::fmt;

use chrono::{DateTime, Duration, Utc};
use inquire::{InquireError, Select};

use super::http_client::ApiClient;
use crate::types::{Community, UserCommunity};

/// Community summary line for listings and pickers
pub struct CommunityDisplay<'a>(pub &'a Community);

impl fmt::Display for CommunityDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = self.0;
        write!(
            f,
            "{}  ({})  {} members  [{}]",
            c.name,
            c.location_label(),
            c.member_count,
            c.trust_level.label()
        )
    }
}

struct CommunityOption(Community);

impl fmt::Display for CommunityOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        CommunityDisplay(&self.0).fmt(f)
    }
}

/// Token expiration option for display
#[derive(Clone)]
pub struct ExpirationOption {
    pub label: &'static str,
    pub days: Option<i64>,
}

impl fmt::Display for ExpirationOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label)
    }
}

pub fn print_communities(communities: &[Community]) {
    if communities.is_empty() {
        println!("No communities found.");
        return;
    }
    println!();
    for community in communities {
        println!("  {}", CommunityDisplay(community));
        println!(
            "    {}  created {}",
            community.id,
            format_relative_time(&community.created_at)
        );
    }
    println!();
}

pub fn print_user_communities(communities: &[UserCommunity]) {
    if communities.is_empty() {
        println!("You have not joined any communities yet.");
        return;
    }
    println!();
    for entry in communities {
        println!("  {}  <{}>", CommunityDisplay(&entry.community), entry.role);
        println!("    {}", entry.community.id);
    }
    println!();
}

/// Format a datetime as relative time (e.g., "2 days ago")
#[must_use]
pub fn format_relative_time(dt: &DateTime<Utc>) -> String {
    let diff = Utc::now().signed_duration_since(*dt);

    if diff.num_seconds() < 0 {
        return "in the future".to_string();
    }

    let (value, unit) = if diff.num_seconds() < 60 {
        return "just now".to_string();
    } else if diff.num_minutes() < 60 {
        (diff.num_minutes(), "minute")
    } else if diff.num_hours() < 24 {
        (diff.num_hours(), "hour")
    } else if diff.num_days() < 30 {
        (diff.num_days(), "day")
    } else if diff.num_days() < 365 {
        (diff.num_days() / 30, "month")
    } else {
        (diff.num_days() / 365, "year")
    };

    if value == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{value} {unit}s ago")
    }
}

/// Use the given community ID, or prompt for one from the server's list.
/// `Ok(None)` means the prompt was cancelled.
pub fn get_or_pick_community(
    client: &ApiClient,
    id: Option<String>,
    non_interactive: bool,
) -> anyhow::Result<Option<String>> {
    if let Some(id) = id {
        return Ok(Some(id));
    }
    if non_interactive {
        anyhow::bail!("A community ID is required in non-interactive mode");
    }

    let communities: Vec<Community> = client.get("/communities")?;
    if communities.is_empty() {
        println!("No communities found.");
        return Ok(None);
    }

    let options: Vec<CommunityOption> = communities.into_iter().map(CommunityOption).collect();
    let selection = Select::new("Select community:", options)
        .with_page_size(15)
        .with_help_message("Type to filter, Enter to select")
        .with_vim_mode(true)
        .prompt();

    match selection {
        Ok(option) => Ok(Some(option.0.id)),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Returns `None` when cancelled, `Some(None)` for a token that never expires.
pub fn pick_expiration() -> anyhow::Result<Option<Option<Duration>>> {
    let options = vec![
        ExpirationOption {
            label: "30 days",
            days: Some(30),
        },
        ExpirationOption {
            label: "90 days",
            days: Some(90),
        },
        ExpirationOption {
            label: "1 year",
            days: Some(365),
        },
        ExpirationOption {
            label: "Never",
            days: None,
        },
    ];

    let selection = Select::new("Token expiration:", options)
        .with_page_size(4)
        .with_vim_mode(true)
        .prompt();

    match selection {
        Ok(opt) => Ok(Some(opt.days.map(Duration::days))),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn confirm_action(message: &str, yes: bool, non_interactive: bool) -> anyhow::Result<bool> {
    if yes {
        Ok(true)
    } else if non_interactive {
        anyhow::bail!("--yes is required in non-interactive mode");
    } else {
        Ok(inquire::Confirm::new(message)
            .with_default(false)
            .prompt()?)
    }
}

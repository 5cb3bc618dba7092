use serde::Serialize;

use super::credentials::load_credentials;
use super::http_client::ApiClient;
use super::pickers::{
    confirm_action, get_or_pick_community, print_communities, print_user_communities,
};
use crate::community::CommunityDraft;
use crate::server::dto::{JoinResponse, LeaveResponse};
use crate::types::{Community, Membership, NearbyCommunity, UserCommunity};

fn client() -> anyhow::Result<ApiClient> {
    ApiClient::new(&load_credentials()?)
}

#[derive(Serialize)]
struct NearbyQuery {
    lat: f64,
    lng: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    radius_km: Option<f64>,
}

pub fn run_community_list(
    lat: Option<f64>,
    lng: Option<f64>,
    radius_km: Option<f64>,
    json: bool,
) -> anyhow::Result<()> {
    let client = client()?;

    let (Some(lat), Some(lng)) = (lat, lng) else {
        let communities: Vec<Community> = client.get("/communities")?;
        if json {
            println!("{}", serde_json::to_string_pretty(&communities)?);
        } else {
            print_communities(&communities);
        }
        return Ok(());
    };

    let nearby: Vec<NearbyCommunity> =
        client.get_with_query("/communities", &NearbyQuery { lat, lng, radius_km })?;
    if json {
        println!("{}", serde_json::to_string_pretty(&nearby)?);
        return Ok(());
    }

    if nearby.is_empty() {
        println!("No communities found nearby.");
        return Ok(());
    }
    println!();
    for entry in &nearby {
        println!(
            "  {:>7.1} km  {}  ({})",
            entry.distance_km,
            entry.community.name,
            entry.community.location_label()
        );
        println!("             {}", entry.community.id);
    }
    println!();
    Ok(())
}

pub fn run_community_show(id: Option<String>, json: bool) -> anyhow::Result<()> {
    let client = client()?;
    let Some(id) = get_or_pick_community(&client, id, json)? else {
        return Ok(());
    };

    let community: Community = client.get(&format!("/communities/{id}"))?;
    if json {
        println!("{}", serde_json::to_string_pretty(&community)?);
        return Ok(());
    }

    let members: Vec<Membership> = client.get(&format!("/communities/{id}/members"))?;

    println!();
    println!("{}", community.name);
    println!("  Location:  {}", community.location_label());
    println!(
        "  Meets:     {}s at {}",
        community.meeting_day, community.meeting_time
    );
    println!("  Trust:     {}", community.trust_level.label());
    println!("  Members:   {}", community.member_count);
    if !community.tags.is_empty() {
        println!("  Tags:      {}", community.tags.join(", "));
    }
    if !community.description.is_empty() {
        println!();
        println!("  {}", community.description);
    }
    println!();
    for member in &members {
        println!("    {}  {}", member.user_id, member.role);
    }
    println!();
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn run_community_create(
    name: Option<String>,
    description: Option<String>,
    day: Option<String>,
    time: Option<String>,
    city: Option<String>,
    state: Option<String>,
    lat: Option<f64>,
    lng: Option<f64>,
    tags: Vec<String>,
    non_interactive: bool,
) -> anyhow::Result<()> {
    let client = client()?;

    let name = match name {
        Some(name) => Some(name),
        None if non_interactive => None,
        None => Some(inquire::Text::new("Community name:").prompt()?),
    };

    let mut draft = CommunityDraft {
        name,
        description,
        meeting_day: day,
        meeting_time: time,
        location_city: city,
        location_state: state,
        location_lat: lat,
        location_lng: lng,
        ..CommunityDraft::default()
    };
    if !tags.is_empty() {
        draft = draft.with_tags(tags);
    }

    let community: Community = client.post("/communities", &draft)?;

    println!();
    println!("Community created: {}", community.name);
    println!("  {}", community.id);
    println!();
    Ok(())
}

pub fn run_community_join(id: Option<String>) -> anyhow::Result<()> {
    let client = client()?;
    let Some(id) = get_or_pick_community(&client, id, false)? else {
        return Ok(());
    };

    let joined: JoinResponse = client.post(&format!("/communities/{id}/membership"), &())?;

    println!();
    println!("You are now a member of {}", joined.community.name);
    println!("  {} members", joined.community.member_count);
    println!();
    Ok(())
}

pub fn run_community_leave(id: Option<String>, yes: bool) -> anyhow::Result<()> {
    let client = client()?;
    let Some(id) = get_or_pick_community(&client, id, yes)? else {
        return Ok(());
    };

    if !confirm_action("Leave this community?", yes, false)? {
        println!("Cancelled.");
        return Ok(());
    }

    let left: LeaveResponse = client.delete(&format!("/communities/{id}/membership"))?;

    println!();
    if left.removed {
        println!("You have left {}", left.community.name);
    } else {
        println!("You were not a member of {}", left.community.name);
    }
    println!();
    Ok(())
}

pub fn run_community_mine(json: bool) -> anyhow::Result<()> {
    let communities: Vec<UserCommunity> = client()?.get("/me/communities")?;
    if json {
        println!("{}", serde_json::to_string_pretty(&communities)?);
    } else {
        print_user_communities(&communities);
    }
    Ok(())
}

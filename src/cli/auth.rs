use inquire::Text;

use super::credentials::{Credentials, delete_credentials, save_credentials};
use super::http_client::ApiClient;
use crate::auth::looks_like_token;
use crate::types::UserCommunity;

fn normalize_server_url(url: &str) -> String {
    let url = url
        .trim()
        .trim_end_matches('/')
        .trim_end_matches("/api/v1")
        .trim_end_matches("/api")
        .trim_end_matches('/');

    if url.starts_with("http://") || url.starts_with("https://") {
        return url.to_string();
    }

    if url.starts_with("localhost") || url.starts_with("127.0.0.1") {
        format!("http://{url}")
    } else {
        format!("https://{url}")
    }
}

pub fn run_auth_login(
    server: Option<String>,
    token: Option<String>,
    non_interactive: bool,
) -> anyhow::Result<()> {
    let server = match server {
        Some(s) if s.trim().is_empty() => anyhow::bail!("Server URL cannot be empty"),
        Some(s) => s,
        None if non_interactive => anyhow::bail!("--server is required in non-interactive mode"),
        None => Text::new("Server URL:")
            .with_validator(|input: &str| {
                if input.trim().is_empty() {
                    Ok(inquire::validator::Validation::Invalid(
                        "Server URL is required".into(),
                    ))
                } else {
                    Ok(inquire::validator::Validation::Valid)
                }
            })
            .prompt()?,
    };
    let server_url = normalize_server_url(&server);

    let token = match token {
        Some(t) => t,
        None if non_interactive => anyhow::bail!("--token is required in non-interactive mode"),
        None => Text::new("Token:").with_placeholder("hearth_...").prompt()?,
    };
    let token = token.trim().to_string();

    if !looks_like_token(&token) {
        anyhow::bail!("Invalid token format. Tokens look like 'hearth_<lookup>_<secret>'");
    }

    let creds = Credentials {
        server_url: server_url.clone(),
        token,
    };

    // Only user tokens can read this; it doubles as a credential check.
    let client = ApiClient::new(&creds)?;
    let _: Vec<UserCommunity> = client.get("/me/communities")?;

    save_credentials(&creds)?;

    println!();
    println!("Logged in to {server_url}");
    println!();

    Ok(())
}

pub fn run_auth_logout() -> anyhow::Result<()> {
    println!();
    if delete_credentials()? {
        println!("Logged out successfully.");
    } else {
        println!("No credentials found.");
    }
    println!();
    Ok(())
}

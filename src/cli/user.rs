use chrono::{Duration, Utc};
use inquire::{Confirm, Text};

use super::init_store;
use super::pickers::pick_expiration;
use crate::auth::TokenGenerator;
use crate::error::Error;
use crate::store::Store;
use crate::types::User;

pub(crate) fn create_user(store: &impl Store, name: &str) -> anyhow::Result<User> {
    let user = User::new(name)?;
    store.create_user(&user)?;
    Ok(user)
}

pub fn run_user_add(
    data_dir: String,
    name: Option<String>,
    create_token_flag: bool,
    non_interactive: bool,
) -> anyhow::Result<()> {
    let store = init_store(&data_dir)?;

    let name = match name {
        Some(name) => name,
        None if non_interactive => anyhow::bail!("--name is required in non-interactive mode"),
        None => Text::new("Display name:")
            .with_validator(|input: &str| {
                Ok(match User::validate_display_name(input) {
                    Ok(()) => inquire::validator::Validation::Valid,
                    Err(Error::Validation(msg)) => {
                        inquire::validator::Validation::Invalid(msg.into())
                    }
                    Err(e) => inquire::validator::Validation::Invalid(e.to_string().into()),
                })
            })
            .prompt()?,
    };

    let user = create_user(&store, &name)?;

    println!();
    println!("Created user \"{}\" ({})", user.display_name, user.id);

    let should_create_token = if create_token_flag {
        true
    } else if non_interactive {
        false
    } else {
        Confirm::new("Create access token?")
            .with_default(true)
            .prompt()?
    };

    if should_create_token {
        let expires_in: Option<Duration> = if non_interactive {
            None
        } else {
            match pick_expiration()? {
                Some(exp) => exp,
                None => {
                    println!("Token creation cancelled.");
                    return Ok(());
                }
            }
        };

        let issued =
            TokenGenerator::new().issue(Some(&user.id), expires_in.map(|d| Utc::now() + d))?;
        store.create_token(&issued.token)?;

        println!();
        println!("Token created: {}", issued.raw);
        println!("  Save this now - it cannot be retrieved later.");
    }

    println!();

    Ok(())
}

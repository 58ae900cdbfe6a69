//! Directory edits requested on the command line.

use anyhow::{bail, Context, Result};
use clap::Subcommand;
use client_core::{UsersAction, UsersClient};
use shared::{
    domain::{User, UserChanges, UserId},
    protocol::UserUpdate,
};

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Show the directory.
    List,
    /// Create a user.
    Add { name: String },
    /// Delete a user by id.
    Remove { id: String },
    /// Change a user's name.
    Rename { id: String, name: String },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Add { .. } => "add",
            Self::Remove { .. } => "remove",
            Self::Rename { .. } => "rename",
        }
    }
}

/// Where an edit is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditMode {
    /// Send to the remote resource, store what it confirms.
    Remote,
    /// Change the local store only.
    Local,
}

fn validated_name(raw: &str) -> Result<&str> {
    let name = raw.trim();
    if name.is_empty() {
        bail!("user name must not be blank");
    }
    Ok(name)
}

/// Applies `command` and returns a status line for the user.
pub async fn run_command(
    client: &UsersClient,
    command: Command,
    mode: EditMode,
) -> Result<Option<String>> {
    let store = client.store();
    match (command, mode) {
        (Command::List, _) => Ok(None),
        (Command::Add { name }, EditMode::Local) => {
            let user = User::new(UserId::generate(), validated_name(&name)?);
            let status = format!("Added {} locally as {}", user.name, user.id);
            store.dispatch(UsersAction::AddUser(user)).await;
            Ok(Some(status))
        }
        (Command::Add { name }, EditMode::Remote) => {
            let user = client
                .add_user_named(validated_name(&name)?)
                .await
                .context("failed to add user")?;
            Ok(Some(format!("Added {} as {}", user.name, user.id)))
        }
        (Command::Remove { id }, EditMode::Local) => {
            store.dispatch(UsersAction::RemoveUser(UserId::new(id.as_str()))).await;
            Ok(Some(format!("Removed {id} locally")))
        }
        (Command::Remove { id }, EditMode::Remote) => {
            let id = client
                .remove_user_async(UserId::new(id))
                .await
                .context("failed to remove user")?;
            Ok(Some(format!("Removed {id}")))
        }
        (Command::Rename { id, name }, EditMode::Local) => {
            let name = validated_name(&name)?;
            let id = UserId::new(id);
            if store.select_user_by_id(&id).await.is_none() {
                bail!("no user with id {id}");
            }
            store
                .dispatch(UsersAction::UpdateUser {
                    id: id.clone(),
                    changes: UserChanges::rename(name),
                })
                .await;
            Ok(Some(format!("Renamed {id} to {name} locally")))
        }
        (Command::Rename { id, name }, EditMode::Remote) => {
            let name = validated_name(&name)?;
            let id = UserId::new(id);
            if store.select_user_by_id(&id).await.is_none() {
                bail!("no user with id {id}");
            }
            let user = client
                .update_user_async(UserUpdate::new(id, name))
                .await
                .context("failed to rename user")?;
            Ok(Some(format!("Renamed {} to {}", user.id, user.name)))
        }
    }
}

#[cfg(test)]
#[path = "tests/commands_tests.rs"]
mod tests;

//! Server and character selection rules for the launcher.
//!
//! When the server list, server type or character roster changes, the
//! launcher re-derives which server and which character should be selected.
//! These functions hold those rules; the caller owns the session state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use strum::{EnumIter, IntoEnumIterator};

/// Channel preferred when selecting among tool channels.
pub const EDITOR_CHANNEL: &str = "Editor";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ServerType {
    /// Game shard.
    CuGame,
    /// Tool or editor channel.
    Channel,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatcherServer {
    pub name: String,
    #[serde(rename = "type")]
    pub server_type: ServerType,
    #[serde(default, rename = "shardID")]
    pub shard_id: Option<u32>,
    #[serde(default)]
    pub channel_patch_permissions: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimpleCharacter {
    pub id: String,
    pub name: String,
    #[serde(rename = "shardID")]
    pub shard_id: u32,
    /// RFC 3339 timestamp of the last login.
    #[serde(default)]
    pub last_login: String,
}

impl SimpleCharacter {
    fn last_login_at(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.last_login)
            .ok()
            .map(|at| at.with_timezone(&Utc))
    }
}

/// Permission bits granted to an account. The bit layout mirrors the
/// patcher's access types; bits outside this table are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
#[repr(u32)]
pub enum AccessLevel {
    Public = 1,
    Beta3 = 2,
    Beta2 = 4,
    Beta1 = 8,
    Alpha = 16,
    InternalTest = 32,
    Employees = 64,
}

impl AccessLevel {
    pub fn bit(self) -> u32 {
        self as u32
    }

    pub fn label(self) -> &'static str {
        match self {
            AccessLevel::Public => "Public",
            AccessLevel::Beta3 => "Beta 3",
            AccessLevel::Beta2 => "Beta 2",
            AccessLevel::Beta1 => "Beta 1",
            AccessLevel::Alpha => "Alpha",
            AccessLevel::InternalTest => "Internal Test",
            AccessLevel::Employees => "Employees",
        }
    }
}

/// Text shown after "Your Access Level:".
pub fn access_level_label(permissions: u32) -> String {
    let labels: Vec<&str> = AccessLevel::iter()
        .filter(|level| permissions & level.bit() != 0)
        .map(AccessLevel::label)
        .collect();
    if labels.is_empty() {
        "None".to_string()
    } else {
        labels.join(", ")
    }
}

pub fn can_access_channel(user_permissions: u32, channel_permissions: u32) -> bool {
    user_permissions & channel_permissions != 0
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerSelection {
    Selected(PatcherServer),
    /// No server of the requested type is accessible; the caller clears the
    /// selection and shows the no-access state.
    NoAccess,
}

/// True when there is no selected server or it belongs to another type.
pub fn needs_server_reselect(selected: Option<&PatcherServer>, server_type: ServerType) -> bool {
    selected.is_none_or(|server| server.server_type != server_type)
}

/// Pick a server of `server_type` the account may access, in list order.
/// Channels prefer [`EDITOR_CHANNEL`].
pub fn select_server(
    servers: &[PatcherServer],
    server_type: ServerType,
    permissions: u32,
) -> ServerSelection {
    let accessible: Vec<&PatcherServer> = servers
        .iter()
        .filter(|server| server.server_type == server_type)
        .filter(|server| can_access_channel(permissions, server.channel_patch_permissions))
        .collect();

    let Some(first) = accessible.first() else {
        tracing::debug!(?server_type, permissions, "no accessible servers");
        return ServerSelection::NoAccess;
    };

    let chosen = match server_type {
        ServerType::Channel => accessible
            .iter()
            .find(|server| server.name == EDITOR_CHANNEL)
            .unwrap_or(first),
        ServerType::CuGame => first,
    };
    ServerSelection::Selected((*chosen).clone())
}

/// Character that should be selected for `selected_server`.
///
/// Keeps `current` while it is still in the roster and on the server's shard;
/// otherwise picks the most recently played character on that shard.
/// Characters with unreadable login times sort last.
pub fn select_character(
    characters: &HashMap<String, SimpleCharacter>,
    selected_server: Option<&PatcherServer>,
    current: Option<&SimpleCharacter>,
) -> Option<SimpleCharacter> {
    let shard = selected_server.and_then(|server| server.shard_id)?;

    if let Some(current) = current {
        let still_valid = characters.contains_key(&current.id) && current.shard_id == shard;
        if still_valid {
            return Some(current.clone());
        }
    }

    let mut on_shard: Vec<&SimpleCharacter> = characters
        .values()
        .filter(|character| character.shard_id == shard)
        .collect();
    on_shard.sort_by(|a, b| most_recent_first(a, b));
    on_shard.first().map(|character| (*character).clone())
}

fn most_recent_first(a: &SimpleCharacter, b: &SimpleCharacter) -> Ordering {
    match (a.last_login_at(), b.last_login_at()) {
        (Some(a_at), Some(b_at)) => b_at.cmp(&a_at),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| a.id.cmp(&b.id))
}

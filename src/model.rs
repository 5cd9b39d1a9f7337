//! Payload records returned by the crafting queries.
//!
//! Field names follow the crafting service's camelCase GraphQL schema. Every
//! field except `voxState` may be absent or `null`, and fields the client does
//! not model land in `extra`, so a record serializes back to what the server
//! sent. An explicit `null` comes back as an absent field.

use crate::queries::NO_VOX_NEARBY;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Number, Value};
use std::fmt;

const NOT_OWNED_BY_PLAYER: &str = "This vox is not owned by you";

/// State reported for the vox nearest to the current character.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum VoxState {
    Found,
    NotFound,
    NotOwnedByPlayer,
    /// Any state the client does not know, kept verbatim.
    Other(String),
}

impl VoxState {
    pub fn as_str(&self) -> &str {
        match self {
            VoxState::Found => "Found",
            VoxState::NotFound => "NotFound",
            VoxState::NotOwnedByPlayer => "NotOwnedByPlayer",
            VoxState::Other(raw) => raw,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, VoxState::Found)
    }

    /// Message to show when this state blocks crafting; `None` for `Found`.
    /// Unrecognized states fall back to the raw state text.
    pub fn rejection_message(&self) -> Option<String> {
        match self {
            VoxState::Found => None,
            VoxState::NotFound => Some(NO_VOX_NEARBY.to_string()),
            VoxState::NotOwnedByPlayer => Some(NOT_OWNED_BY_PLAYER.to_string()),
            VoxState::Other(raw) => Some(raw.clone()),
        }
    }
}

impl From<String> for VoxState {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "Found" => VoxState::Found,
            "NotFound" => VoxState::NotFound,
            "NotOwnedByPlayer" => VoxState::NotOwnedByPlayer,
            _ => VoxState::Other(raw),
        }
    }
}

impl From<VoxState> for String {
    fn from(state: VoxState) -> Self {
        match state {
            VoxState::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for VoxState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Response fields the client does not model, carried through unchanged.
pub type Extra = Map<String, Value>;

/// Static description shared by items, templates and recipe outputs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Measured quantities are kept as JSON numbers so `120` stays an integer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemStats {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<Number>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Ingredient currently loaded into the vox.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoxIngredient {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<ItemStats>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub static_definition: Option<ItemDefinition>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Inventory item the vox would accept as an ingredient.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoxPossibleIngredient {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<Number>,
    #[serde(flatten)]
    pub extra: Extra,
}

pub type VoxTemplate = ItemDefinition;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoxRecipe {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_item: Option<ItemDefinition>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Snapshot of the nearest vox and its current job.
///
/// Only `voxState` is required; it decides whether the status resolves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoxStatus {
    pub vox_state: VoxState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_crafting_time: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_remaining: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    #[serde(default, rename = "recipeID", skip_serializing_if = "Option::is_none")]
    pub recipe_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<VoxTemplate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingredients: Option<Vec<VoxIngredient>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_items: Option<Vec<VoxIngredient>>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl VoxStatus {
    /// Loaded ingredients; empty when the server sent none or `null`.
    pub fn ingredients(&self) -> &[VoxIngredient] {
        self.ingredients.as_deref().unwrap_or_default()
    }

    pub fn output_items(&self) -> &[VoxIngredient] {
        self.output_items.as_deref().unwrap_or_default()
    }
}

/// Deserialize `null` as the field's default. For display-only records that
/// never serialize back.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// =============================================================================
// Crafting Query Registry
// =============================================================================
// Logical query names, recipe categories and the static registry of GraphQL
// bodies that the gateway wraps into `query <Name> { crafting { ... } }`.

use crate::error::GatewayError;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use strum::{EnumIter, IntoEnumIterator, IntoStaticStr};

/// Process-wide registry, populated on first use and never mutated.
pub static REGISTRY: Lazy<Arc<QueryRegistry>> = Lazy::new(|| Arc::new(QueryRegistry::builtin()));

/// User-facing message shared by the vox status and ingredient queries.
pub const NO_VOX_NEARBY: &str = "No vox nearby";

const ITEM_DEFINITION_FIELDS: &str = "id name description iconUrl";
const ITEM_STATS_FIELDS: &str = "quality unitCount weight";

// =============================================================================
// Recipe Categories
// =============================================================================

/// Closed set of recipe categories the crafting service exposes.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    EnumIter,
    IntoStaticStr,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RecipeCategory {
    Purify,
    Refine,
    Grind,
    Shape,
    Block,
    Weapon,
    Armor,
}

impl RecipeCategory {
    /// Lower-case category name, e.g. `weapon`.
    pub fn as_str(&self) -> &'static str {
        self.into()
    }

    /// Registry key, e.g. `QUERY_WEAPON_RECIPES`.
    pub fn registry_key(&self) -> String {
        format!("QUERY_{}_RECIPES", self.as_str().to_ascii_uppercase())
    }

    /// Field read from `response.crafting`, e.g. `weaponRecipes`.
    pub fn response_key(&self) -> String {
        format!("{}Recipes", self.as_str())
    }

    /// Message shown when the recipe query fails.
    pub fn failure_message(&self) -> String {
        format!("Could not get {} recipes", self.as_str())
    }
}

impl fmt::Display for RecipeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecipeCategory {
    type Err = GatewayError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_lowercase();
        RecipeCategory::iter()
            .find(|category| category.as_str() == normalized)
            .ok_or_else(|| GatewayError::UnsupportedCategory(raw.to_string()))
    }
}

// =============================================================================
// Query Names
// =============================================================================

/// Logical query selecting a registry body and a response key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryName {
    VoxStatus,
    PossibleIngredients,
    Templates,
    Recipes(RecipeCategory),
}

impl QueryName {
    /// Every built-in query, including one recipe query per category.
    pub fn all() -> Vec<QueryName> {
        let mut names = vec![
            QueryName::VoxStatus,
            QueryName::PossibleIngredients,
            QueryName::Templates,
        ];
        names.extend(RecipeCategory::iter().map(QueryName::Recipes));
        names
    }

    pub fn registry_key(&self) -> String {
        match self {
            QueryName::VoxStatus => "QUERY_VOX_STATUS".to_string(),
            QueryName::PossibleIngredients => "QUERY_POSSIBLE_INGREDIENTS".to_string(),
            QueryName::Templates => "QUERY_TEMPLATES".to_string(),
            QueryName::Recipes(category) => category.registry_key(),
        }
    }

    pub fn response_key(&self) -> String {
        match self {
            QueryName::VoxStatus => "voxStatus".to_string(),
            QueryName::PossibleIngredients => "possibleIngredients".to_string(),
            QueryName::Templates => "templates".to_string(),
            QueryName::Recipes(category) => category.response_key(),
        }
    }

    /// Fixed message returned for any failure of this query.
    pub fn failure_message(&self) -> String {
        match self {
            QueryName::VoxStatus | QueryName::PossibleIngredients => NO_VOX_NEARBY.to_string(),
            QueryName::Templates => "Could not get templates".to_string(),
            QueryName::Recipes(category) => category.failure_message(),
        }
    }
}

impl fmt::Display for QueryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.registry_key())
    }
}

// =============================================================================
// Registry
// =============================================================================

/// Mapping from registry key to the GraphQL body nested under `crafting`.
#[derive(Debug, Clone)]
pub struct QueryRegistry {
    entries: HashMap<String, String>,
}

impl QueryRegistry {
    /// Registry holding the bodies for every [`QueryName::all`] entry.
    pub fn builtin() -> Self {
        let mut entries = HashMap::new();
        entries.insert(
            QueryName::VoxStatus.registry_key(),
            vox_status_body(),
        );
        entries.insert(
            QueryName::PossibleIngredients.registry_key(),
            format!(
                "possibleIngredients {{ id name description iconUrl {ITEM_STATS_FIELDS} }}"
            ),
        );
        entries.insert(
            QueryName::Templates.registry_key(),
            format!("templates {{ {ITEM_DEFINITION_FIELDS} }}"),
        );
        for category in RecipeCategory::iter() {
            entries.insert(category.registry_key(), recipe_body(category));
        }
        Self { entries }
    }

    /// Build a registry from explicit entries.
    pub fn from_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(key, body)| (key.into(), body.into()))
                .collect(),
        }
    }

    pub fn lookup(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains(&self, name: &QueryName) -> bool {
        self.entries.contains_key(&name.registry_key())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render the full query document for `name`.
    pub fn document(&self, name: &QueryName) -> Result<String, GatewayError> {
        let key = name.registry_key();
        let body = self
            .lookup(&key)
            .ok_or_else(|| GatewayError::RegistryMiss(key.clone()))?;
        Ok(crafting_document(&key, body))
    }
}

impl Default for QueryRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

/// `query <name> { crafting { <body> } }`
pub fn crafting_document(name: &str, body: &str) -> String {
    format!("query {name} {{ crafting {{ {body} }} }}")
}

fn vox_status_body() -> String {
    format!(
        "voxStatus {{ voxState jobType jobState startTime totalCraftingTime timeRemaining \
         itemCount givenName recipeID template {{ {ITEM_DEFINITION_FIELDS} }} \
         ingredients {{ id givenName stats {{ {ITEM_STATS_FIELDS} }} staticDefinition {{ {ITEM_DEFINITION_FIELDS} }} }} \
         outputItems {{ id givenName stats {{ {ITEM_STATS_FIELDS} }} staticDefinition {{ {ITEM_DEFINITION_FIELDS} }} }} }}"
    )
}

fn recipe_body(category: RecipeCategory) -> String {
    format!(
        "{} {{ id name description outputItem {{ {ITEM_DEFINITION_FIELDS} }} }}",
        category.response_key()
    )
}

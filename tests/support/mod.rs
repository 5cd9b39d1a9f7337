#![allow(dead_code)]

use async_trait::async_trait;
use crafting_gateway::{
    CraftingGateway, GraphQlRequest, GraphQlResponse, GraphQlTransport, TransportError,
};
use crafting_gateway::metrics::MetricsCollector;
use parking_lot::Mutex;
use serde_json::{Value, json};
use std::sync::Arc;

enum Behavior {
    Respond(GraphQlResponse),
    Fail(String),
}

/// Transport that answers every request the same way and records what it
/// was sent.
pub struct StubTransport {
    behavior: Behavior,
    requests: Mutex<Vec<GraphQlRequest>>,
}

impl StubTransport {
    /// Echo `data` back as the response body for every request.
    pub fn with_data(data: Value) -> Arc<Self> {
        Self::with_response(GraphQlResponse::from_data(data))
    }

    pub fn with_response(response: GraphQlResponse) -> Arc<Self> {
        Arc::new(Self {
            behavior: Behavior::Respond(response),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Fail every request as if the endpoint were unreachable.
    pub fn failing(detail: &str) -> Arc<Self> {
        Arc::new(Self {
            behavior: Behavior::Fail(detail.to_string()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<GraphQlRequest> {
        self.requests.lock().clone()
    }

    pub fn last_query(&self) -> String {
        self.requests
            .lock()
            .last()
            .map(|request| request.query.clone())
            .expect("at least one request")
    }
}

#[async_trait]
impl GraphQlTransport for StubTransport {
    async fn execute(&self, request: GraphQlRequest) -> Result<GraphQlResponse, TransportError> {
        self.requests.lock().push(request);
        match &self.behavior {
            Behavior::Respond(response) => Ok(response.clone()),
            Behavior::Fail(detail) => Err(TransportError::Decode(detail.clone())),
        }
    }
}

/// Gateway over `transport` with its own metrics registry.
pub fn gateway(transport: Arc<StubTransport>) -> CraftingGateway {
    CraftingGateway::new(transport).with_metrics(Arc::new(MetricsCollector::new()))
}

pub fn crafting(fields: Value) -> Value {
    json!({ "crafting": fields })
}

/// Response carrying a value for every built-in crafting query.
pub fn crafting_fixture() -> Value {
    crafting(json!({
        "voxStatus": {
            "voxState": "Found",
            "jobType": "Make",
            "jobState": "Configuring",
            "startTime": "2017-06-02T18:21:30Z",
            "totalCraftingTime": 120,
            "timeRemaining": 45.5,
            "itemCount": 1,
            "givenName": "Ceremonial Blade",
            "recipeID": "recipe-sword",
            "template": {
                "id": "tpl-sword",
                "name": "Sword",
                "description": "A simple blade",
                "iconUrl": "icons/sword.png"
            },
            "ingredients": [{
                "id": "ing-1",
                "givenName": null,
                "stats": { "quality": 0.75, "unitCount": 3, "weight": 1.5 },
                "staticDefinition": {
                    "id": "iron-bar",
                    "name": "Iron Bar",
                    "description": null,
                    "iconUrl": "icons/iron.png"
                }
            }],
            "outputItems": [],
            "jobNotes": "queued by the HUD"
        },
        "possibleIngredients": [
            {
                "id": "pi-1",
                "name": "Iron Ore",
                "description": "Raw ore",
                "iconUrl": "icons/ore.png",
                "quality": 0.4,
                "unitCount": 12,
                "weight": 6.0
            },
            {
                "id": "pi-2",
                "name": "Oak Plank",
                "description": null,
                "iconUrl": null,
                "quality": 0.9,
                "unitCount": 2,
                "weight": 2.25
            }
        ],
        "templates": [
            { "id": "tpl-sword", "name": "Sword", "description": "A simple blade", "iconUrl": "icons/sword.png" },
            { "id": "tpl-shield", "name": "Shield", "description": null, "iconUrl": null }
        ],
        "weaponRecipes": [{
            "id": "recipe-sword",
            "name": "Iron Sword",
            "description": "Forge a sword",
            "category": "Weapon",
            "outputItem": { "id": "sword", "name": "Sword", "description": null, "iconUrl": null }
        }],
        "purifyRecipes": [{
            "id": "recipe-purify-iron",
            "name": "Purify Iron",
            "description": null,
            "outputItem": null
        }]
    }))
}

/// `crafting.<key>` of the fixture.
pub fn fixture_field(key: &str) -> Value {
    crafting_fixture()["crafting"][key].clone()
}

/// `value` with every `null` object member removed. Decoded records report
/// an explicit `null` as an absent field.
pub fn without_nulls(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, member)| !member.is_null())
                .map(|(key, member)| (key, without_nulls(member)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(without_nulls).collect()),
        other => other,
    }
}

//! Crafting query gateway.
//!
//! Each operation renders one registered query, performs exactly one
//! exchange through the injected transport and reshapes
//! `data.crafting.<key>` into a typed payload. Every failure collapses into
//! the operation's fixed message; the underlying cause is logged and
//! counted but never shown to the player.

use crate::error::{GatewayError, Rejection, RejectionCause};
use crate::log_slow_query;
use crate::logging::query_span;
use crate::metrics::{METRICS, MetricsCollector, QueryTimer};
use crate::model::{VoxPossibleIngredient, VoxRecipe, VoxStatus, VoxTemplate};
use crate::queries::{QueryName, QueryRegistry, RecipeCategory, REGISTRY};
use crate::transport::{GraphQlRequest, GraphQlResponse, GraphQlTransport};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::Instrument;

/// Root field every crafting query is nested under.
pub const CRAFTING_ROOT: &str = "crafting";

const SLOW_QUERY_MS: u64 = 2_000;

#[derive(Clone)]
pub struct CraftingGateway {
    transport: Arc<dyn GraphQlTransport>,
    registry: Arc<QueryRegistry>,
    metrics: Arc<MetricsCollector>,
}

impl CraftingGateway {
    /// Gateway over `transport` using the process-wide registry and metrics.
    pub fn new(transport: Arc<dyn GraphQlTransport>) -> Self {
        Self {
            transport,
            registry: REGISTRY.clone(),
            metrics: METRICS.clone(),
        }
    }

    pub fn with_registry(mut self, registry: Arc<QueryRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn transport(&self) -> &dyn GraphQlTransport {
        self.transport.as_ref()
    }

    pub fn registry(&self) -> &QueryRegistry {
        &self.registry
    }

    /// Status of the nearest vox. Resolves only when the vox is `Found`.
    pub async fn get_vox_status(&self) -> Result<VoxStatus, Rejection> {
        let name = QueryName::VoxStatus;
        let status: VoxStatus = self.run(name).await?;
        match status.vox_state.rejection_message() {
            None => Ok(status),
            Some(message) => {
                let cause = RejectionCause::State(status.vox_state.clone());
                tracing::info!(
                    crafting.query = %name,
                    vox_state = %status.vox_state,
                    "vox not available"
                );
                Err(Rejection::new(message, cause))
            }
        }
    }

    /// Inventory items the nearby vox would accept. An empty list resolves.
    pub async fn get_possible_ingredients(&self) -> Result<Vec<VoxPossibleIngredient>, Rejection> {
        self.run(QueryName::PossibleIngredients).await
    }

    pub async fn get_templates(&self) -> Result<Vec<VoxTemplate>, Rejection> {
        self.run(QueryName::Templates).await
    }

    pub async fn get_recipes_for(&self, category: RecipeCategory) -> Result<Vec<VoxRecipe>, Rejection> {
        self.run(QueryName::Recipes(category)).await
    }

    async fn run<T: DeserializeOwned>(&self, name: QueryName) -> Result<T, Rejection> {
        let key = name.registry_key();
        let span = query_span(&key);
        async {
            let timer = QueryTimer::start(self.metrics.clone(), key.clone());
            match self.exchange::<T>(&name).await {
                Ok(payload) => {
                    log_slow_query!(timer.elapsed(), SLOW_QUERY_MS, crafting.query = %key, "query resolved");
                    tracing::Span::current().record("crafting.outcome", "resolved");
                    timer.resolved();
                    Ok(payload)
                }
                Err(cause) => {
                    tracing::Span::current().record("crafting.outcome", "rejected");
                    timer.rejected(cause.category());
                    Err(self.reject(&name, cause))
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn exchange<T: DeserializeOwned>(&self, name: &QueryName) -> Result<T, RejectionCause> {
        let document = self
            .registry
            .document(name)
            .map_err(|err| match err {
                GatewayError::RegistryMiss(key) => RejectionCause::RegistryMiss(key),
                other => RejectionCause::Malformed(other.to_string()),
            })?;

        let response = self
            .transport
            .execute(GraphQlRequest::new(document))
            .await
            .map_err(|err| RejectionCause::Transport(err.to_string()))?;

        extract_crafting_field(&response, &name.response_key())
    }

    fn reject(&self, name: &QueryName, cause: RejectionCause) -> Rejection {
        match &cause {
            RejectionCause::RegistryMiss(key) => {
                tracing::error!(crafting.query = %key, "query has no registered body");
                let message = cause.to_string();
                Rejection::new(message, cause)
            }
            _ => {
                tracing::warn!(
                    crafting.query = %name,
                    cause = %cause,
                    category = cause.category(),
                    "query rejected"
                );
                Rejection::new(name.failure_message(), cause)
            }
        }
    }
}

impl std::fmt::Debug for CraftingGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CraftingGateway")
            .field("registry_entries", &self.registry.len())
            .finish_non_exhaustive()
    }
}

/// Decode `data.crafting.<key>`; absent or null is a missing field.
pub fn extract_crafting_field<T: DeserializeOwned>(
    response: &GraphQlResponse,
    key: &str,
) -> Result<T, RejectionCause> {
    let value = response
        .field(CRAFTING_ROOT, key)
        .ok_or_else(|| RejectionCause::MissingField(format!("{CRAFTING_ROOT}.{key}")))?;
    T::deserialize(value).map_err(|err| RejectionCause::Malformed(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::VoxState;
    use serde_json::json;

    #[test]
    fn extract_reads_nested_field() {
        let response = GraphQlResponse::from_data(json!({
            "crafting": { "templates": [{ "id": "t1", "name": "Sword" }] }
        }));
        let templates: Vec<VoxTemplate> = extract_crafting_field(&response, "templates").unwrap();
        assert_eq!(templates.len(), 1);
        assert_eq!(templates[0].name.as_deref(), Some("Sword"));
    }

    #[test]
    fn extract_reports_missing_field_path() {
        let response = GraphQlResponse::from_data(json!({ "crafting": {} }));
        let err = extract_crafting_field::<Vec<VoxTemplate>>(&response, "templates").unwrap_err();
        assert_eq!(err, RejectionCause::MissingField("crafting.templates".to_string()));
    }

    #[test]
    fn extract_reports_malformed_payload() {
        let response = GraphQlResponse::from_data(json!({
            "crafting": { "voxStatus": { "voxState": 3 } }
        }));
        let err = extract_crafting_field::<VoxStatus>(&response, "voxStatus").unwrap_err();
        assert_eq!(err.category(), "malformed");
    }

    #[test]
    fn extract_keeps_unknown_state() {
        let response = GraphQlResponse::from_data(json!({
            "crafting": { "voxStatus": { "voxState": "Busy" } }
        }));
        let status: VoxStatus = extract_crafting_field(&response, "voxStatus").unwrap();
        assert_eq!(status.vox_state, VoxState::Other("Busy".to_string()));
    }
}

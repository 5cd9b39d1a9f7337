pub mod config;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod metrics;
pub mod model;
pub mod patch_notes;
pub mod queries;
pub mod selection;
pub mod transport;

pub use config::{CliArgs, GatewayConfig, OutputFormat, QueryCommand};
pub use error::{GatewayError, Rejection, RejectionCause};
pub use gateway::CraftingGateway;
pub use logging::{LoggingConfig, init_logging, shutdown_telemetry};
pub use model::{VoxIngredient, VoxPossibleIngredient, VoxRecipe, VoxState, VoxStatus, VoxTemplate};
pub use queries::{QueryName, QueryRegistry, RecipeCategory};
pub use transport::{GraphQlRequest, GraphQlResponse, GraphQlTransport, HttpTransport, TransportError};

use anyhow::{Context, Result};
use patch_notes::{PatchNoteView, fetch_patch_note};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Run one CLI command and return the JSON it resolved with.
///
/// A rejection comes back as an error whose message is exactly the text the
/// HUD would show.
pub async fn execute_command(gateway: &CraftingGateway, command: &QueryCommand) -> Result<Value> {
    match command {
        QueryCommand::VoxStatus => to_json(gateway.get_vox_status().await?),
        QueryCommand::Ingredients => to_json(gateway.get_possible_ingredients().await?),
        QueryCommand::Templates => to_json(gateway.get_templates().await?),
        QueryCommand::Recipes { category } => {
            let category: RecipeCategory = category.parse()?;
            to_json(gateway.get_recipes_for(category).await?)
        }
        QueryCommand::PatchNote { id } => {
            let note = fetch_patch_note(gateway.transport(), id).await?;
            to_json(PatchNoteView::from(note))
        }
    }
}

fn to_json<T: Serialize>(value: T) -> Result<Value> {
    serde_json::to_value(value).context("failed to encode result")
}

pub async fn run(config: GatewayConfig, command: QueryCommand) -> Result<()> {
    let transport = HttpTransport::new(
        config.endpoint.clone(),
        config.auth_token.clone(),
        config.timeout,
    )
    .context("failed to build HTTP transport")?;
    let gateway = CraftingGateway::new(Arc::new(transport));

    tracing::info!(
        endpoint = %config.endpoint,
        timeout_ms = config.timeout.as_millis() as u64,
        command = ?command,
        "running crafting query"
    );

    let result = execute_command(&gateway, &command).await;

    if config.print_metrics {
        eprintln!("{}", metrics::METRICS.encode());
    }

    let value = result?;
    let rendered = match config.output {
        OutputFormat::Json => serde_json::to_string(&value)?,
        OutputFormat::Pretty => serde_json::to_string_pretty(&value)?,
    };
    println!("{rendered}");
    Ok(())
}

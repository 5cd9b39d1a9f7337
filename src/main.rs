use clap::Parser;
use crafting_gateway::{CliArgs, GatewayConfig, LoggingConfig, init_logging, run, shutdown_telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let logging_config = LoggingConfig::from_env();
    let _guard = init_logging(logging_config)?;

    let cli = CliArgs::parse();
    let config = GatewayConfig::from_args(&cli)?;
    config.validate()?;

    let result = run(config, cli.command).await;

    shutdown_telemetry();

    result
}

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8000/graphql";
const DEFAULT_TIMEOUT_MS: u64 = 30_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Compact JSON on one line
    Json,
    /// Indented JSON
    Pretty,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Pretty => write!(f, "pretty"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub endpoint: String,
    pub auth_token: Option<String>,
    /// Request timeout enforced by the HTTP transport
    pub timeout: Duration,
    pub output: OutputFormat,
    pub print_metrics: bool,
}

impl GatewayConfig {
    /// Merge CLI/env values over the optional config file, then defaults.
    pub fn from_args(args: &CliArgs) -> Result<Self> {
        let file_config = match args.config.as_ref() {
            Some(path) => load_config_file(path)?,
            None => PartialConfig::default(),
        };

        let endpoint = args
            .endpoint
            .clone()
            .or(file_config.endpoint)
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string())
            .trim()
            .to_string();

        let auth_token = args
            .auth_token
            .clone()
            .or(file_config.auth_token)
            .filter(|token| !token.trim().is_empty());

        let timeout_ms = args
            .timeout_ms
            .or(file_config.timeout_ms)
            .unwrap_or(DEFAULT_TIMEOUT_MS);

        let output = args
            .output
            .or(file_config.output)
            .unwrap_or(OutputFormat::Pretty);

        Ok(Self {
            endpoint,
            auth_token,
            timeout: Duration::from_millis(timeout_ms),
            output,
            print_metrics: args.print_metrics || file_config.print_metrics.unwrap_or(false),
        })
    }

    /// Fail fast before any request is issued.
    pub fn validate(&self) -> Result<()> {
        let url = reqwest::Url::parse(&self.endpoint)
            .with_context(|| format!("endpoint {:?} is not a valid URL", self.endpoint))?;
        anyhow::ensure!(
            matches!(url.scheme(), "http" | "https"),
            "endpoint {:?} must use http or https",
            self.endpoint
        );
        anyhow::ensure!(
            !self.timeout.is_zero(),
            "timeout must be greater than zero"
        );
        Ok(())
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "crafting-gateway",
    about = "Run crafting and patch-note queries against the game GraphQL API",
    version
)]
pub struct CliArgs {
    #[arg(
        long,
        value_name = "FILE",
        help = "Path to a configuration file (YAML or JSON)",
        global = true
    )]
    pub config: Option<PathBuf>,

    #[arg(
        long,
        env = "CRAFTING_GATEWAY_ENDPOINT",
        value_name = "URL",
        help = "GraphQL endpoint URL",
        global = true
    )]
    pub endpoint: Option<String>,

    #[arg(
        long,
        env = "CRAFTING_GATEWAY_AUTH_TOKEN",
        value_name = "TOKEN",
        help = "Bearer token sent with every request",
        hide_env_values = true,
        global = true
    )]
    pub auth_token: Option<String>,

    #[arg(
        long,
        env = "CRAFTING_GATEWAY_TIMEOUT_MS",
        value_name = "MS",
        help = "Request timeout in milliseconds",
        value_parser = clap::value_parser!(u64),
        global = true
    )]
    pub timeout_ms: Option<u64>,

    #[arg(
        long,
        env = "CRAFTING_GATEWAY_OUTPUT",
        value_enum,
        value_name = "FORMAT",
        help = "Result format (json or pretty)",
        global = true
    )]
    pub output: Option<OutputFormat>,

    #[arg(
        long,
        help = "Print Prometheus metrics to stderr after the query",
        global = true
    )]
    pub print_metrics: bool,

    #[command(subcommand)]
    pub command: QueryCommand,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum QueryCommand {
    /// Status of the nearest vox
    VoxStatus,
    /// Items the nearby vox would accept
    Ingredients,
    /// Craftable templates
    Templates,
    /// Recipes of one category
    Recipes {
        #[arg(value_name = "CATEGORY")]
        category: String,
    },
    /// One patch note by id
    PatchNote {
        #[arg(value_name = "ID")]
        id: String,
    },
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct PartialConfig {
    endpoint: Option<String>,
    auth_token: Option<String>,
    timeout_ms: Option<u64>,
    output: Option<OutputFormat>,
    print_metrics: Option<bool>,
}

fn load_config_file(path: &Path) -> Result<PartialConfig> {
    if !path.exists() {
        anyhow::bail!("config file {:?} does not exist", path);
    }
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {:?}", path))?;
    let ext = path
        .extension()
        .and_then(|os| os.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let parsed = match ext.as_str() {
        "yaml" | "yml" => serde_yaml::from_str(&contents)
            .with_context(|| format!("failed to parse YAML config {:?}", path))?,
        "json" => serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse JSON config {:?}", path))?,
        other => anyhow::bail!("unsupported config extension: {other}"),
    };
    Ok(parsed)
}

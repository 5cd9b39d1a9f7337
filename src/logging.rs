//! Tracing setup for the gateway binary.
//!
//! Events go to stderr by default, pretty in development and JSON in
//! production. `LOG_OUTPUT=file` switches to a daily rolling file. Setting
//! `OTEL_EXPORTER_OTLP_ENDPOINT` adds an OTLP span exporter next to the
//! formatter. Every query exchange runs inside [`query_span`].

use anyhow::{Context, Result};
use opentelemetry::KeyValue;
use opentelemetry::trace::TraceError;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::trace::{Config as TraceConfig, RandomIdGenerator, Sampler, Tracer};
use opentelemetry_semantic_conventions::resource::{SERVICE_NAME as OTEL_SERVICE_NAME, SERVICE_VERSION};
use std::env;
use std::io;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use strum::EnumString;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::fmt::{self, format::FmtSpan};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

const SERVICE_NAME: &str = "crafting-gateway";

/// Noisy HTTP internals stay at info even when the gateway logs at debug.
const QUIET_DEPENDENCIES: &str = "hyper=info,reqwest=info";

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum LogOutput {
    Stdout,
    Stderr,
    File,
}

/// Where spans are exported when OTLP is enabled.
#[derive(Debug, Clone, PartialEq)]
pub struct OtlpSettings {
    pub endpoint: String,
    /// Fraction of root traces kept, clamped to `0.0..=1.0`.
    pub sampling_rate: f64,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub format: LogFormat,
    pub output: LogOutput,
    pub log_dir: PathBuf,
    pub log_file_prefix: String,
    pub service_version: String,
    pub environment: String,
    pub otlp: Option<OtlpSettings>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("ENV"))
            .unwrap_or_else(|_| "development".to_string());
        let format = if is_production(&environment) {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        };

        Self {
            format,
            output: LogOutput::Stderr,
            log_dir: PathBuf::from("logs"),
            log_file_prefix: SERVICE_NAME.to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            environment,
            otlp: None,
        }
    }
}

impl LoggingConfig {
    /// Defaults overridden by `LOG_FORMAT`, `LOG_OUTPUT`, `LOG_DIR` and the
    /// `OTEL_*` exporter variables. Unrecognized values are ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.format = env_parsed("LOG_FORMAT").unwrap_or(config.format);
        config.output = env_parsed("LOG_OUTPUT").unwrap_or(config.output);
        if let Ok(dir) = env::var("LOG_DIR") {
            config.log_dir = PathBuf::from(dir);
        }

        if let Ok(endpoint) = env::var("OTEL_EXPORTER_OTLP_ENDPOINT") {
            let default_rate = if is_production(&config.environment) { 0.1 } else { 1.0 };
            let sampling_rate: f64 = env_parsed("OTEL_SAMPLING_RATE").unwrap_or(default_rate);
            let timeout_secs: u64 = env_parsed("OTEL_EXPORTER_OTLP_TIMEOUT").unwrap_or(10);
            config.otlp = Some(OtlpSettings {
                endpoint,
                sampling_rate: sampling_rate.clamp(0.0, 1.0),
                timeout: Duration::from_secs(timeout_secs),
            });
        }

        config
    }

    fn default_filter(&self) -> EnvFilter {
        let level = if is_production(&self.environment) { "info" } else { "debug" };
        EnvFilter::new(format!("{level},{QUIET_DEPENDENCIES}"))
    }

    fn writer(&self) -> Result<(NonBlocking, WorkerGuard)> {
        Ok(match self.output {
            LogOutput::Stdout => tracing_appender::non_blocking(io::stdout()),
            LogOutput::Stderr => tracing_appender::non_blocking(io::stderr()),
            LogOutput::File => {
                std::fs::create_dir_all(&self.log_dir)
                    .with_context(|| format!("failed to create {}", self.log_dir.display()))?;
                let appender =
                    tracing_appender::rolling::daily(&self.log_dir, &self.log_file_prefix);
                tracing_appender::non_blocking(appender)
            }
        })
    }
}

fn is_production(environment: &str) -> bool {
    matches!(environment, "production" | "prod")
}

fn env_parsed<T: FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|raw| raw.trim().parse().ok())
}

/// Install the global subscriber. Keep the returned guard alive until exit so
/// buffered events are flushed.
pub fn init_logging(config: LoggingConfig) -> Result<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| config.default_filter());
    let (writer, guard) = config.writer()?;

    let otel_layer = config.otlp.as_ref().and_then(|otlp| {
        match otlp_tracer(otlp, &config) {
            Ok(tracer) => Some(tracing_opentelemetry::layer().with_tracer(tracer)),
            Err(err) => {
                eprintln!("OTLP export disabled: {err}");
                None
            }
        }
    });

    let subscriber = tracing_subscriber::registry().with(otel_layer);
    match config.format {
        LogFormat::Json => subscriber
            .with(
                fmt::layer()
                    .json()
                    .with_writer(writer)
                    .with_current_span(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .with_filter(filter),
            )
            .init(),
        LogFormat::Pretty => subscriber
            .with(
                fmt::layer()
                    .pretty()
                    .with_writer(writer)
                    .with_file(true)
                    .with_line_number(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .with_filter(filter),
            )
            .init(),
    }

    tracing::debug!(
        environment = %config.environment,
        format = ?config.format,
        output = ?config.output,
        otlp = config.otlp.is_some(),
        "logging initialized"
    );

    Ok(guard)
}

fn otlp_tracer(otlp: &OtlpSettings, config: &LoggingConfig) -> Result<Tracer, TraceError> {
    let exporter = opentelemetry_otlp::new_exporter()
        .tonic()
        .with_endpoint(otlp.endpoint.clone())
        .with_timeout(otlp.timeout);

    let resource = Resource::new([
        KeyValue::new(OTEL_SERVICE_NAME, SERVICE_NAME),
        KeyValue::new(SERVICE_VERSION, config.service_version.clone()),
        KeyValue::new("deployment.environment", config.environment.clone()),
    ]);

    opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(exporter)
        .with_trace_config(
            TraceConfig::default()
                .with_sampler(sampler(otlp.sampling_rate))
                .with_id_generator(RandomIdGenerator::default())
                .with_resource(resource),
        )
        .install_batch(opentelemetry_sdk::runtime::Tokio)
}

fn sampler(rate: f64) -> Sampler {
    match rate {
        r if r >= 1.0 => Sampler::AlwaysOn,
        r if r <= 0.0 => Sampler::AlwaysOff,
        r => Sampler::ParentBased(Box::new(Sampler::TraceIdRatioBased(r))),
    }
}

/// Flush pending spans before exit.
pub fn shutdown_telemetry() {
    opentelemetry::global::shutdown_tracer_provider();
}

/// Span wrapping one crafting query exchange.
pub fn query_span(query: &str) -> tracing::Span {
    tracing::info_span!(
        "crafting_query",
        crafting.query = query,
        crafting.outcome = tracing::field::Empty,
    )
}

/// Warn when a query took longer than `$threshold_ms`, otherwise log at debug.
#[macro_export]
macro_rules! log_slow_query {
    ($duration:expr, $threshold_ms:expr, $($arg:tt)*) => {{
        let duration_ms = $duration.as_millis() as u64;
        if duration_ms > $threshold_ms {
            tracing::warn!(duration_ms, threshold_ms = $threshold_ms, $($arg)*);
        } else {
            tracing::debug!(duration_ms, $($arg)*);
        }
    }};
}

/// Prometheus metrics for crafting queries
///
/// Every gateway exchange records one outcome and one latency sample;
/// rejections are additionally counted by cause category.
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use prometheus_client::encoding::{EncodeLabelSet, text::encode};
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::metrics::histogram::{Histogram, exponential_buckets};
use prometheus_client::registry::Registry;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Global metrics registry instance
pub static METRICS: Lazy<Arc<MetricsCollector>> = Lazy::new(|| Arc::new(MetricsCollector::new()));

/// Labels for query outcome metrics
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct OutcomeLabels {
    /// Registry key, e.g. "QUERY_VOX_STATUS"
    pub query: String,
    /// "resolved" or "rejected"
    pub outcome: String,
}

/// Labels for rejection metrics
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct RejectionLabels {
    pub query: String,
    /// Rejection cause category
    pub cause: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct QueryLabels {
    pub query: String,
}

pub struct MetricsCollector {
    registry: RwLock<Registry>,

    /// Completed queries by query and outcome
    pub crafting_queries: Family<OutcomeLabels, Counter>,

    /// Exchange latency in seconds by query
    pub crafting_query_duration_seconds: Family<QueryLabels, Histogram>,

    /// Queries currently awaiting the transport
    pub crafting_queries_in_flight: Family<QueryLabels, Gauge>,

    /// Rejections by query and cause
    pub crafting_rejections: Family<RejectionLabels, Counter>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let crafting_queries = Family::<OutcomeLabels, Counter>::default();
        registry.register(
            "crafting_queries",
            "Total number of crafting queries by outcome",
            crafting_queries.clone(),
        );

        let crafting_query_duration_seconds =
            Family::<QueryLabels, Histogram>::new_with_constructor(|| {
                // Buckets: 10ms .. ~38s
                Histogram::new(exponential_buckets(0.01, 2.5, 10))
            });
        registry.register(
            "crafting_query_duration_seconds",
            "Crafting query latency histogram in seconds",
            crafting_query_duration_seconds.clone(),
        );

        let crafting_queries_in_flight = Family::<QueryLabels, Gauge>::default();
        registry.register(
            "crafting_queries_in_flight",
            "Number of crafting queries awaiting a response",
            crafting_queries_in_flight.clone(),
        );

        let crafting_rejections = Family::<RejectionLabels, Counter>::default();
        registry.register(
            "crafting_rejections",
            "Total number of rejected crafting queries by cause",
            crafting_rejections.clone(),
        );

        Self {
            registry: RwLock::new(registry),
            crafting_queries,
            crafting_query_duration_seconds,
            crafting_queries_in_flight,
            crafting_rejections,
        }
    }

    /// Encode metrics in Prometheus text format
    pub fn encode(&self) -> String {
        let mut buffer = String::new();
        let registry = self.registry.read();
        if let Err(err) = encode(&mut buffer, &registry) {
            tracing::warn!(error = %err, "failed to encode metrics");
        }
        buffer
    }

    pub fn record_resolved(&self, query: &str, duration: Duration) {
        self.crafting_queries
            .get_or_create(&OutcomeLabels {
                query: query.to_string(),
                outcome: "resolved".to_string(),
            })
            .inc();
        self.observe_duration(query, duration);
    }

    pub fn record_rejected(&self, query: &str, duration: Duration, cause: &str) {
        self.crafting_queries
            .get_or_create(&OutcomeLabels {
                query: query.to_string(),
                outcome: "rejected".to_string(),
            })
            .inc();
        self.observe_duration(query, duration);
        self.crafting_rejections
            .get_or_create(&RejectionLabels {
                query: query.to_string(),
                cause: cause.to_string(),
            })
            .inc();
    }

    fn observe_duration(&self, query: &str, duration: Duration) {
        self.crafting_query_duration_seconds
            .get_or_create(&QueryLabels {
                query: query.to_string(),
            })
            .observe(duration.as_secs_f64());
    }

    fn in_flight(&self, query: &str) -> Gauge {
        self.crafting_queries_in_flight
            .get_or_create(&QueryLabels {
                query: query.to_string(),
            })
            .clone()
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Times one query against a collector and records its outcome.
///
/// Dropping the timer without calling `resolved` or `rejected` counts the
/// query as rejected with cause "dropped" (the caller abandoned the future).
pub struct QueryTimer {
    collector: Arc<MetricsCollector>,
    query: String,
    start: Instant,
    completed: bool,
}

impl QueryTimer {
    pub fn start(collector: Arc<MetricsCollector>, query: impl Into<String>) -> Self {
        let query = query.into();
        collector.in_flight(&query).inc();
        Self {
            collector,
            query,
            start: Instant::now(),
            completed: false,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn resolved(mut self) {
        self.completed = true;
        self.collector.in_flight(&self.query).dec();
        self.collector
            .record_resolved(&self.query, self.start.elapsed());
    }

    pub fn rejected(mut self, cause: &str) {
        self.completed = true;
        self.collector.in_flight(&self.query).dec();
        self.collector
            .record_rejected(&self.query, self.start.elapsed(), cause);
    }
}

impl Drop for QueryTimer {
    fn drop(&mut self) {
        if !self.completed {
            self.collector.in_flight(&self.query).dec();
            self.collector
                .record_rejected(&self.query, self.start.elapsed(), "dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_collector_creation() {
        let collector = MetricsCollector::new();
        collector.record_resolved("QUERY_TEMPLATES", Duration::from_millis(5));
        let output = collector.encode();

        assert!(output.contains("crafting_queries"));
        assert!(output.contains("crafting_query_duration_seconds"));
        assert!(output.contains("crafting_queries_in_flight"));
        assert!(output.contains("crafting_rejections"));
    }

    #[test]
    fn test_record_rejected() {
        let collector = MetricsCollector::new();
        collector.record_rejected("QUERY_VOX_STATUS", Duration::from_millis(50), "transport");

        let output = collector.encode();
        assert!(output.contains("QUERY_VOX_STATUS"));
        assert!(output.contains("rejected"));
        assert!(output.contains("transport"));
    }

    #[test]
    fn test_timer_records_resolution() {
        let collector = Arc::new(MetricsCollector::new());
        let timer = QueryTimer::start(collector.clone(), "QUERY_WEAPON_RECIPES");
        timer.resolved();

        let output = collector.encode();
        assert!(output.contains("QUERY_WEAPON_RECIPES"));
        assert!(output.contains("resolved"));
    }

    #[test]
    fn test_dropped_timer_counts_as_rejection() {
        let collector = Arc::new(MetricsCollector::new());
        {
            let _timer = QueryTimer::start(collector.clone(), "QUERY_TEMPLATES");
        }
        let output = collector.encode();
        assert!(output.contains("dropped"));
    }
}

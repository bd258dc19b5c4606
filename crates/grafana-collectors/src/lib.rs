//! Prometheus collectors for the Grafana exporter.
//!
//! Each [`Collector`] owns a fixed set of metric families mapping one
//! Grafana API record onto the exported surface: [`AdminStatsCollector`]
//! covers `/api/admin/stats`, [`MetricsCollector`] covers `/api/metrics`.
//! The surface is declared once via [`Collector::register`] and never
//! changes afterwards; [`Collector::scrape`] only updates values. A failed
//! upstream call leaves the previous values in place (stale but present)
//! and is reported through the per-collector scrape-health metrics, so the
//! exporter always serves a complete snapshot.

pub mod admin_stats;
pub mod mapping;
pub mod metrics;
pub mod scrape;

use async_trait::async_trait;
use prometheus::Registry;

pub use admin_stats::AdminStatsCollector;
pub use metrics::MetricsCollector;

/// Root namespace of every exported metric.
pub const NAMESPACE: &str = "grafana";

/// One pull-driven collector: a private set of metric families plus the
/// upstream record that feeds them.
///
/// Implementations must tolerate overlapping `scrape` calls; the prometheus
/// instruments are internally synchronized, so no external locking is used.
#[async_trait]
pub trait Collector: Send + Sync {
    /// Subsystem name, used for logging.
    fn name(&self) -> &str;

    /// Registers the complete metric surface. Called once at startup; the
    /// descriptor set the registry holds afterwards is static.
    fn register(&self, registry: &Registry) -> prometheus::Result<()>;

    /// Performs one scrape: fetch the upstream record, map it onto the
    /// families, update the scrape-health metrics. Never fails: upstream
    /// errors are logged and degrade a single scrape's freshness only.
    async fn scrape(&self);
}

#[cfg(test)]
pub(crate) mod test_util {
    use async_trait::async_trait;
    use grafana_client::error::{ClientError, Result};
    use grafana_client::{AdminStats, GrafanaApi, Metrics};
    use prometheus::Registry;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Fixture-backed [`GrafanaApi`]: responses are queued per endpoint and
    /// handed out one per call. An exhausted queue answers HTTP 500 so a
    /// miscounted test fails loudly instead of hanging on a default.
    #[derive(Default)]
    pub struct FakeGrafana {
        admin_stats: Mutex<VecDeque<Result<AdminStats>>>,
        metrics: Mutex<VecDeque<Result<Metrics>>>,
    }

    impl FakeGrafana {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn push_admin_stats(&self, response: Result<AdminStats>) {
            self.admin_stats.lock().unwrap().push_back(response);
        }

        pub fn push_metrics(&self, response: Result<Metrics>) {
            self.metrics.lock().unwrap().push_back(response);
        }
    }

    #[async_trait]
    impl GrafanaApi for FakeGrafana {
        async fn admin_stats(&self) -> Result<AdminStats> {
            self.admin_stats
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ClientError::Status { status: 500 }))
        }

        async fn metrics(&self) -> Result<Metrics> {
            self.metrics
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ClientError::Status { status: 500 }))
        }
    }

    /// Reads one gauge or counter sample from a gathered registry. `labels`
    /// must match the sample's label set exactly.
    pub fn sample(registry: &Registry, name: &str, labels: &[(&str, &str)]) -> Option<f64> {
        let families = registry.gather();
        let family = families.iter().find(|f| f.get_name() == name)?;
        let metric = family.get_metric().iter().find(|m| {
            let pairs = m.get_label();
            pairs.len() == labels.len()
                && labels.iter().all(|(key, value)| {
                    pairs
                        .iter()
                        .any(|p| p.get_name() == *key && p.get_value() == *value)
                })
        })?;
        if metric.has_gauge() {
            Some(metric.get_gauge().get_value())
        } else {
            Some(metric.get_counter().get_value())
        }
    }

    /// The exported surface as `(family name, sample count)` pairs, sorted
    /// by name. Two snapshots with equal surfaces expose identical metric
    /// identities regardless of the values.
    pub fn surface(registry: &Registry) -> Vec<(String, usize)> {
        let mut names: Vec<(String, usize)> = registry
            .gather()
            .iter()
            .map(|f| (f.get_name().to_string(), f.get_metric().len()))
            .collect();
        names.sort();
        names
    }
}

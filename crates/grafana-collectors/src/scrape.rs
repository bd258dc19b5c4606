//! Scrape-health bookkeeping shared by both collectors.

use prometheus::{Gauge, IntCounter, Opts, Registry};
use std::time::Duration;

use crate::NAMESPACE;

/// Result of one scrape attempt, handed to [`ScrapeStatus::observe`] after
/// the fetch+map phase completes. Not retained across scrapes.
pub struct ScrapeOutcome {
    pub success: bool,
    /// Elapsed wall time of the fetch+map phase only.
    pub duration: Duration,
    /// Unix seconds at scrape completion.
    pub finished_at: i64,
}

/// The five always-present health metrics of one collector subsystem.
///
/// Updated unconditionally on every scrape, whatever the outcome. The error
/// flag reflects only the most recent scrape; the two counters are
/// cumulative.
pub struct ScrapeStatus {
    scrapes_total: IntCounter,
    scrape_errors_total: IntCounter,
    last_scrape_error: Gauge,
    last_scrape_timestamp: Gauge,
    last_scrape_duration_seconds: Gauge,
}

impl ScrapeStatus {
    pub fn new(subsystem: &str, target: &str) -> prometheus::Result<Self> {
        let opts = |name: &str, help: String| {
            Opts::new(name, help).namespace(NAMESPACE).subsystem(subsystem)
        };

        Ok(Self {
            scrapes_total: IntCounter::with_opts(opts(
                "scrapes_total",
                format!("Total number of Grafana {target} scrapes."),
            ))?,
            scrape_errors_total: IntCounter::with_opts(opts(
                "scrape_errors_total",
                format!("Total number of Grafana {target} scrape errors."),
            ))?,
            last_scrape_error: Gauge::with_opts(opts(
                "last_scrape_error",
                format!(
                    "Whether the last metrics scrape from Grafana {target} resulted in an error \
                     (1 for error, 0 for success)."
                ),
            ))?,
            last_scrape_timestamp: Gauge::with_opts(opts(
                "last_scrape_timestamp",
                format!("Number of seconds since 1970 since last metrics scrape from Grafana {target}."),
            ))?,
            last_scrape_duration_seconds: Gauge::with_opts(opts(
                "last_scrape_duration_seconds",
                format!("Duration of the last metrics scrape from Grafana {target}."),
            ))?,
        })
    }

    pub fn register(&self, registry: &Registry) -> prometheus::Result<()> {
        registry.register(Box::new(self.scrapes_total.clone()))?;
        registry.register(Box::new(self.scrape_errors_total.clone()))?;
        registry.register(Box::new(self.last_scrape_error.clone()))?;
        registry.register(Box::new(self.last_scrape_timestamp.clone()))?;
        registry.register(Box::new(self.last_scrape_duration_seconds.clone()))?;
        Ok(())
    }

    pub fn observe(&self, outcome: &ScrapeOutcome) {
        self.scrapes_total.inc();
        if !outcome.success {
            self.scrape_errors_total.inc();
        }
        self.last_scrape_error
            .set(if outcome.success { 0.0 } else { 1.0 });
        self.last_scrape_timestamp.set(outcome.finished_at as f64);
        self.last_scrape_duration_seconds
            .set(outcome.duration.as_secs_f64());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::sample;

    fn outcome(success: bool) -> ScrapeOutcome {
        ScrapeOutcome {
            success,
            duration: Duration::from_millis(25),
            finished_at: 1_700_000_000,
        }
    }

    #[test]
    fn observe_tracks_successes_and_failures() {
        let status = ScrapeStatus::new("admin_stats", "Admin Stats").unwrap();
        let registry = Registry::new();
        status.register(&registry).unwrap();

        status.observe(&outcome(true));
        assert_eq!(
            sample(&registry, "grafana_admin_stats_scrapes_total", &[]),
            Some(1.0)
        );
        assert_eq!(
            sample(&registry, "grafana_admin_stats_scrape_errors_total", &[]),
            Some(0.0)
        );
        assert_eq!(
            sample(&registry, "grafana_admin_stats_last_scrape_error", &[]),
            Some(0.0)
        );

        status.observe(&outcome(false));
        assert_eq!(
            sample(&registry, "grafana_admin_stats_scrapes_total", &[]),
            Some(2.0)
        );
        assert_eq!(
            sample(&registry, "grafana_admin_stats_scrape_errors_total", &[]),
            Some(1.0)
        );
        assert_eq!(
            sample(&registry, "grafana_admin_stats_last_scrape_error", &[]),
            Some(1.0)
        );
    }

    #[test]
    fn error_flag_reflects_only_latest_scrape() {
        let status = ScrapeStatus::new("metrics", "Metrics").unwrap();
        let registry = Registry::new();
        status.register(&registry).unwrap();

        status.observe(&outcome(false));
        status.observe(&outcome(true));

        assert_eq!(
            sample(&registry, "grafana_metrics_last_scrape_error", &[]),
            Some(0.0)
        );
        assert_eq!(
            sample(&registry, "grafana_metrics_scrape_errors_total", &[]),
            Some(1.0)
        );
    }

    #[test]
    fn timestamp_and_duration_are_recorded() {
        let status = ScrapeStatus::new("metrics", "Metrics").unwrap();
        let registry = Registry::new();
        status.register(&registry).unwrap();

        status.observe(&outcome(true));

        assert_eq!(
            sample(&registry, "grafana_metrics_last_scrape_timestamp", &[]),
            Some(1_700_000_000.0)
        );
        assert_eq!(
            sample(
                &registry,
                "grafana_metrics_last_scrape_duration_seconds",
                &[]
            ),
            Some(0.025)
        );
    }
}

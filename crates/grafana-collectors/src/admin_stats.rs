//! Collector for `/api/admin/stats`: nine instance-wide entity counts.

use async_trait::async_trait;
use chrono::Utc;
use grafana_client::{AdminStats, GrafanaApi};
use prometheus::{Gauge, Registry};
use std::sync::Arc;
use std::time::Instant;
use tracing::error;

use crate::mapping::{scalar_gauges, ScalarField};
use crate::scrape::{ScrapeOutcome, ScrapeStatus};
use crate::Collector;

const SUBSYSTEM: &str = "admin_stats";

static FIELDS: &[ScalarField<AdminStats>] = &[
    ScalarField {
        name: "alerts",
        help: "Number of Grafana Alerts.",
        read: |s| s.alert_count as f64,
    },
    ScalarField {
        name: "dashboards",
        help: "Number of Grafana Dashboards.",
        read: |s| s.dashboard_count as f64,
    },
    ScalarField {
        name: "datasources",
        help: "Number of Grafana Datasources.",
        read: |s| s.datasource_count as f64,
    },
    ScalarField {
        name: "orgs",
        help: "Number of Grafana Orgs.",
        read: |s| s.org_count as f64,
    },
    ScalarField {
        name: "playlists",
        help: "Number of Grafana Playlists.",
        read: |s| s.playlist_count as f64,
    },
    ScalarField {
        name: "db_snapshots",
        help: "Number of Grafana Snapshots.",
        read: |s| s.snapshot_count as f64,
    },
    ScalarField {
        name: "starred_db",
        help: "Number of Grafana Dashboards Starred.",
        read: |s| s.starred_count as f64,
    },
    ScalarField {
        name: "db_tags",
        help: "Number of Grafana Tags.",
        read: |s| s.tag_count as f64,
    },
    ScalarField {
        name: "users",
        help: "Number of Grafana Users.",
        read: |s| s.user_count as f64,
    },
];

pub struct AdminStatsCollector {
    client: Arc<dyn GrafanaApi>,
    gauges: Vec<Gauge>,
    status: ScrapeStatus,
}

impl AdminStatsCollector {
    pub fn new(client: Arc<dyn GrafanaApi>) -> prometheus::Result<Self> {
        Ok(Self {
            client,
            gauges: scalar_gauges(SUBSYSTEM, FIELDS)?,
            status: ScrapeStatus::new(SUBSYSTEM, "Admin Stats")?,
        })
    }

    fn apply(&self, stats: &AdminStats) {
        for (field, gauge) in FIELDS.iter().zip(&self.gauges) {
            gauge.set((field.read)(stats));
        }
    }
}

#[async_trait]
impl Collector for AdminStatsCollector {
    fn name(&self) -> &str {
        SUBSYSTEM
    }

    fn register(&self, registry: &Registry) -> prometheus::Result<()> {
        for gauge in &self.gauges {
            registry.register(Box::new(gauge.clone()))?;
        }
        self.status.register(registry)
    }

    async fn scrape(&self) {
        let started = Instant::now();
        let result = self.client.admin_stats().await;
        match &result {
            Ok(stats) => self.apply(stats),
            Err(err) => error!("Failed to scrape Grafana Admin Stats: {err}"),
        }
        self.status.observe(&ScrapeOutcome {
            success: result.is_ok(),
            duration: started.elapsed(),
            finished_at: Utc::now().timestamp(),
        });
    }
}

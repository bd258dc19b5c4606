//! Collector for `/api/metrics`: Grafana's internal instrumentation
//! snapshot. The upstream payload mixes three field shapes — plain counts,
//! point-in-time values and latency timers — plus several enumerated
//! categorical groups; the tables below pin each of them to one family.

use async_trait::async_trait;
use chrono::Utc;
use grafana_client::{GrafanaApi, Metrics};
use prometheus::{Gauge, GaugeVec, Registry};
use std::sync::Arc;
use std::time::Instant;
use tracing::error;

use crate::mapping::{
    bucket_vecs, scalar_gauges, timer_vecs, write_buckets, write_timer, BucketGroup, ScalarField,
    TimerField,
};
use crate::scrape::{ScrapeOutcome, ScrapeStatus};
use crate::Collector;

const SUBSYSTEM: &str = "metrics";

static SCALARS: &[ScalarField<Metrics>] = &[
    ScalarField {
        name: "alerting_active_alerts",
        help: "Number of active alerts.",
        read: |m| m.alerting_active_alerts.value as f64,
    },
    ScalarField {
        name: "api_admin_user_create",
        help: "Number of calls to Admin User Create API.",
        read: |m| m.api_admin_user_create.count as f64,
    },
    ScalarField {
        name: "api_dashboard_snapshot_create",
        help: "Number of calls to Dashboard Snapshot Create API.",
        read: |m| m.api_dashboard_snapshot_create.count as f64,
    },
    ScalarField {
        name: "api_dashboard_snapshot_external",
        help: "Number of calls to Dashboard Snapshot External API.",
        read: |m| m.api_dashboard_snapshot_external.count as f64,
    },
    ScalarField {
        name: "api_dashboard_snapshot_get",
        help: "Number of calls to Dashboard Snapshot Get API.",
        read: |m| m.api_dashboard_snapshot_get.count as f64,
    },
    ScalarField {
        name: "api_login_oauth",
        help: "Number of calls to Login OAuth API.",
        read: |m| m.api_login_oauth.count as f64,
    },
    ScalarField {
        name: "api_login_post",
        help: "Number of calls to Login Post API.",
        read: |m| m.api_login_post.count as f64,
    },
    ScalarField {
        name: "api_org_create",
        help: "Number of calls to Org Create API.",
        read: |m| m.api_org_create.count as f64,
    },
    ScalarField {
        name: "api_user_signups_completed",
        help: "Number of API User Signups completed.",
        read: |m| m.api_user_signup_completed.count as f64,
    },
    ScalarField {
        name: "api_user_signups_invite",
        help: "Number of API User Signups invite.",
        read: |m| m.api_user_signup_invite.count as f64,
    },
    ScalarField {
        name: "api_user_signups_started",
        help: "Number of API User Signups started.",
        read: |m| m.api_user_signup_started.count as f64,
    },
    ScalarField {
        name: "aws_cloudwatch_get_metric_statistics",
        help: "Number of calls to AWS CloudWatch Get Metric Statistics API.",
        read: |m| m.aws_cloudwatch_get_metric_statistics.count as f64,
    },
    ScalarField {
        name: "aws_cloudwatch_list_metrics",
        help: "Number of calls to AWS CloudWatch List Metrics API.",
        read: |m| m.aws_cloudwatch_list_metrics.count as f64,
    },
    ScalarField {
        name: "instance_start",
        help: "Number of Instance Starts.",
        read: |m| m.instance_start.count as f64,
    },
    ScalarField {
        name: "models_dashboard_insert",
        help: "Number of Dashboard inserts.",
        read: |m| m.models_dashboard_insert.count as f64,
    },
    ScalarField {
        name: "dashboards",
        help: "Number of dashboards.",
        read: |m| m.stat_totals_stat_dashboards.value as f64,
    },
    ScalarField {
        name: "orgs",
        help: "Number of orgs.",
        read: |m| m.stat_totals_stat_orgs.value as f64,
    },
    ScalarField {
        name: "playlists",
        help: "Number of playlists.",
        read: |m| m.stat_totals_stat_playlists.value as f64,
    },
    ScalarField {
        name: "users",
        help: "Number of users.",
        read: |m| m.stat_totals_stat_users.value as f64,
    },
];

static TIMERS: &[TimerField<Metrics>] = &[
    TimerField {
        name: "alerting_execution_time",
        help: "Alerting execution time.",
        read: |m| &m.alerting_execution_time,
    },
    TimerField {
        name: "api_dashboard_get",
        help: "Dashboard Get API times.",
        read: |m| &m.api_dashboard_get,
    },
    TimerField {
        name: "api_dashboard_save",
        help: "Dashboard Save API times.",
        read: |m| &m.api_dashboard_save,
    },
    TimerField {
        name: "api_dashboard_search",
        help: "Dashboard Search API times.",
        read: |m| &m.api_dashboard_search,
    },
    TimerField {
        name: "api_dataproxy_request_all",
        help: "Dataproxy request API times.",
        read: |m| &m.api_dataproxy_request_all,
    },
];

static BUCKET_GROUPS: &[BucketGroup<Metrics>] = &[
    BucketGroup {
        name: "alerting_notifications_sent",
        help: "Number of alert notifications sent.",
        label: "type",
        buckets: &[
            ("line", |m| m.alerting_notifications_sent_line.count as f64),
            ("dingding", |m| {
                m.alerting_notifications_sent_dingding.count as f64
            }),
            ("email", |m| m.alerting_notifications_sent_email.count as f64),
            ("opsgenie", |m| {
                m.alerting_notifications_sent_opsgenie.count as f64
            }),
            ("pagerduty", |m| {
                m.alerting_notifications_sent_pagerduty.count as f64
            }),
            ("pushover", |m| {
                m.alerting_notifications_sent_pushover.count as f64
            }),
            ("sensu", |m| m.alerting_notifications_sent_sensu.count as f64),
            ("slack", |m| m.alerting_notifications_sent_slack.count as f64),
            ("telegram", |m| {
                m.alerting_notifications_sent_telegram.count as f64
            }),
            ("threema", |m| {
                m.alerting_notifications_sent_threema.count as f64
            }),
            ("victorops", |m| {
                m.alerting_notifications_sent_victorops.count as f64
            }),
            ("webhook", |m| {
                m.alerting_notifications_sent_webhook.count as f64
            }),
        ],
    },
    BucketGroup {
        name: "alerting_results",
        help: "Number of alerting results.",
        label: "state",
        buckets: &[
            ("alerting", |m| m.alerting_result_state_alerting.count as f64),
            ("no_data", |m| m.alerting_result_state_no_data.count as f64),
            ("ok", |m| m.alerting_result_state_ok.count as f64),
            ("paused", |m| m.alerting_result_state_paused.count as f64),
            ("pending", |m| m.alerting_result_state_pending.count as f64),
        ],
    },
    BucketGroup {
        name: "api_responses",
        help: "Number of API responses.",
        label: "code",
        buckets: &[
            ("200", |m| m.api_resp_status_code_200.count as f64),
            ("404", |m| m.api_resp_status_code_404.count as f64),
            ("500", |m| m.api_resp_status_code_500.count as f64),
            ("unknown", |m| m.api_resp_status_code_unknown.count as f64),
        ],
    },
    BucketGroup {
        name: "page_responses",
        help: "Number of Page responses.",
        label: "code",
        buckets: &[
            ("200", |m| m.page_resp_status_code_200.count as f64),
            ("404", |m| m.page_resp_status_code_404.count as f64),
            ("500", |m| m.page_resp_status_code_500.count as f64),
            ("unknown", |m| m.page_resp_status_code_unknown.count as f64),
        ],
    },
    BucketGroup {
        name: "proxy_responses",
        help: "Number of Proxy responses.",
        label: "code",
        buckets: &[
            ("200", |m| m.proxy_resp_status_code_200.count as f64),
            ("404", |m| m.proxy_resp_status_code_404.count as f64),
            ("500", |m| m.proxy_resp_status_code_500.count as f64),
            ("unknown", |m| m.proxy_resp_status_code_unknown.count as f64),
        ],
    },
];

pub struct MetricsCollector {
    client: Arc<dyn GrafanaApi>,
    scalars: Vec<Gauge>,
    timers: Vec<GaugeVec>,
    buckets: Vec<GaugeVec>,
    status: ScrapeStatus,
}

impl MetricsCollector {
    pub fn new(client: Arc<dyn GrafanaApi>) -> prometheus::Result<Self> {
        Ok(Self {
            client,
            scalars: scalar_gauges(SUBSYSTEM, SCALARS)?,
            timers: timer_vecs(SUBSYSTEM, TIMERS)?,
            buckets: bucket_vecs(SUBSYSTEM, BUCKET_GROUPS)?,
            status: ScrapeStatus::new(SUBSYSTEM, "Metrics")?,
        })
    }

    fn apply(&self, metrics: &Metrics) {
        for (field, gauge) in SCALARS.iter().zip(&self.scalars) {
            gauge.set((field.read)(metrics));
        }
        for (field, vec) in TIMERS.iter().zip(&self.timers) {
            write_timer(vec, (field.read)(metrics));
        }
        for (group, vec) in BUCKET_GROUPS.iter().zip(&self.buckets) {
            write_buckets(vec, group, metrics);
        }
    }
}

#[async_trait]
impl Collector for MetricsCollector {
    fn name(&self) -> &str {
        SUBSYSTEM
    }

    fn register(&self, registry: &Registry) -> prometheus::Result<()> {
        for gauge in &self.scalars {
            registry.register(Box::new(gauge.clone()))?;
        }
        for vec in self.timers.iter().chain(&self.buckets) {
            registry.register(Box::new(vec.clone()))?;
        }
        self.status.register(registry)
    }

    async fn scrape(&self) {
        let started = Instant::now();
        let result = self.client.metrics().await;
        match &result {
            Ok(metrics) => self.apply(metrics),
            Err(err) => error!("Failed to scrape Grafana Metrics: {err}"),
        }
        self.status.observe(&ScrapeOutcome {
            success: result.is_ok(),
            duration: started.elapsed(),
            finished_at: Utc::now().timestamp(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{sample, surface, FakeGrafana};
    use grafana_client::error::ClientError;

    fn fixture() -> Metrics {
        serde_json::from_str(
            r#"{
                "alerting.active_alerts": {"value": 7},
                "alerting.execution_time": {
                    "count": 1, "max": 2, "mean": 3.25, "min": 4,
                    "p25": 5.5, "p75": 6.5, "p90": 7.5, "p99": 8.5, "std": 9.5
                },
                "alerting.notifications_sent.type_slack": {"count": 12},
                "alerting.result.state_ok": {"count": 20},
                "api.resp_status.code_200": {"count": 31},
                "api.resp_status.code_500": {"count": 2},
                "api.login.post": {"count": 3},
                "stat_totals.stat_users": {"value": 9},
                "stat_totals.stat_dashboards": {"value": 4}
            }"#,
        )
        .unwrap()
    }

    fn setup() -> (Arc<FakeGrafana>, MetricsCollector, Registry) {
        let client = Arc::new(FakeGrafana::new());
        let collector = MetricsCollector::new(client.clone()).unwrap();
        let registry = Registry::new();
        collector.register(&registry).unwrap();
        (client, collector, registry)
    }

    #[tokio::test]
    async fn maps_scalars_timers_and_buckets() {
        let (client, collector, registry) = setup();
        client.push_metrics(Ok(fixture()));

        collector.scrape().await;

        assert_eq!(
            sample(&registry, "grafana_metrics_alerting_active_alerts", &[]),
            Some(7.0)
        );
        assert_eq!(
            sample(&registry, "grafana_metrics_api_login_post", &[]),
            Some(3.0)
        );
        assert_eq!(sample(&registry, "grafana_metrics_users", &[]), Some(9.0));
        assert_eq!(
            sample(&registry, "grafana_metrics_dashboards", &[]),
            Some(4.0)
        );

        let timer = "grafana_metrics_alerting_execution_time";
        for (label, value) in [
            ("count", 1.0),
            ("max", 2.0),
            ("mean", 3.25),
            ("min", 4.0),
            ("p25", 5.5),
            ("p75", 6.5),
            ("p90", 7.5),
            ("p99", 8.5),
            ("std", 9.5),
        ] {
            assert_eq!(
                sample(&registry, timer, &[("metric", label)]),
                Some(value),
                "{timer}{{metric={label}}}"
            );
        }

        assert_eq!(
            sample(
                &registry,
                "grafana_metrics_alerting_notifications_sent",
                &[("type", "slack")]
            ),
            Some(12.0)
        );
        assert_eq!(
            sample(
                &registry,
                "grafana_metrics_alerting_results",
                &[("state", "ok")]
            ),
            Some(20.0)
        );
        assert_eq!(
            sample(&registry, "grafana_metrics_api_responses", &[("code", "200")]),
            Some(31.0)
        );
        assert_eq!(
            sample(&registry, "grafana_metrics_api_responses", &[("code", "500")]),
            Some(2.0)
        );
    }

    #[tokio::test]
    async fn vanished_bucket_is_cleared_on_next_scrape() {
        let (client, collector, registry) = setup();
        client.push_metrics(Ok(fixture()));
        // Second payload no longer reports code_200; the bucket must read
        // zero, not the previous 31.
        client.push_metrics(Ok(serde_json::from_str("{}").unwrap()));

        collector.scrape().await;
        collector.scrape().await;

        assert_eq!(
            sample(&registry, "grafana_metrics_api_responses", &[("code", "200")]),
            Some(0.0)
        );
    }

    #[tokio::test]
    async fn failed_scrape_keeps_previous_values() {
        let (client, collector, registry) = setup();
        client.push_metrics(Ok(fixture()));
        client.push_metrics(Err(ClientError::Status { status: 500 }));

        collector.scrape().await;
        collector.scrape().await;

        assert_eq!(
            sample(&registry, "grafana_metrics_api_responses", &[("code", "200")]),
            Some(31.0)
        );
        assert_eq!(
            sample(
                &registry,
                "grafana_metrics_alerting_execution_time",
                &[("metric", "p99")]
            ),
            Some(8.5)
        );
        assert_eq!(
            sample(&registry, "grafana_metrics_scrape_errors_total", &[]),
            Some(1.0)
        );
        assert_eq!(
            sample(&registry, "grafana_metrics_last_scrape_error", &[]),
            Some(1.0)
        );
    }

    #[tokio::test]
    async fn surface_is_complete_before_first_scrape() {
        let (_client, _collector, registry) = setup();

        let initial = surface(&registry);
        assert_eq!(
            initial.len(),
            SCALARS.len() + TIMERS.len() + BUCKET_GROUPS.len() + 5
        );

        // Vector children exist at zero before anything was fetched.
        for group in BUCKET_GROUPS {
            let name = format!("grafana_metrics_{}", group.name);
            let family_samples = initial
                .iter()
                .find(|(n, _)| n == &name)
                .map(|(_, count)| *count);
            assert_eq!(family_samples, Some(group.buckets.len()), "{name}");
        }
        assert_eq!(
            sample(
                &registry,
                "grafana_metrics_api_dashboard_get",
                &[("metric", "mean")]
            ),
            Some(0.0)
        );
    }

    #[tokio::test]
    async fn surface_is_identical_across_outcomes() {
        let (client, collector, registry) = setup();
        let initial = surface(&registry);

        client.push_metrics(Err(ClientError::Status { status: 500 }));
        collector.scrape().await;
        assert_eq!(surface(&registry), initial);

        client.push_metrics(Ok(fixture()));
        collector.scrape().await;
        assert_eq!(surface(&registry), initial);
    }
}

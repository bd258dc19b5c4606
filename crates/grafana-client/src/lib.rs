//! Typed client for the Grafana monitoring APIs.
//!
//! Grafana exposes two JSON endpoints the exporter polls: `/api/admin/stats`
//! (a handful of entity counts) and `/api/metrics` (the internal
//! instrumentation snapshot). This crate decodes both into plain value
//! structs and hides the transport behind the [`GrafanaApi`] trait so
//! collectors can run against the real HTTP client or a fixture-backed fake.

pub mod error;
pub mod http;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::Result;

pub use crate::http::HttpClient;

/// Capability required by the collectors: fetch one of the two Grafana
/// records. Implementations must be shareable across concurrent scrapes.
#[async_trait]
pub trait GrafanaApi: Send + Sync {
    /// `GET /api/admin/stats`.
    async fn admin_stats(&self) -> Result<AdminStats>;

    /// `GET /api/metrics`.
    async fn metrics(&self) -> Result<Metrics>;
}

/// Response of `/api/admin/stats`: entity counts for the whole instance.
///
/// Grafana serializes these with `omitempty`, so a count the server chose
/// not to report decodes as zero. That merging is deliberate and mirrored
/// everywhere downstream.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AdminStats {
    pub alert_count: i64,
    pub dashboard_count: i64,
    #[serde(rename = "data_source_count")]
    pub datasource_count: i64,
    pub org_count: i64,
    pub playlist_count: i64,
    #[serde(rename = "db_snapshot_count")]
    pub snapshot_count: i64,
    #[serde(rename = "starred_db_count")]
    pub starred_count: i64,
    #[serde(rename = "db_tag_count")]
    pub tag_count: i64,
    pub user_count: i64,
}

/// A monotonically increasing count reported by `/api/metrics`.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct CounterValue {
    pub count: i64,
}

/// A point-in-time value reported by `/api/metrics`.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct GaugeValue {
    pub value: i64,
}

/// A latency-style summary reported by `/api/metrics`: count plus
/// min/max/mean, three quartile-ish percentiles, p99 and standard deviation.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct Timer {
    pub count: i64,
    pub max: i64,
    pub mean: f64,
    pub min: i64,
    pub p25: f64,
    pub p75: f64,
    pub p90: f64,
    pub p99: f64,
    pub std: f64,
}

/// Response of `/api/metrics`.
///
/// The JSON object is flat; keys are dotted metric paths
/// (`alerting.active_alerts`, `api.resp_status.code_200`, ...). Every field
/// defaults to its zero value when absent from the payload.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Metrics {
    #[serde(rename = "alerting.active_alerts")]
    pub alerting_active_alerts: GaugeValue,
    #[serde(rename = "alerting.execution_time")]
    pub alerting_execution_time: Timer,
    #[serde(rename = "alerting.notifications_sent.type_LINE")]
    pub alerting_notifications_sent_line: CounterValue,
    #[serde(rename = "alerting.notifications_sent.type_dingding")]
    pub alerting_notifications_sent_dingding: CounterValue,
    #[serde(rename = "alerting.notifications_sent.type_email")]
    pub alerting_notifications_sent_email: CounterValue,
    #[serde(rename = "alerting.notifications_sent.type_opsgenie")]
    pub alerting_notifications_sent_opsgenie: CounterValue,
    #[serde(rename = "alerting.notifications_sent.type_pagerduty")]
    pub alerting_notifications_sent_pagerduty: CounterValue,
    #[serde(rename = "alerting.notifications_sent.type_pushover")]
    pub alerting_notifications_sent_pushover: CounterValue,
    #[serde(rename = "alerting.notifications_sent.type_sensu")]
    pub alerting_notifications_sent_sensu: CounterValue,
    #[serde(rename = "alerting.notifications_sent.type_slack")]
    pub alerting_notifications_sent_slack: CounterValue,
    #[serde(rename = "alerting.notifications_sent.type_telegram")]
    pub alerting_notifications_sent_telegram: CounterValue,
    #[serde(rename = "alerting.notifications_sent.type_threema")]
    pub alerting_notifications_sent_threema: CounterValue,
    #[serde(rename = "alerting.notifications_sent.type_victorops")]
    pub alerting_notifications_sent_victorops: CounterValue,
    #[serde(rename = "alerting.notifications_sent.type_webhook")]
    pub alerting_notifications_sent_webhook: CounterValue,
    #[serde(rename = "alerting.result.state_alerting")]
    pub alerting_result_state_alerting: CounterValue,
    #[serde(rename = "alerting.result.state_no_data")]
    pub alerting_result_state_no_data: CounterValue,
    #[serde(rename = "alerting.result.state_ok")]
    pub alerting_result_state_ok: CounterValue,
    #[serde(rename = "alerting.result.state_paused")]
    pub alerting_result_state_paused: CounterValue,
    #[serde(rename = "alerting.result.state_pending")]
    pub alerting_result_state_pending: CounterValue,
    #[serde(rename = "api.admin.user_create")]
    pub api_admin_user_create: CounterValue,
    #[serde(rename = "api.dashboard.get")]
    pub api_dashboard_get: Timer,
    #[serde(rename = "api.dashboard.save")]
    pub api_dashboard_save: Timer,
    #[serde(rename = "api.dashboard.search")]
    pub api_dashboard_search: Timer,
    #[serde(rename = "api.dashboard_snapshot.create")]
    pub api_dashboard_snapshot_create: CounterValue,
    #[serde(rename = "api.dashboard_snapshot.external")]
    pub api_dashboard_snapshot_external: CounterValue,
    #[serde(rename = "api.dashboard_snapshot.get")]
    pub api_dashboard_snapshot_get: CounterValue,
    #[serde(rename = "api.dataproxy.request.all")]
    pub api_dataproxy_request_all: Timer,
    #[serde(rename = "api.login.oauth")]
    pub api_login_oauth: CounterValue,
    #[serde(rename = "api.login.post")]
    pub api_login_post: CounterValue,
    #[serde(rename = "api.org.create")]
    pub api_org_create: CounterValue,
    #[serde(rename = "api.resp_status.code_200")]
    pub api_resp_status_code_200: CounterValue,
    #[serde(rename = "api.resp_status.code_404")]
    pub api_resp_status_code_404: CounterValue,
    #[serde(rename = "api.resp_status.code_500")]
    pub api_resp_status_code_500: CounterValue,
    #[serde(rename = "api.resp_status.code_unknown")]
    pub api_resp_status_code_unknown: CounterValue,
    #[serde(rename = "api.user.signup_completed")]
    pub api_user_signup_completed: CounterValue,
    #[serde(rename = "api.user.signup_invite")]
    pub api_user_signup_invite: CounterValue,
    #[serde(rename = "api.user.signup_started")]
    pub api_user_signup_started: CounterValue,
    #[serde(rename = "aws.cloudwatch.get_metric_statistics")]
    pub aws_cloudwatch_get_metric_statistics: CounterValue,
    #[serde(rename = "aws.cloudwatch.list_metrics")]
    pub aws_cloudwatch_list_metrics: CounterValue,
    #[serde(rename = "instance_start")]
    pub instance_start: CounterValue,
    #[serde(rename = "models.dashboard.insert")]
    pub models_dashboard_insert: CounterValue,
    #[serde(rename = "page.resp_status.code_200")]
    pub page_resp_status_code_200: CounterValue,
    #[serde(rename = "page.resp_status.code_404")]
    pub page_resp_status_code_404: CounterValue,
    #[serde(rename = "page.resp_status.code_500")]
    pub page_resp_status_code_500: CounterValue,
    #[serde(rename = "page.resp_status.code_unknown")]
    pub page_resp_status_code_unknown: CounterValue,
    #[serde(rename = "proxy.resp_status.code_200")]
    pub proxy_resp_status_code_200: CounterValue,
    #[serde(rename = "proxy.resp_status.code_404")]
    pub proxy_resp_status_code_404: CounterValue,
    #[serde(rename = "proxy.resp_status.code_500")]
    pub proxy_resp_status_code_500: CounterValue,
    #[serde(rename = "proxy.resp_status.code_unknown")]
    pub proxy_resp_status_code_unknown: CounterValue,
    #[serde(rename = "stat_totals.stat_dashboards")]
    pub stat_totals_stat_dashboards: GaugeValue,
    #[serde(rename = "stat_totals.stat_orgs")]
    pub stat_totals_stat_orgs: GaugeValue,
    #[serde(rename = "stat_totals.stat_playlists")]
    pub stat_totals_stat_playlists: GaugeValue,
    #[serde(rename = "stat_totals.stat_users")]
    pub stat_totals_stat_users: GaugeValue,
}

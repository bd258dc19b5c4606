use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use grafana_collectors::Collector;
use prometheus::{Encoder, Registry, TextEncoder};
use std::sync::Arc;
use tracing::error;

#[derive(Clone)]
pub struct AppState {
    pub registry: Registry,
    pub collectors: Arc<Vec<Arc<dyn Collector>>>,
    pub telemetry_path: String,
}

pub fn build_http_app(state: AppState) -> Router {
    let telemetry_path = state.telemetry_path.clone();
    Router::new()
        .route("/", get(landing_page))
        .route(&telemetry_path, get(serve_metrics))
        .with_state(state)
}

/// One exporter scrape: every collector polls Grafana (concurrently, they
/// hold disjoint metric sets), then the whole registry is encoded. A failed
/// upstream call has already been folded into the collector's health
/// metrics by this point, so encoding always sees a complete snapshot.
async fn serve_metrics(State(state): State<AppState>) -> Response {
    futures::future::join_all(state.collectors.iter().map(|c| c.scrape())).await;

    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&state.registry.gather(), &mut buffer) {
        error!("Failed to encode metrics: {err}");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    (
        [(header::CONTENT_TYPE, encoder.format_type().to_string())],
        buffer,
    )
        .into_response()
}

async fn landing_page(State(state): State<AppState>) -> Html<String> {
    Html(render_landing_page(&state.telemetry_path))
}

fn render_landing_page(telemetry_path: &str) -> String {
    format!(
        "<html>\n\
         <head><title>Grafana Exporter</title></head>\n\
         <body>\n\
         <h1>Grafana Exporter</h1>\n\
         <p><a href='{telemetry_path}'>Metrics</a></p>\n\
         </body>\n\
         </html>"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn landing_page_links_to_telemetry_path() {
        let page = render_landing_page("/metrics");
        assert!(page.contains("<a href='/metrics'>"));
        assert!(page.contains("Grafana Exporter"));
    }
}

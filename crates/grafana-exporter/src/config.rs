use anyhow::{bail, Context, Result};
use serde::Deserialize;

/// Exporter configuration, loaded from an optional TOML file and then
/// overridden by `GRAFANA_EXPORTER_*` environment variables. The Grafana
/// URI is the only required setting.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExporterConfig {
    /// Base URI of the Grafana instance to poll.
    pub grafana_uri: String,
    /// Basic auth credentials; auth is sent only when both are non-empty.
    pub grafana_username: String,
    pub grafana_password: String,
    /// Disable TLS certificate validation for self-signed deployments.
    pub grafana_skip_tls_verify: bool,
    /// Address the exporter's own HTTP server binds to.
    pub listen_address: String,
    /// Path under which the metrics are exposed.
    pub telemetry_path: String,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            grafana_uri: String::new(),
            grafana_username: String::new(),
            grafana_password: String::new(),
            grafana_skip_tls_verify: false,
            listen_address: "0.0.0.0:9261".to_string(),
            telemetry_path: "/metrics".to_string(),
        }
    }
}

impl ExporterConfig {
    /// Reads the config file if a path was given, applies environment
    /// overrides and validates the result.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file '{path}'"))?;
                toml::from_str(&content)
                    .with_context(|| format!("Failed to parse config file '{path}'"))?
            }
            None => Self::default(),
        };
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        override_string("GRAFANA_EXPORTER_GRAFANA_URI", &mut self.grafana_uri);
        override_string(
            "GRAFANA_EXPORTER_GRAFANA_USERNAME",
            &mut self.grafana_username,
        );
        override_string(
            "GRAFANA_EXPORTER_GRAFANA_PASSWORD",
            &mut self.grafana_password,
        );
        override_bool(
            "GRAFANA_EXPORTER_GRAFANA_SKIP_SSL_VERIFY",
            &mut self.grafana_skip_tls_verify,
        )?;
        override_string(
            "GRAFANA_EXPORTER_WEB_LISTEN_ADDRESS",
            &mut self.listen_address,
        );
        override_string(
            "GRAFANA_EXPORTER_WEB_TELEMETRY_PATH",
            &mut self.telemetry_path,
        );
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.grafana_uri.is_empty() {
            bail!(
                "`grafana_uri` is required (set it in the config file or via \
                 GRAFANA_EXPORTER_GRAFANA_URI)"
            );
        }
        if !self.telemetry_path.starts_with('/') {
            bail!("`telemetry_path` must start with '/'");
        }
        Ok(())
    }
}

fn override_string(name: &str, value: &mut String) {
    if let Ok(env_value) = std::env::var(name) {
        if !env_value.is_empty() {
            *value = env_value;
        }
    }
}

fn override_bool(name: &str, value: &mut bool) -> Result<()> {
    if let Ok(env_value) = std::env::var(name) {
        if !env_value.is_empty() {
            *value = env_value
                .parse()
                .with_context(|| format!("Invalid `{name}`: '{env_value}'"))?;
        }
    }
    Ok(())
}

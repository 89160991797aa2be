//! Test template types and catalog fetch
//!
//! A template is a named, versioned list of metric definitions fetched
//! fresh from the cloud catalog for each run (unless the caller opts into
//! caching). Metric declaration order is preserved end to end: the report's
//! results come out in exactly the order the template declares them.

use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;
use tracing::info;

use crate::config::DeviceConfig;
use crate::error::{Result, SdkError};

/// One declared measurement in a template.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricDefinition {
    pub name: String,
    #[serde(default)]
    pub unit: String,
    pub threshold_max: Option<f64>,
    pub threshold_min: Option<f64>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SchemaDefinition {
    pub metrics: Vec<MetricDefinition>,
}

/// A named, versioned test specification from the catalog.
#[derive(Debug, Clone, Deserialize)]
pub struct Template {
    pub id: String,
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,
    pub schema_definition: SchemaDefinition,
}

fn default_version() -> String {
    "1.0".to_string()
}

/// Parse and structurally validate a template body.
///
/// Separate from the HTTP transport so malformed bodies are testable
/// without a live catalog.
pub fn parse_template(body: &str) -> Result<Template> {
    let template: Template = serde_json::from_str(body)
        .map_err(|e| SdkError::Parse(format!("invalid template body: {e}")))?;

    let metrics = &template.schema_definition.metrics;
    for (i, metric) in metrics.iter().enumerate() {
        if metric.name.is_empty() {
            return Err(SdkError::Parse(format!("metric #{i} has an empty name")));
        }
        if metrics[..i].iter().any(|m| m.name == metric.name) {
            return Err(SdkError::Parse(format!(
                "duplicate metric name '{}'",
                metric.name
            )));
        }
    }
    Ok(template)
}

/// Fetches templates from the cloud catalog over HTTP.
pub struct TemplateFetcher {
    http: reqwest::Client,
    api_base_url: String,
}

impl TemplateFetcher {
    pub fn new(config: &DeviceConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.fetch_timeout_secs))
            .build()
            .map_err(|e| SdkError::Network(format!("http client init failed: {e}")))?;
        Ok(Self { http, api_base_url: config.api_base_url.clone() })
    }

    /// GET `{api_base_url}/api/v1/templates/{template_id}`. Single attempt.
    pub async fn fetch(&self, template_id: &str) -> Result<Template> {
        let url = format!("{}/api/v1/templates/{}", self.api_base_url, template_id);
        info!("📥 fetching template from {url}");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| SdkError::Network(format!("GET {url} failed: {e}")))?;

        match response.status() {
            StatusCode::NOT_FOUND => return Err(SdkError::NotFound(template_id.to_string())),
            status if !status.is_success() => {
                return Err(SdkError::Network(format!("GET {url} returned {status}")));
            }
            _ => {}
        }

        let body = response
            .text()
            .await
            .map_err(|e| SdkError::Network(format!("reading template body failed: {e}")))?;

        let template = parse_template(&body)?;
        info!(
            "✅ template fetched - name={} version={} metrics={}",
            template.name,
            template.version,
            template.schema_definition.metrics.len()
        );
        Ok(template)
    }
}

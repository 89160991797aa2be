//! Test report assembly and wire serialization
//!
//! [`TestReport`] is the wire contract shared with every other device SDK
//! implementation: field names, units and the timestamp format must match
//! exactly, so the serde shapes here are the single source of truth for
//! this implementation and internal types never leak into the payload.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::detector::detect_anomalies;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// One simulated observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricResult {
    pub name: String,
    pub unit: String,
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold_max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold_min: Option<f64>,
}

/// Final payload of one test run. Immutable once assembled; it is either
/// published as-is or discarded, never patched downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestReport {
    pub template_id: String,
    pub device_id: String,
    pub timestamp: String,
    pub results: Vec<MetricResult>,
    pub has_anomaly: bool,
    pub anomaly_summary: Vec<String>,
}

impl TestReport {
    /// Assemble a report from the run's outputs, capturing the UTC
    /// timestamp at second precision. `has_anomaly` is purely derived.
    pub fn assemble(template_id: &str, device_id: &str, results: Vec<MetricResult>) -> Self {
        let anomaly_summary = detect_anomalies(&results);
        Self {
            template_id: template_id.to_string(),
            device_id: device_id.to_string(),
            timestamp: Utc::now().format(TIMESTAMP_FORMAT).to_string(),
            has_anomaly: !anomaly_summary.is_empty(),
            anomaly_summary,
            results,
        }
    }
}

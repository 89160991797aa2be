//! Threshold-based anomaly classification
//!
//! Flags `"{name} exceeds max"` when a result's value is strictly above
//! its `threshold_max`, and `"{name} below min"` when strictly below its
//! `threshold_min`. Results without thresholds never flag. Output order
//! follows the result (i.e. template declaration) order, max check first
//! per metric.

use crate::report::MetricResult;

pub fn detect_anomalies(results: &[MetricResult]) -> Vec<String> {
    let mut anomalies = Vec::new();
    for result in results {
        if let Some(max) = result.threshold_max {
            if result.value > max {
                anomalies.push(format!("{} exceeds max", result.name));
            }
        }
        if let Some(min) = result.threshold_min {
            if result.value < min {
                anomalies.push(format!("{} below min", result.name));
            }
        }
    }
    anomalies
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(name: &str, value: f64, max: Option<f64>, min: Option<f64>) -> MetricResult {
        MetricResult {
            name: name.to_string(),
            unit: "%".to_string(),
            value,
            threshold_max: max,
            threshold_min: min,
        }
    }

    #[test]
    fn value_above_max_flags_exceeds_max() {
        let results = vec![result("cpu_temperature", 83.4, Some(80.0), None)];
        assert_eq!(detect_anomalies(&results), ["cpu_temperature exceeds max"]);
    }

    #[test]
    fn value_below_min_flags_below_min() {
        let results = vec![result("memory_usage", 2.1, None, Some(5.0))];
        assert_eq!(detect_anomalies(&results), ["memory_usage below min"]);
    }

    #[test]
    fn value_at_the_threshold_does_not_flag() {
        let results = vec![
            result("cpu_usage", 90.0, Some(90.0), None),
            result("disk_usage", 10.0, None, Some(10.0)),
        ];
        assert!(detect_anomalies(&results).is_empty());
    }

    #[test]
    fn missing_thresholds_never_flag() {
        let results = vec![result("memory_usage", 999.0, None, None)];
        assert!(detect_anomalies(&results).is_empty());
    }

    #[test]
    fn summary_preserves_declaration_order() {
        let results = vec![
            result("disk_usage", 95.0, Some(90.0), None),
            result("network_latency", 120.0, Some(200.0), None),
            result("packet_loss_rate", 9.5, Some(5.0), None),
        ];
        assert_eq!(
            detect_anomalies(&results),
            ["disk_usage exceeds max", "packet_loss_rate exceeds max"]
        );
    }
}

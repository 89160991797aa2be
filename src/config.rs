//! Device runtime configuration
//!
//! Resolves a [`DeviceConfig`] from layered sources, in decreasing
//! precedence: explicit overrides (constructor/CLI arguments) →
//! environment variables → compiled-in defaults. Each field is resolved
//! independently, so a later source only fills fields an earlier one left
//! unset. The resolved config is immutable for the rest of the run and is
//! passed explicitly into each component — never held as global state.

use std::collections::HashMap;

use crate::error::{Result, SdkError};

const DEFAULT_DEVICE_ID: &str = "edge-rs-001";
const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
const DEFAULT_BROKER_URI: &str = "tcp://localhost:1883";
const DEFAULT_TOPIC_PREFIX: &str = "iot/test/report";
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 15;
const DEFAULT_PUBLISH_TIMEOUT_SECS: u64 = 10;

/// Explicit per-field overrides, the highest-precedence source.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub device_id: Option<String>,
    pub api_base_url: Option<String>,
    pub broker_uri: Option<String>,
    pub broker_username: Option<String>,
    pub broker_password: Option<String>,
    pub topic_prefix: Option<String>,
    pub publish_retries: Option<u32>,
    pub cache_templates: Option<bool>,
}

/// Resolved broker endpoint, parsed once at config time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerEndpoint {
    pub host: String,
    pub port: u16,
}

/// Resolved run-time identity and endpoints for one device run.
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    pub device_id: String,
    pub api_base_url: String,
    pub broker_uri: String,
    pub broker: BrokerEndpoint,
    pub broker_username: Option<String>,
    pub broker_password: Option<String>,
    pub topic_prefix: String,
    pub fetch_timeout_secs: u64,
    pub publish_timeout_secs: u64,
    /// Extra full publish attempts after the first one fails. Off by default.
    pub publish_retries: u32,
    /// Reuse a fetched template for repeated runs against the same id.
    pub cache_templates: bool,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            device_id: DEFAULT_DEVICE_ID.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            broker_uri: DEFAULT_BROKER_URI.to_string(),
            broker: BrokerEndpoint { host: "localhost".to_string(), port: 1883 },
            broker_username: None,
            broker_password: None,
            topic_prefix: DEFAULT_TOPIC_PREFIX.to_string(),
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            publish_timeout_secs: DEFAULT_PUBLISH_TIMEOUT_SECS,
            publish_retries: 0,
            cache_templates: false,
        }
    }
}

impl DeviceConfig {
    /// Resolve from overrides + process environment + defaults.
    pub fn resolve(overrides: ConfigOverrides) -> Result<Self> {
        let env: HashMap<String, String> = std::env::vars().collect();
        Self::resolve_from(overrides, &env)
    }

    /// Resolution core with an injected environment map.
    pub fn resolve_from(
        overrides: ConfigOverrides,
        env: &HashMap<String, String>,
    ) -> Result<Self> {
        let pick = |explicit: Option<String>, var: &str, default: &str| -> String {
            explicit
                .or_else(|| env.get(var).cloned())
                .unwrap_or_else(|| default.to_string())
        };

        let device_id = pick(overrides.device_id, "DEVICE_ID", DEFAULT_DEVICE_ID);
        let api_base_url = pick(overrides.api_base_url, "API_BASE_URL", DEFAULT_API_BASE_URL);
        let broker_uri = pick(overrides.broker_uri, "MQTT_BROKER_URI", DEFAULT_BROKER_URI);
        let topic_prefix = pick(overrides.topic_prefix, "MQTT_TOPIC_PREFIX", DEFAULT_TOPIC_PREFIX);

        let broker_username = overrides
            .broker_username
            .or_else(|| env.get("MQTT_USERNAME").cloned())
            .filter(|s| !s.is_empty());
        let broker_password = overrides
            .broker_password
            .or_else(|| env.get("MQTT_PASSWORD").cloned())
            .filter(|s| !s.is_empty());

        let api_base_url = validate_api_base_url(&api_base_url)?;
        let broker = parse_broker_uri(&broker_uri)?;

        Ok(Self {
            device_id,
            api_base_url,
            broker_uri,
            broker,
            broker_username,
            broker_password,
            topic_prefix,
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            publish_timeout_secs: DEFAULT_PUBLISH_TIMEOUT_SECS,
            publish_retries: overrides.publish_retries.unwrap_or(0),
            cache_templates: overrides.cache_templates.unwrap_or(false),
        })
    }

    /// Topic this device publishes reports to.
    pub fn report_topic(&self) -> String {
        format!("{}/{}", self.topic_prefix, self.device_id)
    }

    /// MQTT client identity for this device.
    pub fn mqtt_client_id(&self) -> String {
        format!("device-{}", self.device_id)
    }
}

fn validate_api_base_url(url: &str) -> Result<String> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(SdkError::Config(format!(
            "api_base_url must be http(s), got '{url}'"
        )));
    }
    Ok(url.trim_end_matches('/').to_string())
}

/// Accepts `tcp://host:port`, `mqtt://host:port`, `host:port` or bare
/// `host`. IPv6 literals must be bracketed (`tcp://[::1]:1883`); the
/// brackets are stripped from the resolved host.
fn parse_broker_uri(uri: &str) -> Result<BrokerEndpoint> {
    let rest = uri
        .strip_prefix("tcp://")
        .or_else(|| uri.strip_prefix("mqtt://"))
        .unwrap_or(uri);

    if rest.is_empty() {
        return Err(SdkError::Config(format!("malformed broker URI '{uri}'")));
    }

    if let Some(bracketed) = rest.strip_prefix('[') {
        let (host, tail) = bracketed
            .split_once(']')
            .ok_or_else(|| SdkError::Config(format!("unclosed bracket in broker URI '{uri}'")))?;
        if host.is_empty() {
            return Err(SdkError::Config(format!("malformed broker URI '{uri}'")));
        }
        let port: u16 = match tail {
            "" => 1883,
            tail => tail
                .strip_prefix(':')
                .and_then(|p| p.parse().ok())
                .ok_or_else(|| SdkError::Config(format!("invalid broker port in '{uri}'")))?,
        };
        return Ok(BrokerEndpoint { host: host.to_string(), port });
    }

    match rest.rsplit_once(':') {
        Some((host, port)) => {
            if host.is_empty() || host.contains(':') {
                return Err(SdkError::Config(format!(
                    "malformed broker URI '{uri}' (IPv6 literals must be bracketed)"
                )));
            }
            let port: u16 = port.parse().map_err(|_| {
                SdkError::Config(format!("invalid broker port in '{uri}'"))
            })?;
            Ok(BrokerEndpoint { host: host.to_string(), port })
        }
        None => Ok(BrokerEndpoint { host: rest.to_string(), port: 1883 }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let cfg = DeviceConfig::resolve_from(ConfigOverrides::default(), &env(&[])).unwrap();
        assert_eq!(cfg.device_id, "edge-rs-001");
        assert_eq!(cfg.api_base_url, "http://localhost:8000");
        assert_eq!(cfg.broker.host, "localhost");
        assert_eq!(cfg.broker.port, 1883);
        assert_eq!(cfg.topic_prefix, "iot/test/report");
        assert_eq!(cfg.publish_retries, 0);
        assert!(!cfg.cache_templates);
    }

    #[test]
    fn environment_fills_unset_fields() {
        let e = env(&[
            ("DEVICE_ID", "edge-42"),
            ("API_BASE_URL", "https://cloud.example.com/"),
            ("MQTT_BROKER_URI", "tcp://broker.example.com:8883"),
            ("MQTT_USERNAME", "dev"),
            ("MQTT_PASSWORD", "secret"),
        ]);
        let cfg = DeviceConfig::resolve_from(ConfigOverrides::default(), &e).unwrap();
        assert_eq!(cfg.device_id, "edge-42");
        assert_eq!(cfg.api_base_url, "https://cloud.example.com");
        assert_eq!(cfg.broker.port, 8883);
        assert_eq!(cfg.broker_username.as_deref(), Some("dev"));
        assert_eq!(cfg.broker_password.as_deref(), Some("secret"));
    }

    #[test]
    fn explicit_overrides_beat_environment() {
        let e = env(&[("DEVICE_ID", "from-env")]);
        let overrides = ConfigOverrides {
            device_id: Some("from-args".to_string()),
            ..Default::default()
        };
        let cfg = DeviceConfig::resolve_from(overrides, &e).unwrap();
        assert_eq!(cfg.device_id, "from-args");
    }

    #[test]
    fn fields_resolve_independently() {
        let e = env(&[("API_BASE_URL", "http://api.env:9000")]);
        let overrides = ConfigOverrides {
            device_id: Some("mixed".to_string()),
            ..Default::default()
        };
        let cfg = DeviceConfig::resolve_from(overrides, &e).unwrap();
        assert_eq!(cfg.device_id, "mixed");
        assert_eq!(cfg.api_base_url, "http://api.env:9000");
        assert_eq!(cfg.broker_uri, "tcp://localhost:1883");
    }

    #[test]
    fn malformed_broker_uri_is_a_config_error() {
        for bad in ["tcp://host:notaport", "tcp://:1883", "tcp://"] {
            let overrides = ConfigOverrides {
                broker_uri: Some(bad.to_string()),
                ..Default::default()
            };
            let err = DeviceConfig::resolve_from(overrides, &env(&[])).unwrap_err();
            assert!(matches!(err, SdkError::Config(_)), "{bad}: {err}");
        }
    }

    #[test]
    fn non_http_api_url_is_a_config_error() {
        let overrides = ConfigOverrides {
            api_base_url: Some("ftp://files.example.com".to_string()),
            ..Default::default()
        };
        let err = DeviceConfig::resolve_from(overrides, &env(&[])).unwrap_err();
        assert!(matches!(err, SdkError::Config(_)));
    }

    #[test]
    fn bracketed_ipv6_broker_uri_strips_the_brackets() {
        let overrides = ConfigOverrides {
            broker_uri: Some("tcp://[::1]:8883".to_string()),
            ..Default::default()
        };
        let cfg = DeviceConfig::resolve_from(overrides, &env(&[])).unwrap();
        assert_eq!(cfg.broker, BrokerEndpoint { host: "::1".to_string(), port: 8883 });

        let overrides = ConfigOverrides {
            broker_uri: Some("[fe80::1]".to_string()),
            ..Default::default()
        };
        let cfg = DeviceConfig::resolve_from(overrides, &env(&[])).unwrap();
        assert_eq!(cfg.broker, BrokerEndpoint { host: "fe80::1".to_string(), port: 1883 });
    }

    #[test]
    fn unbracketed_ipv6_broker_uri_is_rejected() {
        for bad in ["tcp://::1", "::1:1883", "tcp://[::1", "tcp://[]:1883", "tcp://[::1]x"] {
            let overrides = ConfigOverrides {
                broker_uri: Some(bad.to_string()),
                ..Default::default()
            };
            let err = DeviceConfig::resolve_from(overrides, &env(&[])).unwrap_err();
            assert!(matches!(err, SdkError::Config(_)), "{bad}: {err}");
        }
    }

    #[test]
    fn bare_host_broker_uri_defaults_to_1883() {
        let overrides = ConfigOverrides {
            broker_uri: Some("mqtt.local".to_string()),
            ..Default::default()
        };
        let cfg = DeviceConfig::resolve_from(overrides, &env(&[])).unwrap();
        assert_eq!(cfg.broker, BrokerEndpoint { host: "mqtt.local".to_string(), port: 1883 });
    }

    #[test]
    fn report_topic_and_client_id() {
        let cfg = DeviceConfig::default();
        assert_eq!(cfg.report_topic(), "iot/test/report/edge-rs-001");
        assert_eq!(cfg.mqtt_client_id(), "device-edge-rs-001");
    }
}

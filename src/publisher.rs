//! MQTT telemetry publishing
//!
//! One-shot publisher: connect to the broker as `device-{device_id}`,
//! publish the report to `{topic_prefix}/{device_id}` at QoS 1 (not
//! retained), wait for the broker's acknowledgment, disconnect. The event
//! loop is driven inline so the call genuinely blocks until the puback,
//! bounded by `publish_timeout_secs`.
//!
//! A single attempt per call unless `publish_retries` asks for more; the
//! pipeline itself never loops.

use std::time::Duration;

use rumqttc::{AsyncClient, ConnectReturnCode, Event, Incoming, MqttOptions, Outgoing, QoS};
use tokio::time::timeout;
use tracing::{info, warn};

use crate::config::DeviceConfig;
use crate::error::{Result, SdkError};
use crate::report::TestReport;

pub struct TelemetryPublisher {
    config: DeviceConfig,
}

impl TelemetryPublisher {
    pub fn new(config: DeviceConfig) -> Self {
        Self { config }
    }

    /// Publish a report, honoring the configured extra attempts.
    pub async fn publish(&self, report: &TestReport) -> Result<()> {
        let payload = serde_json::to_vec(report)
            .map_err(|e| SdkError::Publish(format!("report serialization failed: {e}")))?;

        let attempts = self.config.publish_retries + 1;
        let mut last_err = None;
        for attempt in 1..=attempts {
            match self.publish_once(&payload).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    if attempt < attempts {
                        warn!("publish attempt {attempt}/{attempts} failed: {e}");
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                    last_err = Some(e);
                }
            }
        }
        // attempts >= 1, so last_err is set on this path
        Err(last_err.unwrap_or_else(|| SdkError::Publish("no publish attempt made".into())))
    }

    async fn publish_once(&self, payload: &[u8]) -> Result<()> {
        let mut options = MqttOptions::new(
            self.config.mqtt_client_id(),
            &self.config.broker.host,
            self.config.broker.port,
        );
        options.set_keep_alive(Duration::from_secs(30));
        options.set_clean_session(true);
        if let Some(username) = &self.config.broker_username {
            options.set_credentials(
                username,
                self.config.broker_password.clone().unwrap_or_default(),
            );
        }

        let (client, mut eventloop) = AsyncClient::new(options, 10);
        let topic = self.config.report_topic();
        info!("📡 connecting to broker {} as {}", self.config.broker_uri, self.config.mqtt_client_id());

        let deadline = Duration::from_secs(self.config.publish_timeout_secs);
        let publish_flow = async {
            let mut published = false;
            loop {
                match eventloop.poll().await {
                    Ok(Event::Incoming(Incoming::ConnAck(ack))) => {
                        if ack.code != ConnectReturnCode::Success {
                            return Err(SdkError::Connect(format!(
                                "broker rejected connection: {:?}",
                                ack.code
                            )));
                        }
                        client
                            .publish(&topic, QoS::AtLeastOnce, false, payload.to_vec())
                            .await
                            .map_err(|e| SdkError::Publish(format!("publish failed: {e}")))?;
                        published = true;
                    }
                    Ok(Event::Incoming(Incoming::PubAck(_))) => {
                        info!("✅ report acknowledged on {} ({} bytes)", topic, payload.len());
                        client
                            .disconnect()
                            .await
                            .map_err(|e| SdkError::Publish(format!("disconnect failed: {e}")))?;
                    }
                    Ok(Event::Outgoing(Outgoing::Disconnect)) => return Ok(()),
                    Ok(_) => {}
                    Err(e) => {
                        return Err(if published {
                            SdkError::Publish(format!("connection lost before ack: {e}"))
                        } else {
                            SdkError::Connect(format!(
                                "broker {} unreachable: {e}",
                                self.config.broker_uri
                            ))
                        });
                    }
                }
            }
        };

        match timeout(deadline, publish_flow).await {
            Ok(result) => result,
            Err(_) => Err(SdkError::Publish(format!(
                "no acknowledgment within {}s",
                self.config.publish_timeout_secs
            ))),
        }
    }
}

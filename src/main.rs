//! EdgeStelle device CLI
//!
//! Runs one simulated test against a template and reports it over MQTT:
//!
//! ```text
//! edgestelle-device <template_id> [device_id] [api_base_url] [broker_uri]
//! ```
//!
//! Positional overrides beat the `DEVICE_ID` / `API_BASE_URL` /
//! `MQTT_BROKER_URI` environment variables, which beat the built-in
//! defaults. The resulting report is printed as formatted JSON on stdout;
//! exit code is 0 on success, 1 on any fetch/publish failure.

use anyhow::Result;
use clap::Parser;
use edgestelle_device::{ConfigOverrides, DeviceConfig, TestRunner};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "edgestelle-device", version, about = "EdgeStelle simulated device")]
struct Cli {
    /// Template to execute
    template_id: String,

    /// Device identity override
    #[arg(env = "DEVICE_ID")]
    device_id: Option<String>,

    /// Cloud catalog base URL override
    #[arg(env = "API_BASE_URL")]
    api_base_url: Option<String>,

    /// MQTT broker URI override (tcp://host:port)
    #[arg(env = "MQTT_BROKER_URI")]
    broker_uri: Option<String>,

    /// MQTT username
    #[arg(long, env = "MQTT_USERNAME")]
    username: Option<String>,

    /// MQTT password
    #[arg(long, env = "MQTT_PASSWORD")]
    password: Option<String>,

    /// Report topic prefix
    #[arg(long, env = "MQTT_TOPIC_PREFIX")]
    topic_prefix: Option<String>,

    /// Extra publish attempts after a failed one
    #[arg(long, default_value_t = 0)]
    publish_retries: u32,

    /// Reuse fetched templates across runs in this process
    #[arg(long)]
    cache_templates: bool,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            device_id: self.device_id.clone(),
            api_base_url: self.api_base_url.clone(),
            broker_uri: self.broker_uri.clone(),
            broker_username: self.username.clone(),
            broker_password: self.password.clone(),
            topic_prefix: self.topic_prefix.clone(),
            publish_retries: Some(self.publish_retries),
            cache_templates: Some(self.cache_templates),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("edgestelle_device=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = DeviceConfig::resolve(cli.overrides())?;
    info!(
        "🤖 EdgeStelle device starting - device={} broker={}",
        config.device_id, config.broker_uri
    );

    let mut runner = TestRunner::new(config);
    match runner.run(&cli.template_id).await {
        Ok(report) => {
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Err(e) => {
            error!("❌ run failed: {e}");
            // an assembled-but-unpublished report is still worth printing
            if let Some(report) = runner.last_report() {
                println!("{}", serde_json::to_string_pretty(report)?);
            }
            std::process::exit(1);
        }
    }
}

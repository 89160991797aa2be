//! EdgeStelle device-side SDK
//!
//! One invocation drives the full device workflow:
//! 1. Fetch a test template from the cloud catalog over HTTP
//! 2. Simulate one synthetic reading per declared metric
//! 3. Classify each reading against the declared thresholds
//! 4. Assemble an immutable JSON report
//! 5. Publish it over MQTT to `{topic_prefix}/{device_id}` at QoS 1
//!
//! Every run is independent: its own config, its own randomness source,
//! its own broker connection. Fleet simulation is N processes, not threads.

pub mod config;
pub mod detector;
pub mod error;
pub mod publisher;
pub mod report;
pub mod runner;
pub mod simulator;
pub mod template;

pub use config::{ConfigOverrides, DeviceConfig};
pub use error::SdkError;
pub use report::{MetricResult, TestReport};
pub use runner::{RunStage, TestRunner};
pub use template::{MetricDefinition, Template};

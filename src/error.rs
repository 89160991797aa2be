//! Error taxonomy for the device SDK
//!
//! Every variant is terminal for the current run: the pipeline never
//! recovers or retries internally (the explicit `publish_retries` option
//! excepted). Callers that want retry loop the whole run.

use thiserror::Error;

/// All failure modes a single test run can surface.
#[derive(Debug, Error)]
pub enum SdkError {
    /// A configuration field could not be resolved to a well-formed value.
    #[error("configuration error: {0}")]
    Config(String),

    /// HTTP transport failure or timeout while fetching a template.
    #[error("network error: {0}")]
    Network(String),

    /// The catalog reports the requested template does not exist.
    #[error("template not found: {0}")]
    NotFound(String),

    /// The template body is not valid or misses required structure.
    #[error("template parse error: {0}")]
    Parse(String),

    /// Broker unreachable or connection refused/rejected.
    #[error("broker connect error: {0}")]
    Connect(String),

    /// The publish was not acknowledged within the timeout.
    #[error("publish error: {0}")]
    Publish(String),
}

pub type Result<T> = std::result::Result<T, SdkError>;

//! Run orchestration
//!
//! Sequences one full device run: fetch template → simulate + classify →
//! assemble → publish → return the report. Stages are tracked so callers
//! can observe where a failed run stopped. The assembled report is stored
//! on the runner before publishing: when only the publish fails, the
//! caller still gets at the report via [`TestRunner::last_report`] and can
//! log or retry it out of band.

use std::collections::HashMap;

use tracing::{error, info};

use crate::config::DeviceConfig;
use crate::error::{Result, SdkError};
use crate::publisher::TelemetryPublisher;
use crate::report::TestReport;
use crate::simulator::MetricSimulator;
use crate::template::{Template, TemplateFetcher};

/// Pipeline stage of the most recent run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    Idle,
    Fetching,
    Simulating,
    Publishing,
    Done,
    Failed,
}

pub struct TestRunner {
    config: DeviceConfig,
    simulator: MetricSimulator,
    stage: RunStage,
    last_report: Option<TestReport>,
    template_cache: HashMap<String, Template>,
}

impl TestRunner {
    pub fn new(config: DeviceConfig) -> Self {
        Self {
            config,
            simulator: MetricSimulator::new(),
            stage: RunStage::Idle,
            last_report: None,
            template_cache: HashMap::new(),
        }
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    pub fn stage(&self) -> RunStage {
        self.stage
    }

    /// Report assembled by the most recent run, kept even when the
    /// subsequent publish failed.
    pub fn last_report(&self) -> Option<&TestReport> {
        self.last_report.as_ref()
    }

    /// Full workflow: fetch → execute → publish → return the report.
    pub async fn run(&mut self, template_id: &str) -> Result<TestReport> {
        self.last_report = None;

        self.stage = RunStage::Fetching;
        let template = match self.fetch_template(template_id).await {
            Ok(template) => template,
            Err(e) => return self.fail(e),
        };

        self.stage = RunStage::Simulating;
        let report = self.execute_test(&template);
        self.last_report = Some(report.clone());

        self.stage = RunStage::Publishing;
        let publisher = TelemetryPublisher::new(self.config.clone());
        if let Err(e) = publisher.publish(&report).await {
            return self.fail(e);
        }

        self.stage = RunStage::Done;
        info!("🏁 run complete - template={} anomalies={}", template.id, report.anomaly_summary.len());
        Ok(report)
    }

    /// The publish-free core of a run: simulate every declared metric and
    /// assemble the report.
    pub fn execute_test(&mut self, template: &Template) -> TestReport {
        let metrics = &template.schema_definition.metrics;
        info!("🧪 executing test - {} metrics", metrics.len());
        let results = self.simulator.run_tests(metrics);
        TestReport::assemble(&template.id, &self.config.device_id, results)
    }

    async fn fetch_template(&mut self, template_id: &str) -> Result<Template> {
        if self.config.cache_templates {
            if let Some(template) = self.template_cache.get(template_id) {
                info!("template {template_id} served from cache");
                return Ok(template.clone());
            }
        }

        let fetcher = TemplateFetcher::new(&self.config)?;
        let template = fetcher.fetch(template_id).await?;

        if self.config.cache_templates {
            self.template_cache.insert(template_id.to_string(), template.clone());
        }
        Ok(template)
    }

    fn fail<T>(&mut self, e: SdkError) -> Result<T> {
        self.stage = RunStage::Failed;
        error!("run failed: {e}");
        Err(e)
    }
}

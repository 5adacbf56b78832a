//! Health probing of model/provider availability
//!
//! [`HealthProber`] runs one synthetic completion per model, all of them
//! concurrently and each under its own deadline. [`HealthCheckManager`] keeps
//! the most recent report and can refresh it on a background interval.

use futures::future::join_all;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::gateway::invoker::CompletionInvoker;
use crate::gateway::types::{GenerationParams, Message, ModelId, ProbeReport, ProbeResult};

/// Prompt sent by every probe
pub const PROBE_PROMPT: &str = "ping";

/// Default per-model probe timeout
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(8);

pub struct HealthProber {
    invoker: CompletionInvoker,
    /// Per-model timeouts are clamped to this ceiling
    ceiling: Duration,
}

impl HealthProber {
    pub fn new(invoker: CompletionInvoker, ceiling: Duration) -> Self {
        Self { invoker, ceiling }
    }

    /// Probe every model concurrently; results follow input order
    pub async fn probe(&self, models: &[ModelId], per_model_timeout: Duration) -> Vec<ProbeResult> {
        let timeout = per_model_timeout.min(self.ceiling);

        join_all(models.iter().map(|model| self.probe_one(model, timeout))).await
    }

    /// Probe and aggregate into a report
    pub async fn report(&self, models: &[ModelId], per_model_timeout: Duration) -> ProbeReport {
        let report = ProbeReport::from(self.probe(models, per_model_timeout).await);
        info!(
            probed = report.results.len(),
            working = report.count_working,
            "Health probe completed"
        );
        report
    }

    async fn probe_one(&self, model: &str, timeout: Duration) -> ProbeResult {
        let provider = match self.invoker.registry().resolve(model, None) {
            Ok(provider) => provider,
            Err(_) => return ProbeResult::unknown_model(model),
        };

        let messages = [Message::user(PROBE_PROMPT)];
        let params = GenerationParams::probe();

        match self
            .invoker
            .invoke(model, &provider, &messages, &params, timeout)
            .await
        {
            Ok(reply) => {
                debug!(model = %model, provider = %provider, "Probe passed");
                ProbeResult::passed(model, provider, &reply)
            }
            Err(e) => {
                debug!(model = %model, provider = %provider, error = %e, "Probe failed");
                ProbeResult::failed(model, provider, e.to_string())
            }
        }
    }
}

/// Model health summary counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HealthSummary {
    pub total: usize,
    pub healthy: usize,
    pub unhealthy: usize,
}

/// Holds the latest probe report and drives periodic probing
pub struct HealthCheckManager {
    prober: Arc<HealthProber>,
    models: Vec<ModelId>,
    per_model_timeout: Duration,
    last_report: RwLock<Option<ProbeReport>>,
}

impl HealthCheckManager {
    pub fn new(prober: Arc<HealthProber>, models: Vec<ModelId>, per_model_timeout: Duration) -> Self {
        Self {
            prober,
            models,
            per_model_timeout,
            last_report: RwLock::new(None),
        }
    }

    pub fn prober(&self) -> &Arc<HealthProber> {
        &self.prober
    }

    /// Default model set probed when a request names none
    pub fn default_models(&self) -> &[ModelId] {
        &self.models
    }

    pub fn default_timeout(&self) -> Duration {
        self.per_model_timeout
    }

    /// Probe the default model set once and store the report
    pub async fn refresh(&self) -> ProbeReport {
        let report = self.prober.report(&self.models, self.per_model_timeout).await;
        *self.last_report.write() = Some(report.clone());
        report
    }

    pub fn last_report(&self) -> Option<ProbeReport> {
        self.last_report.read().clone()
    }

    /// Counts from the last report; all zero before the first probe
    pub fn get_health_summary(&self) -> HealthSummary {
        match self.last_report.read().as_ref() {
            Some(report) => HealthSummary {
                total: report.results.len(),
                healthy: report.count_working,
                unhealthy: report.results.len() - report.count_working,
            },
            None => HealthSummary::default(),
        }
    }

    /// Start the background probe loop
    pub fn start(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let manager = Arc::clone(self);
        info!(interval_secs = interval.as_secs(), "Starting background health checks");

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                manager.refresh().await;
            }
        })
    }
}

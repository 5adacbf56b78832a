//! Dispatch engine: validate, resolve, invoke once, shape the result

use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

use crate::error::DispatchError;
use crate::gateway::invoker::CompletionInvoker;
use crate::gateway::types::{DispatchResult, GenerationParams, Message};
use crate::provider::ProviderRegistry;

/// Default ceiling for a single dispatch
pub const DEFAULT_DISPATCH_TIMEOUT: Duration = Duration::from_secs(60);

/// Routes a chat request to exactly one provider.
/// There are no retries and no fallback to the model's other providers.
pub struct Dispatcher {
    invoker: CompletionInvoker,
    timeout: Duration,
}

impl Dispatcher {
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self::with_timeout(registry, DEFAULT_DISPATCH_TIMEOUT)
    }

    pub fn with_timeout(registry: Arc<ProviderRegistry>, timeout: Duration) -> Self {
        Self {
            invoker: CompletionInvoker::new(registry),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn invoker(&self) -> &CompletionInvoker {
        &self.invoker
    }

    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        self.invoker.registry()
    }

    pub async fn dispatch(
        &self,
        model: &str,
        provider: Option<&str>,
        messages: &[Message],
        params: &GenerationParams,
    ) -> Result<DispatchResult, DispatchError> {
        let provider_used = self.registry().resolve(model, provider)?;

        let started = Instant::now();
        let outcome = self
            .invoker
            .invoke(model, &provider_used, messages, params, self.timeout)
            .await;
        let elapsed = started.elapsed();

        let text = outcome.map_err(DispatchError::from)?;

        info!(
            model = %model,
            provider = %provider_used,
            elapsed_ms = elapsed.as_millis() as u64,
            "Dispatch completed"
        );

        Ok(DispatchResult {
            text,
            provider_used,
            elapsed,
        })
    }
}

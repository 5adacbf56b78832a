//! Completion invoker: one deadline-bounded call to a provider capability

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::InvokerError;
use crate::gateway::types::{GenerationParams, Message};
use crate::provider::{CompletionRequest, ProviderError, ProviderRegistry};

/// Run `call` on its own task and wait at most `limit` for it.
///
/// On timeout the task is aborted, so whatever it would have produced is
/// dropped with it and never reaches a caller.
pub async fn run_with_deadline<F, T>(limit: Duration, call: F) -> Result<T, InvokerError>
where
    F: Future<Output = Result<T, ProviderError>> + Send + 'static,
    T: Send + 'static,
{
    let mut task = tokio::spawn(call);

    match tokio::time::timeout(limit, &mut task).await {
        Ok(Ok(Ok(value))) => Ok(value),
        Ok(Ok(Err(e))) => Err(InvokerError::ProviderFailure {
            message: e.to_string(),
        }),
        Ok(Err(join_error)) => Err(InvokerError::ProviderFailure {
            message: format!("provider task failed: {}", join_error),
        }),
        Err(_) => {
            task.abort();
            Err(InvokerError::Timeout(limit))
        }
    }
}

/// Wraps provider calls with a deadline and uniform error translation
#[derive(Clone)]
pub struct CompletionInvoker {
    registry: Arc<ProviderRegistry>,
}

impl CompletionInvoker {
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        &self.registry
    }

    /// Ask `provider` to complete the conversation within `timeout`
    pub async fn invoke(
        &self,
        model: &str,
        provider: &str,
        messages: &[Message],
        params: &GenerationParams,
        timeout: Duration,
    ) -> Result<String, InvokerError> {
        let capability = self.registry.capability(provider).ok_or_else(|| {
            InvokerError::ProviderFailure {
                message: format!("no capability registered for provider {}", provider),
            }
        })?;

        let request = CompletionRequest {
            model: model.to_string(),
            messages: messages.to_vec(),
            params: *params,
        };

        debug!(model = %model, provider = %provider, timeout_ms = timeout.as_millis() as u64, "Invoking provider");

        let result = run_with_deadline(timeout, async move { capability.complete(request).await }).await;

        if let Err(e) = &result {
            warn!(model = %model, provider = %provider, error = %e, "Provider call failed");
        }

        result
    }
}

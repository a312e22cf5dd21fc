//! Concurrent provider fan-out with degrade-to-empty.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;

use crate::error::VisionError;
use crate::provider::{ProviderOutput, SignalProvider};

/// Run every provider against `image_url` concurrently and wait for all of them.
///
/// Each call carries its own `timeout`. A provider that errors or times out
/// is logged and contributes nothing; the returned outputs keep provider order.
pub async fn collect_signals(
    providers: &[Arc<dyn SignalProvider>],
    image_url: &str,
    timeout: Duration,
) -> Vec<ProviderOutput> {
    let calls = providers.iter().map(Arc::clone).map(|provider| async move {
        let outcome = match tokio::time::timeout(timeout, provider.analyze(image_url)).await {
            Ok(result) => result,
            Err(_) => Err(VisionError::Timeout {
                provider: provider.name().to_string(),
                timeout_secs: timeout.as_secs(),
            }),
        };
        absorb(provider.name(), outcome)
    });

    join_all(calls).await.into_iter().flatten().collect()
}

fn absorb(
    provider: &'static str,
    outcome: Result<ProviderOutput, VisionError>,
) -> Option<ProviderOutput> {
    match outcome {
        Ok(output) => {
            tracing::debug!(provider, "signal provider succeeded");
            Some(output)
        }
        Err(e) => {
            tracing::warn!(provider, error = %e, "signal provider failed");
            None
        }
    }
}

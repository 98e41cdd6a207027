use crate::application::router::SampleRouter;
use crate::domain::ports::SampleTransport;
use anyhow::Result;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Bridges a sample transport onto a configuration's router.
///
/// One task per configuration pulls from the transport's stream and fans
/// samples out to the per-metric queues. Routing failures for individual
/// samples are reported and dropped; the service itself only ends when the
/// stream closes.
pub struct IngestService {
    handle: JoinHandle<SampleRouter>,
}

impl IngestService {
    pub async fn start(
        transport: &dyn SampleTransport,
        router: SampleRouter,
    ) -> Result<IngestService> {
        let mut rx = transport.subscribe().await?;

        let handle = tokio::spawn(async move {
            while let Some(sample) = rx.recv().await {
                if let Err(err) = router.route(sample) {
                    warn!(%err, "sample not routed");
                }
            }
            debug!("sample stream closed");
            router
        });

        Ok(IngestService { handle })
    }

    /// Wait for the stream to close and hand the router back so the caller
    /// can drain and shut it down.
    pub async fn join(self) -> Result<SampleRouter> {
        Ok(self.handle.await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::evaluator::ConfigurationEvaluator;
    use crate::domain::metrics::definition::MetricDefinition;
    use crate::domain::metrics::registry::MetricRegistry;
    use crate::domain::metrics::sample::MetricSample;
    use crate::domain::metrics::sense::ImprovementSense;
    use crate::infrastructure::channel_transport::ChannelTransport;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_transport_to_router_flow() {
        let registry = MetricRegistry::new(vec![
            MetricDefinition::new("soc", 1.0, ImprovementSense::Maximize { limit: 0.0 }).unwrap(),
        ])
        .unwrap();
        let evaluator = Arc::new(ConfigurationEvaluator::new("cfg", Arc::new(registry)));
        let router = SampleRouter::spawn(Arc::clone(&evaluator)).unwrap();

        let transport = ChannelTransport::new(16);
        let service = IngestService::start(&transport, router).await.unwrap();

        transport.publish(MetricSample::new("soc", 0.0, 1.0)).await;
        transport.publish(MetricSample::new("soc", 8.0, 1.0)).await;
        // Unknown ids are dropped without ending the service.
        transport
            .publish(MetricSample::new("nonexistent", 9.0, 1.0))
            .await;
        transport.close().await;

        let router = service.join().await.unwrap();
        router.shutdown();

        assert!((evaluator.total() - 8.0).abs() < 1e-9);
    }
}

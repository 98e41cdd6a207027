use crate::domain::metrics::sample::MetricSample;
use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc::Receiver;

// Need async_trait for async functions in traits
#[async_trait]
pub trait SampleTransport: Send + Sync {
    /// Open a stream of raw samples from the external sources this transport
    /// fronts. Delivery guarantees (retry, backoff) belong to the transport;
    /// the engine only consumes.
    async fn subscribe(&self) -> Result<Receiver<MetricSample>>;
}

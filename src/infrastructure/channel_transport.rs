use crate::domain::metrics::sample::MetricSample;
use crate::domain::ports::SampleTransport;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio::sync::RwLock;
use tracing::trace;

/// In-process transport delivering published samples to every subscriber.
///
/// Stands in for the external message layer during tests and single-process
/// runs; production deployments put a real transport behind the same port.
pub struct ChannelTransport {
    capacity: usize,
    senders: Arc<RwLock<Vec<Sender<MetricSample>>>>,
}

impl ChannelTransport {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            senders: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Deliver a sample to all current subscribers.
    pub async fn publish(&self, sample: MetricSample) {
        let senders = self.senders.read().await;
        for tx in senders.iter() {
            if tx.send(sample.clone()).await.is_err() {
                trace!(metric_id = %sample.metric_id, "subscriber gone; sample skipped");
            }
        }
    }

    /// Drop every subscriber channel, closing their streams.
    pub async fn close(&self) {
        self.senders.write().await.clear();
    }

    pub async fn subscriber_count(&self) -> usize {
        self.senders.read().await.len()
    }
}

impl Clone for ChannelTransport {
    fn clone(&self) -> Self {
        Self {
            capacity: self.capacity,
            senders: Arc::clone(&self.senders),
        }
    }
}

#[async_trait]
impl SampleTransport for ChannelTransport {
    async fn subscribe(&self) -> Result<Receiver<MetricSample>> {
        let (tx, rx) = mpsc::channel(self.capacity);
        self.senders.write().await.push(tx);
        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribe_and_publish() {
        let transport = ChannelTransport::new(4);
        assert_eq!(transport.subscriber_count().await, 0);

        let mut rx = transport.subscribe().await.unwrap();
        assert_eq!(transport.subscriber_count().await, 1);

        transport
            .publish(MetricSample::new("voltage", 1.0, 0.98))
            .await;
        let sample = rx.recv().await.unwrap();
        assert_eq!(sample.metric_id, "voltage");
        assert_eq!(sample.timestamp, 1.0);
    }

    #[tokio::test]
    async fn test_multiple_subscribers_each_receive() {
        let transport = ChannelTransport::new(4);
        let mut rx1 = transport.subscribe().await.unwrap();
        let mut rx2 = transport.subscribe().await.unwrap();

        transport.publish(MetricSample::new("cost", 0.0, 42.0)).await;

        assert_eq!(rx1.recv().await.unwrap().value, 42.0);
        assert_eq!(rx2.recv().await.unwrap().value, 42.0);
    }

    #[tokio::test]
    async fn test_close_ends_streams() {
        let transport = ChannelTransport::new(4);
        let mut rx = transport.subscribe().await.unwrap();
        transport.close().await;
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_clone_shares_subscribers() {
        let transport = ChannelTransport::new(4);
        let cloned = transport.clone();
        let _rx = transport.subscribe().await.unwrap();
        assert_eq!(cloned.subscriber_count().await, 1);
    }
}

//! In-memory [`PayloadClient`] for tests.

use crate::{ClientError, PayloadClient, PayloadStream};
use async_trait::async_trait;
use futures_util::StreamExt;
use indexer_primitives::Payload;
use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
};

/// Serves canned payloads by height and replays them, in order, to subscribers.
#[derive(Debug, Default)]
pub struct MockPayloadClient {
    payloads: Mutex<BTreeMap<u64, Payload>>,
    fetches: AtomicUsize,
}

impl MockPayloadClient {
    /// An empty mock; every fetch fails with [`ClientError::PayloadUnavailable`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the payload served for `block_number`.
    pub fn insert(&self, block_number: u64, payload: Payload) {
        self.payloads.lock().expect("mock lock poisoned").insert(block_number, payload);
    }

    /// Number of explicit fetches served so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl PayloadClient for MockPayloadClient {
    async fn payload_at(&self, block_number: u64) -> Result<Payload, ClientError> {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        self.payloads
            .lock()
            .expect("mock lock poisoned")
            .get(&block_number)
            .cloned()
            .ok_or(ClientError::PayloadUnavailable(block_number))
    }

    async fn subscribe_payloads(&self) -> Result<PayloadStream, ClientError> {
        let payloads: Vec<Payload> =
            self.payloads.lock().expect("mock lock poisoned").values().cloned().collect();
        Ok(futures_util::stream::iter(payloads.into_iter().map(Ok)).boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn serves_registered_payloads() {
        let client = MockPayloadClient::new();
        client.insert(7, Payload::default());

        assert!(client.payload_at(7).await.is_ok());
        assert!(matches!(
            client.payload_at(8).await,
            Err(ClientError::PayloadUnavailable(8))
        ));
        assert_eq!(client.fetch_count(), 2);
    }

    #[tokio::test]
    async fn subscription_replays_in_height_order() {
        let client = MockPayloadClient::new();
        client.insert(2, Payload::default());
        client.insert(1, Payload::default());

        let stream = client.subscribe_payloads().await.unwrap();
        let items: Vec<_> = stream.collect().await;
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(Result::is_ok));
    }
}

//! Client for the upstream node's state-diff RPC surface.
//!
//! The node exposes two operations this pipeline needs: an explicit fetch of the payload for a
//! given height (used by the backfill dispatchers) and a subscription delivering payloads as
//! the head advances (used by the live tail).

use async_trait::async_trait;
use futures_util::{stream::BoxStream, StreamExt};
use indexer_primitives::Payload;
use jsonrpsee::{
    core::client::{ClientT, Subscription, SubscriptionClientT},
    http_client::{HttpClient, HttpClientBuilder},
    rpc_params,
    ws_client::WsClientBuilder,
};
use std::sync::Arc;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

/// A stream of payloads delivered by a head subscription.
pub type PayloadStream = BoxStream<'static, Result<Payload, ClientError>>;

/// Errors raised while talking to the upstream node.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The node could not be reached or rejected the request.
    #[error("node unavailable: {0}")]
    Rpc(#[from] jsonrpsee::core::client::Error),

    /// A subscription item could not be decoded.
    #[error("malformed subscription item: {0}")]
    Subscription(String),

    /// The node has no payload for the requested height.
    #[error("no payload available for block {0}")]
    PayloadUnavailable(u64),
}

/// Source of state-diff payloads.
#[async_trait]
pub trait PayloadClient: Send + Sync {
    /// Fetches the payload for an explicit block number.
    async fn payload_at(&self, block_number: u64) -> Result<Payload, ClientError>;

    /// Subscribes to payloads emitted as the chain head advances.
    async fn subscribe_payloads(&self) -> Result<PayloadStream, ClientError>;
}

/// [`PayloadClient`] backed by the node's `statediff` RPC namespace: HTTP for explicit
/// fetches, WebSocket for the head subscription.
#[derive(Debug, Clone)]
pub struct StateDiffClient {
    http: HttpClient,
    ws_url: String,
}

impl StateDiffClient {
    /// Builds a client for the given HTTP and WebSocket endpoints.
    ///
    /// The WebSocket connection is established lazily on the first subscription.
    pub fn new(http_url: &str, ws_url: impl Into<String>) -> Result<Self, ClientError> {
        let http = HttpClientBuilder::default().build(http_url)?;
        Ok(Self { http, ws_url: ws_url.into() })
    }
}

#[async_trait]
impl PayloadClient for StateDiffClient {
    async fn payload_at(&self, block_number: u64) -> Result<Payload, ClientError> {
        let payload =
            self.http.request("statediff_stateDiffAt", rpc_params![block_number]).await?;
        Ok(payload)
    }

    async fn subscribe_payloads(&self) -> Result<PayloadStream, ClientError> {
        let client = Arc::new(WsClientBuilder::default().build(&self.ws_url).await?);
        let subscription: Subscription<Payload> = client
            .subscribe("statediff_subscribe", rpc_params![], "statediff_unsubscribe")
            .await?;

        // The stream owns the websocket client; dropping the stream tears the connection down.
        let stream = futures_util::stream::unfold(
            (client, subscription),
            |(client, mut subscription)| async move {
                match subscription.next().await {
                    Some(Ok(payload)) => Some((Ok(payload), (client, subscription))),
                    Some(Err(err)) => {
                        Some((Err(ClientError::Subscription(err.to_string())), (client, subscription)))
                    }
                    None => None,
                }
            },
        );
        Ok(stream.boxed())
    }
}

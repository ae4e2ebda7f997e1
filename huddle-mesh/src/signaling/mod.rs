use async_trait::async_trait;
use huddle_core::SignalMessage;

/// Outbound half of the signaling channel, implemented by the embedding
/// transport (websocket, in-process relay, test capture).
///
/// Directed messages carry the target in their `peer` field; the relay
/// rewrites it to the sender id on delivery.
#[async_trait]
pub trait SignalingOutput: Send + Sync {
    async fn send(&self, msg: SignalMessage);
}

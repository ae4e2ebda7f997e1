use crate::link::{LinkBuilder, LinkEvent, PeerLink};
use dashmap::DashMap;
use huddle_core::ParticipantId;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

/// Creates and owns at most one live link per participant id.
///
/// `acquire` is idempotent; `release` closes the link and is a no-op the
/// second time. Link callbacks are delivered over the event channel handed
/// in at construction.
pub struct PeerLinkFactory {
    builder: Arc<dyn LinkBuilder>,
    links: DashMap<ParticipantId, Arc<dyn PeerLink>>,
    events: mpsc::Sender<LinkEvent>,
}

impl PeerLinkFactory {
    pub fn new(builder: Arc<dyn LinkBuilder>, events: mpsc::Sender<LinkEvent>) -> Self {
        Self {
            builder,
            links: DashMap::new(),
            events,
        }
    }

    pub async fn acquire(&self, peer: &ParticipantId) -> anyhow::Result<Arc<dyn PeerLink>> {
        if let Some(link) = self.links.get(peer) {
            debug!(%peer, "reusing existing link");
            return Ok(link.clone());
        }

        let link = self.builder.build(peer.clone(), self.events.clone()).await?;
        self.links.insert(peer.clone(), link.clone());
        debug!(%peer, "link created");
        Ok(link)
    }

    pub async fn release(&self, peer: &ParticipantId) {
        let Some((_, link)) = self.links.remove(peer) else {
            return;
        };
        link.close().await;
        debug!(%peer, "link released");
    }

    pub async fn release_all(&self) {
        let ids: Vec<ParticipantId> = self.links.iter().map(|e| e.key().clone()).collect();
        for id in ids {
            self.release(&id).await;
        }
    }

    pub fn has(&self, peer: &ParticipantId) -> bool {
        self.links.contains_key(peer)
    }

    pub fn live_count(&self) -> usize {
        self.links.len()
    }
}

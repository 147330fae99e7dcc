//! Downstream peer-record sink
//!
//! The observer loop emits classified identities here. [`PeerStore`] is the
//! seam a persistent store or metrics aggregator plugs into;
//! [`MemoryPeerStore`] is the in-process implementation used by tests and
//! small deployments.

use crate::identity::PeerId;
use dashmap::DashMap;
use meshwatch_identify::ClientIdentity;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::SystemTime;

/// Sink for classified peer records
pub trait PeerStore: Send + Sync + 'static {
    /// A peer connected and was classified as `identity`
    fn record_identity(&self, peer_id: PeerId, identity: ClientIdentity, seen: SystemTime);

    /// A peer disconnected
    fn record_disconnect(&self, peer_id: PeerId, seen: SystemTime);
}

/// Everything tracked about one observed peer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerRecord {
    /// Latest classified identity
    pub identity: ClientIdentity,

    /// Whether the peer is currently connected
    pub connected: bool,

    /// Total connect events observed
    pub connections: u64,

    /// Total disconnect events observed
    pub disconnections: u64,

    /// Timestamp of the most recent lifecycle event
    pub last_seen: SystemTime,
}

/// In-memory peer store backed by a concurrent map
#[derive(Debug, Default)]
pub struct MemoryPeerStore {
    peers: DashMap<PeerId, PeerRecord>,
}

impl MemoryPeerStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of one peer's record
    #[must_use]
    pub fn get(&self, peer_id: &PeerId) -> Option<PeerRecord> {
        self.peers.get(peer_id).map(|r| r.value().clone())
    }

    /// Number of peers ever observed
    #[must_use]
    pub fn len(&self) -> usize {
        self.peers.len()
    }

    /// Whether no peer has been observed yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    /// Fleet analytics: how many observed peers run each (name, version)
    #[must_use]
    pub fn client_census(&self) -> HashMap<ClientIdentity, usize> {
        let mut census = HashMap::new();
        for record in self.peers.iter() {
            *census.entry(record.identity.clone()).or_insert(0) += 1;
        }
        census
    }
}

impl PeerStore for MemoryPeerStore {
    fn record_identity(&self, peer_id: PeerId, identity: ClientIdentity, seen: SystemTime) {
        self.peers
            .entry(peer_id)
            .and_modify(|record| {
                record.identity = identity.clone();
                record.connected = true;
                record.connections += 1;
                record.last_seen = seen;
            })
            .or_insert_with(|| PeerRecord {
                identity,
                connected: true,
                connections: 1,
                disconnections: 0,
                last_seen: seen,
            });
    }

    fn record_disconnect(&self, peer_id: PeerId, seen: SystemTime) {
        match self.peers.get_mut(&peer_id) {
            Some(mut record) => {
                record.connected = false;
                record.disconnections += 1;
                record.last_seen = seen;
            }
            None => {
                // Disconnect for a peer whose connect we never saw
                tracing::debug!(
                    peer = %hex::encode(&peer_id[..8]),
                    "disconnect for unknown peer, ignoring"
                );
            }
        }
    }
}

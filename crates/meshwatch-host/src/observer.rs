//! Consumer loop: event channel → identification engine → peer store
//!
//! One task drains the event channel in FIFO order, resolves each connect
//! event's agent string through [`meshwatch_identify::classify`], and emits
//! the result to a [`PeerStore`]. Classification is pure, so deployments
//! needing more throughput can run several loops over sharded channels
//! without coordination; a single channel has a single logical consumer.

use crate::events::{EventKind, EventReceiver};
use crate::store::PeerStore;
use meshwatch_identify::classify;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Drain the event channel until shutdown or channel close
///
/// Exits when the shutdown signal is raised (remaining buffered events are
/// abandoned) or when every sender is gone and the buffer is drained. A
/// closed channel is never processed as data.
pub async fn run<S: PeerStore>(
    mut events: EventReceiver,
    store: Arc<S>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
            event = events.recv() => {
                let Some(event) = event else { break };
                match event.kind {
                    EventKind::Connected => {
                        let identity = classify(event.agent.as_deref().unwrap_or(""));
                        tracing::debug!(
                            peer = %hex::encode(&event.peer_id[..8]),
                            client = %identity,
                            "peer connected"
                        );
                        store.record_identity(event.peer_id, identity, event.observed_at);
                    }
                    EventKind::Disconnected => {
                        tracing::debug!(
                            peer = %hex::encode(&event.peer_id[..8]),
                            "peer disconnected"
                        );
                        store.record_disconnect(event.peer_id, event.observed_at);
                    }
                }
            }
        }
    }
    tracing::debug!("identity observer stopped");
}

/// Spawn the drain loop on the current runtime
pub fn spawn<S: PeerStore>(
    events: EventReceiver,
    store: Arc<S>,
    shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(run(events, store, shutdown))
}

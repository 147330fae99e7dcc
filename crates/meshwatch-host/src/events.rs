//! Bounded connection-event channel
//!
//! Decouples the transport layer's connection-lifecycle callbacks from the
//! slower classification pipeline. The transport's notification hooks run
//! inside its internal event loop, so the enqueue side must be bounded-time:
//! under the default [`OverflowPolicy::DropNewest`] policy a full buffer
//! drops the incoming event, increments an observable counter, and logs a
//! warning instead of propagating backpressure into connection handling.
//!
//! Delivery is strictly FIFO to a single logical consumer. For N events sent
//! below capacity the consumer observes exactly N events in send order.

use crate::identity::PeerId;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// Default capacity of the connection-event buffer
///
/// Tunable admission control: trades memory for drop rate under load spikes
/// such as mass reconnect storms.
pub const DEFAULT_EVENT_BUFFER: usize = 400;

/// Lifecycle transition kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    /// Remote peer connected
    Connected,
    /// Remote peer disconnected
    Disconnected,
}

/// One lifecycle transition of a remote peer's connection
///
/// Created by the transport's notification hook at the instant of the
/// transition, consumed exactly once downstream, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionEvent {
    /// Remote peer identifier
    pub peer_id: PeerId,

    /// Transition kind
    pub kind: EventKind,

    /// Raw agent string reported during handshake (connect events only)
    pub agent: Option<String>,

    /// When the transition was observed
    pub observed_at: SystemTime,
}

impl ConnectionEvent {
    /// Connect event carrying the peer's self-reported agent string
    #[must_use]
    pub fn connected(peer_id: PeerId, agent: impl Into<String>) -> Self {
        Self {
            peer_id,
            kind: EventKind::Connected,
            agent: Some(agent.into()),
            observed_at: SystemTime::now(),
        }
    }

    /// Disconnect event
    #[must_use]
    pub fn disconnected(peer_id: PeerId) -> Self {
        Self {
            peer_id,
            kind: EventKind::Disconnected,
            agent: None,
            observed_at: SystemTime::now(),
        }
    }
}

/// What to do when the event buffer is full
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverflowPolicy {
    /// Drop the incoming event and count it. Bounded-time, safe inside the
    /// transport's notification callback.
    #[default]
    DropNewest,

    /// Wait for buffer space. Only acceptable for senders that are provably
    /// off the transport's hot path.
    Block,
}

/// Create a bounded connection-event channel
#[must_use]
pub fn channel(capacity: usize, policy: OverflowPolicy) -> (EventSender, EventReceiver) {
    let (tx, rx) = mpsc::channel(capacity);
    let sender = EventSender {
        tx,
        policy,
        dropped: Arc::new(AtomicU64::new(0)),
    };
    (sender, EventReceiver { rx })
}

/// Producer half handed to the transport layer's notification hooks
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::Sender<ConnectionEvent>,
    policy: OverflowPolicy,
    dropped: Arc<AtomicU64>,
}

impl EventSender {
    /// Enqueue one event according to the channel's overflow policy
    ///
    /// Returns `true` if the event was enqueued. Under
    /// [`OverflowPolicy::DropNewest`] this never suspends: a full buffer
    /// drops the event and bumps [`Self::dropped`]. A closed channel (the
    /// session is shutting down) discards the event quietly either way.
    pub async fn send(&self, event: ConnectionEvent) -> bool {
        match self.policy {
            OverflowPolicy::DropNewest => match self.tx.try_send(event) {
                Ok(()) => true,
                Err(TrySendError::Full(event)) => {
                    let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                    tracing::warn!(
                        peer = %hex::encode(&event.peer_id[..8]),
                        total_dropped = dropped,
                        "connection event buffer full, dropping event"
                    );
                    false
                }
                Err(TrySendError::Closed(_)) => {
                    tracing::debug!("connection event channel closed, discarding event");
                    false
                }
            },
            OverflowPolicy::Block => match self.tx.send(event).await {
                Ok(()) => true,
                Err(_) => {
                    tracing::debug!("connection event channel closed, discarding event");
                    false
                }
            },
        }
    }

    /// Notification hook: a remote peer connected and reported `agent`
    pub async fn connected(&self, peer_id: PeerId, agent: impl Into<String>) -> bool {
        self.send(ConnectionEvent::connected(peer_id, agent)).await
    }

    /// Notification hook: a remote peer disconnected
    pub async fn disconnected(&self, peer_id: PeerId) -> bool {
        self.send(ConnectionEvent::disconnected(peer_id)).await
    }

    /// Number of events dropped because the buffer was full
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Consumer half draining events in arrival order
#[derive(Debug)]
pub struct EventReceiver {
    rx: mpsc::Receiver<ConnectionEvent>,
}

impl EventReceiver {
    /// Receive the next event in FIFO order
    ///
    /// Returns `None` once every sender is gone and the buffer is drained,
    /// so a closed channel is never observed as data.
    pub async fn recv(&mut self) -> Option<ConnectionEvent> {
        self.rx.recv().await
    }
}

//! # meshwatch host
//!
//! Host-side core of the meshwatch network observer. It owns the live
//! network endpoint, bridges the transport layer's connection-lifecycle
//! notifications into a bounded event channel, and drains that channel
//! through the identification engine into a peer store.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Transport layer                         │
//! │        (connection establishment, handshake, agents)         │
//! ├─────────────────────────────────────────────────────────────┤
//! │   EventSender hooks  →  bounded event channel (FIFO)         │
//! ├─────────────────────────────────────────────────────────────┤
//! │   Observer task  →  meshwatch-identify  →  PeerStore         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The enqueue side is bounded-time by design: the transport's notification
//! hooks run inside its internal event loop and must never stall on a slow
//! consumer. Under the default [`OverflowPolicy::DropNewest`] policy a full
//! buffer drops the event and increments an observable counter.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use meshwatch_host::{observer, HostConfig, HostSession, MemoryPeerStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let session = HostSession::new(HostConfig::default())?;
//!     session.start().await?;
//!
//!     let store = Arc::new(MemoryPeerStore::new());
//!     let events = session.take_events().expect("receiver already taken");
//!     let drain = observer::spawn(events, store.clone(), session.shutdown_signal());
//!
//!     // ... transport layer drives session.notifier() hooks ...
//!
//!     session.stop().await;
//!     drain.await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod identity;
pub mod observer;
pub mod session;
pub mod store;

pub use config::HostConfig;
pub use error::{HostError, Result};
pub use events::{
    ConnectionEvent, EventKind, EventReceiver, EventSender, OverflowPolicy, DEFAULT_EVENT_BUFFER,
};
pub use identity::{Identity, PeerId};
pub use session::HostSession;
pub use store::{MemoryPeerStore, PeerRecord, PeerStore};

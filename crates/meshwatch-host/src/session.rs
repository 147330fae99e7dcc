//! Host session - owns the live network endpoint and the event channel
//!
//! The session wires transport-level connect/disconnect notifications into
//! the bounded event channel and exposes the channel, the local identity,
//! and the resolved listen address to collaborators. `start`/`stop` are
//! idempotent; stopping raises the shutdown signal consumers select on and
//! releases the endpoint.

use crate::config::{DEFAULT_LISTEN_ADDR, HostConfig};
use crate::error::{HostError, Result};
use crate::events::{self, EventReceiver, EventSender};
use crate::identity::{Identity, PeerId};
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::net::UdpSocket;
use tokio::sync::{Mutex, watch};

/// Host session for one live network endpoint
pub struct HostSession {
    identity: Identity,
    config: HostConfig,
    /// Resolved listen address (post-fallback)
    listen_addr: SocketAddr,
    socket: Mutex<Option<Arc<UdpSocket>>>,
    events: EventSender,
    receiver: std::sync::Mutex<Option<EventReceiver>>,
    running: AtomicBool,
    shutdown: watch::Sender<bool>,
}

impl HostSession {
    /// Create a session with a fresh random identity
    ///
    /// # Errors
    ///
    /// Returns [`HostError::InvalidConfig`] for configurations with no
    /// documented fallback (a zero-capacity event buffer). An unparseable
    /// listen address is *not* an error: it is recovered by substituting
    /// [`DEFAULT_LISTEN_ADDR`] and logging the fallback.
    pub fn new(config: HostConfig) -> Result<Self> {
        Self::with_identity(Identity::generate(), config)
    }

    /// Create a session from an existing identity
    pub fn with_identity(identity: Identity, config: HostConfig) -> Result<Self> {
        if config.event_buffer == 0 {
            return Err(HostError::InvalidConfig(
                "event buffer capacity must be at least 1".into(),
            ));
        }

        let listen_addr = resolve_listen_addr(&config.listen_addr);
        let (events, receiver) = events::channel(config.event_buffer, config.overflow);
        let (shutdown, _) = watch::channel(false);

        Ok(Self {
            identity,
            config,
            listen_addr,
            socket: Mutex::new(None),
            events,
            receiver: std::sync::Mutex::new(Some(receiver)),
            running: AtomicBool::new(false),
            shutdown,
        })
    }

    /// Start the session: bind the endpoint and begin accepting notifications
    ///
    /// Idempotent; starting an already-running session is a logged no-op.
    ///
    /// # Errors
    ///
    /// Binding the endpoint is the one fatal startup path: failure is
    /// surfaced as [`HostError::Transport`] and the session stays stopped.
    pub async fn start(&self) -> Result<()> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::debug!("host session already started");
            return Ok(());
        }

        let socket = match UdpSocket::bind(self.listen_addr).await {
            Ok(socket) => socket,
            Err(e) => {
                self.running.store(false, Ordering::SeqCst);
                return Err(HostError::Transport(
                    format!("failed to bind {}: {e}", self.listen_addr).into(),
                ));
            }
        };
        let local = socket.local_addr().map_err(|e| {
            self.running.store(false, Ordering::SeqCst);
            HostError::Io(e.to_string())
        })?;

        *self.socket.lock().await = Some(Arc::new(socket));
        // A restarted session gets a fresh shutdown signal
        self.shutdown.send_replace(false);

        tracing::info!(
            peer = %hex::encode(&self.identity.peer_id()[..8]),
            addr = %local,
            agent = %self.config.agent,
            "host session started"
        );
        Ok(())
    }

    /// Stop the session: raise the shutdown signal and release the endpoint
    ///
    /// Idempotent; stopping a stopped session is a logged no-op. Buffered
    /// events stay readable so the consumer may drain or abandon them.
    pub async fn stop(&self) {
        if self
            .running
            .compare_exchange(true, false, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::debug!("host session already stopped");
            return;
        }

        self.shutdown.send_replace(true);
        self.socket.lock().await.take();
        tracing::info!("host session stopped");
    }

    /// Whether the session is currently running
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Sender handle for the transport layer's notification hooks
    #[must_use]
    pub fn notifier(&self) -> EventSender {
        self.events.clone()
    }

    /// Hand the single event receiver to the consumer loop
    ///
    /// The channel has one logical consumer; the receiver can be taken
    /// exactly once and subsequent calls return `None`.
    #[must_use]
    pub fn take_events(&self) -> Option<EventReceiver> {
        self.receiver.lock().ok()?.take()
    }

    /// Watch signal raised when the session stops
    #[must_use]
    pub fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }

    /// The local peer ID
    #[must_use]
    pub fn peer_id(&self) -> PeerId {
        self.identity.peer_id()
    }

    /// The local identity
    #[must_use]
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Agent string this observer announces about itself
    #[must_use]
    pub fn agent(&self) -> &str {
        &self.config.agent
    }

    /// The resolved listen address the session will bind (post-fallback)
    #[must_use]
    pub fn listen_addr(&self) -> SocketAddr {
        self.listen_addr
    }

    /// The actually bound endpoint address, for discovery/announcement
    ///
    /// # Errors
    ///
    /// Returns [`HostError::InvalidState`] while the session is stopped.
    pub async fn local_addr(&self) -> Result<SocketAddr> {
        match self.socket.lock().await.as_ref() {
            Some(socket) => socket.local_addr().map_err(|e| {
                HostError::Transport(format!("failed to get local address: {e}").into())
            }),
            None => Err(HostError::invalid_state("session not started")),
        }
    }

    /// Number of events dropped at the channel because the buffer was full
    #[must_use]
    pub fn dropped_events(&self) -> u64 {
        self.events.dropped()
    }
}

impl std::fmt::Debug for HostSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostSession")
            .field("peer_id", &hex::encode(&self.identity.peer_id()[..8]))
            .field("listen_addr", &self.listen_addr)
            .field("running", &self.is_running())
            .finish()
    }
}

/// Parse the configured listen address, falling back to the documented
/// default when it is invalid
fn resolve_listen_addr(configured: &str) -> SocketAddr {
    match configured.parse() {
        Ok(addr) => addr,
        Err(_) => {
            tracing::warn!(
                configured,
                fallback = DEFAULT_LISTEN_ADDR,
                "invalid listen address, falling back to default"
            );
            DEFAULT_LISTEN_ADDR
                .parse()
                .expect("default listen address is valid")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;

    fn local_config() -> HostConfig {
        HostConfig {
            listen_addr: "127.0.0.1:0".to_string(),
            ..HostConfig::default()
        }
    }

    #[tokio::test]
    async fn test_start_stop_lifecycle() {
        let session = HostSession::new(local_config()).unwrap();
        assert!(!session.is_running());

        session.start().await.unwrap();
        assert!(session.is_running());
        let addr = session.local_addr().await.unwrap();
        assert_ne!(addr.port(), 0);

        session.stop().await;
        assert!(!session.is_running());
        assert!(session.local_addr().await.is_err());
    }

    #[tokio::test]
    async fn test_start_is_idempotent() {
        let session = HostSession::new(local_config()).unwrap();
        session.start().await.unwrap();
        let addr = session.local_addr().await.unwrap();

        // Second start is a no-op that keeps the bound endpoint
        session.start().await.unwrap();
        assert_eq!(session.local_addr().await.unwrap(), addr);

        session.stop().await;
        session.stop().await;
        assert!(!session.is_running());
    }

    #[tokio::test]
    async fn test_restart_after_stop() {
        let session = HostSession::new(local_config()).unwrap();
        session.start().await.unwrap();
        session.stop().await;

        session.start().await.unwrap();
        assert!(session.is_running());
        assert!(!*session.shutdown_signal().borrow());
        session.stop().await;
    }

    #[tokio::test]
    async fn test_invalid_listen_addr_falls_back() {
        let config = HostConfig {
            listen_addr: "definitely-not-an-address".to_string(),
            ..HostConfig::default()
        };
        let session = HostSession::new(config).unwrap();
        let expected: SocketAddr = DEFAULT_LISTEN_ADDR.parse().unwrap();
        assert_eq!(session.listen_addr(), expected);
    }

    #[tokio::test]
    async fn test_bind_conflict_is_fatal() {
        let first = HostSession::new(local_config()).unwrap();
        first.start().await.unwrap();
        let taken = first.local_addr().await.unwrap();

        let config = HostConfig {
            listen_addr: taken.to_string(),
            ..HostConfig::default()
        };
        let second = HostSession::new(config).unwrap();
        let err = second.start().await.unwrap_err();
        assert!(matches!(err, HostError::Transport(_)));
        assert!(!second.is_running());

        first.stop().await;
    }

    #[tokio::test]
    async fn test_zero_event_buffer_is_rejected() {
        let config = HostConfig {
            event_buffer: 0,
            ..local_config()
        };
        let err = HostSession::new(config).unwrap_err();
        assert!(matches!(err, HostError::InvalidConfig(_)));
    }

    #[tokio::test]
    async fn test_notifications_flow_through_channel() {
        let session = HostSession::new(local_config()).unwrap();
        let mut events = session.take_events().unwrap();
        assert!(session.take_events().is_none());

        let notifier = session.notifier();
        notifier.connected([1u8; 32], "nimbus").await;
        notifier.disconnected([1u8; 32]).await;

        assert_eq!(events.recv().await.unwrap().kind, EventKind::Connected);
        assert_eq!(events.recv().await.unwrap().kind, EventKind::Disconnected);
        assert_eq!(session.dropped_events(), 0);
    }

    #[tokio::test]
    async fn test_shutdown_signal_raised_on_stop() {
        let session = HostSession::new(local_config()).unwrap();
        let mut signal = session.shutdown_signal();
        assert!(!*signal.borrow());

        session.start().await.unwrap();
        session.stop().await;

        signal.changed().await.unwrap();
        assert!(*signal.borrow());
    }

    #[test]
    fn test_session_debug_output() {
        let session = HostSession::new(local_config()).unwrap();
        let debug = format!("{session:?}");
        assert!(debug.contains("HostSession"));
        assert!(debug.contains("running"));
    }
}

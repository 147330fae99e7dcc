//! Local node identity
//!
//! The observer announces itself on the network with the same kind of
//! identity it records for remote peers: an Ed25519 keypair whose verifying
//! key doubles as the 32-byte peer ID. Remote peers are tracked by peer ID
//! only; their keys are never validated here (that is the transport layer's
//! job).

use ed25519_dalek::{SigningKey, VerifyingKey};
use rand_core::OsRng;

/// Peer identifier (Ed25519 public key)
///
/// Opaque and immutable once assigned at connection time.
pub type PeerId = [u8; 32];

/// Local node identity backing the host session
#[derive(Clone)]
pub struct Identity {
    signing: SigningKey,
}

impl Identity {
    /// Generate a fresh random identity
    #[must_use]
    pub fn generate() -> Self {
        Self {
            signing: SigningKey::generate(&mut OsRng),
        }
    }

    /// Restore an identity from a previously saved 32-byte seed
    #[must_use]
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self {
            signing: SigningKey::from_bytes(&seed),
        }
    }

    /// The node's peer ID (Ed25519 verifying key bytes)
    #[must_use]
    pub fn peer_id(&self) -> PeerId {
        self.signing.verifying_key().to_bytes()
    }

    /// The node's verifying key
    #[must_use]
    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing.verifying_key()
    }
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("peer_id", &hex::encode(&self.peer_id()[..8]))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_unique() {
        let a = Identity::generate();
        let b = Identity::generate();
        assert_ne!(a.peer_id(), b.peer_id());
    }

    #[test]
    fn test_identity_from_seed_is_stable() {
        let seed = [7u8; 32];
        assert_eq!(
            Identity::from_seed(seed).peer_id(),
            Identity::from_seed(seed).peer_id()
        );
    }

    #[test]
    fn test_identity_debug_redacts_key() {
        let identity = Identity::generate();
        let debug = format!("{identity:?}");
        assert!(debug.contains("peer_id"));
        // Only a key prefix is printed
        assert!(!debug.contains(&hex::encode(identity.peer_id())));
    }
}
